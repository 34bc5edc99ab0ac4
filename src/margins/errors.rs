//! margins::errors — failures raised by the comparisons engine and entry points.
//!
//! Configuration errors (unknown estimand names, bad focal variables, bad
//! weights, unknown `by` columns) are raised before any prediction work.
//! Lower-layer failures are wrapped so callers can match on the original
//! [`DataError`], [`ModelError`], or [`InferenceError`].
use crate::{data::errors::DataError, inference::errors::InferenceError, model::errors::ModelError};

/// Result alias for margins operations.
pub type MarginsResult<T> = Result<T, MarginsError>;

#[derive(Debug, Clone, PartialEq)]
pub enum MarginsError {
    // ---- Configuration ----
    /// Comparison name not in the estimand registry.
    InvalidComparison { name: String },

    /// Slope name outside `dydx`, `eyex`, `eydx`, `dyex`.
    InvalidSlope { name: String },

    /// Derivative step must be finite and positive.
    InvalidEps { eps: f64 },

    /// Focal variable is not a perturbable model covariate.
    InvalidVariable { name: String, reason: String },

    /// Contrast does not apply to the variable's kind, or names unknown levels.
    UnsupportedContrast { name: String, reason: String },

    /// Weights are negative, non-finite, mis-sized, or sum to zero in a group.
    InvalidWeights { reason: String },

    /// `by` references a column absent from the evaluation grid.
    UnknownByColumn { name: String },

    /// The model has no perturbable covariates and none were requested.
    EmptyVariables,

    // ---- Wrapped ----
    Data(DataError),
    Model(ModelError),
    Inference(InferenceError),
}

impl std::error::Error for MarginsError {}

impl From<DataError> for MarginsError {
    fn from(err: DataError) -> Self {
        MarginsError::Data(err)
    }
}

impl From<ModelError> for MarginsError {
    fn from(err: ModelError) -> Self {
        MarginsError::Model(err)
    }
}

impl From<InferenceError> for MarginsError {
    fn from(err: InferenceError) -> Self {
        MarginsError::Inference(err)
    }
}

impl From<anyhow::Error> for MarginsError {
    fn from(err: anyhow::Error) -> Self {
        MarginsError::Model(ModelError::from(err))
    }
}

impl std::fmt::Display for MarginsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            MarginsError::InvalidComparison { name } => {
                write!(f, "Margins Error: unknown comparison '{name}'")
            }
            MarginsError::InvalidSlope { name } => write!(
                f,
                "Margins Error: slope must be one of 'dydx', 'eyex', 'eydx', 'dyex', got '{name}'"
            ),
            MarginsError::InvalidEps { eps } => {
                write!(f, "Margins Error: eps must be finite and positive, got {eps}")
            }
            MarginsError::InvalidVariable { name, reason } => {
                write!(f, "Margins Error: invalid variable '{name}': {reason}")
            }
            MarginsError::UnsupportedContrast { name, reason } => {
                write!(f, "Margins Error: unsupported contrast for '{name}': {reason}")
            }
            MarginsError::InvalidWeights { reason } => {
                write!(f, "Margins Error: invalid weights: {reason}")
            }
            MarginsError::UnknownByColumn { name } => {
                write!(f, "Margins Error: 'by' column '{name}' not found")
            }
            MarginsError::EmptyVariables => {
                write!(f, "Margins Error: no variables to compare")
            }

            // ---- Wrapped ----
            MarginsError::Data(err) => write!(f, "{err}"),
            MarginsError::Model(err) => write!(f, "{err}"),
            MarginsError::Inference(err) => write!(f, "{err}"),
        }
    }
}
