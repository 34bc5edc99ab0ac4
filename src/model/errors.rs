//! model::errors — failures raised by model handles and prediction adapters.
//!
//! Purpose
//! -------
//! Describe everything that can go wrong between "here is a fitted model"
//! and "here are predictions for these rows under this parameter vector":
//! inconsistent parameter/covariance shapes, invalid covariance matrices,
//! missing covariates or unseen factor levels in the evaluation grid,
//! non-finite predictions, and model families whose predictions cannot be
//! rebuilt from parameters alone (capability errors).
//!
//! Conventions
//! -----------
//! - Capability errors name the unsupported family or prediction mode.
//! - Table-level problems are wrapped as `ModelError::Data` so callers keep
//!   the original [`DataError`] payload.
//! - User-written adapters may surface arbitrary failures through
//!   `From<anyhow::Error>`, which collapses them into `ModelError::Anyhow`.
use crate::data::errors::DataError;

/// Result alias for model-handle operations.
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- Parameters and covariance ----
    /// Parameter vector length differs from the design width.
    ParamDimMismatch { expected: usize, found: usize },

    /// Covariance matrix is not square.
    VcovNotSquare { rows: usize, cols: usize },

    /// Covariance dimension differs from the parameter count.
    VcovDimMismatch { expected: usize, found: usize },

    /// Covariance entry `(row, col)` differs from `(col, row)`.
    VcovNotSymmetric { row: usize, col: usize },

    /// Covariance has a materially negative eigenvalue.
    VcovNotPositiveSemiDefinite { eigenvalue: f64 },

    /// A parameter is NaN/±inf.
    NonFiniteParam { index: usize, value: f64 },

    /// A covariance entry is NaN/±inf.
    NonFiniteVcov { row: usize, col: usize },

    // ---- Predictions ----
    /// The prediction for `row` is NaN/±inf.
    NonFinitePrediction { row: usize, value: f64 },

    /// The adapter returned the wrong number of predictions.
    PredictionLength { expected: usize, found: usize },

    /// The evaluation grid lacks a covariate the model needs.
    MissingCovariate { name: String },

    /// A categorical covariate holds a level the model was not fitted with.
    UnknownLevel { name: String, level: String },

    // ---- Capability ----
    /// The family cannot be expressed as a function of parameters and data.
    UnsupportedFamily { family: String },

    /// The requested prediction mode is not available for this model.
    UnsupportedPrediction { family: String, reason: &'static str },

    // ---- Wrapped ----
    Data(DataError),
    Anyhow(String),
}

impl std::error::Error for ModelError {}

impl From<DataError> for ModelError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::UnknownColumn { name } => ModelError::MissingCovariate { name },
            other => ModelError::Data(other),
        }
    }
}

impl From<anyhow::Error> for ModelError {
    fn from(err: anyhow::Error) -> Self {
        ModelError::Anyhow(err.to_string())
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Parameters and covariance ----
            ModelError::ParamDimMismatch { expected, found } => write!(
                f,
                "Model Error: expected {expected} parameters, found {found}"
            ),
            ModelError::VcovNotSquare { rows, cols } => {
                write!(f, "Model Error: covariance matrix is {rows}x{cols}, not square")
            }
            ModelError::VcovDimMismatch { expected, found } => write!(
                f,
                "Model Error: covariance matrix has dimension {found}, expected {expected}"
            ),
            ModelError::VcovNotSymmetric { row, col } => write!(
                f,
                "Model Error: covariance matrix is not symmetric at ({row}, {col})"
            ),
            ModelError::VcovNotPositiveSemiDefinite { eigenvalue } => write!(
                f,
                "Model Error: covariance matrix is not positive semi-definite (eigenvalue {eigenvalue})"
            ),
            ModelError::NonFiniteParam { index, value } => {
                write!(f, "Model Error: parameter {index} is non-finite ({value})")
            }
            ModelError::NonFiniteVcov { row, col } => {
                write!(f, "Model Error: covariance entry ({row}, {col}) is non-finite")
            }

            // ---- Predictions ----
            ModelError::NonFinitePrediction { row, value } => {
                write!(f, "Model Error: prediction for row {row} is non-finite ({value})")
            }
            ModelError::PredictionLength { expected, found } => write!(
                f,
                "Model Error: adapter returned {found} predictions for {expected} rows"
            ),
            ModelError::MissingCovariate { name } => {
                write!(f, "Model Error: evaluation data lacks covariate '{name}'")
            }
            ModelError::UnknownLevel { name, level } => {
                write!(f, "Model Error: level '{level}' of '{name}' was not seen at fit time")
            }

            // ---- Capability ----
            ModelError::UnsupportedFamily { family } => write!(
                f,
                "Model Error: family '{family}' is not supported; predictions cannot be rebuilt from parameters"
            ),
            ModelError::UnsupportedPrediction { family, reason } => {
                write!(f, "Model Error: unsupported prediction for '{family}': {reason}")
            }

            // ---- Wrapped ----
            ModelError::Data(err) => write!(f, "Model Error: {err}"),
            ModelError::Anyhow(msg) => write!(f, "Model Error: {msg}"),
        }
    }
}
