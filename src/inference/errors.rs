//! Unified error handling for inference routines.
//!
//! This module defines `InferenceError`, the error type used by the
//! numerical Jacobian, the delta method, hypothesis transforms, and the
//! test/interval layer. It groups configuration failures (invalid levels,
//! malformed hypothesis strings) with numerical failures (non-finite
//! Jacobians) and a catch-all `Anyhow` variant. An alias
//! `InferenceResult<T>` standardizes the return type across inference code.

/// Unified error type for inference routines.
///
/// Configuration variants are raised before any prediction work; numerical
/// variants describe a failed Jacobian for one block of estimates.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Configuration ----
    /// Confidence level outside `(0, 1)`.
    InvalidConfLevel {
        level: f64,
    },

    /// Degrees of freedom not finite and positive.
    InvalidDf {
        df: f64,
    },

    /// Equivalence bounds not finite or `low > high`.
    InvalidEquivalenceBounds {
        low: f64,
        high: f64,
    },

    // ---- Hypothesis ----
    /// Hypothesis expression could not be parsed.
    HypothesisParse {
        input: String,
        position: usize,
        reason: String,
    },

    /// Expression references `b{index}` but only `len` estimates exist.
    HypothesisIndexOutOfRange {
        index: usize,
        len: usize,
    },

    /// Hypothesis matrix rows differ from the number of estimates.
    HypothesisDimMismatch {
        expected: usize,
        found: usize,
    },

    // ---- Jacobian ----
    /// A Jacobian entry is NaN/±inf.
    NonFiniteJacobian {
        row: usize,
        col: usize,
    },

    /// Perturbed evaluations returned vectors of different lengths.
    JacobianDimMismatch {
        expected: usize,
        found: usize,
    },

    // ---- Anyhow catchall ----
    Anyhow(String),
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl std::error::Error for InferenceError {}

impl From<anyhow::Error> for InferenceError {
    fn from(err: anyhow::Error) -> Self {
        InferenceError::Anyhow(err.to_string())
    }
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            InferenceError::InvalidConfLevel { level } => {
                write!(f, "Inference Error: confidence level must lie in (0, 1), got {}", level)
            }
            InferenceError::InvalidDf { df } => {
                write!(f, "Inference Error: degrees of freedom must be positive, got {}", df)
            }
            InferenceError::InvalidEquivalenceBounds { low, high } => write!(
                f,
                "Inference Error: invalid equivalence bounds [{}, {}]",
                low, high
            ),

            // ---- Hypothesis ----
            InferenceError::HypothesisParse { input, position, reason } => write!(
                f,
                "Inference Error: cannot parse hypothesis '{}' at position {}: {}",
                input, position, reason
            ),
            InferenceError::HypothesisIndexOutOfRange { index, len } => write!(
                f,
                "Inference Error: hypothesis references b{} but there are only {} estimates",
                index, len
            ),
            InferenceError::HypothesisDimMismatch { expected, found } => write!(
                f,
                "Inference Error: hypothesis matrix has {} rows, expected {}",
                found, expected
            ),

            // ---- Jacobian ----
            InferenceError::NonFiniteJacobian { row, col } => {
                write!(f, "Inference Error: Jacobian entry ({}, {}) is non-finite", row, col)
            }
            InferenceError::JacobianDimMismatch { expected, found } => write!(
                f,
                "Inference Error: perturbed evaluation returned {} values, expected {}",
                found, expected
            ),

            // ---- Anyhow catchall ----
            InferenceError::Anyhow(msg) => write!(f, "Inference Error: {}", msg),
        }
    }
}
