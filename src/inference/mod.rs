//! inference — delta-method uncertainty, hypothesis transforms, and tests.
//!
//! Purpose
//! -------
//! Turn point estimates produced by the comparisons engine into inferential
//! output. Estimates are differentiated numerically with respect to the
//! model parameters, the parameter covariance is propagated through that
//! Jacobian, and the resulting estimate/standard-error pairs feed Wald tests,
//! confidence intervals, and TOST equivalence tests, optionally after a
//! user-supplied hypothesis transform.
//!
//! Key behaviors
//! -------------
//! - [`numerical_jacobian`] computes central-difference Jacobians of any
//!   fallible `θ ↦ e` map; [`delta_method_se`] forms `sqrt(diag(J Σ Jᵀ))`.
//! - [`Hypothesis`] re-expresses estimates (numeric null, algebraic
//!   expression over `b1, b2, ...`, pairwise/reference/sequential contrasts,
//!   or a contrast matrix) and carries the Jacobian along by the chain rule.
//! - [`TestDistribution`] selects the normal or Student's t reference
//!   distribution; [`Equivalence`] runs non-inferiority and non-superiority
//!   tests.
//! - [`InferenceOptions`] and [`Vcov`] configure all of the above.
//!
//! Invariants & assumptions
//! ------------------------
//! - Aggregation happens on estimates *and* Jacobian rows before
//!   [`delta_method_se`] is applied, so covariance between rows is kept.
//! - A NaN Jacobian row means "uncertainty undefined for this estimate";
//!   its standard error and tests are reported as `None`.
//! - All routines return [`InferenceError`] on failure rather than
//!   panicking.
//!
//! Conventions
//! -----------
//! - Jacobians are `m × p`: rows index estimates, columns index parameters.
//! - Hypothesis references are 1-based (`b1` is the first estimate row).
//!
//! Downstream usage
//! ----------------
//! - `margins` calls [`numerical_jacobian`] with a closure that re-enters
//!   the engine under a perturbed parameter vector, then [`summarize`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover Jacobian accuracy, SE formulas, critical values,
//!   hypothesis parsing and transforms, and TOST formulas.
//! - Integration tests in `tests/` check end-to-end SEs against analytic
//!   delta-method values for linear models.

pub mod equivalence;
pub mod errors;
pub mod hypothesis;
pub mod jacobian;
pub mod options;
pub mod stats;
pub mod summary;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::equivalence::{Equivalence, EquivalenceTest};
pub use self::errors::{InferenceError, InferenceResult};
pub use self::hypothesis::{Hypothesis, HypothesisExpr, Transformed};
pub use self::jacobian::{delta_method_se, numerical_jacobian};
pub use self::options::{InferenceOptions, Vcov};
pub use self::stats::{TestDistribution, WaldSummary};
pub use self::summary::{RowInference, SummarySettings, summarize};

pub mod prelude {
    pub use super::equivalence::Equivalence;
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::hypothesis::Hypothesis;
    pub use super::options::{InferenceOptions, Vcov};
    pub use super::stats::TestDistribution;
}
