//! margins — predictions, comparisons, and slopes for fitted models.
//!
//! Purpose
//! -------
//! Turn a [`ModelHandle`](crate::model::ModelHandle) into standardized
//! post-estimation quantities: adjusted predictions, counterfactual
//! contrasts, and partial derivatives, each with delta-method standard
//! errors, confidence intervals, hypothesis tests, and optional equivalence
//! tests.
//!
//! Key behaviors
//! -------------
//! - [`predictions`], [`comparisons`], and [`slopes`] (plus their `avg_*`
//!   forms) share one engine: build the evaluation grid, evaluate blocks of
//!   per-row estimates, differentiate them numerically with respect to the
//!   model parameters, aggregate by group, transform by hypothesis, test.
//! - Estimands form a closed registry ([`Estimand`], [`Comparison`],
//!   [`Slope`]) resolved by name through `FromStr`.
//! - Perturbations are described per focal variable by [`VariableSpec`]:
//!   unit steps, explicit pairs, SD / IQR / range contrasts for numeric
//!   variables, reference / pairwise / sequential contrasts for factors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Estimates and Jacobian rows are aggregated together, before standard
//!   errors are formed.
//! - `slopes(dydx)` and `comparisons(dydx)` produce identical rows.
//! - Inputs (model, data, options) are never mutated.
//!
//! Conventions
//! -----------
//! - Grouped rows are ordered by term block, then by sorted group key.
//! - Undefined quantities (disabled covariance, failed Jacobian) are `None`
//!   in [`EstimateRow`], never NaN.
//!
//! Downstream usage
//! ----------------
//! - Build options with `Default` plus `with_*` setters and call an entry
//!   point; read results from [`MarginsTable`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover estimand formulas, perturbation grids, grouping and
//!   weights, and option defaults.
//! - Integration tests in `tests/` cover analytic derivatives and standard
//!   errors for linear models, averaging, hypotheses, and equivalence.

pub mod by;
pub mod comparisons;
pub mod contrasts;
mod engine;
pub mod errors;
pub mod estimands;
pub mod options;
pub mod output;
pub mod predictions;
pub mod slopes;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::by::{By, Weights};
pub use self::comparisons::{avg_comparisons, comparisons};
pub use self::contrasts::{CategoricalContrast, ContrastSpec, NumericContrast, VariableSpec};
pub use self::errors::{MarginsError, MarginsResult};
pub use self::estimands::{Comparison, Estimand, EstimandInput, Slope};
pub use self::options::{ComparisonOptions, DEFAULT_EPS, PredictionOptions, SlopeOptions};
pub use self::output::{EstimateRow, MarginsTable};
pub use self::predictions::{avg_predictions, predictions};
pub use self::slopes::{avg_slopes, slopes};

pub mod prelude {
    pub use super::by::{By, Weights};
    pub use super::comparisons::{avg_comparisons, comparisons};
    pub use super::contrasts::{CategoricalContrast, NumericContrast, VariableSpec};
    pub use super::errors::{MarginsError, MarginsResult};
    pub use super::estimands::{Comparison, Slope};
    pub use super::options::{ComparisonOptions, PredictionOptions, SlopeOptions};
    pub use super::output::{EstimateRow, MarginsTable};
    pub use super::predictions::{avg_predictions, predictions};
    pub use super::slopes::{avg_slopes, slopes};
}
