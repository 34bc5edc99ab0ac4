//! inference::summary — from estimates and Jacobians to test results.
//!
//! [`summarize`] is the last stage of every entry point: it forms
//! delta-method standard errors from the (aggregated, possibly
//! hypothesis-transformed) Jacobian and derives Wald statistics, p-values,
//! intervals, and optional equivalence tests per estimate.
use crate::inference::{
    equivalence::{Equivalence, EquivalenceTest},
    errors::InferenceResult,
    jacobian::delta_method_se,
    stats::{TestDistribution, WaldSummary, wald_summary},
};
use ndarray::{Array1, Array2};

/// Uncertainty attached to one estimate. All fields are `None` when the
/// covariance was disabled or the estimate's Jacobian row is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RowInference {
    pub std_error: Option<f64>,
    pub wald: Option<WaldSummary>,
    pub equivalence: Option<EquivalenceTest>,
}

/// Settings consumed by [`summarize`], resolved from the options and model.
#[derive(Debug, Clone, Copy)]
pub struct SummarySettings<'a> {
    pub null: f64,
    pub conf_level: f64,
    pub equivalence: Option<&'a Equivalence>,
    pub dist: TestDistribution,
}

/// summarize — standard errors and tests for every estimate.
///
/// Parameters
/// ----------
/// - `estimates`: `&Array1<f64>`
///   Final point estimates (length `m`).
/// - `jacobian`: `Option<&Array2<f64>>`
///   `m × p` Jacobian, `None` when uncertainty is disabled.
/// - `vcov`: `&Array2<f64>`
///   `p × p` parameter covariance.
/// - `settings`: null value, level, equivalence bounds, distribution.
///
/// Errors
/// ------
/// - `InferenceError::JacobianDimMismatch` from [`delta_method_se`].
pub fn summarize(
    estimates: &Array1<f64>, jacobian: Option<&Array2<f64>>, vcov: &Array2<f64>,
    settings: SummarySettings<'_>,
) -> InferenceResult<Vec<RowInference>> {
    let Some(jacobian) = jacobian else {
        return Ok(vec![RowInference::default(); estimates.len()]);
    };
    let se = delta_method_se(jacobian, vcov)?;
    Ok(estimates
        .iter()
        .zip(se)
        .map(|(&estimate, std_error)| match std_error {
            Some(se) if estimate.is_finite() => RowInference {
                std_error: Some(se),
                wald: Some(wald_summary(
                    estimate,
                    se,
                    settings.null,
                    settings.conf_level,
                    settings.dist,
                )),
                equivalence: settings.equivalence.map(|eq| eq.test(estimate, se, settings.dist)),
            },
            _ => RowInference::default(),
        })
        .collect())
}
