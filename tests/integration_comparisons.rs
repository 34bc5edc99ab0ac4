//! Integration tests for comparisons and slopes.
//!
//! Purpose
//! -------
//! - Validate the comparisons engine end to end on fitted models: per-row
//!   contrasts and derivatives, averaging, delta-method standard errors,
//!   equivalence tests, and configuration failures.
//!
//! Coverage
//! --------
//! - `margins::comparisons` / `avg_comparisons` with numeric and factor
//!   focal variables, `…avg` estimands, weights, and `by` groups.
//! - `margins::slopes` / `avg_slopes` as a derivative-only view.
//! - `inference`: analytic delta-method SEs for linear and logit models,
//!   TOST statistics, disabled covariance.
//! - `model`: linear, GLM, and mixed adapters behind `ModelHandle`.
//!
//! Exclusions
//! ----------
//! - Estimand formulas, perturbation labels, and grouping internals, which
//!   are covered by unit tests in `margins`.
mod common;

use common::{assert_close, fit_linear, mtcars, mtcars_factor_cyl, mtcars_wt_hp, panel};
use marginal_effects::{
    inference::{InferenceError, InferenceOptions, Vcov},
    margins::{
        By, CategoricalContrast, Comparison, ComparisonOptions, Estimand, MarginsError,
        NumericContrast, SlopeOptions, VariableSpec, Weights, avg_comparisons, avg_slopes,
        comparisons, slopes,
    },
    model::{
        DesignSpec, GeneralizedLinearModel, MixedLinearModel, ModelError, ModelHandle,
        RandomEffects, Term,
    },
};
use ndarray::{Array1, array};
use std::collections::BTreeMap;

/// `sqrt(j V jᵀ)` for one gradient row.
fn analytic_se(j: &Array1<f64>, vcov: &ndarray::Array2<f64>) -> f64 {
    j.dot(&vcov.dot(j)).sqrt()
}

#[test]
// Purpose
// -------
// Verify `dydx` for `wt` in `mpg ~ wt * hp` against the analytic derivative
// and delta-method standard error, row by row.
//
// Given
// -----
// - OLS fit on mtcars; `comparison = "dydx"`, variable `wt`.
//
// Expect
// ------
// - estimate_i = β_wt + β_wt:hp · hp_i.
// - std_error_i = sqrt(J V Jᵀ) with J = [0, 1, 0, hp_i].
// - Row 0 near the published fit (β ≈ [49.808, −8.217, −0.120, 0.0278]).
fn dydx_matches_analytic_derivative_and_se() {
    // Arrange
    let model = mtcars_wt_hp();
    let beta = model.coefficients().clone();
    let vcov = model.vcov().clone();
    let hp = mtcars().numeric("hp").unwrap().clone();
    let opts = ComparisonOptions::default()
        .with_variable("wt")
        .with_comparison_str("dydx")
        .unwrap();

    // Act
    let table = comparisons(&model, &opts).unwrap();

    // Assert
    assert_eq!(table.len(), 32);
    for (i, row) in table.iter().enumerate() {
        assert_eq!(row.term.as_deref(), Some("wt"));
        assert_eq!(row.contrast.as_deref(), Some("dY/dX"));
        assert_eq!(row.rowid, Some(i));
        let expected = beta[1] + beta[3] * hp[i];
        assert_close(row.estimate, expected, 1e-6, "dydx estimate");
        let j = array![0.0, 1.0, 0.0, hp[i]];
        assert_close(row.std_error.unwrap(), analytic_se(&j, &vcov), 1e-4, "dydx se");
    }
    assert_close(beta[0], 49.80842, 1e-4, "intercept");
    assert_close(table.rows[0].estimate, -8.21662 + 0.02785 * 110.0, 1e-3, "row 0");
}

#[test]
// Purpose
// -------
// Verify that `slopes(dydx)` and `comparisons(dydx)` agree row for row,
// for every focal variable.
//
// Given
// -----
// - `mpg ~ wt * hp`; all covariates (wt, hp).
//
// Expect
// ------
// - Identical terms, contrasts, estimates, and standard errors.
fn slopes_equal_derivative_comparisons() {
    let model = mtcars_wt_hp();
    let cmp = comparisons(
        &model,
        &ComparisonOptions::default().with_comparison(Comparison::new(Estimand::Dydx)),
    )
    .unwrap();
    let slp = slopes(&model, &SlopeOptions::default()).unwrap();

    assert_eq!(cmp.len(), 64);
    assert_eq!(cmp.rows, slp.rows);
    assert_eq!(cmp.filter_term("hp").len(), 32);
}

#[test]
// Purpose
// -------
// Verify that averaging aggregates estimates and Jacobian rows before the
// delta method.
//
// Given
// -----
// - `mpg ~ wt * hp`; `avg_slopes` for `wt` and `comparison = "dydxavg"`.
//
// Expect
// ------
// - One row; estimate = mean of the per-row estimates.
// - std_error = sqrt(J V Jᵀ) with J = [0, 1, 0, mean(hp)].
// - `avg_slopes` and `dydxavg` agree.
fn averaged_slope_uses_mean_jacobian() {
    let model = mtcars_wt_hp();
    let hp_mean = mtcars().numeric("hp").unwrap().mean().unwrap();
    let per_row = slopes(&model, &SlopeOptions::default().with_variable("wt")).unwrap();

    let avg = avg_slopes(&model, &SlopeOptions::default().with_variable("wt")).unwrap();
    let avg_cmp = comparisons(
        &model,
        &ComparisonOptions::default().with_variable("wt").with_comparison_str("dydxavg").unwrap(),
    )
    .unwrap();

    assert_eq!(avg.len(), 1);
    assert_eq!(avg.rows[0].rowid, None);
    assert_close(avg.rows[0].estimate, per_row.estimates().mean().unwrap(), 1e-12, "mean");
    let j = array![0.0, 1.0, 0.0, hp_mean];
    assert_close(avg.rows[0].std_error.unwrap(), analytic_se(&j, model.vcov()), 1e-4, "avg se");
    assert_eq!(avg.rows, avg_cmp.rows);
}

#[test]
// Purpose
// -------
// Verify that `by = All` equals the weighted mean of the per-row estimates.
//
// Given
// -----
// - Default `+1` difference for `hp`; weights from the `disp` column.
//
// Expect
// ------
// - Exact agreement with Σ w_i e_i / Σ w_i.
fn weighted_average_matches_per_row_estimates() {
    let model = mtcars_wt_hp();
    let w = mtcars().numeric("disp").unwrap().clone();
    let base = ComparisonOptions::default().with_variable("hp");
    let per_row = comparisons(&model, &base).unwrap().estimates();

    let table = avg_comparisons(&model, &base.clone().with_wts(Weights::Column("disp".into())))
        .unwrap();

    let expected = (&per_row * &w).sum() / w.sum();
    assert_eq!(table.len(), 1);
    assert_close(table.rows[0].estimate, expected, 1e-12, "weighted mean");
}

#[test]
// Purpose
// -------
// Verify numeric contrasts on a model that is linear in the focal variable.
//
// Given
// -----
// - `mpg ~ wt * hp`; `wt` with the default `+1` step and with `Pair(2, 4)`.
//
// Expect
// ------
// - `+1`: estimate_i = β_wt + β_wt:hp · hp_i.
// - `4 - 2`: twice that.
fn numeric_contrasts_on_linear_model() {
    let model = mtcars_wt_hp();
    let beta = model.coefficients().clone();
    let hp = mtcars().numeric("hp").unwrap().clone();

    let unit = comparisons(&model, &ComparisonOptions::default().with_variable("wt")).unwrap();
    let pair = comparisons(
        &model,
        &ComparisonOptions::default()
            .with_variable_spec(VariableSpec::numeric("wt", NumericContrast::Pair(2.0, 4.0))),
    )
    .unwrap();

    assert_eq!(unit.rows[0].contrast.as_deref(), Some("+1"));
    assert_eq!(pair.rows[0].contrast.as_deref(), Some("4 - 2"));
    for i in 0..32 {
        let slope = beta[1] + beta[3] * hp[i];
        assert_close(unit.rows[i].estimate, slope, 1e-9, "+1");
        assert_close(pair.rows[i].estimate, 2.0 * slope, 1e-9, "4 - 2");
    }
}

#[test]
// Purpose
// -------
// Verify factor contrasts: reference and pairwise level pairs.
//
// Given
// -----
// - `mpg ~ wt + cyl` with `cyl` a factor (4, 6, 8).
//
// Expect
// ------
// - Reference: blocks "6 - 4" and "8 - 4" equal to the dummy coefficients,
//   SE = sqrt(V_jj).
// - Pairwise: adds "8 - 6" with SE sqrt(V66 + V88 − 2 V68).
fn factor_contrasts_reference_and_pairwise() {
    let data = mtcars_factor_cyl();
    let design = DesignSpec::new(vec![
        Term::Intercept,
        Term::numeric("wt"),
        Term::factor("cyl", &data).unwrap(),
    ]);
    let model = fit_linear(design, data, "mpg");
    let beta = model.coefficients().clone();
    let v = model.vcov().clone();
    assert_eq!(model.coef_names(), ["Intercept", "wt", "cyl[T.6]", "cyl[T.8]"]);

    let reference =
        comparisons(&model, &ComparisonOptions::default().with_variable("cyl")).unwrap();
    let pairwise = comparisons(
        &model,
        &ComparisonOptions::default()
            .with_variable_spec(VariableSpec::categorical("cyl", CategoricalContrast::Pairwise)),
    )
    .unwrap();

    assert_eq!(reference.len(), 64);
    let six = reference.filter_contrast("cyl", "6 - 4");
    let eight = reference.filter_contrast("cyl", "8 - 4");
    assert_eq!((six.len(), eight.len()), (32, 32));
    assert_close(six[5].estimate, beta[2], 1e-9, "6 - 4");
    assert_close(eight[5].estimate, beta[3], 1e-9, "8 - 4");
    assert_close(six[5].std_error.unwrap(), v[[2, 2]].sqrt(), 1e-4, "se 6 - 4");

    let eight_six = pairwise.filter_contrast("cyl", "8 - 6");
    assert_eq!(pairwise.len(), 96);
    assert_close(eight_six[0].estimate, beta[3] - beta[2], 1e-9, "8 - 6");
    let se = (v[[2, 2]] + v[[3, 3]] - 2.0 * v[[2, 3]]).sqrt();
    assert_close(eight_six[0].std_error.unwrap(), se, 1e-4, "se 8 - 6");
}

#[test]
// Purpose
// -------
// Verify derivative estimands on a factor fall back to level differences.
//
// Given
// -----
// - `mpg ~ wt + cyl`; `slopes` over all covariates.
//
// Expect
// ------
// - `wt` rows labelled "dY/dX"; `cyl` rows labelled "6 - 4" / "8 - 4".
fn slopes_on_factor_report_differences() {
    let data = mtcars_factor_cyl();
    let design = DesignSpec::new(vec![
        Term::Intercept,
        Term::numeric("wt"),
        Term::factor("cyl", &data).unwrap(),
    ]);
    let model = fit_linear(design, data, "mpg");

    let table = slopes(&model, &SlopeOptions::default()).unwrap();

    assert_eq!(table.len(), 96);
    assert!(table.filter_term("wt").iter().all(|r| r.contrast.as_deref() == Some("dY/dX")));
    assert_eq!(table.filter_contrast("cyl", "8 - 4").len(), 32);
}

#[test]
// Purpose
// -------
// Verify the logit-link derivative and its delta-method SE.
//
// Given
// -----
// - Binomial/logit GLM `am ~ wt` with fixed β = [12.04, −4.024] and a
//   hand-picked covariance.
//
// Expect
// ------
// - dydx_i = β1 p_i (1 − p_i).
// - J_i = [β1 p q (1 − 2p), p q + β1 x p q (1 − 2p)] with q = 1 − p.
fn logit_dydx_matches_analytic_delta_method() {
    let data = mtcars();
    let design = DesignSpec::new(vec![Term::Intercept, Term::numeric("wt")]);
    let beta = array![12.04, -4.024];
    let vcov = array![[19.44, -5.93], [-5.93, 1.906]];
    let model = GeneralizedLinearModel::new(
        design,
        beta.clone(),
        vcov.clone(),
        data.clone(),
        "am",
        "binomial",
        None,
    )
    .unwrap();
    let wt = data.numeric("wt").unwrap().clone();

    let table = slopes(&model, &SlopeOptions::default()).unwrap();

    assert_eq!(model.family(), "binomial(logit)");
    for (i, row) in table.iter().enumerate() {
        let p = 1.0 / (1.0 + (-(beta[0] + beta[1] * wt[i])).exp());
        let q = 1.0 - p;
        assert_close(row.estimate, beta[1] * p * q, 1e-6, "logit dydx");
        let j = array![
            beta[1] * p * q * (1.0 - 2.0 * p),
            p * q + beta[1] * wt[i] * p * q * (1.0 - 2.0 * p)
        ];
        assert_close(row.std_error.unwrap(), analytic_se(&j, &vcov), 1e-4, "logit se");
    }
}

#[test]
// Purpose
// -------
// Verify equivalence statistics on averaged differences.
//
// Given
// -----
// - `differenceavg` for every covariate; bounds [-0.1, 0.1], then
//   [-1e6, 1e6].
//
// Expect
// ------
// - statistic_nonsup = (est − 0.1)/se, statistic_noninf = (est + 0.1)/se.
// - p_value_equiv = max of the one-sided p-values.
// - Very wide bounds push both one-sided p-values to ~0.
fn equivalence_tests_on_averaged_differences() {
    let model = mtcars_wt_hp();
    let opts = |low: f64, high: f64| {
        ComparisonOptions::default()
            .with_comparison_str("differenceavg")
            .unwrap()
            .with_inference(InferenceOptions::default().with_equivalence(low, high).unwrap())
    };

    let narrow = comparisons(&model, &opts(-0.1, 0.1)).unwrap();
    let wide = comparisons(&model, &opts(-1e6, 1e6)).unwrap();

    assert_eq!(narrow.len(), 2);
    for row in narrow.iter() {
        let se = row.std_error.unwrap();
        assert_close(row.statistic_nonsup.unwrap(), (row.estimate - 0.1) / se, 1e-12, "nonsup");
        assert_close(row.statistic_noninf.unwrap(), (row.estimate + 0.1) / se, 1e-12, "noninf");
        let max_p = row.p_value_nonsup.unwrap().max(row.p_value_noninf.unwrap());
        assert_eq!(row.p_value_equiv, Some(max_p));
    }
    for row in wide.iter() {
        assert!(row.p_value_nonsup.unwrap() < 1e-10);
        assert!(row.p_value_noninf.unwrap() < 1e-10);
    }
}

#[test]
// Purpose
// -------
// Verify that a disabled covariance leaves every uncertainty field empty.
//
// Given
// -----
// - `Vcov::Disabled`.
//
// Expect
// ------
// - Estimates present; std_error, statistic, p_value, CI all `None`.
fn disabled_vcov_reports_no_uncertainty() {
    let model = mtcars_wt_hp();
    let opts = ComparisonOptions::default()
        .with_variable("wt")
        .with_inference(InferenceOptions::default().with_vcov(Vcov::Disabled));

    let table = comparisons(&model, &opts).unwrap();

    assert_eq!(table.len(), 32);
    assert!(table.iter().all(|r| r.estimate.is_finite()
        && r.std_error.is_none()
        && r.statistic.is_none()
        && r.p_value.is_none()
        && r.conf_low.is_none()));
}

#[test]
// Purpose
// -------
// Verify that a custom covariance replaces the model's and is validated.
//
// Given
// -----
// - `Vcov::Matrix` equal to 4 × the model covariance; then an asymmetric matrix.
//
// Expect
// ------
// - Standard errors double.
// - The asymmetric matrix is rejected as `ModelError::VcovNotSymmetric`.
fn custom_vcov_scales_standard_errors() {
    let model = mtcars_wt_hp();
    let base = ComparisonOptions::default().with_variable("wt");
    let reference = comparisons(&model, &base).unwrap();
    let scaled = comparisons(
        &model,
        &base.clone().with_inference(
            InferenceOptions::default().with_vcov(Vcov::Matrix(model.vcov() * 4.0)),
        ),
    )
    .unwrap();
    let mut bad = model.vcov().clone();
    bad[[0, 1]] += 1.0;

    let err = comparisons(
        &model,
        &base.with_inference(InferenceOptions::default().with_vcov(Vcov::Matrix(bad))),
    )
    .unwrap_err();

    assert_close(
        scaled.rows[3].std_error.unwrap(),
        2.0 * reference.rows[3].std_error.unwrap(),
        1e-9,
        "scaled se",
    );
    assert!(matches!(err, MarginsError::Model(ModelError::VcovNotSymmetric { .. })));
}

#[test]
// Purpose
// -------
// Verify configuration errors are raised before any prediction work.
//
// Given
// -----
// - Unknown focal variable, the response as focal variable, unknown
//   comparison name, zero eps, unknown `by` column, out-of-range hypothesis.
//
// Expect
// ------
// - The matching `MarginsError` variant for each.
fn configuration_errors_surface_early() {
    let model = mtcars_wt_hp();
    let base = ComparisonOptions::default();

    let unknown = comparisons(&model, &base.clone().with_variable("cyl")).unwrap_err();
    let response = comparisons(&model, &base.clone().with_variable("mpg")).unwrap_err();
    let bad_name = base.clone().with_comparison_str("differential").unwrap_err();
    let bad_slope = SlopeOptions::default().with_slope_str("dxdy").unwrap_err();
    let mut zero_eps = base.clone();
    zero_eps.eps = 0.0;
    let eps = comparisons(&model, &zero_eps).unwrap_err();
    let by = comparisons(&model, &base.clone().with_by(By::column("region"))).unwrap_err();
    let hyp = comparisons(
        &model,
        &base.clone().with_variable("wt").with_inference(
            InferenceOptions::default().with_hypothesis_str("b1 - b33 = 0").unwrap(),
        ),
    )
    .unwrap_err();

    assert!(matches!(unknown, MarginsError::InvalidVariable { .. }));
    assert!(matches!(response, MarginsError::InvalidVariable { .. }));
    assert!(matches!(bad_name, MarginsError::InvalidComparison { .. }));
    assert!(matches!(bad_slope, MarginsError::InvalidSlope { .. }));
    assert!(matches!(eps, MarginsError::InvalidEps { .. }));
    assert!(matches!(by, MarginsError::UnknownByColumn { .. }));
    assert!(matches!(
        hyp,
        MarginsError::Inference(InferenceError::HypothesisIndexOutOfRange { index: 33, len: 32 })
    ));
}

#[test]
// Purpose
// -------
// Verify the mixed-model adapter: slopes ignore random intercepts, and
// group-conditional predictions need stored BLUPs.
//
// Given
// -----
// - `y ~ x` with grouping variable `group`, fixed β = [1, 2], random
//   intercepts u_g = g − 3.5 for g1..g6.
//
// Expect
// ------
// - `group` is not a perturbable covariate (`InvalidVariable`).
// - dydx = 2 in both random-effects modes.
// - `Include` without BLUPs fails with `UnsupportedPrediction`.
fn mixed_model_slopes_and_random_effects() {
    let data = panel();
    let design = DesignSpec::new(vec![Term::Intercept, Term::numeric("x")]);
    let vcov = array![[0.04, -0.01], [-0.01, 0.01]];
    let model =
        MixedLinearModel::new(design, array![1.0, 2.0], vcov, data, "y", "group").unwrap();
    let blups: BTreeMap<String, Array1<f64>> =
        (1..=6).map(|g| (format!("g{g}"), array![g as f64 - 3.5])).collect();
    let conditional = model
        .clone()
        .with_random_effects(DesignSpec::new(vec![Term::Intercept]), blups)
        .unwrap()
        .with_random_effects_mode(RandomEffects::Include)
        .unwrap();

    let pop = slopes(&model, &SlopeOptions::default()).unwrap();
    let cond = slopes(&conditional, &SlopeOptions::default()).unwrap();
    let by_group =
        avg_slopes(&conditional, &SlopeOptions::default().with_by(By::column("group"))).unwrap();
    let perturb_group =
        comparisons(&model, &ComparisonOptions::default().with_variable("group")).unwrap_err();
    let missing = model.clone().with_random_effects_mode(RandomEffects::Include).unwrap_err();

    assert_eq!(pop.len(), 30);
    assert!(pop.iter().chain(cond.iter()).all(|r| (r.estimate - 2.0).abs() < 1e-6));
    assert_eq!(by_group.len(), 6);
    assert_eq!(by_group.by_columns, ["group"]);
    assert!(matches!(perturb_group, MarginsError::InvalidVariable { .. }));
    assert!(matches!(missing, ModelError::UnsupportedPrediction { .. }));
}
