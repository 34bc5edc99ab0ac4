//! Integration tests for adjusted predictions.
//!
//! Purpose
//! -------
//! - Validate `predictions` / `avg_predictions` end to end: per-row
//!   predictions with t-based inference, `by` groups, hypothesis transforms
//!   over grouped estimates, and synthetic evaluation grids.
//!
//! Coverage
//! --------
//! - `margins::predictions` with `NewData`, `By`, and `InferenceOptions`.
//! - `inference::hypothesis` transforms (expression, pairwise, matrix,
//!   numeric null) applied after aggregation.
//!
//! Exclusions
//! ----------
//! - Parser edge cases and Jacobian accuracy, covered by unit tests.
mod common;

use common::{assert_close, regional, regional_model};
use marginal_effects::{
    data::{Column, DataError, DataTable, GridSpec, NewData, Value},
    inference::{Hypothesis, InferenceOptions},
    margins::{By, MarginsError, PredictionOptions, avg_predictions, predictions},
    model::{DesignSpec, ModelHandle, Term},
};
use ndarray::{Array1, Array2, array};
use statrs::distribution::{ContinuousCDF, StudentsT};

fn regional_design_matrix() -> Array2<f64> {
    DesignSpec::new(vec![
        Term::Intercept,
        Term::numeric("Pop1831"),
        Term::numeric("Desertion"),
        Term::interaction(vec![Term::numeric("Pop1831"), Term::numeric("Desertion")]),
    ])
    .design_matrix(&regional())
    .unwrap()
}

/// Mean design row per region, in sorted region order.
fn region_jacobian() -> Array2<f64> {
    let x = regional_design_matrix();
    let data = regional();
    let region = data.categorical("Region").unwrap();
    let mut out = Array2::<f64>::zeros((5, 4));
    for (k, level) in ["C", "E", "N", "S", "W"].iter().enumerate() {
        let rows: Vec<usize> = (0..region.len()).filter(|&i| region[i] == *level).collect();
        for &i in &rows {
            out.row_mut(k).scaled_add(1.0 / rows.len() as f64, &x.row(i));
        }
    }
    out
}

#[test]
// Purpose
// -------
// Verify per-row predictions and their t-based inference.
//
// Given
// -----
// - OLS `Literacy ~ Pop1831 * Desertion` with residual df n − p = 36.
//
// Expect
// ------
// - estimate_i = x_i β; std_error_i = sqrt(x_i V x_iᵀ).
// - CI = estimate ± t_{0.975, 36} · se; statistic = estimate / se.
fn per_row_predictions_use_student_t() {
    let model = regional_model();
    let x = regional_design_matrix();
    let fitted = x.dot(model.coefficients());
    let t = StudentsT::new(0.0, 1.0, 36.0).unwrap();
    let q = t.inverse_cdf(0.975);

    let table = predictions(&model, &PredictionOptions::default()).unwrap();

    assert_eq!(table.len(), 40);
    assert_eq!(model.df_residual(), Some(36.0));
    for (i, row) in table.iter().enumerate() {
        assert_eq!((row.term.as_ref(), row.contrast.as_ref(), row.rowid), (None, None, Some(i)));
        let se = x.row(i).dot(&model.vcov().dot(&x.row(i))).sqrt();
        assert_close(row.estimate, fitted[i], 1e-12, "prediction");
        assert_close(row.std_error.unwrap(), se, 1e-5, "prediction se");
        let got_se = row.std_error.unwrap();
        assert_close(row.conf_low.unwrap(), row.estimate - q * got_se, 1e-10, "conf_low");
        assert_close(row.conf_high.unwrap(), row.estimate + q * got_se, 1e-10, "conf_high");
        assert_close(row.statistic.unwrap(), row.estimate / got_se, 1e-12, "statistic");
    }
}

#[test]
// Purpose
// -------
// Verify grouped predictions by region.
//
// Given
// -----
// - `by = "Region"` with five regions of eight rows each.
//
// Expect
// ------
// - Five rows keyed C, E, N, S, W; estimate = regional mean prediction.
// - std_error from the mean design row per region.
fn predictions_by_region_average_within_groups() {
    let model = regional_model();
    let jac = region_jacobian();

    let table =
        predictions(&model, &PredictionOptions::default().with_by(By::column("Region"))).unwrap();

    assert_eq!(table.by_columns, ["Region"]);
    let keys: Vec<Value> = table.iter().map(|r| r.group[0].clone()).collect();
    assert_eq!(keys, ["C", "E", "N", "S", "W"].map(Value::from));
    let expected = jac.dot(model.coefficients());
    for (k, row) in table.iter().enumerate() {
        assert_eq!(row.rowid, None);
        assert_close(row.estimate, expected[k], 1e-10, "regional mean");
        let se = jac.row(k).dot(&model.vcov().dot(&jac.row(k))).sqrt();
        assert_close(row.std_error.unwrap(), se, 1e-5, "regional se");
    }
}

#[test]
// Purpose
// -------
// Verify that an expression hypothesis collapses grouped estimates into one
// test.
//
// Given
// -----
// - `by = "Region"`, hypothesis "b1 * b3 = b3*2".
//
// Expect
// ------
// - Exactly one row labelled "b1*b3=b3*2" with no group key.
// - estimate = b1·b3 − 2·b3 from the grouped estimates.
// - statistic = estimate / std_error; SE from gradient [b3, 0, b1 − 2, 0, 0].
fn expression_hypothesis_collapses_groups() {
    let model = regional_model();
    let by = PredictionOptions::default().with_by(By::column("Region"));
    let grouped = predictions(&model, &by).unwrap().estimates();
    let jac = region_jacobian();
    let opts = by
        .clone()
        .with_inference(InferenceOptions::default().with_hypothesis_str("b1 * b3 = b3*2").unwrap());

    let table = predictions(&model, &opts).unwrap();

    assert_eq!(table.len(), 1);
    assert!(table.by_columns.is_empty());
    let row = &table.rows[0];
    assert_eq!(row.term.as_deref(), Some("b1*b3=b3*2"));
    assert!(row.group.is_empty());
    let (b1, b3) = (grouped[0], grouped[2]);
    assert_close(row.estimate, b1 * b3 - b3 * 2.0, 1e-10, "hypothesis estimate");
    let se = row.std_error.unwrap();
    assert_close(row.statistic.unwrap(), row.estimate / se, 1e-12, "hypothesis statistic");
    let g = array![b3, 0.0, b1 - 2.0, 0.0, 0.0];
    let j = g.dot(&jac);
    assert_close(se, j.dot(&model.vcov().dot(&j)).sqrt(), 1e-4, "hypothesis se");
}

#[test]
// Purpose
// -------
// Verify linear hypothesis transforms on grouped predictions.
//
// Given
// -----
// - `by = "Region"`; pairwise, then a 5 × 1 averaging matrix.
//
// Expect
// ------
// - Pairwise: 10 rows, first "b1 - b2" = b1 − b2.
// - Matrix: one row "H1" equal to the mean of the five regional estimates.
fn linear_hypotheses_on_grouped_predictions() {
    let model = regional_model();
    let by = PredictionOptions::default().with_by(By::column("Region"));
    let grouped = predictions(&model, &by).unwrap().estimates();
    let with = |h: Hypothesis| {
        by.clone().with_inference(InferenceOptions::default().with_hypothesis(h))
    };

    let pairwise = predictions(&model, &with(Hypothesis::Pairwise)).unwrap();
    let matrix =
        predictions(&model, &with(Hypothesis::Matrix(Array2::from_elem((5, 1), 0.2)))).unwrap();
    let wrong = predictions(&model, &with(Hypothesis::Matrix(Array2::from_elem((4, 1), 0.25))))
        .unwrap_err();

    assert_eq!(pairwise.len(), 10);
    assert_eq!(pairwise.rows[0].term.as_deref(), Some("b1 - b2"));
    assert_close(pairwise.rows[0].estimate, grouped[0] - grouped[1], 1e-10, "b1 - b2");
    assert_eq!(matrix.rows[0].term.as_deref(), Some("H1"));
    assert_close(matrix.rows[0].estimate, grouped.mean().unwrap(), 1e-10, "H1");
    assert!(matches!(wrong, MarginsError::Inference(_)));
}

#[test]
// Purpose
// -------
// Verify a numeric hypothesis shifts the null without transforming rows.
//
// Given
// -----
// - `avg_predictions` with hypothesis "30".
//
// Expect
// ------
// - One row; statistic = (estimate − 30) / se; CI still centered on the estimate.
fn numeric_hypothesis_shifts_null() {
    let model = regional_model();
    let opts = PredictionOptions::default()
        .with_inference(InferenceOptions::default().with_hypothesis_str("30").unwrap());

    let table = avg_predictions(&model, &opts).unwrap();

    assert_eq!(table.len(), 1);
    let row = &table.rows[0];
    let se = row.std_error.unwrap();
    assert_close(row.statistic.unwrap(), (row.estimate - 30.0) / se, 1e-12, "shifted statistic");
    assert_close(
        (row.conf_low.unwrap() + row.conf_high.unwrap()) / 2.0,
        row.estimate,
        1e-10,
        "CI center",
    );
}

#[test]
// Purpose
// -------
// Verify predictions on synthetic and caller-supplied grids.
//
// Given
// -----
// - `NewData::Mean`, a grid over two Pop1831 values, a caller table, and an
//   empty caller table.
//
// Expect
// ------
// - Mean: one row at the column means.
// - Grid: two rows, retained in `table.grid`.
// - Caller table: one row per input row.
// - Empty table: `DataError::EmptyGrid`.
fn predictions_on_synthetic_grids() {
    let model = regional_model();
    let data = regional();
    let beta = model.coefficients();
    let pop = data.numeric("Pop1831").unwrap().mean().unwrap();
    let des = data.numeric("Desertion").unwrap().mean().unwrap();
    let custom = DataTable::new(vec![
        ("Pop1831".to_string(), Column::numeric([250.0, 400.0, 600.0])),
        ("Desertion".to_string(), Column::numeric([12.0, 20.0, 30.0])),
    ])
    .unwrap();
    let empty = DataTable::new(vec![
        ("Pop1831".to_string(), Column::numeric(Vec::<f64>::new())),
        ("Desertion".to_string(), Column::numeric(Vec::<f64>::new())),
    ])
    .unwrap();

    let mean = predictions(&model, &PredictionOptions::default().with_newdata(NewData::Mean))
        .unwrap();
    let grid = predictions(
        &model,
        &PredictionOptions::default().with_newdata(NewData::Grid(
            GridSpec::new().with_values("Pop1831", vec![300.0, 500.0]),
        )),
    )
    .unwrap();
    let table = predictions(
        &model,
        &PredictionOptions::default().with_newdata(NewData::Table(custom)),
    )
    .unwrap();
    let err = predictions(&model, &PredictionOptions::default().with_newdata(NewData::Table(empty)))
        .unwrap_err();

    let expected = beta.dot(&array![1.0, pop, des, pop * des]);
    assert_eq!(mean.len(), 1);
    assert_close(mean.rows[0].estimate, expected, 1e-10, "prediction at means");
    assert_eq!((grid.len(), grid.grid.nrows(), grid.grid.ncols()), (2, 2, 4));
    assert_eq!(table.len(), 3);
    assert!(table.std_errors().iter().all(|s| s.is_finite() && *s > 0.0));
    assert!(matches!(err, MarginsError::Data(DataError::EmptyGrid)));
}

#[test]
// Purpose
// -------
// Verify weights in grouped predictions and their validation.
//
// Given
// -----
// - `avg_predictions` with explicit weights (1 for region C, 0 elsewhere),
//   then weights of the wrong length and a negative weight.
//
// Expect
// ------
// - The weighted average equals the region-C grouped prediction.
// - Invalid weights fail with `MarginsError::InvalidWeights`.
fn weighted_predictions_and_weight_validation() {
    let model = regional_model();
    let data = regional();
    let region = data.categorical("Region").unwrap();
    let w: Array1<f64> = region.iter().map(|r| if r == "C" { 1.0 } else { 0.0 }).collect();
    let by_region =
        predictions(&model, &PredictionOptions::default().with_by(By::column("Region"))).unwrap();
    let weighted = |w: Array1<f64>| {
        avg_predictions(
            &model,
            &PredictionOptions::default().with_wts(marginal_effects::margins::Weights::Values(w)),
        )
    };

    let only_c = weighted(w).unwrap();
    let short = weighted(Array1::ones(3)).unwrap_err();
    let mut negative = Array1::<f64>::ones(40);
    negative[0] = -1.0;
    let negative = weighted(negative).unwrap_err();

    assert_close(only_c.rows[0].estimate, by_region.rows[0].estimate, 1e-10, "region C");
    assert!(matches!(short, MarginsError::InvalidWeights { .. }));
    assert!(matches!(negative, MarginsError::InvalidWeights { .. }));
}
