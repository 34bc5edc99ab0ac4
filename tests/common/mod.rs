//! Shared fixtures for integration tests.
//!
//! Purpose
//! -------
//! - Provide small, fixed datasets (mtcars, a synthetic regional table, a
//!   synthetic grouped panel) and a closed-form OLS fit so integration
//!   tests can compare engine output against analytic delta-method values.
//!
//! Notes
//! -----
//! - The OLS helper is test-only; the library never fits models.
#![allow(dead_code)]

use marginal_effects::{
    data::{Column, DataTable},
    model::{DesignSpec, LinearModel, Term},
};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

// ---- Datasets ----

/// (name, mpg, cyl, disp, hp, drat, wt, qsec, vs, am, gear, carb)
const MTCARS: [(&str, [f64; 11]); 32] = [
    ("Mazda RX4", [21.0, 6.0, 160.0, 110.0, 3.90, 2.620, 16.46, 0.0, 1.0, 4.0, 4.0]),
    ("Mazda RX4 Wag", [21.0, 6.0, 160.0, 110.0, 3.90, 2.875, 17.02, 0.0, 1.0, 4.0, 4.0]),
    ("Datsun 710", [22.8, 4.0, 108.0, 93.0, 3.85, 2.320, 18.61, 1.0, 1.0, 4.0, 1.0]),
    ("Hornet 4 Drive", [21.4, 6.0, 258.0, 110.0, 3.08, 3.215, 19.44, 1.0, 0.0, 3.0, 1.0]),
    ("Hornet Sportabout", [18.7, 8.0, 360.0, 175.0, 3.15, 3.440, 17.02, 0.0, 0.0, 3.0, 2.0]),
    ("Valiant", [18.1, 6.0, 225.0, 105.0, 2.76, 3.460, 20.22, 1.0, 0.0, 3.0, 1.0]),
    ("Duster 360", [14.3, 8.0, 360.0, 245.0, 3.21, 3.570, 15.84, 0.0, 0.0, 3.0, 4.0]),
    ("Merc 240D", [24.4, 4.0, 146.7, 62.0, 3.69, 3.190, 20.00, 1.0, 0.0, 4.0, 2.0]),
    ("Merc 230", [22.8, 4.0, 140.8, 95.0, 3.92, 3.150, 22.90, 1.0, 0.0, 4.0, 2.0]),
    ("Merc 280", [19.2, 6.0, 167.6, 123.0, 3.92, 3.440, 18.30, 1.0, 0.0, 4.0, 4.0]),
    ("Merc 280C", [17.8, 6.0, 167.6, 123.0, 3.92, 3.440, 18.90, 1.0, 0.0, 4.0, 4.0]),
    ("Merc 450SE", [16.4, 8.0, 275.8, 180.0, 3.07, 4.070, 17.40, 0.0, 0.0, 3.0, 3.0]),
    ("Merc 450SL", [17.3, 8.0, 275.8, 180.0, 3.07, 3.730, 17.60, 0.0, 0.0, 3.0, 3.0]),
    ("Merc 450SLC", [15.2, 8.0, 275.8, 180.0, 3.07, 3.780, 18.00, 0.0, 0.0, 3.0, 3.0]),
    ("Cadillac Fleetwood", [10.4, 8.0, 472.0, 205.0, 2.93, 5.250, 17.98, 0.0, 0.0, 3.0, 4.0]),
    ("Lincoln Continental", [10.4, 8.0, 460.0, 215.0, 3.00, 5.424, 17.82, 0.0, 0.0, 3.0, 4.0]),
    ("Chrysler Imperial", [14.7, 8.0, 440.0, 230.0, 3.23, 5.345, 17.42, 0.0, 0.0, 3.0, 4.0]),
    ("Fiat 128", [32.4, 4.0, 78.7, 66.0, 4.08, 2.200, 19.47, 1.0, 1.0, 4.0, 1.0]),
    ("Honda Civic", [30.4, 4.0, 75.7, 52.0, 4.93, 1.615, 18.52, 1.0, 1.0, 4.0, 2.0]),
    ("Toyota Corolla", [33.9, 4.0, 71.1, 65.0, 4.22, 1.835, 19.90, 1.0, 1.0, 4.0, 1.0]),
    ("Toyota Corona", [21.5, 4.0, 120.1, 97.0, 3.70, 2.465, 20.01, 1.0, 0.0, 3.0, 1.0]),
    ("Dodge Challenger", [15.5, 8.0, 318.0, 150.0, 2.76, 3.520, 16.87, 0.0, 0.0, 3.0, 2.0]),
    ("AMC Javelin", [15.2, 8.0, 304.0, 150.0, 3.15, 3.435, 17.30, 0.0, 0.0, 3.0, 2.0]),
    ("Camaro Z28", [13.3, 8.0, 350.0, 245.0, 3.73, 3.840, 15.41, 0.0, 0.0, 3.0, 4.0]),
    ("Pontiac Firebird", [19.2, 8.0, 400.0, 175.0, 3.08, 3.845, 17.05, 0.0, 0.0, 3.0, 2.0]),
    ("Fiat X1-9", [27.3, 4.0, 79.0, 66.0, 4.08, 1.935, 18.90, 1.0, 1.0, 4.0, 1.0]),
    ("Porsche 914-2", [26.0, 4.0, 120.3, 91.0, 4.43, 2.140, 16.70, 0.0, 1.0, 5.0, 2.0]),
    ("Lotus Europa", [30.4, 4.0, 95.1, 113.0, 3.77, 1.513, 16.90, 1.0, 1.0, 5.0, 2.0]),
    ("Ford Pantera L", [15.8, 8.0, 351.0, 264.0, 4.22, 3.170, 14.50, 0.0, 1.0, 5.0, 4.0]),
    ("Ferrari Dino", [19.7, 6.0, 145.0, 175.0, 3.62, 2.770, 15.50, 0.0, 1.0, 5.0, 6.0]),
    ("Maserati Bora", [15.0, 8.0, 301.0, 335.0, 3.54, 3.570, 14.60, 0.0, 1.0, 5.0, 8.0]),
    ("Volvo 142E", [21.4, 4.0, 121.0, 109.0, 4.11, 2.780, 18.60, 1.0, 1.0, 4.0, 2.0]),
];

const MTCARS_NUMERIC: [&str; 11] =
    ["mpg", "cyl", "disp", "hp", "drat", "wt", "qsec", "vs", "am", "gear", "carb"];

/// The 32-row, 12-column mtcars table (`rownames` plus 11 numeric columns).
pub fn mtcars() -> DataTable {
    let mut columns = vec![(
        "rownames".to_string(),
        Column::categorical(MTCARS.iter().map(|(name, _)| *name)),
    )];
    for (j, name) in MTCARS_NUMERIC.iter().enumerate() {
        columns.push((name.to_string(), Column::numeric(MTCARS.iter().map(|(_, row)| row[j]))));
    }
    DataTable::new(columns).expect("mtcars columns are consistent")
}

/// mtcars with `cyl` recoded as a factor ("4", "6", "8").
pub fn mtcars_factor_cyl() -> DataTable {
    let data = mtcars();
    let cyl: Vec<String> =
        data.numeric("cyl").expect("cyl exists").iter().map(|c| format!("{c}")).collect();
    data.with_column("cyl", Column::categorical(cyl)).expect("same length")
}

/// Deterministic regional table: 40 rows, regions C/E/N/S/W.
///
/// `Literacy = 20 + 0.05·Pop1831 + 0.8·Desertion − 0.001·Pop1831·Desertion + noise`
/// with a bounded deterministic noise term.
pub fn regional() -> DataTable {
    let regions = ["C", "E", "N", "S", "W"];
    let n = 40;
    let region: Vec<&str> = (0..n).map(|i| regions[(i * 3) % 5]).collect();
    let pop: Array1<f64> = (0..n).map(|i| 200.0 + 37.0 * ((i * 7) % 23) as f64).collect();
    let des: Array1<f64> = (0..n).map(|i| 10.0 + ((i * 11) % 31) as f64).collect();
    let noise: Array1<f64> = (0..n).map(|i| ((i * 13) % 17) as f64 - 8.0).collect();
    let lit = 20.0 + &pop * 0.05 + &des * 0.8 - &(&pop * &des) * 0.001 + &noise;
    DataTable::new(vec![
        ("Region".to_string(), Column::categorical(region)),
        ("Pop1831".to_string(), Column::Numeric(pop)),
        ("Desertion".to_string(), Column::Numeric(des)),
        ("Literacy".to_string(), Column::Numeric(lit)),
    ])
    .expect("regional columns are consistent")
}

/// Grouped panel for mixed models: 6 groups × 5 observations.
///
/// `y = 1 + 2·x + u_g + noise` with `u_g = g − 2.5`.
pub fn panel() -> DataTable {
    let mut group = Vec::new();
    let mut x = Vec::new();
    let mut y = Vec::new();
    for g in 0..6 {
        for t in 0..5 {
            let xi = t as f64 + 0.5 * g as f64;
            let noise = (((g * 5 + t) * 7) % 5) as f64 * 0.1 - 0.2;
            group.push(format!("g{}", g + 1));
            x.push(xi);
            y.push(1.0 + 2.0 * xi + (g as f64 - 2.5) + noise);
        }
    }
    DataTable::new(vec![
        ("group".to_string(), Column::categorical(group)),
        ("x".to_string(), Column::numeric(x)),
        ("y".to_string(), Column::numeric(y)),
    ])
    .expect("panel columns are consistent")
}

// ---- Fitting ----

/// Closed-form OLS: `β̂ = (XᵀX)⁻¹Xᵀy`, `V = σ̂²(XᵀX)⁻¹`, `σ̂² = RSS/(n − p)`.
///
/// Returns `(β̂, V, n − p)`.
pub fn ols(x: &Array2<f64>, y: &Array1<f64>) -> (Array1<f64>, Array2<f64>, f64) {
    let (n, p) = x.dim();
    let xm = DMatrix::from_fn(n, p, |i, j| x[[i, j]]);
    let yv = DVector::from_iterator(n, y.iter().copied());
    let xtx_inv = (xm.transpose() * &xm).try_inverse().expect("full-rank design");
    let beta = &xtx_inv * xm.transpose() * &yv;
    let resid = &yv - &xm * &beta;
    let df = (n - p) as f64;
    let sigma2 = resid.dot(&resid) / df;
    let beta = Array1::from_iter(beta.iter().copied());
    let vcov = Array2::from_shape_fn((p, p), |(i, j)| sigma2 * xtx_inv[(i, j)]);
    // Exact symmetry for downstream validation.
    let vcov = (&vcov + &vcov.t()) / 2.0;
    (beta, vcov, df)
}

/// Fit `response ~ design` by OLS and wrap it as a [`LinearModel`].
pub fn fit_linear(design: DesignSpec, data: DataTable, response: &str) -> LinearModel {
    let x = design.design_matrix(&data).expect("design evaluates on data");
    let y = data.numeric(response).expect("numeric response").clone();
    let (beta, vcov, df) = ols(&x, &y);
    LinearModel::new(design, beta, vcov, data, response)
        .expect("OLS output is valid")
        .with_df_residual(df)
}

/// `mpg ~ wt * hp` on mtcars.
pub fn mtcars_wt_hp() -> LinearModel {
    let design = DesignSpec::new(vec![
        Term::Intercept,
        Term::numeric("wt"),
        Term::numeric("hp"),
        Term::interaction(vec![Term::numeric("wt"), Term::numeric("hp")]),
    ]);
    fit_linear(design, mtcars(), "mpg")
}

/// `Literacy ~ Pop1831 * Desertion` on the regional table.
pub fn regional_model() -> LinearModel {
    let design = DesignSpec::new(vec![
        Term::Intercept,
        Term::numeric("Pop1831"),
        Term::numeric("Desertion"),
        Term::interaction(vec![Term::numeric("Pop1831"), Term::numeric("Desertion")]),
    ]);
    fit_linear(design, regional(), "Literacy")
}

// ---- Assertions ----

pub fn assert_close(actual: f64, expected: f64, rtol: f64, what: &str) {
    let scale = expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= rtol * scale,
        "{what}: actual {actual}, expected {expected} (rtol {rtol})"
    );
}
