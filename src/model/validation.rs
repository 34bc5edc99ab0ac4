//! model::validation — checks on parameter vectors and covariance matrices.
//!
//! Adapters call these once at construction, so that every later call into
//! the engine can assume a finite `θ̂` and a symmetric positive
//! semi-definite `Σ` of matching dimension. The PSD check copies `Σ` into a
//! `nalgebra::DMatrix` and inspects its symmetric eigendecomposition.
//! Singular (rank-deficient) covariance matrices are accepted: the delta
//! method only forms quadratic forms `J Σ Jᵀ` and never inverts `Σ`.
use crate::model::errors::{ModelError, ModelResult};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Relative tolerance for symmetry and for negative eigenvalues.
pub const VCOV_TOL: f64 = 1e-8;

/// Require `p` finite parameters.
pub fn validate_params(theta: &Array1<f64>, p: usize) -> ModelResult<()> {
    if theta.len() != p {
        return Err(ModelError::ParamDimMismatch { expected: p, found: theta.len() });
    }
    if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(ModelError::NonFiniteParam { index, value });
    }
    Ok(())
}

/// validate_vcov — shape, finiteness, symmetry, and PSD checks.
///
/// Parameters
/// ----------
/// - `vcov`: `&Array2<f64>`
///   Candidate covariance matrix.
/// - `p`: `usize`
///   Expected dimension (number of parameters).
///
/// Errors
/// ------
/// - `VcovNotSquare`, `VcovDimMismatch`, `NonFiniteVcov`,
///   `VcovNotSymmetric`, `VcovNotPositiveSemiDefinite`.
///
/// Notes
/// -----
/// - Symmetry is checked up to `VCOV_TOL` relative to the entry scale.
/// - An eigenvalue `λ` is "materially negative" when
///   `λ < -VCOV_TOL · max(1, max |λ|)`.
pub fn validate_vcov(vcov: &Array2<f64>, p: usize) -> ModelResult<()> {
    let (rows, cols) = vcov.dim();
    if rows != cols {
        return Err(ModelError::VcovNotSquare { rows, cols });
    }
    if rows != p {
        return Err(ModelError::VcovDimMismatch { expected: p, found: rows });
    }
    for ((row, col), v) in vcov.indexed_iter() {
        if !v.is_finite() {
            return Err(ModelError::NonFiniteVcov { row, col });
        }
    }
    for i in 0..p {
        for j in 0..i {
            let (a, b) = (vcov[[i, j]], vcov[[j, i]]);
            let scale = a.abs().max(b.abs()).max(1.0);
            if (a - b).abs() > VCOV_TOL * scale {
                return Err(ModelError::VcovNotSymmetric { row: i, col: j });
            }
        }
    }
    if p == 0 {
        return Ok(());
    }
    let sym = DMatrix::<f64>::from_fn(p, p, |i, j| 0.5 * (vcov[[i, j]] + vcov[[j, i]]));
    let eigenvalues = sym.symmetric_eigen().eigenvalues;
    let largest = eigenvalues.iter().fold(1.0_f64, |m, l| m.max(l.abs()));
    if let Some(&eigenvalue) = eigenvalues.iter().find(|&&l| l < -VCOV_TOL * largest) {
        return Err(ModelError::VcovNotPositiveSemiDefinite { eigenvalue });
    }
    Ok(())
}
