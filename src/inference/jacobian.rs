//! inference::jacobian — numerical Jacobians and delta-method standard errors.
//!
//! Purpose
//! -------
//! Differentiate an estimate-producing function `g: θ ↦ e` with respect to
//! the model parameters by central differences, and propagate the parameter
//! covariance `Σ` into standard errors `se_k = sqrt(J_k Σ J_kᵀ)`.
//!
//! Key behaviors
//! -------------
//! - [`numerical_jacobian`] evaluates `g(θ ± h_i e_i)` for every parameter
//!   `i` and returns the `m × p` matrix of central differences. The step is
//!   [`step_size`]: relative to `|θ_i|`, floored at [`MIN_STEP`].
//! - With the `parallel` feature, parameter columns are evaluated on the
//!   rayon pool. Results are identical to the sequential path because each
//!   column is a pure function of `θ` and the captured inputs.
//! - [`delta_method_se`] forms the diagonal of `J Σ Jᵀ`; negative round-off
//!   is clamped to zero and non-finite results are reported as `None`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `g` is pure and never mutates the caller's `θ`; perturbed vectors are
//!   fresh copies.
//! - Every evaluation of `g` returns the same length `m`; a mismatch is a
//!   `JacobianDimMismatch`.
//! - A failure of `g` at any perturbed point fails the whole Jacobian (no
//!   partial columns).
//!
//! Conventions
//! -----------
//! - Rows index estimates, columns index parameters.
//! - The error type of `g` is generic so callers keep their own error enum;
//!   it only needs `From<InferenceError>`.
use crate::inference::errors::InferenceError;
use ndarray::{Array1, Array2, Axis};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Relative step for central differences.
pub const REL_STEP: f64 = 1e-4;

/// Lower bound on the absolute step.
pub const MIN_STEP: f64 = 1e-6;

/// Step for parameter value `theta_i`: `max(|θ_i| · REL_STEP, MIN_STEP)`.
pub fn step_size(theta_i: f64) -> f64 {
    (theta_i.abs() * REL_STEP).max(MIN_STEP)
}

/// numerical_jacobian — central-difference Jacobian of `g` at `theta`.
///
/// Parameters
/// ----------
/// - `theta`: `&Array1<f64>`
///   Point of differentiation (length `p`).
/// - `m`: `usize`
///   Expected output length of `g`.
/// - `g`: `&F`
///   Estimate function `θ ↦ e` returning `Result<Array1<f64>, E>`.
///
/// Returns
/// -------
/// `Result<Array2<f64>, E>`
///   An `m × p` matrix with `J[k, i] = (g_k(θ + h_i e_i) − g_k(θ − h_i e_i)) / (2 h_i)`.
///
/// Errors
/// ------
/// - Any error returned by `g`.
/// - `InferenceError::JacobianDimMismatch` (converted into `E`) when an
///   evaluation does not return `m` values.
/// - `InferenceError::NonFiniteJacobian` (converted into `E`) for the first
///   NaN/±inf entry.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use marginal_effects::inference::{InferenceError, jacobian::numerical_jacobian};
/// let g = |t: &ndarray::Array1<f64>| -> Result<_, InferenceError> {
///     Ok(array![t[0] * t[1], t[0] + 2.0 * t[1]])
/// };
/// let jac = numerical_jacobian(&array![2.0, 3.0], 2, &g).unwrap();
/// assert!((jac[[0, 0]] - 3.0).abs() < 1e-6);
/// assert!((jac[[1, 1]] - 2.0).abs() < 1e-6);
/// ```
pub fn numerical_jacobian<F, E>(theta: &Array1<f64>, m: usize, g: &F) -> Result<Array2<f64>, E>
where
    F: Fn(&Array1<f64>) -> Result<Array1<f64>, E> + Sync,
    E: From<InferenceError> + Send,
{
    let p = theta.len();
    let column = |i: usize| -> Result<Array1<f64>, E> {
        let h = step_size(theta[i]);
        let mut up = theta.clone();
        up[i] += h;
        let mut down = theta.clone();
        down[i] -= h;
        let hi = g(&up)?;
        let lo = g(&down)?;
        for found in [hi.len(), lo.len()] {
            if found != m {
                return Err(InferenceError::JacobianDimMismatch { expected: m, found }.into());
            }
        }
        Ok((hi - lo) / (2.0 * h))
    };

    #[cfg(feature = "parallel")]
    let columns: Vec<Array1<f64>> = (0..p).into_par_iter().map(column).collect::<Result<_, E>>()?;
    #[cfg(not(feature = "parallel"))]
    let columns: Vec<Array1<f64>> = (0..p).map(column).collect::<Result<_, E>>()?;

    let mut jac = Array2::<f64>::zeros((m, p));
    for (i, col) in columns.iter().enumerate() {
        jac.column_mut(i).assign(col);
    }
    if let Some(((row, col), _)) = jac.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(InferenceError::NonFiniteJacobian { row, col }.into());
    }
    Ok(jac)
}

/// delta_method_se — standard errors `sqrt(diag(J Σ Jᵀ))`.
///
/// Rows of `jacobian` containing NaN (a block whose Jacobian failed upstream)
/// yield `None`, as does any non-finite quadratic form. Small negative values
/// from round-off are clamped to zero.
///
/// Errors
/// ------
/// - `InferenceError::JacobianDimMismatch` when `jacobian.ncols()` differs
///   from the dimension of `vcov`.
pub fn delta_method_se(
    jacobian: &Array2<f64>, vcov: &Array2<f64>,
) -> Result<Vec<Option<f64>>, InferenceError> {
    if jacobian.ncols() != vcov.nrows() {
        return Err(InferenceError::JacobianDimMismatch {
            expected: vcov.nrows(),
            found: jacobian.ncols(),
        });
    }
    let quad = (jacobian.dot(vcov) * jacobian).sum_axis(Axis(1));
    Ok(quad.iter().map(|&q| if q.is_finite() { Some(q.max(0.0).sqrt()) } else { None }).collect())
}
