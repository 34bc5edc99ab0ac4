//! model::linear — Gaussian identity-link adapter (`y = Xβ + ε`).
//!
//! Predictions are the linear predictor itself, so `predict(θ, data)` is
//! exactly linear in `θ` and every delta-method Jacobian of a prediction is
//! a row of the design matrix.
use crate::{
    data::table::DataTable,
    model::{
        design::DesignSpec,
        errors::ModelResult,
        fitted::FixedEffects,
        traits::{ModelHandle, VariableMeta},
    },
};
use ndarray::{Array1, Array2};

/// LinearModel — fitted ordinary least-squares model.
///
/// Fields
/// ------
/// - `fixed`: validated design, coefficients, covariance, and data.
/// - `df_residual`: optional residual degrees of freedom; when set,
///   inference switches from the normal to Student's t.
#[derive(Debug, Clone)]
pub struct LinearModel {
    fixed: FixedEffects,
    df_residual: Option<f64>,
}

impl LinearModel {
    /// Build a linear model handle from fitted output.
    ///
    /// Parameters
    /// ----------
    /// - `design`: `DesignSpec`
    ///   Ordered formula terms; coefficient order follows
    ///   [`DesignSpec::coef_names`].
    /// - `coefficients`: `Array1<f64>`
    ///   Estimated `β̂`.
    /// - `vcov`: `Array2<f64>`
    ///   Covariance of `β̂`.
    /// - `data`: `DataTable`
    ///   Fitting data (default evaluation grid).
    /// - `response`: `&str`
    ///   Response column name.
    ///
    /// Errors
    /// ------
    /// - Any validation error from [`FixedEffects::new`].
    pub fn new(
        design: DesignSpec, coefficients: Array1<f64>, vcov: Array2<f64>, data: DataTable,
        response: &str,
    ) -> ModelResult<LinearModel> {
        let fixed = FixedEffects::new(design, coefficients, vcov, data, response)?;
        Ok(LinearModel { fixed, df_residual: None })
    }

    /// Attach residual degrees of freedom (`n − p` for OLS).
    ///
    /// The value is validated where it is consumed: a non-positive or
    /// non-finite `df` is rejected by the inference layer as
    /// `InferenceError::InvalidDf`.
    pub fn with_df_residual(mut self, df: f64) -> LinearModel {
        self.df_residual = Some(df);
        self
    }
}

impl ModelHandle for LinearModel {
    fn family(&self) -> &str {
        "gaussian"
    }

    fn coefficients(&self) -> &Array1<f64> {
        &self.fixed.coefficients
    }

    fn coef_names(&self) -> &[String] {
        &self.fixed.coef_names
    }

    fn vcov(&self) -> &Array2<f64> {
        &self.fixed.vcov
    }

    fn data(&self) -> &DataTable {
        &self.fixed.data
    }

    fn response(&self) -> &str {
        &self.fixed.response
    }

    fn variables(&self) -> &[VariableMeta] {
        &self.fixed.variables
    }

    fn df_residual(&self) -> Option<f64> {
        self.df_residual
    }

    fn predict(&self, theta: &Array1<f64>, data: &DataTable) -> ModelResult<Array1<f64>> {
        self.fixed.linear_predictor(theta, data)
    }
}
