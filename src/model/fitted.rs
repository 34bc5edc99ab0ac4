//! model::fitted — validated fixed-effects state shared by the adapters.
//!
//! Every built-in adapter carries the same core: a [`DesignSpec`], the
//! estimated coefficients and their covariance, the fitting data, and the
//! response name. [`FixedEffects::new`] validates that bundle once so that
//! the adapters only add their family-specific prediction step.
use crate::{
    data::table::DataTable,
    model::{
        design::DesignSpec,
        errors::{ModelError, ModelResult},
        traits::VariableMeta,
        validation::{validate_params, validate_vcov},
    },
};
use ndarray::{Array1, Array2};

#[derive(Debug, Clone)]
pub struct FixedEffects {
    pub(crate) design: DesignSpec,
    pub(crate) coefficients: Array1<f64>,
    pub(crate) coef_names: Vec<String>,
    pub(crate) vcov: Array2<f64>,
    pub(crate) data: DataTable,
    pub(crate) response: String,
    pub(crate) variables: Vec<VariableMeta>,
}

impl FixedEffects {
    /// Validate and bundle a fitted fixed-effects specification.
    ///
    /// Errors
    /// ------
    /// - `ModelError::ParamDimMismatch` / `NonFiniteParam` for `coefficients`.
    /// - Any covariance error from [`validate_vcov`].
    /// - `ModelError::MissingCovariate` / `UnknownLevel` when the design
    ///   cannot be evaluated on `data`.
    pub fn new(
        design: DesignSpec, coefficients: Array1<f64>, vcov: Array2<f64>, data: DataTable,
        response: &str,
    ) -> ModelResult<FixedEffects> {
        let coef_names = design.coef_names();
        validate_params(&coefficients, coef_names.len())?;
        validate_vcov(&vcov, coef_names.len())?;
        design.design_matrix(&data)?;

        let variables = design
            .covariates()
            .into_iter()
            .filter(|name| name != response)
            .map(|name| match design.factor_levels(&name) {
                Some(levels) => VariableMeta::categorical(&name, levels),
                None => VariableMeta::numeric(&name),
            })
            .collect();

        Ok(FixedEffects {
            design,
            coefficients,
            coef_names,
            vcov,
            data,
            response: response.to_string(),
            variables,
        })
    }

    /// Linear predictor `Xθ` on the rows of `data`.
    pub fn linear_predictor(
        &self, theta: &Array1<f64>, data: &DataTable,
    ) -> ModelResult<Array1<f64>> {
        if theta.len() != self.coef_names.len() {
            return Err(ModelError::ParamDimMismatch {
                expected: self.coef_names.len(),
                found: theta.len(),
            });
        }
        Ok(self.design.design_matrix(data)?.dot(theta))
    }

    pub fn design(&self) -> &DesignSpec {
        &self.design
    }
}
