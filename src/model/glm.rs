//! model::glm — generalized linear model adapter (`μ = g⁻¹(Xβ + offset)`).
//!
//! Purpose
//! -------
//! Rebuild GLM predictions from any parameter vector: evaluate the design,
//! add an optional offset column, and map through the inverse link unless
//! link-scale predictions were requested.
//!
//! Key behaviors
//! -------------
//! - Families are resolved by name with [`resolve_family`]; anything outside
//!   the closed [`Family`] set is a capability error
//!   (`ModelError::UnsupportedFamily`).
//! - [`PredictionType::Link`] returns `η`, [`PredictionType::Response`]
//!   (default) returns `g⁻¹(η)`.
//! - The offset column is read from every evaluation grid, so it must be
//!   present in caller-supplied tables too.
use crate::{
    data::table::DataTable,
    model::{
        design::DesignSpec,
        errors::{ModelError, ModelResult},
        fitted::FixedEffects,
        link::{Family, Link, resolve_family},
        traits::{ModelHandle, VariableMeta},
    },
};
use ndarray::{Array1, Array2};
use std::str::FromStr;

/// Scale on which predictions are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictionType {
    #[default]
    Response,
    Link,
}

impl FromStr for PredictionType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "response" => Ok(PredictionType::Response),
            "link" => Ok(PredictionType::Link),
            _ => Err(ModelError::UnsupportedPrediction {
                family: s.to_string(),
                reason: "prediction type must be 'response' or 'link'",
            }),
        }
    }
}

/// GeneralizedLinearModel — fitted GLM with a closed-form inverse link.
#[derive(Debug, Clone)]
pub struct GeneralizedLinearModel {
    fixed: FixedEffects,
    family: Family,
    link: Link,
    offset: Option<String>,
    prediction_type: PredictionType,
    label: String,
}

impl GeneralizedLinearModel {
    /// Build a GLM handle.
    ///
    /// Parameters
    /// ----------
    /// - `family`, `link`: names resolved through [`resolve_family`];
    ///   `link = None` selects the family default.
    /// - Remaining parameters as in [`FixedEffects::new`].
    ///
    /// Errors
    /// ------
    /// - `ModelError::UnsupportedFamily` for unknown family or link names.
    /// - Any validation error from [`FixedEffects::new`].
    pub fn new(
        design: DesignSpec, coefficients: Array1<f64>, vcov: Array2<f64>, data: DataTable,
        response: &str, family: &str, link: Option<&str>,
    ) -> ModelResult<GeneralizedLinearModel> {
        let (family, link) = resolve_family(family, link)?;
        let fixed = FixedEffects::new(design, coefficients, vcov, data, response)?;
        Ok(GeneralizedLinearModel {
            fixed,
            family,
            link,
            offset: None,
            prediction_type: PredictionType::Response,
            label: format!("{}({})", family.name(), link.name()),
        })
    }

    /// Add a numeric offset column to the linear predictor.
    ///
    /// Errors
    /// ------
    /// - `ModelError::MissingCovariate` when the fitting data lacks `column`.
    /// - `ModelError::Data` when the column is not numeric.
    pub fn with_offset(mut self, column: &str) -> ModelResult<GeneralizedLinearModel> {
        self.fixed.data.numeric(column)?;
        self.offset = Some(column.to_string());
        Ok(self)
    }

    pub fn with_prediction_type(
        mut self, prediction_type: PredictionType,
    ) -> GeneralizedLinearModel {
        self.prediction_type = prediction_type;
        self
    }

    pub fn family_kind(&self) -> Family {
        self.family
    }

    pub fn link(&self) -> Link {
        self.link
    }
}

impl ModelHandle for GeneralizedLinearModel {
    fn family(&self) -> &str {
        &self.label
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

    fn predict(&self, theta: &Array1<f64>, data: &DataTable) -> ModelResult<Array1<f64>> {
        let mut eta = self.fixed.linear_predictor(theta, data)?;
        if let Some(offset) = &self.offset {
            eta += data.numeric(offset)?;
        }
        Ok(match self.prediction_type {
            PredictionType::Link => eta,
            PredictionType::Response => eta.mapv(|e| self.link.inverse(e)),
        })
    }
}
