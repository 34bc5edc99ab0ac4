//! model::mixed — linear mixed-effects adapter with a single grouping factor.
//!
//! Purpose
//! -------
//! Predict from `y = Xβ + Z b_g + ε`, where `b_g` are the predicted random
//! effects (BLUPs) of group `g`. The parameter vector seen by the engine is
//! the fixed-effects vector `β`; BLUPs are conditioned on and held fixed
//! during Jacobian computation.
//!
//! Key behaviors
//! -------------
//! - [`RandomEffects::Exclude`] (default) gives population-level predictions
//!   `Xβ`; the grouping column is not required in evaluation grids.
//! - [`RandomEffects::Include`] adds `Z b_g` per row. Rows whose group level
//!   has no stored BLUP contribute zero (a new group is predicted at the
//!   population level).
//! - Requesting `Include` on a handle without stored BLUPs is a capability
//!   error (`ModelError::UnsupportedPrediction`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Every BLUP vector has length `random.ncols()`.
//! - The grouping variable is reported as [`VariableKind::Group`] and is
//!   never a focal variable.
//!
//! [`VariableKind::Group`]: crate::model::traits::VariableKind::Group
use crate::{
    data::table::DataTable,
    model::{
        design::DesignSpec,
        errors::{ModelError, ModelResult},
        fitted::FixedEffects,
        traits::{ModelHandle, VariableMeta},
    },
};
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Whether predictions condition on the random effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RandomEffects {
    #[default]
    Exclude,
    Include,
}

#[derive(Debug, Clone)]
struct Blups {
    design: DesignSpec,
    values: BTreeMap<String, Array1<f64>>,
}

/// MixedLinearModel — Gaussian mixed model with one grouping factor.
#[derive(Debug, Clone)]
pub struct MixedLinearModel {
    fixed: FixedEffects,
    group: String,
    variables: Vec<VariableMeta>,
    blups: Option<Blups>,
    mode: RandomEffects,
}

impl MixedLinearModel {
    /// Build a mixed-model handle from its fixed-effects fit.
    ///
    /// Parameters
    /// ----------
    /// - `group`: `&str`
    ///   Grouping column of the fitting data.
    /// - Remaining parameters as in [`FixedEffects::new`].
    ///
    /// Errors
    /// ------
    /// - `ModelError::MissingCovariate` when `data` lacks `group`.
    /// - Any validation error from [`FixedEffects::new`].
    pub fn new(
        design: DesignSpec, coefficients: Array1<f64>, vcov: Array2<f64>, data: DataTable,
        response: &str, group: &str,
    ) -> ModelResult<MixedLinearModel> {
        data.column(group)?;
        let fixed = FixedEffects::new(design, coefficients, vcov, data, response)?;
        let mut variables: Vec<VariableMeta> =
            fixed.variables.iter().filter(|v| v.name != group).cloned().collect();
        variables.push(VariableMeta::group(group));
        Ok(MixedLinearModel {
            fixed,
            group: group.to_string(),
            variables,
            blups: None,
            mode: RandomEffects::Exclude,
        })
    }

    /// Store predicted random effects per group level.
    ///
    /// Parameters
    /// ----------
    /// - `design`: `DesignSpec`
    ///   Random-effects design `Z` (e.g. intercept, or intercept + slope).
    /// - `values`: `BTreeMap<String, Array1<f64>>`
    ///   BLUP vector per group level, each of length `design.ncols()`.
    ///
    /// Errors
    /// ------
    /// - `ModelError::ParamDimMismatch` / `NonFiniteParam` for a malformed
    ///   BLUP vector.
    /// - `ModelError::MissingCovariate` when `Z` cannot be evaluated on the
    ///   fitting data.
    pub fn with_random_effects(
        mut self, design: DesignSpec, values: BTreeMap<String, Array1<f64>>,
    ) -> ModelResult<MixedLinearModel> {
        let q = design.ncols();
        for blup in values.values() {
            crate::model::validation::validate_params(blup, q)?;
        }
        design.design_matrix(&self.fixed.data)?;
        self.blups = Some(Blups { design, values });
        Ok(self)
    }

    /// Select population-level or group-conditional predictions.
    ///
    /// Errors
    /// ------
    /// - `ModelError::UnsupportedPrediction` for `Include` without BLUPs.
    pub fn with_random_effects_mode(
        mut self, mode: RandomEffects,
    ) -> ModelResult<MixedLinearModel> {
        if mode == RandomEffects::Include && self.blups.is_none() {
            return Err(ModelError::UnsupportedPrediction {
                family: self.family().to_string(),
                reason: "group-conditional predictions need stored random effects",
            });
        }
        self.mode = mode;
        Ok(self)
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    fn random_part(&self, blups: &Blups, data: &DataTable) -> ModelResult<Array1<f64>> {
        let z = blups.design.design_matrix(data)?;
        let groups = data.column(&self.group)?;
        let mut out = Array1::<f64>::zeros(data.nrows());
        for (i, row) in z.outer_iter().enumerate() {
            if let Some(b) = blups.values.get(&groups.value(i).to_string()) {
                out[i] = row.dot(b);
            }
        }
        Ok(out)
    }
}

impl ModelHandle for MixedLinearModel {
    fn family(&self) -> &str {
        "gaussian-mixed"
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
        &self.variables
    }

    fn predict(&self, theta: &Array1<f64>, data: &DataTable) -> ModelResult<Array1<f64>> {
        let eta = self.fixed.linear_predictor(theta, data)?;
        match (self.mode, &self.blups) {
            (RandomEffects::Include, Some(blups)) => Ok(eta + self.random_part(blups, data)?),
            (RandomEffects::Include, None) => Err(ModelError::UnsupportedPrediction {
                family: self.family().to_string(),
                reason: "group-conditional predictions need stored random effects",
            }),
            (RandomEffects::Exclude, _) => Ok(eta),
        }
    }
}
