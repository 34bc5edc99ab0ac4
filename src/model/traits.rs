//! model::traits — the Model Handle interface consumed by the engine.
//!
//! Purpose
//! -------
//! Define the only view of a fitted model that the comparisons engine ever
//! sees: an ordered parameter vector, its covariance matrix, covariate
//! metadata, the data the model was fitted on, and a prediction function
//! that accepts an *arbitrary* parameter vector. The engine never branches
//! on the model family; family-specific behavior lives in adapters.
//!
//! Invariants & assumptions
//! ------------------------
//! - `predict(theta, data)` is pure: it depends only on its arguments and
//!   never mutates the handle. Jacobian computation calls it with perturbed
//!   copies of `theta`, possibly from several threads.
//! - `vcov()` is `p × p` with `p = coefficients().len()`.
//! - `variables()` lists covariates only (never the response).
use crate::{
    data::table::DataTable,
    model::errors::{ModelError, ModelResult},
};
use ndarray::{Array1, Array2};

/// Kind of a model covariate, as far as perturbation rules are concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableKind {
    Numeric,
    Categorical { levels: Vec<String> },
    /// Grouping variable of a mixed-effects model; never perturbed.
    Group,
}

/// Name and kind of one model covariate.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableMeta {
    pub name: String,
    pub kind: VariableKind,
}

impl VariableMeta {
    pub fn numeric(name: &str) -> VariableMeta {
        VariableMeta { name: name.to_string(), kind: VariableKind::Numeric }
    }

    pub fn categorical(name: &str, levels: Vec<String>) -> VariableMeta {
        VariableMeta { name: name.to_string(), kind: VariableKind::Categorical { levels } }
    }

    pub fn group(name: &str) -> VariableMeta {
        VariableMeta { name: name.to_string(), kind: VariableKind::Group }
    }
}

/// ModelHandle — opaque fitted model as seen by the engine.
///
/// Required:
/// - `family()`: human-readable family label used in logs and capability
///   errors.
/// - `coefficients()` / `coef_names()`: ordered parameter vector `θ̂`.
/// - `vcov()`: parameter covariance matrix `Σ`.
/// - `data()`: the data the model was fitted on (default evaluation grid).
/// - `response()`: response column name.
/// - `variables()`: covariate metadata.
/// - `predict(theta, data)`: predictions for every row of `data` under the
///   parameter vector `theta`, without refitting.
///
/// Optional:
/// - `df_residual()`: residual degrees of freedom; when `Some`, p-values and
///   intervals use Student's t instead of the normal approximation.
pub trait ModelHandle: Sync {
    fn family(&self) -> &str;
    fn coefficients(&self) -> &Array1<f64>;
    fn coef_names(&self) -> &[String];
    fn vcov(&self) -> &Array2<f64>;
    fn data(&self) -> &DataTable;
    fn response(&self) -> &str;
    fn variables(&self) -> &[VariableMeta];
    fn predict(&self, theta: &Array1<f64>, data: &DataTable) -> ModelResult<Array1<f64>>;

    fn df_residual(&self) -> Option<f64> {
        None
    }

    /// Metadata for covariate `name`, if the model uses it.
    fn variable(&self, name: &str) -> Option<&VariableMeta> {
        self.variables().iter().find(|v| v.name == name)
    }
}

/// predict_checked — call [`ModelHandle::predict`] and enforce its contract.
///
/// Errors
/// ------
/// - `ModelError::PredictionLength` when the adapter returns the wrong
///   number of values.
/// - `ModelError::NonFinitePrediction` for the first NaN/±inf prediction.
/// - Anything the adapter itself returns.
pub fn predict_checked<M: ModelHandle + ?Sized>(
    model: &M, theta: &Array1<f64>, data: &DataTable,
) -> ModelResult<Array1<f64>> {
    let pred = model.predict(theta, data)?;
    if pred.len() != data.nrows() {
        return Err(ModelError::PredictionLength { expected: data.nrows(), found: pred.len() });
    }
    if let Some((row, &value)) = pred.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(ModelError::NonFinitePrediction { row, value });
    }
    Ok(pred)
}
