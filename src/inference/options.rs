//! inference::options — uncertainty and testing configuration.
//!
//! [`InferenceOptions`] gathers everything that happens after point
//! estimates exist: which covariance matrix to propagate ([`Vcov`]), the
//! interval level, an optional hypothesis transform or null value, optional
//! equivalence bounds, and an optional degrees-of-freedom override.
use crate::inference::{
    equivalence::Equivalence,
    errors::InferenceResult,
    hypothesis::Hypothesis,
    stats::{TestDistribution, validate_conf_level},
};
use ndarray::Array2;

/// Source of the parameter covariance matrix.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Vcov {
    /// Use the model handle's `vcov()`.
    #[default]
    Model,
    /// Skip the Jacobian; standard errors and tests are reported as `None`.
    Disabled,
    /// Caller-supplied matrix (e.g. robust or clustered), validated against
    /// the parameter dimension before use.
    Matrix(Array2<f64>),
}

impl Vcov {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Vcov::Disabled)
    }
}

/// InferenceOptions — configuration for standard errors and tests.
///
/// Fields
/// ------
/// - `vcov`: covariance source (default [`Vcov::Model`]).
/// - `conf_level`: two-sided interval level in `(0, 1)` (default 0.95).
/// - `hypothesis`: optional transform or null value.
/// - `equivalence`: optional TOST bounds.
/// - `df`: degrees of freedom overriding the model's `df_residual()`;
///   `None` on both falls back to the normal distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceOptions {
    pub vcov: Vcov,
    pub conf_level: f64,
    pub hypothesis: Option<Hypothesis>,
    pub equivalence: Option<Equivalence>,
    pub df: Option<f64>,
}

impl InferenceOptions {
    /// Validated constructor.
    ///
    /// Errors
    /// ------
    /// - `InferenceError::InvalidConfLevel` when `conf_level ∉ (0, 1)`.
    /// - `InferenceError::InvalidDf` when `df` is not finite and positive.
    pub fn new(
        vcov: Vcov, conf_level: f64, hypothesis: Option<Hypothesis>,
        equivalence: Option<Equivalence>, df: Option<f64>,
    ) -> InferenceResult<InferenceOptions> {
        let opts = InferenceOptions { vcov, conf_level, hypothesis, equivalence, df };
        opts.validate()?;
        Ok(opts)
    }

    pub fn with_vcov(mut self, vcov: Vcov) -> InferenceOptions {
        self.vcov = vcov;
        self
    }

    pub fn with_conf_level(mut self, conf_level: f64) -> InferenceResult<InferenceOptions> {
        validate_conf_level(conf_level)?;
        self.conf_level = conf_level;
        Ok(self)
    }

    pub fn with_hypothesis(mut self, hypothesis: Hypothesis) -> InferenceOptions {
        self.hypothesis = Some(hypothesis);
        self
    }

    /// Parse and attach a hypothesis string (`"b1 - b2 = 0"`, `"pairwise"`, `"0.5"`).
    pub fn with_hypothesis_str(self, hypothesis: &str) -> InferenceResult<InferenceOptions> {
        Ok(self.with_hypothesis(hypothesis.parse()?))
    }

    pub fn with_equivalence(mut self, low: f64, high: f64) -> InferenceResult<InferenceOptions> {
        self.equivalence = Some(Equivalence::new(low, high)?);
        Ok(self)
    }

    pub fn with_df(mut self, df: f64) -> InferenceResult<InferenceOptions> {
        TestDistribution::new(Some(df))?;
        self.df = Some(df);
        Ok(self)
    }

    /// Re-check invariants of a possibly hand-assembled value.
    pub fn validate(&self) -> InferenceResult<()> {
        validate_conf_level(self.conf_level)?;
        TestDistribution::new(self.df)?;
        if let Some(eq) = &self.equivalence {
            Equivalence::new(eq.low(), eq.high())?;
        }
        Ok(())
    }

    /// Reference distribution given the model's residual df.
    pub fn distribution(&self, model_df: Option<f64>) -> InferenceResult<TestDistribution> {
        TestDistribution::new(self.df.or(model_df))
    }

    pub(crate) fn null_value(&self) -> f64 {
        self.hypothesis.as_ref().map(Hypothesis::null_value).unwrap_or(0.0)
    }
}

impl Default for InferenceOptions {
    fn default() -> Self {
        InferenceOptions {
            vcov: Vcov::Model,
            conf_level: 0.95,
            hypothesis: None,
            equivalence: None,
            df: None,
        }
    }
}
