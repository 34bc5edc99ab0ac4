//! margins::options — configuration for the three entry points.
//!
//! Each options struct has public fields, a `Default` matching the
//! documented defaults, and chainable `with_*` setters. Setters taking
//! strings resolve names immediately, so configuration errors surface
//! before any prediction work. Every struct carries an `slog::Logger`
//! (discarding by default).
use crate::{
    data::grid::NewData,
    inference::options::InferenceOptions,
    margins::{
        by::{By, Weights},
        contrasts::VariableSpec,
        errors::MarginsResult,
        estimands::{Comparison, Slope, validate_eps},
    },
    utils::discard_logger,
};
use ndarray::Array1;
use slog::Logger;

/// Default derivative step.
pub const DEFAULT_EPS: f64 = 1e-4;

/// PredictionOptions — configuration for `predictions`.
#[derive(Debug, Clone)]
pub struct PredictionOptions {
    pub newdata: NewData,
    pub by: By,
    pub wts: Option<Weights>,
    pub inference: InferenceOptions,
    pub logger: Logger,
}

impl Default for PredictionOptions {
    fn default() -> Self {
        PredictionOptions {
            newdata: NewData::Observed,
            by: By::None,
            wts: None,
            inference: InferenceOptions::default(),
            logger: discard_logger(),
        }
    }
}

impl PredictionOptions {
    pub fn with_newdata(mut self, newdata: NewData) -> Self {
        self.newdata = newdata;
        self
    }

    pub fn with_by(mut self, by: By) -> Self {
        self.by = by;
        self
    }

    pub fn with_wts(mut self, wts: Weights) -> Self {
        self.wts = Some(wts);
        self
    }

    pub fn with_inference(mut self, inference: InferenceOptions) -> Self {
        self.inference = inference;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }
}

/// ComparisonOptions — configuration for `comparisons`.
///
/// Fields
/// ------
/// - `variables`: focal variables; `None` compares every covariate.
/// - `comparison`: estimand (default `difference`).
/// - `eps`: derivative step (default `1e-4`).
/// - Remaining fields as in [`PredictionOptions`].
#[derive(Debug, Clone)]
pub struct ComparisonOptions {
    pub variables: Option<Vec<VariableSpec>>,
    pub newdata: NewData,
    pub comparison: Comparison,
    pub by: By,
    pub wts: Option<Weights>,
    pub eps: f64,
    pub inference: InferenceOptions,
    pub logger: Logger,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        ComparisonOptions {
            variables: None,
            newdata: NewData::Observed,
            comparison: Comparison::default(),
            by: By::None,
            wts: None,
            eps: DEFAULT_EPS,
            inference: InferenceOptions::default(),
            logger: discard_logger(),
        }
    }
}

impl ComparisonOptions {
    /// Add one focal variable with its default perturbation.
    pub fn with_variable(self, name: &str) -> Self {
        self.with_variable_spec(VariableSpec::new(name))
    }

    pub fn with_variable_spec(mut self, spec: VariableSpec) -> Self {
        self.variables.get_or_insert_with(Vec::new).push(spec);
        self
    }

    pub fn with_variables(mut self, specs: Vec<VariableSpec>) -> Self {
        self.variables = Some(specs);
        self
    }

    pub fn with_newdata(mut self, newdata: NewData) -> Self {
        self.newdata = newdata;
        self
    }

    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Resolve `name` against the estimand registry.
    ///
    /// Errors
    /// ------
    /// - `MarginsError::InvalidComparison` for unknown names.
    pub fn with_comparison_str(self, name: &str) -> MarginsResult<Self> {
        Ok(self.with_comparison(name.parse()?))
    }

    pub fn with_by(mut self, by: By) -> Self {
        self.by = by;
        self
    }

    pub fn with_wts(mut self, wts: Weights) -> Self {
        self.wts = Some(wts);
        self
    }

    pub fn with_weights(self, values: Array1<f64>) -> Self {
        self.with_wts(Weights::Values(values))
    }

    /// Errors
    /// ------
    /// - `MarginsError::InvalidEps` unless `eps` is finite and positive.
    pub fn with_eps(mut self, eps: f64) -> MarginsResult<Self> {
        validate_eps(eps)?;
        self.eps = eps;
        Ok(self)
    }

    pub fn with_inference(mut self, inference: InferenceOptions) -> Self {
        self.inference = inference;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }
}

/// SlopeOptions — configuration for `slopes`; a derivative-only view of
/// [`ComparisonOptions`].
#[derive(Debug, Clone)]
pub struct SlopeOptions {
    pub variables: Option<Vec<VariableSpec>>,
    pub newdata: NewData,
    pub slope: Slope,
    pub by: By,
    pub wts: Option<Weights>,
    pub eps: f64,
    pub inference: InferenceOptions,
    pub logger: Logger,
}

impl Default for SlopeOptions {
    fn default() -> Self {
        SlopeOptions {
            variables: None,
            newdata: NewData::Observed,
            slope: Slope::Dydx,
            by: By::None,
            wts: None,
            eps: DEFAULT_EPS,
            inference: InferenceOptions::default(),
            logger: discard_logger(),
        }
    }
}

impl SlopeOptions {
    pub fn with_variable(mut self, name: &str) -> Self {
        self.variables.get_or_insert_with(Vec::new).push(VariableSpec::new(name));
        self
    }

    pub fn with_newdata(mut self, newdata: NewData) -> Self {
        self.newdata = newdata;
        self
    }

    pub fn with_slope(mut self, slope: Slope) -> Self {
        self.slope = slope;
        self
    }

    /// Errors
    /// ------
    /// - `MarginsError::InvalidSlope` outside `dydx`, `eyex`, `eydx`, `dyex`.
    pub fn with_slope_str(self, name: &str) -> MarginsResult<Self> {
        Ok(self.with_slope(name.parse()?))
    }

    pub fn with_by(mut self, by: By) -> Self {
        self.by = by;
        self
    }

    pub fn with_wts(mut self, wts: Weights) -> Self {
        self.wts = Some(wts);
        self
    }

    pub fn with_eps(mut self, eps: f64) -> MarginsResult<Self> {
        validate_eps(eps)?;
        self.eps = eps;
        Ok(self)
    }

    pub fn with_inference(mut self, inference: InferenceOptions) -> Self {
        self.inference = inference;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }
}

impl From<SlopeOptions> for ComparisonOptions {
    fn from(opts: SlopeOptions) -> Self {
        ComparisonOptions {
            variables: opts.variables,
            newdata: opts.newdata,
            comparison: Comparison::new(opts.slope.estimand()),
            by: opts.by,
            wts: opts.wts,
            eps: opts.eps,
            inference: opts.inference,
            logger: opts.logger,
        }
    }
}
