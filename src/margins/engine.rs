//! margins::engine — the shared estimate → Jacobian → aggregate → test pipeline.
//!
//! Purpose
//! -------
//! Every entry point reduces to a list of [`Block`]s over one evaluation
//! grid. A block is a pure function `θ ↦ e` from the parameter vector to one
//! estimate per grid row: plain predictions, or an estimand applied to the
//! predictions on two counterfactual grids. The engine evaluates blocks at
//! `θ̂`, differentiates them numerically, aggregates estimates and Jacobian
//! rows together, applies an optional hypothesis transform, and only then
//! forms standard errors and tests.
//!
//! Key behaviors
//! -------------
//! - Configuration is validated before any prediction: inference options,
//!   covariance source, weights, `by` columns, and hypothesis size.
//! - A failed prediction at `θ̂` aborts the call. A failed Jacobian for one
//!   block is logged at `warn` and leaves that block's standard errors
//!   undefined (`None`) without touching other blocks.
//! - The model handle and caller data are never mutated; perturbed
//!   parameter vectors and counterfactual grids are fresh values.
//!
//! Invariants & assumptions
//! ------------------------
//! - All blocks share the grid's row count `n`; the stacked estimate vector
//!   has length `blocks · n` before aggregation.
//! - Aggregation precedes the delta method, so grouped standard errors use
//!   the covariance between member rows.
use crate::{
    data::table::{DataTable, Value},
    inference::{
        jacobian::numerical_jacobian,
        options::{InferenceOptions, Vcov},
        summary::{SummarySettings, summarize},
    },
    margins::{
        by::{By, Group, Weights, aggregate, group_rows},
        contrasts::Perturbation,
        errors::MarginsResult,
        estimands::EstimandInput,
        output::{EstimateRow, MarginsTable},
    },
    model::{
        traits::{ModelHandle, predict_checked},
        validation::validate_vcov,
    },
};
use ndarray::{Array1, Array2, s};
use slog::{Logger, debug, warn};

/// What a block computes for each grid row.
#[derive(Debug, Clone)]
pub(crate) enum Block {
    /// Predictions on the grid itself.
    Prediction,
    /// An estimand over two counterfactual grids.
    Contrast(Perturbation),
}

impl Block {
    fn term(&self) -> Option<String> {
        match self {
            Block::Prediction => None,
            Block::Contrast(p) => Some(p.term.clone()),
        }
    }

    fn contrast(&self) -> Option<String> {
        match self {
            Block::Prediction => None,
            Block::Contrast(p) => Some(p.contrast.clone()),
        }
    }

    /// Per-row estimates under parameter vector `theta`.
    fn evaluate<M: ModelHandle + ?Sized>(
        &self, model: &M, grid: &DataTable, theta: &Array1<f64>,
    ) -> MarginsResult<Array1<f64>> {
        match self {
            Block::Prediction => Ok(predict_checked(model, theta, grid)?),
            Block::Contrast(p) => {
                let hi = predict_checked(model, theta, &p.hi)?;
                let lo = predict_checked(model, theta, &p.lo)?;
                let y = if p.comparison.estimand.needs_baseline() {
                    Some(predict_checked(model, theta, grid)?)
                } else {
                    None
                };
                let input = EstimandInput {
                    hi: &hi,
                    lo: &lo,
                    x_hi: p.x_hi.as_ref(),
                    x_lo: p.x_lo.as_ref(),
                    x: p.x.as_ref(),
                    y: y.as_ref(),
                };
                Ok(p.comparison.estimand.apply(&input))
            }
        }
    }
}

/// Everything the engine needs besides the model.
pub(crate) struct EngineCall<'a> {
    pub grid: DataTable,
    pub blocks: Vec<Block>,
    pub by: By,
    pub wts: Option<&'a Weights>,
    pub inference: &'a InferenceOptions,
    pub logger: &'a Logger,
}

/// run — evaluate blocks and assemble the result table.
///
/// Errors
/// ------
/// - Configuration: `InferenceError` (level, df, bounds, hypothesis size),
///   `ModelError` for an invalid custom covariance matrix,
///   `MarginsError::InvalidWeights`, `MarginsError::UnknownByColumn`.
/// - Computation: any prediction failure at `θ̂`.
pub(crate) fn run<M: ModelHandle + ?Sized>(
    model: &M, call: EngineCall<'_>,
) -> MarginsResult<MarginsTable> {
    let EngineCall { grid, blocks, by, wts, inference, logger } = call;
    let theta = model.coefficients();
    let n = grid.nrows();

    // ---- Configuration ----
    inference.validate()?;
    let dist = inference.distribution(model.df_residual())?;
    let vcov: Option<Array2<f64>> = match &inference.vcov {
        Vcov::Model => Some(model.vcov().clone()),
        Vcov::Disabled => None,
        Vcov::Matrix(v) => {
            validate_vcov(v, theta.len())?;
            Some(v.clone())
        }
    };
    let weights = wts.map(|w| w.resolve(&grid)).transpose()?;
    let groups: Option<Vec<Group>> = match by {
        By::None => None,
        ref other => Some(group_rows(blocks.len(), &grid, other)?),
    };
    let m = groups.as_ref().map_or(blocks.len() * n, Vec::len);
    if let Some(h) = &inference.hypothesis {
        h.check_len(m)?;
    }
    debug!(logger, "engine call";
        "family" => model.family(),
        "grid_rows" => n,
        "blocks" => blocks.len(),
        "estimates" => m,
        "vcov" => vcov.is_some());

    // ---- Point estimates ----
    let mut estimates = Array1::<f64>::zeros(blocks.len() * n);
    for (b, block) in blocks.iter().enumerate() {
        let e = block.evaluate(model, &grid, theta)?;
        estimates.slice_mut(s![b * n..(b + 1) * n]).assign(&e);
    }

    // ---- Jacobian, block by block ----
    let jacobian = vcov.as_ref().map(|_| {
        let mut jac = Array2::<f64>::zeros((blocks.len() * n, theta.len()));
        for (b, block) in blocks.iter().enumerate() {
            let g = |t: &Array1<f64>| block.evaluate(model, &grid, t);
            let mut rows = jac.slice_mut(s![b * n..(b + 1) * n, ..]);
            match numerical_jacobian(theta, n, &g) {
                Ok(jb) => rows.assign(&jb),
                Err(err) => {
                    warn!(logger, "jacobian failed; standard errors undefined for block";
                        "term" => block.term().unwrap_or_default(),
                        "contrast" => block.contrast().unwrap_or_default(),
                        "error" => %err);
                    rows.fill(f64::NAN);
                }
            }
        }
        debug!(logger, "jacobian"; "rows" => jac.nrows(), "cols" => jac.ncols());
        jac
    });

    // ---- Aggregation ----
    let (estimates, jacobian, mut rows_meta) = match &groups {
        None => {
            let meta = blocks
                .iter()
                .flat_map(|block| {
                    (0..n).map(move |r| (block.term(), block.contrast(), Vec::new(), Some(r)))
                })
                .collect::<Vec<_>>();
            (estimates, jacobian, meta)
        }
        Some(groups) => {
            let (est, jac) = aggregate(&estimates, jacobian.as_ref(), groups, weights.as_ref(), n)?;
            let meta = groups
                .iter()
                .map(|g| (blocks[g.block].term(), blocks[g.block].contrast(), g.key.clone(), None))
                .collect::<Vec<_>>();
            (est, jac, meta)
        }
    };
    let mut by_columns = by.column_names();

    // ---- Hypothesis ----
    let (estimates, jacobian) = match &inference.hypothesis {
        Some(h) => match h.apply(&estimates, jacobian.as_ref())? {
            Some(t) => {
                rows_meta = t
                    .labels
                    .into_iter()
                    .map(|label| (Some(label), None, Vec::<Value>::new(), None))
                    .collect();
                by_columns.clear();
                (t.estimates, t.jacobian)
            }
            None => (estimates, jacobian),
        },
        None => (estimates, jacobian),
    };

    // ---- Inference ----
    let empty = Array2::<f64>::zeros((theta.len(), theta.len()));
    let settings = SummarySettings {
        null: inference.null_value(),
        conf_level: inference.conf_level,
        equivalence: inference.equivalence.as_ref(),
        dist,
    };
    let summary =
        summarize(&estimates, jacobian.as_ref(), vcov.as_ref().unwrap_or(&empty), settings)?;

    let rows = rows_meta
        .into_iter()
        .zip(estimates.iter())
        .zip(summary.iter())
        .map(|(((term, contrast, group, rowid), &estimate), inf)| {
            EstimateRow::new(term, contrast, group, rowid, estimate, inf)
        })
        .collect();
    Ok(MarginsTable { by_columns, rows, grid })
}
