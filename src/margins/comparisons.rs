//! margins::comparisons — counterfactual contrasts and their inference.
//!
//! For every focal variable the evaluation grid is copied twice with only
//! that variable changed ("low" and "high" rows); the estimand turns the two
//! prediction vectors into one estimate per row. Categorical variables yield
//! one block per level pair; numeric variables yield exactly one block.
use crate::{
    margins::{
        contrasts::{perturbations, resolve_variables},
        engine::{Block, EngineCall, run},
        errors::MarginsResult,
        estimands::validate_eps,
        options::ComparisonOptions,
        output::MarginsTable,
    },
    model::traits::ModelHandle,
};
use slog::debug;

/// comparisons — contrasts or derivatives of predictions for focal variables.
///
/// Parameters
/// ----------
/// - `model`: any [`ModelHandle`].
/// - `opts`: focal variables, estimand, `eps`, grid, grouping, weights,
///   and inference settings.
///
/// Returns
/// -------
/// `MarginsResult<MarginsTable>`
///   Blocks in focal-variable order (level pairs in sorted order within a
///   categorical variable). Without `by` each block holds one row per grid
///   row; with `by`, or an `…avg` estimand, one row per group.
///
/// Errors
/// ------
/// - `MarginsError::InvalidEps`, `InvalidVariable`, `EmptyVariables`,
///   `UnsupportedContrast`, plus grid and inference configuration errors.
///   All are raised before any prediction.
/// - `MarginsError::Model` when the model cannot predict at `θ̂`.
///
/// Notes
/// -----
/// - Derivative estimands evaluate `x ± eps/2` with an absolute `eps`.
/// - A focal variable whose Jacobian fails keeps its estimates but reports
///   no standard errors; other variables are unaffected.
pub fn comparisons<M: ModelHandle + ?Sized>(
    model: &M, opts: &ComparisonOptions,
) -> MarginsResult<MarginsTable> {
    validate_eps(opts.eps)?;
    opts.inference.validate()?;
    let focal = resolve_variables(model, opts.variables.as_deref())?;
    let grid = opts.newdata.resolve(model.data())?;

    let mut blocks = Vec::new();
    for (spec, kind) in &focal {
        let sets =
            perturbations(spec, kind, &grid, model.data(), opts.comparison, opts.eps)?;
        blocks.extend(sets.into_iter().map(Block::Contrast));
    }
    debug!(opts.logger, "comparisons";
        "comparison" => opts.comparison.name(),
        "variables" => focal.len(),
        "blocks" => blocks.len());

    let by = if opts.comparison.avg { opts.by.or_all() } else { opts.by.clone() };
    run(
        model,
        EngineCall {
            grid,
            blocks,
            by,
            wts: opts.wts.as_ref(),
            inference: &opts.inference,
            logger: &opts.logger,
        },
    )
}

/// avg_comparisons — [`comparisons`] averaged over the grid (or `by` groups).
pub fn avg_comparisons<M: ModelHandle + ?Sized>(
    model: &M, opts: &ComparisonOptions,
) -> MarginsResult<MarginsTable> {
    let opts = ComparisonOptions { by: opts.by.or_all(), ..opts.clone() };
    comparisons(model, &opts)
}
