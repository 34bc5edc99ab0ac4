//! margins::predictions — adjusted predictions with delta-method inference.
use crate::{
    margins::{
        engine::{Block, EngineCall, run},
        errors::MarginsResult,
        options::PredictionOptions,
        output::MarginsTable,
    },
    model::traits::ModelHandle,
};

/// predictions — model predictions on the evaluation grid.
///
/// Parameters
/// ----------
/// - `model`: any [`ModelHandle`].
/// - `opts`: grid, grouping, weights, and inference settings.
///
/// Returns
/// -------
/// `MarginsResult<MarginsTable>`
///   One row per grid row (`rowid` set, `term`/`contrast` empty) or, with
///   `by`, one row per group holding the weighted mean prediction.
///
/// Errors
/// ------
/// - Configuration errors from the grid, `by`, weights, or inference options,
///   all raised before any prediction.
/// - `MarginsError::Model` when the model cannot predict at `θ̂`.
///
/// Examples
/// --------
/// ```rust,ignore
/// let opts = PredictionOptions::default()
///     .with_by(By::column("Region"))
///     .with_inference(InferenceOptions::default().with_hypothesis_str("b1 * b3 = b3*2")?);
/// let table = predictions(&model, &opts)?;
/// assert_eq!(table.len(), 1);
/// ```
pub fn predictions<M: ModelHandle + ?Sized>(
    model: &M, opts: &PredictionOptions,
) -> MarginsResult<MarginsTable> {
    let grid = opts.newdata.resolve(model.data())?;
    run(
        model,
        EngineCall {
            grid,
            blocks: vec![Block::Prediction],
            by: opts.by.clone(),
            wts: opts.wts.as_ref(),
            inference: &opts.inference,
            logger: &opts.logger,
        },
    )
}

/// avg_predictions — [`predictions`] averaged over the grid (or `by` groups).
pub fn avg_predictions<M: ModelHandle + ?Sized>(
    model: &M, opts: &PredictionOptions,
) -> MarginsResult<MarginsTable> {
    let opts = PredictionOptions { by: opts.by.or_all(), ..opts.clone() };
    predictions(model, &opts)
}
