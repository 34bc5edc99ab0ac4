//! margins::slopes — partial derivatives and elasticities.
//!
//! A slope is a comparison whose estimand is a numerical derivative, so both
//! entry points delegate to [`comparisons`] after converting the options.
use crate::{
    margins::{
        comparisons::comparisons,
        errors::MarginsResult,
        options::{ComparisonOptions, SlopeOptions},
        output::MarginsTable,
    },
    model::traits::ModelHandle,
};

/// slopes — `dydx`, `eyex`, `eydx`, or `dyex` for each focal variable.
///
/// Categorical focal variables report level differences (`hi - lo`), as
/// derivatives are undefined for them.
///
/// Errors
/// ------
/// - Same as [`comparisons`].
pub fn slopes<M: ModelHandle + ?Sized>(
    model: &M, opts: &SlopeOptions,
) -> MarginsResult<MarginsTable> {
    comparisons(model, &ComparisonOptions::from(opts.clone()))
}

/// avg_slopes — average slopes over the grid (or `by` groups).
pub fn avg_slopes<M: ModelHandle + ?Sized>(
    model: &M, opts: &SlopeOptions,
) -> MarginsResult<MarginsTable> {
    let opts = SlopeOptions { by: opts.by.or_all(), ..opts.clone() };
    slopes(model, &opts)
}
