//! marginal_effects — adjusted predictions, comparisons, and slopes with
//! delta-method inference for fitted regression models.
//!
//! Purpose
//! -------
//! Serve as the crate root. A fitted model (linear, generalized linear, or
//! linear mixed) is wrapped in a [`model::ModelHandle`]; the `margins`
//! entry points then compute standardized post-estimation quantities that
//! are comparable across model families.
//!
//! Key behaviors
//! -------------
//! - [`data`]: column-oriented tables and the evaluation grid builder
//!   ([`datagrid`]).
//! - [`model`]: the Model Handle interface, design matrices, link
//!   functions, and built-in adapters.
//! - [`margins`]: [`predictions`], [`comparisons`], [`slopes`] and their
//!   `avg_*` forms, with grouping, weights, and output tables.
//! - [`inference`]: numerical Jacobians, delta-method standard errors,
//!   Wald tests, hypothesis transforms, and equivalence (TOST) tests.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every operation is a pure function of (model, data, options); model
//!   handles and caller tables are never mutated.
//! - Configuration errors are reported before any prediction work.
//!
//! Conventions
//! -----------
//! - Each module exposes its primary surface at the module root and a
//!   `prelude` for glob imports.
//! - Errors are module-specific enums with `From` conversions into
//!   [`margins::MarginsError`], the error type of every entry point.
//! - Logging goes through an `slog::Logger` carried in the options structs
//!   (discarding by default); enable `obs_slog` for a terminal drain.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to the code they cover.
//! - Integration tests in `tests/` fit small models with closed-form OLS and
//!   check estimates and standard errors against analytic values.

pub mod data;
pub mod inference;
pub mod margins;
pub mod model;
pub mod utils;

pub use crate::data::{DataTable, GridSpec, NewData, datagrid};
pub use crate::inference::{Hypothesis, InferenceOptions, Vcov};
pub use crate::margins::{
    ComparisonOptions, MarginsError, MarginsResult, MarginsTable, PredictionOptions, SlopeOptions,
    avg_comparisons, avg_predictions, avg_slopes, comparisons, predictions, slopes,
};
pub use crate::model::ModelHandle;
