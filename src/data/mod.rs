//! data — tabular substrate and evaluation grids.
//!
//! Purpose
//! -------
//! Hold covariate data in a small, validated columnar table and build the
//! grids at which a fitted model is queried: the observed rows, a
//! caller-supplied table, or a synthetic cross product of typical values and
//! explicit overrides.
//!
//! Key behaviors
//! -------------
//! - [`DataTable`] stores ordered, named, equally long [`Column`]s (numeric
//!   or categorical) and hands out fresh copies for every counterfactual
//!   edit, so caller data is never mutated.
//! - [`datagrid`] builds a synthetic grid from a [`GridSpec`]; unspecified
//!   numeric columns take a [`NumericSummary`] (mean by default) and
//!   unspecified categorical columns take their mode.
//! - [`NewData`] selects between observed rows, a caller table, and the
//!   synthetic grids, and is resolved once per call.
//!
//! Invariants & assumptions
//! ------------------------
//! - Row order is stable and is the identity of per-row estimates.
//! - All failures are [`DataError`] values; nothing here panics on user
//!   input.
//!
//! Downstream usage
//! ----------------
//! - Model adapters read covariates from a [`DataTable`] when building
//!   design matrices.
//! - The comparisons engine resolves [`NewData`] and then perturbs one
//!   focal column at a time with [`DataTable::with_column`].

pub mod errors;
pub mod grid;
pub mod table;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{DataError, DataResult};
pub use self::grid::{GridSpec, GridValues, NewData, NumericSummary, datagrid};
pub use self::table::{Column, DataTable, Value};

pub mod prelude {
    pub use super::errors::{DataError, DataResult};
    pub use super::grid::{GridSpec, GridValues, NewData, NumericSummary, datagrid};
    pub use super::table::{Column, DataTable, Value};
}
