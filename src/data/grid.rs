//! data::grid — evaluation grid construction.
//!
//! Purpose
//! -------
//! Build the table of covariate rows at which predictions, comparisons, and
//! slopes are evaluated. Three shapes are supported:
//! - the observed data, row for row ([`NewData::Observed`]),
//! - a caller-supplied table ([`NewData::Table`]),
//! - a synthetic grid ([`NewData::Grid`], [`NewData::Mean`],
//!   [`NewData::Median`]) where every column is held at a typical value
//!   unless the caller lists explicit values for it, in which case the grid
//!   is the cross product of those lists.
//!
//! Invariants & assumptions
//! ------------------------
//! - A synthetic grid keeps every column of the source table, in the
//!   source order, so its width equals the source width.
//! - Numeric columns without overrides take the configured
//!   [`NumericSummary`] (mean by default); categorical columns take their
//!   mode (ties resolve to the first sorted level).
//! - The first override varies slowest in the cross product.
//!
//! Conventions
//! -----------
//! - Failures are [`DataError`] values raised before any prediction work:
//!   unknown column names, empty override lists, kind mismatches.
use crate::data::{
    errors::{DataError, DataResult},
    table::{Column, DataTable, Value},
};
use ndarray::Array1;

/// Explicit values for one grid column.
#[derive(Debug, Clone, PartialEq)]
pub enum GridValues {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl GridValues {
    pub fn len(&self) -> usize {
        match self {
            GridValues::Numeric(v) => v.len(),
            GridValues::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value(&self, i: usize) -> Value {
        match self {
            GridValues::Numeric(v) => Value::Num(v[i]),
            GridValues::Categorical(v) => Value::Str(v[i].clone()),
        }
    }
}

impl From<f64> for GridValues {
    fn from(v: f64) -> Self {
        GridValues::Numeric(vec![v])
    }
}

impl From<Vec<f64>> for GridValues {
    fn from(v: Vec<f64>) -> Self {
        GridValues::Numeric(v)
    }
}

impl From<&str> for GridValues {
    fn from(v: &str) -> Self {
        GridValues::Categorical(vec![v.to_string()])
    }
}

impl From<Vec<&str>> for GridValues {
    fn from(v: Vec<&str>) -> Self {
        GridValues::Categorical(v.into_iter().map(str::to_string).collect())
    }
}

/// Summary applied to numeric columns that have no explicit grid values.
#[derive(Debug, Clone, Copy)]
pub enum NumericSummary {
    Mean,
    Median,
    Min,
    Max,
    Custom(fn(&Array1<f64>) -> f64),
}

impl NumericSummary {
    pub fn apply(&self, x: &Array1<f64>) -> f64 {
        match self {
            NumericSummary::Mean => x.mean().unwrap_or(f64::NAN),
            NumericSummary::Median => quantile(x, 0.5),
            NumericSummary::Min => x.iter().copied().fold(f64::INFINITY, f64::min),
            NumericSummary::Max => x.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            NumericSummary::Custom(f) => f(x),
        }
    }
}

/// Grid request: explicit per-column values plus the default numeric summary.
#[derive(Debug, Clone)]
pub struct GridSpec {
    overrides: Vec<(String, GridValues)>,
    numeric: NumericSummary,
}

impl Default for GridSpec {
    fn default() -> Self {
        GridSpec { overrides: Vec::new(), numeric: NumericSummary::Mean }
    }
}

impl GridSpec {
    pub fn new() -> GridSpec {
        GridSpec::default()
    }

    /// Add (or replace) explicit values for `name`.
    pub fn with_values(mut self, name: &str, values: impl Into<GridValues>) -> GridSpec {
        let values = values.into();
        match self.overrides.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = values,
            None => self.overrides.push((name.to_string(), values)),
        }
        self
    }

    pub fn with_numeric_summary(mut self, summary: NumericSummary) -> GridSpec {
        self.numeric = summary;
        self
    }

    pub fn overrides(&self) -> &[(String, GridValues)] {
        &self.overrides
    }
}

/// Where the rows to predict on come from.
#[derive(Debug, Clone, Default)]
pub enum NewData {
    /// The model's own data, row for row.
    #[default]
    Observed,
    /// A caller-supplied table.
    Table(DataTable),
    /// A synthetic grid built from the model's data.
    Grid(GridSpec),
    /// One row: numeric means, categorical modes.
    Mean,
    /// One row: numeric medians, categorical modes.
    Median,
}

impl NewData {
    /// Materialize the evaluation grid against the model's data.
    ///
    /// Errors
    /// ------
    /// - Any [`DataError`] raised by [`datagrid`].
    /// - `DataError::EmptyGrid` when a caller-supplied table has no rows.
    pub fn resolve(&self, source: &DataTable) -> DataResult<DataTable> {
        match self {
            NewData::Observed => Ok(source.clone()),
            NewData::Table(table) => {
                if table.nrows() == 0 {
                    return Err(DataError::EmptyGrid);
                }
                Ok(table.clone())
            }
            NewData::Grid(spec) => datagrid(source, spec),
            NewData::Mean => datagrid(source, &GridSpec::default()),
            NewData::Median => {
                datagrid(source, &GridSpec::default().with_numeric_summary(NumericSummary::Median))
            }
        }
    }
}

/// datagrid — build a synthetic evaluation grid.
///
/// Parameters
/// ----------
/// - `data`: `&DataTable`
///   Source table supplying column names, kinds, and typical values.
/// - `spec`: `&GridSpec`
///   Explicit values per column and the summary for the remaining numeric
///   columns.
///
/// Returns
/// -------
/// `DataResult<DataTable>`
///   A table with `Π |values|` rows (1 when no overrides are given) and
///   exactly the columns of `data`, in the same order.
///
/// Errors
/// ------
/// - `DataError::EmptyTable` when `data` has no rows to summarize.
/// - `DataError::UnknownColumn` when an override names a missing column.
/// - `DataError::EmptyValues` when an override lists no values.
/// - `DataError::ColumnKindMismatch` when override and column kinds differ.
/// - `DataError::EmptyGrid` when the cross product is empty.
///
/// Examples
/// --------
/// ```rust
/// # use marginal_effects::data::{Column, DataTable, GridSpec, datagrid};
/// # use ndarray::array;
/// let data = DataTable::new(vec![
///     ("mpg".to_string(), Column::Numeric(array![21.0, 22.8, 18.7])),
///     ("hp".to_string(), Column::Numeric(array![110.0, 93.0, 175.0])),
/// ]).unwrap();
/// let grid = datagrid(&data, &GridSpec::new().with_values("mpg", vec![23.0, 24.0])).unwrap();
/// assert_eq!((grid.nrows(), grid.ncols()), (2, 2));
/// ```
pub fn datagrid(data: &DataTable, spec: &GridSpec) -> DataResult<DataTable> {
    if data.nrows() == 0 {
        return Err(DataError::EmptyTable);
    }
    for (name, values) in &spec.overrides {
        let column = data.column(name)?;
        if values.is_empty() {
            return Err(DataError::EmptyValues { name: name.clone() });
        }
        let kinds_match = matches!(
            (column, values),
            (Column::Numeric(_), GridValues::Numeric(_))
                | (Column::Categorical(_), GridValues::Categorical(_))
        );
        if !kinds_match {
            return Err(DataError::ColumnKindMismatch {
                name: name.clone(),
                expected: column.kind_name(),
            });
        }
    }

    let sizes: Vec<usize> = spec.overrides.iter().map(|(_, v)| v.len()).collect();
    let nrows: usize = sizes.iter().product();
    if nrows == 0 {
        return Err(DataError::EmptyGrid);
    }

    let mut columns = Vec::with_capacity(data.ncols());
    for (name, column) in data.iter() {
        let grid_col = match spec.overrides.iter().position(|(n, _)| n == name) {
            Some(k) => cross_product_column(&spec.overrides[k].1, &sizes, k, nrows),
            None => {
                let typical = match column {
                    Column::Numeric(x) => Value::Num(spec.numeric.apply(x)),
                    Column::Categorical(_) => column.mode().ok_or(DataError::EmptyTable)?,
                };
                Column::repeat(&typical, nrows)
            }
        };
        columns.push((name.to_string(), grid_col));
    }
    DataTable::new(columns)
}

// ---- Helper methods ----

/// Expand override `k` so that earlier overrides vary slowest.
fn cross_product_column(values: &GridValues, sizes: &[usize], k: usize, nrows: usize) -> Column {
    let inner: usize = sizes[k + 1..].iter().product();
    let len = sizes[k];
    let picked: Vec<Value> = (0..nrows).map(|r| values.value((r / inner) % len)).collect();
    match values {
        GridValues::Numeric(_) => {
            Column::Numeric(picked.iter().filter_map(Value::as_f64).collect())
        }
        GridValues::Categorical(_) => Column::Categorical(
            picked
                .into_iter()
                .filter_map(|v| match v {
                    Value::Str(s) => Some(s),
                    Value::Num(_) => None,
                })
                .collect(),
        ),
    }
}

/// Linear-interpolation quantile (type 7), used by the median summary and
/// the IQR contrast.
pub(crate) fn quantile(x: &Array1<f64>, p: f64) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    let mut sorted: Vec<f64> = x.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}
