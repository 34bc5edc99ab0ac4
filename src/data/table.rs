//! data::table — minimal columnar table used as the evaluation substrate.
//!
//! Purpose
//! -------
//! Represent covariate data as an ordered set of named, equally long columns
//! that are either numeric (`Array1<f64>`) or categorical (`Vec<String>`).
//! This is deliberately not a dataframe engine: it offers exactly what grid
//! construction, counterfactual perturbation, grouping, and design-matrix
//! assembly need.
//!
//! Invariants & assumptions
//! ------------------------
//! - Column names are unique and every column has `nrows` entries.
//! - Row order is stable; row `i` is the identity of per-row estimates.
//! - Tables are values: every "mutating" helper used by the engine returns a
//!   fresh table, so model inputs are never modified across calls.
use crate::data::errors::{DataError, DataResult};
use ndarray::Array1;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A single cell value, used for grid overrides, group keys, and output.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Str(String),
}

impl Value {
    /// Total order over values: numbers (by `total_cmp`) sort before strings.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Num(_), Value::Str(_)) => Ordering::Less,
            (Value::Str(_), Value::Num(_)) => Ordering::Greater,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Num(v) => Some(*v),
            Value::Str(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Num(v) => write!(f, "{}", crate::utils::format_number(*v)),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Num(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// A named column's storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Array1<f64>),
    Categorical(Vec<String>),
}

impl Column {
    /// Build a categorical column from anything string-like.
    pub fn categorical<I, S>(values: I) -> Column
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Column::Categorical(values.into_iter().map(Into::into).collect())
    }

    pub fn numeric<I: IntoIterator<Item = f64>>(values: I) -> Column {
        Column::Numeric(values.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    pub fn as_numeric(&self) -> Option<&Array1<f64>> {
        match self {
            Column::Numeric(v) => Some(v),
            Column::Categorical(_) => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&[String]> {
        match self {
            Column::Categorical(v) => Some(v),
            Column::Numeric(_) => None,
        }
    }

    /// Cell value at row `i`. Callers guarantee `i < len()`.
    pub fn value(&self, i: usize) -> Value {
        match self {
            Column::Numeric(v) => Value::Num(v[i]),
            Column::Categorical(v) => Value::Str(v[i].clone()),
        }
    }

    /// Distinct levels in sorted order (categorical columns only).
    pub fn levels(&self) -> Vec<String> {
        match self {
            Column::Categorical(v) => {
                let mut levels: Vec<String> = v.to_vec();
                levels.sort();
                levels.dedup();
                levels
            }
            Column::Numeric(_) => Vec::new(),
        }
    }

    /// Most frequent level; ties resolve to the first level in sorted order.
    pub fn mode(&self) -> Option<Value> {
        match self {
            Column::Categorical(v) => {
                let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
                for s in v {
                    *counts.entry(s.as_str()).or_insert(0) += 1;
                }
                let mut best: Option<(&str, usize)> = None;
                for (level, count) in counts {
                    if best.map_or(true, |(_, c)| count > c) {
                        best = Some((level, count));
                    }
                }
                best.map(|(level, _)| Value::Str(level.to_string()))
            }
            Column::Numeric(v) => {
                let mut sorted: Vec<f64> = v.to_vec();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let mut best: Option<(f64, usize)> = None;
                let mut i = 0;
                while i < sorted.len() {
                    let mut j = i;
                    while j < sorted.len() && sorted[j] == sorted[i] {
                        j += 1;
                    }
                    if best.map_or(true, |(_, c)| j - i > c) {
                        best = Some((sorted[i], j - i));
                    }
                    i = j;
                }
                best.map(|(v, _)| Value::Num(v))
            }
        }
    }

    /// Gather the given rows into a new column.
    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&i| v[i]).collect()),
            Column::Categorical(v) => {
                Column::Categorical(rows.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }

    /// A column holding `value` on each of `n` rows.
    pub fn repeat(value: &Value, n: usize) -> Column {
        match value {
            Value::Num(x) => Column::Numeric(Array1::from_elem(n, *x)),
            Value::Str(s) => Column::Categorical(vec![s.clone(); n]),
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Column::Numeric(_) => "numeric",
            Column::Categorical(_) => "categorical",
        }
    }
}

/// DataTable — ordered, named, equally long columns.
///
/// Fields are private so that the shape invariants established by
/// [`DataTable::new`] cannot be broken afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    names: Vec<String>,
    columns: Vec<Column>,
    nrows: usize,
}

impl DataTable {
    /// Build a validated table.
    ///
    /// Parameters
    /// ----------
    /// - `columns`: `Vec<(String, Column)>`
    ///   Named columns in display order. At least one column is required and
    ///   all columns must have the same length.
    ///
    /// Errors
    /// ------
    /// - `DataError::EmptyTable` when `columns` is empty.
    /// - `DataError::DuplicateColumn` when a name repeats.
    /// - `DataError::LengthMismatch` when lengths differ from the first column.
    pub fn new(columns: Vec<(String, Column)>) -> DataResult<DataTable> {
        let nrows = match columns.first() {
            Some((_, col)) => col.len(),
            None => return Err(DataError::EmptyTable),
        };
        let mut names = Vec::with_capacity(columns.len());
        let mut cols = Vec::with_capacity(columns.len());
        for (name, col) in columns {
            if names.contains(&name) {
                return Err(DataError::DuplicateColumn { name });
            }
            if col.len() != nrows {
                return Err(DataError::LengthMismatch { name, expected: nrows, found: col.len() });
            }
            names.push(name);
            cols.push(col);
        }
        Ok(DataTable { names, columns: cols, nrows })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Iterate `(name, column)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    pub fn column(&self, name: &str) -> DataResult<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| DataError::UnknownColumn { name: name.to_string() })
    }

    pub fn numeric(&self, name: &str) -> DataResult<&Array1<f64>> {
        self.column(name)?.as_numeric().ok_or_else(|| DataError::ColumnKindMismatch {
            name: name.to_string(),
            expected: "numeric",
        })
    }

    pub fn categorical(&self, name: &str) -> DataResult<&[String]> {
        self.column(name)?.as_categorical().ok_or_else(|| DataError::ColumnKindMismatch {
            name: name.to_string(),
            expected: "categorical",
        })
    }

    /// Replace column `name` (or append it when absent), returning a new table.
    ///
    /// Errors
    /// ------
    /// - `DataError::LengthMismatch` when `column` does not have `nrows` rows.
    pub fn with_column(&self, name: &str, column: Column) -> DataResult<DataTable> {
        let mut out = self.clone();
        out.set_column(name, column)?;
        Ok(out)
    }

    /// In-place variant of [`DataTable::with_column`] for tables the caller owns.
    pub fn set_column(&mut self, name: &str, column: Column) -> DataResult<()> {
        if column.len() != self.nrows {
            return Err(DataError::LengthMismatch {
                name: name.to_string(),
                expected: self.nrows,
                found: column.len(),
            });
        }
        match self.names.iter().position(|n| n == name) {
            Some(i) => self.columns[i] = column,
            None => {
                self.names.push(name.to_string());
                self.columns.push(column);
            }
        }
        Ok(())
    }

    /// Gather rows (in the given order, duplicates allowed) into a new table.
    pub fn take_rows(&self, rows: &[usize]) -> DataResult<DataTable> {
        if let Some(&index) = rows.iter().find(|&&i| i >= self.nrows) {
            return Err(DataError::RowOutOfRange { index, nrows: self.nrows });
        }
        Ok(DataTable {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            nrows: rows.len(),
        })
    }

    /// Cell value of column `name` at row `i`.
    pub fn value(&self, name: &str, i: usize) -> DataResult<Value> {
        let col = self.column(name)?;
        if i >= self.nrows {
            return Err(DataError::RowOutOfRange { index: i, nrows: self.nrows });
        }
        Ok(col.value(i))
    }
}
