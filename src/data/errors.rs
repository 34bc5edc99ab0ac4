//! data::errors — error types for tables and evaluation grids.
//!
//! Purpose
//! -------
//! Provide the error enum and result alias used by the tabular substrate
//! ([`DataTable`](crate::data::table::DataTable)) and by the evaluation grid
//! builder ([`datagrid`](crate::data::grid::datagrid)). Every variant is a
//! configuration-style failure: it is raised before any prediction work is
//! attempted and never silently defaulted.
//!
//! Conventions
//! -----------
//! - Column names are carried verbatim so that messages point at the exact
//!   reference the caller supplied.
//! - Row indices are 0-based.

/// Result alias for table and grid operations.
pub type DataResult<T> = Result<T, DataError>;

/// DataError — validation failures for tables and grids.
///
/// Variants
/// --------
/// - `UnknownColumn { name }`
///   A referenced column does not exist in the table.
/// - `DuplicateColumn { name }`
///   A table was built with the same column name twice.
/// - `LengthMismatch { name, expected, found }`
///   A column's length differs from the table's row count.
/// - `EmptyTable`
///   A table without columns or rows was supplied where data is required.
/// - `EmptyGrid`
///   The requested cross product of grid values is empty.
/// - `EmptyValues { name }`
///   A grid override supplied zero values for a column.
/// - `ColumnKindMismatch { name, expected }`
///   A numeric operation was requested on a categorical column, or the
///   reverse.
/// - `RowOutOfRange { index, nrows }`
///   Row selection referenced an index past the end of the table.
/// - `NonFiniteValue { name, index, value }`
///   A numeric column contains NaN or ±∞ where finite data is required.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    // ---- Column references ----
    UnknownColumn { name: String },
    DuplicateColumn { name: String },
    LengthMismatch { name: String, expected: usize, found: usize },
    ColumnKindMismatch { name: String, expected: &'static str },

    // ---- Shapes ----
    EmptyTable,
    EmptyGrid,
    EmptyValues { name: String },
    RowOutOfRange { index: usize, nrows: usize },

    // ---- Values ----
    NonFiniteValue { name: String, index: usize, value: f64 },
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::UnknownColumn { name } => {
                write!(f, "Data Error: unknown column '{name}'")
            }
            DataError::DuplicateColumn { name } => {
                write!(f, "Data Error: column '{name}' appears more than once")
            }
            DataError::LengthMismatch { name, expected, found } => write!(
                f,
                "Data Error: column '{name}' has {found} rows but the table has {expected}"
            ),
            DataError::ColumnKindMismatch { name, expected } => {
                write!(f, "Data Error: column '{name}' must be {expected}")
            }
            DataError::EmptyTable => write!(f, "Data Error: table has no rows or no columns"),
            DataError::EmptyGrid => {
                write!(f, "Data Error: the requested grid has no rows (empty cross product)")
            }
            DataError::EmptyValues { name } => {
                write!(f, "Data Error: no grid values supplied for column '{name}'")
            }
            DataError::RowOutOfRange { index, nrows } => {
                write!(f, "Data Error: row {index} out of range for a table with {nrows} rows")
            }
            DataError::NonFiniteValue { name, index, value } => write!(
                f,
                "Data Error: column '{name}' has non-finite value {value} at row {index}"
            ),
        }
    }
}
