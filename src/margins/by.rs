//! margins::by — grouping keys, weights, and estimate/Jacobian aggregation.
//!
//! Purpose
//! -------
//! Collapse per-row estimates to group-level estimates with weighted means,
//! applying the *same* weighted mean to the Jacobian rows so that standard
//! errors computed afterwards keep the covariance between rows.
//!
//! Key behaviors
//! -------------
//! - [`By::None`] keeps one row per grid row and block; [`By::All`] yields
//!   one row per block; [`By::Columns`] one row per block and distinct key.
//! - Groups are ordered by block, then by key in sorted order
//!   ([`Value::total_cmp`] per column).
//! - [`Weights`] come from a grid column or an explicit vector; they must be
//!   finite, non-negative, and sum to a positive value within every group.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every block shares the evaluation grid, so row `r` of block `b` sits
//!   at position `b · n + r` of the stacked estimate vector.
//! - NaN Jacobian rows (failed blocks) only affect the groups they belong to.
use crate::{
    data::table::{DataTable, Value},
    margins::errors::{MarginsError, MarginsResult},
};
use ndarray::{Array1, Array2};

/// Aggregation request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum By {
    /// One estimate per grid row.
    #[default]
    None,
    /// One estimate over all rows.
    All,
    /// One estimate per distinct combination of these grid columns.
    Columns(Vec<String>),
}

impl By {
    pub fn column(name: &str) -> By {
        By::Columns(vec![name.to_string()])
    }

    pub fn columns<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> By {
        By::Columns(names.into_iter().map(|s| s.as_ref().to_string()).collect())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, By::None)
    }

    /// Grouping columns reported alongside aggregated rows.
    pub fn column_names(&self) -> Vec<String> {
        match self {
            By::Columns(cols) => cols.clone(),
            _ => Vec::new(),
        }
    }

    /// `By::None` becomes `By::All`; used by `avg_*` entry points and
    /// `…avg` comparisons.
    pub fn or_all(&self) -> By {
        match self {
            By::None => By::All,
            other => other.clone(),
        }
    }

    /// Check that every grouping column exists in `grid`.
    ///
    /// Errors
    /// ------
    /// - `MarginsError::UnknownByColumn` for the first missing column.
    pub fn validate(&self, grid: &DataTable) -> MarginsResult<()> {
        if let By::Columns(cols) = self {
            if let Some(missing) = cols.iter().find(|c| !grid.has_column(c)) {
                return Err(MarginsError::UnknownByColumn { name: missing.clone() });
            }
        }
        Ok(())
    }
}

/// Observation weights for aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum Weights {
    /// Numeric column of the evaluation grid.
    Column(String),
    /// One weight per grid row.
    Values(Array1<f64>),
}

impl Weights {
    /// Resolve to one weight per grid row.
    ///
    /// Errors
    /// ------
    /// - `MarginsError::InvalidWeights` when the vector has the wrong
    ///   length or holds negative / non-finite values.
    /// - `MarginsError::Data` when the column is missing or not numeric.
    pub fn resolve(&self, grid: &DataTable) -> MarginsResult<Array1<f64>> {
        let w = match self {
            Weights::Column(name) => grid.numeric(name)?.clone(),
            Weights::Values(values) => values.clone(),
        };
        if w.len() != grid.nrows() {
            return Err(MarginsError::InvalidWeights {
                reason: format!("expected {} weights, found {}", grid.nrows(), w.len()),
            });
        }
        if let Some(bad) = w.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(MarginsError::InvalidWeights {
                reason: format!("weights must be finite and non-negative, found {bad}"),
            });
        }
        Ok(w)
    }
}

/// One output row after grouping: its block, key, and member positions in
/// the stacked estimate vector.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Group {
    pub block: usize,
    pub key: Vec<Value>,
    pub members: Vec<usize>,
}

/// group_rows — build the output groups for `blocks` blocks of `grid` rows.
///
/// For `By::None` every stacked row is its own group (empty key).
pub(crate) fn group_rows(blocks: usize, grid: &DataTable, by: &By) -> MarginsResult<Vec<Group>> {
    by.validate(grid)?;
    let n = grid.nrows();
    let mut out = Vec::new();
    match by {
        By::None => {
            for b in 0..blocks {
                out.extend((0..n).map(|r| Group {
                    block: b,
                    key: Vec::new(),
                    members: vec![b * n + r],
                }));
            }
        }
        By::All => {
            for b in 0..blocks {
                let members = (b * n..(b + 1) * n).collect();
                out.push(Group { block: b, key: Vec::new(), members });
            }
        }
        By::Columns(cols) => {
            let columns = cols.iter().map(|c| grid.column(c)).collect::<Result<Vec<_>, _>>()?;
            let mut keyed: Vec<(Vec<Value>, Vec<usize>)> = Vec::new();
            for r in 0..n {
                let key: Vec<Value> = columns.iter().map(|c| c.value(r)).collect();
                match keyed.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, rows)) => rows.push(r),
                    None => keyed.push((key, vec![r])),
                }
            }
            keyed.sort_by(|(a, _), (b, _)| {
                a.iter()
                    .zip(b)
                    .map(|(x, y)| x.total_cmp(y))
                    .find(|o| o.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            for b in 0..blocks {
                out.extend(keyed.iter().map(|(key, rows)| Group {
                    block: b,
                    key: key.clone(),
                    members: rows.iter().map(|r| b * n + r).collect(),
                }));
            }
        }
    }
    Ok(out)
}

/// aggregate — weighted means of estimates and Jacobian rows per group.
///
/// Parameters
/// ----------
/// - `estimates`: stacked per-row estimates.
/// - `jacobian`: stacked per-row Jacobian (`None` when disabled).
/// - `groups`: output of [`group_rows`].
/// - `weights`: one weight per grid row (`None` = uniform).
/// - `n`: number of grid rows.
///
/// Errors
/// ------
/// - `MarginsError::InvalidWeights` when a group's weights sum to zero.
pub(crate) fn aggregate(
    estimates: &Array1<f64>, jacobian: Option<&Array2<f64>>, groups: &[Group],
    weights: Option<&Array1<f64>>, n: usize,
) -> MarginsResult<(Array1<f64>, Option<Array2<f64>>)> {
    let mut est = Array1::<f64>::zeros(groups.len());
    let mut jac = jacobian.map(|j| Array2::<f64>::zeros((groups.len(), j.ncols())));
    for (g, group) in groups.iter().enumerate() {
        let w: Vec<f64> = group
            .members
            .iter()
            .map(|&i| weights.map_or(1.0, |w| w[i % n]))
            .collect();
        let total: f64 = w.iter().sum();
        if total <= 0.0 {
            return Err(MarginsError::InvalidWeights {
                reason: "weights sum to zero within a group".to_string(),
            });
        }
        for (&i, &wi) in group.members.iter().zip(&w) {
            let share = wi / total;
            est[g] += share * estimates[i];
            if let (Some(out), Some(j)) = (jac.as_mut(), jacobian) {
                out.row_mut(g).scaled_add(share, &j.row(i));
            }
        }
    }
    Ok((est, jac))
}
