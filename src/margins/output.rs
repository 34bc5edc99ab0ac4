//! margins::output — the tidy result table.
//!
//! One [`EstimateRow`] per grid row and term/contrast block (no grouping),
//! per group (with `by`), or per hypothesis (after a transform). Fields that
//! are undefined, such as every uncertainty field when the covariance is
//! disabled, are `None`.
use crate::{
    data::table::{DataTable, Value},
    inference::summary::RowInference,
};
use ndarray::Array1;

/// One estimate with its uncertainty and test results.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateRow {
    /// Focal variable, or hypothesis label; `None` for plain predictions.
    pub term: Option<String>,
    /// Contrast label (`+1`, `b - a`, `dY/dX`); `None` for predictions.
    pub contrast: Option<String>,
    /// Values of the `by` columns, in `MarginsTable::by_columns` order.
    pub group: Vec<Value>,
    /// Row of the evaluation grid for ungrouped estimates.
    pub rowid: Option<usize>,
    pub estimate: f64,
    pub std_error: Option<f64>,
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub conf_low: Option<f64>,
    pub conf_high: Option<f64>,
    pub statistic_noninf: Option<f64>,
    pub p_value_noninf: Option<f64>,
    pub statistic_nonsup: Option<f64>,
    pub p_value_nonsup: Option<f64>,
    pub p_value_equiv: Option<f64>,
}

impl EstimateRow {
    pub(crate) fn new(
        term: Option<String>, contrast: Option<String>, group: Vec<Value>, rowid: Option<usize>,
        estimate: f64, inference: &RowInference,
    ) -> EstimateRow {
        let wald = inference.wald.as_ref();
        let eq = inference.equivalence.as_ref();
        EstimateRow {
            term,
            contrast,
            group,
            rowid,
            estimate,
            std_error: inference.std_error,
            statistic: wald.map(|w| w.statistic),
            p_value: wald.map(|w| w.p_value),
            conf_low: wald.map(|w| w.conf_low),
            conf_high: wald.map(|w| w.conf_high),
            statistic_noninf: eq.map(|e| e.statistic_noninf),
            p_value_noninf: eq.map(|e| e.p_value_noninf),
            statistic_nonsup: eq.map(|e| e.statistic_nonsup),
            p_value_nonsup: eq.map(|e| e.p_value_nonsup),
            p_value_equiv: eq.map(|e| e.p_value_equiv),
        }
    }
}

/// MarginsTable — rows plus the context needed to read them.
#[derive(Debug, Clone, PartialEq)]
pub struct MarginsTable {
    /// Names of the grouping columns carried in `EstimateRow::group`.
    pub by_columns: Vec<String>,
    pub rows: Vec<EstimateRow>,
    /// Evaluation grid that `EstimateRow::rowid` points into.
    pub grid: DataTable,
}

impl MarginsTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EstimateRow> {
        self.rows.iter()
    }

    pub fn estimates(&self) -> Array1<f64> {
        self.rows.iter().map(|r| r.estimate).collect()
    }

    /// Standard errors with undefined entries as NaN.
    pub fn std_errors(&self) -> Array1<f64> {
        self.rows.iter().map(|r| r.std_error.unwrap_or(f64::NAN)).collect()
    }

    /// Rows whose term equals `term`.
    pub fn filter_term(&self, term: &str) -> Vec<&EstimateRow> {
        self.rows.iter().filter(|r| r.term.as_deref() == Some(term)).collect()
    }

    /// Rows whose term and contrast both match.
    pub fn filter_contrast(&self, term: &str, contrast: &str) -> Vec<&EstimateRow> {
        self.rows
            .iter()
            .filter(|r| r.term.as_deref() == Some(term) && r.contrast.as_deref() == Some(contrast))
            .collect()
    }
}

impl<'a> IntoIterator for &'a MarginsTable {
    type Item = &'a EstimateRow;
    type IntoIter = std::slice::Iter<'a, EstimateRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
