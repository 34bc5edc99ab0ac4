//! model::design — model terms and design-matrix assembly.
//!
//! Purpose
//! -------
//! Rebuild the design matrix `X` of a fitted model for arbitrary covariate
//! rows, so that predictions can be expressed purely as a function of the
//! parameter vector and the data (`η = Xβ`). This is what lets the engine
//! substitute perturbed parameter vectors without refitting anything.
//!
//! Key behaviors
//! -------------
//! - [`Term`] describes one formula term: the intercept, a numeric
//!   covariate, a treatment-coded factor, or an interaction of terms.
//! - [`DesignSpec`] orders terms, names the resulting coefficients
//!   (`Intercept`, `wt`, `wt:hp`, `cyl[T.6]`), and evaluates the design on
//!   any [`DataTable`] holding the referenced covariates.
//!
//! Invariants & assumptions
//! ------------------------
//! - Factor levels are fixed at construction; the first level is the
//!   reference and gets no column. Unseen levels at prediction time are
//!   reported as `ModelError::UnknownLevel`.
//! - Interactions expand to the element-wise product of every combination
//!   of their components' columns, in component order.
use crate::{
    data::{errors::DataResult, table::DataTable},
    model::errors::{ModelError, ModelResult},
};
use ndarray::{Array1, Array2};

/// One formula term.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Intercept,
    Numeric(String),
    /// Treatment-coded factor; `levels[0]` is the reference level.
    Categorical { name: String, levels: Vec<String> },
    Interaction(Vec<Term>),
}

impl Term {
    pub fn numeric(name: &str) -> Term {
        Term::Numeric(name.to_string())
    }

    pub fn categorical<S: Into<String>>(name: &str, levels: impl IntoIterator<Item = S>) -> Term {
        Term::Categorical {
            name: name.to_string(),
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    /// Factor term with levels read (sorted, deduplicated) from `data`.
    pub fn factor(name: &str, data: &DataTable) -> DataResult<Term> {
        let levels = data.column(name)?.levels();
        Ok(Term::Categorical { name: name.to_string(), levels })
    }

    pub fn interaction(terms: Vec<Term>) -> Term {
        Term::Interaction(terms)
    }

    /// Coefficient names contributed by this term.
    fn column_names(&self) -> Vec<String> {
        match self {
            Term::Intercept => vec!["Intercept".to_string()],
            Term::Numeric(name) => vec![name.clone()],
            Term::Categorical { name, levels } => {
                levels.iter().skip(1).map(|l| format!("{name}[T.{l}]")).collect()
            }
            Term::Interaction(parts) => {
                let mut acc: Vec<String> = vec![String::new()];
                for part in parts {
                    let names = part.column_names();
                    acc = acc
                        .iter()
                        .flat_map(|a| {
                            names.iter().map(move |b| {
                                if a.is_empty() { b.clone() } else { format!("{a}:{b}") }
                            })
                        })
                        .collect();
                }
                acc
            }
        }
    }

    /// Design columns contributed by this term for the rows of `data`.
    fn columns(&self, data: &DataTable) -> ModelResult<Vec<Array1<f64>>> {
        let n = data.nrows();
        match self {
            Term::Intercept => Ok(vec![Array1::ones(n)]),
            Term::Numeric(name) => Ok(vec![data.numeric(name)?.clone()]),
            Term::Categorical { name, levels } => {
                let values = data.categorical(name)?;
                if let Some(bad) = values.iter().find(|v| !levels.contains(*v)) {
                    return Err(ModelError::UnknownLevel { name: name.clone(), level: bad.clone() });
                }
                Ok(levels
                    .iter()
                    .skip(1)
                    .map(|level| {
                        values.iter().map(|v| if v == level { 1.0 } else { 0.0 }).collect()
                    })
                    .collect())
            }
            Term::Interaction(parts) => {
                let mut acc: Vec<Array1<f64>> = vec![Array1::ones(n)];
                for part in parts {
                    let cols = part.columns(data)?;
                    acc = acc.iter().flat_map(|a| cols.iter().map(move |b| a * b)).collect();
                }
                Ok(acc)
            }
        }
    }

    /// Covariate names referenced by this term, in order of appearance.
    fn covariates(&self, out: &mut Vec<String>) {
        match self {
            Term::Intercept => {}
            Term::Numeric(name) | Term::Categorical { name, .. } => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Term::Interaction(parts) => parts.iter().for_each(|p| p.covariates(out)),
        }
    }
}

/// Ordered list of terms describing a model's fixed-effects design.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignSpec {
    terms: Vec<Term>,
}

impl DesignSpec {
    pub fn new(terms: Vec<Term>) -> DesignSpec {
        DesignSpec { terms }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Coefficient names in column order.
    pub fn coef_names(&self) -> Vec<String> {
        self.terms.iter().flat_map(Term::column_names).collect()
    }

    /// Number of design columns (= number of fixed-effect parameters).
    pub fn ncols(&self) -> usize {
        self.coef_names().len()
    }

    /// Covariates referenced by any term, in order of first appearance.
    pub fn covariates(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.terms.iter().for_each(|t| t.covariates(&mut out));
        out
    }

    /// Levels of factor `name`, if it enters the design as a factor.
    pub fn factor_levels(&self, name: &str) -> Option<Vec<String>> {
        fn find<'a>(term: &'a Term, name: &str) -> Option<&'a Vec<String>> {
            match term {
                Term::Categorical { name: n, levels } if n == name => Some(levels),
                Term::Interaction(parts) => parts.iter().find_map(|p| find(p, name)),
                _ => None,
            }
        }
        self.terms.iter().find_map(|t| find(t, name)).cloned()
    }

    /// design_matrix — evaluate the design on the rows of `data`.
    ///
    /// Returns
    /// -------
    /// `ModelResult<Array2<f64>>`
    ///   An `nrows × ncols` matrix whose columns follow [`DesignSpec::coef_names`].
    ///
    /// Errors
    /// ------
    /// - `ModelError::MissingCovariate` when a referenced column is absent.
    /// - `ModelError::UnknownLevel` when a factor holds an unseen level.
    /// - `ModelError::Data` when a column has the wrong kind.
    pub fn design_matrix(&self, data: &DataTable) -> ModelResult<Array2<f64>> {
        let mut cols: Vec<Array1<f64>> = Vec::new();
        for term in &self.terms {
            cols.extend(term.columns(data)?);
        }
        let mut x = Array2::<f64>::zeros((data.nrows(), cols.len()));
        for (j, col) in cols.iter().enumerate() {
            x.column_mut(j).assign(col);
        }
        Ok(x)
    }
}
