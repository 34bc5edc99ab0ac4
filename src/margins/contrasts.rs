//! margins::contrasts — focal variables and their perturbation sets.
//!
//! Purpose
//! -------
//! Decide, for every focal variable, which "low" and "high" counterfactual
//! grids are compared. Each resulting [`Perturbation`] is one term/contrast
//! block of the output: the evaluation grid with only the focal column
//! replaced, once for each side.
//!
//! Key behaviors
//! -------------
//! - Numeric variables under discrete estimands use a [`NumericContrast`]:
//!   a centered step `x ± v/2` (default `+1`), a fixed pair of values, a
//!   standard-deviation step, the interquartile range, or the range.
//! - Numeric variables under derivative estimands always use `x ± eps/2`.
//! - Categorical variables use a [`CategoricalContrast`]: every level
//!   against the reference (default), all pairs, consecutive levels, or one
//!   explicit pair. The reference is the first sorted level unless a
//!   baseline is given. Derivative estimands fall back to `difference`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Only the focal column differs between `lo`, `hi`, and the grid.
//! - Distribution summaries (sd, quartiles, range) come from the model's
//!   fitting data, so they do not depend on the evaluation grid.
use crate::{
    data::{
        grid::quantile,
        table::{Column, DataTable},
    },
    margins::{
        errors::{MarginsError, MarginsResult},
        estimands::Comparison,
    },
    model::traits::{ModelHandle, VariableKind},
    utils::format_number,
};
use ndarray::Array1;

/// Perturbation rule for a numeric focal variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericContrast {
    /// `x − v/2` vs `x + v/2`.
    Step(f64),
    /// Every row at `lo` vs every row at `hi`.
    Pair(f64, f64),
    /// `x − sd/2` vs `x + sd/2`.
    Sd,
    /// `x − sd` vs `x + sd`.
    TwoSd,
    /// First vs third quartile.
    Iqr,
    /// Minimum vs maximum.
    MinMax,
}

impl Default for NumericContrast {
    fn default() -> Self {
        NumericContrast::Step(1.0)
    }
}

/// Perturbation rule for a categorical focal variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CategoricalContrast {
    /// Each level against the reference level.
    #[default]
    Reference,
    /// Every pair of levels `(lo, hi)` with `lo` before `hi`.
    Pairwise,
    /// Consecutive levels.
    Sequential,
    /// One explicit pair `(lo, hi)`.
    Levels(String, String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContrastSpec {
    Numeric(NumericContrast),
    Categorical(CategoricalContrast),
}

/// A focal variable and, optionally, how to perturb it.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    pub name: String,
    pub contrast: Option<ContrastSpec>,
    /// Reference level for categorical contrasts.
    pub baseline: Option<String>,
}

impl VariableSpec {
    pub fn new(name: &str) -> VariableSpec {
        VariableSpec { name: name.to_string(), contrast: None, baseline: None }
    }

    pub fn numeric(name: &str, contrast: NumericContrast) -> VariableSpec {
        VariableSpec { contrast: Some(ContrastSpec::Numeric(contrast)), ..VariableSpec::new(name) }
    }

    pub fn categorical(name: &str, contrast: CategoricalContrast) -> VariableSpec {
        VariableSpec {
            contrast: Some(ContrastSpec::Categorical(contrast)),
            ..VariableSpec::new(name)
        }
    }

    pub fn with_baseline(mut self, level: &str) -> VariableSpec {
        self.baseline = Some(level.to_string());
        self
    }
}

impl From<&str> for VariableSpec {
    fn from(name: &str) -> Self {
        VariableSpec::new(name)
    }
}

/// One term/contrast block: the two counterfactual grids to compare.
#[derive(Debug, Clone)]
pub(crate) struct Perturbation {
    pub term: String,
    pub contrast: String,
    pub comparison: Comparison,
    pub lo: DataTable,
    pub hi: DataTable,
    /// Focal values on each side and on the grid (numeric variables only).
    pub x_lo: Option<Array1<f64>>,
    pub x_hi: Option<Array1<f64>>,
    pub x: Option<Array1<f64>>,
}

/// resolve_variables — pair requested focal variables with model metadata.
///
/// `None` selects every numeric and categorical covariate in model order.
///
/// Errors
/// ------
/// - `MarginsError::InvalidVariable` for names that are not perturbable
///   covariates (unknown, response, or grouping variable).
/// - `MarginsError::EmptyVariables` when nothing is left to compare.
pub(crate) fn resolve_variables<M: ModelHandle + ?Sized>(
    model: &M, requested: Option<&[VariableSpec]>,
) -> MarginsResult<Vec<(VariableSpec, VariableKind)>> {
    let out: Vec<(VariableSpec, VariableKind)> = match requested {
        None => model
            .variables()
            .iter()
            .filter(|v| v.kind != VariableKind::Group)
            .map(|v| (VariableSpec::new(&v.name), v.kind.clone()))
            .collect(),
        Some(specs) => specs
            .iter()
            .map(|spec| match model.variable(&spec.name) {
                Some(meta) if meta.kind == VariableKind::Group => {
                    Err(MarginsError::InvalidVariable {
                        name: spec.name.clone(),
                        reason: "grouping variables cannot be perturbed".to_string(),
                    })
                }
                Some(meta) => Ok((spec.clone(), meta.kind.clone())),
                None => Err(MarginsError::InvalidVariable {
                    name: spec.name.clone(),
                    reason: "not a covariate of the model".to_string(),
                }),
            })
            .collect::<MarginsResult<_>>()?,
    };
    if out.is_empty() {
        return Err(MarginsError::EmptyVariables);
    }
    Ok(out)
}

/// perturbations — counterfactual blocks for one focal variable.
///
/// Parameters
/// ----------
/// - `spec`, `kind`: focal variable and its model metadata.
/// - `grid`: evaluation grid.
/// - `source`: the model's fitting data (distribution summaries).
/// - `comparison`: requested comparison, before the categorical fallback.
/// - `eps`: derivative step, validated upstream.
///
/// Errors
/// ------
/// - `MarginsError::UnsupportedContrast` when the contrast does not match
///   the variable kind or names levels the model does not know.
/// - `MarginsError::Data` when the grid lacks the column or holds the
///   wrong kind.
pub(crate) fn perturbations(
    spec: &VariableSpec, kind: &VariableKind, grid: &DataTable, source: &DataTable,
    comparison: Comparison, eps: f64,
) -> MarginsResult<Vec<Perturbation>> {
    match kind {
        VariableKind::Numeric => numeric_perturbation(spec, grid, source, comparison, eps),
        VariableKind::Categorical { levels } => {
            categorical_perturbations(spec, levels, grid, comparison.for_categorical())
        }
        VariableKind::Group => Err(MarginsError::InvalidVariable {
            name: spec.name.clone(),
            reason: "grouping variables cannot be perturbed".to_string(),
        }),
    }
}

fn numeric_perturbation(
    spec: &VariableSpec, grid: &DataTable, source: &DataTable, comparison: Comparison, eps: f64,
) -> MarginsResult<Vec<Perturbation>> {
    let name = &spec.name;
    let x = grid.numeric(name)?.clone();
    let n = x.len();

    let (x_lo, x_hi, label) = if let Some(label) = comparison.estimand.derivative_label() {
        if spec.contrast.is_some() {
            return Err(MarginsError::UnsupportedContrast {
                name: name.clone(),
                reason: format!("'{label}' uses the derivative step; drop the explicit contrast"),
            });
        }
        (&x - eps / 2.0, &x + eps / 2.0, label.to_string())
    } else {
        let contrast = match &spec.contrast {
            None => NumericContrast::default(),
            Some(ContrastSpec::Numeric(c)) => *c,
            Some(ContrastSpec::Categorical(_)) => {
                return Err(MarginsError::UnsupportedContrast {
                    name: name.clone(),
                    reason: "categorical contrast requested for a numeric variable".to_string(),
                });
            }
        };
        let observed = source.numeric(name)?;
        let sd = || observed.std(1.0);
        let constant = |v: f64| Array1::from_elem(n, v);
        match contrast {
            NumericContrast::Step(v) => {
                (&x - v / 2.0, &x + v / 2.0, format!("+{}", format_number(v)))
            }
            NumericContrast::Pair(lo, hi) => (
                constant(lo),
                constant(hi),
                format!("{} - {}", format_number(hi), format_number(lo)),
            ),
            NumericContrast::Sd => (&x - sd() / 2.0, &x + sd() / 2.0, "+sd".to_string()),
            NumericContrast::TwoSd => (&x - sd(), &x + sd(), "+2sd".to_string()),
            NumericContrast::Iqr => (
                constant(quantile(observed, 0.25)),
                constant(quantile(observed, 0.75)),
                "Q3 - Q1".to_string(),
            ),
            NumericContrast::MinMax => (
                constant(observed.fold(f64::INFINITY, |m, &v| m.min(v))),
                constant(observed.fold(f64::NEG_INFINITY, |m, &v| m.max(v))),
                "max - min".to_string(),
            ),
        }
    };

    Ok(vec![Perturbation {
        term: name.clone(),
        contrast: label,
        comparison,
        lo: grid.with_column(name, Column::Numeric(x_lo.clone()))?,
        hi: grid.with_column(name, Column::Numeric(x_hi.clone()))?,
        x_lo: Some(x_lo),
        x_hi: Some(x_hi),
        x: Some(x),
    }])
}

fn categorical_perturbations(
    spec: &VariableSpec, model_levels: &[String], grid: &DataTable, comparison: Comparison,
) -> MarginsResult<Vec<Perturbation>> {
    let name = &spec.name;
    grid.categorical(name)?;

    let unsupported =
        |reason: String| MarginsError::UnsupportedContrast { name: name.clone(), reason };
    let mut levels: Vec<String> = model_levels.to_vec();
    levels.sort();
    if let Some(base) = &spec.baseline {
        let at = levels
            .iter()
            .position(|l| l == base)
            .ok_or_else(|| unsupported(format!("unknown baseline level '{base}'")))?;
        let base = levels.remove(at);
        levels.insert(0, base);
    }

    let contrast = match &spec.contrast {
        None => CategoricalContrast::default(),
        Some(ContrastSpec::Categorical(c)) => c.clone(),
        Some(ContrastSpec::Numeric(_)) => {
            return Err(unsupported("numeric contrast requested for a categorical variable".into()));
        }
    };

    let pairs: Vec<(String, String)> = match contrast {
        CategoricalContrast::Reference => {
            levels.iter().skip(1).map(|hi| (levels[0].clone(), hi.clone())).collect()
        }
        CategoricalContrast::Pairwise => {
            let mut out = Vec::new();
            for i in 0..levels.len() {
                for j in (i + 1)..levels.len() {
                    out.push((levels[i].clone(), levels[j].clone()));
                }
            }
            out
        }
        CategoricalContrast::Sequential => {
            levels.windows(2).map(|w| (w[0].clone(), w[1].clone())).collect()
        }
        CategoricalContrast::Levels(lo, hi) => {
            for level in [&lo, &hi] {
                if !levels.contains(level) {
                    return Err(unsupported(format!("unknown level '{level}'")));
                }
            }
            vec![(lo, hi)]
        }
    };
    if pairs.is_empty() {
        return Err(unsupported("at least two levels are required".into()));
    }

    let n = grid.nrows();
    pairs
        .into_iter()
        .map(|(lo, hi)| {
            Ok(Perturbation {
                term: name.clone(),
                contrast: format!("{hi} - {lo}"),
                comparison,
                lo: grid.with_column(name, Column::Categorical(vec![lo; n]))?,
                hi: grid.with_column(name, Column::Categorical(vec![hi; n]))?,
                x_lo: None,
                x_hi: None,
                x: None,
            })
        })
        .collect()
}
