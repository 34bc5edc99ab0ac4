//! margins::estimands — the closed registry of comparison functions.
//!
//! Purpose
//! -------
//! Map a pair of prediction vectors (`hi`, `lo`) and, for derivative
//! estimands, the focal values and baseline predictions, to one estimate per
//! row. The registry is a closed enum resolved by name once per call.
//!
//! | name       | per-row estimate                          |
//! |------------|-------------------------------------------|
//! | difference | `hi − lo`                                 |
//! | ratio      | `hi / lo`                                 |
//! | lnratio    | `ln(hi / lo)`                             |
//! | lnor       | `ln((hi/(1−hi)) / (lo/(1−lo)))`           |
//! | lift       | `(hi − lo) / lo`                          |
//! | dydx       | `(hi − lo) / (x_hi − x_lo)`               |
//! | eyex       | `dydx · x / y`                            |
//! | eydx       | `dydx / y`                                |
//! | dyex       | `dydx · x`                                |
//!
//! Every name also has an `…avg` form which reduces the per-row estimates
//! through the same weighted-mean aggregation as `by` (over all rows when no
//! grouping is requested).
use crate::margins::errors::{MarginsError, MarginsResult};
use ndarray::{Array1, Zip};
use std::str::FromStr;

/// Per-row estimand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Estimand {
    Difference,
    Ratio,
    LnRatio,
    LnOr,
    Lift,
    Dydx,
    Eyex,
    Eydx,
    Dyex,
}

/// Inputs to [`Estimand::apply`]. Derivative fields are `None` for
/// discrete contrasts.
#[derive(Debug, Clone, Copy)]
pub struct EstimandInput<'a> {
    pub hi: &'a Array1<f64>,
    pub lo: &'a Array1<f64>,
    /// Focal values of the high and low counterfactual rows.
    pub x_hi: Option<&'a Array1<f64>>,
    pub x_lo: Option<&'a Array1<f64>>,
    /// Focal values of the evaluation grid.
    pub x: Option<&'a Array1<f64>>,
    /// Predictions at the evaluation grid.
    pub y: Option<&'a Array1<f64>>,
}

impl Estimand {
    pub fn name(&self) -> &'static str {
        match self {
            Estimand::Difference => "difference",
            Estimand::Ratio => "ratio",
            Estimand::LnRatio => "lnratio",
            Estimand::LnOr => "lnor",
            Estimand::Lift => "lift",
            Estimand::Dydx => "dydx",
            Estimand::Eyex => "eyex",
            Estimand::Eydx => "eydx",
            Estimand::Dyex => "dyex",
        }
    }

    pub fn is_derivative(&self) -> bool {
        matches!(self, Estimand::Dydx | Estimand::Eyex | Estimand::Eydx | Estimand::Dyex)
    }

    /// Whether `apply` needs predictions at the unperturbed grid.
    pub fn needs_baseline(&self) -> bool {
        matches!(self, Estimand::Eyex | Estimand::Eydx)
    }

    /// Contrast label for derivative estimands.
    pub fn derivative_label(&self) -> Option<&'static str> {
        match self {
            Estimand::Dydx => Some("dY/dX"),
            Estimand::Eyex => Some("eY/eX"),
            Estimand::Eydx => Some("eY/dX"),
            Estimand::Dyex => Some("dY/eX"),
            _ => None,
        }
    }

    /// apply — per-row estimates.
    ///
    /// Missing derivative inputs yield NaN rows rather than a panic; the
    /// engine always supplies them for derivative estimands.
    pub fn apply(&self, input: &EstimandInput<'_>) -> Array1<f64> {
        let (hi, lo) = (input.hi, input.lo);
        match self {
            Estimand::Difference => hi - lo,
            Estimand::Ratio => hi / lo,
            Estimand::LnRatio => (hi / lo).mapv(f64::ln),
            Estimand::LnOr => Zip::from(hi).and(lo).map_collect(|&h, &l| {
                ((h / (1.0 - h)) / (l / (1.0 - l))).ln()
            }),
            Estimand::Lift => (hi - lo) / lo,
            Estimand::Dydx | Estimand::Eyex | Estimand::Eydx | Estimand::Dyex => {
                let nan = || Array1::from_elem(hi.len(), f64::NAN);
                let (Some(x_hi), Some(x_lo)) = (input.x_hi, input.x_lo) else {
                    return nan();
                };
                let dydx = (hi - lo) / &(x_hi - x_lo);
                match (self, input.x, input.y) {
                    (Estimand::Dydx, _, _) => dydx,
                    (Estimand::Eyex, Some(x), Some(y)) => dydx * x / y,
                    (Estimand::Eydx, _, Some(y)) => dydx / y,
                    (Estimand::Dyex, Some(x), _) => dydx * x,
                    _ => nan(),
                }
            }
        }
    }
}

/// Comparison — an estimand plus the `avg` reduction flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    pub estimand: Estimand,
    pub avg: bool,
}

impl Comparison {
    pub fn new(estimand: Estimand) -> Comparison {
        Comparison { estimand, avg: false }
    }

    pub fn averaged(estimand: Estimand) -> Comparison {
        Comparison { estimand, avg: true }
    }

    /// Registry name, e.g. `difference` or `eyexavg`.
    pub fn name(&self) -> String {
        if self.avg {
            format!("{}avg", self.estimand.name())
        } else {
            self.estimand.name().to_string()
        }
    }

    /// Comparison applied to a categorical focal variable: derivative
    /// estimands fall back to `difference`, keeping the `avg` flag.
    pub fn for_categorical(&self) -> Comparison {
        if self.estimand.is_derivative() {
            Comparison { estimand: Estimand::Difference, avg: self.avg }
        } else {
            *self
        }
    }
}

impl Default for Comparison {
    fn default() -> Self {
        Comparison::new(Estimand::Difference)
    }
}

const ESTIMANDS: [Estimand; 9] = [
    Estimand::Difference,
    Estimand::Ratio,
    Estimand::LnRatio,
    Estimand::LnOr,
    Estimand::Lift,
    Estimand::Dydx,
    Estimand::Eyex,
    Estimand::Eydx,
    Estimand::Dyex,
];

impl FromStr for Comparison {
    type Err = MarginsError;

    /// Resolve a registry name (case-insensitive), with or without `avg`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let (base, avg) = match lower.strip_suffix("avg") {
            Some(base) => (base, true),
            None => (lower.as_str(), false),
        };
        ESTIMANDS
            .iter()
            .find(|e| e.name() == base)
            .map(|&estimand| Comparison { estimand, avg })
            .ok_or_else(|| MarginsError::InvalidComparison { name: s.to_string() })
    }
}

/// Derivative family accepted by `slopes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slope {
    #[default]
    Dydx,
    Eyex,
    Eydx,
    Dyex,
}

impl Slope {
    pub fn estimand(&self) -> Estimand {
        match self {
            Slope::Dydx => Estimand::Dydx,
            Slope::Eyex => Estimand::Eyex,
            Slope::Eydx => Estimand::Eydx,
            Slope::Dyex => Estimand::Dyex,
        }
    }
}

impl FromStr for Slope {
    type Err = MarginsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dydx" => Ok(Slope::Dydx),
            "eyex" => Ok(Slope::Eyex),
            "eydx" => Ok(Slope::Eydx),
            "dyex" => Ok(Slope::Dyex),
            _ => Err(MarginsError::InvalidSlope { name: s.to_string() }),
        }
    }
}

/// Validate a derivative step.
pub fn validate_eps(eps: f64) -> MarginsResult<()> {
    if eps.is_finite() && eps > 0.0 { Ok(()) } else { Err(MarginsError::InvalidEps { eps }) }
}
