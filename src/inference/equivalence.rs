//! inference::equivalence — two one-sided tests (TOST).
//!
//! For bounds `[low, high]` and an estimate with standard error `se`:
//!
//! - non-inferiority: `H0: θ ≤ low`, statistic `(est − low)/se`,
//!   p-value `1 − F(stat)`;
//! - non-superiority: `H0: θ ≥ high`, statistic `(est − high)/se`,
//!   p-value `F(stat)`;
//! - equivalence: `p = max(p_noninf, p_nonsup)`.
use crate::inference::{
    errors::{InferenceError, InferenceResult},
    stats::TestDistribution,
};

/// Equivalence interval `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equivalence {
    low: f64,
    high: f64,
}

impl Equivalence {
    /// Errors
    /// ------
    /// - `InferenceError::InvalidEquivalenceBounds` when either bound is NaN
    ///   or `low > high`. Infinite bounds are allowed.
    pub fn new(low: f64, high: f64) -> InferenceResult<Equivalence> {
        if low.is_nan() || high.is_nan() || low > high {
            return Err(InferenceError::InvalidEquivalenceBounds { low, high });
        }
        Ok(Equivalence { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Run both one-sided tests for one estimate.
    pub fn test(&self, estimate: f64, std_error: f64, dist: TestDistribution) -> EquivalenceTest {
        let statistic_noninf = (estimate - self.low) / std_error;
        let statistic_nonsup = (estimate - self.high) / std_error;
        let p_value_noninf = dist.cdf(-statistic_noninf);
        let p_value_nonsup = dist.cdf(statistic_nonsup);
        EquivalenceTest {
            statistic_noninf,
            p_value_noninf,
            statistic_nonsup,
            p_value_nonsup,
            p_value_equiv: p_value_noninf.max(p_value_nonsup),
        }
    }
}

/// Both one-sided statistics and the overall equivalence p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquivalenceTest {
    pub statistic_noninf: f64,
    pub p_value_noninf: f64,
    pub statistic_nonsup: f64,
    pub p_value_nonsup: f64,
    pub p_value_equiv: f64,
}
