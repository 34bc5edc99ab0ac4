//! inference::stats — reference distributions, p-values, and intervals.
//!
//! Statistics are referred to the standard normal unless residual degrees
//! of freedom are available, in which case Student's t with `df` degrees
//! of freedom is used for p-values, critical values, and one-sided tests.
use crate::inference::errors::{InferenceError, InferenceResult};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Reference distribution for Wald-type statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestDistribution {
    Normal,
    StudentsT { df: f64 },
}

impl TestDistribution {
    /// Normal when `df` is `None`, Student's t otherwise.
    ///
    /// Errors
    /// ------
    /// - `InferenceError::InvalidDf` when `df` is not finite and positive.
    pub fn new(df: Option<f64>) -> InferenceResult<TestDistribution> {
        match df {
            None => Ok(TestDistribution::Normal),
            Some(df) if df.is_finite() && df > 0.0 => Ok(TestDistribution::StudentsT { df }),
            Some(df) => Err(InferenceError::InvalidDf { df }),
        }
    }

    /// Distribution function `F(x)`.
    pub fn cdf(&self, x: f64) -> f64 {
        match self {
            TestDistribution::Normal => match Normal::new(0.0, 1.0) {
                Ok(n) => n.cdf(x),
                Err(_) => f64::NAN,
            },
            TestDistribution::StudentsT { df } => match StudentsT::new(0.0, 1.0, *df) {
                Ok(t) => t.cdf(x),
                Err(_) => f64::NAN,
            },
        }
    }

    /// Quantile function `F⁻¹(p)`.
    pub fn quantile(&self, p: f64) -> f64 {
        match self {
            TestDistribution::Normal => match Normal::new(0.0, 1.0) {
                Ok(n) => n.inverse_cdf(p),
                Err(_) => f64::NAN,
            },
            TestDistribution::StudentsT { df } => match StudentsT::new(0.0, 1.0, *df) {
                Ok(t) => t.inverse_cdf(p),
                Err(_) => f64::NAN,
            },
        }
    }

    /// Two-sided p-value `2 F(−|z|)`, computed in the lower tail.
    pub fn p_value_two_sided(&self, statistic: f64) -> f64 {
        if !statistic.is_finite() {
            return if statistic.is_nan() { f64::NAN } else { 0.0 };
        }
        (2.0 * self.cdf(-statistic.abs())).clamp(0.0, 1.0)
    }

    /// Critical value `F⁻¹(1 − (1 − level)/2)` for a two-sided interval.
    pub fn critical_value(&self, conf_level: f64) -> f64 {
        self.quantile(1.0 - (1.0 - conf_level) / 2.0)
    }
}

/// Require a confidence level in the open interval `(0, 1)`.
pub fn validate_conf_level(level: f64) -> InferenceResult<()> {
    if level.is_finite() && level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(InferenceError::InvalidConfLevel { level })
    }
}

/// Wald test and interval for one estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaldSummary {
    pub statistic: f64,
    pub p_value: f64,
    pub conf_low: f64,
    pub conf_high: f64,
}

/// wald_summary — statistic, two-sided p-value, and interval.
///
/// Parameters
/// ----------
/// - `estimate`, `std_error`: point estimate and its standard error.
/// - `null`: value under the null hypothesis (0 unless a numeric hypothesis
///   was requested).
/// - `conf_level`: two-sided interval level, validated upstream.
/// - `dist`: reference distribution.
///
/// Returns
/// -------
/// `statistic = (estimate − null)/std_error`; the interval is centered on
/// the estimate, not the null. A zero standard error yields an infinite
/// statistic and a degenerate interval.
pub fn wald_summary(
    estimate: f64, std_error: f64, null: f64, conf_level: f64, dist: TestDistribution,
) -> WaldSummary {
    let statistic = (estimate - null) / std_error;
    let crit = dist.critical_value(conf_level);
    WaldSummary {
        statistic,
        p_value: dist.p_value_two_sided(statistic),
        conf_low: estimate - crit * std_error,
        conf_high: estimate + crit * std_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Normal and Student's t critical values and p-values.
    // - Wald summaries with and without a non-zero null.
    // - Validation of df and confidence level.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify textbook critical values and p-values.
    //
    // Given
    // -----
    // - Normal and t(10) at the 95% level; statistic 1.959964.
    //
    // Expect
    // ------
    // - z = 1.959964, t(10) = 2.228139; p ≈ 0.05.
    fn critical_values_and_p_values() {
        let z = TestDistribution::Normal;
        let t = TestDistribution::new(Some(10.0)).unwrap();

        assert!((z.critical_value(0.95) - 1.959_964).abs() < 1e-5);
        assert!((t.critical_value(0.95) - 2.228_139).abs() < 1e-4);
        assert!((z.p_value_two_sided(1.959_964) - 0.05).abs() < 1e-6);
        assert!((z.p_value_two_sided(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Far-tail p-values keep their magnitude instead of rounding to zero.
    //
    // Given
    // -----
    // - Normal at z = ±10; t(10) at 40.
    //
    // Expect
    // ------
    // - 2Φ(−10) ≈ 1.523971e-23 for either sign; the t p-value is positive.
    fn far_tail_p_values_stay_positive() {
        let z = TestDistribution::Normal;
        let t = TestDistribution::new(Some(10.0)).unwrap();

        let expected = 1.523_970_604_832_118_6e-23;
        assert!((z.p_value_two_sided(10.0) / expected - 1.0).abs() < 1e-8);
        assert_eq!(z.p_value_two_sided(-10.0), z.p_value_two_sided(10.0));
        assert!(t.p_value_two_sided(40.0) > 0.0);
        assert!(t.p_value_two_sided(40.0) < 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // The interval is centered on the estimate; the statistic on the null.
    //
    // Given
    // -----
    // - estimate 3, se 1, null 1, 95% normal.
    //
    // Expect
    // ------
    // - statistic 2, interval 3 ± 1.959964.
    fn wald_summary_uses_null_for_statistic_only() {
        let s = wald_summary(3.0, 1.0, 1.0, 0.95, TestDistribution::Normal);

        assert!((s.statistic - 2.0).abs() < 1e-12);
        assert!((s.conf_low - (3.0 - 1.959_964)).abs() < 1e-5);
        assert!((s.conf_high - (3.0 + 1.959_964)).abs() < 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // Reject invalid df and confidence levels.
    //
    // Given
    // -----
    // - df = 0 and df = NaN; levels 0, 1, 1.5.
    //
    // Expect
    // ------
    // - `InvalidDf` and `InvalidConfLevel`.
    fn invalid_configuration_is_rejected() {
        assert_eq!(TestDistribution::new(Some(0.0)), Err(InferenceError::InvalidDf { df: 0.0 }));
        assert!(TestDistribution::new(Some(f64::NAN)).is_err());
        for level in [0.0, 1.0, 1.5] {
            assert_eq!(validate_conf_level(level), Err(InferenceError::InvalidConfLevel { level }));
        }
        assert!(validate_conf_level(0.9).is_ok());
    }
}
