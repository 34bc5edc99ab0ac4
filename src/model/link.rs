//! model::link — link functions and exponential-family names.
//!
//! A generalized linear model predicts `μ = g⁻¹(η)` with `η = Xβ (+ offset)`.
//! This module provides the inverse links needed to rebuild `μ` from any
//! parameter vector, plus the mapping from family names to canonical links.
//! Family names outside the supported set are capability errors: the
//! adapter cannot reconstruct their predictions from parameters alone.
use crate::model::errors::{ModelError, ModelResult};
use statrs::distribution::{ContinuousCDF, Normal};
use std::str::FromStr;

/// Inverse-link choice for GLM-style adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Identity,
    Log,
    Logit,
    Probit,
    Inverse,
    /// `μ = 1/√η`, canonical for the inverse Gaussian family.
    InverseSquared,
    CLogLog,
}

impl Link {
    /// Map the linear predictor to the response scale.
    pub fn inverse(&self, eta: f64) -> f64 {
        match self {
            Link::Identity => eta,
            Link::Log => eta.exp(),
            Link::Logit => {
                // Split on sign so exp never overflows.
                if eta >= 0.0 {
                    1.0 / (1.0 + (-eta).exp())
                } else {
                    let e = eta.exp();
                    e / (1.0 + e)
                }
            }
            Link::Probit => match Normal::new(0.0, 1.0) {
                Ok(n) => n.cdf(eta),
                Err(_) => f64::NAN,
            },
            Link::Inverse => 1.0 / eta,
            Link::InverseSquared => 1.0 / eta.sqrt(),
            Link::CLogLog => 1.0 - (-eta.exp()).exp(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Link::Identity => "identity",
            Link::Log => "log",
            Link::Logit => "logit",
            Link::Probit => "probit",
            Link::Inverse => "inverse",
            Link::InverseSquared => "inverse_squared",
            Link::CLogLog => "cloglog",
        }
    }
}

impl FromStr for Link {
    type Err = ModelError;

    /// Parse a link name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "identity" => Ok(Link::Identity),
            "log" => Ok(Link::Log),
            "logit" => Ok(Link::Logit),
            "probit" => Ok(Link::Probit),
            "inverse" => Ok(Link::Inverse),
            "inverse_squared" | "1/mu^2" => Ok(Link::InverseSquared),
            "cloglog" => Ok(Link::CLogLog),
            _ => Err(ModelError::UnsupportedFamily { family: format!("link '{s}'") }),
        }
    }
}

/// Exponential-family response distributions with closed-form predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Gaussian,
    Binomial,
    Poisson,
    Gamma,
    InverseGaussian,
}

impl Family {
    /// Canonical link of the family.
    pub fn default_link(&self) -> Link {
        match self {
            Family::Gaussian => Link::Identity,
            Family::Binomial => Link::Logit,
            Family::Poisson => Link::Log,
            Family::Gamma => Link::Inverse,
            Family::InverseGaussian => Link::InverseSquared,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Family::Gaussian => "gaussian",
            Family::Binomial => "binomial",
            Family::Poisson => "poisson",
            Family::Gamma => "gamma",
            Family::InverseGaussian => "inverse_gaussian",
        }
    }
}

impl FromStr for Family {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "gaussian" | "normal" => Ok(Family::Gaussian),
            "binomial" | "logistic" => Ok(Family::Binomial),
            "poisson" => Ok(Family::Poisson),
            "gamma" => Ok(Family::Gamma),
            "inverse_gaussian" | "inversegaussian" => Ok(Family::InverseGaussian),
            _ => Err(ModelError::UnsupportedFamily { family: s.to_string() }),
        }
    }
}

/// Resolve `(family, link)` names into validated enums.
///
/// `link = None` selects the family default.
pub fn resolve_family(family: &str, link: Option<&str>) -> ModelResult<(Family, Link)> {
    let fam: Family = family.parse()?;
    let link = match link {
        Some(name) => name.parse()?,
        None => fam.default_link(),
    };
    Ok((fam, link))
}
