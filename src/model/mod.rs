//! model — the Model Handle interface and built-in adapters.
//!
//! Purpose
//! -------
//! Normalize fitted regression models into one uniform oracle,
//! `predict(θ, data) → ŷ`, that accepts arbitrary parameter vectors without
//! refitting. Everything downstream (comparisons, delta method, inference)
//! talks to models exclusively through [`ModelHandle`].
//!
//! Key behaviors
//! -------------
//! - [`DesignSpec`] / [`Term`] rebuild design matrices for any covariate
//!   table (intercept, numeric, treatment-coded factors, interactions).
//! - [`LinearModel`], [`GeneralizedLinearModel`], and [`MixedLinearModel`]
//!   implement [`ModelHandle`]; family-specific quirks (links, offsets,
//!   random effects) live only in these adapters.
//! - Fitted output is validated once at construction: parameter length and
//!   finiteness, covariance shape, symmetry, and positive semi-definiteness.
//!
//! Invariants & assumptions
//! ------------------------
//! - Handles are immutable; `predict` never mutates state and is safe to
//!   call concurrently (`ModelHandle: Sync`).
//! - Custom adapters may implement [`ModelHandle`] directly and surface
//!   arbitrary failures through `From<anyhow::Error> for ModelError`.
//!
//! Downstream usage
//! ----------------
//! - `margins` calls [`predict_checked`] on counterfactual grids.
//! - `inference` perturbs `coefficients()` and re-enters the engine.

pub mod design;
pub mod errors;
pub mod fitted;
pub mod glm;
pub mod linear;
pub mod link;
pub mod mixed;
pub mod traits;
pub mod validation;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::design::{DesignSpec, Term};
pub use self::errors::{ModelError, ModelResult};
pub use self::glm::{GeneralizedLinearModel, PredictionType};
pub use self::linear::LinearModel;
pub use self::link::{Family, Link, resolve_family};
pub use self::mixed::{MixedLinearModel, RandomEffects};
pub use self::traits::{ModelHandle, VariableKind, VariableMeta, predict_checked};

pub mod prelude {
    pub use super::design::{DesignSpec, Term};
    pub use super::errors::{ModelError, ModelResult};
    pub use super::glm::{GeneralizedLinearModel, PredictionType};
    pub use super::linear::LinearModel;
    pub use super::link::{Family, Link};
    pub use super::mixed::{MixedLinearModel, RandomEffects};
    pub use super::traits::{ModelHandle, VariableKind, VariableMeta};
}
