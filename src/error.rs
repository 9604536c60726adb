//! Error types for the engine.
//!
//! Only configuration problems and misuse of the public API are errors.
//! Economic trouble inside a tick (shortages, underfunding, debt) is
//! reported as a [`RegionCondition`](crate::model::RegionCondition).

use thiserror::Error;

use crate::model::{CyclePhase, RegionId};

/// Errors returned by the orchestrator's public operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("region {0} is already registered")]
    DuplicateRegion(RegionId),

    #[error("region {0} is not registered")]
    UnknownRegion(RegionId),

    #[error("region {id} is invalid: {reason}")]
    InvalidRegion { id: RegionId, reason: String },

    #[error("region {id} cannot afford {cost:.2} (available above floor: {available:.2})")]
    InsufficientFunds {
        id: RegionId,
        cost: f64,
        available: f64,
    },
}

/// A configuration value that would make the simulation produce NaN,
/// infinities or nonsense. Detected before the engine starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: String, value: f64 },

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: String, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: String, value: f64 },

    #[error("{field} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} exponent must lie in (0, 1], got {value}")]
    Exponent { field: String, value: f64 },

    #[error("{0} phase duration must be at least one tick")]
    ZeroDuration(CyclePhase),

    #[error("price bounds are inverted: min ratio {min} exceeds max ratio {max}")]
    PriceBounds { min: f64, max: f64 },

    #[error("pipeline must run each stage exactly once: {0}")]
    Pipeline(String),
}

/// Result alias used by the orchestrator API.
pub type Result<T> = std::result::Result<T, EngineError>;
