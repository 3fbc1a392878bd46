//! Error types for the microgrid dispatch workspace
//!
//! [`MgdError`] is what building and solving a model can fail with. The
//! narrower [`ConfigError`] is produced while validating input data and
//! converts into it with `?`; [`TopologyError`] travels inside it.
//!
//! ```
//! use mgd_core::{ConfigError, MgdError, MgdResult};
//!
//! fn check_horizon(hours: usize) -> MgdResult<()> {
//!     if hours == 0 {
//!         return Err(ConfigError::EmptyHorizon.into());
//!     }
//!     Ok(())
//! }
//!
//! assert!(matches!(check_horizon(0), Err(MgdError::Config(ConfigError::EmptyHorizon))));
//! ```

use thiserror::Error;

/// Failure of a model build or solve.
///
/// Solver verdicts are kept apart: an infeasible model and an unbounded model
/// are different failures and are reported as such.
#[derive(Error, Debug)]
pub enum MgdError {
    /// Malformed or inconsistent input parameters
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The assembled model admits no feasible assignment
    #[error("Model is infeasible: {0}")]
    Infeasible(String),

    /// The objective can decrease without limit
    #[error("Model is unbounded: {0}")]
    Unbounded(String),

    /// Any other solver failure
    #[error("Solver error: {0}")]
    Solver(String),
}

/// Convenience type alias for Results using MgdError.
pub type MgdResult<T> = Result<T, MgdError>;

/// Input data rejected before model assembly.
///
/// Every variant names the offending parameter so the message can be traced
/// back to the scenario file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("horizon must contain at least one hour")]
    EmptyHorizon,

    #[error("{field} has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("{field}: minimum {min} exceeds maximum {max}")]
    InvertedBounds { field: String, min: f64, max: f64 },

    #[error("{field} = {value} is outside {range}")]
    OutOfRange {
        field: String,
        value: f64,
        range: &'static str,
    },

    #[error("{field} contains a non-finite value")]
    NonFinite { field: String },

    #[error("{element} references bus {bus}, but the network has {bus_count} buses")]
    UnknownBus {
        element: String,
        bus: usize,
        bus_count: usize,
    },

    #[error("{element} has no bus assignment, required in network mode")]
    Unplaced { element: String },

    #[error("{element} is placed at {count} buses; at most one is supported")]
    MultiplePlacement { element: String, count: usize },

    #[error("location vector for {element} is not one-hot")]
    NotOneHot { element: String },

    #[error("network mode requested but no network description was given")]
    MissingNetwork,

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Errors from building the susceptance and admittance matrices.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    #[error("network has no buses")]
    NoBuses,

    #[error("line {index} ({from}-{to}) has r = x = 0; susceptance is undefined")]
    DegenerateImpedance { index: usize, from: usize, to: usize },

    #[error("line {index} connects bus {bus} to itself")]
    SelfLoop { index: usize, bus: usize },

    #[error("line {index} references bus {bus}, but the network has {bus_count} buses")]
    UnknownBus {
        index: usize,
        bus: usize,
        bus_count: usize,
    },
}
