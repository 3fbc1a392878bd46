//! # mgd-core: Microgrid Dispatch Domain Model
//!
//! Static input data and physical system representation for the day-ahead
//! microgrid dispatch model.
//!
//! ## Design Philosophy
//!
//! Everything in this crate is built once from static input and never mutated:
//!
//! - [`ParameterSet`]: horizon, prices, demand, renewable forecast, battery,
//!   generators, placement and the balance-mode flag
//! - [`Topology`]: buses and lines with the derived [`SusceptanceMatrix`] and
//!   nodal [`AdmittanceMatrix`]
//! - [`Horizon`]: cyclic hour indexing (`prev(0) == T - 1`)
//!
//! Input is validated up front ([`ParameterSet::validate`]). Malformed data
//! becomes a [`ConfigError`] naming the offending parameter; legal but
//! suspicious data becomes a [`Diagnostics`] warning.
//!
//! ## Quick Start
//!
//! ```rust
//! use mgd_core::*;
//!
//! let params = ParameterSet::new(
//!     Horizon::new(3),
//!     vec![1000.0; 3],
//!     BatteryStorage::new(50.0, 0.95, 0.1, 0.9),
//!     RenewableSource::new(vec![0.0; 3]),
//! )
//! .with_generator(DieselGenerator::new("DG1", 50.0, 0.0, 200.0))
//! .with_load(LoadPoint::new("Load1", vec![100.0; 3]));
//!
//! let diagnostics = params.validate().expect("valid parameters");
//! assert!(diagnostics.is_empty());
//! ```
//!
//! ## Modules
//!
//! - [`params`] - parameter set, element types and validation
//! - [`topology`] - lines, susceptance and admittance matrices
//! - [`graph_utils`] - island detection on the bus graph
//! - [`diagnostics`] - non-fatal validation findings
//! - [`error`] - error taxonomy

use serde::{Deserialize, Serialize};

pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod horizon;
pub mod params;
pub mod topology;

pub use diagnostics::{Diagnostics, Warning, WarningKind};
pub use error::{ConfigError, MgdError, MgdResult, TopologyError};
pub use graph_utils::{find_islands, IslandAnalysis, IslandSummary};
pub use horizon::Horizon;
pub use params::{
    BalanceMode, BatteryStorage, DieselGenerator, GridConnection, LoadPoint, Location,
    NetworkParams, ParameterSet, RenewableSource, DEFAULT_PRICE_SCALE,
};
pub use topology::{AdmittanceMatrix, Line, SusceptanceMatrix, Topology};

/// 0-based bus index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(usize);

impl BusId {
    #[inline]
    pub fn new(value: usize) -> Self {
        BusId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for BusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bus{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_id_roundtrip() {
        let bus = BusId::new(3);
        assert_eq!(bus.value(), 3);
        assert_eq!(bus.to_string(), "Bus3");
    }

    #[test]
    fn bus_id_serializes_transparently() {
        let json = serde_json::to_string(&BusId::new(2)).unwrap();
        assert_eq!(json, "2");
    }
}
