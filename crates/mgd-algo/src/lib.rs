//! # mgd-algo: Day-Ahead Microgrid Dispatch MILP
//!
//! Builds and solves the mixed-integer program that schedules grid trade,
//! diesel generation and battery operation over a cyclic horizon at minimum
//! cost.
//!
//! ## Pipeline
//!
//! | Stage | Item | Output |
//! |-------|------|--------|
//! | Variables | [`VariableSchema`] | buy, sell, generator output, charge, discharge, SoC, indicator, angles |
//! | Objective | [`model::objective`] | Σ_t cost(t) |
//! | Constraints | [`model::constraints`] | battery, generator and balance rows |
//! | Assembly | [`DispatchModel::build`] | validated MILP plus [`ModelStats`] |
//! | Solve | [`DispatchModel::solve`] | [`DispatchSolution`] |
//! | Check | [`verify::check`] | [`Residuals`] |
//!
//! ### Balance Formulations
//!
//! The energy balance is a [`BalanceFormulation`] strategy chosen from the
//! parameter set's [`mgd_core::BalanceMode`]:
//!
//! - [`SimpleBalance`]: one system-wide equality per hour
//! - [`NetworkBalance`]: per-bus DC power flow with line-flow limits
//!   ([`LineLimitScope`]), angle bounds and an optional reference bus
//!
//! ### Backends
//!
//! [`MilpSolverKind::Microlp`] is pure Rust and always compiled in. HiGHS is
//! available with the `solver-highs` feature.
//!
//! ## Example
//!
//! ```rust
//! use mgd_algo::{DispatchModel, MilpSolverKind, ModelOptions};
//! use mgd_core::*;
//!
//! let params = ParameterSet::new(
//!     Horizon::new(2),
//!     vec![1000.0; 2],
//!     BatteryStorage::new(50.0, 1.0, 0.0, 1.0),
//!     RenewableSource::new(vec![0.0; 2]),
//! )
//! .with_price_scale(0.0)
//! .with_generator(DieselGenerator::new("DG1", 150.0, 0.0, 200.0))
//! .with_load(LoadPoint::new("Load1", vec![50.0; 2]));
//!
//! let model = DispatchModel::build(&params, &ModelOptions::default()).unwrap();
//! let solution = model.solve(MilpSolverKind::Microlp).unwrap();
//! assert!((solution.objective - 15_000.0).abs() < 1e-4);
//! ```

pub mod model;
pub mod solution;
pub mod solver;
pub mod verify;

pub use model::balance::{
    BalanceFormulation, FlowPair, LineLimitScope, NetworkBalance, SimpleBalance,
};
pub use model::constraints::{ConstraintKind, ConstraintSet, TaggedConstraint};
pub use model::variables::VariableSchema;
pub use model::{DispatchModel, ModelOptions, ModelStats, DEFAULT_BIG_M};
pub use solution::{DispatchSolution, HourlyDispatch};
pub use solver::MilpSolverKind;
pub use verify::Residuals;
