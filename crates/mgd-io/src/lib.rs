//! # mgd-io: Scenario Input & Result Export
//!
//! Everything that touches files or the console for the microgrid dispatch
//! tools.
//!
//! ## Quick Start: Solve a Built-in Scenario
//!
//! ```rust,no_run
//! use mgd_algo::{DispatchModel, MilpSolverKind};
//! use mgd_io::{export, scenario};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let scenario = scenario::preset("default")?;
//!     let model = DispatchModel::build(&scenario.params, &scenario.options)?;
//!     let diagnostics = model.diagnostics().clone();
//!     let solution = model.solve(MilpSolverKind::default())?;
//!
//!     let summary = export::RunSummary::new(&scenario.name, &solution, &diagnostics);
//!     export::export_all(Path::new("out"), &solution, &summary)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`scenario`]: TOML scenario files and built-in presets
//! - [`report`]: tabular console summaries of inputs, model size and schedule
//! - [`export`]: `results.csv`, `line_flows.csv`, `bus_angles.csv`, `summary.json`

pub mod export;
pub mod report;
pub mod scenario;

pub use export::{export_all, ExportedFiles, RunSummary};
pub use scenario::{load_scenario, preset, Scenario, ScenarioFile, PRESETS};
