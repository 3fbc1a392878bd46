//! Optimal dispatch read back from a solver.

use crate::model::balance::FlowPair;
use crate::model::variables::VariableSchema;
use crate::model::ModelStats;
use crate::solver::MilpSolverKind;
use good_lp::{Expression, Solution};
use mgd_core::{BalanceMode, ParameterSet};
use serde::Serialize;
use std::time::Instant;

/// One hour of the optimal schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyDispatch {
    pub hour: usize,
    pub grid_buy_mw: f64,
    pub grid_sell_mw: f64,
    /// Output per generator, in parameter order
    pub generator_mw: Vec<f64>,
    /// Demand per load, in parameter order
    pub load_mw: Vec<f64>,
    pub renewable_mw: f64,
    pub charge_mw: f64,
    pub discharge_mw: f64,
    /// State of charge at the end of the hour (fraction of rated power-hours)
    pub soc: f64,
    /// Value of the charge/discharge indicator
    pub charging: bool,
    /// Operating cost of this hour ($)
    pub cost: f64,
}

impl HourlyDispatch {
    pub fn total_generation_mw(&self) -> f64 {
        self.generator_mw.iter().sum()
    }

    pub fn total_load_mw(&self) -> f64 {
        self.load_mw.iter().sum()
    }

    /// Import minus export.
    pub fn net_grid_mw(&self) -> f64 {
        self.grid_buy_mw - self.grid_sell_mw
    }
}

/// Optimal schedule for the whole horizon.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchSolution {
    pub backend: MilpSolverKind,
    pub mode: BalanceMode,
    /// Minimised total cost ($)
    pub objective: f64,
    pub solve_time_ms: f64,
    pub generator_names: Vec<String>,
    pub load_names: Vec<String>,
    pub hours: Vec<HourlyDispatch>,
    /// `[hour][bus]` voltage angles (rad); empty in simple mode
    pub bus_angles: Vec<Vec<f64>>,
    /// Bus pairs reported in `line_flows`
    pub flow_pairs: Vec<FlowPair>,
    /// `[hour][pair]` flows (MW), signed in the `from → to` direction
    pub line_flows: Vec<Vec<f64>>,
    pub stats: ModelStats,
}

impl DispatchSolution {
    pub fn hour_count(&self) -> usize {
        self.hours.len()
    }

    pub fn is_network(&self) -> bool {
        self.mode == BalanceMode::Network
    }

    pub fn bus_count(&self) -> usize {
        self.bus_angles.first().map(Vec::len).unwrap_or(0)
    }

    /// Hours in which the grid is both bought from and sold to.
    ///
    /// The model does not forbid this; with a sell price below the buy price
    /// it is never optimal, but it can show up when prices are equal.
    pub fn simultaneous_trade_hours(&self, tolerance: f64) -> Vec<usize> {
        self.hours
            .iter()
            .filter(|h| h.grid_buy_mw > tolerance && h.grid_sell_mw > tolerance)
            .map(|h| h.hour)
            .collect()
    }

    /// Σ_t cost(t); matches `objective` up to solver tolerance.
    pub fn total_hourly_cost(&self) -> f64 {
        self.hours.iter().map(|h| h.cost).sum()
    }
}

/// Everything needed to turn raw variable values into a [`DispatchSolution`].
pub(crate) struct SolveContext {
    pub params: ParameterSet,
    pub schema: VariableSchema,
    pub hourly_cost: Vec<Expression>,
    pub objective: Expression,
    pub flow_pairs: Vec<FlowPair>,
    pub backend: MilpSolverKind,
    pub stats: ModelStats,
    pub start: Instant,
}

impl SolveContext {
    pub fn extract<S: Solution>(self, sol: &S) -> DispatchSolution {
        let params = &self.params;
        let schema = &self.schema;

        let hours = params
            .horizon
            .iter()
            .map(|t| HourlyDispatch {
                hour: t,
                grid_buy_mw: sol.value(schema.grid_buy[t]),
                grid_sell_mw: sol.value(schema.grid_sell[t]),
                generator_mw: schema
                    .generator_output
                    .iter()
                    .map(|g| sol.value(g[t]))
                    .collect(),
                load_mw: params.loads.iter().map(|l| l.demand_mw[t]).collect(),
                renewable_mw: params.renewable.forecast_mw[t],
                charge_mw: sol.value(schema.charge[t]),
                discharge_mw: sol.value(schema.discharge[t]),
                soc: sol.value(schema.soc[t]),
                charging: sol.value(schema.indicator[t]) > 0.5,
                cost: self.hourly_cost[t].eval_with(sol),
            })
            .collect();

        let bus_angles: Vec<Vec<f64>> = schema
            .angles
            .as_ref()
            .map(|angles| {
                angles
                    .iter()
                    .map(|row| row.iter().map(|&theta| sol.value(theta)).collect())
                    .collect()
            })
            .unwrap_or_default();

        let line_flows = bus_angles
            .iter()
            .map(|theta| {
                self.flow_pairs
                    .iter()
                    .map(|pair| pair.flow(theta[pair.from], theta[pair.to]))
                    .collect()
            })
            .collect();

        DispatchSolution {
            backend: self.backend,
            mode: params.mode,
            objective: self.objective.eval_with(sol),
            solve_time_ms: self.start.elapsed().as_secs_f64() * 1000.0,
            generator_names: params.generators.iter().map(|g| g.name.clone()).collect(),
            load_names: params.loads.iter().map(|l| l.name.clone()).collect(),
            hours,
            bus_angles,
            flow_pairs: self.flow_pairs.clone(),
            line_flows,
            stats: self.stats.clone(),
        }
    }
}
