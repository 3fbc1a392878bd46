//! Energy-balance formulations.
//!
//! The model picks exactly one [`BalanceFormulation`] per build:
//!
//! - [`SimpleBalance`]: one system-wide "copper plate" balance per hour
//! - [`NetworkBalance`]: per-bus DC power-flow balance with line-flow and
//!   angle limits
//!
//! # DC Power Flow
//!
//! Net injection at bus `i` must equal the flow leaving it:
//!
//! ```text
//! inj(i,t) = Σ_j B[i][j]·(θ_i(t) − θ_j(t))
//! ```
//!
//! where `B` is the nodal admittance matrix of [`mgd_core::Topology`]. The
//! flow on a bus pair is `B[i][j]·(θ_i − θ_j)` and is limited to
//! `±line_capacity` in both directions.

use super::constraints::{ConstraintKind, ConstraintSet};
use super::variables::VariableSchema;
use good_lp::{constraint, Expression, Variable};
use mgd_core::{NetworkParams, ParameterSet, Topology};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategy that emits the balance rows for one hour.
pub trait BalanceFormulation: Send + Sync {
    /// Short identifier (e.g., "simple", "network").
    fn id(&self) -> &'static str;

    /// Buses needing an angle variable per hour, `None` if angles are unused.
    fn angle_buses(&self) -> Option<usize>;

    /// Append the balance rows of hour `t` to `out`.
    fn emit(&self, t: usize, params: &ParameterSet, schema: &VariableSchema, out: &mut ConstraintSet);

    /// Bus pairs whose flows are reported with a solution.
    fn flow_pairs(&self) -> Vec<FlowPair> {
        Vec::new()
    }
}

/// A bus pair and the coefficient turning an angle difference into a flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowPair {
    pub from: usize,
    pub to: usize,
    /// `B[from][to]`
    pub coefficient: f64,
}

impl FlowPair {
    pub fn flow(&self, theta_from: f64, theta_to: f64) -> f64 {
        self.coefficient * (theta_from - theta_to)
    }
}

/// Which bus pairs carry a flow limit in network mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineLimitScope {
    /// Only pairs joined by a line, in both directions
    #[default]
    Lines,
    /// Every ordered bus pair, including unconnected ones (trivial rows)
    #[serde(alias = "all-pairs")]
    AllBusPairs,
}

impl LineLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineLimitScope::Lines => "lines",
            LineLimitScope::AllBusPairs => "all-bus-pairs",
        }
    }
}

impl fmt::Display for LineLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineLimitScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lines" => Ok(LineLimitScope::Lines),
            "all-bus-pairs" | "all-pairs" | "all" => Ok(LineLimitScope::AllBusPairs),
            other => Err(format!(
                "unknown line limit scope '{other}' (expected 'lines' or 'all-pairs')"
            )),
        }
    }
}

/// One balance row per hour:
///
/// ```text
/// buy − sell + discharge − charge + renewable + Σ_g p(g) = Σ_l load(l)
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleBalance;

impl BalanceFormulation for SimpleBalance {
    fn id(&self) -> &'static str {
        "simple"
    }

    fn angle_buses(&self) -> Option<usize> {
        None
    }

    fn emit(&self, t: usize, params: &ParameterSet, schema: &VariableSchema, out: &mut ConstraintSet) {
        let mut supply = schema.grid_buy[t] - schema.grid_sell[t] + schema.discharge[t]
            - schema.charge[t];
        for output in &schema.generator_output {
            supply += output[t];
        }
        let demand = params.total_demand_mw(t) - params.renewable.forecast_mw[t];
        out.push(
            ConstraintKind::EnergyBalance,
            t,
            constraint!(supply == demand),
        );
    }
}

/// Per-bus DC power-flow balance.
#[derive(Debug, Clone)]
pub struct NetworkBalance {
    topology: Topology,
    network: NetworkParams,
    scope: LineLimitScope,
}

impl NetworkBalance {
    pub fn new(topology: Topology, network: NetworkParams, scope: LineLimitScope) -> Self {
        Self {
            topology,
            network,
            scope,
        }
    }

    /// Net controllable injection and fixed net injection at `bus`.
    fn injection(&self, t: usize, bus: usize, params: &ParameterSet, schema: &VariableSchema) -> (Expression, f64) {
        let mut expr = Expression::from(0.0);
        let mut fixed = 0.0;

        if params.grid.location.is_at(bus) {
            expr += schema.grid_buy[t];
            expr -= schema.grid_sell[t];
        }
        if params.battery.location.is_at(bus) {
            expr += schema.discharge[t];
            expr -= schema.charge[t];
        }
        if params.renewable.location.is_at(bus) {
            fixed += params.renewable.forecast_mw[t];
        }
        for (gen, output) in params.generators.iter().zip(&schema.generator_output) {
            if gen.location.is_at(bus) {
                expr += output[t];
            }
        }
        for load in &params.loads {
            if load.location.is_at(bus) {
                fixed -= load.demand_mw[t];
            }
        }

        (expr, fixed)
    }

    fn flow(&self, i: usize, j: usize, theta: &[Variable]) -> Expression {
        self.topology.admittance().get(i, j) * (theta[i] - theta[j])
    }

    /// Ordered pairs that receive a flow limit under the configured scope.
    fn limited_pairs(&self) -> Vec<(usize, usize)> {
        let n = self.topology.bus_count();
        match self.scope {
            LineLimitScope::Lines => self
                .topology
                .line_pairs()
                .into_iter()
                .flat_map(|(i, j)| [(i, j), (j, i)])
                .collect(),
            LineLimitScope::AllBusPairs => (0..n)
                .flat_map(|i| (0..n).map(move |j| (i, j)))
                .collect(),
        }
    }
}

impl BalanceFormulation for NetworkBalance {
    fn id(&self) -> &'static str {
        "network"
    }

    fn angle_buses(&self) -> Option<usize> {
        Some(self.topology.bus_count())
    }

    fn emit(&self, t: usize, params: &ParameterSet, schema: &VariableSchema, out: &mut ConstraintSet) {
        let angles = schema
            .angles
            .as_ref()
            .expect("schema declared without angle variables for a network formulation");
        let theta = &angles[t];
        let n = self.topology.bus_count();

        for i in 0..n {
            let (injection, fixed) = self.injection(t, i, params, schema);
            let mut outflow = Expression::from(0.0);
            for j in 0..n {
                if self.topology.connected(i, j) {
                    outflow += self.flow(i, j, theta);
                }
            }
            out.push(
                ConstraintKind::NodalBalance,
                t,
                constraint!(injection + fixed == outflow),
            );
        }

        let cap = self.network.line_capacity_mw;
        for (i, j) in self.limited_pairs() {
            let flow = self.flow(i, j, theta);
            out.push(ConstraintKind::LineFlowLimit, t, constraint!(flow.clone() <= cap));
            out.push(ConstraintKind::LineFlowLimit, t, constraint!(flow >= -cap));
        }

        for &angle in theta {
            out.push(
                ConstraintKind::AngleBounds,
                t,
                constraint!(angle >= self.network.angle_min_rad),
            );
            out.push(
                ConstraintKind::AngleBounds,
                t,
                constraint!(angle <= self.network.angle_max_rad),
            );
        }

        if let Some(reference) = self.network.reference_bus {
            let angle = theta[reference.value()];
            out.push(ConstraintKind::ReferenceAngle, t, constraint!(angle == 0.0));
        }

        if !params.grid.is_connected() {
            let (buy, sell) = (schema.grid_buy[t], schema.grid_sell[t]);
            out.push(ConstraintKind::GridDisconnected, t, constraint!(buy == 0.0));
            out.push(ConstraintKind::GridDisconnected, t, constraint!(sell == 0.0));
        }
    }

    fn flow_pairs(&self) -> Vec<FlowPair> {
        let admittance = self.topology.admittance();
        self.topology
            .line_pairs()
            .into_iter()
            .map(|(from, to)| FlowPair {
                from,
                to,
                coefficient: admittance.get(from, to),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use good_lp::ProblemVariables;
    use mgd_core::{
        BatteryStorage, BusId, DieselGenerator, GridConnection, Horizon, Line, LoadPoint,
        RenewableSource,
    };

    fn three_bus(reference: bool) -> ParameterSet {
        let lines = vec![
            Line::lossless(BusId::new(0), BusId::new(1), 0.1),
            Line::lossless(BusId::new(1), BusId::new(2), 0.2),
            Line::lossless(BusId::new(0), BusId::new(2), 0.25),
        ];
        let mut network = NetworkParams::new(3, lines, 100.0);
        if reference {
            network = network.with_reference_bus(BusId::new(0));
        }
        ParameterSet::new(
            Horizon::new(2),
            vec![100.0; 2],
            BatteryStorage::new(50.0, 0.95, 0.1, 0.9).at(BusId::new(1)),
            RenewableSource::new(vec![10.0; 2]).at(BusId::new(2)),
        )
        .with_grid(GridConnection::at(BusId::new(0)))
        .with_generator(DieselGenerator::new("DG1", 80.0, 0.0, 100.0).at(BusId::new(1)))
        .with_load(LoadPoint::new("Load1", vec![60.0; 2]).at(BusId::new(2)))
        .with_network(network)
    }

    fn emit_hour(p: &ParameterSet, scope: LineLimitScope) -> ConstraintSet {
        let topology = p.topology().unwrap().unwrap();
        let balance = NetworkBalance::new(topology, p.network.clone().unwrap(), scope);
        let mut vars = ProblemVariables::new();
        let schema = VariableSchema::declare(p, balance.angle_buses(), &mut vars);
        let mut set = ConstraintSet::new();
        balance.emit(0, p, &schema, &mut set);
        set
    }

    #[test]
    #[should_panic(expected = "without angle variables")]
    fn network_rows_require_angle_variables() {
        let p = three_bus(false);
        let topology = p.topology().unwrap().unwrap();
        let balance = NetworkBalance::new(topology, p.network.clone().unwrap(), LineLimitScope::Lines);
        let mut vars = ProblemVariables::new();
        let schema = VariableSchema::declare(&p, None, &mut vars);
        let mut set = ConstraintSet::new();
        balance.emit(0, &p, &schema, &mut set);
    }

    #[test]
    fn network_rows_per_hour() {
        let set = emit_hour(&three_bus(false), LineLimitScope::Lines);
        assert_eq!(set.count(ConstraintKind::NodalBalance), 3);
        assert_eq!(set.count(ConstraintKind::LineFlowLimit), 3 * 2 * 2);
        assert_eq!(set.count(ConstraintKind::AngleBounds), 3 * 2);
        assert_eq!(set.count(ConstraintKind::ReferenceAngle), 0);
        assert_eq!(set.count(ConstraintKind::GridDisconnected), 0);
    }

    #[test]
    fn islanded_network_pins_grid_exchange() {
        let mut p = three_bus(false);
        p.grid = GridConnection::default();
        let set = emit_hour(&p, LineLimitScope::Lines);
        assert_eq!(set.count(ConstraintKind::GridDisconnected), 2);
        assert_eq!(set.count(ConstraintKind::NodalBalance), 3);
    }

    #[test]
    fn all_bus_pairs_scope_limits_every_ordered_pair() {
        let set = emit_hour(&three_bus(false), LineLimitScope::AllBusPairs);
        assert_eq!(set.count(ConstraintKind::LineFlowLimit), 3 * 3 * 2);
    }

    #[test]
    fn reference_bus_adds_one_row_per_hour() {
        let set = emit_hour(&three_bus(true), LineLimitScope::Lines);
        assert_eq!(set.count(ConstraintKind::ReferenceAngle), 1);
    }

    #[test]
    fn flow_pairs_follow_lines() {
        let p = three_bus(false);
        let balance = NetworkBalance::new(
            p.topology().unwrap().unwrap(),
            p.network.clone().unwrap(),
            LineLimitScope::Lines,
        );
        let pairs = balance.flow_pairs();
        assert_eq!(pairs.len(), 3);
        assert_eq!((pairs[0].from, pairs[0].to), (0, 1));
        assert!((pairs[0].coefficient - 10.0).abs() < 1e-12);
        assert!((pairs[0].flow(0.1, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn simple_balance_has_no_angles_or_flows() {
        assert_eq!(SimpleBalance.angle_buses(), None);
        assert!(SimpleBalance.flow_pairs().is_empty());
        assert_eq!(SimpleBalance.id(), "simple");
    }

    #[test]
    fn scope_parses_from_cli_strings() {
        assert_eq!("lines".parse::<LineLimitScope>().unwrap(), LineLimitScope::Lines);
        assert_eq!(
            "ALL-BUS-PAIRS".parse::<LineLimitScope>().unwrap(),
            LineLimitScope::AllBusPairs
        );
        assert!("pairs".parse::<LineLimitScope>().is_err());
        assert_eq!(LineLimitScope::AllBusPairs.to_string(), "all-bus-pairs");
    }
}
