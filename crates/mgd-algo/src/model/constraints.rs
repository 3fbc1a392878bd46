//! Constraint rows of the dispatch MILP, tagged by family.
//!
//! Each hour `t` (with `p = prev(t)`, cyclic) contributes:
//!
//! ```text
//! soc(t) = soc(p) + (η·charge(t) − discharge(t)/η) / P       SoC recurrence
//! charge(t)    ≤ P·(1 − soc(p)) / η                            charge headroom
//! discharge(t) ≤ P·soc(p)·η                                     discharge availability
//! charge(t)    ≤ M·u(t)                                         exclusivity
//! discharge(t) ≤ M·(1 − u(t))                                   exclusivity
//! soc_min ≤ soc(t) ≤ soc_max
//! p_min(g) ≤ p(g,t) ≤ p_max(g)
//! ```
//!
//! plus whatever the active balance formulation emits (see
//! [`super::balance`]).

use super::balance::BalanceFormulation;
use super::variables::VariableSchema;
use good_lp::{constraint, Constraint};
use mgd_core::ParameterSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Constraint family, used for counting and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// System-wide energy balance (simple mode)
    EnergyBalance,
    /// Per-bus DC power-flow balance (network mode)
    NodalBalance,
    /// Directional flow limit on a bus pair
    LineFlowLimit,
    AngleBounds,
    ReferenceAngle,
    /// Grid exchange pinned to zero for an islanded network
    GridDisconnected,
    SocDynamics,
    ChargeHeadroom,
    DischargeAvailability,
    ChargeExclusion,
    DischargeExclusion,
    SocBounds,
    GeneratorBounds,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::EnergyBalance => "energy_balance",
            ConstraintKind::NodalBalance => "nodal_balance",
            ConstraintKind::LineFlowLimit => "line_flow_limit",
            ConstraintKind::AngleBounds => "angle_bounds",
            ConstraintKind::ReferenceAngle => "reference_angle",
            ConstraintKind::GridDisconnected => "grid_disconnected",
            ConstraintKind::SocDynamics => "soc_dynamics",
            ConstraintKind::ChargeHeadroom => "charge_headroom",
            ConstraintKind::DischargeAvailability => "discharge_availability",
            ConstraintKind::ChargeExclusion => "charge_exclusion",
            ConstraintKind::DischargeExclusion => "discharge_exclusion",
            ConstraintKind::SocBounds => "soc_bounds",
            ConstraintKind::GeneratorBounds => "generator_bounds",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constraint row with the family and hour it belongs to.
pub struct TaggedConstraint {
    pub kind: ConstraintKind,
    pub hour: usize,
    pub constraint: Constraint,
}

/// Ordered collection of constraint rows.
#[derive(Default)]
pub struct ConstraintSet {
    rows: Vec<TaggedConstraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ConstraintKind, hour: usize, constraint: Constraint) {
        self.rows.push(TaggedConstraint {
            kind,
            hour,
            constraint,
        });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaggedConstraint> {
        self.rows.iter()
    }

    pub fn count(&self, kind: ConstraintKind) -> usize {
        self.rows.iter().filter(|r| r.kind == kind).count()
    }

    pub fn counts_by_kind(&self) -> BTreeMap<ConstraintKind, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn into_constraints(self) -> impl Iterator<Item = Constraint> {
        self.rows.into_iter().map(|r| r.constraint)
    }
}

/// Generate every constraint row for the horizon.
///
/// The result is a pure function of its inputs: the same parameters, schema
/// and options always yield the same rows in the same order.
pub fn generate(
    params: &ParameterSet,
    schema: &VariableSchema,
    balance: &dyn BalanceFormulation,
    big_m: f64,
) -> ConstraintSet {
    let mut set = ConstraintSet::new();
    for t in params.horizon.iter() {
        balance.emit(t, params, schema, &mut set);
        battery_rows(t, params, schema, big_m, &mut set);
        generator_rows(t, params, schema, &mut set);
    }
    set
}

fn battery_rows(
    t: usize,
    params: &ParameterSet,
    schema: &VariableSchema,
    big_m: f64,
    set: &mut ConstraintSet,
) {
    let bess = &params.battery;
    let p_max = bess.max_power_mw;
    let eta = bess.efficiency;
    let prev = params.horizon.prev(t);

    let soc = schema.soc[t];
    let soc_prev = schema.soc[prev];
    let charge = schema.charge[t];
    let discharge = schema.discharge[t];
    let u = schema.indicator[t];

    let charge_gain = eta / p_max;
    let discharge_loss = 1.0 / (eta * p_max);
    set.push(
        ConstraintKind::SocDynamics,
        t,
        constraint!(soc == soc_prev + charge_gain * charge - discharge_loss * discharge),
    );

    let headroom = p_max / eta;
    set.push(
        ConstraintKind::ChargeHeadroom,
        t,
        constraint!(charge <= headroom - headroom * soc_prev),
    );

    set.push(
        ConstraintKind::DischargeAvailability,
        t,
        constraint!(discharge <= p_max * eta * soc_prev),
    );

    set.push(
        ConstraintKind::ChargeExclusion,
        t,
        constraint!(charge <= big_m * u),
    );
    set.push(
        ConstraintKind::DischargeExclusion,
        t,
        constraint!(discharge <= big_m - big_m * u),
    );

    set.push(ConstraintKind::SocBounds, t, constraint!(soc >= bess.soc_min));
    set.push(ConstraintKind::SocBounds, t, constraint!(soc <= bess.soc_max));
}

fn generator_rows(t: usize, params: &ParameterSet, schema: &VariableSchema, set: &mut ConstraintSet) {
    for (gen, output) in params.generators.iter().zip(&schema.generator_output) {
        let p = output[t];
        set.push(ConstraintKind::GeneratorBounds, t, constraint!(p >= gen.p_min_mw));
        set.push(ConstraintKind::GeneratorBounds, t, constraint!(p <= gen.p_max_mw));
    }
}
