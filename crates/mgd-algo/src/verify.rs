//! Post-solve residual checks.
//!
//! Recomputes every structural property of an optimal schedule from the raw
//! numbers, independently of the constraint rows that produced it. Each
//! residual is the largest violation over the horizon (0 when satisfied).

use crate::solution::DispatchSolution;
use mgd_core::{MgdResult, ParameterSet};
use serde::Serialize;

/// Default tolerance for [`Residuals::within`].
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Largest violation of each property.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Residuals {
    /// |supply − demand| summed over the whole system
    pub energy_balance: f64,
    /// |soc(t) − soc(prev t) − (η·charge − discharge/η)/P|, including the wrap
    pub soc_recurrence: f64,
    pub soc_bounds: f64,
    pub charge_headroom: f64,
    pub discharge_availability: f64,
    /// min(charge, discharge); zero when the two never overlap
    pub exclusivity: f64,
    pub generator_bounds: f64,
    /// Per-bus DC balance; zero in simple mode
    pub nodal_balance: f64,
    /// Flow beyond line capacity; zero in simple mode
    pub line_flow: f64,
}

impl Residuals {
    pub fn named(&self) -> [(&'static str, f64); 9] {
        [
            ("energy_balance", self.energy_balance),
            ("soc_recurrence", self.soc_recurrence),
            ("soc_bounds", self.soc_bounds),
            ("charge_headroom", self.charge_headroom),
            ("discharge_availability", self.discharge_availability),
            ("exclusivity", self.exclusivity),
            ("generator_bounds", self.generator_bounds),
            ("nodal_balance", self.nodal_balance),
            ("line_flow", self.line_flow),
        ]
    }

    pub fn max(&self) -> f64 {
        self.named().iter().map(|(_, v)| *v).fold(0.0, f64::max)
    }

    pub fn within(&self, tolerance: f64) -> bool {
        self.max() <= tolerance
    }

    /// Properties whose residual exceeds `tolerance`.
    pub fn violations(&self, tolerance: f64) -> Vec<(&'static str, f64)> {
        self.named()
            .into_iter()
            .filter(|(_, v)| *v > tolerance)
            .collect()
    }
}

fn excess(value: f64, min: f64, max: f64) -> f64 {
    (min - value).max(value - max).max(0.0)
}

/// Recompute every residual of `solution` against `params`.
pub fn check(params: &ParameterSet, solution: &DispatchSolution) -> MgdResult<Residuals> {
    let mut r = Residuals::default();
    let bess = &params.battery;
    let (p_max, eta) = (bess.max_power_mw, bess.efficiency);

    for h in &solution.hours {
        let t = h.hour;
        let prev = &solution.hours[params.horizon.prev(t)];

        let supply = h.net_grid_mw() + h.discharge_mw - h.charge_mw
            + h.renewable_mw
            + h.total_generation_mw();
        r.energy_balance = r.energy_balance.max((supply - h.total_load_mw()).abs());

        let expected = prev.soc + (eta * h.charge_mw - h.discharge_mw / eta) / p_max;
        r.soc_recurrence = r.soc_recurrence.max((h.soc - expected).abs());
        r.soc_bounds = r.soc_bounds.max(excess(h.soc, bess.soc_min, bess.soc_max));

        let headroom = p_max * (1.0 - prev.soc) / eta;
        r.charge_headroom = r.charge_headroom.max(h.charge_mw - headroom).max(0.0);
        let available = p_max * prev.soc * eta;
        r.discharge_availability = r
            .discharge_availability
            .max(h.discharge_mw - available)
            .max(0.0);
        r.exclusivity = r.exclusivity.max(h.charge_mw.min(h.discharge_mw).max(0.0));

        for (gen, &p) in params.generators.iter().zip(&h.generator_mw) {
            r.generator_bounds = r
                .generator_bounds
                .max(excess(p, gen.p_min_mw, gen.p_max_mw));
        }
    }

    if let (Some(topology), Some(network)) = (params.topology()?, params.network.as_ref()) {
        let admittance = topology.admittance();
        let n = topology.bus_count();
        for (h, theta) in solution.hours.iter().zip(&solution.bus_angles) {
            let t = h.hour;
            for i in 0..n {
                let mut injection = 0.0;
                if params.grid.location.is_at(i) {
                    injection += h.net_grid_mw();
                }
                if params.battery.location.is_at(i) {
                    injection += h.discharge_mw - h.charge_mw;
                }
                if params.renewable.location.is_at(i) {
                    injection += params.renewable.forecast_mw[t];
                }
                for (gen, &p) in params.generators.iter().zip(&h.generator_mw) {
                    if gen.location.is_at(i) {
                        injection += p;
                    }
                }
                for load in &params.loads {
                    if load.location.is_at(i) {
                        injection -= load.demand_mw[t];
                    }
                }
                let outflow: f64 = (0..n)
                    .filter(|&j| j != i)
                    .map(|j| admittance.get(i, j) * (theta[i] - theta[j]))
                    .sum();
                r.nodal_balance = r.nodal_balance.max((injection - outflow).abs());
            }
        }
        for flows in &solution.line_flows {
            for flow in flows {
                r.line_flow = r
                    .line_flow
                    .max(flow.abs() - network.line_capacity_mw)
                    .max(0.0);
            }
        }
    }

    Ok(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excess_is_zero_inside_bounds() {
        assert_eq!(excess(0.5, 0.1, 0.9), 0.0);
        assert!((excess(0.95, 0.1, 0.9) - 0.05).abs() < 1e-12);
        assert!((excess(0.0, 0.1, 0.9) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn violations_filter_by_tolerance() {
        let r = Residuals {
            soc_recurrence: 1e-3,
            exclusivity: 1e-9,
            ..Residuals::default()
        };
        assert!(!r.within(1e-6));
        assert_eq!(r.violations(1e-6), vec![("soc_recurrence", 1e-3)]);
        assert!((r.max() - 1e-3).abs() < 1e-15);
    }
}
