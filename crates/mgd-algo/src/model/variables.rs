//! Decision variables of the dispatch MILP.
//!
//! | Variable            | Index      | Domain    |
//! |---------------------|------------|-----------|
//! | `grid_buy`          | t          | ≥ 0       |
//! | `grid_sell`         | t          | ≥ 0       |
//! | `generator_output`  | g, t       | free      |
//! | `charge`            | t          | ≥ 0       |
//! | `discharge`         | t          | ≥ 0       |
//! | `soc`               | t          | [0, 1]    |
//! | `indicator`         | t          | {0, 1}    |
//! | `angles`            | t, bus     | free      |
//!
//! Generator output carries no domain bound here; its limits are explicit
//! constraint rows so they show up in the constraint breakdown. Angles only
//! exist in network mode.

use good_lp::{variable, ProblemVariables, Variable};
use mgd_core::ParameterSet;

/// Handles to every decision variable, grouped by role.
pub struct VariableSchema {
    pub grid_buy: Vec<Variable>,
    pub grid_sell: Vec<Variable>,
    /// `[generator][hour]`
    pub generator_output: Vec<Vec<Variable>>,
    pub charge: Vec<Variable>,
    pub discharge: Vec<Variable>,
    pub soc: Vec<Variable>,
    /// 1 = charging permitted, 0 = discharging permitted
    pub indicator: Vec<Variable>,
    /// `[hour][bus]`
    pub angles: Option<Vec<Vec<Variable>>>,
}

impl VariableSchema {
    /// Declare all variables for `params` in `vars`.
    ///
    /// `angle_buses` is the number of buses needing a voltage angle per hour,
    /// or `None` when the balance formulation does not use angles.
    pub fn declare(
        params: &ParameterSet,
        angle_buses: Option<usize>,
        vars: &mut ProblemVariables,
    ) -> Self {
        let hours = params.hours();

        let grid_buy = vars.add_vector(variable().min(0.0), hours);
        let grid_sell = vars.add_vector(variable().min(0.0), hours);
        let generator_output = params
            .generators
            .iter()
            .map(|_| vars.add_vector(variable(), hours))
            .collect();
        let charge = vars.add_vector(variable().min(0.0), hours);
        let discharge = vars.add_vector(variable().min(0.0), hours);
        let soc = vars.add_vector(variable().min(0.0).max(1.0), hours);
        let indicator = vars.add_vector(variable().binary(), hours);
        let angles = angle_buses.map(|buses| {
            (0..hours)
                .map(|_| vars.add_vector(variable(), buses))
                .collect()
        });

        Self {
            grid_buy,
            grid_sell,
            generator_output,
            charge,
            discharge,
            soc,
            indicator,
            angles,
        }
    }

    pub fn hours(&self) -> usize {
        self.soc.len()
    }

    /// Angle variable for `bus` at hour `t`, if angles were declared.
    pub fn angle(&self, t: usize, bus: usize) -> Option<Variable> {
        self.angles.as_ref().map(|a| a[t][bus])
    }

    pub fn continuous_count(&self) -> usize {
        let per_hour = 5 + self.generator_output.len();
        let angles: usize = self
            .angles
            .as_ref()
            .map(|a| a.iter().map(Vec::len).sum())
            .unwrap_or(0);
        per_hour * self.hours() + angles
    }

    pub fn integer_count(&self) -> usize {
        self.indicator.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mgd_core::{BatteryStorage, DieselGenerator, Horizon, RenewableSource};

    fn params(hours: usize, generators: usize) -> ParameterSet {
        let mut p = ParameterSet::new(
            Horizon::new(hours),
            vec![100.0; hours],
            BatteryStorage::new(10.0, 1.0, 0.0, 1.0),
            RenewableSource::new(vec![0.0; hours]),
        );
        for g in 0..generators {
            p = p.with_generator(DieselGenerator::new(format!("DG{}", g + 1), 50.0, 0.0, 10.0));
        }
        p
    }

    #[test]
    fn counts_without_angles() {
        let mut vars = ProblemVariables::new();
        let schema = VariableSchema::declare(&params(24, 2), None, &mut vars);
        assert_eq!(schema.hours(), 24);
        assert_eq!(schema.generator_output.len(), 2);
        assert_eq!(schema.continuous_count(), 7 * 24);
        assert_eq!(schema.integer_count(), 24);
        assert!(schema.angle(0, 0).is_none());
        assert_eq!(vars.len(), 8 * 24);
    }

    #[test]
    fn angles_add_one_variable_per_bus_hour() {
        let mut vars = ProblemVariables::new();
        let schema = VariableSchema::declare(&params(4, 0), Some(3), &mut vars);
        assert_eq!(schema.continuous_count(), 5 * 4 + 3 * 4);
        assert!(schema.angle(3, 2).is_some());
    }
}
