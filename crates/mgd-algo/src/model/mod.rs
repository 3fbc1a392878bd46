//! Dispatch model assembly.
//!
//! [`DispatchModel::build`] turns a validated [`ParameterSet`] into a complete
//! MILP: decision variables ([`variables`]), the cost objective
//! ([`objective`]), battery and generator rows ([`constraints`]) and the
//! balance rows of the selected formulation ([`balance`]). Building does not
//! solve; hand the model to [`DispatchModel::solve`] or inspect it first.

pub mod balance;
pub mod constraints;
pub mod objective;
pub mod variables;

use crate::solution::DispatchSolution;
use crate::solver::MilpSolverKind;
use balance::{BalanceFormulation, LineLimitScope, NetworkBalance, SimpleBalance};
use constraints::{ConstraintKind, ConstraintSet};
use good_lp::{Expression, ProblemVariables};
use mgd_core::{BalanceMode, ConfigError, Diagnostics, MgdResult, ParameterSet, WarningKind};
use serde::Serialize;
use std::collections::BTreeMap;
use variables::VariableSchema;

/// Default Big-M for the charge/discharge exclusivity rows.
pub const DEFAULT_BIG_M: f64 = 1e6;

/// Big-M should exceed the battery rating by at least this factor.
const BIG_M_DOMINANCE: f64 = 1e3;

/// Build options that are not part of the physical input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelOptions {
    /// Constant in `charge ≤ M·u`, `discharge ≤ M·(1 − u)`
    pub big_m: f64,
    /// Which bus pairs get flow limits in network mode
    pub line_limits: LineLimitScope,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            big_m: DEFAULT_BIG_M,
            line_limits: LineLimitScope::Lines,
        }
    }
}

impl ModelOptions {
    pub fn with_big_m(mut self, big_m: f64) -> Self {
        self.big_m = big_m;
        self
    }

    pub fn with_line_limits(mut self, scope: LineLimitScope) -> Self {
        self.line_limits = scope;
        self
    }

    /// Check the options against `params`; returns Big-M dominance warnings.
    pub fn validate(&self, params: &ParameterSet) -> Result<Diagnostics, ConfigError> {
        if !self.big_m.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "model.big_m".into(),
            });
        }
        if self.big_m <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "model.big_m".into(),
                value: self.big_m,
                range: "(0, inf)",
            });
        }

        let mut diagnostics = Diagnostics::new();
        let rating = params.battery.max_power_mw;
        if self.big_m < BIG_M_DOMINANCE * rating {
            diagnostics.warn(
                WarningKind::Model,
                "big_m",
                format!(
                    "big_m {} is less than {}x the battery rating {} MW",
                    self.big_m, BIG_M_DOMINANCE, rating
                ),
            );
        }
        Ok(diagnostics)
    }
}

/// Size of a built model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStats {
    pub hours: usize,
    pub formulation: String,
    pub continuous_variables: usize,
    pub integer_variables: usize,
    pub constraints: usize,
    pub constraints_by_kind: BTreeMap<ConstraintKind, usize>,
}

impl ModelStats {
    pub fn total_variables(&self) -> usize {
        self.continuous_variables + self.integer_variables
    }
}

/// A fully assembled, not yet solved dispatch MILP.
pub struct DispatchModel {
    pub(crate) params: ParameterSet,
    pub(crate) variables: ProblemVariables,
    pub(crate) schema: VariableSchema,
    pub(crate) hourly_cost: Vec<Expression>,
    pub(crate) objective: Expression,
    pub(crate) constraints: ConstraintSet,
    pub(crate) formulation: Box<dyn BalanceFormulation>,
    pub(crate) stats: ModelStats,
    pub(crate) diagnostics: Diagnostics,
}

impl DispatchModel {
    /// Validate `params`, then declare variables, objective and constraints.
    ///
    /// Returns [`MgdError::Config`] for malformed input; nothing is built in
    /// that case. Building twice from the same input yields identical models.
    pub fn build(params: &ParameterSet, options: &ModelOptions) -> MgdResult<Self> {
        let mut diagnostics = params.validate()?;
        diagnostics.merge(options.validate(params)?);

        let formulation: Box<dyn BalanceFormulation> = match params.mode {
            BalanceMode::Simple => Box::new(SimpleBalance),
            BalanceMode::Network => {
                let topology = params.topology()?.ok_or(ConfigError::MissingNetwork)?;
                let network = params
                    .network
                    .clone()
                    .ok_or(ConfigError::MissingNetwork)?;
                Box::new(NetworkBalance::new(topology, network, options.line_limits))
            }
        };

        let mut variables = ProblemVariables::new();
        let schema = VariableSchema::declare(params, formulation.angle_buses(), &mut variables);
        let hourly_cost = objective::hourly_costs(params, &schema);
        let objective = objective::total_cost(&hourly_cost);
        let constraints = constraints::generate(params, &schema, formulation.as_ref(), options.big_m);

        let stats = ModelStats {
            hours: params.hours(),
            formulation: formulation.id().to_string(),
            continuous_variables: schema.continuous_count(),
            integer_variables: schema.integer_count(),
            constraints: constraints.len(),
            constraints_by_kind: constraints.counts_by_kind(),
        };

        tracing::debug!(
            formulation = %stats.formulation,
            hours = stats.hours,
            continuous = stats.continuous_variables,
            integer = stats.integer_variables,
            constraints = stats.constraints,
            "built dispatch model"
        );
        for warning in diagnostics.iter() {
            tracing::warn!("{}", warning);
        }

        Ok(Self {
            params: params.clone(),
            variables,
            schema,
            hourly_cost,
            objective,
            constraints,
            formulation,
            stats,
            diagnostics,
        })
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn schema(&self) -> &VariableSchema {
        &self.schema
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    pub fn stats(&self) -> &ModelStats {
        &self.stats
    }

    /// Warnings collected from the input and the build options.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn formulation_id(&self) -> &'static str {
        self.formulation.id()
    }

    /// Hand the model to a MILP backend.
    pub fn solve(self, solver: MilpSolverKind) -> MgdResult<DispatchSolution> {
        crate::solver::solve(self, solver)
    }
}
