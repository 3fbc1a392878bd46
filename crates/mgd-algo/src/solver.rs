//! MILP backend selection and the solve call.

use crate::model::constraints::ConstraintSet;
use crate::model::DispatchModel;
use crate::solution::{DispatchSolution, SolveContext};
use anyhow::anyhow;
use good_lp::solvers::microlp::microlp;
use good_lp::{ResolutionError, SolverModel};
use mgd_core::{MgdError, MgdResult};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// MILP backends compiled into this build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MilpSolverKind {
    /// Pure-Rust branch and bound (always available)
    #[default]
    Microlp,
    #[cfg(feature = "solver-highs")]
    Highs,
}

impl MilpSolverKind {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_MILP_SOLVERS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MilpSolverKind::Microlp => "microlp",
            #[cfg(feature = "solver-highs")]
            MilpSolverKind::Highs => "highs",
        }
    }
}

const AVAILABLE_MILP_SOLVERS: &[&str] = &[
    "microlp",
    #[cfg(feature = "solver-highs")]
    "highs",
];

fn unknown_solver_error(label: &str) -> anyhow::Error {
    anyhow!(
        "unknown milp solver '{}'; supported values: {}",
        label,
        MilpSolverKind::available().join(", ")
    )
}

impl FromStr for MilpSolverKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase();
        match normalized.as_str() {
            "microlp" => Ok(MilpSolverKind::Microlp),
            "highs" => {
                #[cfg(feature = "solver-highs")]
                {
                    Ok(MilpSolverKind::Highs)
                }
                #[cfg(not(feature = "solver-highs"))]
                {
                    Err(anyhow!(
                        "milp solver 'highs' requires building with the `solver-highs` feature"
                    ))
                }
            }
            _ => Err(unknown_solver_error(&normalized)),
        }
    }
}

impl fmt::Display for MilpSolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MilpSolverKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Map a backend verdict onto the crate error taxonomy.
fn map_resolution_error(err: ResolutionError) -> MgdError {
    match err {
        ResolutionError::Infeasible => MgdError::Infeasible(
            "no dispatch satisfies all balance, storage, generator and network constraints".into(),
        ),
        ResolutionError::Unbounded => MgdError::Unbounded(
            "cost can be driven to -inf; check that the sell price does not exceed the buy price"
                .into(),
        ),
        other => MgdError::Solver(other.to_string()),
    }
}

fn run<M>(mut lp: M, rows: ConstraintSet, ctx: SolveContext) -> MgdResult<DispatchSolution>
where
    M: SolverModel<Error = ResolutionError>,
{
    for row in rows.into_constraints() {
        lp = lp.with(row);
    }
    let solution = lp.solve().map_err(map_resolution_error)?;
    Ok(ctx.extract(&solution))
}

/// Solve `model` with the chosen backend and read back every variable.
pub(crate) fn solve(model: DispatchModel, kind: MilpSolverKind) -> MgdResult<DispatchSolution> {
    let DispatchModel {
        params,
        variables,
        schema,
        hourly_cost,
        objective,
        constraints,
        formulation,
        stats,
        ..
    } = model;

    tracing::debug!(
        backend = kind.as_str(),
        rows = constraints.len(),
        "solving dispatch model"
    );

    let start = Instant::now();
    let problem = variables.minimise(objective.clone());
    let ctx = SolveContext {
        params,
        schema,
        hourly_cost,
        objective,
        flow_pairs: formulation.flow_pairs(),
        backend: kind,
        stats,
        start,
    };

    let result = match kind {
        MilpSolverKind::Microlp => run(problem.using(microlp), constraints, ctx),
        #[cfg(feature = "solver-highs")]
        MilpSolverKind::Highs => run(
            problem.using(good_lp::solvers::highs::highs),
            constraints,
            ctx,
        ),
    };

    match &result {
        Ok(solution) => {
            tracing::info!(
                backend = kind.as_str(),
                objective = solution.objective,
                solve_time_ms = solution.solve_time_ms,
                "dispatch solved"
            );
            for hour in solution.simultaneous_trade_hours(1e-6) {
                tracing::warn!(hour, "grid buy and sell are both non-zero");
            }
        }
        Err(err) => tracing::warn!(backend = kind.as_str(), "solve failed: {}", err),
    }

    result
}
