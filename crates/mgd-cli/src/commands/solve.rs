use anyhow::{Context, Result};
use mgd_algo::verify::{self, DEFAULT_TOLERANCE};
use mgd_algo::{DispatchModel, MilpSolverKind};
use mgd_cli::SolveArgs;
use mgd_io::{export_all, report, RunSummary};
use std::io::{self, Write};
use tracing::{info, warn};

pub fn handle(args: &SolveArgs) -> Result<()> {
    let scenario = super::load(&args.input, &args.model)?;
    let solver: MilpSolverKind = args.solver.parse()?;

    info!(
        scenario = %scenario.name,
        mode = %scenario.params.mode,
        solver = %solver,
        "solving dispatch"
    );

    let model = DispatchModel::build(&scenario.params, &scenario.options)
        .with_context(|| format!("building dispatch model for '{}'", scenario.name))?;
    let diagnostics = model.diagnostics().clone();
    let solution = model
        .solve(solver)
        .with_context(|| format!("solving '{}' with {}", scenario.name, solver))?;

    let residuals = verify::check(&scenario.params, &solution)?;
    for (check, residual) in residuals.violations(DEFAULT_TOLERANCE) {
        warn!(check, residual, "solution violates a model property beyond tolerance");
    }

    let summary = RunSummary::new(&scenario.name, &solution, &diagnostics).with_residuals(&residuals);

    let stdout = io::stdout();
    if args.json {
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, &summary).context("serializing run summary to JSON")?;
        writeln!(out)?;
    } else {
        report::write_dispatch_table(&solution, stdout.lock())?;
    }

    if args.no_export {
        return Ok(());
    }

    let files = export_all(&args.out, &solution, &summary)
        .with_context(|| format!("exporting results to {}", args.out.display()))?;
    for path in files.paths() {
        info!(path = %path.display(), "wrote");
    }
    if !args.json {
        println!();
        println!("Results written to {}", args.out.display());
    }
    Ok(())
}
