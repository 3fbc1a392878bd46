use anyhow::{Context, Result};
use mgd_algo::{DispatchModel, ModelOptions, ModelStats};
use mgd_cli::{ModelArgs, ScenarioArgs};
use mgd_core::{BalanceMode, Diagnostics};
use mgd_io::report;
use serde::Serialize;
use std::io::{self, Write};

/// JSON output of `mgd inspect --json`
#[derive(Debug, Serialize)]
struct InspectOutput<'a> {
    scenario: &'a str,
    mode: BalanceMode,
    options: &'a ModelOptions,
    stats: &'a ModelStats,
    diagnostics: &'a Diagnostics,
}

pub fn handle(input: &ScenarioArgs, model_args: &ModelArgs, json: bool) -> Result<()> {
    let scenario = super::load(input, model_args)?;
    let model = DispatchModel::build(&scenario.params, &scenario.options)
        .with_context(|| format!("building dispatch model for '{}'", scenario.name))?;

    let mut out = io::stdout().lock();
    if json {
        let output = InspectOutput {
            scenario: &scenario.name,
            mode: scenario.params.mode,
            options: &scenario.options,
            stats: model.stats(),
            diagnostics: model.diagnostics(),
        };
        serde_json::to_writer_pretty(&mut out, &output).context("serializing model statistics to JSON")?;
        writeln!(out)?;
        return Ok(());
    }

    report::write_input_report(&scenario.params, &mut out)?;
    writeln!(out)?;
    writeln!(out, "=== Model ===")?;
    report::write_model_stats(model.stats(), &mut out)?;
    if !model.diagnostics().is_empty() {
        writeln!(out)?;
        write!(out, "{}", model.diagnostics())?;
    }
    Ok(())
}
