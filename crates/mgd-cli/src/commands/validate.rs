use anyhow::{Context, Result};
use mgd_cli::{ModelArgs, ScenarioArgs};

pub fn handle(input: &ScenarioArgs, model: &ModelArgs) -> Result<()> {
    let scenario = super::load(input, model)?;

    let mut diagnostics = scenario
        .params
        .validate()
        .with_context(|| format!("scenario '{}' is invalid", scenario.name))?;
    diagnostics.merge(
        scenario
            .options
            .validate(&scenario.params)
            .with_context(|| format!("model options for '{}' are invalid", scenario.name))?,
    );

    println!("Scenario '{}' is valid", scenario.name);
    println!("  {} hours, {} mode", scenario.params.hours(), scenario.params.mode);
    println!(
        "  {} generators, {} loads",
        scenario.params.generators.len(),
        scenario.params.loads.len()
    );
    if let Some(network) = scenario.params.network.as_ref() {
        println!("  {} buses, {} lines", network.bus_count, network.lines.len());
    }
    print!("{diagnostics}");
    Ok(())
}
