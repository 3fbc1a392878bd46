use anyhow::{bail, Context, Result};
use mgd_algo::LineLimitScope;
use mgd_cli::{ModelArgs, ScenarioArgs};
use mgd_core::BalanceMode;
use mgd_io::scenario::{self, Scenario, PRESETS};
use std::io::{self, Write};
use tracing::debug;

pub mod inspect;
pub mod solve;
pub mod validate;

/// Load the scenario named on the command line and apply model overrides.
pub fn load(input: &ScenarioArgs, model: &ModelArgs) -> Result<Scenario> {
    let mut scenario = match (&input.scenario, &input.preset) {
        (Some(path), _) => scenario::load_scenario(path)?,
        (None, Some(name)) => scenario::preset(name)?,
        (None, None) => scenario::preset("default")?,
    };
    apply_overrides(&mut scenario, model)?;
    debug!(
        scenario = %scenario.name,
        hours = scenario.params.hours(),
        mode = %scenario.params.mode,
        "loaded scenario"
    );
    Ok(scenario)
}

fn apply_overrides(scenario: &mut Scenario, model: &ModelArgs) -> Result<()> {
    if model.network {
        if scenario.params.network.is_none() {
            bail!(
                "--network given but scenario '{}' has no [network] section",
                scenario.name
            );
        }
        scenario.params.mode = BalanceMode::Network;
    }
    if model.no_network {
        scenario.params.mode = BalanceMode::Simple;
    }
    if let Some(scope) = &model.line_limits {
        let scope: LineLimitScope = scope
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("parsing --line-limits")?;
        scenario.options = scenario.options.with_line_limits(scope);
    }
    if let Some(big_m) = model.big_m {
        scenario.options = scenario.options.with_big_m(big_m);
    }
    Ok(())
}

pub fn list_presets() -> Result<()> {
    let mut out = io::stdout().lock();
    for name in PRESETS {
        let preset = scenario::preset(name)?;
        let description = preset.description.as_deref().unwrap_or("");
        writeln!(out, "{name:<16} {description}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_the_24h_preset() {
        let scenario = load(&ScenarioArgs::default(), &ModelArgs::default()).unwrap();
        assert_eq!(scenario.params.hours(), 24);
        assert_eq!(scenario.params.mode, BalanceMode::Simple);
    }

    #[test]
    fn network_flag_needs_a_network_section() {
        let model = ModelArgs {
            network: true,
            ..ModelArgs::default()
        };
        let err = load(&ScenarioArgs::default(), &model).unwrap_err();
        assert!(err.to_string().contains("[network]"));
    }

    #[test]
    fn overrides_reach_the_model_options() {
        let input = ScenarioArgs {
            scenario: None,
            preset: Some("microgrid-3bus".into()),
        };
        let model = ModelArgs {
            no_network: true,
            line_limits: Some("all-pairs".into()),
            big_m: Some(5e5),
            ..ModelArgs::default()
        };
        let scenario = load(&input, &model).unwrap();
        assert_eq!(scenario.params.mode, BalanceMode::Simple);
        assert_eq!(scenario.options.line_limits, LineLimitScope::AllBusPairs);
        assert_eq!(scenario.options.big_m, 5e5);
    }

    #[test]
    fn bad_line_limit_scope_is_reported() {
        let model = ModelArgs {
            line_limits: Some("everywhere".into()),
            ..ModelArgs::default()
        };
        let err = load(&ScenarioArgs::default(), &model).unwrap_err();
        assert!(format!("{err:#}").contains("--line-limits"));
    }
}
