use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mgd", author, version, about = "Day-ahead microgrid economic dispatch", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and solve the dispatch model, then export the schedule
    Solve(SolveArgs),
    /// Print the inputs and model size without solving
    Inspect {
        #[command(flatten)]
        input: ScenarioArgs,
        #[command(flatten)]
        model: ModelArgs,
        /// Emit model statistics as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Check a scenario and list its diagnostics
    Validate {
        #[command(flatten)]
        input: ScenarioArgs,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// List the built-in scenarios
    Presets,
}

#[derive(Args, Debug)]
pub struct SolveArgs {
    #[command(flatten)]
    pub input: ScenarioArgs,
    #[command(flatten)]
    pub model: ModelArgs,
    /// MILP backend (microlp, highs)
    #[arg(long, default_value = "microlp")]
    pub solver: String,
    /// Output directory for results.csv, summary.json and network tables
    #[arg(short, long, default_value = "out", value_hint = ValueHint::DirPath)]
    pub out: PathBuf,
    /// Skip writing output files
    #[arg(long)]
    pub no_export: bool,
    /// Print the run summary as JSON instead of the dispatch table
    #[arg(long)]
    pub json: bool,
}

/// Where the scenario comes from. Without either, the `default` preset is used.
#[derive(Args, Debug, Clone, Default)]
pub struct ScenarioArgs {
    /// Scenario TOML file
    #[arg(value_hint = ValueHint::FilePath, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,
    /// Built-in scenario name (see `mgd presets`)
    #[arg(long)]
    pub preset: Option<String>,
}

/// Overrides applied on top of the scenario file.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Balance buses with DC power flow (needs a [network] section)
    #[arg(long, conflicts_with = "no_network")]
    pub network: bool,
    /// Use the single system-wide balance even if the file enables the network
    #[arg(long)]
    pub no_network: bool,
    /// Which bus pairs get flow limits (lines, all-pairs)
    #[arg(long)]
    pub line_limits: Option<String>,
    /// Big-M constant for the charge/discharge exclusion rows
    #[arg(long)]
    pub big_m: Option<f64>,
}
