use clap::Parser;
use mgd_cli::{Cli, Commands};
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Solve(args) => commands::solve::handle(args),
        Commands::Inspect { input, model, json } => commands::inspect::handle(input, model, *json),
        Commands::Validate { input, model } => commands::validate::handle(input, model),
        Commands::Presets => commands::list_presets(),
    }
}

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {err}");
    }

    if let Err(err) = run(&cli) {
        error!("{err:#}");
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
