pub mod cli;

pub use cli::{Cli, Commands, ModelArgs, ScenarioArgs, SolveArgs};
