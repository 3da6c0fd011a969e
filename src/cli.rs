use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "modvar")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative registry-module test variables", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: $MODVAR_CONFIG_DIR/modvar.toml)
    #[arg(long, global = true, env = "MODVAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// State file (default: $MODVAR_STATE_DIR/state.toml)
    #[arg(long, global = true, env = "MODVAR_STATE")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check every declared variable without contacting the service
    Validate,

    /// Show what apply would change
    Plan(TargetArgs),

    /// Create, update, replace or delete variables to match the config
    Apply(ApplyArgs),

    /// Delete variables recorded in state
    Destroy(DestroyArgs),

    /// Re-read recorded variables from the service
    Refresh(RefreshArgs),

    /// Show recorded state
    Show(TargetArgs),

    /// Print the attribute contract of tfe_test_variable
    Schema,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct TargetArgs {
    /// Instance to operate on: <name> or tfe_test_variable.<name>
    pub target: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Instance to operate on: <name> or tfe_test_variable.<name>
    pub target: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Show the plan without making changes
    #[arg(long)]
    pub dry_run: bool,

    /// Number of parallel operations
    #[arg(short, long, default_value = "4")]
    pub jobs: u16,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Instance to operate on: <name> or tfe_test_variable.<name>
    pub target: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of parallel operations
    #[arg(short, long, default_value = "4")]
    pub jobs: u16,
}

#[derive(Args)]
pub struct RefreshArgs {
    /// Instance to operate on: <name> or tfe_test_variable.<name>
    pub target: Option<String>,

    /// Number of parallel reads
    #[arg(short, long, default_value = "4")]
    pub jobs: u16,
}
