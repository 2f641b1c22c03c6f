use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::config::CONFIG_ENV;

#[derive(Parser)]
#[command(name = "onboard")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative macOS onboarding", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Declaration file (default: ~/.config/onboard/onboard.toml)
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reconcile the host with the declaration file
    Run(RunArgs),

    /// Probe the host and show what a run would change
    Plan(TargetArgs),

    /// Show the declaration table
    List(TargetArgs),

    /// Validate the declaration file
    Check,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Probe only; report what would change without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Apply changes but skip disruptive actions (Dock/Finder restarts)
    #[arg(long)]
    pub tame: bool,

    /// Only reconcile matching declarations (packages, defaults, hotkeys, shortcuts, manual, defaults.dock)
    #[arg(long)]
    pub only: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Ask before a live run
    #[arg(long)]
    pub confirm: bool,
}

#[derive(Args)]
pub struct TargetArgs {
    /// Only include matching declarations (packages, defaults, hotkeys, shortcuts, manual, defaults.dock)
    #[arg(long)]
    pub only: Option<String>,
}
