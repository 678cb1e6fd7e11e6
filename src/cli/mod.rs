pub mod commands;
pub mod context;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Drive deploy scripts with per-environment, per-instance env vars and secrets.
#[derive(Parser, Debug)]
#[command(name = "stagehand", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the deploy file (default: ./stagehand.deploy.yaml)
    #[arg(long, global = true, env = "STAGEHAND_DEPLOY_FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode: only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the deploy file and resolve every instance
    Validate,

    /// Show the resolved deploy environment for the selected instances
    Plan {
        /// Environment to show (default: all environments)
        #[arg(long)]
        env: Option<String>,
        /// Instance within --env, or 'all'
        #[arg(long, requires = "env")]
        instance: Option<String>,
        /// Print the resolved plan as JSON
        #[arg(long)]
        json: bool,
    },
}
