mod adapters;
mod cli;
mod config;
mod core;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let args = Cli::parse();
    cli::context::init(args.verbose, args.quiet);

    let config = args.config.as_deref();

    let result = match &args.command {
        Commands::Validate => cli::commands::validate::execute(config),
        Commands::Plan {
            env,
            instance,
            json,
        } => cli::commands::plan::execute(config, env.as_deref(), instance.as_deref(), *json),
    };

    if let Err(e) = result {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}
