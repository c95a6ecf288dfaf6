//! Assay CLI - configurable compliance validation.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            input,
            references,
            output_dir,
            json,
        } => commands::run::run(config, input, references, output_dir, json),

        Commands::Check { config } => commands::check::run(config),

        Commands::List { config_dir, rules } => commands::list::run(config_dir, rules),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
