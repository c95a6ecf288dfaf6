//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Assay: configurable compliance validation for audit records
#[derive(Parser)]
#[command(name = "assay")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a record file against an analytic and write the results
    Run {
        /// Analytic definition (YAML or JSON)
        #[arg(short, long, value_name = "CONFIG")]
        config: PathBuf,

        /// Record file (CSV/TSV)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Reference table override, NAME=PATH (repeatable)
        #[arg(short, long = "reference", value_name = "NAME=PATH", value_parser = parse_reference)]
        references: Vec<(String, PathBuf)>,

        /// Directory for the detail and summary CSV files
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Print the run report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate an analytic definition and resolve its rules
    Check {
        /// Analytic definition (YAML or JSON)
        #[arg(short, long, value_name = "CONFIG")]
        config: PathBuf,
    },

    /// List the analytics in a configuration directory
    List {
        /// Directory of analytic definitions
        #[arg(long, default_value = "configs")]
        config_dir: PathBuf,

        /// Also list the built-in rules
        #[arg(long)]
        rules: bool,
    },
}

fn parse_reference(raw: &str) -> Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
            Ok((name.trim().to_string(), PathBuf::from(path.trim())))
        }
        _ => Err(format!("expected NAME=PATH, got '{}'", raw)),
    }
}
