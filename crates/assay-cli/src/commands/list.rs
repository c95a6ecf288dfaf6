//! List command - show available analytics and rules.

use std::path::PathBuf;

use colored::Colorize;

use assay::{ConfigCatalog, RuleKind};

pub fn run(config_dir: PathBuf, show_rules: bool) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = ConfigCatalog::load_dir(&config_dir)?;

    println!(
        "{} in {}",
        "Analytics".cyan().bold(),
        config_dir.display().to_string().white()
    );
    if catalog.is_empty() {
        println!("  (none)");
    }
    for (id, name) in catalog.available() {
        println!("  QA-{:8} {}", id.white().bold(), name);
    }

    for (path, error) in catalog.failures() {
        println!(
            "  {} {}: {}",
            "✗".red(),
            path.display(),
            error.red()
        );
    }

    if show_rules {
        println!();
        println!("{}", "Rules".cyan().bold());
        for kind in RuleKind::ALL {
            println!("  {:30} {}", kind.name().white().bold(), kind.description());
        }
    }

    Ok(())
}
