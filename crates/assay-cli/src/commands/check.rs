//! Check command - validate an analytic definition and resolve its rules.

use std::path::PathBuf;

use colored::Colorize;

use assay::{AnalyticConfig, Engine};

pub fn run(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = AnalyticConfig::load(&config_path)?;
    let engine = Engine::from_analytic(&config);

    println!(
        "{} QA-{} {}",
        "Checked".cyan().bold(),
        config.analytic_id,
        config.analytic_name.white()
    );
    println!(
        "  {} required columns, {} reference files, {} rules, group by '{}', threshold {}%",
        config.source.required_columns.len(),
        config.reference_files.len(),
        config.validations.len(),
        config.reporting.group_by,
        config.thresholds.error_percentage
    );

    let errors = engine.configuration_errors();
    for (index, rule) in config.validations.iter().enumerate() {
        let error = errors
            .iter()
            .find(|(name, _)| *name == rule.rule_name)
            .map(|(_, e)| e);
        match error {
            Some(e) => println!(
                "  {} {:>2}. {} {}",
                "✗".red(),
                index + 1,
                rule.rule_name,
                e.to_string().red()
            ),
            None => println!("  {} {:>2}. {}", "✓".green(), index + 1, rule.rule_name),
        }
    }

    if config.validations.is_empty() {
        println!(
            "  {} no rules configured; every record will be unclassified",
            "!".yellow().bold()
        );
    }

    if !errors.is_empty() {
        return Err(format!("{} rule(s) cannot be resolved", errors.len()).into());
    }

    Ok(())
}
