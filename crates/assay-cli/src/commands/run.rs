//! Run command - validate a record file and write detail and summary files.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use colored::Colorize;

use assay::input::write_csv;
use assay::{AnalyticConfig, Engine, Parser, ReferenceTables, RunReport, Severity};

pub fn run(
    config_path: PathBuf,
    input: PathBuf,
    overrides: Vec<(String, PathBuf)>,
    output_dir: PathBuf,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("File not found: {}", input.display()).into());
    }

    let config = AnalyticConfig::load(&config_path)?;
    let engine = Engine::from_analytic(&config);

    if !json_output {
        println!(
            "{} QA-{} {} on {}",
            "Running".cyan().bold(),
            config.analytic_id,
            config.analytic_name.white(),
            input.display().to_string().white()
        );
    }

    let parser = Parser::new();
    let (records, source) = parser.parse_file(&input)?;
    tracing::info!(
        file = %source.file,
        hash = %source.hash,
        rows = source.row_count,
        "records loaded"
    );

    let references = load_references(&parser, &config, &config_path, &overrides)?;
    let report = engine.run(records, &references)?;

    fs::create_dir_all(&output_dir)?;
    let detail_path = output_dir.join(format!("QA_{}_detail.csv", config.analytic_id));
    write_csv(&report.table, BufWriter::new(File::create(&detail_path)?))?;

    let summary_path = match &report.summary {
        Ok(summary) => {
            let path = output_dir.join(format!("QA_{}_summary.csv", config.analytic_id));
            write_csv(&summary.to_table(), BufWriter::new(File::create(&path)?))?;
            Some(path)
        }
        Err(_) => None,
    };

    if json_output {
        print_json(&config, &report)?;
    } else {
        print_text(&report, &detail_path, summary_path.as_deref());
    }

    Ok(())
}

/// Load the configured reference tables, applying `NAME=PATH` overrides.
///
/// Relative paths that do not exist as given are tried next to the config
/// file. A table that cannot be loaded is skipped; rules that need it report
/// the missing reference.
fn load_references(
    parser: &Parser,
    config: &AnalyticConfig,
    config_path: &Path,
    overrides: &[(String, PathBuf)],
) -> Result<ReferenceTables, Box<dyn std::error::Error>> {
    let mut references = ReferenceTables::new();
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));

    for source in &config.reference_files {
        let path = overrides
            .iter()
            .find(|(name, _)| *name == source.name)
            .map(|(_, path)| path.clone())
            .unwrap_or_else(|| locate(base, Path::new(&source.path)));

        match parser.load_reference(&path, &source.key_column, &source.value_column) {
            Ok(table) => {
                tracing::info!(name = %source.name, entries = table.len(), "reference loaded");
                references.insert(source.name.clone(), table);
            }
            Err(e) => {
                tracing::warn!(name = %source.name, path = %path.display(), error = %e, "reference not loaded");
            }
        }
    }

    for (name, path) in overrides {
        if config.reference_files.iter().any(|r| r.name == *name) {
            continue;
        }
        return Err(format!(
            "Reference '{}' ({}) is not declared in the analytic",
            name,
            path.display()
        )
        .into());
    }

    Ok(references)
}

fn locate(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn print_json(
    config: &AnalyticConfig,
    report: &RunReport,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = serde_json::json!({
        "analytic_id": config.analytic_id,
        "analytic_name": config.analytic_name,
        "totals": report.totals,
        "rules": report.rules,
        "resolution": report.resolution,
        "normalization": report.normalization,
        "summary": report.summary.as_ref().ok(),
        "summary_error": report.summary.as_ref().err().map(|e| e.to_string()),
        "diagnostics": report.diagnostics,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text(report: &RunReport, detail_path: &Path, summary_path: Option<&Path>) {
    let totals = &report.totals;
    println!();
    println!(
        "Classified {} records: {} GC, {} PC, {} DNC",
        totals.records.to_string().white().bold(),
        totals.conforms.to_string().green(),
        totals.partial.to_string().yellow(),
        totals.nonconforming.to_string().red()
    );
    if totals.unclassified > 0 {
        println!(
            "{} {} records unclassified (no rules configured)",
            "!".yellow().bold(),
            totals.unclassified
        );
    }

    println!();
    println!("{}", "Rules:".yellow().bold());
    for rule in &report.rules {
        match &rule.error {
            Some(e) => println!("  {} {:35} {}", "✗".red(), rule.column, e.to_string().red()),
            None => println!(
                "  {} {:35} {} passed, {} failed",
                "✓".green(),
                rule.column,
                rule.passed,
                rule.failed
            ),
        }
    }

    match &report.summary {
        Ok(summary) => {
            println!();
            println!(
                "{} (threshold {}%)",
                format!("Summary by {}:", summary.group_by).yellow().bold(),
                summary.threshold_pct
            );
            for row in &summary.rows {
                let line = format!(
                    "  {:25} {:>4} GC {:>4} PC {:>4} DNC {:>5} total {:>7.2}%",
                    row.group_key,
                    row.conforms,
                    row.partial,
                    row.nonconforming,
                    row.total,
                    row.nonconforming_pct
                );
                if row.exceeds_threshold {
                    println!("{} {}", line.red(), "exceeds threshold".red().bold());
                } else {
                    println!("{}", line);
                }
            }
        }
        Err(e) => {
            println!();
            println!("{} {}", "Summary failed:".red().bold(), e);
        }
    }

    let warnings: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.severity >= Severity::Warning)
        .collect();
    if !warnings.is_empty() {
        println!();
        println!("{}", "Diagnostics:".yellow().bold());
        for diagnostic in warnings {
            println!("  {}", diagnostic);
        }
    }

    println!();
    println!("Detail:  {}", detail_path.display().to_string().cyan());
    if let Some(path) = summary_path {
        println!("Summary: {}", path.display().to_string().cyan());
    }
}
