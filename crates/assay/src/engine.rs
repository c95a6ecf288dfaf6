//! Main Engine struct and public API.

use serde::{Deserialize, Serialize};

use crate::config::{AnalyticConfig, RuleConfig};
use crate::error::{Result, RuleError};
use crate::input::{RecordTable, ReferenceTables};
use crate::rules::RuleRegistry;
use crate::schema::{ColumnSpec, NormalizationStats, RecordNormalizer, Resolution, SchemaResolver};
use crate::summary::{GroupOrder, Summary, SummaryAggregator};
use crate::validation::{
    Classification, Diagnostic, DiagnosticKind, RuleReport, ValidationOrchestrator,
    ValidationOutcome,
};

/// Everything the engine needs from an analytic definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fields every record table must carry, with their aliases.
    pub required_columns: Vec<ColumnSpec>,
    /// Rules in evaluation order.
    pub rules: Vec<RuleConfig>,
    /// Summary group-by field.
    pub group_by: String,
    /// Maximum acceptable non-conformance percentage.
    pub threshold_pct: f64,
    #[serde(default)]
    pub group_order: GroupOrder,
}

impl EngineConfig {
    pub fn new(group_by: impl Into<String>, threshold_pct: f64) -> Self {
        Self {
            required_columns: Vec::new(),
            rules: Vec::new(),
            group_by: group_by.into(),
            threshold_pct,
            group_order: GroupOrder::default(),
        }
    }

    pub fn with_column(mut self, spec: ColumnSpec) -> Self {
        self.required_columns.push(spec);
        self
    }

    pub fn with_rule(mut self, rule: RuleConfig) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_group_order(mut self, order: GroupOrder) -> Self {
        self.group_order = order;
        self
    }
}

impl From<&AnalyticConfig> for EngineConfig {
    fn from(config: &AnalyticConfig) -> Self {
        Self {
            required_columns: config.source.required_columns.clone(),
            rules: config.validations.clone(),
            group_by: config.reporting.group_by.clone(),
            threshold_pct: config.thresholds.error_percentage,
            group_order: config.reporting.group_order,
        }
    }
}

/// Classification counts over the whole table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceTotals {
    pub records: usize,
    pub conforms: usize,
    pub partial: usize,
    pub nonconforming: usize,
    pub unclassified: usize,
}

impl ComplianceTotals {
    fn from_classifications(classifications: &[Option<Classification>]) -> Self {
        let mut totals = ComplianceTotals {
            records: classifications.len(),
            ..Default::default()
        };
        for classification in classifications {
            match classification {
                Some(Classification::Conforms) => totals.conforms += 1,
                Some(Classification::PartiallyConforms) => totals.partial += 1,
                Some(Classification::DoesNotConform) => totals.nonconforming += 1,
                None => totals.unclassified += 1,
            }
        }
        totals
    }
}

/// Result of one engine run.
#[derive(Debug)]
pub struct RunReport {
    /// The classified table: normalized input plus outcome, compliance and
    /// review columns.
    pub table: RecordTable,
    pub resolution: Resolution,
    pub normalization: NormalizationStats,
    pub rules: Vec<RuleReport>,
    /// Fails on its own without affecting the classified table.
    pub summary: Result<Summary>,
    pub totals: ComplianceTotals,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    /// Rules that could not be built or evaluated.
    pub fn rule_errors(&self) -> impl Iterator<Item = (&str, &RuleError)> {
        self.rules
            .iter()
            .filter_map(|r| r.error.as_ref().map(|e| (r.rule.as_str(), e)))
    }
}

/// The compliance validation engine.
///
/// Built once per analytic; rules are resolved at construction and the
/// engine can then run any number of tables. Runs share no mutable state.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    orchestrator: ValidationOrchestrator,
}

impl Engine {
    /// Create an engine using the built-in rules.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, &RuleRegistry::builtin())
    }

    /// Create an engine resolving rules from `registry`.
    pub fn with_registry(config: EngineConfig, registry: &RuleRegistry) -> Self {
        let orchestrator = ValidationOrchestrator::new(registry, &config.rules);
        Self {
            config,
            orchestrator,
        }
    }

    pub fn from_analytic(config: &AnalyticConfig) -> Self {
        Self::new(EngineConfig::from(config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rules that failed to resolve; each will fill an all-`false` column.
    pub fn configuration_errors(&self) -> Vec<(&str, &RuleError)> {
        self.orchestrator.configuration_errors()
    }

    /// Resolve column aliases, then normalize the table.
    ///
    /// Fails with [`AssayError::MissingFields`](crate::AssayError::MissingFields) when a required field is
    /// still absent after resolution.
    pub fn prepare(&self, table: &mut RecordTable) -> Result<(Resolution, NormalizationStats)> {
        let resolution = SchemaResolver::new(&self.config.required_columns)
            .resolve(table)
            .inspect_err(|e| tracing::error!(error = %e, "schema resolution failed"))?;
        let normalization = RecordNormalizer::new(&self.config.required_columns).normalize(table);
        Ok((resolution, normalization))
    }

    /// Run the rules and classify a prepared table.
    pub fn evaluate(
        &self,
        table: &mut RecordTable,
        references: &ReferenceTables,
    ) -> Result<ValidationOutcome> {
        self.orchestrator.run(table, references)
    }

    /// Summarize a classified table.
    pub fn summarize(&self, table: &RecordTable) -> Result<Summary> {
        SummaryAggregator::new(&self.config.group_by, self.config.threshold_pct)
            .with_order(self.config.group_order)
            .aggregate(table)
    }

    /// Resolve, normalize, validate, classify and summarize.
    ///
    /// A schema failure returns `Err` and no table. A summary failure is
    /// carried in [`RunReport::summary`] next to the classified table.
    pub fn run(&self, mut table: RecordTable, references: &ReferenceTables) -> Result<RunReport> {
        tracing::info!(
            records = table.row_count(),
            columns = table.column_count(),
            rules = self.orchestrator.len(),
            "engine run started"
        );
        let mut diagnostics = Vec::new();

        let (resolution, normalization) = self.prepare(&mut table)?;
        for (from, to) in &resolution.renamed {
            diagnostics.push(
                Diagnostic::info(
                    DiagnosticKind::ColumnRenamed,
                    format!("Renamed column '{}' to '{}'", from, to),
                )
                .with_field(to),
            );
        }
        for (field, count) in &normalization.unparseable_dates {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::UnparseableDates,
                    format!("{} value(s) in '{}' are not dates; treated as absent", count, field),
                )
                .with_field(field)
                .with_count(*count),
            );
        }
        for diagnostic in &diagnostics {
            diagnostic.emit();
        }

        let outcome = self.evaluate(&mut table, references)?;
        let totals = ComplianceTotals::from_classifications(&outcome.classifications);
        diagnostics.extend(outcome.diagnostics);

        let summary = self.summarize(&table);
        match &summary {
            Ok(summary) if summary.ungrouped > 0 => {
                let diagnostic = Diagnostic::warning(
                    DiagnosticKind::UngroupedRecords,
                    format!(
                        "{} record(s) have no '{}' value and are not in the summary",
                        summary.ungrouped, summary.group_by
                    ),
                )
                .with_field(&summary.group_by)
                .with_count(summary.ungrouped);
                diagnostic.emit();
                diagnostics.push(diagnostic);
            }
            Ok(_) => {}
            Err(e) => {
                let diagnostic = Diagnostic::error(DiagnosticKind::Summary, e.to_string())
                    .with_field(&self.config.group_by);
                diagnostic.emit();
                diagnostics.push(diagnostic);
            }
        }

        tracing::info!(
            conforms = totals.conforms,
            nonconforming = totals.nonconforming,
            unclassified = totals.unclassified,
            "engine run finished"
        );

        Ok(RunReport {
            table,
            resolution,
            normalization,
            rules: outcome.rules,
            summary,
            totals,
            diagnostics,
        })
    }
}
