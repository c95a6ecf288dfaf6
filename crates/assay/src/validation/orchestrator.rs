//! Runs the configured rules in order and classifies every record.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::config::RuleConfig;
use crate::error::{Result, RuleError};
use crate::input::{RecordTable, ReferenceTables, Value};
use crate::rules::{Rule, RuleRegistry};

use super::classification::{
    Classification, COMPLIANCE_COLUMN, NOT_APPLICABLE, OUTCOME_PREFIX, REVIEW_COLUMN,
};
use super::diagnostic::{Diagnostic, DiagnosticKind};

/// How one configured rule fared in a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleReport {
    /// Configured rule name.
    pub rule: String,
    /// Outcome column written for it.
    pub column: String,
    pub passed: usize,
    pub failed: usize,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_rule_error"
    )]
    pub error: Option<RuleError>,
}

fn serialize_rule_error<S: Serializer>(
    error: &Option<RuleError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Everything the orchestrator produced besides the table columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub rules: Vec<RuleReport>,
    /// One entry per record; `None` when no rules were configured.
    pub classifications: Vec<Option<Classification>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationOutcome {
    pub fn count(&self, classification: Classification) -> usize {
        self.classifications
            .iter()
            .filter(|c| **c == Some(classification))
            .count()
    }

    pub fn unclassified(&self) -> usize {
        self.classifications.iter().filter(|c| c.is_none()).count()
    }

    /// Rules that could not be built or evaluated.
    pub fn failed_rules(&self) -> impl Iterator<Item = &RuleReport> {
        self.rules.iter().filter(|r| r.error.is_some())
    }
}

struct ConfiguredRule {
    name: String,
    column: String,
    rule: std::result::Result<Box<dyn Rule>, RuleError>,
}

/// Holds the resolved rule list of one analytic.
///
/// Rules are resolved once, when the orchestrator is built. A rule that
/// fails to resolve keeps its slot: every run writes an all-`false` column
/// for it and reports the error again.
pub struct ValidationOrchestrator {
    rules: Vec<ConfiguredRule>,
}

impl ValidationOrchestrator {
    pub fn new(registry: &RuleRegistry, configs: &[RuleConfig]) -> Self {
        let mut seen: IndexMap<&str, usize> = IndexMap::new();
        let rules = configs
            .iter()
            .map(|config| {
                let occurrence = seen.entry(config.rule_name.as_str()).or_insert(0);
                *occurrence += 1;
                let column = outcome_column(&config.rule_name, *occurrence);

                let rule = registry.resolve(config);
                if let Err(e) = &rule {
                    tracing::warn!(rule = %config.rule_name, error = %e, "rule failed to resolve");
                }
                ConfiguredRule {
                    name: config.rule_name.clone(),
                    column,
                    rule,
                }
            })
            .collect();

        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Outcome column names in rule order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.column.as_str())
    }

    /// Rules that could not be resolved from the registry.
    pub fn configuration_errors(&self) -> Vec<(&str, &RuleError)> {
        self.rules
            .iter()
            .filter_map(|r| r.rule.as_ref().err().map(|e| (r.name.as_str(), e)))
            .collect()
    }

    /// Evaluate every rule, write its outcome column, then the compliance
    /// and review columns.
    ///
    /// Existing columns with the same names are overwritten, so running
    /// twice on the same table gives the same result.
    pub fn run(
        &self,
        table: &mut RecordTable,
        references: &ReferenceTables,
    ) -> Result<ValidationOutcome> {
        let records = table.row_count();
        let mut diagnostics = Vec::new();
        let mut reports = Vec::with_capacity(self.rules.len());
        let mut outcomes: Vec<Vec<bool>> = Vec::with_capacity(self.rules.len());

        for configured in &self.rules {
            let evaluated = match &configured.rule {
                Ok(rule) => rule
                    .evaluate(table, references)
                    .and_then(|o| check_length(&configured.name, records, o)),
                Err(e) => Err(e.clone()),
            };

            let (column, error) = match evaluated {
                Ok(column) => (column, None),
                Err(e) => {
                    diagnostics.push(
                        Diagnostic::warning(DiagnosticKind::RuleConfiguration, e.to_string())
                            .with_rule(&configured.name)
                            .with_count(records),
                    );
                    (vec![false; records], Some(e))
                }
            };

            let passed = column.iter().filter(|p| **p).count();
            tracing::info!(
                rule = %configured.name,
                column = %configured.column,
                passed,
                failed = records - passed,
                "rule evaluated"
            );

            table.insert_column(
                configured.column.clone(),
                column.iter().map(|p| Value::Bool(*p)).collect(),
            )?;
            reports.push(RuleReport {
                rule: configured.name.clone(),
                column: configured.column.clone(),
                passed,
                failed: records - passed,
                error,
            });
            outcomes.push(column);
        }

        let classifications: Vec<Option<Classification>> = if outcomes.is_empty() {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::NoRules,
                    "No validation rules configured; records left unclassified",
                )
                .with_count(records),
            );
            vec![None; records]
        } else {
            (0..records)
                .map(|row| Some(Classification::from_outcomes(outcomes.iter().map(|o| o[row]))))
                .collect()
        };

        table.insert_column(
            COMPLIANCE_COLUMN,
            classifications
                .iter()
                .map(|c| Value::text(c.map_or(NOT_APPLICABLE, |c| c.code())))
                .collect(),
        )?;
        table.insert_column(
            REVIEW_COLUMN,
            classifications
                .iter()
                .map(|c| Value::text(c.map_or(NOT_APPLICABLE, |c| c.review_marker())))
                .collect(),
        )?;

        for diagnostic in &diagnostics {
            diagnostic.emit();
        }

        Ok(ValidationOutcome {
            rules: reports,
            classifications,
            diagnostics,
        })
    }
}

impl std::fmt::Debug for ValidationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationOrchestrator")
            .field("columns", &self.columns().collect::<Vec<_>>())
            .finish()
    }
}

/// `Valid_<rule>` for the first occurrence, `Valid_<rule>_<n>` after.
fn outcome_column(rule: &str, occurrence: usize) -> String {
    if occurrence <= 1 {
        format!("{}{}", OUTCOME_PREFIX, rule)
    } else {
        format!("{}{}_{}", OUTCOME_PREFIX, rule, occurrence)
    }
}

fn check_length(
    rule: &str,
    expected: usize,
    outcomes: Vec<bool>,
) -> std::result::Result<Vec<bool>, RuleError> {
    if outcomes.len() != expected {
        return Err(RuleError::OutcomeLength {
            rule: rule.to_string(),
            expected,
            actual: outcomes.len(),
        });
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleParameters;
    use crate::rules::test_support::table;

    struct ShortRule;

    impl Rule for ShortRule {
        fn evaluate(
            &self,
            _table: &RecordTable,
            _references: &ReferenceTables,
        ) -> std::result::Result<Vec<bool>, RuleError> {
            Ok(vec![true])
        }
    }

    fn build_short(_: &RuleParameters) -> std::result::Result<Box<dyn Rule>, RuleError> {
        Ok(Box::new(ShortRule))
    }

    fn segregation() -> RuleConfig {
        RuleConfig::new("segregation_of_duties")
            .with_parameter("submitter_field", "TW submitter")
            .with_parameter("approver_fields", serde_json::json!(["AL approver"]))
    }

    fn records() -> RecordTable {
        table(&[
            ("TW submitter", vec![Some("Alice"), Some("Alice"), Some("Bob")]),
            ("AL approver", vec![Some("Carol"), Some("alice"), None]),
        ])
    }

    #[test]
    fn test_classification_columns() {
        let orchestrator = ValidationOrchestrator::new(&RuleRegistry::builtin(), &[segregation()]);
        let mut t = records();
        let outcome = orchestrator.run(&mut t, &ReferenceTables::new()).unwrap();

        assert_eq!(
            t.column("Valid_segregation_of_duties").unwrap(),
            &[Value::Bool(true), Value::Bool(false), Value::Bool(true)]
        );
        assert_eq!(
            t.column(COMPLIANCE_COLUMN).unwrap(),
            &[Value::text("GC"), Value::text("DNC"), Value::text("GC")]
        );
        assert_eq!(
            t.column(REVIEW_COLUMN).unwrap(),
            &[Value::text("N/A"), Value::text("TBD"), Value::text("N/A")]
        );
        assert_eq!(outcome.rules[0].passed, 2);
        assert_eq!(outcome.rules[0].failed, 1);
        assert_eq!(outcome.count(Classification::DoesNotConform), 1);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_rule_fills_false_and_others_run() {
        let configs = vec![RuleConfig::new("unknown_rule_x"), segregation()];
        let orchestrator = ValidationOrchestrator::new(&RuleRegistry::builtin(), &configs);
        assert_eq!(orchestrator.configuration_errors().len(), 1);

        let mut t = records();
        let outcome = orchestrator.run(&mut t, &ReferenceTables::new()).unwrap();

        assert_eq!(
            t.column("Valid_unknown_rule_x").unwrap(),
            &[Value::Bool(false), Value::Bool(false), Value::Bool(false)]
        );
        assert!(t.has_column("Valid_segregation_of_duties"));
        assert_eq!(outcome.count(Classification::DoesNotConform), 3);
        assert_eq!(
            outcome.rules[0].error,
            Some(RuleError::UnknownRule("unknown_rule_x".to_string()))
        );
        assert_eq!(outcome.failed_rules().count(), 1);
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::RuleConfiguration);
    }

    #[test]
    fn test_empty_rule_list_is_unclassified() {
        let orchestrator = ValidationOrchestrator::new(&RuleRegistry::builtin(), &[]);
        let mut t = records();
        let outcome = orchestrator.run(&mut t, &ReferenceTables::new()).unwrap();

        assert_eq!(outcome.unclassified(), 3);
        assert_eq!(outcome.count(Classification::Conforms), 0);
        assert!(t
            .column(COMPLIANCE_COLUMN)
            .unwrap()
            .iter()
            .all(|v| *v == Value::text("N/A")));
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::NoRules);
    }

    #[test]
    fn test_duplicate_rule_names_get_distinct_columns() {
        let orchestrator =
            ValidationOrchestrator::new(&RuleRegistry::builtin(), &[segregation(), segregation()]);
        let columns: Vec<&str> = orchestrator.columns().collect();
        assert_eq!(
            columns,
            vec!["Valid_segregation_of_duties", "Valid_segregation_of_duties_2"]
        );
    }

    #[test]
    fn test_wrong_outcome_length_is_rule_error() {
        let mut registry = RuleRegistry::new();
        registry.register("short", build_short);
        let orchestrator = ValidationOrchestrator::new(&registry, &[RuleConfig::new("short")]);
        let mut t = records();
        let outcome = orchestrator.run(&mut t, &ReferenceTables::new()).unwrap();

        assert!(matches!(
            outcome.rules[0].error,
            Some(RuleError::OutcomeLength { expected: 3, actual: 1, .. })
        ));
        assert_eq!(outcome.count(Classification::DoesNotConform), 3);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let orchestrator = ValidationOrchestrator::new(&RuleRegistry::builtin(), &[segregation()]);
        let mut t = records();
        let first = orchestrator.run(&mut t, &ReferenceTables::new()).unwrap();
        let snapshot = t.clone();
        let second = orchestrator.run(&mut t, &ReferenceTables::new()).unwrap();

        assert_eq!(first, second);
        assert_eq!(snapshot, t);
    }
}
