//! Integration tests for the Assay engine.
//!
//! These tests drive the full pipeline from delimited files on disk through
//! classification and summary, the way the CLI does.

use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use assay::input::write_csv;
use assay::summary::{EXCEEDS_COLUMN, PERCENTAGE_COLUMN};
use assay::validation::{COMPLIANCE_COLUMN, REVIEW_COLUMN};
use assay::{
    AnalyticConfig, AssayError, Classification, ColumnSpec, ConfigCatalog, DiagnosticKind,
    Engine, EngineConfig, Parser, RuleConfig, RuleError, ReferenceTables, Value,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

const WORKPAPER_CONFIG: &str = r#"
analytic_id: 77
analytic_name: Audit Test Workpaper Approvals
source:
  required_columns:
    - name: Audit TW ID
      alias: [TW_ID]
    - name: TW submitter
      alias: [Submitter]
    - name: TL approver
    - name: AL approver
    - name: Submit Date
    - name: TL Approval Date
    - name: AL Approval Date
reference_files:
  - name: HR_Titles
    path: hr_titles.csv
    key_column: Employee_Name
    value_column: Title
validations:
  - rule: segregation_of_duties
    parameters:
      submitter_field: TW submitter
      approver_fields: [TL approver, AL approver]
  - rule: approval_sequence
    parameters:
      date_fields_in_order: [Submit Date, TL Approval Date, AL Approval Date]
  - rule: title_based_approval
    parameters:
      approver_field: AL approver
      allowed_titles: [Audit Leader, Audit Manager]
      title_reference: HR_Titles
thresholds:
  error_percentage: 5.0
reporting:
  group_by: AL approver
"#;

const WORKPAPERS: &str = "TW_ID,Submitter,TL approver,AL approver,Submit Date,TL Approval Date,AL Approval Date\n\
                          TW-1,Alice,Bob,Carol,2025-05-01,2025-05-02,2025-05-03\n\
                          TW-2,Alice,alice,Carol,2025-05-01,2025-05-02,2025-05-03\n\
                          TW-3,Dan,Bob,Carol,2025-05-01,2025-05-03,2025-05-02\n\
                          TW-4,Erin,Bob,Zoe,2025-05-01,,2025-05-05\n\
                          TW-5,Frank,Bob,Zoe, 2025-05-01 ,not a date,2025-05-05\n\
                          TW-6,Gina,Bob,,2025-05-01,2025-05-02,2025-05-03\n";

const HR_TITLES: &str = "Employee_Name,Title\n\
                         Carol,Audit Leader\n\
                         Zoe,Analyst\n\
                         ,Audit Manager\n";

fn hr_titles() -> ReferenceTables {
    let file = create_test_file(HR_TITLES);
    let titles = Parser::new()
        .load_reference(file.path(), "Employee_Name", "Title")
        .expect("Failed to load reference");
    ReferenceTables::new().with("HR_Titles", titles)
}

fn run_workpapers() -> assay::RunReport {
    let config = AnalyticConfig::from_yaml_str(WORKPAPER_CONFIG).expect("Invalid config");
    let file = create_test_file(WORKPAPERS);
    let (records, _) = Parser::new().parse_file(file.path()).expect("Parse failed");

    Engine::from_analytic(&config)
        .run(records, &hr_titles())
        .expect("Run failed")
}

fn compliance(report: &assay::RunReport) -> Vec<String> {
    report
        .table
        .column(COMPLIANCE_COLUMN)
        .expect("Compliance column")
        .iter()
        .map(|v| v.to_string())
        .collect()
}

// =============================================================================
// End-to-End Workpaper Tests
// =============================================================================

#[test]
fn test_workpaper_classification() {
    let report = run_workpapers();

    // TW-2: submitter also approves. TW-3: AL before TL.
    // TW-4/TW-5: Zoe is an Analyst. TW-6: no AL approver to check.
    assert_eq!(
        compliance(&report),
        vec!["GC", "DNC", "DNC", "DNC", "DNC", "GC"]
    );

    let review: Vec<String> = report
        .table
        .column(REVIEW_COLUMN)
        .unwrap()
        .iter()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(review, vec!["N/A", "TBD", "TBD", "TBD", "TBD", "N/A"]);

    assert_eq!(report.totals.records, 6);
    assert_eq!(report.totals.conforms, 2);
    assert_eq!(report.totals.nonconforming, 4);
    assert_eq!(report.totals.partial, 0);
}

#[test]
fn test_outcome_columns_follow_rule_order() {
    let report = run_workpapers();
    let columns: Vec<&str> = report.table.column_names().collect();

    let tail = &columns[columns.len() - 5..];
    assert_eq!(
        tail,
        &[
            "Valid_segregation_of_duties",
            "Valid_approval_sequence",
            "Valid_title_based_approval",
            "Compliance",
            "DNC_Validated",
        ]
    );
    assert_eq!(
        report.table.get(2, "Valid_approval_sequence"),
        Some(&Value::Bool(false))
    );
}

#[test]
fn test_aliases_resolved_and_dates_normalized() {
    let report = run_workpapers();

    assert!(report.table.has_column("Audit TW ID"));
    assert!(report.table.has_column("TW submitter"));
    assert!(!report.table.has_column("Submitter"));

    assert!(matches!(report.table.get(4, "Submit Date"), Some(Value::Date(_))));
    assert_eq!(report.table.get(4, "TL Approval Date"), Some(&Value::Null));
    assert_eq!(
        report.normalization.unparseable_dates.get("TL Approval Date"),
        Some(&1)
    );
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::UnparseableDates));
}

#[test]
fn test_workpaper_summary() {
    let report = run_workpapers();
    let summary = report.summary.as_ref().expect("Summary failed");

    let keys: Vec<&str> = summary.rows.iter().map(|r| r.group_key.as_str()).collect();
    assert_eq!(keys, vec!["Carol", "Zoe"]);

    let carol = summary.row("Carol").unwrap();
    assert_eq!((carol.conforms, carol.partial, carol.nonconforming), (1, 0, 2));
    assert_eq!(carol.total, 3);
    assert_eq!(carol.nonconforming_pct, 66.67);
    assert!(carol.exceeds_threshold);

    let zoe = summary.row("Zoe").unwrap();
    assert_eq!(zoe.nonconforming_pct, 100.0);

    // TW-6 has no AL approver and is counted in no group.
    assert_eq!(summary.ungrouped, 1);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::UngroupedRecords && d.count == Some(1)));
}

#[test]
fn test_outputs_written_as_csv() {
    let report = run_workpapers();
    let dir = TempDir::new().unwrap();

    let detail_path = dir.path().join("QA_77_detail.csv");
    write_csv(&report.table, std::fs::File::create(&detail_path).unwrap()).unwrap();
    let summary_path = dir.path().join("QA_77_summary.csv");
    let summary = report.summary.as_ref().unwrap().to_table();
    write_csv(&summary, std::fs::File::create(&summary_path).unwrap()).unwrap();

    let (detail, _) = Parser::new().parse_file(&detail_path).unwrap();
    assert_eq!(detail.row_count(), 6);
    assert_eq!(detail.get(1, COMPLIANCE_COLUMN), Some(&Value::text("DNC")));

    let (summary, _) = Parser::new().parse_file(&summary_path).unwrap();
    assert_eq!(summary.get(0, PERCENTAGE_COLUMN), Some(&Value::text("66.67")));
    assert_eq!(summary.get(0, EXCEEDS_COLUMN), Some(&Value::text("true")));
}

// =============================================================================
// Conditional Presence Tests
// =============================================================================

#[test]
fn test_third_party_risk() {
    let config = EngineConfig::new("Audit Leader", 10.0)
        .with_column(ColumnSpec::new("Third Parties"))
        .with_column(ColumnSpec::new("L1 Third Party Risk"))
        .with_column(ColumnSpec::new("Audit Leader"))
        .with_rule(
            RuleConfig::new("third_party_risk_validation")
                .with_parameter("third_party_field", "Third Parties")
                .with_parameter("risk_level_field", "L1 Third Party Risk"),
        );
    let file = create_test_file(
        "Audit Leader,Third Parties,L1 Third Party Risk\n\
         Carol,,N/A\n\
         Carol,\"TP-1, TP-2\",N/A\n\
         Carol,TP-1,High\n\
         Dave,,Low\n",
    );
    let (records, _) = Parser::new().parse_file(file.path()).unwrap();

    let report = Engine::new(config)
        .run(records, &ReferenceTables::new())
        .unwrap();

    assert_eq!(compliance(&report), vec!["GC", "DNC", "GC", "DNC"]);
    let summary = report.summary.unwrap();
    assert_eq!(summary.row("Carol").unwrap().nonconforming_pct, 33.33);
    assert_eq!(summary.row("Dave").unwrap().nonconforming_pct, 100.0);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_missing_required_field() {
    let config = AnalyticConfig::from_yaml_str(WORKPAPER_CONFIG).unwrap();
    let file = create_test_file("TW_ID,Submitter\nTW-1,Alice\n");
    let (records, _) = Parser::new().parse_file(file.path()).unwrap();

    let err = Engine::from_analytic(&config)
        .run(records, &hr_titles())
        .unwrap_err();

    match err {
        AssayError::MissingFields { fields } => {
            assert_eq!(
                fields,
                vec![
                    "TL approver",
                    "AL approver",
                    "Submit Date",
                    "TL Approval Date",
                    "AL Approval Date"
                ]
            );
        }
        other => panic!("Expected MissingFields, got {}", other),
    }
}

#[test]
fn test_missing_reference_degrades_one_rule() {
    let config = AnalyticConfig::from_yaml_str(WORKPAPER_CONFIG).unwrap();
    let file = create_test_file(WORKPAPERS);
    let (records, _) = Parser::new().parse_file(file.path()).unwrap();

    let report = Engine::from_analytic(&config)
        .run(records, &ReferenceTables::new())
        .unwrap();

    let errors: Vec<_> = report.rule_errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "title_based_approval");
    assert!(matches!(errors[0].1, RuleError::MissingReference { .. }));

    // Every record fails the unresolvable rule; the others still ran.
    assert!(compliance(&report).iter().all(|c| c == "DNC"));
    assert_eq!(report.rules[0].failed, 1);
    assert_eq!(report.rules[2].failed, 6);
}

#[test]
fn test_unknown_rule_reported_and_others_run() {
    let mut config = AnalyticConfig::from_yaml_str(WORKPAPER_CONFIG).unwrap();
    config.validations.insert(0, RuleConfig::new("unknown_rule_x"));
    let engine = Engine::from_analytic(&config);
    assert_eq!(engine.configuration_errors().len(), 1);

    let file = create_test_file(WORKPAPERS);
    let (records, _) = Parser::new().parse_file(file.path()).unwrap();
    let report = engine.run(records, &hr_titles()).unwrap();

    assert_eq!(
        report.table.get(0, "Valid_unknown_rule_x"),
        Some(&Value::Bool(false))
    );
    assert_eq!(report.rules.len(), 4);
    assert_eq!(report.rules[1].failed, 1);
    assert_eq!(report.totals.nonconforming, 6);
}

#[test]
fn test_empty_rule_list_leaves_records_unclassified() {
    let config = EngineConfig::new("Owner", 5.0).with_column(ColumnSpec::new("Owner"));
    let file = create_test_file("Owner\nA\nB\n");
    let (records, _) = Parser::new().parse_file(file.path()).unwrap();

    let report = Engine::new(config)
        .run(records, &ReferenceTables::new())
        .unwrap();

    assert_eq!(compliance(&report), vec!["N/A", "N/A"]);
    assert_eq!(report.totals.unclassified, 2);
    assert_eq!(report.totals.conforms, 0);
    assert!(report.summary.unwrap().rows.is_empty());
}

#[test]
fn test_missing_group_by_keeps_classification() {
    let mut config = AnalyticConfig::from_yaml_str(WORKPAPER_CONFIG).unwrap();
    config.reporting.group_by = "Region".to_string();
    let file = create_test_file(WORKPAPERS);
    let (records, _) = Parser::new().parse_file(file.path()).unwrap();

    let report = Engine::from_analytic(&config)
        .run(records, &hr_titles())
        .unwrap();

    assert!(matches!(
        report.summary,
        Err(AssayError::GroupByFieldMissing(ref field)) if field == "Region"
    ));
    assert_eq!(compliance(&report).len(), 6);
}

// =============================================================================
// Determinism Tests
// =============================================================================

#[test]
fn test_rerun_is_identical() {
    let first = run_workpapers();
    let second = run_workpapers();

    assert_eq!(first.table, second.table);
    assert_eq!(first.summary.unwrap(), second.summary.unwrap());
}

#[test]
fn test_evaluate_twice_on_same_table() {
    let config = AnalyticConfig::from_yaml_str(WORKPAPER_CONFIG).unwrap();
    let engine = Engine::from_analytic(&config);
    let file = create_test_file(WORKPAPERS);
    let (mut table, _) = Parser::new().parse_file(file.path()).unwrap();
    let references = hr_titles();

    engine.prepare(&mut table).unwrap();
    let first = engine.evaluate(&mut table, &references).unwrap();
    let first_table = table.clone();
    let second = engine.evaluate(&mut table, &references).unwrap();

    assert_eq!(first.classifications, second.classifications);
    assert_eq!(first_table, table);
    assert_eq!(
        engine.summarize(&first_table).unwrap(),
        engine.summarize(&table).unwrap()
    );
}

// =============================================================================
// Configuration Catalog Tests
// =============================================================================

#[test]
fn test_catalog_drives_engine() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("qa_77.yaml"), WORKPAPER_CONFIG).unwrap();
    std::fs::write(dir.path().join("broken.yaml"), "analytic_id: [").unwrap();

    let catalog = ConfigCatalog::load_dir(dir.path()).unwrap();
    assert_eq!(catalog.available(), vec![("77", "Audit Test Workpaper Approvals")]);
    assert_eq!(catalog.failures().len(), 1);

    let config = catalog.get("77").unwrap();
    assert!(Engine::from_analytic(config).configuration_errors().is_empty());
    assert!(catalog.get("78").is_err());
}

#[test]
fn test_classification_enum_matches_column_codes() {
    let report = run_workpapers();
    for value in report.table.column(COMPLIANCE_COLUMN).unwrap() {
        assert!(Classification::from_code(&value.to_string()).is_some());
    }
}
