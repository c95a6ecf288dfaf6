//! Structured diagnostics collected during a run.

use serde::{Deserialize, Serialize};

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A source column was renamed to its canonical name.
    ColumnRenamed,
    /// Non-empty values in a date field that could not be parsed.
    UnparseableDates,
    /// A rule could not be built or evaluated.
    RuleConfiguration,
    /// No rules configured; records left unclassified.
    NoRules,
    /// Records without a group key, left out of the summary.
    UngroupedRecords,
    /// The summary could not be produced.
    Summary,
}

impl DiagnosticKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::ColumnRenamed => "Column Renamed",
            DiagnosticKind::UnparseableDates => "Unparseable Dates",
            DiagnosticKind::RuleConfiguration => "Rule Configuration",
            DiagnosticKind::NoRules => "No Rules",
            DiagnosticKind::UngroupedRecords => "Ungrouped Records",
            DiagnosticKind::Summary => "Summary",
        }
    }
}

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// One event from a run, returned to the caller instead of only logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            rule: None,
            field: None,
            message: message.into(),
            count: None,
        }
    }

    pub fn info(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Info, message)
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, message)
    }

    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error, message)
    }

    /// Set the rule name.
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Set the field name.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the number of affected records or values.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Forward to `tracing` at the matching level.
    pub fn emit(&self) {
        let rule = self.rule.as_deref().unwrap_or("");
        let field = self.field.as_deref().unwrap_or("");
        match self.severity {
            Severity::Info => {
                tracing::info!(kind = ?self.kind, rule, field, count = self.count, "{}", self.message)
            }
            Severity::Warning => {
                tracing::warn!(kind = ?self.kind, rule, field, count = self.count, "{}", self.message)
            }
            Severity::Error => {
                tracing::error!(kind = ?self.kind, rule, field, count = self.count, "{}", self.message)
            }
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind.label(), self.message)
    }
}
