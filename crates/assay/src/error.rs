//! Error types for the Assay library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Assay operations.
#[derive(Debug, Error)]
pub enum AssayError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Required canonical fields are still absent after alias resolution.
    #[error("Missing required columns: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    /// A column was inserted with the wrong number of values.
    #[error("Column '{column}' has {actual} values, table has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// The group-by field is not a column of the classified table.
    #[error("Group by field '{0}' not found in data")]
    GroupByFieldMissing(String),

    /// Summary requested before classification ran.
    #[error("Cannot generate summary: table has no '{0}' column")]
    NotClassified(String),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to process.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Assay operations.
pub type Result<T> = std::result::Result<T, AssayError>;

/// A problem with one configured rule.
///
/// Rule errors never abort a run: the rule's outcome column is filled with
/// `false` and the error is reported next to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("Validation rule '{0}' not found")]
    UnknownRule(String),

    #[error("Invalid parameters for '{rule}': {message}")]
    InvalidParameters { rule: String, message: String },

    #[error("Rule '{rule}' references missing field '{field}'")]
    MissingField { rule: String, field: String },

    #[error("Rule '{rule}' references unknown reference table '{reference}'")]
    MissingReference { rule: String, reference: String },

    #[error("Rule '{rule}' produced {actual} outcomes for {expected} records")]
    OutcomeLength {
        rule: String,
        expected: usize,
        actual: usize,
    },
}

impl RuleError {
    /// Shorthand for [`RuleError::InvalidParameters`].
    pub fn invalid(rule: &str, message: impl Into<String>) -> Self {
        RuleError::InvalidParameters {
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}
