//! Analytic definitions as loaded from YAML or JSON.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AssayError, Result};
use crate::schema::ColumnSpec;
use crate::summary::GroupOrder;

/// Parameters of one configured rule.
pub type RuleParameters = IndexMap<String, serde_json::Value>;

/// One executable rule and its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Registry name of the rule.
    #[serde(rename = "rule")]
    pub rule_name: String,
    #[serde(default)]
    pub parameters: RuleParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl RuleConfig {
    pub fn new(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            parameters: RuleParameters::new(),
            description: None,
            rationale: None,
        }
    }

    /// Set a parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Where the records come from and which fields they must carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    pub required_columns: Vec<ColumnSpec>,
}

/// A named reference table and the columns that build it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSource {
    pub name: String,
    pub path: String,
    pub key_column: String,
    pub value_column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Maximum acceptable non-conformance percentage per group.
    pub error_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Field used to partition records in the summary.
    pub group_by: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summary_fields: Vec<String>,
    #[serde(default)]
    pub detail_required: bool,
    #[serde(default)]
    pub group_order: GroupOrder,
}

/// A complete analytic definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticConfig {
    /// Identifier; numeric ids in files are read as strings.
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub analytic_id: String,
    pub analytic_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytic_description: Option<String>,
    pub source: SourceConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_files: Vec<ReferenceSource>,
    pub validations: Vec<RuleConfig>,
    pub thresholds: Thresholds,
    pub reporting: ReportingConfig,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub report_metadata: IndexMap<String, serde_json::Value>,
}

impl AnalyticConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: AnalyticConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: AnalyticConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| AssayError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        match extension(path).as_deref() {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            _ => Err(AssayError::Config(format!(
                "Unsupported config format: {}",
                path.display()
            ))),
        }
    }

    /// Save as YAML or JSON depending on the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| AssayError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let writer = BufWriter::new(file);

        match extension(path).as_deref() {
            Some("json") => serde_json::to_writer_pretty(writer, self)?,
            _ => serde_yaml::to_writer(writer, self)?,
        }
        Ok(())
    }

    /// Check the invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.analytic_name.trim().is_empty() {
            return Err(AssayError::Config("analytic_name is empty".to_string()));
        }
        if self.source.required_columns.is_empty() {
            return Err(AssayError::Config(
                "source.required_columns is empty".to_string(),
            ));
        }
        if let Some(spec) = self
            .source
            .required_columns
            .iter()
            .find(|spec| spec.canonical_name.trim().is_empty())
        {
            return Err(AssayError::Config(format!(
                "required column with empty name (aliases: {:?})",
                spec.aliases
            )));
        }
        if self.reporting.group_by.trim().is_empty() {
            return Err(AssayError::Config("reporting.group_by is empty".to_string()));
        }

        let threshold = self.thresholds.error_percentage;
        if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
            return Err(AssayError::Config(format!(
                "thresholds.error_percentage must be within 0-100, got {}",
                threshold
            )));
        }

        let mut seen = HashSet::new();
        for reference in &self.reference_files {
            if !seen.insert(reference.name.as_str()) {
                return Err(AssayError::Config(format!(
                    "duplicate reference file name '{}'",
                    reference.name
                )));
            }
        }

        if let Some(pos) = self
            .validations
            .iter()
            .position(|rule| rule.rule_name.trim().is_empty())
        {
            return Err(AssayError::Config(format!(
                "validation #{} has an empty rule name",
                pos + 1
            )));
        }

        Ok(())
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Int(n) => n.to_string(),
        Id::Float(n) => n.to_string(),
        Id::Text(s) => s,
    })
}
