//! Canonical field definitions.

use serde::{Deserialize, Serialize};

/// How a canonical field is typed during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Date,
}

/// A required field and the raw column names it may appear under.
///
/// If the canonical name is present in the raw table it always wins over any
/// alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Standardized column name the rules expect.
    #[serde(rename = "name")]
    pub canonical_name: String,
    /// Alternate raw names, tried in order.
    #[serde(rename = "alias", default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Explicit field kind; inferred from the name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,
}

impl ColumnSpec {
    pub fn new(canonical_name: impl Into<String>) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            aliases: Vec::new(),
            kind: None,
        }
    }

    /// Add an alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Declare the field kind explicitly.
    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// The declared kind, or `Date` when the name mentions "date".
    pub fn field_kind(&self) -> FieldKind {
        match self.kind {
            Some(kind) => kind,
            None if self.canonical_name.to_lowercase().contains("date") => FieldKind::Date,
            None => FieldKind::Text,
        }
    }

    pub fn is_date(&self) -> bool {
        self.field_kind() == FieldKind::Date
    }
}
