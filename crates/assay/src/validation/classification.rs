//! Per-record compliance classification.

use serde::{Deserialize, Serialize};

/// Column holding the classification code.
pub const COMPLIANCE_COLUMN: &str = "Compliance";
/// Column holding the manual review marker.
pub const REVIEW_COLUMN: &str = "DNC_Validated";
/// Prefix of every rule outcome column.
pub const OUTCOME_PREFIX: &str = "Valid_";
/// Written when no classification applies, and as the review marker for
/// records that need no review.
pub const NOT_APPLICABLE: &str = "N/A";
/// Review marker for non-conforming records.
pub const PENDING_REVIEW: &str = "TBD";

/// Outcome of all rules for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Passed every rule.
    #[serde(rename = "GC")]
    Conforms,
    /// Reserved; no built-in rule produces it.
    #[serde(rename = "PC")]
    PartiallyConforms,
    /// Failed at least one rule.
    #[serde(rename = "DNC")]
    DoesNotConform,
}

impl Classification {
    pub const ALL: [Classification; 3] = [
        Classification::Conforms,
        Classification::PartiallyConforms,
        Classification::DoesNotConform,
    ];

    /// Combine a record's rule outcomes.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = bool>) -> Self {
        if outcomes.into_iter().all(|passed| passed) {
            Classification::Conforms
        } else {
            Classification::DoesNotConform
        }
    }

    /// Short code written to the compliance column.
    pub fn code(&self) -> &'static str {
        match self {
            Classification::Conforms => "GC",
            Classification::PartiallyConforms => "PC",
            Classification::DoesNotConform => "DNC",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code.trim())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Conforms => "Generally Conforms",
            Classification::PartiallyConforms => "Partially Conforms",
            Classification::DoesNotConform => "Does Not Conform",
        }
    }

    /// Review marker for a record with this classification.
    pub fn review_marker(&self) -> &'static str {
        match self {
            Classification::DoesNotConform => PENDING_REVIEW,
            _ => NOT_APPLICABLE,
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
