//! Title-based approval: approvers must hold an allowed job title.

use indexmap::IndexSet;
use serde::Deserialize;

use crate::config::RuleParameters;
use crate::error::RuleError;
use crate::input::{RecordTable, ReferenceTables};

use super::{decode, require_column, require_non_empty, Rule};

#[derive(Deserialize)]
struct Params {
    approver_field: String,
    #[serde(default)]
    allowed_titles: Vec<String>,
    title_reference: String,
}

/// Looks each approver up in a reference table of titles.
///
/// A blank approver conforms (nothing to check). A present approver
/// conforms only if found and their title is allowed.
#[derive(Debug, Clone)]
pub struct TitleBasedApproval {
    approver_field: String,
    allowed_titles: IndexSet<String>,
    title_reference: String,
}

impl TitleBasedApproval {
    pub const NAME: &'static str = "title_based_approval";

    pub fn new(
        approver_field: impl Into<String>,
        allowed_titles: impl IntoIterator<Item = impl Into<String>>,
        title_reference: impl Into<String>,
    ) -> Result<Self, RuleError> {
        let approver_field = approver_field.into();
        let title_reference = title_reference.into();
        require_non_empty(Self::NAME, "approver_field", &approver_field)?;
        require_non_empty(Self::NAME, "title_reference", &title_reference)?;

        Ok(Self {
            approver_field,
            allowed_titles: allowed_titles.into_iter().map(Into::into).collect(),
            title_reference,
        })
    }

    pub fn from_parameters(parameters: &RuleParameters) -> Result<Self, RuleError> {
        let params: Params = decode(Self::NAME, parameters)?;
        Self::new(
            params.approver_field,
            params.allowed_titles,
            params.title_reference,
        )
    }
}

impl Rule for TitleBasedApproval {
    fn evaluate(
        &self,
        table: &RecordTable,
        references: &ReferenceTables,
    ) -> Result<Vec<bool>, RuleError> {
        let titles = references
            .get(&self.title_reference)
            .ok_or_else(|| RuleError::MissingReference {
                rule: Self::NAME.to_string(),
                reference: self.title_reference.clone(),
            })?;
        let approvers = require_column(table, Self::NAME, &self.approver_field)?;

        Ok(approvers
            .iter()
            .map(|approver| {
                if approver.is_blank() {
                    return true;
                }
                titles
                    .get(&approver.to_string())
                    .is_some_and(|title| self.allowed_titles.contains(title))
            })
            .collect())
    }
}
