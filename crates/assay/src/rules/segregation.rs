//! Segregation of duties: the submitter may not also approve.

use serde::Deserialize;

use crate::config::RuleParameters;
use crate::error::RuleError;
use crate::input::{RecordTable, ReferenceTables, Value};

use super::{decode, require_column, require_non_empty, Rule};

#[derive(Deserialize)]
struct Params {
    submitter_field: String,
    #[serde(default)]
    approver_fields: Vec<String>,
}

/// Violated when the submitter equals any approver, ignoring case.
///
/// Blank values never match. Approver fields absent from the table are
/// skipped; a missing submitter field is a configuration error.
#[derive(Debug, Clone)]
pub struct SegregationOfDuties {
    submitter_field: String,
    approver_fields: Vec<String>,
}

impl SegregationOfDuties {
    pub const NAME: &'static str = "segregation_of_duties";

    pub fn new(
        submitter_field: impl Into<String>,
        approver_fields: Vec<String>,
    ) -> Result<Self, RuleError> {
        let submitter_field = submitter_field.into();
        require_non_empty(Self::NAME, "submitter_field", &submitter_field)?;
        if approver_fields.is_empty() {
            return Err(RuleError::invalid(Self::NAME, "'approver_fields' is empty"));
        }
        Ok(Self {
            submitter_field,
            approver_fields,
        })
    }

    pub fn from_parameters(parameters: &RuleParameters) -> Result<Self, RuleError> {
        let params: Params = decode(Self::NAME, parameters)?;
        Self::new(params.submitter_field, params.approver_fields)
    }
}

impl Rule for SegregationOfDuties {
    fn evaluate(
        &self,
        table: &RecordTable,
        _references: &ReferenceTables,
    ) -> Result<Vec<bool>, RuleError> {
        let submitters: Vec<Option<String>> =
            require_column(table, Self::NAME, &self.submitter_field)?
                .iter()
                .map(Value::match_key)
                .collect();
        let mut outcomes = vec![true; table.row_count()];

        for field in &self.approver_fields {
            let Some(approvers) = table.column(field) else {
                tracing::debug!(rule = Self::NAME, field = %field, "approver field absent, skipped");
                continue;
            };

            for ((outcome, submitter), approver) in
                outcomes.iter_mut().zip(&submitters).zip(approvers)
            {
                if let (Some(submitter), Some(approver)) = (submitter, approver.match_key()) {
                    if *submitter == approver {
                        *outcome = false;
                    }
                }
            }
        }

        Ok(outcomes)
    }
}
