//! Approval sequence: dates must be non-decreasing in the configured order.

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::config::RuleParameters;
use crate::error::RuleError;
use crate::input::{RecordTable, ReferenceTables, Value};

use super::{decode, Rule};

#[derive(Deserialize)]
struct Params {
    #[serde(alias = "date_fields")]
    date_fields_in_order: Vec<String>,
}

/// Each consecutive pair of date fields must satisfy `earlier <= later`.
///
/// A pair with either date absent (or unparseable) is skipped for that
/// record. Fields absent from the table skip every pair they take part in.
#[derive(Debug, Clone)]
pub struct ApprovalSequence {
    date_fields: Vec<String>,
}

impl ApprovalSequence {
    pub const NAME: &'static str = "approval_sequence";

    pub fn new(date_fields: Vec<String>) -> Result<Self, RuleError> {
        if date_fields.len() < 2 {
            return Err(RuleError::invalid(
                Self::NAME,
                format!(
                    "'date_fields_in_order' needs at least 2 fields, got {}",
                    date_fields.len()
                ),
            ));
        }
        Ok(Self { date_fields })
    }

    pub fn from_parameters(parameters: &RuleParameters) -> Result<Self, RuleError> {
        let params: Params = decode(Self::NAME, parameters)?;
        Self::new(params.date_fields_in_order)
    }
}

impl Rule for ApprovalSequence {
    fn evaluate(
        &self,
        table: &RecordTable,
        _references: &ReferenceTables,
    ) -> Result<Vec<bool>, RuleError> {
        let columns: Vec<Option<Vec<Option<NaiveDateTime>>>> = self
            .date_fields
            .iter()
            .map(|field| {
                let dates = table
                    .column(field)
                    .map(|values| values.iter().map(Value::as_datetime).collect());
                if dates.is_none() {
                    tracing::debug!(rule = Self::NAME, field = %field, "date field absent, pairs skipped");
                }
                dates
            })
            .collect();

        let mut outcomes = vec![true; table.row_count()];
        for pair in columns.windows(2) {
            let [Some(earlier), Some(later)] = pair else {
                continue;
            };
            for ((outcome, first), second) in outcomes.iter_mut().zip(earlier).zip(later) {
                if let (Some(first), Some(second)) = (first, second) {
                    if first > second {
                        *outcome = false;
                    }
                }
            }
        }

        Ok(outcomes)
    }
}
