//! Named, parameterized validation rules.
//!
//! Each rule is a pure function of the record table, its own parameters and
//! the run's reference tables, producing exactly one boolean per record
//! (`true` = conforms). Missing input data resolves to a rule-specific
//! default; only configuration problems surface as [`RuleError`].

mod conditional;
mod registry;
mod segregation;
mod sequence;
mod title;

use serde::de::DeserializeOwned;

use crate::config::RuleParameters;
use crate::error::RuleError;
use crate::input::{RecordTable, ReferenceTables, Value};

pub use conditional::ConditionalPresence;
pub use registry::{RuleFactory, RuleKind, RuleRegistry};
pub use segregation::SegregationOfDuties;
pub use sequence::ApprovalSequence;
pub use title::TitleBasedApproval;

/// A validation rule ready to run.
pub trait Rule: Send + Sync {
    /// One outcome per record, in table order.
    fn evaluate(
        &self,
        table: &RecordTable,
        references: &ReferenceTables,
    ) -> Result<Vec<bool>, RuleError>;
}

/// Decode rule parameters into a typed struct.
fn decode<T: DeserializeOwned>(rule: &str, parameters: &RuleParameters) -> Result<T, RuleError> {
    let object: serde_json::Map<String, serde_json::Value> = parameters
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| RuleError::invalid(rule, e.to_string()))
}

/// Fetch a column the rule cannot run without.
fn require_column<'t>(
    table: &'t RecordTable,
    rule: &str,
    field: &str,
) -> Result<&'t [Value], RuleError> {
    table.column(field).ok_or_else(|| RuleError::MissingField {
        rule: rule.to_string(),
        field: field.to_string(),
    })
}

fn require_non_empty(rule: &str, name: &str, value: &str) -> Result<(), RuleError> {
    if value.trim().is_empty() {
        return Err(RuleError::invalid(rule, format!("'{}' is empty", name)));
    }
    Ok(())
}
