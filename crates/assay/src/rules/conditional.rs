//! Conditional presence: a status must agree with whether a population exists.

use serde::Deserialize;

use crate::config::RuleParameters;
use crate::error::RuleError;
use crate::input::{RecordTable, ReferenceTables, Value};

use super::{decode, require_column, require_non_empty, Rule};

/// Status value meaning "not applicable".
pub const DEFAULT_NOT_APPLICABLE: &str = "N/A";

fn default_not_applicable() -> String {
    DEFAULT_NOT_APPLICABLE.to_string()
}

#[derive(Deserialize)]
struct Params {
    #[serde(alias = "population_field")]
    third_party_field: String,
    #[serde(alias = "status_field")]
    risk_level_field: String,
    #[serde(default = "default_not_applicable")]
    not_applicable_value: String,
}

/// Conforms when the population is empty and the status is the
/// not-applicable sentinel, or when the population is non-empty and the
/// status is present and not the sentinel.
#[derive(Debug, Clone)]
pub struct ConditionalPresence {
    population_field: String,
    status_field: String,
    not_applicable: String,
}

impl ConditionalPresence {
    pub const NAME: &'static str = "third_party_risk_validation";
    pub const ALIAS: &'static str = "conditional_presence";

    pub fn new(
        population_field: impl Into<String>,
        status_field: impl Into<String>,
    ) -> Result<Self, RuleError> {
        let population_field = population_field.into();
        let status_field = status_field.into();
        require_non_empty(Self::NAME, "third_party_field", &population_field)?;
        require_non_empty(Self::NAME, "risk_level_field", &status_field)?;

        Ok(Self {
            population_field,
            status_field,
            not_applicable: default_not_applicable(),
        })
    }

    /// Use a different not-applicable sentinel.
    pub fn with_not_applicable(mut self, sentinel: impl Into<String>) -> Self {
        self.not_applicable = sentinel.into();
        self
    }

    pub fn from_parameters(parameters: &RuleParameters) -> Result<Self, RuleError> {
        let params: Params = decode(Self::NAME, parameters)?;
        Ok(Self::new(params.third_party_field, params.risk_level_field)?
            .with_not_applicable(params.not_applicable_value))
    }

    fn conforms(&self, population: &Value, status: &Value) -> bool {
        let status = (!status.is_blank()).then(|| status.to_string());
        let status = status.as_deref().map(str::trim);

        if population.is_blank() {
            status == Some(self.not_applicable.as_str())
        } else {
            status.is_some_and(|s| s != self.not_applicable)
        }
    }
}

impl Rule for ConditionalPresence {
    fn evaluate(
        &self,
        table: &RecordTable,
        _references: &ReferenceTables,
    ) -> Result<Vec<bool>, RuleError> {
        let population = require_column(table, Self::NAME, &self.population_field)?;
        let status = require_column(table, Self::NAME, &self.status_field)?;

        Ok(population
            .iter()
            .zip(status)
            .map(|(p, s)| self.conforms(p, s))
            .collect())
    }
}
