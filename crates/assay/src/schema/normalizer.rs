//! Type coercion and whitespace cleanup before rule evaluation.

use indexmap::IndexMap;
use serde::Serialize;

use crate::input::{RecordTable, Value};

use super::column::ColumnSpec;

/// What the normalizer changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationStats {
    /// Text cells that had surrounding whitespace removed.
    pub trimmed_cells: usize,
    /// Per date field, non-empty values that could not be parsed and became null.
    pub unparseable_dates: IndexMap<String, usize>,
}

/// Cleans a resolved record table in place.
///
/// Trims every text cell, then coerces date-bearing canonical fields to
/// [`Value::Date`]. Unparseable dates become [`Value::Null`]; nothing raises
/// and no rows are dropped.
pub struct RecordNormalizer<'a> {
    specs: &'a [ColumnSpec],
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(specs: &'a [ColumnSpec]) -> Self {
        Self { specs }
    }

    pub fn normalize(&self, table: &mut RecordTable) -> NormalizationStats {
        let mut stats = NormalizationStats::default();

        for (_, values) in table.columns_mut() {
            for value in values.iter_mut() {
                if value.trim_in_place() {
                    stats.trimmed_cells += 1;
                }
            }
        }

        let date_fields: Vec<&str> = self
            .specs
            .iter()
            .filter(|spec| spec.is_date())
            .map(|spec| spec.canonical_name.as_str())
            .collect();

        for (name, values) in table.columns_mut() {
            if !date_fields.contains(&name) {
                continue;
            }
            let failed = coerce_dates(values);
            if failed > 0 {
                stats.unparseable_dates.insert(name.to_string(), failed);
            }
        }

        stats
    }
}

/// Coerce a column to dates in place, returning how many values were lost.
fn coerce_dates(values: &mut [Value]) -> usize {
    let mut failed = 0;
    for value in values.iter_mut() {
        let coerced = match value.as_datetime() {
            Some(dt) => Value::Date(dt),
            None => {
                if !value.is_blank() {
                    failed += 1;
                }
                Value::Null
            }
        };
        *value = coerced;
    }
    failed
}
