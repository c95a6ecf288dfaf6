//! Grouped compliance counts with threshold flags.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AssayError, Result};
use crate::input::{RecordTable, Value};
use crate::validation::{Classification, COMPLIANCE_COLUMN};

pub const TOTAL_COLUMN: &str = "Total";
pub const PERCENTAGE_COLUMN: &str = "DNC_Percentage";
pub const EXCEEDS_COLUMN: &str = "Exceeds_Threshold";

/// Order of summary rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrder {
    /// Sorted by group key.
    #[default]
    Natural,
    /// Order in which keys first appear in the table.
    Appearance,
}

/// Counts for one group-by value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub group_key: String,
    #[serde(rename = "GC")]
    pub conforms: usize,
    #[serde(rename = "PC")]
    pub partial: usize,
    #[serde(rename = "DNC")]
    pub nonconforming: usize,
    #[serde(rename = "Total")]
    pub total: usize,
    #[serde(rename = "DNC_Percentage")]
    pub nonconforming_pct: f64,
    #[serde(rename = "Exceeds_Threshold")]
    pub exceeds_threshold: bool,
}

impl SummaryRow {
    fn new(group_key: String, counts: [usize; 3], threshold_pct: f64) -> Self {
        let [conforms, partial, nonconforming] = counts;
        let total = conforms + partial + nonconforming;
        let nonconforming_pct = round2(nonconforming as f64 / total as f64 * 100.0);

        Self {
            group_key,
            conforms,
            partial,
            nonconforming,
            total,
            nonconforming_pct,
            exceeds_threshold: nonconforming_pct > threshold_pct,
        }
    }

    pub fn count(&self, classification: Classification) -> usize {
        match classification {
            Classification::Conforms => self.conforms,
            Classification::PartiallyConforms => self.partial,
            Classification::DoesNotConform => self.nonconforming,
        }
    }
}

/// Summary of a classified table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub group_by: String,
    pub threshold_pct: f64,
    pub rows: Vec<SummaryRow>,
    /// Classified records with an absent group key; counted in no row.
    pub ungrouped: usize,
    /// Records without a classification; counted in no row.
    pub unclassified: usize,
}

impl Summary {
    /// Rows whose non-conformance exceeds the threshold.
    pub fn exceeding(&self) -> impl Iterator<Item = &SummaryRow> {
        self.rows.iter().filter(|r| r.exceeds_threshold)
    }

    pub fn row(&self, group_key: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.group_key == group_key)
    }

    /// Header of the group-key column in [`Summary::to_table`].
    ///
    /// The group-by field name, suffixed with `_group` when it collides with
    /// one of the count columns.
    pub fn key_column(&self) -> String {
        let taken = Classification::ALL
            .iter()
            .map(|c| c.code())
            .chain([TOTAL_COLUMN, PERCENTAGE_COLUMN, EXCEEDS_COLUMN])
            .any(|name| name == self.group_by);
        if taken {
            format!("{}_group", self.group_by)
        } else {
            self.group_by.clone()
        }
    }

    /// Render as a table: the group-key column, one column per
    /// classification, then totals, percentage and flag.
    pub fn to_table(&self) -> RecordTable {
        let mut headers = vec![self.key_column()];
        headers.extend(Classification::ALL.iter().map(|c| c.code().to_string()));
        headers.extend([TOTAL_COLUMN, PERCENTAGE_COLUMN, EXCEEDS_COLUMN].map(String::from));

        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut cells = vec![Value::text(&r.group_key)];
                cells.extend(
                    Classification::ALL
                        .iter()
                        .map(|c| Value::Number(r.count(*c) as f64)),
                );
                cells.push(Value::Number(r.total as f64));
                cells.push(Value::Number(r.nonconforming_pct));
                cells.push(Value::Bool(r.exceeds_threshold));
                cells
            })
            .collect();

        RecordTable::from_rows(headers, rows)
    }
}

/// Groups a classified table by one field.
#[derive(Debug, Clone)]
pub struct SummaryAggregator {
    group_by: String,
    threshold_pct: f64,
    order: GroupOrder,
}

impl SummaryAggregator {
    pub fn new(group_by: impl Into<String>, threshold_pct: f64) -> Self {
        Self {
            group_by: group_by.into(),
            threshold_pct,
            order: GroupOrder::default(),
        }
    }

    pub fn with_order(mut self, order: GroupOrder) -> Self {
        self.order = order;
        self
    }

    pub fn aggregate(&self, table: &RecordTable) -> Result<Summary> {
        let compliance = table
            .column(COMPLIANCE_COLUMN)
            .ok_or_else(|| AssayError::NotClassified(COMPLIANCE_COLUMN.to_string()))?;
        let keys = table
            .column(&self.group_by)
            .ok_or_else(|| AssayError::GroupByFieldMissing(self.group_by.clone()))?;

        let mut groups: IndexMap<String, [usize; 3]> = IndexMap::new();
        let mut ungrouped = 0;
        let mut unclassified = 0;

        for (key, code) in keys.iter().zip(compliance) {
            let Some(classification) = code.as_text().and_then(Classification::from_code) else {
                unclassified += 1;
                continue;
            };
            if key.is_blank() {
                ungrouped += 1;
                continue;
            }
            let counts = groups.entry(key.to_string().trim().to_string()).or_default();
            let slot = match classification {
                Classification::Conforms => 0,
                Classification::PartiallyConforms => 1,
                Classification::DoesNotConform => 2,
            };
            counts[slot] += 1;
        }

        if self.order == GroupOrder::Natural {
            groups.sort_keys();
        }

        let rows: Vec<SummaryRow> = groups
            .into_iter()
            .map(|(key, counts)| SummaryRow::new(key, counts, self.threshold_pct))
            .collect();

        tracing::info!(
            group_by = %self.group_by,
            groups = rows.len(),
            exceeding = rows.iter().filter(|r| r.exceeds_threshold).count(),
            ungrouped,
            "summary computed"
        );

        Ok(Summary {
            group_by: self.group_by.clone(),
            threshold_pct: self.threshold_pct,
            rows,
            ungrouped,
            unclassified,
        })
    }
}

/// Round to two decimals, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classified(rows: &[(Option<&str>, &str)]) -> RecordTable {
        let mut table = RecordTable::new(rows.len());
        table
            .insert_column("AL approver", rows.iter().map(|(k, _)| Value::from(*k)).collect())
            .unwrap();
        table
            .insert_column(
                COMPLIANCE_COLUMN,
                rows.iter().map(|(_, c)| Value::text(*c)).collect(),
            )
            .unwrap();
        table
    }

    #[test]
    fn test_group_counts_and_percentage() {
        let table = classified(&[
            (Some("Carol"), "GC"),
            (Some("Carol"), "DNC"),
            (Some("Carol"), "GC"),
            (Some("Alan"), "GC"),
        ]);
        let summary = SummaryAggregator::new("AL approver", 5.0)
            .aggregate(&table)
            .unwrap();

        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].group_key, "Alan");
        let carol = summary.row("Carol").unwrap();
        assert_eq!((carol.conforms, carol.partial, carol.nonconforming), (2, 0, 1));
        assert_eq!(carol.total, 3);
        assert_eq!(carol.nonconforming_pct, 33.33);
        assert!(carol.exceeds_threshold);
        assert!(!summary.row("Alan").unwrap().exceeds_threshold);
    }

    #[test]
    fn test_threshold_is_strict() {
        let table = classified(&[(Some("A"), "DNC"), (Some("A"), "GC")]);
        let summary = SummaryAggregator::new("AL approver", 50.0)
            .aggregate(&table)
            .unwrap();
        assert_eq!(summary.rows[0].nonconforming_pct, 50.0);
        assert!(!summary.rows[0].exceeds_threshold);
    }

    #[test]
    fn test_absent_keys_and_unclassified_dropped() {
        let table = classified(&[
            (None, "DNC"),
            (Some(" "), "GC"),
            (Some("B"), "N/A"),
            (Some("B"), "GC"),
        ]);
        let summary = SummaryAggregator::new("AL approver", 5.0)
            .aggregate(&table)
            .unwrap();
        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].total, 1);
        assert_eq!(summary.ungrouped, 2);
        assert_eq!(summary.unclassified, 1);
    }

    #[test]
    fn test_appearance_order() {
        let table = classified(&[(Some("Zed"), "GC"), (Some("Amy"), "GC")]);
        let summary = SummaryAggregator::new("AL approver", 5.0)
            .with_order(GroupOrder::Appearance)
            .aggregate(&table)
            .unwrap();
        let keys: Vec<&str> = summary.rows.iter().map(|r| r.group_key.as_str()).collect();
        assert_eq!(keys, vec!["Zed", "Amy"]);
    }

    #[test]
    fn test_missing_columns() {
        let table = classified(&[(Some("A"), "GC")]);
        assert!(matches!(
            SummaryAggregator::new("Region", 5.0).aggregate(&table),
            Err(AssayError::GroupByFieldMissing(field)) if field == "Region"
        ));
        assert!(matches!(
            SummaryAggregator::new("AL approver", 5.0).aggregate(&RecordTable::new(0)),
            Err(AssayError::NotClassified(_))
        ));
    }

    #[test]
    fn test_table_always_has_every_category() {
        let table = classified(&[(Some("A"), "GC")]);
        let summary = SummaryAggregator::new("AL approver", 5.0)
            .aggregate(&table)
            .unwrap()
            .to_table();
        let columns: Vec<&str> = summary.column_names().collect();
        assert_eq!(
            columns,
            vec!["AL approver", "GC", "PC", "DNC", "Total", "DNC_Percentage", "Exceeds_Threshold"]
        );
        assert_eq!(summary.get(0, "PC"), Some(&Value::Number(0.0)));
    }

    #[test]
    fn test_percentage_ties_round_to_even() {
        let mut rows = vec![(Some("A"), "GC"); 31];
        rows.push((Some("A"), "DNC"));
        let table = classified(&rows);

        let summary = SummaryAggregator::new("AL approver", 3.12)
            .aggregate(&table)
            .unwrap();
        let row = summary.row("A").unwrap();
        assert_eq!(row.nonconforming_pct, 3.12);
        assert!(!row.exceeds_threshold);

        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn test_group_key_column_renamed_on_collision() {
        let mut table = RecordTable::new(2);
        table
            .insert_column("DNC", vec![Value::from("East"), Value::from("West")])
            .unwrap();
        table
            .insert_column(COMPLIANCE_COLUMN, vec![Value::text("GC"), Value::text("DNC")])
            .unwrap();

        let summary = SummaryAggregator::new("DNC", 5.0).aggregate(&table).unwrap();
        assert_eq!(summary.key_column(), "DNC_group");

        let rendered = summary.to_table();
        assert_eq!(rendered.column_count(), 7);
        assert_eq!(rendered.get(0, "DNC_group"), Some(&Value::text("East")));
        assert_eq!(rendered.get(1, "DNC"), Some(&Value::Number(1.0)));
    }
}
