//! Record table and source metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AssayError, Result};

use super::value::Value;

/// Metadata about a loaded source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been loaded.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// Columnar table of records.
///
/// Columns keep insertion order. Every column has exactly `row_count` values;
/// the engine adds and renames columns but never adds or removes rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordTable {
    columns: IndexMap<String, Vec<Value>>,
    row_count: usize,
}

impl RecordTable {
    /// Create a table with `row_count` records and no columns.
    pub fn new(row_count: usize) -> Self {
        Self {
            columns: IndexMap::new(),
            row_count,
        }
    }

    /// Build a table from headers and row-major values.
    ///
    /// Short rows are padded with nulls, long rows are truncated.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let row_count = rows.len();
        let mut columns: IndexMap<String, Vec<Value>> = headers
            .into_iter()
            .map(|h| (h, Vec::with_capacity(row_count)))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for values in columns.values_mut() {
                values.push(cells.next().unwrap_or_default());
            }
        }

        Self { columns, row_count }
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get all column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    /// Iterate over `(name, values)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Mutable access to every column.
    pub fn columns_mut(&mut self) -> impl Iterator<Item = (&str, &mut Vec<Value>)> {
        self.columns.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.columns.get(column).and_then(|c| c.get(row))
    }

    /// Insert or replace a column.
    ///
    /// A replaced column keeps its position; a new column is appended.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if values.len() != self.row_count {
            return Err(AssayError::ColumnLength {
                column: name,
                expected: self.row_count,
                actual: values.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Rename columns according to `mapping` (old name to new name).
    ///
    /// Columns not named in the mapping keep their label and position.
    pub fn rename_columns(&mut self, mapping: &IndexMap<String, String>) {
        if mapping.is_empty() {
            return;
        }
        self.columns = std::mem::take(&mut self.columns)
            .into_iter()
            .map(|(name, values)| match mapping.get(&name) {
                Some(new_name) => (new_name.clone(), values),
                None => (name, values),
            })
            .collect();
    }

    /// Iterate over the cells of one record.
    pub fn row(&self, index: usize) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .filter_map(move |(k, v)| v.get(index).map(|value| (k.as_str(), value)))
    }
}
