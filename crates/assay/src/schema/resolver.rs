//! Alias resolution from raw column names to canonical fields.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{AssayError, Result};
use crate::input::RecordTable;

use super::column::ColumnSpec;

/// Outcome of a successful resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Raw column name to canonical name, in required-field order.
    pub renamed: IndexMap<String, String>,
}

/// Maps raw column labels onto canonical field names.
pub struct SchemaResolver<'a> {
    specs: &'a [ColumnSpec],
}

impl<'a> SchemaResolver<'a> {
    pub fn new(specs: &'a [ColumnSpec]) -> Self {
        Self { specs }
    }

    /// Compute the alias renaming for the given column names.
    ///
    /// Canonical names already present are left alone. Otherwise the first
    /// alias present is used. An alias claimed by one field is not reused
    /// for another.
    pub fn plan<'c>(&self, columns: impl IntoIterator<Item = &'c str>) -> IndexMap<String, String> {
        let present: Vec<&str> = columns.into_iter().collect();
        let mut mapping: IndexMap<String, String> = IndexMap::new();

        for spec in self.specs {
            if present.contains(&spec.canonical_name.as_str()) {
                continue;
            }
            let alias = spec.aliases.iter().find(|alias| {
                present.contains(&alias.as_str()) && !mapping.contains_key(alias.as_str())
            });
            if let Some(alias) = alias {
                mapping.insert(alias.clone(), spec.canonical_name.clone());
            }
        }

        mapping
    }

    /// Canonical fields absent from the table.
    pub fn missing_fields(&self, table: &RecordTable) -> Vec<String> {
        self.specs
            .iter()
            .filter(|spec| !table.has_column(&spec.canonical_name))
            .map(|spec| spec.canonical_name.clone())
            .collect()
    }

    /// Rename aliased columns in place and check every field is present.
    ///
    /// Fails with [`AssayError::MissingFields`] if any canonical field is
    /// still absent after renaming.
    pub fn resolve(&self, table: &mut RecordTable) -> Result<Resolution> {
        let renamed = self.plan(table.column_names());
        table.rename_columns(&renamed);

        let missing = self.missing_fields(table);
        if !missing.is_empty() {
            return Err(AssayError::MissingFields { fields: missing });
        }

        Ok(Resolution { renamed })
    }
}
