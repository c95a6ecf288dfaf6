//! Read-only key/value lookup tables used by reference-dependent rules.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A named key to value lookup (e.g. employee name to job title).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTable {
    entries: IndexMap<String, String>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry; a repeated key overwrites the earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up a key exactly.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = ReferenceTable::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

/// Reference tables available to a run, keyed by source name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTables {
    tables: IndexMap<String, ReferenceTable>,
}

impl ReferenceTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing any table with the same name.
    pub fn insert(&mut self, name: impl Into<String>, table: ReferenceTable) {
        self.tables.insert(name.into(), table);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, table: ReferenceTable) -> Self {
        self.insert(name, table);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ReferenceTable> {
        self.tables.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
