//! Directory of analytic definitions keyed by analytic id.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{AssayError, Result};

use super::analytic::AnalyticConfig;

/// All analytics found in a config directory.
#[derive(Debug, Clone, Default)]
pub struct ConfigCatalog {
    configs: IndexMap<String, AnalyticConfig>,
    failures: Vec<(PathBuf, String)>,
}

impl ConfigCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `.yaml`, `.yml` and `.json` file in `dir`, in file name order.
    ///
    /// Files that fail to parse or validate are recorded in
    /// [`failures`](Self::failures) and skipped. A later file with an id
    /// already seen replaces the earlier one.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| AssayError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_config_file(path))
            .collect();
        paths.sort();

        let mut catalog = Self::new();
        for path in paths {
            match AnalyticConfig::load(&path) {
                Ok(config) => {
                    tracing::info!(
                        analytic_id = %config.analytic_id,
                        path = %path.display(),
                        "loaded analytic config"
                    );
                    catalog.insert(config);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping config");
                    catalog.failures.push((path, e.to_string()));
                }
            }
        }

        Ok(catalog)
    }

    pub fn insert(&mut self, config: AnalyticConfig) {
        self.configs.insert(config.analytic_id.clone(), config);
    }

    /// Get the analytic with the given id.
    pub fn get(&self, analytic_id: &str) -> Result<&AnalyticConfig> {
        self.configs.get(analytic_id).ok_or_else(|| {
            AssayError::Config(format!("No configuration found for QA-ID {}", analytic_id))
        })
    }

    /// `(id, name)` pairs of every loaded analytic.
    pub fn available(&self) -> Vec<(&str, &str)> {
        self.configs
            .values()
            .map(|c| (c.analytic_id.as_str(), c.analytic_name.as_str()))
            .collect()
    }

    /// Files that could not be loaded, with the reason.
    pub fn failures(&self) -> &[(PathBuf, String)] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

fn is_config_file(path: &Path) -> bool {
    path.is_file()
        && matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml") | Some("json")
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
analytic_id: ID
analytic_name: NAME
source:
  required_columns:
    - name: Audit Leader
validations: []
thresholds:
  error_percentage: 5
reporting:
  group_by: Audit Leader
"#;

    fn write(dir: &Path, file: &str, id: &str, name: &str) {
        let text = MINIMAL.replace("ID", id).replace("NAME", name);
        fs::write(dir.join(file), text).unwrap();
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "qa_78.yaml", "78", "Third Party Risk");
        write(dir.path(), "qa_77.yml", "77", "Workpaper Approvals");
        fs::write(dir.path().join("broken.yaml"), "analytic_id: [").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = ConfigCatalog::load_dir(dir.path()).unwrap();

        assert_eq!(
            catalog.available(),
            vec![("77", "Workpaper Approvals"), ("78", "Third Party Risk")]
        );
        assert_eq!(catalog.failures().len(), 1);
        assert_eq!(catalog.get("78").unwrap().analytic_name, "Third Party Risk");
        assert!(catalog.get("99").is_err());
    }

    #[test]
    fn test_missing_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigCatalog::load_dir(dir.path().join("nope")).is_err());
    }
}
