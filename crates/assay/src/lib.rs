//! Assay: configurable compliance validation for tabular records.
//!
//! Assay classifies records (audit workpapers, risk assessments) against a
//! configured set of named rules, then produces grouped pass/fail statistics
//! against a threshold.
//!
//! # Pipeline
//!
//! - **Resolve**: map raw column names onto canonical fields via aliases
//! - **Normalize**: trim text and coerce date-bearing fields
//! - **Validate**: run each configured rule, one boolean column per rule
//! - **Classify**: `GC` when every rule passed, `DNC` otherwise
//! - **Summarize**: per-group counts, non-conformance percentage, threshold flag
//!
//! # Example
//!
//! ```no_run
//! use assay::{AnalyticConfig, Engine, Parser, ReferenceTables};
//!
//! let config = AnalyticConfig::load("configs/qa_77.yaml").unwrap();
//! let (records, _source) = Parser::new().parse_file("workpapers.csv").unwrap();
//!
//! let report = Engine::from_analytic(&config)
//!     .run(records, &ReferenceTables::new())
//!     .unwrap();
//! println!("Non-conforming: {}", report.totals.nonconforming);
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod rules;
pub mod schema;
pub mod summary;
pub mod validation;

mod engine;

pub use crate::engine::{ComplianceTotals, Engine, EngineConfig, RunReport};
pub use config::{AnalyticConfig, ConfigCatalog, RuleConfig};
pub use error::{AssayError, Result, RuleError};
pub use input::{Parser, RecordTable, ReferenceTable, ReferenceTables, SourceMetadata, Value};
pub use rules::{Rule, RuleKind, RuleRegistry};
pub use schema::ColumnSpec;
pub use summary::{GroupOrder, Summary, SummaryRow};
pub use validation::{Classification, Diagnostic, DiagnosticKind, Severity};
