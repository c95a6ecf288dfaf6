//! Canonical field definitions, alias resolution, and record normalization.

mod column;
mod normalizer;
mod resolver;

pub use column::{ColumnSpec, FieldKind};
pub use normalizer::{NormalizationStats, RecordNormalizer};
pub use resolver::{Resolution, SchemaResolver};
