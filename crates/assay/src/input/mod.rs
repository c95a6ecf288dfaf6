//! Record tables, reference tables, and delimited-text loading.

mod parser;
mod reference;
mod source;
mod value;

pub use parser::{reference_from_table, write_csv, Parser, ParserConfig};
pub use reference::{ReferenceTable, ReferenceTables};
pub use source::{RecordTable, SourceMetadata};
pub use value::{parse_datetime, Value};
