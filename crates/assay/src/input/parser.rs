//! Delimited text loading for record and reference tables.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{AssayError, Result};

use super::reference::ReferenceTable;
use super::source::{RecordTable, SourceMetadata};
use super::value::Value;

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Parses delimited files with a header row into record tables.
///
/// Empty cells become [`Value::Null`]; every other cell is kept as text.
/// Typing happens later, in the record normalizer.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the record table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(RecordTable, SourceMetadata)> {
        let path = path.as_ref();
        let contents = read_all(path)?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents)?,
        };

        let table = self.parse_bytes(&contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            format,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, metadata))
    }

    /// Parse in-memory text, detecting the delimiter unless configured.
    pub fn parse_str(&self, text: &str) -> Result<RecordTable> {
        let bytes = text.as_bytes();
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(bytes)?,
        };
        self.parse_bytes(bytes, delimiter)
    }

    /// Parse bytes directly.
    fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<RecordTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(AssayError::EmptyData("No columns found".to_string()));
        }

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;
            let row: Vec<Value> = record
                .iter()
                .map(|cell| {
                    if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::text(cell)
                    }
                })
                .collect();
            rows.push(row);
        }

        Ok(RecordTable::from_rows(headers, rows))
    }

    /// Load a reference table from a delimited file.
    ///
    /// Rows with an empty key are skipped; a repeated key overwrites the
    /// earlier value.
    pub fn load_reference(
        &self,
        path: impl AsRef<Path>,
        key_column: &str,
        value_column: &str,
    ) -> Result<ReferenceTable> {
        let (table, _) = self.parse_file(path.as_ref())?;
        reference_from_table(&table, key_column, value_column)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a reference table from two columns of a record table.
pub fn reference_from_table(
    table: &RecordTable,
    key_column: &str,
    value_column: &str,
) -> Result<ReferenceTable> {
    let keys = table.column(key_column).ok_or_else(|| {
        AssayError::Config(format!("Reference key column '{}' not found", key_column))
    })?;
    let values = table.column(value_column).ok_or_else(|| {
        AssayError::Config(format!("Reference value column '{}' not found", value_column))
    })?;

    Ok(keys
        .iter()
        .zip(values)
        .filter(|(k, _)| !k.is_blank())
        .map(|(k, v)| (k.to_string().trim().to_string(), v.to_string().trim().to_string()))
        .collect())
}

/// Write a record table as CSV with a header row.
pub fn write_csv<W: Write>(table: &RecordTable, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.column_names())?;

    let columns: Vec<_> = table.columns().map(|(_, values)| values).collect();
    for row in 0..table.row_count() {
        out.write_record(columns.iter().map(|values| values[row].to_string()))?;
    }

    out.flush().map_err(|e| AssayError::Csv(e.into()))?;
    Ok(())
}

fn read_all(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| AssayError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents).map_err(|e| AssayError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(contents)
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(AssayError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        // Consistent counts across lines beat raw frequency.
        let score = if counts.iter().all(|&c| c == first_count) {
            first_count * 1000 + if delim == b'\t' { 100 } else { 0 }
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}
