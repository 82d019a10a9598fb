//! Delimited table writer
//!
//! Writes a unified table as UTF-8 delimited text: one header row from the
//! schema, then one row per record. Quoting follows the usual rule (quote a
//! field only if it contains the delimiter, a quote or a newline; double
//! embedded quotes).

use crate::config::OutputConfig;
use crate::output::Table;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Errors that can occur while writing the table
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row for '{identifier}' has {found} fields, schema has {expected}")]
    RaggedRow {
        identifier: String,
        expected: usize,
        found: usize,
    },
}

/// Result type for write operations
pub type WriteResult<T> = Result<T, WriteError>;

/// How the table is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Prefix with a UTF-8 byte-order mark
    pub write_bom: bool,

    pub delimiter: u8,
}

impl WriteOptions {
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            write_bom: config.write_bom,
            delimiter: u8::try_from(config.delimiter).unwrap_or(b','),
        }
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            write_bom: true,
            delimiter: b',',
        }
    }
}

/// Writes the table to a file, replacing any existing file
///
/// # Arguments
///
/// * `table` - A unified table
/// * `path` - Destination file; its directory must exist
/// * `options` - Encoding options
///
/// # Returns
///
/// * `Ok(())` - Table written and flushed
/// * `Err(WriteError)` - The file could not be created or written
pub fn write_table(table: &Table, path: &Path, options: &WriteOptions) -> WriteResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_table_to(table, &mut writer, options)?;
    writer.flush()?;
    Ok(())
}

/// Writes the table to any writer
pub fn write_table_to<W: Write>(table: &Table, mut out: W, options: &WriteOptions) -> WriteResult<()> {
    if options.write_bom {
        out.write_all(UTF8_BOM)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .from_writer(out);

    let schema = table.schema();
    writer.write_record(schema)?;

    for row in table.rows() {
        if row.len() != schema.len() {
            return Err(WriteError::RaggedRow {
                identifier: row.identifier().to_string(),
                expected: schema.len(),
                found: row.len(),
            });
        }
        writer.write_record(schema.iter().map(|name| row.get(name).unwrap_or_default()))?;
    }

    writer.flush()?;
    Ok(())
}
