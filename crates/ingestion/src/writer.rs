//! Delimited output writer.

use predictor_core::{Error, FeatureTable, Result, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Format a cell. Undefined cells are written empty.
///
/// Floats use the shortest representation that round-trips, so identical
/// tables always serialize to identical bytes.
pub fn format_value(value: Value) -> String {
    match value {
        Some(x) => x.to_string(),
        None => String::new(),
    }
}

/// Writer for delimited feature tables.
#[derive(Debug, Clone)]
pub struct CsvTableWriter {
    delimiter: u8,
}

impl CsvTableWriter {
    /// Create a comma-delimited writer.
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Use a different field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Write the header and every row.
    pub fn write<W: Write>(&self, table: &FeatureTable, sink: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(sink);

        writer
            .write_record(table.column_names())
            .map_err(|e| Error::output(format!("cannot write header: {e}")))?;

        let mut record: Vec<String> = Vec::with_capacity(table.column_names().len());
        for (i, candle) in table.candles().iter().enumerate() {
            record.clear();
            record.push(candle.timestamp.clone());
            record.extend(
                [candle.open, candle.high, candle.low, candle.close, candle.volume]
                    .into_iter()
                    .map(|x| format_value(Some(x))),
            );
            record.extend(table.columns().iter().map(|c| format_value(c.values()[i])));

            writer
                .write_record(&record)
                .map_err(|e| Error::output(format!("cannot write row {i}: {e}")))?;
        }

        writer
            .flush()
            .map_err(|e| Error::output(format!("cannot flush output: {e}")))?;
        Ok(())
    }

    /// Write to a file, creating parent directories as needed.
    ///
    /// Rows go to a temporary file beside `path`, renamed into place only
    /// once fully written; on failure `path` is left untouched.
    pub fn write_path(&self, table: &FeatureTable, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::output(format!("cannot create directory {}: {e}", parent.display()))
                })?;
                parent
            }
            None => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| {
            Error::output(format!("cannot create temporary file in {}: {e}", dir.display()))
        })?;
        self.write(table, tmp.as_file_mut())?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| Error::output(format!("cannot sync output: {e}")))?;
        tmp.persist(path)
            .map_err(|e| Error::output(format!("cannot replace {}: {}", path.display(), e.error)))?;

        tracing::info!(
            path = %path.display(),
            rows = table.len(),
            columns = table.column_names().len(),
            "wrote feature table"
        );
        Ok(())
    }
}

impl Default for CsvTableWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a comma-delimited table to a file.
pub fn write_table_path(table: &FeatureTable, path: impl AsRef<Path>) -> Result<()> {
    CsvTableWriter::new().write_path(table, path)
}
