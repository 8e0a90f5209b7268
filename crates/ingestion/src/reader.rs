//! Delimited input reader.
//!
//! Reads an OHLCV table with a header row into a [`FeatureTable`]. Required
//! columns may appear in any order; any other column is carried through as
//! a numeric extra column.

use predictor_core::{
    defined, Candle, Column, Error, FeatureTable, Result, Value, CLOSE, HIGH, LOW, OPEN,
    REQUIRED_COLUMNS, TIMESTAMP, VOLUME,
};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Positions of the required columns within a header.
#[derive(Debug, Clone, Copy)]
struct BaseIndices {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

/// Validated header layout.
#[derive(Debug, Clone)]
struct Layout {
    base: BaseIndices,
    /// (position, name) of every non-required column, in input order.
    extras: Vec<(usize, String)>,
}

impl Layout {
    fn from_header(header: &[String]) -> Result<Self> {
        let mut seen = HashSet::new();
        for name in header {
            if !seen.insert(name.as_str()) {
                return Err(Error::input(format!("duplicate column '{name}' in header")));
            }
        }

        let position = |name: &str| header.iter().position(|h| h == name);
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| position(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::input(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        // All present, checked above.
        let at = |name: &str| position(name).unwrap_or_default();
        let base = BaseIndices {
            timestamp: at(TIMESTAMP),
            open: at(OPEN),
            high: at(HIGH),
            low: at(LOW),
            close: at(CLOSE),
            volume: at(VOLUME),
        };
        let extras = header
            .iter()
            .enumerate()
            .filter(|(_, name)| !REQUIRED_COLUMNS.contains(&name.as_str()))
            .map(|(i, name)| (i, name.clone()))
            .collect();

        Ok(Self { base, extras })
    }
}

/// Reader for delimited OHLCV tables.
#[derive(Debug, Clone)]
pub struct CsvTableReader {
    delimiter: u8,
}

impl CsvTableReader {
    /// Create a comma-delimited reader.
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Use a different field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder.delimiter(self.delimiter).has_headers(true);
        builder
    }

    /// Read the full table.
    ///
    /// Fails with [`Error::Input`] when required columns are missing, the
    /// table has no rows, or a numeric cell does not parse.
    pub fn read<R: Read>(&self, source: R) -> Result<FeatureTable> {
        let mut reader = self.builder().from_reader(source);
        let header = read_header_names(&mut reader)?;
        let layout = Layout::from_header(&header)?;

        let mut candles = Vec::new();
        let mut extra_values: Vec<Vec<Value>> = vec![Vec::new(); layout.extras.len()];

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| Error::input(format!("row {row}: {e}")))?;
            let cell = |i: usize| record.get(i).unwrap_or("").trim();
            let number = |i: usize, name: &str| parse_required(cell(i), name, row);

            let b = layout.base;
            candles.push(Candle {
                timestamp: cell(b.timestamp).to_string(),
                open: number(b.open, OPEN)?,
                high: number(b.high, HIGH)?,
                low: number(b.low, LOW)?,
                close: number(b.close, CLOSE)?,
                volume: number(b.volume, VOLUME)?,
            });

            for ((i, name), values) in layout.extras.iter().zip(extra_values.iter_mut()) {
                values.push(parse_optional(cell(*i), name, row)?);
            }
        }

        if candles.is_empty() {
            return Err(Error::input("input table is empty"));
        }

        let columns = layout
            .extras
            .into_iter()
            .zip(extra_values)
            .map(|((_, name), values)| Column::new(name, values))
            .collect();
        let table = FeatureTable::with_columns(candles, columns)?;

        tracing::debug!(
            rows = table.len(),
            extra_columns = table.columns().len(),
            "read input table"
        );
        Ok(table)
    }

    /// Read the full table from a file.
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<FeatureTable> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::input(format!("cannot open {}: {e}", path.display())))?;
        let table = self.read(file)?;
        tracing::info!(path = %path.display(), rows = table.len(), "loaded input table");
        Ok(table)
    }

    /// Read and validate only the header of a file.
    ///
    /// Returns the column names in table schema order: required columns
    /// first, then extras in input order.
    pub fn read_columns_path(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::input(format!("cannot open {}: {e}", path.display())))?;
        let mut reader = self.builder().from_reader(file);
        let header = read_header_names(&mut reader)?;
        let layout = Layout::from_header(&header)?;
        Ok(REQUIRED_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .chain(layout.extras.into_iter().map(|(_, name)| name))
            .collect())
    }
}

impl Default for CsvTableReader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_header_names<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<String>> {
    let header = reader
        .headers()
        .map_err(|e| Error::input(format!("cannot read header: {e}")))?;
    Ok(header.iter().map(|h| h.trim().to_string()).collect())
}

fn parse_required(field: &str, column: &str, row: usize) -> Result<f64> {
    match field.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(x),
        _ => Err(Error::input(format!(
            "row {row}, column '{column}': expected a finite number, found '{field}'"
        ))),
    }
}

fn parse_optional(field: &str, column: &str, row: usize) -> Result<Value> {
    if field.is_empty() {
        return Ok(None);
    }
    field.parse::<f64>().map(defined).map_err(|_| {
        Error::input(format!(
            "row {row}, column '{column}': expected a number or empty cell, found '{field}'"
        ))
    })
}
