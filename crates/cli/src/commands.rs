//! Subcommand implementations.

use anyhow::{bail, Context, Result};
use predictor_core::{Config, REQUIRED_COLUMNS};
use predictor_features::FeaturePipeline;
use predictor_ingestion::{CsvTableReader, CsvTableWriter};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// Machine-readable record of one `build` run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub input_rows: usize,
    pub output_rows: usize,
    pub dropped_rows: usize,
    pub warmup_rows: usize,
    pub columns: Vec<String>,
}

/// Load a config file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Convert a delimiter argument to a byte.
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character, got '{delimiter}'");
    }
    Ok(delimiter as u8)
}

/// Read, transform and write one table.
pub fn build(
    input: &Path,
    output: &Path,
    config: &Config,
    summary: Option<&Path>,
    delimiter: u8,
) -> Result<RunSummary> {
    let pipeline = FeaturePipeline::new(config).context("Invalid pipeline configuration")?;

    let table = CsvTableReader::new()
        .with_delimiter(delimiter)
        .read_path(input)
        .with_context(|| format!("Failed to read input table: {}", input.display()))?;
    let input_rows = table.len();

    let features = pipeline.run(table).context("Feature pipeline failed")?;

    CsvTableWriter::new()
        .with_delimiter(delimiter)
        .write_path(&features, output)
        .with_context(|| format!("Failed to write feature table: {}", output.display()))?;

    let run = RunSummary {
        input_rows,
        output_rows: features.len(),
        dropped_rows: input_rows - features.len(),
        warmup_rows: config.warmup_rows(),
        columns: features.column_names(),
    };

    if let Some(path) = summary {
        let file = File::create(path)
            .with_context(|| format!("Failed to create summary file: {}", path.display()))?;
        serde_json::to_writer_pretty(file, &run).context("Failed to write run summary")?;
    }

    Ok(run)
}

/// Planned output columns, from an input header or the bare OHLCV schema.
pub fn columns(config: &Config, input: Option<&Path>, delimiter: u8) -> Result<Vec<String>> {
    let pipeline = FeaturePipeline::new(config).context("Invalid pipeline configuration")?;
    let input_columns = match input {
        Some(path) => CsvTableReader::new()
            .with_delimiter(delimiter)
            .read_columns_path(path)
            .with_context(|| format!("Failed to read header: {}", path.display()))?,
        None => REQUIRED_COLUMNS.iter().map(|s| s.to_string()).collect(),
    };
    Ok(pipeline.planned_columns(&input_columns)?)
}
