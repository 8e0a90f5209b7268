//! Table ingestion and persistence for the feature pipeline.
//!
//! This crate handles the I/O boundary:
//! - Reading delimited OHLCV tables with required-column validation
//! - Writing feature tables with a stable, reproducible layout

pub mod reader;
pub mod writer;

pub use reader::CsvTableReader;
pub use writer::{format_value, write_table_path, CsvTableWriter};
