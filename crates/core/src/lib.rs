//! Core types and configuration for the OHLCV feature pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Candle records and the feature table
//! - Pipeline configuration
//! - Common error types

pub mod config;
pub mod error;
pub mod table;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use table::{Column, FeatureTable};
pub use types::*;
