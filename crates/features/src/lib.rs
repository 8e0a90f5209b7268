//! Feature derivation for the OHLCV pipeline.
//!
//! This crate handles:
//! - Technical indicators (SMA, EMA, Bollinger Bands, RSI, MACD, ATR)
//! - Lag and rolling mean/std features
//! - Calendar features from timestamps
//! - Z-score normalization
//! - Direction target labels
//! - Removal of rows left incomplete by warm-up windows

pub mod rolling;
pub mod transform;
pub mod indicators;
pub mod lag_rolling;
pub mod calendar;
pub mod normalize;
pub mod target;
pub mod sanitize;
pub mod pipeline;

pub use transform::Transform;
pub use indicators::IndicatorEngine;
pub use lag_rolling::LagRollingGenerator;
pub use calendar::CalendarExtractor;
pub use normalize::Normalizer;
pub use target::TargetLabeler;
pub use sanitize::RowSanitizer;
pub use pipeline::{build_features, FeaturePipeline};
