//! Core data types for the feature pipeline.

use serde::{Deserialize, Serialize};

/// A single table cell.
///
/// `None` is the undefined state: warm-up positions, zero-variance
/// normalization, zero-loss RSI. It is resolved only by the row sanitizer.
pub type Value = Option<f64>;

/// Name of the timestamp column.
pub const TIMESTAMP: &str = "timestamp";
/// Name of the open price column.
pub const OPEN: &str = "open";
/// Name of the high price column.
pub const HIGH: &str = "high";
/// Name of the low price column.
pub const LOW: &str = "low";
/// Name of the close price column.
pub const CLOSE: &str = "close";
/// Name of the volume column.
pub const VOLUME: &str = "volume";

/// Columns every input table must carry, in output order.
pub const REQUIRED_COLUMNS: [&str; 6] = [TIMESTAMP, OPEN, HIGH, LOW, CLOSE, VOLUME];

/// Numeric base columns of a candle.
pub const PRICE_COLUMNS: [&str; 5] = [OPEN, HIGH, LOW, CLOSE, VOLUME];

/// Wrap a computed float as a cell, mapping NaN and infinities to undefined.
#[inline]
pub fn defined(x: f64) -> Value {
    if x.is_finite() {
        Some(x)
    } else {
        None
    }
}

/// One OHLCV record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Timestamp exactly as it appeared in the input.
    pub timestamp: String,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Traded volume.
    pub volume: f64,
}

impl Candle {
    /// Create a candle.
    pub fn new(
        timestamp: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Numeric field by base column name.
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            OPEN => Some(self.open),
            HIGH => Some(self.high),
            LOW => Some(self.low),
            CLOSE => Some(self.close),
            VOLUME => Some(self.volume),
            _ => None,
        }
    }

    /// True range against the previous close.
    ///
    /// Without a previous close this is the plain high-low range.
    #[inline]
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let range = self.high - self.low;
        match prev_close {
            Some(pc) => range
                .max((self.high - pc).abs())
                .max((self.low - pc).abs()),
            None => range,
        }
    }
}

/// Whether a column name belongs to the fixed OHLCV schema.
pub fn is_base_column(name: &str) -> bool {
    REQUIRED_COLUMNS.contains(&name)
}
