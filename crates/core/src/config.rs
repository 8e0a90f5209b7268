//! Configuration structures for the feature pipeline.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Technical indicator configuration.
    pub indicators: IndicatorConfig,
    /// Lag and rolling-window features.
    pub lag_rolling: LagRollingConfig,
    /// Calendar features.
    pub calendar: CalendarConfig,
    /// Z-score normalization.
    pub normalize: NormalizeConfig,
    /// Target label.
    pub target: TargetConfig,
}

/// Indicator Engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Windows for `sma_{w}` columns.
    pub sma_windows: Vec<usize>,
    /// Spans for `ema_{s}` columns.
    pub ema_spans: Vec<usize>,
    /// Bollinger Bands.
    pub bollinger: BollingerConfig,
    /// Relative strength index.
    pub rsi: RsiConfig,
    /// MACD and its signal line.
    pub macd: MacdConfig,
    /// Average true range.
    pub atr: AtrConfig,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_windows: vec![20],
            ema_spans: vec![20],
            bollinger: BollingerConfig::default(),
            rsi: RsiConfig::default(),
            macd: MacdConfig::default(),
            atr: AtrConfig::default(),
        }
    }
}

/// Bollinger Bands parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerConfig {
    pub enabled: bool,
    /// SMA / std window.
    pub window: usize,
    /// Band width in standard deviations.
    pub num_std: f64,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: 20,
            num_std: 2.0,
        }
    }
}

/// RSI parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    pub enabled: bool,
    /// Averaging window for gains and losses.
    pub window: usize,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: 14,
        }
    }
}

/// MACD parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdConfig {
    pub enabled: bool,
    /// Fast EMA span.
    pub short_span: usize,
    /// Slow EMA span.
    pub long_span: usize,
    /// Signal line EMA span.
    pub signal_span: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            short_span: 12,
            long_span: 26,
            signal_span: 9,
        }
    }
}

/// ATR parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtrConfig {
    pub enabled: bool,
    /// True range averaging window.
    pub window: usize,
}

impl Default for AtrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: 14,
        }
    }
}

/// Lags to generate for one source column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagSpec {
    pub column: String,
    pub lags: Vec<usize>,
}

/// Rolling windows to generate for one source column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingSpec {
    pub column: String,
    pub windows: Vec<usize>,
}

/// Lag/Rolling Generator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LagRollingConfig {
    pub lags: Vec<LagSpec>,
    pub rolling: Vec<RollingSpec>,
}

impl Default for LagRollingConfig {
    fn default() -> Self {
        Self {
            lags: vec![LagSpec {
                column: "close".to_string(),
                lags: vec![1, 2, 3],
            }],
            rolling: vec![RollingSpec {
                column: "close".to_string(),
                windows: vec![5, 10, 20],
            }],
        }
    }
}

/// Calendar Feature Extractor parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub enabled: bool,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Normalizer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Columns to z-score; each produces `{column}_norm`.
    pub columns: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            columns: vec!["close".to_string()],
        }
    }
}

/// Target Labeler parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Output column name.
    pub column: String,
    /// Rows ahead compared against the current close.
    pub horizon: usize,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            column: "target".to_string(),
            horizon: 1,
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text. Missing fields take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Check every window, span and name.
    pub fn validate(&self) -> Result<()> {
        let ind = &self.indicators;
        for &w in &ind.sma_windows {
            positive("indicators.sma_windows", w)?;
        }
        for &s in &ind.ema_spans {
            positive("indicators.ema_spans", s)?;
        }
        if ind.bollinger.enabled {
            positive("indicators.bollinger.window", ind.bollinger.window)?;
            if !ind.bollinger.num_std.is_finite() {
                return Err(Error::config("indicators.bollinger.num_std must be finite"));
            }
        }
        if ind.rsi.enabled {
            positive("indicators.rsi.window", ind.rsi.window)?;
        }
        if ind.macd.enabled {
            positive("indicators.macd.short_span", ind.macd.short_span)?;
            positive("indicators.macd.long_span", ind.macd.long_span)?;
            positive("indicators.macd.signal_span", ind.macd.signal_span)?;
        }
        if ind.atr.enabled {
            positive("indicators.atr.window", ind.atr.window)?;
        }

        for spec in &self.lag_rolling.lags {
            non_empty("lag_rolling.lags.column", &spec.column)?;
            for &l in &spec.lags {
                positive("lag_rolling.lags.lags", l)?;
            }
        }
        for spec in &self.lag_rolling.rolling {
            non_empty("lag_rolling.rolling.column", &spec.column)?;
            for &w in &spec.windows {
                positive("lag_rolling.rolling.windows", w)?;
            }
        }
        for column in &self.normalize.columns {
            non_empty("normalize.columns", column)?;
        }
        non_empty("target.column", &self.target.column)?;
        positive("target.horizon", self.target.horizon)?;
        Ok(())
    }

    /// Largest number of leading rows left undefined by the configured
    /// windows, assuming lag/rolling sources are fully defined columns.
    ///
    /// Together with the target horizon this gives the expected output
    /// length: `input_rows - warmup_rows() - target.horizon`.
    pub fn warmup_rows(&self) -> usize {
        let ind = &self.indicators;
        let mut warmups: Vec<usize> = ind.sma_windows.iter().map(|w| w.saturating_sub(1)).collect();
        if ind.bollinger.enabled {
            warmups.push(ind.bollinger.window.saturating_sub(1));
        }
        if ind.rsi.enabled {
            warmups.push(ind.rsi.window.saturating_sub(1));
        }
        if ind.atr.enabled {
            warmups.push(ind.atr.window.saturating_sub(1));
        }
        for spec in &self.lag_rolling.lags {
            warmups.extend(spec.lags.iter().copied());
        }
        for spec in &self.lag_rolling.rolling {
            warmups.extend(spec.windows.iter().map(|w| w.saturating_sub(1)));
        }
        warmups.into_iter().max().unwrap_or(0)
    }
}

fn positive(field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(Error::config(format!("{field} must be >= 1")));
    }
    Ok(())
}

fn non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::config(format!("{field} must not be empty")));
    }
    Ok(())
}
