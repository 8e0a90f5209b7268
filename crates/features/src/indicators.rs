//! Technical indicator engine.
//!
//! Computes moving averages, Bollinger Bands, RSI, MACD and ATR from the
//! close/high/low history. Every value at row i depends only on rows 0..=i.

use crate::rolling::{ema, rolling_mean, rolling_std, to_values};
use crate::transform::Transform;
use predictor_core::config::IndicatorConfig;
use predictor_core::{defined, Candle, FeatureTable, Result, Value};

/// MACD line with its component EMAs and signal line.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    /// Fast EMA of close.
    pub ema_short: Vec<f64>,
    /// Slow EMA of close.
    pub ema_long: Vec<f64>,
    /// `ema_short - ema_long`.
    pub macd: Vec<f64>,
    /// EMA of the MACD line.
    pub signal: Vec<f64>,
}

/// Compute MACD. Defined from the first row since every EMA seeds at row 0.
pub fn macd(closes: &[f64], short_span: usize, long_span: usize, signal_span: usize) -> MacdSeries {
    let ema_short = ema(closes, short_span);
    let ema_long = ema(closes, long_span);
    let macd: Vec<f64> = ema_short
        .iter()
        .zip(&ema_long)
        .map(|(s, l)| s - l)
        .collect();
    let signal = ema(&macd, signal_span);

    MacdSeries {
        ema_short,
        ema_long,
        macd,
        signal,
    }
}

/// Bollinger Bands as `(high_band, low_band)`.
///
/// `SMA(window) ± num_std * rolling_std(window)`, undefined during warm-up.
pub fn bollinger_bands(closes: &[f64], window: usize, num_std: f64) -> (Vec<Value>, Vec<Value>) {
    let values = to_values(closes);
    let mid = rolling_mean(&values, window);
    let std = rolling_std(&values, window);

    mid.iter()
        .zip(&std)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => (defined(m + num_std * s), defined(m - num_std * s)),
            _ => (None, None),
        })
        .unzip()
}

/// Relative strength index from trailing mean gain and loss.
///
/// The first row has no previous close and contributes a zero delta. When
/// the average loss over the window is zero the ratio is unbounded and the
/// cell is left undefined.
pub fn rsi(closes: &[f64], window: usize) -> Vec<Value> {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        let delta = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
        gains.push(Some(delta.max(0.0)));
        losses.push(Some((-delta).max(0.0)));
    }

    let avg_gain = rolling_mean(&gains, window);
    let avg_loss = rolling_mean(&losses, window);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(g), Some(l)) if l > 0.0 => defined(100.0 - 100.0 / (1.0 + g / l)),
            _ => None,
        })
        .collect()
}

/// Average true range: trailing mean of the true range.
pub fn atr(candles: &[Candle], window: usize) -> Vec<Value> {
    let true_ranges: Vec<Value> = candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let prev_close = i.checked_sub(1).map(|p| candles[p].close);
            defined(c.true_range(prev_close))
        })
        .collect();
    rolling_mean(&true_ranges, window)
}

/// Appends indicator columns to the table.
pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl IndicatorEngine {
    /// Create an engine from configuration.
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl Transform for IndicatorEngine {
    fn name(&self) -> &'static str {
        "indicators"
    }

    fn output_columns(&self) -> Vec<String> {
        let cfg = &self.config;
        let mut columns: Vec<String> = cfg.sma_windows.iter().map(|w| format!("sma_{w}")).collect();
        columns.extend(cfg.ema_spans.iter().map(|s| format!("ema_{s}")));
        if cfg.bollinger.enabled {
            columns.extend(["bb_high".to_string(), "bb_low".to_string()]);
        }
        if cfg.rsi.enabled {
            columns.push("rsi".to_string());
        }
        if cfg.macd.enabled {
            columns.extend(
                ["ema_short", "ema_long", "macd", "macd_signal"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        }
        if cfg.atr.enabled {
            columns.push("atr".to_string());
        }
        columns
    }

    fn apply(&self, table: &mut FeatureTable) -> Result<()> {
        let cfg = &self.config;
        let closes = table.closes();
        let close_values = to_values(&closes);

        for &w in &cfg.sma_windows {
            table.set_column(format!("sma_{w}"), rolling_mean(&close_values, w))?;
        }
        for &s in &cfg.ema_spans {
            table.set_column(format!("ema_{s}"), to_values(&ema(&closes, s)))?;
        }

        if cfg.bollinger.enabled {
            let (high, low) = bollinger_bands(&closes, cfg.bollinger.window, cfg.bollinger.num_std);
            table.set_column("bb_high", high)?;
            table.set_column("bb_low", low)?;
        }

        if cfg.rsi.enabled {
            table.set_column("rsi", rsi(&closes, cfg.rsi.window))?;
        }

        if cfg.macd.enabled {
            let m = macd(
                &closes,
                cfg.macd.short_span,
                cfg.macd.long_span,
                cfg.macd.signal_span,
            );
            table.set_column("ema_short", to_values(&m.ema_short))?;
            table.set_column("ema_long", to_values(&m.ema_long))?;
            table.set_column("macd", to_values(&m.macd))?;
            table.set_column("macd_signal", to_values(&m.signal))?;
        }

        if cfg.atr.enabled {
            let atr = atr(table.candles(), cfg.atr.window);
            table.set_column("atr", atr)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let ts = format!("2024-01-01 {:02}:00:00", i % 24);
                Candle::new(ts, c, c + 1.0, c - 1.0, c, 100.0)
            })
            .collect()
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 10.0 * (i as f64 * 0.5).sin() + 0.1 * i as f64)
            .collect()
    }

    #[test]
    fn test_macd_matches_component_emas() {
        let closes = wave(60);
        let m = macd(&closes, 12, 26, 9);

        assert_eq!(m.macd[0], 0.0);
        assert_eq!(m.signal[0], 0.0);
        for i in 0..closes.len() {
            assert_relative_eq!(m.macd[i], m.ema_short[i] - m.ema_long[i], epsilon = 1e-12);
        }
        for i in 1..closes.len() {
            let expected = m.signal[i - 1] + 0.2 * (m.macd[i] - m.signal[i - 1]);
            assert_relative_eq!(m.signal[i], expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_bollinger_symmetric_around_sma() {
        let closes = wave(40);
        let (high, low) = bollinger_bands(&closes, 20, 2.0);
        let sma = rolling_mean(&to_values(&closes), 20);

        assert!(high[..19].iter().all(|v| v.is_none()));
        assert!(low[..19].iter().all(|v| v.is_none()));
        for i in 19..closes.len() {
            let (h, l, m) = (high[i].unwrap(), low[i].unwrap(), sma[i].unwrap());
            assert!(h > l);
            assert_relative_eq!((h + l) / 2.0, m, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_bollinger_flat_prices_collapse() {
        let closes = vec![50.0; 5];
        let (high, low) = bollinger_bands(&closes, 3, 2.0);
        assert_relative_eq!(high[4].unwrap(), 50.0);
        assert_relative_eq!(low[4].unwrap(), 50.0);
    }

    #[test]
    fn test_rsi_known_value() {
        // Deltas over the last 3 rows: +2, -1, +4 -> avg gain 2, avg loss 1/3.
        let closes = [100.0, 102.0, 101.0, 105.0];
        let out = rsi(&closes, 3);

        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        // Window at row 2 holds the zero first delta, +2 and -1.
        let expected = |gain: f64, loss: f64| 100.0 - 100.0 / (1.0 + gain / loss);
        assert_relative_eq!(out[2].unwrap(), expected(2.0 / 3.0, 1.0 / 3.0), epsilon = 1e-10);
        assert_relative_eq!(out[3].unwrap(), expected(2.0, 1.0 / 3.0), epsilon = 1e-10);
    }

    #[test]
    fn test_rsi_zero_loss_is_undefined() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0, 4.5];
        let out = rsi(&closes, 3);
        assert_eq!(out[2], None);
        assert_eq!(out[3], None);
        assert_eq!(out[4], None);
        // The drop at row 5 brings a loss into the window.
        assert!(out[5].is_some());
    }

    #[test]
    fn test_rsi_bounds() {
        let closes = wave(200);
        for value in rsi(&closes, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_atr_uses_previous_close() {
        let candles = vec![
            Candle::new("a", 10.0, 11.0, 9.0, 10.0, 1.0),
            Candle::new("b", 14.0, 15.0, 13.0, 14.0, 1.0),
            Candle::new("c", 14.0, 14.5, 13.5, 14.0, 1.0),
        ];
        // True ranges: 2 (high-low), 5 (high - prev close), 1.
        let out = atr(&candles, 2);
        assert_eq!(out[0], None);
        assert_relative_eq!(out[1].unwrap(), 3.5);
        assert_relative_eq!(out[2].unwrap(), 3.0);
    }

    #[test]
    fn test_engine_columns_match_schema() {
        let engine = IndicatorEngine::new(&IndicatorConfig::default());
        let mut table = FeatureTable::new(make_candles(&wave(50)));
        engine.apply(&mut table).unwrap();

        let derived: Vec<String> = table.columns().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(derived, engine.output_columns());
        assert_eq!(
            derived,
            vec![
                "sma_20", "ema_20", "bb_high", "bb_low", "rsi", "ema_short", "ema_long", "macd",
                "macd_signal", "atr"
            ]
        );
    }

    #[test]
    fn test_engine_warmup_lengths() {
        let engine = IndicatorEngine::new(&IndicatorConfig::default());
        let mut table = FeatureTable::new(make_candles(&wave(50)));
        engine.apply(&mut table).unwrap();

        let leading_undefined = |name: &str| {
            table
                .column(name)
                .unwrap()
                .values()
                .iter()
                .take_while(|v| v.is_none())
                .count()
        };
        assert_eq!(leading_undefined("sma_20"), 19);
        assert_eq!(leading_undefined("bb_high"), 19);
        assert_eq!(leading_undefined("rsi"), 13);
        assert_eq!(leading_undefined("atr"), 13);
        assert_eq!(leading_undefined("ema_20"), 0);
        assert_eq!(leading_undefined("macd_signal"), 0);

        let ema = table.column("ema_20").unwrap().values();
        assert_eq!(ema[0], Some(table.closes()[0]));
    }

    #[test]
    fn test_disabled_indicators_add_nothing() {
        let mut config = IndicatorConfig::default();
        config.sma_windows.clear();
        config.ema_spans.clear();
        config.bollinger.enabled = false;
        config.rsi.enabled = false;
        config.macd.enabled = false;
        config.atr.enabled = false;

        let engine = IndicatorEngine::new(&config);
        let mut table = FeatureTable::new(make_candles(&wave(5)));
        engine.apply(&mut table).unwrap();
        assert!(engine.output_columns().is_empty());
        assert!(table.columns().is_empty());
    }
}
