//! Feature pipeline.
//!
//! Combines all stages into a single pass over the table: indicators,
//! lag/rolling, calendar, normalization, target, then row sanitization.

use crate::{
    calendar::CalendarExtractor,
    indicators::IndicatorEngine,
    lag_rolling::LagRollingGenerator,
    normalize::Normalizer,
    sanitize::RowSanitizer,
    target::TargetLabeler,
    transform::Transform,
};
use predictor_core::{is_base_column, Config, Error, FeatureTable, Result, TIMESTAMP};
use std::collections::HashMap;
use std::time::Instant;

/// Ordered set of transform stages built from a configuration.
pub struct FeaturePipeline {
    stages: Vec<Box<dyn Transform>>,
}

impl FeaturePipeline {
    /// Validate the configuration and build the stages.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut stages: Vec<Box<dyn Transform>> = vec![
            Box::new(IndicatorEngine::new(&config.indicators)),
            Box::new(LagRollingGenerator::new(&config.lag_rolling)),
        ];
        if config.calendar.enabled {
            stages.push(Box::new(CalendarExtractor::new()));
        }
        if !config.normalize.columns.is_empty() {
            stages.push(Box::new(Normalizer::new(&config.normalize.columns)));
        }
        stages.push(Box::new(TargetLabeler::new(&config.target)));
        stages.push(Box::new(RowSanitizer::new()));

        Ok(Self { stages })
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Output schema for an input with the given columns.
    ///
    /// Fails with [`Error::Input`] if a stage reads a column that neither the
    /// input nor an earlier stage provides, or writes a base column or a
    /// column another stage already derives. A derived column may replace an
    /// extra input column of the same name.
    pub fn planned_columns(&self, input_columns: &[String]) -> Result<Vec<String>> {
        let mut columns = input_columns.to_vec();
        let mut derived: HashMap<String, &'static str> = HashMap::new();

        for stage in &self.stages {
            for required in stage.required_columns() {
                if !columns.contains(&required) {
                    return Err(Error::input(format!(
                        "stage '{}' needs column '{}', which is not available",
                        stage.name(),
                        required
                    )));
                }
                if required == TIMESTAMP && stage.name() != "calendar" {
                    return Err(Error::input(format!(
                        "stage '{}' cannot use non-numeric column '{TIMESTAMP}'",
                        stage.name()
                    )));
                }
            }
            for output in stage.output_columns() {
                if is_base_column(&output) {
                    return Err(Error::input(format!(
                        "stage '{}' cannot write base column '{output}'",
                        stage.name()
                    )));
                }
                if let Some(owner) = derived.insert(output.clone(), stage.name()) {
                    return Err(Error::input(format!(
                        "stage '{}' writes column '{output}', already derived by '{owner}'",
                        stage.name()
                    )));
                }
                if !columns.contains(&output) {
                    columns.push(output);
                }
            }
        }

        Ok(columns)
    }

    /// Run every stage over the table and return the sanitized result.
    pub fn run(&self, mut table: FeatureTable) -> Result<FeatureTable> {
        if table.is_empty() {
            return Err(Error::input("input table is empty"));
        }
        let planned = self.planned_columns(&table.column_names())?;
        let input_rows = table.len();

        for stage in &self.stages {
            let started = Instant::now();
            stage.apply(&mut table)?;
            tracing::debug!(
                stage = stage.name(),
                rows = table.len(),
                columns = table.columns().len(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "stage complete"
            );
        }

        debug_assert_eq!(table.column_names(), planned);
        tracing::info!(
            input_rows,
            output_rows = table.len(),
            columns = planned.len(),
            "feature pipeline complete"
        );
        Ok(table)
    }
}

/// Build the feature table for `table` under `config`.
pub fn build_features(table: FeatureTable, config: &Config) -> Result<FeatureTable> {
    FeaturePipeline::new(config)?.run(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use predictor_core::config::LagSpec;
    use predictor_core::Candle;

    fn make_table(closes: &[f64]) -> FeatureTable {
        FeatureTable::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| {
                    Candle::new(format!("2024-01-01 {:02}:00:00", i), c, c + 1.0, c - 1.0, c, 10.0)
                })
                .collect(),
        )
    }

    /// Only an SMA of the given window, plus the target.
    fn sma_only(window: usize) -> Config {
        let mut config = Config::default();
        config.indicators.sma_windows = vec![window];
        config.indicators.ema_spans.clear();
        config.indicators.bollinger.enabled = false;
        config.indicators.rsi.enabled = false;
        config.indicators.macd.enabled = false;
        config.indicators.atr.enabled = false;
        config.lag_rolling.lags.clear();
        config.lag_rolling.rolling.clear();
        config.calendar.enabled = false;
        config.normalize.columns.clear();
        config
    }

    #[test]
    fn test_reference_scenario() {
        let table = make_table(&[100.0, 102.0, 101.0, 105.0, 107.0]);
        let out = build_features(table, &sma_only(3)).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out.closes(), vec![101.0, 105.0]);
        assert_eq!(
            out.timestamps().collect::<Vec<_>>(),
            vec!["2024-01-01 02:00:00", "2024-01-01 03:00:00"]
        );

        let sma = out.column("sma_3").unwrap().values();
        assert_relative_eq!(sma[0].unwrap(), 101.0, epsilon = 1e-9);
        assert_relative_eq!(sma[1].unwrap(), 102.667, epsilon = 1e-3);
        assert_eq!(out.column("target").unwrap().values(), &[Some(1.0), Some(1.0)]);
    }

    #[test]
    fn test_default_stage_order() {
        let pipeline = FeaturePipeline::new(&Config::default()).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["indicators", "lag_rolling", "calendar", "normalize", "target", "sanitize"]
        );
    }

    #[test]
    fn test_planned_columns_default() {
        let pipeline = FeaturePipeline::new(&Config::default()).unwrap();
        let input: Vec<String> = predictor_core::REQUIRED_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .collect();
        let columns = pipeline.planned_columns(&input).unwrap();

        assert_eq!(&columns[..6], &input[..]);
        assert_eq!(columns[6], "sma_20");
        assert_eq!(columns.last().map(String::as_str), Some("target"));
        assert!(columns.contains(&"close_lag_3".to_string()));
        assert!(columns.contains(&"close_norm".to_string()));
        assert!(columns.contains(&"week_of_year".to_string()));
        assert_eq!(columns.len(), 6 + 10 + 9 + 3 + 1 + 1);
    }

    #[test]
    fn test_lag_of_indicator_column() {
        let mut config = sma_only(2);
        config.lag_rolling.lags = vec![LagSpec {
            column: "sma_2".to_string(),
            lags: vec![1],
        }];
        let out = build_features(make_table(&[1.0, 2.0, 3.0, 4.0, 5.0]), &config).unwrap();

        // sma_2 starts at row 1, its lag at row 2; the last row has no target.
        assert_eq!(out.closes(), vec![3.0, 4.0]);
        assert_eq!(out.column("sma_2_lag_1").unwrap().values(), &[Some(1.5), Some(2.5)]);
    }

    #[test]
    fn test_unknown_source_fails_before_any_stage() {
        let mut config = sma_only(2);
        config.normalize.columns = vec!["target".to_string(), "vwap".to_string()];
        let err = build_features(make_table(&[1.0, 2.0, 3.0]), &config).unwrap_err();
        match err {
            Error::Input(msg) => assert!(msg.contains("target")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_timestamp_not_numeric_source() {
        let mut config = sma_only(2);
        config.normalize.columns = vec!["timestamp".to_string()];
        let err = build_features(make_table(&[1.0, 2.0, 3.0]), &config).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_target_clashing_with_indicator_rejected() {
        let mut config = Config::default();
        config.target.column = "rsi".to_string();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.6).sin()).collect();

        let err = build_features(make_table(&closes), &config).unwrap_err();
        match err {
            Error::Input(msg) => {
                assert!(msg.contains("'rsi'"));
                assert!(msg.contains("indicators"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_target_on_base_column_rejected_at_preflight() {
        let mut config = sma_only(2);
        config.target.column = "close".to_string();
        let pipeline = FeaturePipeline::new(&config).unwrap();

        let input: Vec<String> = predictor_core::REQUIRED_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(matches!(pipeline.planned_columns(&input), Err(Error::Input(_))));

        let err = pipeline.run(make_table(&[1.0, 2.0, 3.0])).unwrap_err();
        match err {
            Error::Input(msg) => {
                assert!(msg.contains("stage 'target' cannot write base column"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_window_rejected() {
        let mut config = sma_only(2);
        config.indicators.sma_windows = vec![2, 2];
        let err = build_features(make_table(&[1.0, 2.0, 3.0]), &config).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_derived_column_replaces_extra_input_column() {
        let mut table = make_table(&[1.0, 2.0, 3.0, 4.0]);
        table.set_column("sma_2", vec![Some(0.0); 4]).unwrap();

        let out = build_features(table, &sma_only(2)).unwrap();
        assert_eq!(out.column_names()[6], "sma_2");
        assert_eq!(out.column("sma_2").unwrap().values(), &[Some(1.5), Some(2.5)]);
    }

    #[test]
    fn test_empty_table_rejected() {
        let err = build_features(FeatureTable::default(), &Config::default()).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.indicators.rsi.window = 0;
        assert!(matches!(FeaturePipeline::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_calendar_parse_error_surfaces() {
        let mut table = make_table(&[1.0, 2.0, 3.0]);
        let mut candles = table.candles().to_vec();
        candles[1].timestamp = "31/01/2024".to_string();
        table = FeatureTable::new(candles);

        let mut config = sma_only(2);
        config.calendar.enabled = true;
        let err = build_features(table, &config).unwrap_err();
        assert!(matches!(err, Error::Parse { row: 1, .. }));
    }
}
