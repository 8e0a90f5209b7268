//! Lag and rolling-window feature generation.

use crate::rolling::{rolling_mean, rolling_std, shift};
use crate::transform::Transform;
use predictor_core::config::LagRollingConfig;
use predictor_core::{Error, FeatureTable, Result, Value};

/// Name of the lag column for `column` shifted by `lag` rows.
pub fn lag_column_name(column: &str, lag: usize) -> String {
    format!("{column}_lag_{lag}")
}

/// Names of the rolling mean and std columns for `column` over `window`.
pub fn rolling_column_names(column: &str, window: usize) -> (String, String) {
    (
        format!("{column}_roll_mean_{window}"),
        format!("{column}_roll_std_{window}"),
    )
}

/// Appends lag and rolling mean/std columns for configured source columns.
pub struct LagRollingGenerator {
    config: LagRollingConfig,
}

impl LagRollingGenerator {
    /// Create a generator from configuration.
    pub fn new(config: &LagRollingConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn source(table: &FeatureTable, column: &str) -> Result<Vec<Value>> {
        table
            .series(column)
            .ok_or_else(|| Error::input(format!("unknown source column '{column}'")))
    }
}

impl Transform for LagRollingGenerator {
    fn name(&self) -> &'static str {
        "lag_rolling"
    }

    fn required_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        let sources = self
            .config
            .lags
            .iter()
            .map(|s| &s.column)
            .chain(self.config.rolling.iter().map(|s| &s.column));
        for column in sources {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns
    }

    fn output_columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        for spec in &self.config.lags {
            columns.extend(spec.lags.iter().map(|&l| lag_column_name(&spec.column, l)));
        }
        for spec in &self.config.rolling {
            for &w in &spec.windows {
                let (mean, std) = rolling_column_names(&spec.column, w);
                columns.push(mean);
                columns.push(std);
            }
        }
        columns
    }

    fn apply(&self, table: &mut FeatureTable) -> Result<()> {
        for spec in &self.config.lags {
            let values = Self::source(table, &spec.column)?;
            for &lag in &spec.lags {
                table.set_column(lag_column_name(&spec.column, lag), shift(&values, lag))?;
            }
        }

        for spec in &self.config.rolling {
            let values = Self::source(table, &spec.column)?;
            for &window in &spec.windows {
                let (mean, std) = rolling_column_names(&spec.column, window);
                table.set_column(mean, rolling_mean(&values, window))?;
                table.set_column(std, rolling_std(&values, window))?;
            }
        }

        Ok(())
    }
}
