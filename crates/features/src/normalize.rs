//! Z-score normalization over the full input series.

use crate::transform::Transform;
use predictor_core::{defined, Error, FeatureTable, Result, Value};
use statrs::statistics::Statistics;

/// Mean and sample standard deviation of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScore {
    pub mean: f64,
    pub std: f64,
}

impl ZScore {
    /// Fit on the defined cells of a series.
    ///
    /// Returns `None` when the statistics cannot rescale anything: fewer
    /// than two defined cells, or zero / non-finite deviation.
    pub fn fit(values: &[Value]) -> Option<Self> {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let mean = present.iter().mean();
        let std = present.iter().std_dev();
        if mean.is_finite() && std.is_finite() && std > 0.0 {
            Some(Self { mean, std })
        } else {
            None
        }
    }

    /// Rescale one cell.
    #[inline]
    pub fn apply(&self, value: Value) -> Value {
        value.and_then(|x| defined((x - self.mean) / self.std))
    }
}

/// Name of the normalized column for `column`.
pub fn normalized_column_name(column: &str) -> String {
    format!("{column}_norm")
}

/// Appends `{column}_norm` for each configured column.
pub struct Normalizer {
    columns: Vec<String>,
}

impl Normalizer {
    pub fn new(columns: &[String]) -> Self {
        Self {
            columns: columns.to_vec(),
        }
    }
}

impl Transform for Normalizer {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn required_columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn output_columns(&self) -> Vec<String> {
        self.columns.iter().map(|c| normalized_column_name(c)).collect()
    }

    fn apply(&self, table: &mut FeatureTable) -> Result<()> {
        for column in &self.columns {
            let values = table
                .series(column)
                .ok_or_else(|| Error::input(format!("unknown column to normalize '{column}'")))?;

            let normalized = match ZScore::fit(&values) {
                Some(z) => {
                    tracing::debug!(column = %column, mean = z.mean, std = z.std, "normalizing");
                    values.iter().map(|&v| z.apply(v)).collect()
                }
                None => {
                    tracing::warn!(
                        column = %column,
                        "column has no usable deviation; normalized values are undefined"
                    );
                    vec![None; values.len()]
                }
            };
            table.set_column(normalized_column_name(column), normalized)?;
        }
        Ok(())
    }
}
