//! Forward-looking direction label.

use crate::transform::Transform;
use predictor_core::config::TargetConfig;
use predictor_core::{FeatureTable, Result, Value, CLOSE};

/// Label each row 1 when the close `horizon` rows ahead is strictly higher,
/// else 0. The last `horizon` rows have no future close and are undefined.
///
/// An unchanged close labels 0.
pub fn direction_labels(closes: &[f64], horizon: usize) -> Vec<Value> {
    (0..closes.len())
        .map(|i| {
            closes.get(i + horizon).map(|&future| {
                if future > closes[i] {
                    1.0
                } else {
                    0.0
                }
            })
        })
        .collect()
}

/// Appends the binary target column.
pub struct TargetLabeler {
    config: TargetConfig,
}

impl TargetLabeler {
    pub fn new(config: &TargetConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl Transform for TargetLabeler {
    fn name(&self) -> &'static str {
        "target"
    }

    fn required_columns(&self) -> Vec<String> {
        vec![CLOSE.to_string()]
    }

    fn output_columns(&self) -> Vec<String> {
        vec![self.config.column.clone()]
    }

    fn apply(&self, table: &mut FeatureTable) -> Result<()> {
        let labels = direction_labels(&table.closes(), self.config.horizon);
        table.set_column(self.config.column.clone(), labels)
    }
}
