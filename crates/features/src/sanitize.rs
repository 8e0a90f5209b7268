//! Removal of rows holding undefined cells.

use crate::transform::Transform;
use predictor_core::{FeatureTable, Result};

/// Drops every row with at least one undefined cell, keeping row order.
#[derive(Debug, Clone, Default)]
pub struct RowSanitizer;

impl RowSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl Transform for RowSanitizer {
    fn name(&self) -> &'static str {
        "sanitize"
    }

    fn output_columns(&self) -> Vec<String> {
        Vec::new()
    }

    fn apply(&self, table: &mut FeatureTable) -> Result<()> {
        let keep: Vec<bool> = (0..table.len()).map(|i| table.row_is_complete(i)).collect();
        let dropped = keep.iter().filter(|k| !**k).count();
        table.retain_rows(&keep)?;

        if table.is_empty() {
            tracing::warn!(dropped, "every row held an undefined value; output is empty");
        } else {
            tracing::debug!(dropped, kept = table.len(), "dropped incomplete rows");
        }
        Ok(())
    }
}
