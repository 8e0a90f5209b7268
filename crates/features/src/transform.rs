//! Stage interface shared by every pipeline step.

use predictor_core::{FeatureTable, Result};

/// One step of the feature pipeline.
///
/// Stages mutate the table in place, adding or replacing columns (or, for
/// the sanitizer, removing rows). `required_columns` and `output_columns`
/// let the pipeline check and report the schema before touching any data.
pub trait Transform {
    /// Short stage name used in logs.
    fn name(&self) -> &'static str;

    /// Columns that must exist before this stage runs.
    fn required_columns(&self) -> Vec<String> {
        Vec::new()
    }

    /// Columns this stage adds or replaces, in creation order.
    fn output_columns(&self) -> Vec<String>;

    /// Apply the stage.
    fn apply(&self, table: &mut FeatureTable) -> Result<()>;
}
