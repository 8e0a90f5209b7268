//! In-memory feature table.
//!
//! A table is an ordered run of candles plus an insertion-ordered list of
//! extra columns (passthrough input columns and derived features). The
//! OHLCV part is typed and always defined; extra columns hold [`Value`]s.

use crate::error::{Error, Result};
use crate::types::{is_base_column, Candle, Value, PRICE_COLUMNS, REQUIRED_COLUMNS};
use serde::{Deserialize, Serialize};

/// A named column of cells, one per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    /// Create a column.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cells of the column.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of defined cells.
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Ordered, schema-consistent table of series records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    candles: Vec<Candle>,
    columns: Vec<Column>,
}

impl FeatureTable {
    /// Create a table holding only OHLCV data.
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            columns: Vec::new(),
        }
    }

    /// Create a table with extra columns.
    ///
    /// Fails if a column length differs from the candle count or a name is
    /// duplicated or shadows a base column.
    pub fn with_columns(candles: Vec<Candle>, columns: Vec<Column>) -> Result<Self> {
        let mut table = Self::new(candles);
        for column in columns {
            if table.has_column(column.name()) {
                return Err(Error::input(format!("duplicate column '{}'", column.name())));
            }
            table.set_column(column.name, column.values)?;
        }
        Ok(table)
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Check if the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// OHLCV records.
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Extra and derived columns, in schema order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Raw timestamps.
    pub fn timestamps(&self) -> impl Iterator<Item = &str> + '_ {
        self.candles.iter().map(|c| c.timestamp.as_str())
    }

    /// Open prices.
    pub fn opens(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.open).collect()
    }

    /// High prices.
    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    /// Low prices.
    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    /// Close prices.
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Volumes.
    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    /// Full schema: base columns first, then extra columns in insertion order.
    pub fn column_names(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .chain(self.columns.iter().map(|c| c.name.clone()))
            .collect()
    }

    /// Check whether a column (base or extra) exists.
    pub fn has_column(&self, name: &str) -> bool {
        is_base_column(name) || self.column(name).is_some()
    }

    /// Look up an extra column.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Numeric cells of any column except `timestamp`.
    pub fn series(&self, name: &str) -> Option<Vec<Value>> {
        if PRICE_COLUMNS.contains(&name) {
            return Some(self.candles.iter().map(|c| c.field(name)).collect());
        }
        self.column(name).map(|c| c.values.clone())
    }

    /// Add a column, or replace the values of an existing one in place.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if is_base_column(&name) {
            return Err(Error::input(format!("cannot overwrite base column '{name}'")));
        }
        if values.len() != self.len() {
            return Err(Error::input(format!(
                "column '{}' has {} values, table has {} rows",
                name,
                values.len(),
                self.len()
            )));
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Check whether every cell of row `i` is defined.
    pub fn row_is_complete(&self, i: usize) -> bool {
        self.columns.iter().all(|c| c.values[i].is_some())
    }

    /// Number of undefined cells in the whole table.
    pub fn undefined_count(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.values.len() - c.defined_count())
            .sum()
    }

    /// Keep only the rows whose mask entry is true, preserving order.
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<()> {
        if keep.len() != self.len() {
            return Err(Error::input(format!(
                "row mask has {} entries, table has {} rows",
                keep.len(),
                self.len()
            )));
        }
        let mut mask = keep.iter();
        self.candles.retain(|_| *mask.next().unwrap_or(&false));
        for column in &mut self.columns {
            let mut mask = keep.iter();
            column.values.retain(|_| *mask.next().unwrap_or(&false));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table(closes: &[f64]) -> FeatureTable {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let ts = format!("2024-01-01 {:02}:00:00", i);
                Candle::new(ts, c, c + 1.0, c - 1.0, c, 10.0)
            })
            .collect();
        FeatureTable::new(candles)
    }

    #[test]
    fn test_schema_order() {
        let mut table = make_table(&[1.0, 2.0]);
        table.set_column("b", vec![Some(1.0), None]).unwrap();
        table.set_column("a", vec![Some(1.0), Some(2.0)]).unwrap();
        assert_eq!(
            table.column_names(),
            vec!["timestamp", "open", "high", "low", "close", "volume", "b", "a"]
        );
    }

    #[test]
    fn test_set_column_replaces_in_place() {
        let mut table = make_table(&[1.0, 2.0]);
        table.set_column("x", vec![None, None]).unwrap();
        table.set_column("y", vec![Some(0.0), Some(0.0)]).unwrap();
        table.set_column("x", vec![Some(5.0), Some(6.0)]).unwrap();

        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.columns()[0].name(), "x");
        assert_eq!(table.column("x").unwrap().values(), &[Some(5.0), Some(6.0)]);
    }

    #[test]
    fn test_set_column_rejects_bad_input() {
        let mut table = make_table(&[1.0, 2.0]);
        assert!(table.set_column("x", vec![Some(1.0)]).is_err());
        assert!(table.set_column("close", vec![Some(1.0), Some(2.0)]).is_err());
    }

    #[test]
    fn test_series_base_and_extra() {
        let mut table = make_table(&[1.0, 2.0]);
        table.set_column("x", vec![None, Some(3.0)]).unwrap();
        assert_eq!(table.series("close"), Some(vec![Some(1.0), Some(2.0)]));
        assert_eq!(table.series("x"), Some(vec![None, Some(3.0)]));
        assert_eq!(table.series("timestamp"), None);
        assert_eq!(table.series("missing"), None);
    }

    #[test]
    fn test_price_accessors() {
        let table = FeatureTable::new(vec![
            Candle::new("t0", 10.0, 12.0, 9.0, 11.0, 300.0),
            Candle::new("t1", 11.0, 13.0, 10.5, 12.5, 250.0),
        ]);
        assert_eq!(table.opens(), vec![10.0, 11.0]);
        assert_eq!(table.highs(), vec![12.0, 13.0]);
        assert_eq!(table.lows(), vec![9.0, 10.5]);
        assert_eq!(table.closes(), vec![11.0, 12.5]);
        assert_eq!(table.volumes(), vec![300.0, 250.0]);
        assert_eq!(table.series("low"), Some(vec![Some(9.0), Some(10.5)]));
        assert_eq!(table.series("volume"), Some(vec![Some(300.0), Some(250.0)]));
    }

    #[test]
    fn test_retain_rows() {
        let mut table = make_table(&[1.0, 2.0, 3.0]);
        table.set_column("x", vec![None, Some(2.0), Some(3.0)]).unwrap();
        assert_eq!(table.undefined_count(), 1);
        assert!(!table.row_is_complete(0));

        table.retain_rows(&[false, true, true]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.closes(), vec![2.0, 3.0]);
        assert_eq!(table.undefined_count(), 0);
        assert!(table.retain_rows(&[true]).is_err());
    }

    #[test]
    fn test_with_columns_rejects_duplicates() {
        let candles = vec![Candle::new("t", 1.0, 1.0, 1.0, 1.0, 1.0)];
        let result = FeatureTable::with_columns(
            candles,
            vec![Column::new("x", vec![None]), Column::new("x", vec![Some(1.0)])],
        );
        assert!(matches!(result, Err(Error::Input(_))));
    }
}
