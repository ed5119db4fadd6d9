//! Wide summary table keyed by (subject, tract).
//!
//! Columns are discovered while scanning, so the schema is never declared
//! up front: adding a column backfills every existing row with an empty
//! cell. Cells hold the last value written to them.

use crate::models::{ResultRecord, TractKey};
use std::collections::HashMap;

/// Header of the subject id column.
pub const SUBJECT_COLUMN: &str = "subjectID";
/// Header of the tract id column.
pub const TRACT_COLUMN: &str = "trkID";

/// Companion column holding the region-filter count.
pub fn total_column(column: &str) -> String {
    format!("{}_total", column)
}

/// One row: its key plus one cell per dynamic column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: TractKey,
    pub cells: Vec<Option<i64>>,
}

/// Accumulating table with one row per distinct [`TractKey`].
#[derive(Debug, Clone, Default)]
pub struct SummaryTable {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    rows: Vec<Row>,
    row_index: HashMap<TractKey, usize>,
}

impl SummaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Dynamic column names in discovery order (key columns excluded).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in first-seen order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Cell value, `None` when the row or column is absent or never written.
    #[cfg(test)]
    pub fn get(&self, key: &TractKey, column: &str) -> Option<i64> {
        let row = *self.row_index.get(key)?;
        let col = *self.column_index.get(column)?;
        self.rows[row].cells[col]
    }

    /// Record both counts of `record` under `column` and `<column>_total`.
    ///
    /// Creates the columns and the row on first sight; otherwise the two
    /// cells are overwritten.
    pub fn upsert(&mut self, record: &ResultRecord, column: &str) {
        let value_col = self.ensure_column(column);
        let total_col = self.ensure_column(&total_column(column));

        let row = match self.row_index.get(&record.key) {
            Some(&row) => row,
            None => {
                let row = self.rows.len();
                self.rows.push(Row {
                    key: record.key.clone(),
                    cells: vec![None; self.columns.len()],
                });
                self.row_index.insert(record.key.clone(), row);
                row
            }
        };

        let cells = &mut self.rows[row].cells;
        cells[value_col] = Some(record.count_after_streamline_filter);
        cells[total_col] = Some(record.count_after_region_filter);
    }

    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.column_index.get(name) {
            return idx;
        }

        let idx = self.columns.len();
        self.columns.push(name.to_string());
        self.column_index.insert(name.to_string(), idx);
        for row in &mut self.rows {
            row.cells.push(None);
        }
        idx
    }
}
