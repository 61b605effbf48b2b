//! Run diagnostics.
//!
//! A [`RunReport`] is returned alongside every successful run. It records one
//! [`StageOutcome`] per executed stage and the non-fatal [`Anomaly`]s each
//! stage met. Anomalies are never raised as errors.

use super::stages::Stage;
use crate::frame;
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Non-fatal problem met while transforming.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// A nested-structure cell was not a valid JSON object. Its row got absent values.
    UnparseableCell {
        column: String,
        row: usize,
        reason: String,
    },

    /// No cell of a `{`-looking column parsed as an object, so the column was kept as-is.
    FlattenSkipped { column: String, failures: usize },

    /// Every object in a nested column was empty, so there was nothing to flatten.
    EmptyObjects { column: String },

    /// Two paths in one object flattened to the same dotted key; the first value was kept.
    DuplicateKey {
        column: String,
        row: usize,
        key: String,
    },

    /// A numeric column had no values to average; its absent cells were left alone.
    NoMeanAvailable { column: String },

    /// Rows whose source value had fewer parts than the split produces.
    ShortSplit { column: String, rows: usize },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparseableCell {
                column,
                row,
                reason,
            } => write!(f, "column '{column}', row {row}: unparseable cell ({reason})"),
            Self::FlattenSkipped { column, failures } => write!(
                f,
                "column '{column}': no cell parsed as an object ({failures} failures), left unchanged"
            ),
            Self::EmptyObjects { column } => {
                write!(f, "column '{column}': every parsed object was empty, left unchanged")
            }
            Self::DuplicateKey { column, row, key } => write!(
                f,
                "column '{column}', row {row}: key '{key}' appears twice, first value kept"
            ),
            Self::NoMeanAvailable { column } => {
                write!(f, "column '{column}': no values to average, absent cells kept")
            }
            Self::ShortSplit { column, rows } => {
                write!(f, "column '{column}': {rows} rows had missing parts")
            }
        }
    }
}

/// What one stage did to the table.
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_added: Vec<String>,
    pub columns_removed: Vec<String>,
    /// Cells rewritten in place, for stages that count them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cells_changed: Option<usize>,
    pub anomalies: Vec<Anomaly>,
}

impl StageOutcome {
    /// Compare the table against its shape before the stage ran.
    pub fn between(
        stage: Stage,
        names_before: &[String],
        rows_before: usize,
        after: &DataFrame,
        anomalies: Vec<Anomaly>,
    ) -> Self {
        let names_after = frame::column_names(after);
        let columns_added = names_after
            .iter()
            .filter(|n| !names_before.contains(n))
            .cloned()
            .collect();
        let columns_removed = names_before
            .iter()
            .filter(|n| !names_after.contains(n))
            .cloned()
            .collect();
        Self {
            stage,
            rows_before,
            rows_after: after.height(),
            columns_added,
            columns_removed,
            cells_changed: None,
            anomalies,
        }
    }

    #[must_use]
    pub fn with_cells_changed(mut self, cells_changed: Option<usize>) -> Self {
        self.cells_changed = cells_changed;
        self
    }

    pub fn rows_dropped(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Report generated after pipeline execution
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,

    /// Number of rows before processing
    pub rows_before: usize,

    /// Number of columns before processing
    pub columns_before: usize,

    /// Number of rows after processing
    pub rows_after: usize,

    /// Number of columns after processing
    pub columns_after: usize,

    /// One entry per executed stage, in order
    pub stages: Vec<StageOutcome>,

    /// Time taken for execution
    pub duration: Duration,
}

impl RunReport {
    /// Every anomaly from every stage, in execution order
    pub fn anomalies(&self) -> impl Iterator<Item = (Stage, &Anomaly)> {
        self.stages
            .iter()
            .flat_map(|s| s.anomalies.iter().map(move |a| (s.stage, a)))
    }

    pub fn anomaly_count(&self) -> usize {
        self.stages.iter().map(|s| s.anomalies.len()).sum()
    }

    /// Create a summary message
    pub fn summary(&self) -> String {
        format!(
            "Pipeline completed: rows {} → {}, columns {} → {}, {} stages, {} anomalies, {:.2}s",
            self.rows_before,
            self.rows_after,
            self.columns_before,
            self.columns_after,
            self.stages.len(),
            self.anomaly_count(),
            self.duration.as_secs_f64()
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
