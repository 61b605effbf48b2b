//! Pipeline execution engine.
//!
//! Validates options against the input table, then applies every enabled
//! stage in order and builds a [`RunReport`]. A run either returns the fully
//! transformed table or an error; partial output is never handed back.

use super::options::PipelineOptions;
use super::report::{Anomaly, RunReport, StageOutcome};
use super::stages::{Stage, dedup, flatten, join, missing, naming, rename, split, whitespace};
use super::validation::validate_options;
use crate::error::{DatasetError, Result};
use crate::frame;
use chrono::Utc;
use polars::prelude::DataFrame;
use std::time::Instant;

/// Output of a successful run
#[derive(Debug, Clone)]
pub struct Transformed {
    pub table: DataFrame,
    pub report: RunReport,
}

/// Execute the pipeline on a decoded table
pub fn run_pipeline(table: DataFrame, options: &PipelineOptions) -> Result<Transformed> {
    let started_at = Utc::now();
    let start = Instant::now();

    let validation_errors = validate_options(options, &frame::column_names(&table));
    for err in &validation_errors {
        tracing::warn!("Pipeline validation failed: {err}");
    }
    if let Some(first) = validation_errors.into_iter().next() {
        return Err(first.into());
    }

    let rows_before = table.height();
    let columns_before = table.width();
    let mut table = table;
    let mut stages = Vec::new();

    for stage in options.enabled_stages() {
        let names_before = frame::column_names(&table);
        let stage_rows_before = table.height();
        let mut anomalies = Vec::new();

        tracing::debug!(%stage, rows = stage_rows_before, columns = names_before.len(), "running stage");
        let (next, cells_changed) =
            apply_stage(stage, &table, options, &mut anomalies).map_err(|e| {
                tracing::error!(%stage, "stage failed: {e}");
                e.in_stage(stage)
            })?;
        table = next;

        for anomaly in &anomalies {
            tracing::warn!(%stage, "{anomaly}");
        }
        let outcome =
            StageOutcome::between(stage, &names_before, stage_rows_before, &table, anomalies)
                .with_cells_changed(cells_changed);
        tracing::debug!(
            %stage,
            rows_dropped = outcome.rows_dropped(),
            added = outcome.columns_added.len(),
            removed = outcome.columns_removed.len(),
            cells_changed = outcome.cells_changed,
            "stage finished"
        );
        stages.push(outcome);
    }

    let report = RunReport {
        started_at,
        rows_before,
        columns_before,
        rows_after: table.height(),
        columns_after: table.width(),
        stages,
        duration: start.elapsed(),
    };
    tracing::info!("{}", report.summary());

    Ok(Transformed { table, report })
}

/// Apply a single stage. Returns the new frame and, for stages that rewrite
/// cells in place, how many cells changed.
fn apply_stage(
    stage: Stage,
    table: &DataFrame,
    options: &PipelineOptions,
    anomalies: &mut Vec<Anomaly>,
) -> Result<(DataFrame, Option<usize>)> {
    let out = match stage {
        Stage::NormalizeNames => naming::apply(table, options.name_case)?,
        Stage::RenameColumns => rename::apply(
            table,
            options.rename_map.as_ref(),
            options.remove_pattern.as_deref(),
        )?,
        Stage::TrimWhitespace => {
            let (out, changed) = whitespace::apply(table)?;
            return Ok((out, Some(changed)));
        }
        Stage::MissingValues => match &options.missing_policy {
            Some(policy) => missing::apply(table, policy, anomalies)?,
            None => table.clone(),
        },
        Stage::Deduplicate => dedup::apply(table)?,
        Stage::SplitColumn => match &options.split_column {
            Some(opts) => split::apply(table, opts, anomalies)?,
            None => table.clone(),
        },
        Stage::JoinColumns => match &options.join_columns {
            Some(opts) => join::apply(table, opts)?,
            None => table.clone(),
        },
        Stage::FlattenNested => flatten::apply(table, anomalies)?,
    };
    Ok((out, None))
}

/// Decode-free dry run: report whether `options` would be accepted for `columns`.
pub fn check_options(options: &PipelineOptions, columns: &[String]) -> Result<()> {
    match validate_options(options, columns).into_iter().next() {
        Some(err) => Err(DatasetError::from(err)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Cell;
    use crate::pipeline::options::{JoinColumns, MissingPolicy, SplitColumn};
    use polars::prelude::*;

    fn options(json: &str) -> PipelineOptions {
        PipelineOptions::from_json(json).expect("valid options")
    }

    fn column(df: &DataFrame, name: &str) -> Vec<Cell> {
        frame::cells(df.column(name).expect("column exists")).expect("readable column")
    }

    #[test]
    fn test_normalize_and_fill_constant() -> Result<()> {
        let table = df! {
            "First Name" => &["Alice", "bob"],
            "age!" => &[Some(30_i64), None],
        }?;
        let opts = options(
            r#"{"normalize_column_names": true,
                "missing_policy": {"method": "fill_constant", "value": "unknown"}}"#,
        );
        let out = run_pipeline(table, &opts)?;

        assert_eq!(frame::column_names(&out.table), vec!["First_Name", "Age"]);
        assert_eq!(
            column(&out.table, "Age"),
            vec![Cell::from("30"), Cell::from("unknown")]
        );
        assert_eq!(out.report.stages.len(), 2);
        assert_eq!(out.report.stages[0].stage, Stage::NormalizeNames);
        assert_eq!(out.report.stages[0].columns_added, vec!["First_Name", "Age"]);
        Ok(())
    }

    #[test]
    fn test_split_scenario() -> Result<()> {
        let table = df! { "Name" => &["Jane Doe", "Madonna"] }?;
        let opts = PipelineOptions {
            split_column: Some(SplitColumn {
                source_column: "Name".to_owned(),
                separator: " ".to_owned(),
                max_splits: None,
                new_columns: vec!["First".to_owned(), "Last".to_owned()],
            }),
            ..Default::default()
        };
        let out = run_pipeline(table, &opts)?;

        assert_eq!(
            column(&out.table, "First"),
            vec![Cell::from("Jane"), Cell::from("Madonna")]
        );
        assert_eq!(
            column(&out.table, "Last"),
            vec![Cell::from("Doe"), Cell::Absent]
        );
        assert_eq!(out.report.anomaly_count(), 1);
        Ok(())
    }

    #[test]
    fn test_fill_mean_scenario() -> Result<()> {
        let table = df! {
            "a" => &[Some(1.0), None, Some(3.0)],
            "b" => &[None::<&str>, None, None],
        }?;
        let opts = PipelineOptions {
            missing_policy: Some(MissingPolicy::FillMean),
            ..Default::default()
        };
        let out = run_pipeline(table, &opts)?;

        assert_eq!(column(&out.table, "a")[1], Cell::Float(2.0));
        assert_eq!(out.table.column("b")?.null_count(), 3);
        let anomalies: Vec<_> = out.report.anomalies().collect();
        assert_eq!(
            anomalies,
            vec![(
                Stage::MissingValues,
                &Anomaly::NoMeanAvailable {
                    column: "b".to_owned()
                }
            )]
        );
        Ok(())
    }

    #[test]
    fn test_trim_reports_cells_changed() -> Result<()> {
        let table = df! {
            "a" => &[" x ", "y"],
            "b" => &[Some("z "), None],
        }?;
        let opts = options(r#"{"trim_cell_whitespace": true, "remove_duplicates": true}"#);
        let out = run_pipeline(table, &opts)?;

        assert_eq!(out.report.stages[0].stage, Stage::TrimWhitespace);
        assert_eq!(out.report.stages[0].cells_changed, Some(2));
        assert_eq!(out.report.stages[1].cells_changed, None);
        assert_eq!(column(&out.table, "a"), vec![Cell::from("x"), Cell::from("y")]);
        Ok(())
    }

    #[test]
    fn test_validation_runs_before_any_stage() {
        let table = df! { "a b" => &["x"] }.expect("table");
        let opts = PipelineOptions {
            normalize_column_names: true,
            join_columns: Some(JoinColumns {
                source_columns: vec!["a b".to_owned()],
                separator: String::new(),
                new_column: "c".to_owned(),
            }),
            ..Default::default()
        };
        let err = run_pipeline(table, &opts).unwrap_err();
        assert_eq!(err.kind(), "configuration_error");
        assert_eq!(err.stage(), Some(Stage::JoinColumns));
    }

    #[test]
    fn test_row_counts_through_stages() -> Result<()> {
        let table = df! {
            "k" => &["a b", "a b", " c d "],
            "v" => &[Some(1_i64), Some(1), None],
        }?;
        let opts = options(
            r#"{"trim_cell_whitespace": true,
                "missing_policy": {"method": "drop"},
                "remove_duplicates": true,
                "split_column": {"source_column": "k", "separator": " ", "new_columns": ["x", "y"]},
                "join_columns": {"source_columns": ["x", "y"], "separator": " ", "new_column": "k"}}"#,
        );
        let out = run_pipeline(table, &opts)?;

        let rows: Vec<_> = out.report.stages.iter().map(|s| (s.stage, s.rows_after)).collect();
        assert_eq!(
            rows,
            vec![
                (Stage::TrimWhitespace, 3),
                (Stage::MissingValues, 2),
                (Stage::Deduplicate, 1),
                (Stage::SplitColumn, 1),
                (Stage::JoinColumns, 1),
            ]
        );
        assert_eq!(column(&out.table, "k"), vec![Cell::from("a b")]);
        assert_eq!(out.report.rows_before, 3);
        assert_eq!(out.report.columns_after, 2);
        Ok(())
    }

    #[test]
    fn test_no_stages_is_identity() -> Result<()> {
        let table = df! { "a" => &[" x "] }?;
        let out = run_pipeline(table.clone(), &PipelineOptions::default())?;
        assert!(out.table.equals_missing(&table));
        assert!(out.report.stages.is_empty());
        Ok(())
    }

    #[test]
    fn test_check_options() {
        let columns = vec!["Name".to_owned()];
        assert!(check_options(&PipelineOptions::default(), &columns).is_ok());
        let opts = options(r#"{"remove_pattern": "["}"#);
        let err = check_options(&opts, &columns).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::RenameColumns));
    }
}
