//! Split one text column into several.

use crate::error::{DatasetError, Result};
use crate::frame;
use crate::pipeline::options::SplitColumn;
use crate::pipeline::report::Anomaly;
use polars::prelude::*;
use std::collections::HashSet;

/// Column names after the split, or the configuration problem preventing it.
pub fn split_names(names: &[String], opts: &SplitColumn) -> Result<Vec<String>> {
    if opts.separator.is_empty() {
        return Err(DatasetError::config_field(
            "split_column.separator",
            "separator must not be empty",
        ));
    }
    if opts.new_columns.is_empty() {
        return Err(DatasetError::config_field(
            "split_column.new_columns",
            "at least one new column name is required",
        ));
    }
    let Some(position) = names.iter().position(|n| *n == opts.source_column) else {
        return Err(DatasetError::config_field(
            "split_column.source_column",
            format!("column '{}' not found", opts.source_column),
        ));
    };

    let mut requested = HashSet::with_capacity(opts.new_columns.len());
    for new_name in &opts.new_columns {
        if new_name.is_empty() {
            return Err(DatasetError::config_field(
                "split_column.new_columns",
                "new column names must not be empty",
            ));
        }
        if !requested.insert(new_name.as_str()) {
            return Err(DatasetError::config_field(
                "split_column.new_columns",
                format!("'{new_name}' is listed twice"),
            ));
        }
        if *new_name != opts.source_column && names.contains(new_name) {
            return Err(DatasetError::config_field(
                "split_column.new_columns",
                format!("'{new_name}' collides with an existing column"),
            ));
        }
    }

    let mut result = names.to_vec();
    result.splice(position..=position, opts.new_columns.iter().cloned());
    Ok(result)
}

/// Number of pieces a value is cut into at most.
///
/// Never more than the number of target columns, so the last column keeps
/// any unsplit remainder.
fn piece_limit(opts: &SplitColumn) -> usize {
    let targets = opts.new_columns.len();
    opts.max_splits
        .map_or(targets, |m| m.saturating_add(1).min(targets))
}

pub fn apply(df: &DataFrame, opts: &SplitColumn, anomalies: &mut Vec<Anomaly>) -> Result<DataFrame> {
    split_names(&frame::column_names(df), opts)?;
    let source = df.column(&opts.source_column)?;
    let present = source.is_not_null();

    let mut text = df.clone();
    text.with_column(frame::rendered(source)?)?;

    let limit = piece_limit(opts);
    let mut exprs = Vec::with_capacity(df.width() + opts.new_columns.len());
    for name in df.get_column_names() {
        if name.as_str() != opts.source_column {
            exprs.push(col(name.clone()));
            continue;
        }
        for (idx, new_name) in opts.new_columns.iter().enumerate() {
            let piece = if idx < limit {
                col(name.clone())
                    .str()
                    .splitn(lit(opts.separator.as_str()), limit)
                    .struct_()
                    .field_by_index(idx as i64)
            } else {
                lit(NULL).cast(DataType::String)
            };
            exprs.push(piece.alias(new_name.as_str()));
        }
    }
    let out = text.lazy().select(exprs).collect()?;

    let last_piece = out.column(&opts.new_columns[limit - 1])?;
    let short_rows = (&present & &last_piece.is_null()).num_trues();
    if short_rows > 0 {
        anomalies.push(Anomaly::ShortSplit {
            column: opts.source_column.clone(),
            rows: short_rows,
        });
    }
    Ok(out)
}
