//! Join several columns into one text column.

use crate::error::{DatasetError, Result};
use crate::frame;
use crate::pipeline::options::JoinColumns;
use polars::prelude::*;
use std::collections::HashSet;

/// Column names after the join, or the configuration problem preventing it.
pub fn join_names(names: &[String], opts: &JoinColumns) -> Result<Vec<String>> {
    const FIELD: &str = "join_columns.source_columns";

    if opts.source_columns.is_empty() {
        return Err(DatasetError::config_field(
            FIELD,
            "at least one source column is required",
        ));
    }
    let mut sources = HashSet::with_capacity(opts.source_columns.len());
    for source in &opts.source_columns {
        if !names.contains(source) {
            return Err(DatasetError::config_field(
                FIELD,
                format!("column '{source}' not found"),
            ));
        }
        if !sources.insert(source.as_str()) {
            return Err(DatasetError::config_field(
                FIELD,
                format!("'{source}' is listed twice"),
            ));
        }
    }

    if opts.new_column.is_empty() {
        return Err(DatasetError::config_field(
            "join_columns.new_column",
            "new column name must not be empty",
        ));
    }
    let mut result: Vec<String> = names
        .iter()
        .filter(|n| !sources.contains(n.as_str()))
        .cloned()
        .collect();
    if result.contains(&opts.new_column) {
        return Err(DatasetError::config_field(
            "join_columns.new_column",
            format!("'{}' collides with an existing column", opts.new_column),
        ));
    }
    result.push(opts.new_column.clone());
    Ok(result)
}

pub fn apply(df: &DataFrame, opts: &JoinColumns) -> Result<DataFrame> {
    join_names(&frame::column_names(df), opts)?;

    let mut text = df.clone();
    let mut pieces = Vec::with_capacity(opts.source_columns.len());
    for source in &opts.source_columns {
        text.with_column(frame::rendered(df.column(source)?)?)?;
        // absent renders as the empty string
        pieces.push(col(source.as_str()).fill_null(lit("")));
    }

    let mut exprs: Vec<Expr> = df
        .get_column_names()
        .into_iter()
        .filter(|name| !opts.source_columns.iter().any(|s| s == name.as_str()))
        .map(|name| col(name.clone()))
        .collect();
    exprs.push(concat_str(pieces, &opts.separator, false).alias(opts.new_column.as_str()));
    Ok(text.lazy().select(exprs).collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Cell;

    fn people() -> DataFrame {
        df! {
            "First" => &[Some("Jane"), Some("Madonna")],
            "Last" => &[Some("Doe"), None],
            "Age" => &[30_i64, 64],
        }
        .expect("valid table")
    }

    fn opts(sources: &[&str], new_column: &str) -> JoinColumns {
        JoinColumns {
            source_columns: sources.iter().map(|s| (*s).to_owned()).collect(),
            separator: " ".to_owned(),
            new_column: new_column.to_owned(),
        }
    }

    #[test]
    fn test_join_appends_and_removes_sources() -> Result<()> {
        let out = apply(&people(), &opts(&["First", "Last"], "Name"))?;

        assert_eq!(frame::column_names(&out), vec!["Age", "Name"]);
        assert_eq!(
            frame::cells(out.column("Name")?)?,
            vec![Cell::from("Jane Doe"), Cell::from("Madonna ")]
        );
        Ok(())
    }

    #[test]
    fn test_numbers_render_as_text() -> Result<()> {
        let mut join = opts(&["Age", "First"], "Label");
        join.separator = "-".to_owned();
        let out = apply(&people(), &join)?;
        assert_eq!(frame::cells(out.column("Label")?)?[0], Cell::from("30-Jane"));
        Ok(())
    }

    #[test]
    fn test_new_column_may_reuse_a_source_name() -> Result<()> {
        let out = apply(&people(), &opts(&["First", "Last"], "First"))?;
        assert_eq!(frame::column_names(&out), vec!["Age", "First"]);
        Ok(())
    }

    #[test]
    fn test_configuration_errors() {
        let names = frame::column_names(&people());
        assert!(join_names(&names, &opts(&[], "X")).is_err());
        assert!(join_names(&names, &opts(&["First", "First"], "X")).is_err());

        let err = join_names(&names, &opts(&["First", "Middle"], "X")).unwrap_err();
        assert!(err.to_string().contains("'Middle' not found"));

        let err = join_names(&names, &opts(&["First", "Last"], "Age")).unwrap_err();
        assert!(err.to_string().contains("join_columns.new_column"));
    }
}
