//! Explicit renames and remove-by-pattern on column names.

use crate::error::{DatasetError, Result};
use crate::frame;
use polars::prelude::DataFrame;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

/// Compile the remove pattern, reporting a bad regex as a configuration error.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        DatasetError::config_field("remove_pattern", format!("invalid regex pattern: {e}"))
    })
}

/// Names after applying `rename_map`, then deleting `pattern` matches.
pub fn renamed_names(
    names: &[String],
    rename_map: Option<&BTreeMap<String, String>>,
    pattern: Option<&Regex>,
) -> Result<Vec<String>> {
    let mut result = names.to_vec();

    if let Some(mapping) = rename_map {
        for from in mapping.keys() {
            if !names.contains(from) {
                return Err(DatasetError::config_field(
                    format!("rename_map.{from}"),
                    format!("cannot rename non-existent column '{from}'"),
                ));
            }
        }
        for name in &mut result {
            if let Some(to) = mapping.get(name.as_str()) {
                name.clone_from(to);
            }
        }
        check_names(&result, "rename_map")?;
    }

    if let Some(re) = pattern {
        for name in &mut result {
            *name = re.replace_all(name, "").into_owned();
        }
        check_names(&result, "remove_pattern")?;
    }

    Ok(result)
}

fn check_names(names: &[String], field: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if name.is_empty() {
            return Err(DatasetError::config_field(
                field,
                "a column name would become empty",
            ));
        }
        if !seen.insert(name.as_str()) {
            return Err(DatasetError::config_field(
                field,
                format!("two columns would both be named '{name}'"),
            ));
        }
    }
    Ok(())
}

pub fn apply(
    df: &DataFrame,
    rename_map: Option<&BTreeMap<String, String>>,
    remove_pattern: Option<&str>,
) -> Result<DataFrame> {
    let pattern = remove_pattern.map(compile_pattern).transpose()?;
    let names = renamed_names(&frame::column_names(df), rename_map, pattern.as_ref())?;
    frame::with_names(df, &names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn table(names: &[&str]) -> DataFrame {
        let columns = names
            .iter()
            .map(|name| Column::new((*name).into(), [1_i64]))
            .collect();
        DataFrame::new(columns).expect("valid table")
    }

    #[test]
    fn test_rename_map_is_simultaneous() -> Result<()> {
        let df = table(&["a", "b", "c"]);
        let mapping = BTreeMap::from([
            ("a".to_owned(), "b".to_owned()),
            ("b".to_owned(), "a".to_owned()),
        ]);
        let out = apply(&df, Some(&mapping), None)?;
        assert_eq!(frame::column_names(&out), vec!["b", "a", "c"]);
        Ok(())
    }

    #[test]
    fn test_rename_unknown_column_rejected() {
        let df = table(&["a"]);
        let mapping = BTreeMap::from([("zzz".to_owned(), "b".to_owned())]);
        let err = apply(&df, Some(&mapping), None).unwrap_err();
        assert!(err.to_string().contains("rename_map.zzz"));
    }

    #[test]
    fn test_remove_pattern() -> Result<()> {
        let df = table(&["col_2021", "col_2022", "name"]);
        let out = apply(&df, None, Some(r"^col_"))?;
        assert_eq!(frame::column_names(&out), vec!["2021", "2022", "name"]);
        Ok(())
    }

    #[test]
    fn test_remove_pattern_collision_rejected() {
        let df = table(&["price_usd", "price_eur"]);
        let err = apply(&df, None, Some(r"_\w+$")).unwrap_err();
        assert_eq!(err.kind(), "configuration_error");
        assert!(err.to_string().contains("'price'"));

        let err = apply(&df, None, Some(r".*")).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_invalid_regex() {
        let err = compile_pattern("([").unwrap_err();
        assert!(err.to_string().contains("remove_pattern"));
    }
}
