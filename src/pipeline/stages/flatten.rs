//! Flatten JSON-object text cells into dotted columns.
//!
//! Cells are only ever handed to `serde_json`, a strict data parser. Text
//! that is not a JSON object (including anything that looks like code) is
//! reported as an [`Anomaly::UnparseableCell`] and contributes absent values.
//! When two paths in one object flatten to the same dotted key, the first
//! value wins and the clash is reported as an [`Anomaly::DuplicateKey`].

use super::naming::disambiguate;
use crate::error::{DatasetError, Result};
use crate::frame::{self, Cell};
use crate::pipeline::report::Anomaly;
use polars::prelude::*;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// A column is a candidate when any text cell opens with `{`.
fn looks_nested(column: &Column) -> bool {
    column
        .as_materialized_series()
        .str()
        .is_ok_and(|ca| ca.into_iter().flatten().any(|s| s.trim_start().starts_with('{')))
}

pub fn apply(df: &DataFrame, anomalies: &mut Vec<Anomaly>) -> Result<DataFrame> {
    let candidates: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| looks_nested(c))
        .map(|c| c.name().to_string())
        .collect();

    let mut out = df.clone();
    for name in candidates {
        flatten_column(&mut out, &name, anomalies)?;
    }
    Ok(out)
}

fn flatten_column(df: &mut DataFrame, name: &str, anomalies: &mut Vec<Anomaly>) -> Result<()> {
    let Some(position) = df.get_column_index(name) else {
        return Err(DatasetError::fault(format!("column '{name}' vanished")));
    };

    let mut keys: Vec<String> = Vec::new();
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut rows: Vec<Option<HashMap<String, Cell>>> = Vec::with_capacity(df.height());
    let mut failures = Vec::new();
    let mut duplicates = Vec::new();

    let source = df.column(name)?.as_materialized_series().str()?;
    for (row, cell) in source.into_iter().enumerate() {
        let Some(text) = cell else {
            rows.push(None);
            continue;
        };
        match parse_object(text) {
            Ok(entries) => {
                let mut values = HashMap::with_capacity(entries.len());
                for (key, value) in entries {
                    if values.contains_key(&key) {
                        duplicates.push(Anomaly::DuplicateKey {
                            column: name.to_owned(),
                            row,
                            key,
                        });
                        continue;
                    }
                    if seen_keys.insert(key.clone()) {
                        keys.push(key.clone());
                    }
                    values.insert(key, value);
                }
                rows.push(Some(values));
            }
            Err(reason) => {
                failures.push(Anomaly::UnparseableCell {
                    column: name.to_owned(),
                    row,
                    reason,
                });
                rows.push(None);
            }
        }
    }

    if rows.iter().all(Option::is_none) {
        tracing::warn!(column = %name, failures = failures.len(), "no cell parsed as an object");
        anomalies.push(Anomaly::FlattenSkipped {
            column: name.to_owned(),
            failures: failures.len(),
        });
        return Ok(());
    }
    for anomaly in failures.iter().chain(&duplicates) {
        tracing::warn!("{anomaly}");
    }
    anomalies.extend(failures);
    anomalies.extend(duplicates);

    if keys.is_empty() {
        tracing::warn!(column = %name, "every parsed object was empty");
        anomalies.push(Anomaly::EmptyObjects {
            column: name.to_owned(),
        });
        return Ok(());
    }

    let existing: HashSet<String> = frame::column_names(df)
        .into_iter()
        .filter(|n| n != name)
        .collect();
    let mut assigned: HashSet<String> = HashSet::with_capacity(keys.len());
    let mut new_columns = Vec::with_capacity(keys.len());

    for key in &keys {
        let base = format!("{name}.{key}");
        let column_name = if existing.contains(&base) || assigned.contains(&base) {
            disambiguate(&base, |c| existing.contains(c) || assigned.contains(c))
        } else {
            base
        };

        let cells: Vec<Cell> = rows
            .iter()
            .map(|values| {
                values
                    .as_ref()
                    .and_then(|v| v.get(key))
                    .cloned()
                    .unwrap_or(Cell::Absent)
            })
            .collect();
        new_columns.push(frame::column_from_cells(&column_name, &cells));
        assigned.insert(column_name);
    }

    tracing::debug!(column = %name, created = new_columns.len(), "flattened nested column");
    df.drop_in_place(name)?;
    for (offset, column) in new_columns.into_iter().enumerate() {
        df.insert_column(position + offset, column)?;
    }
    Ok(())
}

/// Parse one cell as a JSON object and flatten it to `(dotted key, scalar)` pairs.
fn parse_object(text: &str) -> std::result::Result<Vec<(String, Cell)>, String> {
    let value: Value = serde_json::from_str(text.trim()).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err(format!("expected a JSON object, found {}", json_type(&value)));
    }
    let mut out = Vec::new();
    flatten_into("", &value, &mut out);
    Ok(out)
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<(String, Cell)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(&path, child, out);
            }
        }
        scalar => out.push((prefix.to_owned(), scalar_cell(scalar))),
    }
}

fn scalar_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Absent,
        Value::String(s) => Cell::Text(s.clone()),
        Value::Number(n) => match (n.as_i64(), n.as_f64().filter(|f| f.is_finite())) {
            (Some(i), _) => Cell::Int(i),
            (None, Some(f)) => Cell::Float(f),
            (None, None) => Cell::Text(n.to_string()),
        },
        Value::Bool(b) => Cell::Text(b.to_string()),
        // arrays stay as compact JSON text
        other => Cell::Text(other.to_string()),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
