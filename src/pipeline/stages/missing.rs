//! Missing-value handling: drop rows, fill with a constant, or fill with the column mean.

use crate::error::{DatasetError, Result};
use crate::frame;
use crate::pipeline::options::MissingPolicy;
use crate::pipeline::report::Anomaly;
use polars::prelude::*;

pub fn apply(
    df: &DataFrame,
    policy: &MissingPolicy,
    anomalies: &mut Vec<Anomaly>,
) -> Result<DataFrame> {
    match policy {
        MissingPolicy::Drop => drop_incomplete_rows(df),
        MissingPolicy::FillConstant { value } => {
            fill_constant(df, value.as_deref().unwrap_or_default())
        }
        MissingPolicy::FillMean => fill_mean(df, anomalies),
    }
}

fn drop_incomplete_rows(df: &DataFrame) -> Result<DataFrame> {
    let out = df.clone().lazy().drop_nulls(None).collect()?;
    tracing::debug!(
        dropped = df.height() - out.height(),
        "dropped rows with absent cells"
    );
    Ok(out)
}

/// The literal goes in as a number only when the column is numeric. A
/// numeric column receiving text becomes a text column.
fn fill_constant(df: &DataFrame, value: &str) -> Result<DataFrame> {
    let as_int = value.parse::<i64>().ok();
    let as_float = value.parse::<f64>().ok().filter(|n| n.is_finite());

    let mut out = df.clone();
    let mut exprs = Vec::new();
    for column in df.get_columns() {
        if column.null_count() == 0 {
            continue;
        }
        let name = column.name().clone();
        let dtype = column.dtype();
        let expr = match (as_int, as_float) {
            (Some(n), _) if dtype.is_integer() => col(name.clone()).fill_null(lit(n)),
            (_, Some(f)) if frame::is_numeric(dtype) => col(name.clone())
                .cast(DataType::Float64)
                .fill_null(lit(f)),
            _ => {
                if dtype != &DataType::String {
                    out.with_column(frame::rendered(column)?)?;
                }
                col(name.clone()).fill_null(lit(value))
            }
        };
        exprs.push(expr.alias(name));
    }
    if exprs.is_empty() {
        return Ok(out);
    }
    Ok(out.lazy().with_columns(exprs).collect()?)
}

fn fill_mean(df: &DataFrame, anomalies: &mut Vec<Anomaly>) -> Result<DataFrame> {
    let mut exprs = Vec::new();
    for column in df.get_columns() {
        let name = column.name();
        if column.null_count() == 0 {
            continue;
        }
        if column.null_count() == column.len() {
            tracing::warn!(column = %name, "no values to average");
            anomalies.push(Anomaly::NoMeanAvailable {
                column: name.to_string(),
            });
            continue;
        }
        if !frame::is_numeric(column.dtype()) {
            tracing::debug!(column = %name, "skipping mean fill for non-numeric column");
            continue;
        }
        let mean = column
            .as_materialized_series()
            .mean()
            .filter(|m| m.is_finite())
            .ok_or_else(|| DatasetError::fault(format!("mean of column '{name}' is not finite")))?;
        exprs.push(
            col(name.clone())
                .cast(DataType::Float64)
                .fill_null(lit(mean))
                .alias(name.clone()),
        );
    }
    if exprs.is_empty() {
        return Ok(df.clone());
    }
    Ok(df.clone().lazy().with_columns(exprs).collect()?)
}
