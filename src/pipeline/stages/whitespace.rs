use crate::error::Result;
use polars::prelude::*;

/// Trim surrounding whitespace in every text column. Returns the frame and
/// the number of cells changed.
pub fn apply(df: &DataFrame) -> Result<(DataFrame, usize)> {
    let text_columns: Vec<PlSmallStr> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::String)
        .map(|c| c.name().clone())
        .collect();
    if text_columns.is_empty() {
        return Ok((df.clone(), 0));
    }

    let exprs: Vec<Expr> = text_columns
        .iter()
        .map(|name| {
            col(name.clone())
                .str()
                .strip_chars(lit(NULL))
                .alias(name.clone())
        })
        .collect();
    let out = df.clone().lazy().with_columns(exprs).collect()?;

    let mut changed = 0;
    for name in &text_columns {
        let before = df.column(name.as_str())?.as_materialized_series();
        let after = out.column(name.as_str())?.as_materialized_series();
        changed += before.not_equal(after)?.num_trues();
    }
    tracing::debug!(changed, "trimmed text cells");
    Ok((out, changed))
}
