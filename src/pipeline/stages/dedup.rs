use crate::error::Result;
use polars::prelude::*;

/// Drop rows identical in every column to an earlier row. First occurrences keep their order.
pub fn apply(df: &DataFrame) -> Result<DataFrame> {
    if df.width() == 0 {
        return Ok(df.clone());
    }
    let out = df
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    tracing::debug!(removed = df.height() - out.height(), "removed duplicate rows");
    Ok(out)
}
