//! CSV codec.
//!
//! Fields are read as text and each column is typed as a whole by
//! [`frame::text_column`]. The header row is read as data so duplicate and
//! blank names are resolved the same way as for workbooks. Empty fields
//! become absent cells and absent cells are written back as empty fields.

use super::DecodeOptions;
use crate::error::{DatasetError, Result};
use crate::frame;
use crate::pipeline::stages::naming::dedupe_names;
use encoding_rs::Encoding;
use polars::prelude::*;
use std::borrow::Cow;
use std::io::Cursor;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Bytes to text: UTF-8 first, then the single-byte fallback.
pub fn decode_text<'a>(bytes: &'a [u8], fallback: &'static Encoding) -> Result<Cow<'a, str>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(Cow::Borrowed(text)),
        Err(utf8_err) => {
            tracing::info!(
                encoding = fallback.name(),
                "input is not UTF-8 ({utf8_err}), retrying with fallback encoding"
            );
            let (text, had_errors) = fallback.decode_without_bom_handling(bytes);
            if had_errors {
                return Err(DatasetError::Decode(format!(
                    "input is neither UTF-8 nor valid {}",
                    fallback.name()
                )));
            }
            Ok(text)
        }
    }
}

fn invalid_csv(e: PolarsError) -> DatasetError {
    DatasetError::Decode(format!("invalid CSV: {e}"))
}

pub fn decode(bytes: &[u8], options: &DecodeOptions) -> Result<DataFrame> {
    let text = decode_text(bytes, options.fallback_encoding)?;
    if text.trim().is_empty() {
        return Err(DatasetError::Decode("CSV input is empty".to_owned()));
    }

    let raw = CsvReadOptions::default()
        .with_has_header(false)
        // schema length 0 reads every column as String
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(text.into_owned().into_bytes()))
        .finish()
        .map_err(invalid_csv)?;

    let mut header = Vec::with_capacity(raw.width());
    for (idx, column) in raw.get_columns().iter().enumerate() {
        let name = column
            .as_materialized_series()
            .str()
            .map_err(invalid_csv)?
            .get(0)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(|| format!("Unnamed: {idx}"), str::to_owned);
        header.push(name);
    }
    let names = dedupe_names(header);

    let body = raw.slice(1, raw.height().saturating_sub(1));
    let mut columns = Vec::with_capacity(names.len());
    for (column, name) in body.get_columns().iter().zip(&names) {
        let fields = column.as_materialized_series().str().map_err(invalid_csv)?;
        columns.push(frame::text_column(name, fields, options.infer_numbers));
    }
    DataFrame::new(columns).map_err(invalid_csv)
}

pub fn encode(df: &DataFrame) -> Result<Vec<u8>> {
    let columns = df
        .get_columns()
        .iter()
        .map(frame::rendered)
        .collect::<Result<Vec<_>>>()
        .map_err(|e| DatasetError::Encode(e.to_string()))?;

    let mut text = DataFrame::new(columns).map_err(|e| DatasetError::Encode(e.to_string()))?;
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut text)
        .map_err(|e| DatasetError::Encode(format!("failed to write CSV: {e}")))?;
    Ok(buf)
}
