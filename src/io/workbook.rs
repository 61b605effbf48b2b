//! Workbook codec: first sheet in, single-sheet `.xlsx` out.

use crate::error::{DatasetError, Result};
use crate::frame::{self, Cell};
use crate::pipeline::stages::naming::dedupe_names;
use calamine::{Data, Reader as _, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use polars::prelude::DataFrame;
use rust_xlsxwriter::{Workbook, XlsxError};
use std::io::Cursor;

pub fn decode(bytes: &[u8]) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| DatasetError::Decode(format!("invalid workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DatasetError::Decode("workbook has no sheets".to_owned()))?
        .map_err(|e| DatasetError::Decode(format!("failed to read first sheet: {e}")))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let names = dedupe_names(
        header
            .iter()
            .enumerate()
            .map(|(idx, value)| header_name(idx, value))
            .collect(),
    );

    let capacity = range.height().saturating_sub(1);
    let mut values: Vec<Vec<Cell>> = vec![Vec::with_capacity(capacity); names.len()];
    for row in rows {
        for (target, value) in values.iter_mut().zip(row) {
            target.push(convert_value(value));
        }
    }
    let columns = names
        .iter()
        .zip(&values)
        .map(|(name, cells)| frame::column_from_cells(name, cells))
        .collect();
    DataFrame::new(columns).map_err(|e| DatasetError::Decode(format!("invalid sheet: {e}")))
}

fn header_name(idx: usize, value: &Data) -> String {
    let name = convert_value(value).render().trim().to_owned();
    if name.is_empty() {
        format!("Unnamed: {idx}")
    } else {
        name
    }
}

fn convert_value(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Absent,
        Data::String(s) if s.is_empty() => Cell::Absent,
        Data::Float(v) => number_cell(*v),
        Data::Int(v) => Cell::Int(*v),
        Data::Bool(v) => Cell::Text(v.to_string()),
        Data::DateTime(v) if v.is_duration() => number_cell(v.as_f64()),
        Data::DateTime(v) => excel_serial_to_text(v.as_f64())
            .map_or_else(|| number_cell(v.as_f64()), Cell::Text),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

/// Sheets store every number as a double; whole values read back as integers.
fn number_cell(value: f64) -> Cell {
    if !value.is_finite() {
        Cell::Text(value.to_string())
    } else if value.fract() == 0.0 && value.abs() <= MAX_WHOLE {
        Cell::Int(value as i64)
    } else {
        Cell::Float(value)
    }
}

const MAX_WHOLE: f64 = 9_007_199_254_740_992.0;

/// Render a 1900-system serial date as `YYYY-MM-DD[ HH:MM:SS]`.
fn excel_serial_to_text(serial: f64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    let value = epoch.checked_add_signed(TimeDelta::try_milliseconds(millis as i64)?)?;
    Some(if value.time() == NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    })
}

fn encode_error(e: XlsxError) -> DatasetError {
    DatasetError::Encode(format!("failed to write workbook: {e}"))
}

pub fn encode(df: &DataFrame) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col_idx, column) in df.get_columns().iter().enumerate() {
        let col = u16::try_from(col_idx)
            .map_err(|_| DatasetError::Encode(format!("too many columns: {}", df.width())))?;
        worksheet
            .write_string(0, col, column.name().as_str())
            .map_err(encode_error)?;

        let cells = frame::cells(column).map_err(|e| DatasetError::Encode(e.to_string()))?;
        for (row_idx, cell) in cells.iter().enumerate() {
            let row = u32::try_from(row_idx + 1)
                .map_err(|_| DatasetError::Encode(format!("too many rows: {}", df.height())))?;
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(row, col, s).map_err(encode_error)?;
                }
                Cell::Int(n) => {
                    worksheet
                        .write_number(row, col, *n as f64)
                        .map_err(encode_error)?;
                }
                Cell::Float(n) => {
                    worksheet.write_number(row, col, *n).map_err(encode_error)?;
                }
                Cell::Absent => {}
            }
        }
    }

    workbook.save_to_buffer().map_err(encode_error)
}
