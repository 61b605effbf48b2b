//! Column typing and rendering over polars frames.
//!
//! A table is a polars [`DataFrame`] with unique column names. Every column
//! has one dtype: `String` for text, `Int64` or `Float64` for numbers. A
//! null is an absent cell, which is distinct from an empty string. A column
//! is numeric only when every present value is a number, so a column mixing
//! text and numbers is a text column.
//!
//! Numbers are inferred from text only when the field is written exactly the
//! way the number renders back (`30`, `2.5`, but not `007`, `1.10` or
//! `1e3`). Re-encoding a column that no stage touched therefore reproduces
//! its fields.

use crate::error::{DatasetError, Result};
use polars::prelude::*;
use std::borrow::Cow;

/// A single value, for code that builds or reads columns cell by cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    /// Always finite.
    Float(f64),
    Absent,
}

impl Cell {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value, if representable as `f64` without loss.
    fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(n) if n.unsigned_abs() <= MAX_EXACT_INT => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text rendering used by the codecs, split and join. Absent renders as "".
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s),
            Self::Int(n) => Cow::Owned(n.to_string()),
            Self::Float(f) => Cow::Owned(render_float(*f)),
            Self::Absent => Cow::Borrowed(""),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Largest integer magnitude every `f64` can hold exactly (2^53).
const MAX_EXACT_INT: u64 = 1 << 53;

/// Shortest text that parses back to the same float.
pub fn render_float(value: f64) -> String {
    value.to_string()
}

fn parse_int(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|n| n.to_string() == raw)
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && render_float(*f) == raw)
}

/// Parse every present field, or `None` if any field does not parse.
fn parse_all<T>(
    fields: &[Option<&str>],
    parse: impl Fn(&str) -> Option<T>,
) -> Option<Vec<Option<T>>> {
    fields
        .iter()
        .map(|field| match field {
            Some(raw) => parse(raw).map(Some),
            None => Some(None),
        })
        .collect()
}

/// Type a column of raw text fields.
///
/// Empty fields become absent. With `infer_numbers` the column becomes
/// `Int64` when every present field is a canonical integer, `Float64` when
/// every present field is a canonical finite number, and stays text
/// otherwise. An all-absent column is text.
pub fn text_column(name: &str, fields: &StringChunked, infer_numbers: bool) -> Column {
    let fields: Vec<Option<&str>> = fields
        .into_iter()
        .map(|field| field.filter(|s| !s.is_empty()))
        .collect();

    if infer_numbers && fields.iter().any(Option::is_some) {
        if let Some(ints) = parse_all(&fields, parse_int) {
            return Series::new(name.into(), ints).into_column();
        }
        if let Some(floats) = parse_all(&fields, parse_float) {
            return Series::new(name.into(), floats).into_column();
        }
    }
    Series::new(name.into(), fields).into_column()
}

/// Build a column from cells, typed by the values present.
///
/// All integers give `Int64`; integers and floats together give `Float64`
/// as long as every integer converts exactly. Anything else gives a text
/// column holding each value's rendering.
pub fn column_from_cells(name: &str, cells: &[Cell]) -> Column {
    if cells.iter().any(|c| !c.is_absent()) {
        if cells.iter().all(|c| c.is_absent() || c.as_int().is_some()) {
            let values: Vec<Option<i64>> = cells.iter().map(Cell::as_int).collect();
            return Series::new(name.into(), values).into_column();
        }
        if cells.iter().all(|c| c.is_absent() || c.as_float().is_some()) {
            let values: Vec<Option<f64>> = cells.iter().map(Cell::as_float).collect();
            return Series::new(name.into(), values).into_column();
        }
    }
    let values: Vec<Option<String>> = cells
        .iter()
        .map(|c| (!c.is_absent()).then(|| c.render().into_owned()))
        .collect();
    Series::new(name.into(), values).into_column()
}

pub fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_integer() || dtype.is_float()
}

/// Read a column back as cells.
pub fn cells(column: &Column) -> Result<Vec<Cell>> {
    let series = column.as_materialized_series();
    let dtype = series.dtype();
    let cells = if dtype.is_integer() {
        series
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| v.map_or(Cell::Absent, Cell::Int))
            .collect()
    } else if dtype.is_float() {
        series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.map_or(Cell::Absent, Cell::Float))
            .collect()
    } else {
        series
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map_or(Cell::Absent, Cell::from))
            .collect()
    };
    Ok(cells)
}

/// The column as text, numbers rendered the way the codecs write them.
pub fn rendered(column: &Column) -> Result<Column> {
    if column.dtype() == &DataType::String {
        return Ok(column.clone());
    }
    let values: Vec<Option<String>> = cells(column)?
        .iter()
        .map(|c| (!c.is_absent()).then(|| c.render().into_owned()))
        .collect();
    Ok(Series::new(column.name().clone(), values).into_column())
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

/// Same columns, in order, under `names`.
pub fn with_names(df: &DataFrame, names: &[String]) -> Result<DataFrame> {
    if names.len() != df.width() {
        return Err(DatasetError::fault(format!(
            "{} names given for {} columns",
            names.len(),
            df.width()
        )));
    }
    let columns = df
        .get_columns()
        .iter()
        .zip(names)
        .map(|(column, name)| column.clone().with_name(name.as_str().into()))
        .collect();
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(fields: &[Option<&str>]) -> Result<(DataType, Vec<Cell>)> {
        let raw = StringChunked::from_iter_options("f".into(), fields.iter().copied());
        let column = text_column("f", &raw, true);
        Ok((column.dtype().clone(), cells(&column)?))
    }

    #[test]
    fn test_integer_columns_stay_exact() -> Result<()> {
        let (dtype, values) = typed(&[Some("9007199254740993"), Some("-4"), Some("")])?;
        assert_eq!(dtype, DataType::Int64);
        assert_eq!(
            values,
            vec![Cell::Int(9_007_199_254_740_993), Cell::Int(-4), Cell::Absent]
        );
        Ok(())
    }

    #[test]
    fn test_float_columns() -> Result<()> {
        let (dtype, values) = typed(&[Some("1"), Some("2.5"), None])?;
        assert_eq!(dtype, DataType::Float64);
        assert_eq!(values, vec![Cell::Float(1.0), Cell::Float(2.5), Cell::Absent]);
        Ok(())
    }

    #[test]
    fn test_non_canonical_numbers_stay_text() -> Result<()> {
        for fields in [
            [Some("007"), Some("abc")],
            [Some("007"), Some("8")],
            [Some("1.10"), Some("2")],
            [Some(" 41"), Some("3")],
            [Some("1e3"), Some("NaN")],
        ] {
            let (dtype, values) = typed(&fields)?;
            assert_eq!(dtype, DataType::String, "{fields:?}");
            assert_eq!(values[0].render(), fields[0].unwrap_or_default());
        }
        Ok(())
    }

    #[test]
    fn test_inference_can_be_disabled() -> Result<()> {
        let raw = StringChunked::from_iter_options("f".into(), [Some("30"), Some("")].into_iter());
        let column = text_column("f", &raw, false);
        assert_eq!(cells(&column)?, vec![Cell::from("30"), Cell::Absent]);
        Ok(())
    }

    #[test]
    fn test_column_from_cells() -> Result<()> {
        let ints = column_from_cells("a", &[Cell::Int(1), Cell::Absent]);
        assert_eq!(ints.dtype(), &DataType::Int64);

        let numbers = column_from_cells("a", &[Cell::Int(1), Cell::Float(2.5)]);
        assert_eq!(cells(&numbers)?, vec![Cell::Float(1.0), Cell::Float(2.5)]);

        let mixed = column_from_cells("a", &[Cell::Int(7), Cell::from("x"), Cell::Absent]);
        assert_eq!(
            cells(&mixed)?,
            vec![Cell::from("7"), Cell::from("x"), Cell::Absent]
        );

        let empty = column_from_cells("a", &[Cell::Absent, Cell::Absent]);
        assert_eq!(empty.dtype(), &DataType::String);
        Ok(())
    }

    #[test]
    fn test_rendered() -> Result<()> {
        let df = df! {
            "n" => &[Some(30.0), Some(2.5), None],
        }?;
        let text = rendered(df.column("n")?)?;
        assert_eq!(
            cells(&text)?,
            vec![Cell::from("30"), Cell::from("2.5"), Cell::Absent]
        );
        Ok(())
    }

    #[test]
    fn test_with_names() -> Result<()> {
        let df = df! {
            "a" => &[1_i64],
            "b" => &["x"],
        }?;
        let renamed = with_names(&df, &["b".to_owned(), "a".to_owned()])?;
        assert_eq!(column_names(&renamed), vec!["b", "a"]);
        assert_eq!(cells(renamed.column("b")?)?, vec![Cell::Int(1)]);

        assert!(with_names(&df, &["x".to_owned(), "x".to_owned()]).is_err());
        assert!(with_names(&df, &["x".to_owned()]).is_err());
        Ok(())
    }
}
