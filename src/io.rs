//! Table codecs.
//!
//! The declared filename picks the format. CSV is read and written through
//! `polars`, workbooks are read with `calamine` and written with
//! `rust_xlsxwriter`. Both legacy `.xls` and `.xlsx` uploads come back as
//! `.xlsx`.

pub mod csv;
pub mod workbook;

use crate::config::AppSettings;
use crate::error::{DatasetError, Result};
use encoding_rs::Encoding;
use polars::prelude::DataFrame;
use std::path::Path;

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Xlsx,
    Xls,
}

impl Format {
    /// Infer the format from a filename extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            "xls" => Ok(Self::Xls),
            "" => Err(DatasetError::config_field(
                "filename",
                format!("'{filename}' has no extension"),
            )),
            _ => Err(DatasetError::config_field(
                "filename",
                format!("unsupported file extension: .{ext}"),
            )),
        }
    }

    /// Format the converted table is written in.
    pub fn output_format(self) -> Self {
        match self {
            Self::Xls => Self::Xlsx,
            other => other,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Xls => "application/vnd.ms-excel",
        }
    }
}

/// Suggested name for the converted file: `<prefix><stem>.<ext>`.
pub fn output_filename(input: &str, prefix: &str) -> Result<String> {
    let format = Format::from_filename(input)?.output_format();
    let stem = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data");
    Ok(format!("{prefix}{stem}.{}", format.extension()))
}

/// Decoder settings
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Single-byte encoding tried when CSV bytes are not valid UTF-8
    pub fallback_encoding: &'static Encoding,
    pub infer_numbers: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            fallback_encoding: encoding_rs::WINDOWS_1252,
            infer_numbers: true,
        }
    }
}

impl DecodeOptions {
    pub fn from_settings(settings: &AppSettings) -> Result<Self> {
        Ok(Self {
            fallback_encoding: settings.fallback_encoding()?,
            infer_numbers: settings.infer_numbers,
        })
    }
}

pub fn decode(bytes: &[u8], format: Format, options: &DecodeOptions) -> Result<DataFrame> {
    let df = match format {
        Format::Csv => csv::decode(bytes, options)?,
        Format::Xlsx | Format::Xls => workbook::decode(bytes)?,
    };
    tracing::debug!(
        format = format.extension(),
        rows = df.height(),
        columns = df.width(),
        "decoded table"
    );
    Ok(df)
}

/// Encode in the output format of `format`.
pub fn encode(df: &DataFrame, format: Format) -> Result<Vec<u8>> {
    match format.output_format() {
        Format::Csv => csv::encode(df),
        _ => workbook::encode(df),
    }
}
