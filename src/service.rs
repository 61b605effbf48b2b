//! Upload processing facade: decode, transform, encode.

use crate::config::AppSettings;
use crate::error::Result;
use crate::io::{self, DecodeOptions, Format};
use crate::pipeline::{PipelineOptions, RunReport, run_pipeline};
use polars::prelude::DataFrame;

/// A converted upload, ready to hand back to the caller
#[derive(Debug, Clone)]
pub struct ProcessedUpload {
    pub bytes: Vec<u8>,
    /// Suggested download name, e.g. `converted_sales.csv`
    pub filename: String,
    pub format: Format,
    pub report: RunReport,
}

impl ProcessedUpload {
    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }
}

/// Decode an upload using the settings' encoding and inference rules.
pub fn decode_upload(bytes: &[u8], filename: &str, settings: &AppSettings) -> Result<DataFrame> {
    let format = Format::from_filename(filename)?;
    let options = DecodeOptions::from_settings(settings)?;
    io::decode(bytes, format, &options)
}

/// Run one upload through the full pipeline.
///
/// Nothing is written to disk; the caller decides what to do with the
/// returned bytes and report.
pub fn process_upload(
    bytes: &[u8],
    filename: &str,
    options: &PipelineOptions,
    settings: &AppSettings,
) -> Result<ProcessedUpload> {
    let format = Format::from_filename(filename)?;
    let output_name = io::output_filename(filename, &settings.output_prefix)?;
    tracing::info!(filename, size = bytes.len(), "processing upload");

    let table = decode_upload(bytes, filename, settings)?;
    let transformed = run_pipeline(table, options)?;
    let output_format = format.output_format();
    let encoded = io::encode(&transformed.table, output_format)?;

    tracing::info!(output = %output_name, size = encoded.len(), "upload converted");
    Ok(ProcessedUpload {
        bytes: encoded,
        filename: output_name,
        format: output_format,
        report: transformed.report,
    })
}
