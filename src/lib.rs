//! # dataset-tool
//!
//! Cleans and reshapes uploaded tabular datasets. An upload (CSV or
//! workbook bytes plus its filename) is decoded into a polars `DataFrame`,
//! run through an ordered set of optional cleaning stages, and encoded back
//! to the same format family together with a [`pipeline::RunReport`].
//!
//! ## Quick Start
//!
//! ```
//! use dataset_tool::config::AppSettings;
//! use dataset_tool::pipeline::PipelineOptions;
//! use dataset_tool::service::process_upload;
//!
//! let csv = b"First Name,age!\nAlice,30\nbob,\n";
//! let options = PipelineOptions::from_json(
//!     r#"{"normalize_column_names": true,
//!         "missing_policy": {"method": "fill_constant", "value": "unknown"}}"#,
//! )?;
//!
//! let out = process_upload(csv, "people.csv", &options, &AppSettings::default())?;
//! assert_eq!(out.filename, "converted_people.csv");
//! assert_eq!(
//!     String::from_utf8_lossy(&out.bytes),
//!     "First_Name,Age\nAlice,30\nbob,unknown\n"
//! );
//! # Ok::<(), dataset_tool::error::DatasetError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`frame`]: column typing and rendering over polars frames
//! - [`io`]: CSV and workbook codecs, format detection
//! - [`pipeline`]: options, validation, stages and the run report
//! - [`service`]: decode, transform and encode in one call
//! - [`config`]: user settings (`config.json`)
//! - [`logging`]: `tracing` subscriber setup
//! - [`error`]: error type shared by all of the above

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod frame;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod service;
