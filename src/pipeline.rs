//! Column/row transformation pipeline.
//!
//! A run takes a decoded polars `DataFrame` and a
//! [`PipelineOptions`] document and applies the enabled stages in a fixed
//! order:
//!
//! 1. **normalize names**: `First Name` -> `First_Name`
//! 2. **rename / remove-by-pattern**: explicit renames, then regex deletion
//! 3. **trim cells**: surrounding whitespace in text cells
//! 4. **missing values**: drop rows, fill a constant, or fill column means
//! 5. **deduplicate**: drop rows identical to an earlier one
//! 6. **split**: one column into several on a separator
//! 7. **join**: several columns into one
//! 8. **flatten**: JSON-object cells into dotted columns
//!
//! Options are validated against the input's column names before any stage
//! runs, so a bad reference fails the run without touching the table.
//!
//! # Example
//!
//! ```
//! use dataset_tool::frame;
//! use dataset_tool::pipeline::{PipelineOptions, run_pipeline};
//! use polars::prelude::*;
//!
//! let table = df! {
//!     "First Name" => &["Alice"],
//!     "age!" => &[30_i64],
//! }?;
//! let options = PipelineOptions::from_json(r#"{"normalize_column_names": true}"#)?;
//!
//! let out = run_pipeline(table, &options)?;
//! assert_eq!(frame::column_names(&out.table), vec!["First_Name", "Age"]);
//! println!("{}", out.report.summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod executor;
pub mod options;
pub mod report;
pub mod stages;
pub mod validation;

pub use executor::{Transformed, check_options, run_pipeline};
pub use options::{JoinColumns, MissingPolicy, NameCase, PipelineOptions, SplitColumn};
pub use report::{Anomaly, RunReport, StageOutcome};
pub use stages::Stage;
pub use validation::{ValidationError, validate_options};
