//! Pipeline option validation.
//!
//! Validates options against the input's column names before any stage
//! runs. Column references are checked by simulating how each
//! name-affecting stage (normalize, rename, split, join) changes the column
//! list, so a split that refers to a normalized name is checked against the
//! normalized list.

use super::options::PipelineOptions;
use super::stages::{Stage, join, naming, rename, split};
use crate::error::DatasetError;

/// Validation error with the stage and option field it concerns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub stage: Stage,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn from_error(stage: Stage, err: DatasetError) -> Self {
        match err {
            DatasetError::Configuration { field, message, .. } => Self {
                stage,
                field,
                message,
            },
            other => Self {
                stage,
                field: "options".to_owned(),
                message: other.to_string(),
            },
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stage {} ({}): {}", self.stage, self.field, self.message)
    }
}

impl From<ValidationError> for DatasetError {
    fn from(err: ValidationError) -> Self {
        Self::Configuration {
            stage: Some(err.stage),
            field: err.field,
            message: err.message,
        }
    }
}

/// Validate options against the input column names.
///
/// Returns every problem found. A stage whose check fails is treated as a
/// no-op for the stages after it, so one mistake does not cascade into a
/// list of follow-on errors.
pub fn validate_options(options: &PipelineOptions, columns: &[String]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut current = columns.to_vec();

    if options.normalize_column_names {
        current = naming::normalized_names(&current, options.name_case);
    }

    if options.is_enabled(Stage::RenameColumns) {
        let pattern = match options
            .remove_pattern
            .as_deref()
            .map(rename::compile_pattern)
            .transpose()
        {
            Ok(pattern) => pattern,
            Err(e) => {
                errors.push(ValidationError::from_error(Stage::RenameColumns, e));
                None
            }
        };
        match rename::renamed_names(&current, options.rename_map.as_ref(), pattern.as_ref()) {
            Ok(names) => current = names,
            Err(e) => errors.push(ValidationError::from_error(Stage::RenameColumns, e)),
        }
    }

    if let Some(opts) = &options.split_column {
        match split::split_names(&current, opts) {
            Ok(names) => current = names,
            Err(e) => errors.push(ValidationError::from_error(Stage::SplitColumn, e)),
        }
    }

    if let Some(opts) = &options.join_columns {
        match join::join_names(&current, opts) {
            Ok(names) => current = names,
            Err(e) => errors.push(ValidationError::from_error(Stage::JoinColumns, e)),
        }
    }

    tracing::debug!(
        errors = errors.len(),
        columns_after_renames = current.len(),
        "validated pipeline options"
    );
    errors
}
