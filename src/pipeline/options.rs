//! Pipeline option data structures.
//!
//! Options arrive as one JSON document per request. Every stage is an
//! explicit, independently optional field; unknown fields are rejected so a
//! typo fails the request instead of silently skipping a stage.

use super::stages::Stage;
use crate::error::{DatasetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Root options structure for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineOptions {
    /// Trim, underscore, strip punctuation and re-case column names
    #[serde(default)]
    pub normalize_column_names: bool,

    /// Casing rule applied by name normalization
    #[serde(default)]
    pub name_case: NameCase,

    /// Explicit column renames, applied simultaneously
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_map: Option<BTreeMap<String, String>>,

    /// Regex whose matches are deleted from every column name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_pattern: Option<String>,

    /// Trim leading/trailing whitespace in text cells
    #[serde(default)]
    pub trim_cell_whitespace: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_policy: Option<MissingPolicy>,

    /// Drop rows identical to an earlier row
    #[serde(default)]
    pub remove_duplicates: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_column: Option<SplitColumn>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_columns: Option<JoinColumns>,

    /// Expand JSON-object text cells into dotted columns
    #[serde(default)]
    pub flatten_nested: bool,
}

impl PipelineOptions {
    /// Load options from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse options from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(DatasetError::from)
    }

    /// Serialize options to a JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DatasetError::Encode(e.to_string()))
    }

    pub fn is_enabled(&self, stage: Stage) -> bool {
        match stage {
            Stage::NormalizeNames => self.normalize_column_names,
            Stage::RenameColumns => self.rename_map.is_some() || self.remove_pattern.is_some(),
            Stage::TrimWhitespace => self.trim_cell_whitespace,
            Stage::MissingValues => self.missing_policy.is_some(),
            Stage::Deduplicate => self.remove_duplicates,
            Stage::SplitColumn => self.split_column.is_some(),
            Stage::JoinColumns => self.join_columns.is_some(),
            Stage::FlattenNested => self.flatten_nested,
        }
    }

    /// Enabled stages in execution order
    pub fn enabled_stages(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|stage| self.is_enabled(*stage))
            .collect()
    }
}

/// Casing rule for normalized column names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    /// `first_name` -> `First_Name`
    #[default]
    Title,
    Lower,
    Upper,
    /// Keep the original letters
    Preserve,
}

/// Missing-value handling, tagged by `method`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Remove rows with any absent cell
    Drop,

    /// Replace absent cells with a literal
    #[serde(alias = "fill_const")]
    FillConstant {
        #[serde(default)]
        value: Option<String>,
    },

    /// Replace absent cells of numeric columns with the column mean
    FillMean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitColumn {
    #[serde(alias = "col")]
    pub source_column: String,

    #[serde(alias = "sep")]
    pub separator: String,

    /// Maximum separators consumed; unbounded when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_splits: Option<usize>,

    #[serde(alias = "new_cols")]
    pub new_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinColumns {
    #[serde(alias = "cols")]
    pub source_columns: Vec<String>,

    #[serde(alias = "sep")]
    pub separator: String,

    #[serde(alias = "new_col")]
    pub new_column: String,
}
