//! Pipeline stages.
//!
//! Each stage is a free function from a borrowed `DataFrame` to a new one,
//! so a stage that returns an error leaves its input as it was.

pub mod dedup;
pub mod flatten;
pub mod join;
pub mod missing;
pub mod naming;
pub mod rename;
pub mod split;
pub mod whitespace;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage identity, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    NormalizeNames,
    RenameColumns,
    TrimWhitespace,
    MissingValues,
    Deduplicate,
    SplitColumn,
    JoinColumns,
    FlattenNested,
}

impl Stage {
    /// Every stage, in the order the orchestrator runs them.
    pub const ALL: [Self; 8] = [
        Self::NormalizeNames,
        Self::RenameColumns,
        Self::TrimWhitespace,
        Self::MissingValues,
        Self::Deduplicate,
        Self::SplitColumn,
        Self::JoinColumns,
        Self::FlattenNested,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NormalizeNames => "normalize_names",
            Self::RenameColumns => "rename_columns",
            Self::TrimWhitespace => "trim_whitespace",
            Self::MissingValues => "missing_values",
            Self::Deduplicate => "deduplicate",
            Self::SplitColumn => "split_column",
            Self::JoinColumns => "join_columns",
            Self::FlattenNested => "flatten_nested",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
