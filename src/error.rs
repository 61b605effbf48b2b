//! Centralized error handling for dataset-tool.
//!
//! Every fallible library operation returns [`Result<T>`], whose error type
//! [`DatasetError`] sorts failures into the categories a caller needs to
//! react to:
//!
//! | Variant          | Raised by                         | Caller's fault? |
//! |------------------|-----------------------------------|-----------------|
//! | `Decode`         | CSV / workbook readers            | yes             |
//! | `Configuration`  | option parsing, validation, stages| yes             |
//! | `TransformFault` | pipeline stages (broken invariant)| no              |
//! | `Encode`         | CSV / workbook writers            | no              |
//! | `Io`             | settings and CLI file access      | no              |
//!
//! The boundary layer maps [`DatasetError::is_client_error`] onto its own
//! status vocabulary (HTTP 4xx/5xx, process exit codes, ...).
//!
//! ```
//! use dataset_tool::error::DatasetError;
//!
//! let err = DatasetError::config_field("split_column.source_column", "column 'Name' not found");
//! assert_eq!(err.kind(), "configuration_error");
//! assert!(err.is_client_error());
//! ```

use crate::pipeline::Stage;
use polars::error::PolarsError;
use std::fmt;

/// Main error type for dataset-tool operations.
#[derive(Debug)]
pub enum DatasetError {
    /// Input bytes could not be parsed as the declared format.
    Decode(String),

    /// Options are malformed, reference unknown columns, or would produce a
    /// name collision.
    Configuration {
        /// Stage that rejected the options, when known.
        stage: Option<Stage>,
        /// Dotted path of the offending option field.
        field: String,
        message: String,
    },

    /// An internal invariant broke while a stage was running.
    TransformFault { stage: Option<Stage>, message: String },

    /// The transformed table could not be serialized.
    Encode(String),

    /// I/O errors (settings files, CLI input and output)
    Io(std::io::Error),
}

impl DatasetError {
    /// Configuration error for an option field, not yet tied to a stage.
    pub fn config_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            stage: None,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self::TransformFault {
            stage: None,
            message: message.into(),
        }
    }

    /// Attach the stage that raised this error. An already attached stage wins.
    #[must_use]
    pub fn in_stage(self, at: Stage) -> Self {
        match self {
            Self::Configuration {
                stage,
                field,
                message,
            } => Self::Configuration {
                stage: stage.or(Some(at)),
                field,
                message,
            },
            Self::TransformFault { stage, message } => Self::TransformFault {
                stage: stage.or(Some(at)),
                message,
            },
            other => other,
        }
    }

    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_error",
            Self::Configuration { .. } => "configuration_error",
            Self::TransformFault { .. } => "transform_fault",
            Self::Encode(_) => "encode_error",
            Self::Io(_) => "io_error",
        }
    }

    /// True when the request itself was at fault (bad bytes or bad options).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Configuration { .. })
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Configuration { stage, .. } | Self::TransformFault { stage, .. } => *stage,
            _ => None,
        }
    }
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(msg) => write!(f, "Decode error: {msg}"),
            Self::Configuration {
                stage: Some(stage),
                field,
                message,
            } => write!(f, "Configuration error in stage '{stage}' ({field}): {message}"),
            Self::Configuration {
                stage: None,
                field,
                message,
            } => write!(f, "Configuration error ({field}): {message}"),
            Self::TransformFault {
                stage: Some(stage),
                message,
            } => write!(f, "Transform fault in stage '{stage}': {message}"),
            Self::TransformFault {
                stage: None,
                message,
            } => write!(f, "Transform fault: {message}"),
            Self::Encode(msg) => write!(f, "Encode error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

// Options arrive as JSON; a document that does not deserialize is a request problem.
impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        Self::config_field("options", format!("invalid options JSON: {err}"))
    }
}

// Codecs map their polars errors explicitly; anything left is a stage failure.
impl From<PolarsError> for DatasetError {
    fn from(err: PolarsError) -> Self {
        Self::fault(err.to_string())
    }
}

/// Result type alias for dataset-tool operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
