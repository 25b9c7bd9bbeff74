//! Error type for graph construction and simulation.

use std::io;

use crate::schema::ConfigError;

/// Irrecoverable errors raised by element and simulation operations.
///
/// Recoverable conditions (unsupported factory labels, unreadable weight
/// files, duplicate element names) are reported through `Option`/`bool`
/// returns and a log line instead.
#[derive(Debug, thiserror::Error)]
pub enum DnfError {
    #[error("Element '{element}' has invalid parameters: {reason}")]
    InvalidParameter { element: String, reason: String },

    #[error("Element '{element}' cannot take a missing element as input")]
    NullInput { element: String },

    #[error("Element '{element}' already receives input from '{input}'")]
    InputAlreadyExists { element: String, input: String },

    #[error(
        "Element '{element}' expects an input of size {expected}, but '{input}' provides {found}"
    )]
    SizeMismatch {
        element: String,
        input: String,
        expected: usize,
        found: usize,
    },

    #[error("No element named '{0}'")]
    ElementNotFound(String),

    #[error("Element '{element}' has no component '{component}'")]
    ComponentNotFound { element: String, component: String },

    #[error("Index {index} is out of range for {len} elements")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Run duration must be positive, got {0}")]
    InvalidRunDuration(f64),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DnfError {
    pub(crate) fn invalid(element: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            element: element.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = DnfError> = std::result::Result<T, E>;
