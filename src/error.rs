//! Error types for the finder engine.
//!
//! Every engine operation either completes a whole step or fails with one of
//! these variants before any state is committed.

use std::fmt;

use thiserror::Error;

/// Kind of entity an id failed to resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Tool,
    Criterion,
    Question,
    Option,
    Condition,
    Preset,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Tool => "tool",
            EntityKind::Criterion => "criterion",
            EntityKind::Question => "question",
            EntityKind::Option => "option",
            EntityKind::Condition => "filter condition",
            EntityKind::Preset => "preset",
        };
        f.write_str(name)
    }
}

/// Errors raised by the finder engine.
#[derive(Debug, Error)]
pub enum FinderError {
    /// Out-of-range weight, malformed filter selector, bad reorder request.
    #[error("validation error: {0}")]
    Validation(String),

    /// Catalog or question table is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown {kind} '{id}'")]
    NotFound { kind: EntityKind, id: String },

    /// The operation is not allowed in the current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl FinderError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        FinderError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        FinderError::Validation(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        FinderError::Config(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        FinderError::InvalidOperation(message.into())
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            FinderError::Validation(_) => "validation",
            FinderError::Config(_) => "config",
            FinderError::NotFound { .. } => "not_found",
            FinderError::InvalidOperation(_) => "invalid_operation",
            FinderError::Io(_) => "io",
            FinderError::Json(_) | FinderError::Yaml(_) => "parse",
        }
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;
