//! Error types and handling for `issue_tracker`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Wraps `anyhow` for ad-hoc failures outside the request path
//! - Groups every variant into an [`ErrorCategory`] so the request layer can
//!   pick a status without matching on individual variants
//! - Provides structured JSON output for scripted callers

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `issue_tracker` operations.
#[derive(Error, Debug)]
pub enum IssueError {
    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// One or more required create fields were absent or empty.
    #[error("missing inputs")]
    MissingInputs { fields: Vec<String> },

    /// An update carried no non-empty updatable field.
    #[error("no updated field sent")]
    NoUpdateFields,

    /// An id-less update would touch one of several records.
    #[error("Ambiguous update target: project '{project}' has {candidates} records, provide _id")]
    AmbiguousTarget { project: String, candidates: usize },

    // === Identifier Errors ===
    /// An identifier was required but not supplied.
    #[error("_id error")]
    MissingId,

    /// The supplied identifier is not a well-formed record id.
    #[error("Invalid _id: '{id}'")]
    InvalidId { id: String },

    // === Store Errors ===
    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The store rejected an update.
    #[error("could not update {id}")]
    UpdateFailed {
        id: String,
        #[source]
        source: Box<Self>,
    },

    /// The store rejected a delete.
    #[error("could not delete {id}")]
    DeleteFailed {
        id: String,
        #[source]
        source: Box<Self>,
    },

    /// Database file could not be opened at the given path.
    #[error("Database not available at '{path}': {reason}")]
    DatabaseUnavailable { path: PathBuf, reason: String },

    // === Configuration Errors ===
    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse error taxonomy used for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad request content; the caller can fix it.
    Validation,
    /// Missing, malformed or unknown identifier.
    Identifier,
    /// The record store failed.
    Store,
    /// Anything outside the request path.
    Internal,
}

impl ErrorCategory {
    /// HTTP-style status for errors in this category.
    #[must_use]
    pub const fn status(self) -> u16 {
        match self {
            Self::Validation | Self::Identifier => 400,
            Self::Store | Self::Internal => 500,
        }
    }
}

impl IssueError {
    /// Which part of the taxonomy this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. }
            | Self::MissingInputs { .. }
            | Self::NoUpdateFields
            | Self::AmbiguousTarget { .. } => ErrorCategory::Validation,
            Self::MissingId | Self::InvalidId { .. } => ErrorCategory::Identifier,
            Self::Database(_)
            | Self::UpdateFailed { .. }
            | Self::DeleteFailed { .. }
            | Self::DatabaseUnavailable { .. } => ErrorCategory::Store,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Yaml(_) | Self::Other(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Can the caller fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Validation | ErrorCategory::Identifier
        ) || matches!(self, Self::Config(_) | Self::DatabaseUnavailable { .. })
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MissingInputs { .. } => {
                Some("Provide non-empty issue_title, issue_text and created_by")
            }
            Self::NoUpdateFields => Some(
                "Send at least one of issue_title, issue_text, created_by, assigned_to, status_text, open",
            ),
            Self::AmbiguousTarget { .. } => Some("Pass _id to choose the record to update"),
            Self::MissingId => Some("Pass the record _id"),
            Self::InvalidId { .. } => Some("An _id is 24 hexadecimal characters"),
            Self::DatabaseUnavailable { .. } => Some("Check --db or ISSUES_DB"),
            _ => None,
        }
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a store failure raised while updating `id`.
    #[must_use]
    pub fn update_failed(id: impl Into<String>, source: Self) -> Self {
        Self::UpdateFailed {
            id: id.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a store failure raised while deleting `id`.
    #[must_use]
    pub fn delete_failed(id: impl Into<String>, source: Self) -> Self {
        Self::DeleteFailed {
            id: id.into(),
            source: Box::new(source),
        }
    }
}

/// Result type using `IssueError`.
pub type Result<T> = std::result::Result<T, IssueError>;
