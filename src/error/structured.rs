//! Structured error output for scripted callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging

use crate::error::IssueError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Validation Errors (exit code 4) ===
    /// Field validation failed
    ValidationFailed,
    /// Required create fields missing or empty
    MissingInputs,
    /// Update carried nothing to update
    NoUpdateFields,
    /// Id-less update matched several records
    AmbiguousTarget,

    // === Identifier Errors (exit code 3) ===
    /// Identifier required but absent
    MissingId,
    /// Identifier malformed
    InvalidId,

    // === Store Errors (exit code 2) ===
    /// Database operation failed
    DatabaseError,
    /// Update rejected by the store
    UpdateFailed,
    /// Delete rejected by the store
    DeleteFailed,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::MissingInputs => "MISSING_INPUTS",
            Self::NoUpdateFields => "NO_UPDATE_FIELDS",
            Self::AmbiguousTarget => "AMBIGUOUS_TARGET",
            Self::MissingId => "MISSING_ID",
            Self::InvalidId => "INVALID_ID",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller might succeed by fixing the input and retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed
                | Self::MissingInputs
                | Self::NoUpdateFields
                | Self::AmbiguousTarget
                | Self::MissingId
                | Self::InvalidId
        )
    }

    /// Get the process exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Store errors
    /// - 3: Identifier errors
    /// - 4: Validation errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DatabaseError | Self::UpdateFailed | Self::DeleteFailed => 2,
            Self::MissingId | Self::InvalidId => 3,
            Self::ValidationFailed
            | Self::MissingInputs
            | Self::NoUpdateFields
            | Self::AmbiguousTarget => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }

    /// HTTP-style status for this code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::ValidationFailed
            | Self::MissingInputs
            | Self::NoUpdateFields
            | Self::AmbiguousTarget
            | Self::MissingId
            | Self::InvalidId => 400,
            _ => 500,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from an `IssueError`.
    #[must_use]
    pub fn from_error(err: &IssueError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);

        Self {
            code,
            message: err.to_string(),
            hint: err.suggestion().map(str::to_string),
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &IssueError) -> (ErrorCode, Option<Value>) {
        match err {
            IssueError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            IssueError::MissingInputs { fields } => {
                (ErrorCode::MissingInputs, Some(json!({"fields": fields})))
            }
            IssueError::NoUpdateFields => (ErrorCode::NoUpdateFields, None),
            IssueError::AmbiguousTarget {
                project,
                candidates,
            } => (
                ErrorCode::AmbiguousTarget,
                Some(json!({"project": project, "candidates": candidates})),
            ),
            IssueError::MissingId => (ErrorCode::MissingId, None),
            IssueError::InvalidId { id } => (ErrorCode::InvalidId, Some(json!({"id": id}))),
            IssueError::Database(_) => (ErrorCode::DatabaseError, None),
            IssueError::DatabaseUnavailable { path, .. } => (
                ErrorCode::DatabaseError,
                Some(json!({"path": path.display().to_string()})),
            ),
            IssueError::UpdateFailed { id, source } => (
                ErrorCode::UpdateFailed,
                Some(json!({"id": id, "cause": source.to_string()})),
            ),
            IssueError::DeleteFailed { id, source } => (
                ErrorCode::DeleteFailed,
                Some(json!({"id": id, "cause": source.to_string()})),
            ),
            IssueError::Config(_) => (ErrorCode::ConfigError, None),
            IssueError::Io(_) => (ErrorCode::IoError, None),
            IssueError::Json(_) => (ErrorCode::JsonError, None),
            IssueError::Yaml(_) => (ErrorCode::YamlError, None),
            IssueError::Other(_) => (ErrorCode::InternalError, None),
        }
    }
}
