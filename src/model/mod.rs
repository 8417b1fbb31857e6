//! Core data types for `issue_tracker`.
//!
//! - `Issue` - A stored record
//! - `NewIssue` - A validated record awaiting an identifier
//! - `IssueView` - What a client sees of a record
//! - `TextField` / `TimestampField` - Named record columns

use crate::util::{IssueId, Timestamp};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A string-valued record field that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    IssueTitle,
    IssueText,
    CreatedBy,
    AssignedTo,
    StatusText,
}

impl TextField {
    pub const ALL: [Self; 5] = [
        Self::IssueTitle,
        Self::IssueText,
        Self::CreatedBy,
        Self::AssignedTo,
        Self::StatusText,
    ];

    /// Wire name, also the storage column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IssueTitle => "issue_title",
            Self::IssueText => "issue_text",
            Self::CreatedBy => "created_by",
            Self::AssignedTo => "assigned_to",
            Self::StatusText => "status_text",
        }
    }

    /// Fields that must be non-empty on every stored record.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self, Self::IssueTitle | Self::IssueText | Self::CreatedBy)
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampField {
    CreatedOn,
    UpdatedOn,
}

impl TimestampField {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedOn => "created_on",
            Self::UpdatedOn => "updated_on",
        }
    }
}

impl fmt::Display for TimestampField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An issue record as held by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    #[serde(rename = "_id")]
    pub id: IssueId,
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_on: Timestamp,
    pub updated_on: Timestamp,
    pub created_by: String,
    pub assigned_to: String,
    pub open: bool,
    pub status_text: String,
}

impl Issue {
    /// The client-facing view with or without `project`.
    #[must_use]
    pub fn into_view(self, include_project: bool) -> IssueView {
        IssueView {
            id: self.id,
            project: include_project.then_some(self.project),
            issue_title: self.issue_title,
            issue_text: self.issue_text,
            created_on: self.created_on,
            updated_on: self.updated_on,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            open: self.open,
            status_text: self.status_text,
        }
    }
}

/// A validated record ready for insertion. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub open: bool,
    pub created_on: Timestamp,
    pub updated_on: Timestamp,
}

impl NewIssue {
    /// Attach the store-assigned identifier.
    #[must_use]
    pub fn with_id(self, id: IssueId) -> Issue {
        Issue {
            id,
            project: self.project,
            issue_title: self.issue_title,
            issue_text: self.issue_text,
            created_on: self.created_on,
            updated_on: self.updated_on,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            open: self.open,
            status_text: self.status_text,
        }
    }
}

/// An issue as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Issue")]
pub struct IssueView {
    /// Store-assigned identifier, 24 lowercase hex characters.
    #[serde(rename = "_id")]
    pub id: IssueId,
    /// Owning project; omitted from client responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub issue_title: String,
    pub issue_text: String,
    pub created_on: Timestamp,
    pub updated_on: Timestamp,
    pub created_by: String,
    pub assigned_to: String,
    pub open: bool,
    pub status_text: String,
}
