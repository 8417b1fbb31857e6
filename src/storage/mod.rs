//! Record storage.
//!
//! The compilers produce the plain data types in this module; a
//! [`RecordStore`] executes them. [`SqliteStorage`] is the bundled store.

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteStorage;

use crate::error::{IssueError, Result};
use crate::model::{Issue, IssueView, NewIssue, TextField, TimestampField};
use crate::util::{IssueId, Timestamp};
use std::fmt;
use std::str::FromStr;

/// A persistence service holding issue records, scoped by project.
pub trait RecordStore {
    /// Insert a validated record and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    fn insert(&mut self, issue: NewIssue) -> Result<Issue>;

    /// Return every record satisfying `predicate`, shaped by `projection`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn find(&self, predicate: &Predicate, projection: &Projection) -> Result<Vec<IssueView>>;

    /// Apply `changes` to at most one record chosen by `selector`.
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousTarget` under [`UpdateTargetPolicy::RejectAmbiguous`],
    /// or an error if the store rejects the write.
    fn update_one(&mut self, selector: &Selector, changes: &FieldSet) -> Result<UpdateOutcome>;

    /// Remove at most one record matching both id and project.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    fn delete_one(&mut self, selector: &DeleteSelector) -> Result<DeleteOutcome>;
}

/// Match criterion for a timestamp field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampCriterion {
    /// Equal to this instant.
    At(Timestamp),
    /// The client sent something that is not a date. Matches no record.
    Invalid(String),
}

/// One AND-ed condition of a [`Predicate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Id(IssueId),
    Text { field: TextField, value: String },
    Timestamp {
        field: TimestampField,
        criterion: TimestampCriterion,
    },
    Open(bool),
}

/// Which records a query selects. Always scoped to one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub project: String,
    pub clauses: Vec<Clause>,
}

impl Predicate {
    #[must_use]
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            clauses: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// True when some clause can never be satisfied.
    #[must_use]
    pub fn matches_nothing(&self) -> bool {
        self.clauses.iter().any(|clause| {
            matches!(
                clause,
                Clause::Timestamp {
                    criterion: TimestampCriterion::Invalid(_),
                    ..
                }
            )
        })
    }
}

/// Which record fields a read returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub include_project: bool,
}

impl Projection {
    /// Everything except `project`.
    #[must_use]
    pub const fn client() -> Self {
        Self {
            include_project: false,
        }
    }

    #[must_use]
    pub const fn full() -> Self {
        Self {
            include_project: true,
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::client()
    }
}

/// How an update without `_id` chooses its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateTargetPolicy {
    /// Update the first record of the project in store order.
    #[default]
    FirstMatch,
    /// Refuse when the project holds more than one record.
    RejectAmbiguous,
}

impl UpdateTargetPolicy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FirstMatch => "first-match",
            Self::RejectAmbiguous => "reject-ambiguous",
        }
    }
}

impl fmt::Display for UpdateTargetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateTargetPolicy {
    type Err = IssueError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "first-match" | "first" => Ok(Self::FirstMatch),
            "reject-ambiguous" | "reject" => Ok(Self::RejectAmbiguous),
            other => Err(IssueError::Config(format!(
                "invalid update-target '{other}': expected first-match or reject-ambiguous"
            ))),
        }
    }
}

/// Target of an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub project: String,
    pub id: Option<IssueId>,
    pub policy: UpdateTargetPolicy,
}

/// Partial-update document. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
    pub updated_on: Timestamp,
}

impl FieldSet {
    /// A field set that only stamps `updated_on`.
    #[must_use]
    pub const fn touch(updated_on: Timestamp) -> Self {
        Self {
            issue_title: None,
            issue_text: None,
            created_by: None,
            assigned_to: None,
            status_text: None,
            open: None,
            updated_on,
        }
    }

    #[must_use]
    pub const fn text(&self, field: TextField) -> Option<&String> {
        match field {
            TextField::IssueTitle => self.issue_title.as_ref(),
            TextField::IssueText => self.issue_text.as_ref(),
            TextField::CreatedBy => self.created_by.as_ref(),
            TextField::AssignedTo => self.assigned_to.as_ref(),
            TextField::StatusText => self.status_text.as_ref(),
        }
    }

    pub fn set_text(&mut self, field: TextField, value: String) {
        let slot = match field {
            TextField::IssueTitle => &mut self.issue_title,
            TextField::IssueText => &mut self.issue_text,
            TextField::CreatedBy => &mut self.created_by,
            TextField::AssignedTo => &mut self.assigned_to,
            TextField::StatusText => &mut self.status_text,
        };
        *slot = Some(value);
    }

    /// Names of the fields this set overwrites, besides `updated_on`.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = TextField::ALL
            .into_iter()
            .filter(|field| self.text(*field).is_some())
            .map(|field| field.as_str())
            .collect();
        if self.open.is_some() {
            names.push("open");
        }
        names
    }
}

/// Target of a delete: always one id within one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteSelector {
    pub project: String,
    pub id: IssueId,
}

/// Result of [`RecordStore::update_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Records matched by the selector (0 or 1).
    pub matched: usize,
    /// Id of the record that was updated.
    pub target: Option<IssueId>,
}

impl UpdateOutcome {
    #[must_use]
    pub const fn no_match() -> Self {
        Self {
            matched: 0,
            target: None,
        }
    }
}

/// Result of [`RecordStore::delete_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: usize,
}
