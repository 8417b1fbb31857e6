//! Request compilers.
//!
//! Pure functions from a project name plus [`RequestFields`] to the
//! predicate, record or update instruction a [`RecordStore`] executes.
//! Functions that stamp time have an `_at` variant taking `now`.
//!
//! [`RequestFields`]: crate::request::RequestFields
//! [`RecordStore`]: crate::storage::RecordStore

mod create;
mod delete;
mod query;
mod update;

pub use create::{compile_create, compile_create_at};
pub use delete::compile_delete;
pub use query::{Query, compile_query};
pub use update::{UpdateInstruction, compile_update, compile_update_at};

use crate::error::{IssueError, Result};
use crate::request::RequestFields;
use crate::util::IssueId;

fn require_project(project: &str) -> Result<&str> {
    if project.is_empty() {
        return Err(IssueError::validation("project", "cannot be empty"));
    }
    Ok(project)
}

/// Parse the request id when one was sent with content.
fn parse_id(fields: &RequestFields) -> Result<Option<IssueId>> {
    fields
        .id_token()
        .map(|token| IssueId::parse(&token))
        .transpose()
}
