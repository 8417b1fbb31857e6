use super::{parse_id, require_project};
use crate::error::{IssueError, Result};
use crate::request::RequestFields;
use crate::storage::DeleteSelector;

/// Compile a delete request.
///
/// # Errors
///
/// Returns `MissingId` when `_id` is absent or empty, `InvalidId` when it is
/// malformed, or a validation error for an empty project.
pub fn compile_delete(project: &str, fields: &RequestFields) -> Result<DeleteSelector> {
    let id = parse_id(fields)?.ok_or(IssueError::MissingId)?;
    Ok(DeleteSelector {
        project: require_project(project)?.to_string(),
        id,
    })
}
