use super::require_project;
use crate::error::{IssueError, Result};
use crate::model::{NewIssue, TextField};
use crate::request::RequestFields;
use crate::util::Timestamp;
use tracing::debug;

/// Compile a create request, stamping the current time.
///
/// # Errors
///
/// See [`compile_create_at`].
pub fn compile_create(project: &str, fields: &RequestFields) -> Result<NewIssue> {
    compile_create_at(project, fields, Timestamp::now())
}

/// Compile a create request into a validated record.
///
/// `issue_title`, `issue_text` and `created_by` must be non-empty. Optional
/// text fields default to `""`, the record starts open, and both timestamps
/// are `now`. Any `_id`, `open` or timestamp in the request is ignored.
///
/// # Errors
///
/// Returns `MissingInputs` naming every absent or empty required field, or a
/// validation error for an empty project.
pub fn compile_create_at(project: &str, fields: &RequestFields, now: Timestamp) -> Result<NewIssue> {
    let missing: Vec<String> = TextField::ALL
        .into_iter()
        .filter(|field| field.is_required())
        .filter(|field| !RequestFields::is_non_empty(fields.text(*field)))
        .map(|field| field.as_str().to_string())
        .collect();
    if !missing.is_empty() {
        debug!(?missing, "Create request is missing required fields");
        return Err(IssueError::MissingInputs { fields: missing });
    }
    let project = require_project(project)?;

    let text = |field: TextField| {
        fields
            .text(field)
            .map(|value| value.as_text().into_owned())
            .unwrap_or_default()
    };

    Ok(NewIssue {
        project: project.to_string(),
        issue_title: text(TextField::IssueTitle),
        issue_text: text(TextField::IssueText),
        created_by: text(TextField::CreatedBy),
        assigned_to: text(TextField::AssignedTo),
        status_text: text(TextField::StatusText),
        open: true,
        created_on: now,
        updated_on: now,
    })
}
