//! Request handling.
//!
//! Each handler runs one compiler, hands the result to a [`RecordStore`] and
//! turns the outcome into a [`Response`]: an HTTP-style status with either a
//! JSON or a plain-text body. Handlers never fail; every error becomes a
//! response.

use crate::compile::{compile_create, compile_delete, compile_query, compile_update};
use crate::error::{ErrorCategory, IssueError};
use crate::request::RequestFields;
use crate::storage::{RecordStore, UpdateTargetPolicy};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use tracing::{debug, info, warn};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_SERVER_ERROR: u16 = 500;

/// Response payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => {
                let rendered = serde_json::to_string_pretty(value).map_err(|_| fmt::Error)?;
                f.write_str(&rendered)
            }
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: u16,
    pub body: ResponseBody,
}

impl Response {
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: ResponseBody::Json(body),
        }
    }

    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Text(body.into()),
        }
    }

    /// `{"error": message}` with a status from the error's category.
    #[must_use]
    pub fn error(err: &IssueError) -> Self {
        Self::json(err.category().status(), json!({ "error": err.to_string() }))
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// The `{"status", "body"}` envelope used for scripted output.
    #[must_use]
    pub fn envelope(&self) -> Value {
        json!({ "status": self.status, "body": self.body })
    }
}

fn log_response(op: &str, project: &str, response: &Response) {
    match response.status {
        s if s >= STATUS_SERVER_ERROR => {
            warn!(op, project, status = s, body = %response.body, "Request failed");
        }
        s if s >= STATUS_BAD_REQUEST => {
            debug!(op, project, status = s, body = %response.body, "Request rejected");
        }
        s => info!(op, project, status = s, "Request completed"),
    }
}

/// `GET`: every record of the project matching the request fields.
pub fn handle_list<S>(store: &S, project: &str, fields: &RequestFields) -> Response
where
    S: RecordStore + ?Sized,
{
    let response = match compile_query(project, fields)
        .and_then(|query| store.find(&query.predicate, &query.projection))
    {
        Ok(views) => match serde_json::to_value(views) {
            Ok(body) => Response::json(STATUS_OK, body),
            Err(err) => Response::error(&err.into()),
        },
        Err(err) => Response::error(&err),
    };
    log_response("list", project, &response);
    response
}

/// `POST`: create a record and return it without `project`.
pub fn handle_create<S>(store: &mut S, project: &str, fields: &RequestFields) -> Response
where
    S: RecordStore + ?Sized,
{
    let response = match compile_create(project, fields).and_then(|issue| store.insert(issue)) {
        Ok(issue) => match serde_json::to_value(issue.into_view(false)) {
            Ok(body) => Response::json(STATUS_OK, body),
            Err(err) => Response::error(&err.into()),
        },
        Err(err @ IssueError::MissingInputs { .. }) => {
            Response::text(STATUS_BAD_REQUEST, err.to_string())
        }
        Err(err) => Response::error(&err),
    };
    log_response("create", project, &response);
    response
}

/// `PUT`: partially update one record.
///
/// A selector that matches nothing still answers `successfully updated`.
pub fn handle_update<S>(
    store: &mut S,
    project: &str,
    fields: &RequestFields,
    policy: UpdateTargetPolicy,
) -> Response
where
    S: RecordStore + ?Sized,
{
    let target = fields
        .id_token()
        .map_or_else(|| format!("in project {project}"), |id| id.into_owned());

    let response = match compile_update(project, fields) {
        Err(err @ IssueError::NoUpdateFields) => {
            Response::text(STATUS_BAD_REQUEST, err.to_string())
        }
        Err(IssueError::InvalidId { id }) => {
            Response::text(STATUS_BAD_REQUEST, format!("could not update {id}"))
        }
        Err(err) => Response::text(err.category().status(), err.to_string()),
        Ok(instruction) => {
            let instruction = instruction.with_policy(policy);
            match store.update_one(&instruction.selector, &instruction.changes) {
                Ok(outcome) => {
                    if outcome.matched == 0 {
                        debug!(project, %target, "Update matched nothing");
                    }
                    Response::text(STATUS_OK, "successfully updated")
                }
                Err(err) if err.category() == ErrorCategory::Validation => {
                    Response::text(STATUS_BAD_REQUEST, err.to_string())
                }
                Err(err) => {
                    let err = IssueError::update_failed(target, err);
                    warn!(error = ?err, "Store rejected update");
                    Response::text(STATUS_SERVER_ERROR, err.to_string())
                }
            }
        }
    };
    log_response("update", project, &response);
    response
}

/// `DELETE`: remove one record by id.
///
/// An id that matches nothing in the project still answers `deleted <id>`.
pub fn handle_delete<S>(store: &mut S, project: &str, fields: &RequestFields) -> Response
where
    S: RecordStore + ?Sized,
{
    let response = match compile_delete(project, fields) {
        Err(IssueError::MissingId | IssueError::InvalidId { .. }) => {
            Response::text(STATUS_BAD_REQUEST, IssueError::MissingId.to_string())
        }
        Err(err) => Response::text(err.category().status(), err.to_string()),
        Ok(selector) => {
            let id = selector.id.to_string();
            match store.delete_one(&selector) {
                Ok(outcome) => {
                    if outcome.deleted == 0 {
                        debug!(project, %id, "Delete matched nothing");
                    }
                    Response::text(STATUS_OK, format!("deleted {id}"))
                }
                Err(err) => {
                    let err = IssueError::delete_failed(id, err);
                    warn!(error = ?err, "Store rejected delete");
                    Response::text(STATUS_SERVER_ERROR, err.to_string())
                }
            }
        }
    };
    log_response("delete", project, &response);
    response
}
