use super::{parse_id, require_project};
use crate::error::Result;
use crate::model::{TextField, TimestampField};
use crate::request::{RequestFields, coerce_open};
use crate::storage::{Clause, Predicate, Projection, TimestampCriterion};
use crate::util::{Timestamp, parse_timestamp};
use tracing::debug;

/// A compiled read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub predicate: Predicate,
    pub projection: Projection,
}

/// Compile a read request into a predicate and a projection hiding `project`.
///
/// Present text fields match exactly, including `""`. A timestamp that does
/// not parse still produces a clause, one that matches nothing.
///
/// # Errors
///
/// Returns a validation error for an empty project, or `InvalidId` for a
/// malformed `_id`.
pub fn compile_query(project: &str, fields: &RequestFields) -> Result<Query> {
    let mut predicate = Predicate::new(require_project(project)?);

    if let Some(id) = parse_id(fields)? {
        predicate = predicate.with(Clause::Id(id));
    }

    for field in [TimestampField::CreatedOn, TimestampField::UpdatedOn] {
        if let Some(value) = fields.timestamp(field) {
            let raw = value.as_text();
            let criterion = parse_timestamp(&raw).map_or_else(
                || TimestampCriterion::Invalid(raw.to_string()),
                |at| TimestampCriterion::At(Timestamp::new(at)),
            );
            predicate = predicate.with(Clause::Timestamp { field, criterion });
        }
    }

    for field in TextField::ALL {
        if let Some(value) = fields.text(field) {
            predicate = predicate.with(Clause::Text {
                field,
                value: value.as_text().into_owned(),
            });
        }
    }

    if let Some(open) = &fields.open {
        predicate = predicate.with(Clause::Open(coerce_open(open)));
    }

    debug!(?predicate, "Compiled query");
    Ok(Query {
        predicate,
        projection: Projection::client(),
    })
}
