use super::{parse_id, require_project};
use crate::error::{IssueError, Result};
use crate::model::TextField;
use crate::request::{RequestFields, coerce_open};
use crate::storage::{FieldSet, Selector, UpdateTargetPolicy};
use crate::util::Timestamp;
use tracing::debug;

/// A compiled update: which record, and what to overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInstruction {
    pub selector: Selector,
    pub changes: FieldSet,
}

impl UpdateInstruction {
    /// Choose how an id-less update picks its target.
    #[must_use]
    pub fn with_policy(mut self, policy: UpdateTargetPolicy) -> Self {
        self.selector.policy = policy;
        self
    }
}

/// Compile an update request, stamping the current time.
///
/// # Errors
///
/// See [`compile_update_at`].
pub fn compile_update(project: &str, fields: &RequestFields) -> Result<UpdateInstruction> {
    compile_update_at(project, fields, Timestamp::now())
}

/// Compile an update request.
///
/// Only non-empty values enter the field set: `""` and `false` count as "not
/// provided". `open` is coerced, so the text `"false"` closes the record.
/// `updated_on` is always `now`.
///
/// # Errors
///
/// Returns `NoUpdateFields` when no updatable field is non-empty (checked
/// before anything else), a validation error for an empty project, or
/// `InvalidId` for a malformed `_id`.
pub fn compile_update_at(
    project: &str,
    fields: &RequestFields,
    now: Timestamp,
) -> Result<UpdateInstruction> {
    let mut changes = FieldSet::touch(now);
    for field in TextField::ALL {
        if let Some(value) = fields.text(field).filter(|value| value.is_non_empty()) {
            changes.set_text(field, value.as_text().into_owned());
        }
    }
    if let Some(open) = fields.open.as_ref().filter(|value| value.is_non_empty()) {
        changes.open = Some(coerce_open(open));
    }

    if changes.changed_fields().is_empty() {
        return Err(IssueError::NoUpdateFields);
    }

    let selector = Selector {
        project: require_project(project)?.to_string(),
        id: parse_id(fields)?,
        policy: UpdateTargetPolicy::default(),
    };
    debug!(?selector, fields = ?changes.changed_fields(), "Compiled update");
    Ok(UpdateInstruction { selector, changes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::IssueId;
    use chrono::{TimeZone, Utc};

    const ID: &str = "0123456789abcdef01234567";

    fn now() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap())
    }

    #[test]
    fn test_numeric_zero_is_not_an_update() {
        let fields = RequestFields::from_json(&serde_json::json!({"_id": ID, "open": 0})).unwrap();
        let err = compile_update_at("p", &fields, now()).unwrap_err();
        assert!(matches!(err, IssueError::NoUpdateFields));

        let fields = RequestFields::from_json(&serde_json::json!({"_id": ID, "open": 1})).unwrap();
        let instruction = compile_update_at("p", &fields, now()).unwrap();
        assert_eq!(instruction.changes.open, Some(false));
    }

    #[test]
    fn test_no_update_fields() {
        let fields = RequestFields::new()
            .with("_id", ID)
            .with("issue_title", "")
            .with("open", false)
            .with("created_on", "2025-01-01");
        let err = compile_update_at("p", &fields, now()).unwrap_err();
        assert!(matches!(err, IssueError::NoUpdateFields));
    }

    #[test]
    fn test_no_update_fields_checked_before_id() {
        let fields = RequestFields::new().with("_id", "not-an-id");
        assert!(matches!(
            compile_update_at("p", &fields, now()),
            Err(IssueError::NoUpdateFields)
        ));
    }

    #[test]
    fn test_partial_update() {
        let fields = RequestFields::new()
            .with("_id", ID)
            .with("issue_text", "new text")
            .with("assigned_to", "");
        let instruction = compile_update_at("p", &fields, now()).unwrap();

        assert_eq!(instruction.selector.id, Some(IssueId::parse(ID).unwrap()));
        assert_eq!(instruction.changes.issue_text.as_deref(), Some("new text"));
        assert_eq!(instruction.changes.assigned_to, None);
        assert_eq!(instruction.changes.open, None);
        assert_eq!(instruction.changes.updated_on, now());
        assert_eq!(instruction.changes.changed_fields(), ["issue_text"]);
    }

    #[test]
    fn test_open_text_false_closes() {
        let fields = RequestFields::new().with("_id", ID).with("open", "false");
        let instruction = compile_update_at("p", &fields, now()).unwrap();
        assert_eq!(instruction.changes.open, Some(false));

        let fields = RequestFields::new().with("_id", ID).with("open", true);
        let instruction = compile_update_at("p", &fields, now()).unwrap();
        assert_eq!(instruction.changes.open, Some(true));
    }

    #[test]
    fn test_missing_id_leaves_target_to_policy() {
        let fields = RequestFields::new().with("status_text", "wip");
        let instruction = compile_update_at("p", &fields, now()).unwrap();
        assert_eq!(instruction.selector.id, None);
        assert_eq!(instruction.selector.policy, UpdateTargetPolicy::FirstMatch);

        let strict = instruction.with_policy(UpdateTargetPolicy::RejectAmbiguous);
        assert_eq!(strict.selector.policy, UpdateTargetPolicy::RejectAmbiguous);
    }

    #[test]
    fn test_malformed_id() {
        let fields = RequestFields::new().with("_id", "123").with("status_text", "wip");
        assert!(matches!(
            compile_update_at("p", &fields, now()),
            Err(IssueError::InvalidId { .. })
        ));
    }
}
