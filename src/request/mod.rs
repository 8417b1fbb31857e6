//! Inbound request fields.
//!
//! A request carries any subset of the known record fields, each a string,
//! a boolean or (from a JSON body) a number. Presence and emptiness are tracked separately: a key
//! sent as `""` is present but empty, and the compilers treat those two
//! states differently.

use crate::error::{IssueError, Result};
use crate::model::{TextField, TimestampField};
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::fmt;
use tracing::debug;

/// A single loosely-typed request value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Number(Number),
}

impl FieldValue {
    /// `Text` with content, `Bool(true)`, or a non-zero number.
    #[must_use]
    pub fn is_non_empty(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        }
    }

    /// The value as text. Booleans render as `"true"`/`"false"`, numbers in
    /// their JSON form.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s),
            Self::Bool(b) => Cow::Owned(b.to_string()),
            Self::Number(n) => Cow::Owned(n.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Number> for FieldValue {
    fn from(n: Number) -> Self {
        Self::Number(n)
    }
}

/// Coerce a present `open` value: only `"true"` and `true` mean open.
#[must_use]
pub fn coerce_open(value: &FieldValue) -> bool {
    match value {
        FieldValue::Text(s) => s == "true",
        FieldValue::Bool(b) => *b,
        FieldValue::Number(_) => false,
    }
}

/// The named, optional values of a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFields {
    pub id: Option<FieldValue>,
    pub issue_title: Option<FieldValue>,
    pub issue_text: Option<FieldValue>,
    pub created_by: Option<FieldValue>,
    pub assigned_to: Option<FieldValue>,
    pub status_text: Option<FieldValue>,
    pub created_on: Option<FieldValue>,
    pub updated_on: Option<FieldValue>,
    pub open: Option<FieldValue>,
}

impl RequestFields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter. Unknown keys are ignored.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.set(key, value.into());
        self
    }

    /// Set a field by wire name. Returns `false` for unknown keys.
    pub fn set(&mut self, key: &str, value: FieldValue) -> bool {
        match self.slot_mut(key) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Option<FieldValue>> {
        let slot = match key {
            "_id" | "id" => &mut self.id,
            "issue_title" => &mut self.issue_title,
            "issue_text" => &mut self.issue_text,
            "created_by" => &mut self.created_by,
            "assigned_to" => &mut self.assigned_to,
            "status_text" => &mut self.status_text,
            "created_on" => &mut self.created_on,
            "updated_on" => &mut self.updated_on,
            "open" => &mut self.open,
            _ => return None,
        };
        Some(slot)
    }

    /// Parse a JSON object body.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the body is not an object or a known
    /// field holds an array or object.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(IssueError::validation("body", "expected a JSON object"));
        };
        Self::from_json_map(map)
    }

    /// Parse a JSON object body from text.
    ///
    /// # Errors
    ///
    /// Returns `IssueError::Json` on malformed JSON, otherwise as [`Self::from_json`].
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_json(&value)
    }

    fn from_json_map(map: &Map<String, Value>) -> Result<Self> {
        let mut fields = Self::new();
        for (key, value) in map {
            let value = match value {
                Value::Null => continue,
                Value::String(s) => FieldValue::Text(s.clone()),
                Value::Bool(b) => FieldValue::Bool(*b),
                Value::Number(n) => FieldValue::Number(n.clone()),
                Value::Array(_) | Value::Object(_) => {
                    if fields.slot_mut(key).is_none() {
                        debug!(field = %key, "Ignoring unknown request field");
                        continue;
                    }
                    return Err(IssueError::validation(
                        key.as_str(),
                        "expected a string or boolean",
                    ));
                }
            };
            if !fields.set(key, value) {
                debug!(field = %key, "Ignoring unknown request field");
            }
        }
        Ok(fields)
    }

    /// Parse `key=value` pairs. Every value is text; the last pair for a key wins.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a pair without `=`.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let Some((key, value)) = pair.split_once('=') else {
                return Err(IssueError::validation(
                    pair,
                    "expected key=value",
                ));
            };
            let key = key.trim();
            if !fields.set(key, FieldValue::Text(value.to_string())) {
                debug!(field = %key, "Ignoring unknown request field");
            }
        }
        Ok(fields)
    }

    /// Overlay `other` onto `self`; fields present in `other` win.
    #[must_use]
    pub fn merged(mut self, other: Self) -> Self {
        let Self {
            id,
            issue_title,
            issue_text,
            created_by,
            assigned_to,
            status_text,
            created_on,
            updated_on,
            open,
        } = other;
        overlay(&mut self.id, id);
        overlay(&mut self.issue_title, issue_title);
        overlay(&mut self.issue_text, issue_text);
        overlay(&mut self.created_by, created_by);
        overlay(&mut self.assigned_to, assigned_to);
        overlay(&mut self.status_text, status_text);
        overlay(&mut self.created_on, created_on);
        overlay(&mut self.updated_on, updated_on);
        overlay(&mut self.open, open);
        self
    }

    #[must_use]
    pub const fn text(&self, field: TextField) -> Option<&FieldValue> {
        match field {
            TextField::IssueTitle => self.issue_title.as_ref(),
            TextField::IssueText => self.issue_text.as_ref(),
            TextField::CreatedBy => self.created_by.as_ref(),
            TextField::AssignedTo => self.assigned_to.as_ref(),
            TextField::StatusText => self.status_text.as_ref(),
        }
    }

    #[must_use]
    pub const fn timestamp(&self, field: TimestampField) -> Option<&FieldValue> {
        match field {
            TimestampField::CreatedOn => self.created_on.as_ref(),
            TimestampField::UpdatedOn => self.updated_on.as_ref(),
        }
    }

    /// The identifier token, if one was sent with content.
    #[must_use]
    pub fn id_token(&self) -> Option<Cow<'_, str>> {
        self.id
            .as_ref()
            .filter(|value| value.is_non_empty())
            .map(FieldValue::as_text)
    }

    /// Was the field sent at all, even as `""`?
    #[must_use]
    pub const fn is_present(value: Option<&FieldValue>) -> bool {
        value.is_some()
    }

    /// Is the field present with a non-empty value?
    #[must_use]
    pub fn is_non_empty(value: Option<&FieldValue>) -> bool {
        value.is_some_and(FieldValue::is_non_empty)
    }
}

fn overlay(target: &mut Option<FieldValue>, value: Option<FieldValue>) {
    if value.is_some() {
        *target = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use serde_json::json;
    use tracing::info;

    #[test]
    fn test_from_json_types() {
        init_test_logging();
        info!("test_from_json_types: starting");
        let fields = RequestFields::from_json(&json!({
            "issue_title": "Bug",
            "open": false,
            "status_text": 42,
            "assigned_to": null,
            "unknown": [1, 2],
            "_id": ""
        }))
        .unwrap();

        assert_eq!(fields.issue_title, Some(FieldValue::Text("Bug".into())));
        assert_eq!(fields.open, Some(FieldValue::Bool(false)));
        assert_eq!(fields.status_text, Some(FieldValue::Number(42.into())));
        assert_eq!(fields.status_text.as_ref().map(FieldValue::as_text).as_deref(), Some("42"));
        assert_eq!(fields.assigned_to, None);
        assert_eq!(fields.id, Some(FieldValue::Text(String::new())));
        assert_eq!(fields.id_token(), None);
        info!("test_from_json_types: assertions passed");
    }

    #[test]
    fn test_from_json_rejects_nested_known_field() {
        let err = RequestFields::from_json(&json!({"issue_text": {"a": 1}})).unwrap_err();
        assert!(matches!(err, IssueError::Validation { ref field, .. } if field == "issue_text"));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(RequestFields::from_json(&json!(["a"])).is_err());
        assert!(matches!(
            RequestFields::from_json_str("{not json"),
            Err(IssueError::Json(_))
        ));
    }

    #[test]
    fn test_from_pairs_last_wins_and_id_alias() {
        let fields =
            RequestFields::from_pairs(["open=true", "open=false", "id=abc", "empty="]).unwrap();
        assert_eq!(fields.open, Some(FieldValue::Text("false".into())));
        assert_eq!(fields.id_token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_from_pairs_requires_equals() {
        let err = RequestFields::from_pairs(["issue_title"]).unwrap_err();
        assert!(matches!(err, IssueError::Validation { .. }));
    }

    #[test]
    fn test_presence_vs_emptiness() {
        let fields = RequestFields::new().with("assigned_to", "").with("open", false);
        assert!(RequestFields::is_present(fields.assigned_to.as_ref()));
        assert!(RequestFields::is_present(fields.open.as_ref()));
        assert!(!RequestFields::is_non_empty(fields.assigned_to.as_ref()));
        assert!(!RequestFields::is_non_empty(fields.open.as_ref()));
        assert!(!RequestFields::is_non_empty(fields.issue_title.as_ref()));
    }

    #[test]
    fn test_coerce_open_table() {
        assert!(coerce_open(&FieldValue::Bool(true)));
        assert!(coerce_open(&"true".into()));
        assert!(!coerce_open(&FieldValue::Bool(false)));
        assert!(!coerce_open(&"false".into()));
        assert!(!coerce_open(&"TRUE".into()));
        assert!(!coerce_open(&"yes".into()));
        assert!(!coerce_open(&"".into()));
    }

    #[test]
    fn test_merged_prefers_overlay() {
        let base = RequestFields::new().with("issue_title", "a").with("issue_text", "b");
        let merged = base.merged(RequestFields::new().with("issue_title", "c"));
        assert_eq!(merged.issue_title, Some("c".into()));
        assert_eq!(merged.issue_text, Some("b".into()));
    }

    #[test]
    fn test_numeric_zero_is_empty() {
        init_test_logging();
        info!("test_numeric_zero_is_empty: starting");
        let fields = RequestFields::from_json(&json!({
            "issue_title": 0,
            "issue_text": 0.0,
            "created_by": 7,
            "open": 1
        }))
        .unwrap();
        assert!(RequestFields::is_present(fields.issue_title.as_ref()));
        assert!(!RequestFields::is_non_empty(fields.issue_title.as_ref()));
        assert!(!RequestFields::is_non_empty(fields.issue_text.as_ref()));
        assert!(RequestFields::is_non_empty(fields.created_by.as_ref()));
        assert!(RequestFields::is_non_empty(fields.open.as_ref()));
        assert!(!coerce_open(fields.open.as_ref().unwrap()));
        info!("test_numeric_zero_is_empty: assertions passed");
    }

    #[test]
    fn test_bool_as_text() {
        assert_eq!(FieldValue::Bool(true).as_text(), "true");
        assert_eq!(FieldValue::Bool(false).to_string(), "false");
    }
}
