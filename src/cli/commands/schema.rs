//! Schema command: JSON Schema of the client-facing issue.

use crate::error::Result;
use crate::model::IssueView;
use schemars::schema::RootSchema;
use schemars::schema_for;

#[must_use]
pub fn issue_schema() -> RootSchema {
    schema_for!(IssueView)
}

/// Print the schema as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn execute() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&issue_schema())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_describes_wire_fields() {
        let value = serde_json::to_value(issue_schema()).unwrap();
        assert_eq!(value["title"], "Issue");
        let properties = value["properties"].as_object().unwrap();
        for key in ["_id", "issue_title", "open", "created_on", "project"] {
            assert!(properties.contains_key(key), "missing {key}");
        }
        let required = value["required"].as_array().unwrap();
        assert!(!required.iter().any(|v| v == "project"));
        assert!(required.iter().any(|v| v == "_id"));
    }
}
