#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use issue_tracker::request::RequestFields;
use issue_tracker::util::Timestamp;

/// Fixed creation time so timestamps in assertions are stable.
pub fn base_time() -> Timestamp {
    Timestamp::new(Utc.timestamp_opt(1_735_689_600, 0).unwrap()) // 2025-01-01 00:00:00 UTC
}

pub fn later(seconds: i64) -> Timestamp {
    Timestamp::new(base_time().as_datetime() + Duration::seconds(seconds))
}

/// The three required create fields.
pub fn create_fields(title: &str) -> RequestFields {
    RequestFields::new()
        .with("issue_title", title)
        .with("issue_text", format!("Details for {title}"))
        .with("created_by", "alice")
}

/// Every create field populated.
pub fn full_create_fields(title: &str) -> RequestFields {
    create_fields(title)
        .with("assigned_to", "bob")
        .with("status_text", "triaged")
}
