//! Shared utilities for `issue_tracker`.
//!
//! - Identifier parsing and generation
//! - Time parsing and formatting (RFC3339, millisecond precision)

pub mod id;
pub mod time;

pub use id::{IdGenerator, IssueId, is_valid_id_format};
pub use time::{Timestamp, format_timestamp, parse_timestamp};
