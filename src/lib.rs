//! `issue_tracker`: project-scoped issue records.
//!
//! Requests arrive as a project name plus loosely-typed fields
//! ([`request::RequestFields`]). The [`compile`] functions turn them into
//! predicates, new records and update instructions; a
//! [`storage::RecordStore`] executes those, and [`api`] maps the outcome to
//! a status and body.

pub mod api;
pub mod cli;
pub mod compile;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod request;
pub mod storage;
pub mod util;

pub use error::{ErrorCode, IssueError, Result, StructuredError};
