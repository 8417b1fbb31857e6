//! Subcommand implementations.
//!
//! Request commands (`list`, `create`, `update`, `delete`) return the
//! [`Response`] for `main` to print; the rest write their own output.

pub mod completions;
pub mod create;
pub mod delete;
pub mod list;
pub mod schema;
pub mod update;

use crate::api::Response;
use crate::config::{self, CliOverrides, Settings};
use crate::error::Result;
use std::io::{self, Write};
use std::path::Path;

/// Exit code for a response status: 0 for 2xx, 4 for 4xx, 2 otherwise.
#[must_use]
pub const fn exit_code_for_status(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 4,
        _ => 2,
    }
}

/// Render a response for stdout.
///
/// # Errors
///
/// Returns an error if the envelope cannot be serialized.
pub fn render_response(response: &Response, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(&response.envelope())?)
    } else {
        Ok(response.body.to_string())
    }
}

/// Print a response body to stdout and return the process exit code.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn print_response(response: &Response, json: bool) -> Result<i32> {
    let rendered = render_response(response, json)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(exit_code_for_status(response.status))
}

pub(crate) fn load_settings(cli: &CliOverrides) -> Result<Settings> {
    config::load_settings(Path::new(config::PROJECT_DIR), cli)
}
