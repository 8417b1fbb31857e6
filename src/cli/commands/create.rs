//! Create command implementation.

use crate::api::{self, Response};
use crate::cli::RequestArgs;
use crate::config::CliOverrides;
use crate::error::Result;

/// Execute the create command.
///
/// # Errors
///
/// Returns an error if the request fields cannot be parsed or the database
/// cannot be opened.
pub fn execute(args: &RequestArgs, cli: &CliOverrides) -> Result<Response> {
    let fields = args.request_fields()?;
    let mut storage = super::load_settings(cli)?.open_storage()?;
    Ok(api::handle_create(&mut storage, &args.project, &fields))
}
