//! List command implementation.

use crate::api::{self, Response};
use crate::cli::RequestArgs;
use crate::config::CliOverrides;
use crate::error::Result;
use tracing::debug;

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if the request fields cannot be parsed or the database
/// cannot be opened. Query failures become a response.
pub fn execute(args: &RequestArgs, cli: &CliOverrides) -> Result<Response> {
    let fields = args.request_fields()?;
    debug!(project = %args.project, ?fields, "list");
    let storage = super::load_settings(cli)?.open_storage()?;
    Ok(api::handle_list(&storage, &args.project, &fields))
}
