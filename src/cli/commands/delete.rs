//! Delete command implementation.

use crate::api::{self, Response};
use crate::cli::DeleteArgs;
use crate::config::CliOverrides;
use crate::error::Result;

/// Execute the delete command.
///
/// # Errors
///
/// Returns an error if the request fields cannot be parsed or the database
/// cannot be opened.
pub fn execute(args: &DeleteArgs, cli: &CliOverrides) -> Result<Response> {
    let fields = args.request_fields()?;
    let mut storage = super::load_settings(cli)?.open_storage()?;
    Ok(api::handle_delete(&mut storage, &args.request.project, &fields))
}
