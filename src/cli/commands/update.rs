//! Update command implementation.

use crate::api::{self, Response};
use crate::cli::UpdateArgs;
use crate::config::CliOverrides;
use crate::error::Result;

/// Execute the update command.
///
/// `--update-target` takes part in config layering like any other override.
///
/// # Errors
///
/// Returns an error if the request fields cannot be parsed, the update target
/// is unknown, or the database cannot be opened.
pub fn execute(args: &UpdateArgs, cli: &CliOverrides) -> Result<Response> {
    let fields = args.request.request_fields()?;
    let overrides = CliOverrides {
        update_target: args.update_target.clone().or_else(|| cli.update_target.clone()),
        ..cli.clone()
    };
    let settings = super::load_settings(&overrides)?;
    let mut storage = settings.open_storage()?;
    Ok(api::handle_update(
        &mut storage,
        &args.request.project,
        &fields,
        settings.update_target,
    ))
}
