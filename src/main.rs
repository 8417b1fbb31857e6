use clap::Parser;
use issue_tracker::api::Response;
use issue_tracker::cli::commands;
use issue_tracker::cli::{Cli, Commands};
use issue_tracker::config;
use issue_tracker::logging::init_logging;
use issue_tracker::{IssueError, Result, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overrides = build_cli_overrides(&cli);

    let result: Result<Option<Response>> = match cli.command {
        Commands::List(args) => commands::list::execute(&args, &overrides).map(Some),
        Commands::Create(args) => commands::create::execute(&args, &overrides).map(Some),
        Commands::Update(args) => commands::update::execute(&args, &overrides).map(Some),
        Commands::Delete(args) => commands::delete::execute(&args, &overrides).map(Some),
        Commands::Schema => commands::schema::execute().map(|()| None),
        Commands::Completions(args) => commands::completions::execute(&args).map(|()| None),
    };

    match result.and_then(|response| {
        response
            .map(|response| commands::print_response(&response, cli.json))
            .transpose()
    }) {
        Ok(Some(code)) if code != 0 => std::process::exit(code),
        Ok(_) => {}
        Err(e) => handle_error(&e, cli.json),
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &IssueError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> config::CliOverrides {
    config::CliOverrides {
        db: cli.db.clone(),
        lock_timeout: cli.lock_timeout,
        update_target: None,
    }
}
