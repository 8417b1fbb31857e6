//! CLI definitions and entry point.

use crate::error::Result;
use crate::request::RequestFields;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Project-scoped issue records (`SQLite`)
#[derive(Parser, Debug)]
#[command(name = "issues", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: .issues/issues.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// `SQLite` busy timeout in ms
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,

    /// Wrap output as {"status", "body"} JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List issues of a project matching the given fields
    List(RequestArgs),

    /// Create an issue
    Create(RequestArgs),

    /// Update one issue
    Update(UpdateArgs),

    /// Delete one issue by id
    Delete(DeleteArgs),

    /// Print the JSON Schema of an issue as returned to clients
    Schema,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Project plus request fields, shared by every request command.
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// Project name
    pub project: String,

    /// Request field as key=value (repeatable)
    #[arg(short = 'f', long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,

    /// Request fields as a JSON object
    #[arg(long, value_name = "JSON")]
    pub body: Option<String>,
}

impl RequestArgs {
    /// Merge `--body` and `-f` pairs; pairs win.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or a pair without `=`.
    pub fn request_fields(&self) -> Result<RequestFields> {
        let base = match &self.body {
            Some(body) => RequestFields::from_json_str(body)?,
            None => RequestFields::new(),
        };
        Ok(base.merged(RequestFields::from_pairs(&self.fields)?))
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// How an update without _id picks its record (first-match, reject-ambiguous)
    #[arg(long, value_name = "POLICY")]
    pub update_target: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Id of the issue to delete
    #[arg(long)]
    pub id: Option<String>,
}

impl DeleteArgs {
    /// Request fields with `--id` applied on top.
    ///
    /// # Errors
    ///
    /// See [`RequestArgs::request_fields`].
    pub fn request_fields(&self) -> Result<RequestFields> {
        let fields = self.request.request_fields()?;
        Ok(match &self.id {
            Some(id) => fields.with("_id", id.as_str()),
            None => fields,
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
    Elvish,
}
