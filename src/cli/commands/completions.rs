//! Shell completions generation command.
//!
//! Generates shell completion scripts for bash, zsh, fish, `PowerShell`, and elvish.
//!
//! # Usage
//!
//! ```bash
//! issues completions bash > ~/.local/share/bash-completion/completions/issues
//! issues completions zsh -o ~/.zsh/completions/_issues
//! ```

use crate::cli::{Cli, CompletionsArgs, ShellType};
use crate::error::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::fs::File;
use std::io;
use tracing::info;

const BIN_NAME: &str = "issues";

/// Execute the completions command.
///
/// # Errors
///
/// Returns an error if the output file cannot be created.
pub fn execute(args: &CompletionsArgs) -> Result<()> {
    let shell = Shell::from(args.shell);
    let mut cmd = Cli::command();

    match &args.output {
        Some(path) => {
            let mut file = File::create(path)?;
            generate(shell, &mut cmd, BIN_NAME, &mut file);
            info!(%shell, path = %path.display(), "Wrote completion script");
        }
        None => generate(shell, &mut cmd, BIN_NAME, &mut io::stdout().lock()),
    }

    Ok(())
}

impl From<ShellType> for Shell {
    fn from(shell: ShellType) -> Self {
        match shell {
            ShellType::Bash => Self::Bash,
            ShellType::Zsh => Self::Zsh,
            ShellType::Fish => Self::Fish,
            ShellType::PowerShell => Self::PowerShell,
            ShellType::Elvish => Self::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script_for(shell: Shell) -> String {
        let mut cmd = Cli::command();
        let mut output = Vec::new();
        generate(shell, &mut cmd, BIN_NAME, &mut output);
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_shell_conversion() {
        assert_eq!(Shell::from(ShellType::Bash), Shell::Bash);
        assert_eq!(Shell::from(ShellType::PowerShell), Shell::PowerShell);
        assert_eq!(Shell::from(ShellType::Elvish), Shell::Elvish);
    }

    #[test]
    fn test_bash_completion_lists_request_commands() {
        let script = script_for(Shell::Bash);
        assert!(script.contains("_issues"), "should define _issues function");
        for command in ["list", "create", "update", "delete", "schema"] {
            assert!(script.contains(command), "should include {command}");
        }
        assert!(script.contains("--json"), "should include --json flag");
        assert!(script.contains("--update-target"));
    }

    #[test]
    fn test_zsh_and_fish_generation() {
        assert!(script_for(Shell::Zsh).contains("#compdef issues"));
        assert!(script_for(Shell::Fish).contains("complete -c issues"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("issues.bash");
        execute(&CompletionsArgs {
            shell: ShellType::Bash,
            output: Some(path.clone()),
        })
        .unwrap();
        assert!(std::fs::read_to_string(path).unwrap().contains("complete"));
    }
}
