#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

#[derive(Debug)]
pub struct IssuesRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl IssuesRun {
    pub fn json(&self) -> Value {
        serde_json::from_str(self.stdout.trim()).expect("stdout is JSON")
    }

    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

pub struct IssuesWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub log_dir: PathBuf,
}

impl IssuesWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let log_dir = root.join("logs");
        fs::create_dir_all(&log_dir).expect("log dir");
        Self {
            temp_dir,
            root,
            log_dir,
        }
    }
}

pub fn run_issues<I, S>(workspace: &IssuesWorkspace, args: I, label: &str) -> IssuesRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_issues_with_env(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
        label,
    )
}

pub fn run_issues_with_env<I, S, E, K, V>(
    workspace: &IssuesWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> IssuesRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("issues"));
    cmd.current_dir(&workspace.root);
    cmd.args(args);
    cmd.env_remove("ISSUES_DB");
    cmd.env_remove("ISSUES_LOCK_TIMEOUT");
    cmd.env_remove("ISSUES_UPDATE_TARGET");
    cmd.envs(env_vars);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "issue_tracker=debug");
    cmd.env("RUST_BACKTRACE", "1");
    cmd.env("HOME", &workspace.root);

    let start = Instant::now();
    let output = cmd.output().expect("run issues");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let timestamp = SystemTime::now();
    let log_body = format!(
        "label: {label}\nstarted: {:?}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        timestamp,
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        workspace.root.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    IssuesRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}
