//! Configuration precedence through the binary.

mod common;

use common::cli::{IssuesWorkspace, run_issues, run_issues_with_env};
use common::test_log;
use std::fs;

const CREATE: [&str; 8] = [
    "create",
    "apitest",
    "-f",
    "issue_title=T",
    "-f",
    "issue_text=x",
    "-f",
    "created_by=CB",
];

fn write_project_config(workspace: &IssuesWorkspace, contents: &str) {
    let dir = workspace.root.join(".issues");
    fs::create_dir_all(&dir).expect("config dir");
    fs::write(dir.join("config.yaml"), contents).expect("write config");
}

#[test]
fn e2e_env_db_overrides_default() {
    let _log = test_log("e2e_env_db_overrides_default");
    let workspace = IssuesWorkspace::new();

    let run = run_issues_with_env(&workspace, CREATE, [("ISSUES_DB", "custom.db")], "create_env_db");
    assert!(run.status.success(), "create failed: {}", run.stderr);
    assert!(workspace.root.join("custom.db").exists());
    assert!(!workspace.root.join(".issues").join("issues.db").exists());

    let cli_db = run_issues_with_env(
        &workspace,
        ["list", "apitest", "--db", ".issues/issues.db"],
        [("ISSUES_DB", "custom.db")],
        "list_cli_db",
    );
    assert_eq!(cli_db.json(), serde_json::json!([]));
}

#[test]
fn e2e_update_target_precedence() {
    let _log = test_log("e2e_update_target_precedence");
    let workspace = IssuesWorkspace::new();
    write_project_config(&workspace, "update-target: reject-ambiguous\n");

    for label in ["create_one", "create_two"] {
        let run = run_issues(&workspace, CREATE, label);
        assert!(run.status.success(), "create failed: {}", run.stderr);
    }

    let rejected = run_issues(
        &workspace,
        ["update", "apitest", "-f", "status_text=wip"],
        "update_rejected",
    );
    assert_eq!(rejected.code(), 4);
    assert!(rejected.stdout.contains("Ambiguous"));

    let env_first = run_issues_with_env(
        &workspace,
        ["update", "apitest", "-f", "status_text=env"],
        [("ISSUES_UPDATE_TARGET", "first-match")],
        "update_env_first",
    );
    assert_eq!(env_first.code(), 0);

    let cli_first = run_issues_with_env(
        &workspace,
        [
            "update",
            "apitest",
            "-f",
            "status_text=cli",
            "--update-target",
            "first-match",
        ],
        [("ISSUES_UPDATE_TARGET", "reject-ambiguous")],
        "update_cli_first",
    );
    assert_eq!(cli_first.code(), 0);
    assert_eq!(cli_first.stdout.trim(), "successfully updated");

    let list = run_issues(&workspace, ["list", "apitest", "-f", "status_text=cli"], "list_cli");
    assert_eq!(list.json().as_array().map(Vec::len), Some(1));
}

#[test]
fn e2e_invalid_config_exits_7() {
    let _log = test_log("e2e_invalid_config_exits_7");
    let workspace = IssuesWorkspace::new();

    let run = run_issues_with_env(
        &workspace,
        ["update", "apitest", "-f", "status_text=x"],
        [("ISSUES_UPDATE_TARGET", "newest")],
        "update_bad_target",
    );
    assert_eq!(run.code(), 7);
    assert!(run.stderr.contains("CONFIG_ERROR"));

    write_project_config(&workspace, "lock-timeout: soon\n");
    let run = run_issues(&workspace, ["list", "apitest"], "list_bad_timeout");
    assert_eq!(run.code(), 7);
}
