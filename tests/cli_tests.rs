#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env_remove("TASKGRAPH_CONFIG")
        .write_stdin(script.to_string())
        .assert()
}

#[test]
fn cli_analyze_prints_critical_chain() {
    run_cli(
        "add root 1\nadd sub1 2 root\nadd sub2 3 root\nadd leaf 4 sub1,sub2\nanalyze\nquit\n",
    )
    .success()
    .stdout(str_contains("duration=8"))
    .stdout(str_contains("crit_path=root->sub2->leaf"));
}

#[test]
fn cli_link_refuses_cycles() {
    run_cli("add a 1\nadd b 1 a\nlink b a\nquit\n")
        .success()
        .stdout(str_contains("would create a cycle"));
}

#[test]
fn cli_delete_command_removes_task() {
    run_cli("add a 5\nadd b 3 a\ndelete b\nquit\n")
        .success()
        .stdout(str_contains("Deleted task b."));
}

#[test]
fn cli_order_reports_stuck_tasks() {
    run_cli("add a 1 b\nadd b 1 a\nadd c 1\norder\nquit\n")
        .success()
        .stdout(str_contains("Order: c"))
        .stdout(str_contains("Unordered (cycle): a, b"));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!(
        "add Persisted 4\nsave {path}\nadd Temp 1\nload {path}\nshow\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Taskgraph loaded from"));
    let after_reload = output
        .split("Taskgraph loaded from")
        .last()
        .unwrap_or_default();
    assert!(after_reload.contains("Persisted"));
    assert!(
        !after_reload.contains("Temp"),
        "temporary task should not appear after reload:\n{after_reload}"
    );
}

#[test]
fn cli_exports_markdown() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    run_cli(&format!("add build 2\nadd ship 1 build\nexport md {path}\nquit\n"))
        .success()
        .stdout(str_contains("Markdown written to"));
    let md = std::fs::read_to_string(tmp.path()).unwrap();
    assert!(md.contains("## 1. build"));
    assert!(md.contains("## 2. ship"));
}

#[test]
fn cli_pin_shows_in_grid() {
    run_cli("add a 1\npin a 7 3\ngrid\nquit\n")
        .success()
        .stdout(str_contains("Pinned a at (7, 3)."))
        .stdout(str_contains("| yes"));
}

#[test]
fn cli_show_and_layout_follow_the_pin() {
    run_cli("add a 1\nadd b 1 a\npin b 7 3\nshow\nlayout\nquit\n")
        .success()
        .stdout(str_contains("| 7,3 "))
        .stdout(str_contains("| 140 | 60 "));
}
