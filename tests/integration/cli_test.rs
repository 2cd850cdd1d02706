//! CLI surface smoke tests

use crate::helpers::{bin, write_capture, BUSY_CAPTURE};
use predicates::prelude::*;

#[test]
fn help_lists_all_subcommands() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("normalize"))
        .stdout(predicate::str::contains("mkmeta"))
        .stdout(predicate::str::contains("fields"));
}

#[test]
fn version_prints_the_crate_version() {
    bin()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_subcommand_fails() {
    bin().arg("frobnicate").assert().failure();
}

#[test]
fn normalize_requires_an_input() {
    bin().arg("normalize").assert().failure();
}

#[test]
fn fields_prints_a_frequency_table() {
    let dir = tempfile::tempdir().unwrap();
    write_capture(dir.path(), "80-1-128.112.139.42.json", BUSY_CAPTURE);

    let output = bin()
        .current_dir(dir.path())
        .args(["fields", "80-1-128.112.139.42.json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TCP::Window"));
    assert!(stdout.contains("IP::DiffServicesCP"));
    // one occurrence of each in the fixture
    for line in stdout.lines() {
        assert!(line.trim_start().starts_with('1'), "unexpected count: {}", line);
    }
}
