//! Sidecar bootstrap runs through the binary

use crate::helpers::{bin, write_capture, BUSY_CAPTURE};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;

#[test]
fn mkmeta_writes_sidecars_for_captures() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(dir.path(), "80-1-128.112.139.42.json", BUSY_CAPTURE);

    bin()
        .current_dir(dir.path())
        .args(["mkmeta", "80-1-128.112.139.42.json"])
        .assert()
        .success();

    let sidecar = tracenorm::metadata::sidecar_path(&capture);
    let meta: Value = serde_json::from_str(&fs::read_to_string(sidecar).unwrap()).unwrap();
    assert_eq!(meta["src_ip"], "128.112.139.42");
    assert_eq!(meta["tcp_dst_port"], 80);
    assert_eq!(meta["_time_start"], "2016-05-03T22:42:17Z");
    assert_eq!(meta["_time_end"], "2016-05-03T22:43:20Z");
}

#[test]
fn mkmeta_campaign_plus_normalize_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(dir.path(), "80-1-128.112.139.42.json", BUSY_CAPTURE);

    bin()
        .current_dir(dir.path())
        .args([
            "mkmeta",
            "--with-campaign",
            "--owner",
            "sten@example.net",
            "80-1-128.112.139.42.json",
        ])
        .assert()
        .success();

    let campaign: Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("__pto_campaign_metadata.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(campaign["_file_type"], "tracebox-v1-ndjson");
    assert_eq!(campaign["_owner"], "sten@example.net");
    assert_eq!(campaign["presumed_tcp_flags"], "0x2");
    assert_eq!(campaign["timezone"], "ProbablyUTC");

    // the file sidecar inherits the campaign keys during normalization
    let output = bin().arg("normalize").arg(&capture).output().unwrap();
    assert!(output.status.success());
    let last_line = String::from_utf8_lossy(&output.stdout)
        .lines()
        .last()
        .unwrap()
        .to_string();
    let summary: Value = serde_json::from_str(&last_line).unwrap();
    assert_eq!(summary["_owner"], "sten@example.net");
}

#[test]
fn mkmeta_campaign_requires_an_owner() {
    let dir = tempfile::tempdir().unwrap();
    write_capture(dir.path(), "80-1-128.112.139.42.json", BUSY_CAPTURE);

    bin()
        .current_dir(dir.path())
        .args(["mkmeta", "--with-campaign", "80-1-128.112.139.42.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--owner"));
}

#[test]
fn mkmeta_skips_files_that_are_not_captures() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "not a capture").unwrap();

    bin()
        .current_dir(dir.path())
        .args(["mkmeta", "notes.txt"])
        .assert()
        .success()
        .stderr(predicate::str::contains("skipping capture"));

    assert!(!dir.path().join("notes.txt.pto_file_metadata.json").exists());
}

#[test]
fn mkmeta_recurses_into_directories() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("batch");
    fs::create_dir(&nested).unwrap();
    let capture = write_capture(&nested, "443-1-10.0.0.7.json", BUSY_CAPTURE);

    bin()
        .current_dir(dir.path())
        .args(["mkmeta", "batch"])
        .assert()
        .success();

    assert!(tracenorm::metadata::sidecar_path(&capture).exists());
}
