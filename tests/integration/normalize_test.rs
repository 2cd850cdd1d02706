//! End-to-end normalization runs through the binary

use crate::helpers::{bin, full_sidecar, write_capture, write_sidecar, BUSY_CAPTURE, CLEAN_LINE};
use predicates::prelude::*;
use serde_json::Value;

fn stdout_lines(output: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(output)
        .lines()
        .map(|l| serde_json::from_str(l).expect("every output line is JSON"))
        .collect()
}

#[test]
fn busy_capture_emits_observations_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(dir.path(), "80-1-128.112.139.42.json", BUSY_CAPTURE);
    write_sidecar(&capture, &full_sidecar());

    let output = bin()
        .args(["normalize", "--workers", "2"])
        .arg(&capture)
        .output()
        .unwrap();
    assert!(output.status.success());

    let lines = stdout_lines(&output.stdout);
    assert_eq!(lines.len(), 3);

    let summary = lines.last().unwrap();
    assert_eq!(
        summary["_conditions"],
        serde_json::json!(["dscp.0.changed", "tcp.window.changed"])
    );
    assert_eq!(summary["_owner"], "sten@example.net");
    assert_eq!(summary["_time_start"], "2016-05-03T22:42:17Z");
    assert_eq!(summary["_time_end"], "2016-05-03T22:43:20Z");
    assert!(summary["_analyzer"].as_str().unwrap().contains("tracenorm"));

    for obs in &lines[..2] {
        assert_eq!(obs["start"], obs["end"]);
        assert!(obs["path"]
            .as_str()
            .unwrap()
            .starts_with("128.112.139.42 128.112.139.1"));
    }
}

#[test]
fn clean_capture_yields_only_the_summary() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(
        dir.path(),
        "80-1-128.112.139.42.json",
        &format!("{}\n", CLEAN_LINE),
    );
    write_sidecar(&capture, &full_sidecar());

    let output = bin().arg("normalize").arg(&capture).output().unwrap();
    assert!(output.status.success());

    let lines = stdout_lines(&output.stdout);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["_conditions"], serde_json::json!([]));
    // with no observations the sidecar's bounds stand in
    assert_eq!(lines[0]["_time_start"], "2016-05-01T00:00:00Z");
    assert_eq!(lines[0]["_time_end"], "2016-05-07T00:00:00Z");
}

#[test]
fn malformed_lines_are_skipped_with_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let raw = format!("{{\"dst\": 42}}\n{}\n", CLEAN_LINE);
    let capture = write_capture(dir.path(), "80-1-128.112.139.42.json", &raw);
    write_sidecar(&capture, &full_sidecar());

    bin()
        .arg("normalize")
        .arg(&capture)
        .assert()
        .success()
        .stderr(predicate::str::contains("skipping malformed record"));
}

#[test]
fn missing_sidecar_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(dir.path(), "80-1-128.112.139.42.json", BUSY_CAPTURE);

    bin()
        .arg("normalize")
        .arg(&capture)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("metadata sidecar"));
}

#[test]
fn incomplete_sidecar_fails_before_any_output() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(dir.path(), "80-1-128.112.139.42.json", BUSY_CAPTURE);
    write_sidecar(&capture, r#"{"src_ip":"128.112.139.42"}"#);

    bin()
        .arg("normalize")
        .arg(&capture)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

#[test]
fn unsupported_file_type_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(dir.path(), "80-1-128.112.139.42.json", BUSY_CAPTURE);
    write_sidecar(
        &capture,
        &full_sidecar().replace("tracebox-v1-ndjson", "pathspider-v2-ndjson"),
    );

    bin()
        .arg("normalize")
        .arg(&capture)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unsupported file type"));
}

#[test]
fn output_flag_writes_to_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(dir.path(), "80-1-128.112.139.42.json", BUSY_CAPTURE);
    write_sidecar(&capture, &full_sidecar());
    let out_path = dir.path().join("out.ndjson");

    bin()
        .arg("normalize")
        .arg(&capture)
        .arg("-o")
        .arg(&out_path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(written.lines().count(), 3);
}

#[test]
fn single_worker_runs_are_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(dir.path(), "80-1-128.112.139.42.json", BUSY_CAPTURE);
    write_sidecar(&capture, &full_sidecar());

    let first = bin()
        .args(["normalize", "--workers", "1"])
        .arg(&capture)
        .output()
        .unwrap();
    let second = bin()
        .args(["normalize", "--workers", "1"])
        .arg(&capture)
        .output()
        .unwrap();
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn explicit_meta_path_overrides_the_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(dir.path(), "80-1-128.112.139.42.json", BUSY_CAPTURE);
    let meta = dir.path().join("elsewhere.json");
    std::fs::write(&meta, full_sidecar()).unwrap();

    bin()
        .arg("normalize")
        .arg(&capture)
        .arg("--meta")
        .arg(&meta)
        .assert()
        .success();
}
