//! Shared fixtures for integration tests

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

/// Vantage source address used across fixtures.
pub const SRC: &str = "128.112.139.42";

/// One probe record with a single responsive hop and no recognized changes.
pub const CLEAN_LINE: &str = r#"{"dst":"88.212.202.2","r":"tcp-rst","s":1462315337,"h":[{"ha":"128.112.139.1","t":1,"i":2,"m":[],"a":[],"d":[]}]}"#;

/// Two records with recognized changes: a window rewrite and a DSCP rewrite.
pub const BUSY_CAPTURE: &str = concat!(
    r#"{"dst":"88.212.202.2","r":"tcp-rst","s":1462315337,"h":[{"ha":"128.112.139.1","t":1,"i":2,"m":[{"n":"TCP::Window","v":"8b56"}],"a":[],"d":[]}]}"#,
    "\n",
    r#"{"dst":"88.212.202.2","r":"tcp-rst","s":1462315400,"h":[{"ha":"128.112.139.1","t":1,"i":2,"m":[{"n":"IP::DiffServicesCP","v":"2e"}],"a":[],"d":[]}]}"#,
    "\n",
);

/// A complete metadata sidecar for captures probed from [`SRC`].
pub fn full_sidecar() -> String {
    format!(
        r#"{{"src_ip":"{}","tcp_dst_port":80,"_file_type":"tracebox-v1-ndjson","_owner":"sten@example.net","_time_start":"2016-05-01T00:00:00Z","_time_end":"2016-05-07T00:00:00Z"}}"#,
        SRC
    )
}

/// Write a capture and return its path.
pub fn write_capture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write capture fixture");
    path
}

/// Write a metadata sidecar next to `capture` and return its path.
pub fn write_sidecar(capture: &Path, contents: &str) -> PathBuf {
    let path = tracenorm::metadata::sidecar_path(capture);
    fs::write(&path, contents).expect("write sidecar fixture");
    path
}

/// The tracenorm binary under test.
pub fn bin() -> Command {
    Command::cargo_bin("tracenorm").expect("binary must build")
}
