//! Metadata sidecar bootstrap
//!
//! Raw tracebox captures are named `<port>-<try>-<a.b.c.d>.json`: the
//! destination port probed, a retry counter, and the vantage source address.
//! This module derives the per-file metadata sidecar from the name plus a
//! scan over the record timestamps, and optionally writes the campaign-level
//! metadata file shared by a whole capture directory.

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::metadata::{sidecar_path, CAMPAIGN_METADATA_FILENAME};

/// Options for a sidecar bootstrap run.
#[derive(Debug, Clone)]
pub struct MkmetaOptions {
    /// Also write the campaign metadata file
    pub with_campaign: bool,
    /// File type tag recorded in campaign metadata
    pub file_type: String,
    /// Data owner; required when writing campaign metadata
    pub owner: Option<String>,
    /// TCP flags the probes are presumed to have carried. Tracebox records
    /// changes to the flags but not the value they changed from.
    pub tcp_flags: String,
    /// Timezone of the capture. Tracebox does not record one; "Probably..."
    /// forms mark an assumption rather than a measurement.
    pub timezone: String,
}

impl Default for MkmetaOptions {
    fn default() -> Self {
        Self {
            with_campaign: false,
            file_type: crate::metadata::TRACEBOX_V1.to_string(),
            owner: None,
            tcp_flags: "0x2".to_string(),
            timezone: "ProbablyUTC".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CampaignMeta<'a> {
    #[serde(rename = "_file_type")]
    file_type: &'a str,
    #[serde(rename = "_owner")]
    owner: &'a str,
    presumed_tcp_flags: &'a str,
    timezone: &'a str,
}

#[derive(Debug, Serialize)]
struct FileMeta {
    src_ip: String,
    tcp_dst_port: u16,
    #[serde(rename = "_time_start")]
    time_start: String,
    #[serde(rename = "_time_end")]
    time_end: String,
}

/// Write metadata sidecars for every capture under `paths`.
///
/// Directories recurse. A capture that cannot be processed is logged and
/// skipped; only campaign metadata problems abort the run, since every
/// sidecar written afterwards would inherit them.
pub fn run(paths: &[std::path::PathBuf], opts: &MkmetaOptions) -> Result<()> {
    if opts.with_campaign {
        write_campaign_meta(opts)?;
    }

    let scanner = CaptureScanner::new()?;
    for path in paths {
        scanner.process_path(path);
    }
    Ok(())
}

fn write_campaign_meta(opts: &MkmetaOptions) -> Result<()> {
    let Some(owner) = opts.owner.as_deref() else {
        bail!("campaign metadata requires --owner");
    };

    let meta = CampaignMeta {
        file_type: &opts.file_type,
        owner,
        presumed_tcp_flags: &opts.tcp_flags,
        timezone: &opts.timezone,
    };
    let json = serde_json::to_string(&meta).context("failed to serialize campaign metadata")?;
    fs::write(CAMPAIGN_METADATA_FILENAME, json).with_context(|| {
        format!(
            "failed to write campaign metadata \"{}\"",
            CAMPAIGN_METADATA_FILENAME
        )
    })?;
    info!(file = CAMPAIGN_METADATA_FILENAME, "campaign metadata written");
    Ok(())
}

struct CaptureScanner {
    name_re: Regex,
    timestamp_re: Regex,
}

impl CaptureScanner {
    fn new() -> Result<Self> {
        Ok(Self {
            name_re: Regex::new(r"^(\d+)-(\d+)-(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\.json$")?,
            timestamp_re: Regex::new(r#""s":(\d+)"#)?,
        })
    }

    fn process_path(&self, path: &Path) {
        if path.is_dir() {
            let entries = match fs::read_dir(path) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot read directory");
                    return;
                }
            };
            for entry in entries.flatten() {
                self.process_path(&entry.path());
            }
            return;
        }

        if let Err(e) = self.write_file_meta(path) {
            warn!(path = %path.display(), error = %e, "skipping capture");
        }
    }

    fn write_file_meta(&self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .context("file name is not valid UTF-8")?;
        let captures = self
            .name_re
            .captures(name)
            .with_context(|| format!("file name \"{}\" does not look like a capture", name))?;

        let port: u16 = captures[1]
            .parse()
            .with_context(|| format!("port \"{}\" out of range", &captures[1]))?;
        let vantage = captures[3].to_string();

        let (min_secs, max_secs) = self.scan_time_bounds(path)?;
        let meta = FileMeta {
            src_ip: vantage,
            tcp_dst_port: port,
            time_start: rfc3339(min_secs)?,
            time_end: rfc3339(max_secs)?,
        };

        let sidecar = sidecar_path(path);
        let json = serde_json::to_string(&meta).context("failed to serialize file metadata")?;
        fs::write(&sidecar, json)
            .with_context(|| format!("failed to write sidecar \"{}\"", sidecar.display()))?;
        info!(capture = %path.display(), sidecar = %sidecar.display(), "sidecar written");
        Ok(())
    }

    /// Min/max probe timestamp across the capture, by regex rather than a
    /// full JSON parse; the scan reads every line exactly once.
    fn scan_time_bounds(&self, path: &Path) -> Result<(i64, i64)> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read \"{}\"", path.display()))?;

        let mut min_secs = i64::MAX;
        let mut max_secs = i64::MIN;
        for (lineno, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(captures) = self.timestamp_re.captures(line) else {
                warn!(path = %path.display(), line = lineno + 1, "record without timestamp");
                continue;
            };
            let secs: i64 = captures[1]
                .parse()
                .with_context(|| format!("timestamp \"{}\" out of range", &captures[1]))?;
            min_secs = min_secs.min(secs);
            max_secs = max_secs.max(secs);
        }

        if min_secs > max_secs {
            bail!("no timestamped records found");
        }
        Ok((min_secs, max_secs))
    }
}

fn rfc3339(secs: i64) -> Result<String> {
    let time = DateTime::from_timestamp(secs, 0)
        .with_context(|| format!("timestamp {} out of representable range", secs))?;
    Ok(time.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
}
