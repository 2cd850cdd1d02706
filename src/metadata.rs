//! Capture metadata sidecars
//!
//! Every raw capture file travels with a small JSON sidecar describing the
//! measurement: the vantage source address, the probed destination port, the
//! file type, the data owner, and the time bounds. The normalizer refuses to
//! run without the required keys, since the archive downstream indexes on
//! them.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sidecar file name for campaign-level metadata.
pub const CAMPAIGN_METADATA_FILENAME: &str = "__pto_campaign_metadata.json";

/// Suffix appended to a capture file name to form its metadata sidecar name.
pub const FILE_METADATA_SUFFIX: &str = ".pto_file_metadata.json";

/// The one capture file type this normalizer understands.
pub const TRACEBOX_V1: &str = "tracebox-v1-ndjson";

/// Sidecar path for a capture file: the file name plus the metadata suffix.
pub fn sidecar_path(capture: &Path) -> PathBuf {
    let mut name = capture.as_os_str().to_os_string();
    name.push(FILE_METADATA_SUFFIX);
    PathBuf::from(name)
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read metadata: {0}")]
    Io(#[from] std::io::Error),
    #[error("metadata is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("metadata must be a JSON object")]
    NotAnObject,
    #[error("required metadata key \"{0}\" is missing")]
    MissingKey(&'static str),
    #[error("metadata key \"{key}\" is invalid: {reason}")]
    BadValue { key: &'static str, reason: String },
}

/// A parsed metadata sidecar: the raw key/value map plus typed accessors for
/// the keys the normalizer depends on.
#[derive(Debug, Clone)]
pub struct RawMetadata {
    entries: Map<String, Value>,
}

impl RawMetadata {
    /// Read metadata from any byte stream.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, MetadataError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        let value: Value = serde_json::from_str(&raw)?;
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            _ => Err(MetadataError::NotAnObject),
        }
    }

    /// Read metadata from a sidecar file.
    pub fn from_file(path: &Path) -> Result<Self, MetadataError> {
        Self::from_reader(fs::File::open(path)?)
    }

    /// The full key/value map, for merging into the trailing summary record.
    pub fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Fetch an optional key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Fill in keys this map is missing from campaign-level metadata.
    ///
    /// File sidecars carry what differs per capture (vantage, port, time
    /// bounds); the file type and owner are usually campaign-wide.
    pub fn inherit(&mut self, campaign: &RawMetadata) {
        for (key, value) in campaign.entries() {
            self.entries
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    fn require(&self, key: &'static str) -> Result<&Value, MetadataError> {
        self.entries.get(key).ok_or(MetadataError::MissingKey(key))
    }

    fn require_str(&self, key: &'static str) -> Result<&str, MetadataError> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| MetadataError::BadValue {
                key,
                reason: "expected a string".to_string(),
            })
    }

    fn require_time(&self, key: &'static str) -> Result<DateTime<Utc>, MetadataError> {
        let raw = self.require_str(key)?;
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| MetadataError::BadValue {
                key,
                reason: format!("not an RFC 3339 timestamp: {}", e),
            })
    }

    /// Vantage source address the probes were sent from.
    pub fn src_ip(&self) -> Result<&str, MetadataError> {
        self.require_str("src_ip")
    }

    /// Destination TCP port the probes targeted.
    pub fn tcp_dst_port(&self) -> Result<u16, MetadataError> {
        let key = "tcp_dst_port";
        let value = self.require(key)?;
        let port = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        };
        port.and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| MetadataError::BadValue {
                key,
                reason: format!("expected a port number, got {}", value),
            })
    }

    /// Capture file type tag.
    pub fn file_type(&self) -> Result<&str, MetadataError> {
        self.require_str("_file_type")
    }

    /// Owner of the raw data.
    pub fn owner(&self) -> Result<&str, MetadataError> {
        self.require_str("_owner")
    }

    /// Earliest probe time recorded for the file.
    pub fn time_start(&self) -> Result<DateTime<Utc>, MetadataError> {
        self.require_time("_time_start")
    }

    /// Latest probe time recorded for the file.
    pub fn time_end(&self) -> Result<DateTime<Utc>, MetadataError> {
        self.require_time("_time_end")
    }
}
