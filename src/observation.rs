//! Normalized observation records
//!
//! One observation is one normalized, timestamped, path-attributed instance
//! of a condition. Observations serialize to NDJSON, one object per line,
//! and the whole output stream ends with a single summary metadata object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observation value: either a single encoded string or an old/new pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Single(String),
    Change { old: String, new: String },
}

impl Value {
    pub fn single(value: impl Into<String>) -> Self {
        Value::Single(value.into())
    }

    pub fn change(old: impl Into<String>, new: impl Into<String>) -> Self {
        Value::Change {
            old: old.into(),
            new: new.into(),
        }
    }
}

/// One normalized observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// When the condition was observed
    pub start: DateTime<Utc>,
    /// Always equal to `start`; conditions are point-in-time
    pub end: DateTime<Utc>,
    /// Path notation localizing the condition
    pub path: String,
    /// Canonical condition identifier
    pub condition: String,
    /// Encoded value
    pub value: Value,
}

impl Observation {
    /// Build a point-in-time observation.
    pub fn point(
        at: DateTime<Utc>,
        path: impl Into<String>,
        condition: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            start: at,
            end: at,
            path: path.into(),
            condition: condition.into(),
            value,
        }
    }

    /// Serialize to one NDJSON line (without the trailing newline).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
