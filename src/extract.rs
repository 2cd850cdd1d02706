//! Observation extraction from parsed probe records
//!
//! Walks a record hop by hop, classifies every recognized header-field
//! change, and emits observations attributed to the reconstructed path of
//! the hop where the change first appeared.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::conditions::{self, Encoding, MSS_CONDITION, MSS_FIELD};
use crate::observation::{Observation, Value};
use crate::path::{change_path, full_path};
use crate::record::{FieldChange, TraceRecord};
use crate::tracker::{ChangeTracker, Report};

/// Why a raw input line could not be turned into observations.
///
/// These are always local to one line; the caller logs and skips.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("not a valid tracebox record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timestamp {0} out of representable range")]
    Timestamp(i64),
}

/// Parse one raw NDJSON line and extract its observations.
///
/// An empty result is normal for records where nothing recognizable changed.
pub fn extract(source: &str, line: &str) -> Result<Vec<Observation>, ExtractError> {
    let record = TraceRecord::from_json(line)?;
    let start = DateTime::from_timestamp(record.timestamp, 0)
        .ok_or(ExtractError::Timestamp(record.timestamp))?;
    Ok(extract_record(source, &record, start))
}

/// Extract observations from an already-parsed record.
pub fn extract_record(
    source: &str,
    record: &TraceRecord,
    start: DateTime<Utc>,
) -> Vec<Observation> {
    let mut observations = Vec::new();
    let mut tracker = ChangeTracker::new();

    for (index, hop) in record.hops.iter().enumerate() {
        // one reconstruction per hop, shared by every change found there
        let mut path: Option<String> = None;

        for change in &hop.modifications {
            if change.name == MSS_FIELD {
                continue; // final-hop rule, handled after the hop loop
            }
            let Some((condition, encoding)) = conditions::classify(&change.name) else {
                continue;
            };

            match encoding {
                Encoding::Hex => {
                    if let Report::Changed { .. } = tracker.observe(&change.name, &change.value) {
                        let p = change_path(path.take(), source, record, index);
                        path = Some(p.clone());
                        observations.push(Observation::point(
                            start,
                            p,
                            condition,
                            Value::single(conditions::render_hex(&change.value)),
                        ));
                    }
                }
                Encoding::Decimal => {
                    if let Report::Changed { previous } =
                        tracker.observe(&change.name, &change.value)
                    {
                        let p = change_path(path.take(), source, record, index);
                        path = Some(p.clone());
                        observations.push(Observation::point(
                            start,
                            p,
                            conditions::dscp_condition(previous.as_deref()),
                            Value::single(conditions::render_decimal(&change.value)),
                        ));
                    }
                }
                Encoding::OldNew => {
                    emit_pair(
                        &mut observations,
                        &mut tracker,
                        &mut path,
                        source,
                        record,
                        index,
                        start,
                        condition,
                        change,
                        &change.value,
                    );
                }
            }
        }

        // the always-report families also surface as additions and deletions
        for change in &hop.additions {
            if let Some((condition, Encoding::OldNew)) = conditions::classify(&change.name) {
                emit_pair(
                    &mut observations,
                    &mut tracker,
                    &mut path,
                    source,
                    record,
                    index,
                    start,
                    condition,
                    change,
                    &change.value,
                );
            }
        }
        for change in &hop.deletions {
            if let Some((condition, Encoding::OldNew)) = conditions::classify(&change.name) {
                emit_pair(
                    &mut observations,
                    &mut tracker,
                    &mut path,
                    source,
                    record,
                    index,
                    start,
                    condition,
                    change,
                    "",
                );
            }
        }
    }

    // MSS rewrites are only legitimate at the final responding hop and are
    // attributed to the path as a whole
    if let Some(last) = record.hops.last() {
        if let Some(change) = last.modifications.iter().find(|m| m.name == MSS_FIELD) {
            observations.push(Observation::point(
                start,
                full_path(source, record),
                MSS_CONDITION,
                Value::change("", change.value.clone()),
            ));
        }
    }

    observations
}

#[allow(clippy::too_many_arguments)]
fn emit_pair(
    observations: &mut Vec<Observation>,
    tracker: &mut ChangeTracker,
    path: &mut Option<String>,
    source: &str,
    record: &TraceRecord,
    index: usize,
    start: DateTime<Utc>,
    condition: &str,
    change: &FieldChange,
    new_value: &str,
) {
    let old = tracker.last(&change.name).unwrap_or("").to_string();
    tracker.set(&change.name, new_value);
    let p = change_path(path.take(), source, record, index);
    *path = Some(p.clone());
    observations.push(Observation::point(
        start,
        p,
        condition,
        Value::change(old, new_value),
    ));
}
