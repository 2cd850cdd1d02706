//! Concurrent normalization pipeline
//!
//! One producer (the calling thread) splits the mapped capture into lines
//! and feeds a pool of extraction workers over a bounded channel; a single
//! collector serializes every observation batch the workers hand it and
//! accumulates the run-wide condition vocabulary and time bounds. A second
//! bounded channel between workers and collector is the only other
//! synchronization point; full queues are the pipeline's backpressure.
//!
//! Workers exit when the line channel closes, the collector exits when the
//! last worker drops its batch sender. The trailing summary record is
//! written after the collector has drained.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

use crate::extract;
use crate::metadata::{MetadataError, RawMetadata, TRACEBOX_V1};
use crate::observation::Observation;
use crate::record::trim_ascii;

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of extraction worker threads
    pub workers: usize,
    /// Capacity of each of the two hand-off queues
    pub queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_capacity: 8192,
        }
    }
}

/// Fatal failure modes of a normalization run.
///
/// Malformed individual records are not here: those are logged with their
/// line number and skipped.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("unsupported file type \"{0}\"")]
    UnsupportedFileType(String),
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// What a completed run saw, owned by the collector while running.
#[derive(Debug, Default)]
pub struct Summary {
    /// Every distinct condition identifier emitted
    pub conditions: BTreeSet<String>,
    /// Earliest observation time, if any observation was emitted
    pub time_start: Option<DateTime<Utc>>,
    /// Latest observation time, if any observation was emitted
    pub time_end: Option<DateTime<Utc>>,
    /// Observations written
    pub observations: u64,
    /// Records fed to the workers
    pub records: u64,
    /// Records dropped as malformed
    pub skipped: u64,
}

/// Normalize one mapped capture: write observation NDJSON followed by the
/// trailing summary metadata record.
///
/// All required metadata keys are checked up front so a run never produces
/// partial output because of a sidecar problem.
pub fn normalize<W: Write + Send>(
    raw: &[u8],
    md: &RawMetadata,
    out: &mut W,
    config: &PipelineConfig,
) -> Result<Summary, NormalizeError> {
    let file_type = md.file_type()?;
    if file_type != TRACEBOX_V1 {
        return Err(NormalizeError::UnsupportedFileType(file_type.to_string()));
    }
    let source = md.src_ip()?.to_string();
    md.tcp_dst_port()?;
    md.owner()?;
    md.time_start()?;
    md.time_end()?;

    let summary = run_pipeline(raw, &source, out, config)?;
    write_summary(out, md, &summary)?;

    debug!(
        records = summary.records,
        observations = summary.observations,
        skipped = summary.skipped,
        conditions = summary.conditions.len(),
        "normalization finished"
    );
    Ok(summary)
}

/// Fan lines out to the worker pool and collect their observations.
fn run_pipeline<W: Write + Send>(
    raw: &[u8],
    source: &str,
    out: &mut W,
    config: &PipelineConfig,
) -> Result<Summary, NormalizeError> {
    let workers = config.workers.max(1);
    let capacity = config.queue_capacity.max(1);
    let skipped = AtomicU64::new(0);

    let (mut summary, write_result) = thread::scope(|scope| {
        let (line_tx, line_rx) = sync_channel::<(u64, String)>(capacity);
        let (batch_tx, batch_rx) = sync_channel::<Vec<Observation>>(capacity);
        let line_rx = Arc::new(Mutex::new(line_rx));

        for _ in 0..workers {
            let line_rx = Arc::clone(&line_rx);
            let batch_tx = batch_tx.clone();
            let skipped = &skipped;
            scope.spawn(move || loop {
                let message = {
                    let rx = line_rx.lock().unwrap();
                    rx.recv()
                };
                let (lineno, text) = match message {
                    Ok(m) => m,
                    Err(_) => break, // channel closed, input exhausted
                };
                match extract::extract(source, &text) {
                    Ok(batch) => {
                        if !batch.is_empty() && batch_tx.send(batch).is_err() {
                            break; // collector is gone; nothing left to do
                        }
                    }
                    Err(e) => {
                        warn!(line = lineno, error = %e, "skipping malformed record");
                        skipped.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
        // the collector must see the channel close once the workers finish
        drop(batch_tx);

        let collector = scope.spawn(move || collect(batch_rx, out));

        let mut lineno = 0u64;
        let mut records = 0u64;
        for raw_line in raw.split(|&b| b == b'\n') {
            lineno += 1;
            let line = trim_ascii(raw_line);
            // defensive filter: records are JSON objects, anything else is
            // a blank line or junk
            if line.first() != Some(&b'{') {
                continue;
            }
            records += 1;
            let text = String::from_utf8_lossy(line).into_owned();
            if line_tx.send((lineno, text)).is_err() {
                break;
            }
        }
        drop(line_tx);

        let (mut summary, result) = collector.join().expect("collector thread panicked");
        summary.records = records;
        (summary, result)
    });

    summary.skipped = skipped.load(Ordering::Relaxed);
    write_result?;
    Ok(summary)
}

/// Single-consumer collection loop: serialize observations in arrival order
/// and fold their conditions and time bounds into the summary.
///
/// On a write failure the remaining batches are drained without writing so
/// the workers never block on a dead consumer; the first error is returned.
fn collect<W: Write>(
    rx: Receiver<Vec<Observation>>,
    out: &mut W,
) -> (Summary, Result<(), NormalizeError>) {
    let mut summary = Summary::default();
    let mut failure: Option<NormalizeError> = None;

    for batch in rx {
        for obs in batch {
            summary.conditions.insert(obs.condition.clone());
            summary.time_start = Some(match summary.time_start {
                Some(t) => t.min(obs.start),
                None => obs.start,
            });
            summary.time_end = Some(match summary.time_end {
                Some(t) => t.max(obs.end),
                None => obs.end,
            });

            if failure.is_none() {
                if let Err(e) = write_observation(out, &obs) {
                    failure = Some(e);
                }
            }
            summary.observations += 1;
        }
    }

    match failure {
        Some(e) => (summary, Err(e)),
        None => (summary, Ok(())),
    }
}

fn write_observation<W: Write>(out: &mut W, obs: &Observation) -> Result<(), NormalizeError> {
    let json = obs.to_json()?;
    writeln!(out, "{}", json)?;
    Ok(())
}

/// Write the trailing summary metadata record: the input metadata map merged
/// with the accumulated vocabulary, resolved time bounds, owner, and the
/// provenance tag of this normalizer build.
pub fn write_summary<W: Write>(
    out: &mut W,
    md: &RawMetadata,
    summary: &Summary,
) -> Result<(), NormalizeError> {
    let time_start = match summary.time_start {
        Some(t) => t,
        None => md.time_start()?,
    };
    let time_end = match summary.time_end {
        Some(t) => t,
        None => md.time_end()?,
    };

    let mut merged = md.entries().clone();
    merged.insert(
        "_conditions".to_string(),
        JsonValue::Array(
            summary
                .conditions
                .iter()
                .cloned()
                .map(JsonValue::String)
                .collect(),
        ),
    );
    merged.insert(
        "_owner".to_string(),
        JsonValue::String(md.owner()?.to_string()),
    );
    merged.insert(
        "_time_start".to_string(),
        JsonValue::String(time_start.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    merged.insert(
        "_time_end".to_string(),
        JsonValue::String(time_end.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    merged.insert(
        "_analyzer".to_string(),
        JsonValue::String(analyzer_tag()),
    );

    let json = serde_json::to_string(&merged)?;
    writeln!(out, "{}", json)?;
    Ok(())
}

/// Provenance tag identifying the exact normalizer build, embedded in every
/// trailing summary record.
pub fn analyzer_tag() -> String {
    match option_env!("VERGEN_GIT_SHA") {
        Some(sha) => format!(
            "https://github.com/simon/tracenorm/blob/{}/analyzer.json",
            sha
        ),
        None => format!(
            "https://github.com/simon/tracenorm/blob/v{}/analyzer.json",
            env!("CARGO_PKG_VERSION")
        ),
    }
}
