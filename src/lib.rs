//! tracenorm library
//!
//! Normalizes tracebox path-trace captures into a canonical stream of
//! timestamped, path-attributed observation records suitable for a
//! measurement archive.

pub mod cli;
pub mod conditions;
pub mod extract;
pub mod fields;
pub mod input;
pub mod metadata;
pub mod mkmeta;
pub mod observation;
pub mod path;
pub mod pipeline;
pub mod record;
pub mod tracker;

pub use extract::extract;
pub use metadata::RawMetadata;
pub use observation::{Observation, Value};
pub use pipeline::{normalize, PipelineConfig, Summary};
pub use record::{TraceHop, TraceRecord};
pub use tracker::ChangeTracker;
