//! CLI definitions for tracenorm
//!
//! This module contains the clap CLI structure definitions, separated from
//! main.rs so the parser can be exercised directly from tests.

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Build clap styles using our theme colors.
///
/// - Green: headers, usage, command names (accent color)
/// - White: descriptions, placeholders (renders as light gray on dark terminals)
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser)]
#[command(name = "tracenorm")]
#[command(about = "Normalize tracebox path-trace captures into observation streams")]
#[command(
    long_about = "tracenorm - turn raw tracebox captures into archive-ready observations.

Tracebox probes record, hop by hop, which IP and TCP header fields a path
rewrites. tracenorm reads those captures (NDJSON, one probe record per line),
classifies every recognized header change into a canonical condition, and
writes one observation per change plus a trailing summary metadata record.

QUICK START:
    tracenorm mkmeta --owner you@example.net --with-campaign *.json
    tracenorm normalize 80-1-128.112.139.42.json > observations.ndjson
    tracenorm fields *.json

Each capture needs a metadata sidecar (written by 'tracenorm mkmeta' or by
hand) carrying the vantage address, probed port, file type, owner, and time
bounds."
)]
#[command(version)]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Write log output to a file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize a capture into an observation stream
    #[command(long_about = "Normalize one tracebox capture into observations.

Reads the capture through a read-only memory mapping, fans the lines out to a
pool of extraction workers, and writes one NDJSON observation per detected
header change, followed by a single summary metadata record. Malformed lines
are logged and skipped; a missing or incomplete metadata sidecar aborts the
run before any output is written.

With more than one worker, observations may interleave out of input order.
Use --workers 1 when byte-for-byte reproducible output matters.

EXAMPLES:
    tracenorm normalize 80-1-128.112.139.42.json
    tracenorm normalize capture.json --meta capture-meta.json -o out.ndjson
    tracenorm normalize capture.json --workers 1")]
    Normalize {
        /// Path to the capture file (NDJSON, one probe record per line)
        input: PathBuf,

        /// Metadata sidecar path (default: <input>.pto_file_metadata.json)
        #[arg(long, value_name = "PATH")]
        meta: Option<PathBuf>,

        /// Output path (default: stdout)
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Number of extraction workers
        #[arg(long, default_value_t = 8)]
        workers: usize,

        /// Capacity of the hand-off queues between pipeline stages
        #[arg(long, default_value_t = 8192, value_name = "N")]
        queue_size: usize,
    },

    /// Write metadata sidecars for raw captures
    #[command(long_about = "Derive metadata sidecars from capture file names.

Capture files must be named <port>-<try>-<a.b.c.d>.json; the destination port
and vantage address come from the name, the time bounds from a scan over the
record timestamps. Each capture gets a <name>.pto_file_metadata.json sidecar
next to it. Directories are processed recursively; files that do not look
like captures are logged and skipped.

EXAMPLES:
    tracenorm mkmeta captures/
    tracenorm mkmeta --with-campaign --owner you@example.net *.json")]
    Mkmeta {
        /// Capture files or directories to process
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Also write __pto_campaign_metadata.json in the current directory
        #[arg(long)]
        with_campaign: bool,

        /// Owner of the raw data (required with --with-campaign)
        #[arg(long, value_name = "OWNER")]
        owner: Option<String>,

        /// File type recorded in campaign metadata
        #[arg(long, default_value = "tracebox-v1-ndjson", value_name = "TYPE")]
        filetype: String,

        /// Presumed TCP flags of the probes
        #[arg(long, default_value = "0x2", value_name = "FLAGS")]
        tcp_flags: String,

        /// Capture timezone ("Probably..." forms mark an assumption)
        #[arg(long, default_value = "ProbablyUTC", value_name = "TZ")]
        timezone: String,
    },

    /// Count raw header-field tokens across captures
    #[command(long_about = "Count IP::* and TCP::* field tokens across captures.

Scans the files in parallel and prints a frequency table, most frequent
first. Useful for deciding which raw fields deserve a condition mapping;
not part of the normalization pipeline.

EXAMPLE:
    tracenorm fields captures/

OUTPUT:
         5412080 IP::TTL
         5412080 IP::Checksum
           35282 TCP::O::MSS")]
    Fields {
        /// Capture files or directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Number of scan workers (default: one per CPU)
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
    },
}
