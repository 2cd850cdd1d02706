//! tracenorm - CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracenorm::cli::{Cli, Commands};
use tracenorm::metadata::{sidecar_path, RawMetadata, CAMPAIGN_METADATA_FILENAME};
use tracenorm::mkmeta::MkmetaOptions;
use tracenorm::pipeline::{normalize, PipelineConfig};
use tracenorm::{fields, input, mkmeta};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Normalize {
            input,
            meta,
            output,
            workers,
            queue_size,
        } => run_normalize(&input, meta, output, workers, queue_size),
        Commands::Mkmeta {
            paths,
            with_campaign,
            owner,
            filetype,
            tcp_flags,
            timezone,
        } => mkmeta::run(
            &paths,
            &MkmetaOptions {
                with_campaign,
                file_type: filetype,
                owner,
                tcp_flags,
                timezone,
            },
        ),
        Commands::Fields { paths, workers } => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            fields::run(&paths, workers, &mut out)?;
            out.flush()?;
            Ok(())
        }
    }
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("can't open log file \"{}\"", path.display()))?;
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

fn run_normalize(
    input: &Path,
    meta: Option<PathBuf>,
    output: Option<PathBuf>,
    workers: usize,
    queue_size: usize,
) -> Result<()> {
    let meta_path = meta.unwrap_or_else(|| sidecar_path(input));
    let mut md = RawMetadata::from_file(&meta_path)
        .with_context(|| format!("failed to read metadata sidecar \"{}\"", meta_path.display()))?;

    // campaign-wide keys (file type, owner) live next to the captures
    let campaign_path = input
        .parent()
        .unwrap_or(Path::new("."))
        .join(CAMPAIGN_METADATA_FILENAME);
    if campaign_path.exists() {
        let campaign = RawMetadata::from_file(&campaign_path).with_context(|| {
            format!(
                "failed to read campaign metadata \"{}\"",
                campaign_path.display()
            )
        })?;
        md.inherit(&campaign);
    }

    let mapped = input::map_capture(input)
        .with_context(|| format!("failed to map capture \"{}\"", input.display()))?;
    let config = PipelineConfig {
        workers,
        queue_capacity: queue_size,
    };

    match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("failed to create output \"{}\"", path.display()))?;
            let mut out = BufWriter::new(file);
            normalize(&mapped, &md, &mut out, &config)?;
            out.flush()?;
        }
        None => {
            let mut out = BufWriter::new(io::stdout());
            normalize(&mapped, &md, &mut out, &config)?;
            out.flush()?;
        }
    }
    Ok(())
}
