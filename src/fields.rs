//! Header-field frequency scanning
//!
//! Counts how often each raw `IP::*` / `TCP::*` field name appears across a
//! set of capture files. The counts guide which fields earn an entry in the
//! condition catalog; this never runs as part of normalization.

use anyhow::{Context, Result};
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Count field tokens across `paths` (directories recurse) and print a
/// frequency table to `out`, most frequent first.
pub fn run(paths: &[PathBuf], workers: Option<usize>, out: &mut impl Write) -> Result<()> {
    let mut files = Vec::new();
    for path in paths {
        collect_files(path, &mut files);
    }

    let counts = count_fields(&files, workers)?;

    let mut entries: Vec<(&String, &u64)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (name, count) in entries {
        writeln!(out, "{:12} {}", count, name)?;
    }
    Ok(())
}

/// Scan `files` in parallel and merge the per-file counts.
pub fn count_fields(files: &[PathBuf], workers: Option<usize>) -> Result<HashMap<String, u64>> {
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("fieldscan-{}", i));
    if let Some(workers) = workers {
        builder = builder.num_threads(workers);
    }
    let pool = builder.build().context("failed to build scan thread pool")?;

    let token_res = [
        Regex::new(r#"(IP::[^"]*)"#).context("field token pattern")?,
        Regex::new(r#"(TCP::[^"]*)"#).context("field token pattern")?,
    ];

    let counts = pool.install(|| {
        files
            .par_iter()
            .map(|path| count_file(path, &token_res))
            .reduce(HashMap::new, merge_counts)
    });
    Ok(counts)
}

fn collect_files(path: &Path, files: &mut Vec<PathBuf>) {
    if path.is_dir() {
        match fs::read_dir(path) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    collect_files(&entry.path(), files);
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "cannot read directory"),
        }
        return;
    }
    files.push(path.to_path_buf());
}

fn count_file(path: &Path, token_res: &[Regex]) -> HashMap<String, u64> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read file");
            return HashMap::new();
        }
    };

    let mut counts = HashMap::new();
    for line in raw.lines() {
        for re in token_res {
            for m in re.find_iter(line) {
                *counts.entry(m.as_str().to_string()).or_insert(0) += 1;
            }
        }
    }
    counts
}

fn merge_counts(mut into: HashMap<String, u64>, from: HashMap<String, u64>) -> HashMap<String, u64> {
    for (name, count) in from {
        *into.entry(name).or_insert(0) += count;
    }
    into
}
