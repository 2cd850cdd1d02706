//! Read-only memory mapping of capture files
//!
//! Captures can run to many gigabytes; mapping them avoids double-buffering
//! the whole file through read calls. The mapping is dropped exactly once
//! when the pipeline finishes and is never written through.

use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::Path;

/// Map a capture file read-only, hinting sequential access to the kernel.
pub fn map_capture(path: &Path) -> io::Result<Mmap> {
    let file = File::open(path)?;
    // SAFETY: the mapping is read-only and capture files are immutable once
    // handed to the normalizer.
    let mmap = unsafe { Mmap::map(&file)? };
    #[cfg(unix)]
    let _ = mmap.advise(memmap2::Advice::Sequential);
    Ok(mmap)
}
