//! Hop-path reconstruction for detected header changes
//!
//! A path is a space-separated string of hop tokens, starting at the source
//! address and ending at the destination, with `*` standing in for one or
//! more unresponsive hops. When a change is detected at hop index k, only the
//! hops around k are spelled out; everything else collapses into wildcards.
//!
//! Let S and D be the source and destination, P = [P0, ..., Pn-1] the
//! intermediate hops (a final hop that equals D is implicit and not counted),
//! and k the change index with 0 <= k <= n (k = n means the change happened
//! between Pn-1 and D):
//!
//! | n   | k            | path                |
//! |-----|--------------|---------------------|
//! | 0   | -            | S D                 |
//! | 1   | 0 or 1       | S P0 D              |
//! | >1  | 0            | S P0 * D            |
//! | >1  | n            | S * Pn-1 D          |
//! | 2   | 1            | S P0 P1 D           |
//! | >2  | 1            | S P0 P1 * D         |
//! | >2  | n-1          | S * Pk-1 Pk D       |
//! | >3  | 2 <= k < n-1 | S * Pk-1 Pk * D     |
//!
//! Adjacent wildcards are never printed: where a spelled-out hop is itself
//! `*` and sits next to a wildcard token, it is omitted.

use crate::record::{TraceRecord, WILDCARD};

/// Build the path notation for a change detected at hop `index`.
///
/// When `existing` is `Some`, it is returned unchanged; callers that detect
/// several changes at the same hop reuse the first reconstruction. `index`
/// must lie in `[0, n]` for n intermediate hops; anything larger is a caller
/// bug and panics.
pub fn change_path(
    existing: Option<String>,
    source: &str,
    record: &TraceRecord,
    index: usize,
) -> String {
    if let Some(path) = existing {
        return path;
    }

    let n = record.intermediate_hops();
    assert!(
        index <= n,
        "change index {} out of range for {} intermediate hops",
        index,
        n
    );

    let hop = |i: usize| record.hops[i].address.as_str();
    let mut path = String::from(source);

    if n == 1 {
        // single intermediate hop: indices 0 and 1 are indistinguishable
        path.push(' ');
        path.push_str(hop(0));
    } else if n > 1 && index == 0 {
        path.push(' ');
        path.push_str(hop(0));
        path.push_str(" *");
    } else if n > 1 && index == n {
        path.push_str(" *");
        if hop(n - 1) != WILDCARD {
            path.push(' ');
            path.push_str(hop(n - 1));
        }
    } else if n == 2 && index == 1 {
        path.push(' ');
        path.push_str(hop(0));
        path.push(' ');
        path.push_str(hop(1));
    } else if n > 2 && index == 1 {
        path.push(' ');
        path.push_str(hop(0));
        path.push(' ');
        path.push_str(hop(1));
        path.push_str(" *");
    } else if n > 2 && index == n - 1 {
        path.push_str(" * ");
        if hop(index - 1) != WILDCARD {
            path.push_str(hop(index - 1));
            path.push(' ');
        }
        path.push_str(hop(index));
    } else if n > 3 && (2..n - 1).contains(&index) {
        path.push_str(" * ");
        if hop(index - 1) != WILDCARD {
            path.push_str(hop(index - 1));
            path.push(' ');
        }
        path.push_str(hop(index));
        path.push_str(" *");
    }

    path.push(' ');
    path.push_str(&record.destination);
    path
}

/// Build the path notation covering the whole trace.
///
/// Every responsive hop is spelled out in order; runs of unresponsive hops
/// collapse into a single `*`. The destination is appended unless the final
/// hop already reached it.
pub fn full_path(source: &str, record: &TraceRecord) -> String {
    let mut path = String::from(source);
    let mut in_wildcard_run = false;

    for hop in &record.hops {
        if !hop.is_wildcard() {
            if in_wildcard_run {
                path.push_str(" *");
            }
            path.push(' ');
            path.push_str(&hop.address);
        }
        in_wildcard_run = hop.is_wildcard();
    }

    if in_wildcard_run {
        path.push_str(" *");
    }

    match record.hops.last() {
        Some(last) if last.address == record.destination => {}
        _ => {
            path.push(' ');
            path.push_str(&record.destination);
        }
    }

    path
}
