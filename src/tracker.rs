//! Per-record change tracking
//!
//! A single middlebox usually rewrites a field once, but the rewrite shows up
//! in the trace at every hop downstream of it. The tracker remembers the last
//! value seen per field within one probe record so a rewrite is reported at
//! the hop where it first appears, not at every hop that echoes it.

use std::collections::HashMap;

/// Outcome of feeding one field value to the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// Same value as the last sighting; nothing to report.
    Unchanged,
    /// New or different value; `previous` is the value it replaced, if any.
    Changed { previous: Option<String> },
}

/// Last-seen field values within one probe record.
///
/// One tracker exists per in-flight record and is never shared across lines.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    seen: HashMap<String, String>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sighting of `field` with `value`.
    ///
    /// Reports [`Report::Changed`] when the field has never been seen or the
    /// value differs from the tracked one, and updates the tracked value in
    /// that case.
    pub fn observe(&mut self, field: &str, value: &str) -> Report {
        match self.seen.get(field) {
            Some(tracked) if tracked == value => Report::Unchanged,
            tracked => {
                let previous = tracked.cloned();
                self.seen.insert(field.to_string(), value.to_string());
                Report::Changed { previous }
            }
        }
    }

    /// Last tracked value for `field`, if any.
    pub fn last(&self, field: &str) -> Option<&str> {
        self.seen.get(field).map(String::as_str)
    }

    /// Overwrite the tracked value for `field` unconditionally.
    ///
    /// Used by the always-report condition families, which decide
    /// reportability themselves but still need the previous value.
    pub fn set(&mut self, field: &str, value: &str) {
        self.seen.insert(field.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_is_a_change_without_previous() {
        let mut tracker = ChangeTracker::new();
        assert_eq!(
            tracker.observe("TCP::Window", "8b56"),
            Report::Changed { previous: None }
        );
    }

    #[test]
    fn repeated_value_is_not_reported() {
        let mut tracker = ChangeTracker::new();
        tracker.observe("TCP::Window", "8b56");
        assert_eq!(tracker.observe("TCP::Window", "8b56"), Report::Unchanged);
        assert_eq!(tracker.observe("TCP::Window", "8b56"), Report::Unchanged);
    }

    #[test]
    fn different_value_reports_with_previous() {
        let mut tracker = ChangeTracker::new();
        tracker.observe("TCP::Window", "8b56");
        assert_eq!(
            tracker.observe("TCP::Window", "8a00"),
            Report::Changed {
                previous: Some("8b56".to_string())
            }
        );
    }

    #[test]
    fn fields_are_tracked_independently() {
        let mut tracker = ChangeTracker::new();
        tracker.observe("TCP::Window", "8b56");
        assert_eq!(
            tracker.observe("IP::ECN", "8b56"),
            Report::Changed { previous: None }
        );
    }

    #[test]
    fn set_overwrites_without_reporting() {
        let mut tracker = ChangeTracker::new();
        tracker.set("TCP::O::TCPAuthenticationOption", "aa");
        assert_eq!(tracker.last("TCP::O::TCPAuthenticationOption"), Some("aa"));
        tracker.set("TCP::O::TCPAuthenticationOption", "");
        assert_eq!(tracker.last("TCP::O::TCPAuthenticationOption"), Some(""));
    }

    #[test]
    fn last_is_none_for_untracked_field() {
        let tracker = ChangeTracker::new();
        assert_eq!(tracker.last("TCP::Window"), None);
    }
}
