//! Tracebox NDJSON record model
//!
//! One line of a tracebox capture is one probe record: the destination the
//! probe was sent to, why the trace ended, when it was sent, and the list of
//! hops that answered, each carrying the header-field modifications,
//! additions, and deletions observed relative to the original packet.

use serde::Deserialize;

/// Address token used for hops that did not answer.
pub const WILDCARD: &str = "*";

/// One observed header-field name/value pair (`{"n": ..., "v": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldChange {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "v", default)]
    pub value: String,
}

/// One hop of a tracebox probe.
#[derive(Debug, Clone, Deserialize)]
pub struct TraceHop {
    /// Hop address: dotted quad, or `*` for an unresponsive hop
    #[serde(rename = "ha")]
    pub address: String,
    /// TTL at which this hop was probed
    #[serde(rename = "t", default)]
    pub ttl: u32,
    /// ICMP quotation length class reported by the hop
    #[serde(rename = "i", default)]
    pub icmp_quotation: u32,
    /// Header fields modified relative to the original packet
    #[serde(rename = "m", default)]
    pub modifications: Vec<FieldChange>,
    /// Header fields added relative to the original packet
    #[serde(rename = "a", default)]
    pub additions: Vec<FieldChange>,
    /// Header fields deleted relative to the original packet
    #[serde(rename = "d", default)]
    pub deletions: Vec<FieldChange>,
}

impl TraceHop {
    pub fn is_wildcard(&self) -> bool {
        self.address == WILDCARD
    }
}

/// One tracebox probe record, parsed from one NDJSON line.
#[derive(Debug, Clone, Deserialize)]
pub struct TraceRecord {
    /// Destination address of the probe
    #[serde(rename = "dst")]
    pub destination: String,
    /// Why the trace ended (e.g., "tcp-rst", "timeout")
    #[serde(rename = "r", default)]
    pub reason: String,
    /// Probe send time, Unix seconds
    #[serde(rename = "s")]
    pub timestamp: i64,
    /// Hops in TTL order; index 0 is the first hop after the source
    #[serde(rename = "h", default)]
    pub hops: Vec<TraceHop>,
}

impl TraceRecord {
    /// Parse a record from one NDJSON line.
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Number of intermediate hops. A final hop that already carries the
    /// destination address is implicit in path notation and not counted.
    pub fn intermediate_hops(&self) -> usize {
        let n = self.hops.len();
        if n > 0 && self.hops[n - 1].address == self.destination {
            n - 1
        } else {
            n
        }
    }
}

/// Trim leading and trailing ASCII whitespace from a raw byte slice.
///
/// Capture files are 7-bit ASCII; this avoids a UTF-8 round trip per line.
pub fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}
