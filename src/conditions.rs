//! Canonical condition catalog and value encoding
//!
//! Tracebox reports header changes under raw field names like `IP::ECN` or
//! `TCP::O::WSOPT-WindowScale`. The catalog maps each supported field to a
//! canonical condition identifier and the rule used to encode its value.
//! Fields that only reflect normal forwarding (checksum recomputation, TTL
//! decrement, sequence-number rewrites by the endpoint) have no entry and are
//! never reported.

/// How a raw field value is rendered into an observation value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Numeric, hex-first parse, rendered as a lowercase `0x` hex string.
    Hex,
    /// Numeric, rendered as plain decimal. Only the differentiated-services
    /// field uses this; its condition name carries the previous value.
    Decimal,
    /// Structured old/new pair, reported on every appearance.
    OldNew,
}

/// Raw field name of the TCP maximum-segment-size option.
///
/// MSS rewrites are only meaningful at the final responding hop and are
/// handled separately from the per-hop catalog lookup.
pub const MSS_FIELD: &str = "TCP::O::MSS";

/// Condition identifier for MSS rewrites.
pub const MSS_CONDITION: &str = "tcp.option.mss.changed";

/// Look up the canonical condition and encoding for a raw field name.
///
/// The table is static; lookups never allocate or mutate shared state.
/// Returns `None` for unrecognized and deliberately ignored fields, and for
/// [`MSS_FIELD`], which bypasses per-hop handling.
pub fn classify(field: &str) -> Option<(&'static str, Encoding)> {
    use Encoding::*;

    let entry = match field {
        "IP::DiffServicesCP" => ("dscp.0.changed", Decimal),
        "IP::ECN" => ("ecn.ip.changed", Hex),
        "IP::Flags" => ("ip.flags.changed", Hex),
        "IP::ID" => ("ip4.id.changed", Hex),
        "IP::Length" => ("tcp.length.changed", Hex),
        "TCP::AckNumber" => ("tcp.ack.changed", Hex),
        "TCP::Flags" => ("tcp.flags.changed", Hex),
        "TCP::Offset" => ("tcp.offset.changed", Hex),
        "TCP::Reserved" => ("tcp.reserved.changed", Hex),
        "TCP::SPort" => ("tcp.sport.changed", Hex),
        "TCP::UrgentPtr" => ("tcp.urg.changed", Hex),
        "TCP::Window" => ("tcp.window.changed", Hex),
        "TCP::O::CC" => ("tcp.option.rfc1644.cc.changed", Hex),
        "TCP::O::CC.ECHO" => ("tcp.option.rfc1644.echo.changed", Hex),
        "TCP::O::CC.NEW" => ("tcp.option.rfc1644.new.changed", Hex),
        "TCP::O::CorruptionExperienced" => ("tcp.option.corruption-experienced.changed", Hex),
        "TCP::O::Echo" => ("tcp.option.rfc1072.echo.changed", Hex),
        "TCP::O::EchoReply" => ("tcp.option.rfc1072.reply.changed", Hex),
        "TCP::O::MD5SignatureOption" => ("tcp.option.md5.changed", OldNew),
        "TCP::O::MultipathTCP" => ("tcp.option.mptcp.changed", Hex),
        "TCP::O::PartialOrderConnectionPermitted" => ("tcp.option.rfc1693.permitted.changed", Hex),
        "TCP::O::PartialOrderServiceProfile" => ("tcp.option.rfc1693.profile.changed", Hex),
        "TCP::O::Quick-StartResponse" => ("tcp.option.rfc4782.changed", Hex),
        "TCP::O::RecordBoundaries" => ("tcp.option.record-boundaries.changed", Hex),
        "TCP::O::SACK" => ("tcp.option.sack.changed", Hex),
        "TCP::O::SACKPermitted" => ("tcp.option.sackok.changed", Hex),
        "TCP::O::SCPSCapabilities" => ("tcp.option.scps-capabilities.changed", Hex),
        "TCP::O::SNAP" => ("tcp.option.snap.changed", Hex),
        "TCP::O::SelectiveNegativeAck" => ("tcp.option.selective-nack.changed", Hex),
        "TCP::O::TCPAlternateChecksumData" => ("tcp.option.rfc1146.data.changed", Hex),
        "TCP::O::TCPAlternateChecksumRequest" => ("tcp.option.rfc1146.request.changed", Hex),
        "TCP::O::TCPAuthenticationOption" => ("tcp.option.ao.changed", OldNew),
        "TCP::O::TSOPT-TimeStampOption" => ("tcp.option.ts.changed", Hex),
        "TCP::O::TrailerChecksumOption" => ("tcp.option.trailer-checksum.changed", Hex),
        "TCP::O::UserTimeoutOption" => ("tcp.option.user-timeout.changed", Hex),
        "TCP::O::WSOPT-WindowScale" => ("tcp.option.ws.changed", Hex),
        _ => return None,
    };

    Some(entry)
}

/// Parse a tracebox value, trying hexadecimal first, then decimal.
///
/// Tracebox renders most values as bare hex digit strings, so "10" is 16.
fn parse_numeric(value: &str) -> Option<i64> {
    i64::from_str_radix(value, 16)
        .ok()
        .or_else(|| value.parse().ok())
}

/// Render a raw value as a lowercase `0x` hex string.
///
/// Non-numeric values pass through verbatim.
pub fn render_hex(value: &str) -> String {
    match parse_numeric(value) {
        Some(n) => format!("0x{:x}", n),
        None => value.to_string(),
    }
}

/// Render a raw value as plain decimal.
///
/// Non-numeric values pass through verbatim.
pub fn render_decimal(value: &str) -> String {
    match parse_numeric(value) {
        Some(n) => n.to_string(),
        None => value.to_string(),
    }
}

/// Build the differentiated-services condition name from the previously
/// tracked value. An untracked or unparseable previous value counts as 0.
pub fn dscp_condition(previous: Option<&str>) -> String {
    let old = previous.and_then(parse_numeric).unwrap_or(0);
    format!("dscp.{}.changed", old)
}
