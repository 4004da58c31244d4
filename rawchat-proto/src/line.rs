//! Line framing for the CRLF-terminated chat protocol.
//!
//! Outbound lines are held without a terminator and framed right before they
//! hit the wire. Inbound lines keep whatever terminator the peer sent so the
//! logging path can show it.

/// Protocol line terminator.
pub const CRLF: &str = "\r\n";

/// Appends the protocol terminator to an unterminated line.
///
/// The line is not inspected; text typed by the user goes out verbatim.
#[must_use]
pub fn frame(line: &str) -> String {
    let mut framed = String::with_capacity(line.len() + CRLF.len());
    framed.push_str(line);
    framed.push_str(CRLF);
    framed
}

/// Strips a trailing `\n` or `\r\n` from a received line.
#[must_use]
pub fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Returns `true` if `raw` ends with a line feed.
///
/// A read that returns bytes without one only happens at end-of-stream.
#[must_use]
pub fn is_complete(raw: &[u8]) -> bool {
    raw.last() == Some(&b'\n')
}
