//! Escaping of unprintable characters for log output.
//!
//! Twitch chat carries raw control bytes (CTCP uses `\x01`, for instance)
//! that are invisible or disruptive in a terminal. When enabled, the client
//! rewrites them as `\uXXXX` before logging.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

/// Escaped form of the protocol terminator, collapsed back after escaping.
const ESCAPED_CRLF: &str = "\\u000d\\u000a";

/// Unicode general category "Other": Cc, Cf, Cn, Co and Cs.
#[allow(clippy::expect_used)]
static UNPRINTABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\pC").expect("valid unicode class pattern"));

/// Returns a copy of `line` with every unprintable character replaced by
/// `\u` and its code point in lowercase hex (at least four digits).
///
/// The first escaped `\r\n` pair is then turned back into a literal `\r\n`
/// so that a terminated line keeps its terminator.
#[must_use]
pub fn escape_unprintables(line: &str) -> String {
    let mut escaped = String::with_capacity(line.len());
    let mut last = 0;
    for m in UNPRINTABLE.find_iter(line) {
        escaped.push_str(&line[last..m.start()]);
        for c in m.as_str().chars() {
            // Writing to a String cannot fail.
            let _ = write!(escaped, "\\u{:04x}", u32::from(c));
        }
        last = m.end();
    }
    escaped.push_str(&line[last..]);
    escaped.replacen(ESCAPED_CRLF, "\r\n", 1)
}

/// Returns `true` for control, format, unassigned and private-use
/// characters.
#[must_use]
pub fn is_unprintable(c: char) -> bool {
    let mut buf = [0u8; 4];
    UNPRINTABLE.is_match(c.encode_utf8(&mut buf))
}
