//! Property tests for unprintable escaping and line framing.
//!
//! Checks:
//! 1. Text with no unprintable characters passes through unchanged.
//! 2. A terminated line keeps a literal `\r\n` at the end after escaping.
//! 3. No unprintable character survives escaping except that terminator.
//! 4. Every unprintable character shows up as a `\u` escape of its code point.
//! 5. Framing appends exactly the two-byte terminator.

use proptest::prelude::*;
use rawchat_proto::escape::{escape_unprintables, is_unprintable};
use rawchat_proto::line::{self, CRLF};

/// Strategy for printable-only lines.
fn arb_printable_line() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 :#!@.,;'\"/é✓😀-]{0,128}"
}

/// Strategy for lines mixing printable text with control characters.
fn arb_mixed_line() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => "[a-zA-Z0-9 :#]".prop_map(|s| s.chars().next().unwrap_or('a')),
            1 => (0u32..0x20).prop_map(|n| char::from_u32(n).unwrap_or('\0')),
            1 => Just('\u{7f}'),
            1 => Just('\u{200b}'),
        ],
        0..64,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    #[test]
    fn printable_lines_are_unchanged(line in arb_printable_line()) {
        prop_assert_eq!(escape_unprintables(&line), line);
    }

    #[test]
    fn terminated_line_keeps_literal_crlf(line in arb_mixed_line()) {
        // Strip CR/LF from the body so the only pair is the terminator.
        let body: String = line.chars().filter(|c| *c != '\r' && *c != '\n').collect();
        let escaped = escape_unprintables(&line::frame(&body));
        prop_assert!(escaped.ends_with(CRLF));
        let head = &escaped[..escaped.len() - CRLF.len()];
        prop_assert!(!head.chars().any(is_unprintable));
    }

    #[test]
    fn every_unprintable_is_escaped(line in arb_mixed_line()) {
        let body: String = line.chars().filter(|c| *c != '\r' && *c != '\n').collect();
        let escaped = escape_unprintables(&body);
        prop_assert!(!escaped.chars().any(is_unprintable));
        for c in body.chars().filter(|c| is_unprintable(*c)) {
            let expected = format!("\\u{:04x}", u32::from(c));
            prop_assert!(escaped.contains(&expected));
        }
    }

    #[test]
    fn escaping_twice_changes_nothing_more(line in arb_mixed_line()) {
        let body: String = line.chars().filter(|c| *c != '\r' && *c != '\n').collect();
        let once = escape_unprintables(&body);
        prop_assert_eq!(escape_unprintables(&once), once.clone());
    }

    #[test]
    fn framing_adds_two_bytes(line in arb_printable_line()) {
        let framed = line::frame(&line);
        prop_assert_eq!(framed.len(), line.len() + 2);
        prop_assert!(framed.ends_with("\r\n"));
        prop_assert_eq!(line::strip_terminator(&framed), line.as_str());
    }
}
