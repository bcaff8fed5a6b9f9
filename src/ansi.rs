//! C3 — measuring and truncating markup- or ANSI-decorated strings without
//! corrupting the decoration.

use unicode_width::UnicodeWidthStr;

/// Visible column width of `s` once bracketed markup tags (`[tag]...[/]`)
/// are removed. Implemented as a bracket-counting scan rather than handing
/// off to a markup-stripping library call, so nested tags unwind correctly
/// (this is also what [`truncate_markup`] depends on).
pub fn visible_length_markup(s: &str) -> usize {
    strip_markup(s).1
}

/// Visible column width of `s` once ANSI escape sequences
/// (`ESC [ ... letter`) are removed.
pub fn visible_length_ansi(s: &str) -> usize {
    strip_ansi(s).width()
}

/// Truncate `s` to at most `n` visible columns, treating `[tag]...[/]` as
/// markup. Any tags still open at the cut point are closed by appending one
/// `[/]` per open tag, so the result always has balanced tags.
pub fn truncate_markup(s: &str, n: usize) -> String {
    let mut out = String::new();
    let mut visible = 0usize;
    let mut open_tags: Vec<String> = Vec::new();
    let mut chars = s.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '[' {
            if let Some(end) = s[i..].find(']') {
                let tag = &s[i + 1..i + end];
                let full = &s[i..i + end + 1];
                if let Some(name) = tag.strip_prefix('/') {
                    out.push_str(full);
                    if name.is_empty() {
                        open_tags.pop();
                    } else if let Some(pos) = open_tags.iter().rposition(|t| t == name) {
                        open_tags.remove(pos);
                    }
                } else {
                    out.push_str(full);
                    open_tags.push(tag.to_string());
                }
                for _ in 0..end {
                    chars.next();
                }
                continue;
            }
            // Unterminated '[': treat as a literal visible character.
        }
        let w = UnicodeWidthStr::width(c.to_string().as_str());
        if visible + w > n {
            break;
        }
        visible += w;
        out.push(c);
    }
    for tag in open_tags.into_iter().rev() {
        let _ = tag;
        out.push_str("[/]");
    }
    out
}

/// Truncate `s` to at most `n` visible columns, treating `ESC [ ... letter`
/// as a zero-width escape to carry through verbatim. An `ESC[0m` in the
/// source closes *all* currently-open SGR attributes (matching real
/// terminal reset semantics), not just the most recent one. The result
/// always ends with `\x1b[0m` if anything was ever opened.
pub fn truncate_ansi(s: &str, n: usize) -> String {
    let mut out = String::new();
    let mut visible = 0usize;
    let mut any_open = false;

    let bytes = s.as_bytes();
    let mut i = 0;
    'outer: while i < bytes.len() {
        if bytes[i] == 0x1b && i + 1 < bytes.len() && bytes[i + 1] == b'[' {
            let start = i;
            i += 2;
            while i < bytes.len() && !bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            if i < bytes.len() {
                i += 1;
            }
            let seq = &s[start..i];
            out.push_str(seq);
            if seq == "\x1b[0m" {
                any_open = false;
            } else if seq.starts_with("\x1b[") {
                any_open = true;
            }
            continue;
        }
        let rest = &s[i..];
        let Some(ch) = rest.chars().next() else { break };
        let w = UnicodeWidthStr::width(ch.to_string().as_str());
        if visible + w > n {
            break 'outer;
        }
        visible += w;
        out.push(ch);
        i += ch.len_utf8();
    }
    if any_open {
        out.push_str("\x1b[0m");
    }
    out
}

/// Extract the visible-column range `[start, start+len)` of an
/// ANSI-decorated string, preserving any escapes that fall within the
/// extracted range.
pub fn substring_ansi(s: &str, start: usize, len: usize) -> String {
    let mut out = String::new();
    let mut visible = 0usize;
    let end = start.saturating_add(len);

    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == 0x1b && i + 1 < bytes.len() && bytes[i + 1] == b'[' {
            let seq_start = i;
            i += 2;
            while i < bytes.len() && !bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            if i < bytes.len() {
                i += 1;
            }
            if visible >= start && visible < end {
                out.push_str(&s[seq_start..i]);
            }
            continue;
        }
        let rest = &s[i..];
        let Some(ch) = rest.chars().next() else { break };
        let w = UnicodeWidthStr::width(ch.to_string().as_str());
        if visible >= start && visible < end {
            out.push(ch);
        }
        visible += w;
        i += ch.len_utf8();
        if visible >= end {
            break;
        }
    }
    out
}

/// Strip `[tag]...[/]` markup, returning the plain text and its visible
/// column width.
fn strip_markup(s: &str) -> (String, usize) {
    let mut out = String::new();
    let mut width = 0usize;
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '[' {
            if let Some(end) = s[i..].find(']') {
                for _ in 0..end {
                    chars.next();
                }
                continue;
            }
        }
        out.push(c);
        width += UnicodeWidthStr::width(c.to_string().as_str());
    }
    (out, width)
}

/// Strip ANSI escape sequences, returning the plain text.
fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == 0x1b && i + 1 < bytes.len() && bytes[i + 1] == b'[' {
            i += 2;
            while i < bytes.len() && !bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            if i < bytes.len() {
                i += 1;
            }
            continue;
        }
        let rest = &s[i..];
        if let Some(ch) = rest.chars().next() {
            out.push(ch);
            i += ch.len_utf8();
        } else {
            break;
        }
    }
    out
}


/// Replays the same bracket-scanning push/pop rules [`truncate_markup`]
/// uses internally, returning the count of tags still open at the end of
/// `s`. Used by the property tests below to check tag balance without
/// duplicating the truncation logic itself.
#[cfg(test)]
fn unclosed_tag_count(s: &str) -> usize {
    let mut open_tags: Vec<String> = Vec::new();
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '[' {
            if let Some(end) = s[i..].find(']') {
                let tag = &s[i + 1..i + end];
                if let Some(name) = tag.strip_prefix('/') {
                    if name.is_empty() {
                        open_tags.pop();
                    } else if let Some(pos) = open_tags.iter().rposition(|t| t == name) {
                        open_tags.remove(pos);
                    }
                } else {
                    open_tags.push(tag.to_string());
                }
                for _ in 0..end {
                    chars.next();
                }
            }
        }
    }
    open_tags.len()
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn plain_text() -> impl Strategy<Value = String> {
        proptest::collection::vec("[a-zA-Z0-9 ]", 0..30).prop_map(|chars| chars.concat())
    }

    fn markup_segment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("[bold]".to_string()),
            Just("[red]".to_string()),
            Just("[green]".to_string()),
            Just("[/]".to_string()),
            "[a-zA-Z ]{0,6}",
        ]
    }

    proptest! {
        #[test]
        fn truncate_ansi_never_exceeds_budget(s in plain_text(), n in 0usize..40) {
            let out = truncate_ansi(&s, n);
            prop_assert!(visible_length_ansi(&out) <= n);
        }

        #[test]
        fn truncate_ansi_is_idempotent_once_under_budget(s in plain_text(), n in 0usize..40) {
            let once = truncate_ansi(&s, n);
            let twice = truncate_ansi(&once, n);
            prop_assert_eq!(visible_length_ansi(&once), visible_length_ansi(&twice));
        }

        #[test]
        fn truncate_markup_never_exceeds_budget(segments in proptest::collection::vec(markup_segment(), 0..12), n in 0usize..40) {
            let s = segments.concat();
            let out = truncate_markup(&s, n);
            prop_assert!(visible_length_markup(&out) <= n);
        }

        #[test]
        fn truncate_markup_always_closes_every_opened_tag(segments in proptest::collection::vec(markup_segment(), 0..12), n in 0usize..40) {
            let s = segments.concat();
            let out = truncate_markup(&s, n);
            prop_assert_eq!(unclosed_tag_count(&out), 0);
        }
    }
}
