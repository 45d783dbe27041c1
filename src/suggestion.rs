//! Inline completion overlay for a segment target.
//!
//! A segment may carry a full suggested translation. While the text typed so
//! far is a strict prefix of that suggestion, the rest of it is shown after the
//! cursor and can be accepted one word at a time or all at once.

use std::sync::LazyLock;

use regex::Regex;

use crate::tags::{Node, parse_flat};

static NEXT_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*\S+)").unwrap_or_else(|err| panic!("invalid next word pattern: {err}"))
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acceptance {
    NextWord,
    All,
}

/// Unconsumed tail of `suggested` relative to `current`.
///
/// Defined only when `suggested` is longer than `current` and starts with it
/// exactly (case-sensitive, byte for byte).
pub fn compute_remainder<'a>(current: &str, suggested: Option<&'a str>) -> Option<&'a str> {
    let suggested = suggested?;
    if current.len() >= suggested.len() {
        return None;
    }
    suggested.strip_prefix(current)
}

/// Leading whitespace plus the following run of non-whitespace.
pub fn next_word(remainder: &str) -> Option<&str> {
    NEXT_WORD
        .captures(remainder)
        .and_then(|captures| captures.get(1))
        .map(|word| word.as_str())
}

/// New full text after accepting part of the suggestion, or `None` when there
/// is nothing to accept.
pub fn accept(current: &str, suggested: Option<&str>, acceptance: Acceptance) -> Option<String> {
    let remainder = compute_remainder(current, suggested)?;
    let accepted = match acceptance {
        Acceptance::NextWord => next_word(remainder)?,
        Acceptance::All => remainder,
    };
    let mut text = String::with_capacity(current.len() + accepted.len());
    text.push_str(current);
    text.push_str(accepted);
    Some(text)
}

/// Display content for the remainder. Orphaned tag notation stays literal.
pub fn overlay_nodes(remainder: &str) -> Vec<Node> {
    parse_flat(remainder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{Marker, TagType};

    #[test]
    fn remainder_requires_strict_prefix() {
        assert_eq!(compute_remainder("Hello", Some("Hello world")), Some(" world"));
        assert_eq!(compute_remainder("Hello world", Some("Hello")), None);
        assert_eq!(compute_remainder("Goodbye", Some("Hello world")), None);
        assert_eq!(compute_remainder("Hello", Some("Hello")), None);
        assert_eq!(compute_remainder("hello", Some("Hello world")), None);
        assert_eq!(compute_remainder("Hello", None), None);
        assert_eq!(compute_remainder("", Some("Hi")), Some("Hi"));
    }

    #[test]
    fn next_word_takes_leading_whitespace() {
        assert_eq!(next_word(" world peace"), Some(" world"));
        assert_eq!(next_word("world"), Some("world"));
        assert_eq!(next_word("\n  [k]x[/k] y"), Some("\n  [k]x[/k]"));
        assert_eq!(next_word("   "), None);
        assert_eq!(next_word(""), None);
    }

    #[test]
    fn accept_word_then_rest() {
        let suggested = Some("Hello world peace");
        let first = accept("Hello", suggested, Acceptance::NextWord);
        assert_eq!(first.as_deref(), Some("Hello world"));
        let current = first.unwrap_or_default();
        assert_eq!(compute_remainder(&current, suggested), Some(" peace"));
        assert_eq!(
            accept(&current, suggested, Acceptance::NextWord).as_deref(),
            Some("Hello world peace")
        );
    }

    #[test]
    fn accept_all_completes_suggestion() {
        assert_eq!(
            accept("Hello", Some("Hello, world!"), Acceptance::All).as_deref(),
            Some("Hello, world!")
        );
    }

    #[test]
    fn accept_without_word_falls_through() {
        assert_eq!(accept("Hi", Some("Hi   "), Acceptance::NextWord), None);
        assert_eq!(
            accept("Hi", Some("Hi   "), Acceptance::All).as_deref(),
            Some("Hi   ")
        );
        assert_eq!(accept("Yo", Some("Hi there"), Acceptance::All), None);
    }

    #[test]
    fn overlay_decodes_complete_tags_only() {
        assert_eq!(
            overlay_nodes(" [b]now[/b]"),
            vec![
                Node::text(" "),
                Node::Marker(Marker::open(TagType::B)),
                Node::text("now"),
                Node::Marker(Marker::close(TagType::B)),
            ]
        );
        assert_eq!(overlay_nodes("ow[/b]."), vec![Node::text("ow[/b].")]);
    }
}
