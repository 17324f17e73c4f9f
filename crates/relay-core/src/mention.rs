//! Mention markup handling for inbound text and length limits for outbound text.
//!
//! User mentions arrive as `<@123>` or `<@!123>` tokens inside the message
//! content. They carry no meaning for the assistant and are removed before a
//! turn is submitted.

use regex::Regex;
use std::sync::LazyLock;

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@!?[0-9]+>").expect("mention pattern is valid"));

/// Remove every user-mention token and trim surrounding whitespace.
///
/// Runs to a fixpoint, so stripping already-stripped text is a no-op even for
/// inputs like `<<@1>@2>` where one removal exposes another token.
pub fn strip_mentions(input: &str) -> String {
    let mut current = input.to_string();
    while MENTION.is_match(&current) {
        current = MENTION.replace_all(&current, "").into_owned();
    }
    current.trim().to_string()
}

/// Truncate to at most `max` characters, on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
