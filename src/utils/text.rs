//! Cleanup helpers shared by the PDF and transcript extractors.

use std::sync::LazyLock;

use regex::Regex;

static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

static INLINE_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Non-printable control characters removed from extracted text.
///
/// Tab, newline, form feed and carriage return are kept.
fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

/// Remove the control characters listed in [`is_stripped_control`].
pub fn strip_control_chars(text: &str) -> String {
    text.chars().filter(|c| !is_stripped_control(*c)).collect()
}

/// Clean raw text pulled out of a document.
///
/// Control characters go first so that the whitespace passes see the final
/// character sequence, which keeps the function idempotent.
pub fn normalize(raw: &str) -> String {
    let text = strip_control_chars(raw);
    let text = BLANK_LINES_RE.replace_all(&text, "\n\n");
    let text = INLINE_SPACE_RE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Join caption fragments into one line of prose.
pub fn join_fragments<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = fragments.into_iter().collect::<Vec<_>>().join(" ");
    let collapsed = WHITESPACE_RE.replace_all(&joined, " ");
    strip_control_chars(&collapsed).trim().to_string()
}

/// Number of Unicode scalar values in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// First `limit` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
