use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Elements removed together with everything inside them.
const BOILERPLATE_TAGS: [&str; 10] = [
    "script", "style", "header", "footer", "nav", "aside", "iframe", "noscript", "form", "svg",
];

static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(p|div|br|hr|li|ul|ol|h[1-6]|tr|td|th|table|section|article|main|blockquote|pre|title|figcaption)\b[^>]*>",
    )
    .expect("block tag pattern is valid")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Reduces an HTML page to its visible text on a single line.
///
/// Uses the ammonia sanitizer with an empty tag whitelist: every tag is dropped
/// but its text kept, except for the boilerplate elements above whose content
/// goes too. Block-level tags are replaced by a space first so words from
/// adjacent paragraphs do not run together.
pub fn html_to_text(html: &str) -> String {
    let spaced = BLOCK_TAG.replace_all(html, "$0 ");

    let stripped = ammonia::Builder::empty()
        .clean_content_tags(HashSet::from(BOILERPLATE_TAGS))
        .clean(&spaced)
        .to_string();

    let decoded = decode_serializer_entities(&stripped);
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

/// The sanitizer re-serializes text, escaping these characters. `&amp;` goes last
/// so an escaped entity in the source stays literal.
fn decode_serializer_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

/// Cuts the text to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
