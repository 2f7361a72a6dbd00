use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static NEWLINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+").expect("valid newline pattern"));
static BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("valid inter-tag pattern"));

const DOCTYPE_MARKUP: &str = "<!DOCTYPE html>";

/// Compact serialized markup.
///
/// Steps, in order:
/// - Collapse every whitespace run to a single space
/// - Collapse newline runs to one newline
/// - Drop whitespace between adjacent tags
/// - Strip the `<!DOCTYPE html>` marker
pub fn compact_markup(markup: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(markup, " ");
    let collapsed = NEWLINE_RUN.replace_all(&collapsed, "\n");
    let collapsed = BETWEEN_TAGS.replace_all(&collapsed, "><");
    collapsed.replace(DOCTYPE_MARKUP, "")
}

/// Number of whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
