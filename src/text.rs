use std::sync::LazyLock;

use regex::Regex;

static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("valid horizontal whitespace regex"));
static NEWLINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?\n[\n ]*").expect("valid newline run regex"));
static FIRST_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid integer regex"));

/// Collapses whitespace in scraped text.
///
/// Runs of horizontal whitespace become a single space, runs of newlines (and the
/// spaces around them) become a single `\n`, and the result is trimmed. Applying it to
/// its own output is a no-op.
pub fn normalize_text(input: &str) -> String {
    let collapsed = HORIZONTAL_WS.replace_all(input, " ");
    let collapsed = NEWLINE_RUN.replace_all(&collapsed, "\n");
    collapsed.trim().to_owned()
}

/// First run of ASCII digits in `text`, e.g. `"Terms in this set (150)"` -> `150`.
pub fn first_integer(text: &str) -> Option<u64> {
    FIRST_INTEGER
        .find(text)
        .and_then(|m| m.as_str().parse::<u64>().ok())
}

/// Width of the zero-padded record keys for a set of `count` records.
pub fn pad_width(count: usize) -> usize {
    count.to_string().len()
}

/// 1-based, zero-padded record key.
pub fn padded_key(index: usize, width: usize) -> String {
    format!("{index:0width$}")
}
