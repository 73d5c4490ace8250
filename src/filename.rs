//! Output filename templating.
//!
//! A pattern mixes moment.js-style date tokens (`YYYY-MM-DD_HH-mm-ss`), `[literal]`
//! text and `{placeholder}`s filled from the set info.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike as _, FixedOffset, Timelike as _};
use regex::Regex;

use crate::formats::SetInfo;

pub const DEFAULT_PATTERN: &str = "{quizSetTitle}_YYYY-MM-DD_HH-mm-ss_{swapState}";
const FALLBACK_TITLE: &str = "quizlet_set";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("valid placeholder regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

// Longest tokens first so `YYYY` wins over `YY`.
const TOKENS: &[&str] = &[
    "YYYY", "MMMM", "dddd", "MMM", "ddd", "SSS", "YY", "MM", "DD", "HH", "hh", "mm", "ss", "M",
    "D", "H", "h", "m", "s", "A", "a", "X",
];

pub fn swap_state(swapped: bool) -> &'static str {
    if swapped { "DT" } else { "TD" }
}

pub fn generate(
    pattern: &str,
    info: &SetInfo,
    extension: &str,
    now: &DateTime<FixedOffset>,
) -> String {
    let protected = PLACEHOLDER.replace_all(pattern, "[$0]");
    let formatted = format_date(&protected, now);

    let name = formatted
        .replace("{quizSetTitle}", &sanitize_title(&info.quiz_set_title))
        .replace("{swapState}", swap_state(info.swapped))
        .replace(['/', '\\'], "-");

    let suffix = format!(".{}", extension.to_lowercase());
    if name.to_lowercase().ends_with(&suffix) {
        name
    } else {
        format!("{name}.{extension}")
    }
}

pub fn sanitize_title(title: &str) -> String {
    let title = title.trim();
    let title = if title.is_empty() { FALLBACK_TITLE } else { title };
    WHITESPACE_RUN
        .replace_all(title, "_")
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Expands date tokens; `[...]` is copied without the brackets.
pub fn format_date(pattern: &str, now: &DateTime<FixedOffset>) -> String {
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut rest = pattern;

    while let Some(ch) = rest.chars().next() {
        if ch == '['
            && let Some(end) = rest.find(']')
        {
            out.push_str(&rest[1..end]);
            rest = &rest[end + 1..];
            continue;
        }
        if let Some(token) = TOKENS.iter().find(|token| rest.starts_with(**token)) {
            out.push_str(&expand_token(token, now));
            rest = &rest[token.len()..];
            continue;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

fn expand_token(token: &str, now: &DateTime<FixedOffset>) -> String {
    let hour12 = match now.hour() % 12 {
        0 => 12,
        h => h,
    };
    match token {
        "YYYY" => format!("{:04}", now.year()),
        "YY" => format!("{:02}", now.year().rem_euclid(100)),
        "MMMM" => now.format("%B").to_string(),
        "MMM" => now.format("%b").to_string(),
        "MM" => format!("{:02}", now.month()),
        "M" => now.month().to_string(),
        "DD" => format!("{:02}", now.day()),
        "D" => now.day().to_string(),
        "dddd" => now.format("%A").to_string(),
        "ddd" => now.format("%a").to_string(),
        "HH" => format!("{:02}", now.hour()),
        "H" => now.hour().to_string(),
        "hh" => format!("{hour12:02}"),
        "h" => hour12.to_string(),
        "mm" => format!("{:02}", now.minute()),
        "m" => now.minute().to_string(),
        "ss" => format!("{:02}", now.second()),
        "s" => now.second().to_string(),
        "SSS" => format!("{:03}", now.timestamp_subsec_millis().min(999)),
        "A" => (if now.hour() < 12 { "AM" } else { "PM" }).to_owned(),
        "a" => (if now.hour() < 12 { "am" } else { "pm" }).to_owned(),
        "X" => now.timestamp().to_string(),
        other => other.to_owned(),
    }
}
