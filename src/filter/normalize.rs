//! Free-text cleanup for scraped call dates.
//!
//! The upstream table scraper leaves labels, placeholder tokens and ragged
//! whitespace in the date column, and occasionally repeats the table header
//! as a data row. Everything here is case-sensitive on purpose: the tokens are
//! produced verbatim by the scraper.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Code cell value that marks a leaked header row
pub const CODE_SENTINEL: &str = "Security Description";
/// Date cell value that marks a leaked header row
pub const DATE_SENTINEL: &str = "Call Date";

const DATE_LABEL: &str = "Call Date:";
const PLACEHOLDER_TOKENS: [&str; 2] = ["n.a.", "None"];

// Month-first shapes come before their day-first twins; the day-first forms
// only match when the leading number cannot be a month.
const DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%m/%d/%y",
    "%d/%m/%Y",
    "%d/%m/%y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%d %b %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
];

static TIME_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<date>.+?)[T ](?P<time>\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?)$")
        .expect("time suffix pattern is valid")
});

/// True when the row is a copy of the scraped table's header.
pub fn is_header_leak(code: &str, date_text: &str) -> bool {
    code == CODE_SENTINEL || date_text == DATE_SENTINEL
}

/// Strip the `Call Date:` label, collapse whitespace and drop placeholder tokens.
///
/// Applying this to its own output returns the same string.
pub fn normalize_date_text(raw: &str) -> String {
    let unlabeled = raw.replace(DATE_LABEL, "");
    let mut text = unlabeled.split_whitespace().collect::<Vec<_>>().join(" ");
    for token in PLACEHOLDER_TOKENS {
        text = text.replace(token, "").trim().to_string();
    }
    text
}

/// Parse normalized date text into a calendar date.
///
/// A trailing time of day is accepted and discarded. Returns `None` for
/// anything that is not a recognizable date with a four-digit year.
pub fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }

    let date_part = TIME_SUFFIX
        .captures(text)
        .and_then(|caps| caps.name("date"))
        .map_or(text, |m| m.as_str());

    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(date_part, format)
            .ok()
            .filter(|date| (1000..=9999).contains(&date.year()))
    })
}
