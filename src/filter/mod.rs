//! Row extraction and date-window filtering for uploaded spreadsheets.
//!
//! The pipeline is: decode the first worksheet, select the code and date
//! columns, drop blank and header-leak rows, normalize the free-text dates,
//! parse them, keep the rows inside the window and sort.
//
// # Examples
//
// ```
// let window = FilterWindow::relative(30)?;
// let rows = filter_rows(&bytes, &window, &FilterOptions::default())?;
// ```

use chrono::{Local, NaiveDate};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod extract;
pub mod normalize;
pub mod window;

pub use extract::{DateCell, RawRow};
pub use window::FilterWindow;

/// Header the table scraper gives the security description column
pub const DEFAULT_CODE_COLUMN: &str = "tablescraper-selected-row 3";
/// Header the table scraper gives the call date column
pub const DEFAULT_DATE_COLUMN: &str = "tablescraper-selected-row 10";

/// Errors raised while turning an upload into filtered rows
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid day window: {0}")]
    InvalidWindow(String),
    #[error("Could not read spreadsheet: {0}")]
    Decode(String),
    #[error("Spreadsheet is missing the '{0}' column")]
    MissingColumn(String),
}

/// A validated `(code, date)` pair inside the active window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredRow {
    pub code: String,
    pub date: NaiveDate,
}

impl FilteredRow {
    pub fn new(code: impl Into<String>, date: NaiveDate) -> Self {
        Self { code: code.into(), date }
    }
}

impl fmt::Display for FilteredRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.date.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Code,
    Date,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "code" => Ok(SortKey::Code),
            "date" => Ok(SortKey::Date),
            other => Err(format!("Unknown sort key '{}', expected 'code' or 'date'", other)),
        }
    }
}

/// Which columns to read and how to order the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub code_column: String,
    pub date_column: String,
    pub sort_key: SortKey,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            code_column: DEFAULT_CODE_COLUMN.to_string(),
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            sort_key: SortKey::default(),
        }
    }
}

/// Filter an uploaded spreadsheet against a window anchored at today's local date.
pub fn filter_rows(
    bytes: &[u8],
    window: &FilterWindow,
    options: &FilterOptions,
) -> Result<Vec<FilteredRow>, FilterError> {
    filter_rows_on(bytes, window, options, Local::now().date_naive())
}

/// Same as [`filter_rows`] with an explicit "today".
pub fn filter_rows_on(
    bytes: &[u8],
    window: &FilterWindow,
    options: &FilterOptions,
    today: NaiveDate,
) -> Result<Vec<FilteredRow>, FilterError> {
    let raw_rows = extract::read_rows(bytes, options)?;
    let rows = select_rows(raw_rows, window, options.sort_key, today);
    info!("Kept {} rows for window '{}' anchored at {}", rows.len(), window, today);
    Ok(rows)
}

/// Normalize, validate, window and sort already extracted rows.
///
/// Rows with blank fields, header leaks or unparseable dates are dropped
/// without error.
pub fn select_rows(
    raw_rows: Vec<RawRow>,
    window: &FilterWindow,
    sort_key: SortKey,
    today: NaiveDate,
) -> Vec<FilteredRow> {
    let total = raw_rows.len();
    let mut unparseable = 0usize;

    let mut rows: Vec<FilteredRow> = raw_rows
        .into_iter()
        .filter_map(|raw| {
            let code = raw.code.filter(|c| !c.trim().is_empty())?;
            let date = match raw.date? {
                DateCell::Date(date) => {
                    if normalize::is_header_leak(&code, "") {
                        return None;
                    }
                    date
                }
                DateCell::Text(text) => {
                    if text.trim().is_empty() || normalize::is_header_leak(&code, &text) {
                        return None;
                    }
                    let normalized = normalize::normalize_date_text(&text);
                    match normalize::parse_calendar_date(&normalized) {
                        Some(date) => date,
                        None => {
                            debug!("Skipping row '{}': unparseable date '{}'", code, text);
                            unparseable += 1;
                            return None;
                        }
                    }
                }
            };
            Some(FilteredRow { code, date })
        })
        .filter(|row| window.contains(row.date, today))
        .collect();

    match sort_key {
        SortKey::Code => rows.sort_by(|a, b| a.code.cmp(&b.code)),
        SortKey::Date => rows.sort_by(|a, b| a.date.cmp(&b.date)),
    }

    debug!(
        "Selected {} of {} rows ({} with unparseable dates)",
        rows.len(),
        total,
        unparseable
    );
    rows
}
