//! Day windows that rows are filtered against.
//
// Both kinds resolve to an inclusive `[start, end]` pair of calendar dates
// relative to "today".

use super::FilterError;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive date range expressed relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterWindow {
    /// `[today, today + days]`
    Relative { days: i64 },
    /// `[today + start_day, today + end_day]`
    Offset { start_day: i64, end_day: i64 },
}

impl FilterWindow {
    pub fn relative(days: i64) -> Result<Self, FilterError> {
        Self::from_params(Some(days), None, None)
    }

    pub fn offset(start_day: i64, end_day: i64) -> Result<Self, FilterError> {
        Self::from_params(None, Some(start_day), Some(end_day))
    }

    /// Build a window from the loose parameters a command receives.
    ///
    /// Exactly one form must be supplied: `days` alone, or both `start_day`
    /// and `end_day`. A lone offset counts as no window at all.
    pub fn from_params(
        days: Option<i64>,
        start_day: Option<i64>,
        end_day: Option<i64>,
    ) -> Result<Self, FilterError> {
        match (days, start_day, end_day) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(FilterError::InvalidWindow(
                "`days` cannot be combined with `start_day`/`end_day`".to_string(),
            )),
            (Some(days), None, None) if days < 0 => Err(FilterError::InvalidWindow(format!(
                "`days` must not be negative, got {}",
                days
            ))),
            (Some(days), None, None) => Ok(FilterWindow::Relative { days }),
            (None, Some(start_day), Some(end_day)) if start_day > end_day => {
                Err(FilterError::InvalidWindow(format!(
                    "`start_day` ({}) must not be greater than `end_day` ({})",
                    start_day, end_day
                )))
            }
            (None, Some(start_day), Some(end_day)) => {
                Ok(FilterWindow::Offset { start_day, end_day })
            }
            (None, _, _) => Err(FilterError::InvalidWindow(
                "either `days` or both `start_day` and `end_day` must be given".to_string(),
            )),
        }
    }

    /// Resolve the window into inclusive calendar bounds.
    ///
    /// Offsets that run past the representable calendar saturate at
    /// `NaiveDate::MIN` / `NaiveDate::MAX`.
    pub fn bounds(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match *self {
            FilterWindow::Relative { days } => (today, shift_saturating(today, days)),
            FilterWindow::Offset { start_day, end_day } => {
                (shift_saturating(today, start_day), shift_saturating(today, end_day))
            }
        }
    }

    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        let (start, end) = self.bounds(today);
        start <= date && date <= end
    }
}

impl fmt::Display for FilterWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterWindow::Relative { days } => write!(f, "next {} days", days),
            FilterWindow::Offset { start_day, end_day } => {
                write!(f, "day {} to day {}", start_day, end_day)
            }
        }
    }
}

fn shift_saturating(today: NaiveDate, offset: i64) -> NaiveDate {
    if offset >= 0 {
        today.checked_add_days(Days::new(offset.unsigned_abs())).unwrap_or(NaiveDate::MAX)
    } else {
        today.checked_sub_days(Days::new(offset.unsigned_abs())).unwrap_or(NaiveDate::MIN)
    }
}
