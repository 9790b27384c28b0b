//! Page state for a filtered result shown in chat.
//
// Lines are rendered once up front; navigation only moves the page index and
// wraps around at either end.

use crate::filter::FilteredRow;
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    pages: Vec<Vec<String>>,
    page: usize,
    row_count: usize,
}

/// Snapshot of the page currently on screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    /// Zero-based page index
    pub page: usize,
    pub pages: usize,
    pub rows: usize,
    pub content: String,
}

impl Paginator {
    /// Returns `None` for an empty result; there is nothing to page through.
    pub fn new(rows: &[FilteredRow], page_size: usize) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let page_size = page_size.max(1);
        let lines: Vec<String> =
            rows.iter().enumerate().map(|(i, row)| format!("{}. {}", i + 1, row)).collect();
        let pages = lines.chunks(page_size).map(<[String]>::to_vec).collect();
        Some(Self { pages, page: 0, row_count: rows.len() })
    }

    pub fn page_index(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn page_content(&self) -> String {
        self.pages.get(self.page).map(|lines| lines.join("\n")).unwrap_or_default()
    }

    pub fn next(&mut self) {
        self.page = (self.page + 1) % self.page_count();
    }

    pub fn previous(&mut self) {
        self.page = self.page.checked_sub(1).unwrap_or(self.page_count() - 1);
    }

    pub fn view(&self) -> PageView {
        PageView {
            page: self.page,
            pages: self.page_count(),
            rows: self.row_count,
            content: self.page_content(),
        }
    }

    /// Every page joined together, for one-shot output.
    pub fn full_listing(&self) -> String {
        self.pages.iter().map(|lines| lines.join("\n")).collect::<Vec<_>>().join("\n")
    }
}
