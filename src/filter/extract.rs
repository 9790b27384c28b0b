//! Spreadsheet decoding and column selection.

use super::{FilterError, FilterOptions};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;
use log::debug;
use std::io::Cursor;

/// Date column content before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateCell {
    /// Free text as the scraper left it
    Text(String),
    /// A cell the spreadsheet itself stores as a date
    Date(NaiveDate),
}

/// The two fields consumed from one data row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub code: Option<String>,
    pub date: Option<DateCell>,
}

impl RawRow {
    pub fn new(code: Option<&str>, date: Option<&str>) -> Self {
        Self {
            code: code.map(str::to_string),
            date: date.map(|text| DateCell::Text(text.to_string())),
        }
    }
}

/// Decode the first worksheet and pull the code and date columns out of it.
///
/// The first row of the sheet is the header; columns are matched by their
/// header text.
pub fn read_rows(bytes: &[u8], options: &FilterOptions) -> Result<Vec<RawRow>, FilterError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| FilterError::Decode(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| FilterError::Decode("workbook contains no worksheets".to_string()))?
        .map_err(|e| FilterError::Decode(e.to_string()))?;

    let mut rows = range.rows();
    let header = rows.next().unwrap_or(&[]);
    let code_idx = find_column(header, &options.code_column)?;
    let date_idx = find_column(header, &options.date_column)?;
    debug!(
        "Code column '{}' at index {}, date column '{}' at index {}",
        options.code_column, code_idx, options.date_column, date_idx
    );

    let raw_rows: Vec<RawRow> = rows
        .map(|row| RawRow {
            code: row.get(code_idx).and_then(cell_text),
            date: row.get(date_idx).and_then(date_cell),
        })
        .collect();

    debug!("Read {} data rows from worksheet", raw_rows.len());
    Ok(raw_rows)
}

fn find_column(header: &[Data], name: &str) -> Result<usize, FilterError> {
    header
        .iter()
        .position(|cell| cell_text(cell).as_deref() == Some(name.trim()))
        .ok_or_else(|| FilterError::MissingColumn(name.to_string()))
}

/// Render a cell as trimmed text, `None` for blank cells.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(_) | Data::Empty => String::new(),
    };
    (!text.is_empty()).then_some(text)
}

fn date_cell(cell: &Data) -> Option<DateCell> {
    match cell {
        Data::DateTime(dt) if dt.is_datetime() => dt.as_datetime().map(|d| DateCell::Date(d.date())),
        Data::DateTime(_) => None,
        other => cell_text(other).map(DateCell::Text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_cells_are_missing() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String("   ".to_string())), None);
        assert_eq!(cell_text(&Data::String(" X1 ".to_string())), Some("X1".to_string()));
    }

    #[test]
    fn whole_floats_render_as_integers() {
        assert_eq!(cell_text(&Data::Float(12345.0)), Some("12345".to_string()));
        assert_eq!(cell_text(&Data::Float(1.5)), Some("1.5".to_string()));
        assert_eq!(cell_text(&Data::Int(7)), Some("7".to_string()));
    }

    #[test]
    fn header_lookup_reports_missing_column() {
        let header = vec![Data::String("a".to_string()), Data::String("b".to_string())];
        assert_eq!(find_column(&header, "b"), Ok(1));
        assert_eq!(
            find_column(&header, "c"),
            Err(FilterError::MissingColumn("c".to_string()))
        );
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = read_rows(b"definitely not a workbook", &FilterOptions::default());
        assert!(matches!(result, Err(FilterError::Decode(_))), "got {:?}", result);
    }
}
