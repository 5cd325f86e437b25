//! Spreadsheet reader for observation exports

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::path::Path;

use fellwatch_core::error::{FellwatchError, Result};
use fellwatch_core::models::{Cell, RawTable};
use fellwatch_core::ports::TableReader;
use fellwatch_core::processing::parse_date;

/// Reads the first worksheet of an Excel workbook
pub struct XlsxTableReader;

impl TableReader for XlsxTableReader {
    fn read_table(&self, path: &Path, header_offset: usize) -> Result<RawTable> {
        let mut workbook = open_workbook_auto(path).map_err(|e| format_error(format!(
            "Failed to open {}: {}",
            path.display(),
            e
        )))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| format_error(format!("{} has no worksheets", path.display())))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| format_error(format!("Failed to read sheet '{}': {}", sheet_name, e)))?;

        // Row and column offsets of the used range within the sheet
        let (start_row, start_col) = range
            .start()
            .map(|(row, col)| (row as usize, col as usize))
            .unwrap_or((0, 0));

        let mut rows = range.rows();

        if start_row > header_offset {
            return Err(format_error(format!(
                "Header row {} of {} is empty",
                header_offset + 1,
                path.display()
            )));
        }
        let header = rows.nth(header_offset - start_row).ok_or_else(|| {
            format_error(format!("{} has fewer than {} rows", path.display(), header_offset + 1))
        })?;

        let columns = (0..start_col)
            .map(unnamed)
            .chain(header.iter().enumerate().map(|(i, cell)| header_name(cell, start_col + i)))
            .collect::<Vec<_>>();

        let rows = rows
            .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
            .map(|row| {
                std::iter::repeat(Cell::Empty)
                    .take(start_col)
                    .chain(row.iter().map(convert_cell))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            path = %path.display(),
            sheet = %sheet_name,
            columns = columns.len(),
            rows = rows.len(),
            "Read worksheet"
        );

        Ok(RawTable::new(columns, rows))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["xlsx"]
    }
}

fn format_error(message: String) -> FellwatchError {
    FellwatchError::Format { format: "Excel".to_string(), message }
}

fn unnamed(index: usize) -> String {
    format!("Unnamed: {}", index)
}

fn header_name(cell: &Data, index: usize) -> String {
    let name = match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    };
    if name.is_empty() {
        unnamed(index)
    } else {
        name
    }
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            if (0.0..1.0).contains(&serial) {
                excel_serial_to_time(serial).map(Cell::Time).unwrap_or(Cell::Empty)
            } else {
                excel_serial_to_datetime(serial).map(Cell::DateTime).unwrap_or(Cell::Empty)
            }
        }
        Data::DateTimeIso(s) => match parse_date(s) {
            Some(date) => date.and_hms_opt(0, 0, 0).map(Cell::DateTime).unwrap_or(Cell::Empty),
            None => Cell::Text(s.clone()),
        },
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Excel serial day number to a timestamp, using the 1900 date system
pub(crate) fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let millis = ((serial - serial.trunc()) * 86_400_000.0).round() as i64;

    epoch
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::milliseconds(millis))
}

/// Fraction of a day to a time of day, for cells holding only a time
pub(crate) fn excel_serial_to_time(serial: f64) -> Option<NaiveTime> {
    if !(0.0..1.0).contains(&serial) {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    // 0.99999999 rounds up to a full day
    let millis = millis.min(86_399_999);
    Some(NaiveTime::MIN.overflowing_add_signed(Duration::milliseconds(millis)).0)
}
