use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::models::AttributeValue;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
const DATETIME_FORMATS: &[&str] =
    &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a calendar date from text, `None` when no known layout matches
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }

    DATE_FORMATS.iter().find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Date of an attribute; only textual values are considered
pub fn date_of(value: &AttributeValue) -> Option<NaiveDate> {
    value.as_str().and_then(parse_date)
}

/// Year of an attribute value, `None` when it is not a parseable date
pub fn year_of(value: &AttributeValue) -> Option<i32> {
    date_of(value).map(|d| d.year())
}
