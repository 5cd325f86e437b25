use crate::models::{AttributeValue, Cell};

/// Numeric interpretation of a cell; text is parsed after trimming
pub fn to_number(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => s.trim().parse::<f64>().ok(),
        Cell::Bool(_) | Cell::DateTime(_) | Cell::Time(_) | Cell::Empty => None,
    };
    value.filter(|v| v.is_finite())
}

/// Attribute value for a non-numeric column.
///
/// Missing cells become the empty string so a column never mixes text and
/// null. Spreadsheet dates become ISO text, without the time part at midnight. Times of day stay times.
pub fn to_text_value(cell: &Cell) -> AttributeValue {
    match cell {
        Cell::Empty => AttributeValue::Text(String::new()),
        Cell::Text(s) => AttributeValue::Text(s.clone()),
        Cell::Number(n) => AttributeValue::Number(*n),
        Cell::Bool(b) => AttributeValue::Bool(*b),
        Cell::DateTime(dt) => {
            if dt.time() == chrono::NaiveTime::MIN {
                AttributeValue::Text(dt.format("%Y-%m-%d").to_string())
            } else {
                AttributeValue::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string())
            }
        }
        Cell::Time(t) => AttributeValue::Text(t.format("%H:%M:%S").to_string()),
    }
}

/// Attribute value for a column coerced to numeric
pub fn to_number_value(cell: &Cell) -> AttributeValue {
    to_number(cell).map(AttributeValue::Number).unwrap_or(AttributeValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&Cell::Number(12.5)), Some(12.5));
        assert_eq!(to_number(&Cell::Text(" 42 ".into())), Some(42.0));
        assert_eq!(to_number(&Cell::Text("noterad".into())), None);
        assert_eq!(to_number(&Cell::Text("NaN".into())), None);
        assert_eq!(to_number(&Cell::Empty), None);
    }

    #[test]
    fn test_to_text_value() {
        assert_eq!(to_text_value(&Cell::Empty), AttributeValue::Text(String::new()));
        assert_eq!(to_text_value(&Cell::Text("Län".into())), AttributeValue::Text("Län".into()));

        let midnight = NaiveDate::from_ymd_opt(2021, 5, 3).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(to_text_value(&Cell::DateTime(midnight)), AttributeValue::Text("2021-05-03".into()));

        let morning = NaiveDate::from_ymd_opt(2021, 5, 3).unwrap().and_hms_opt(7, 30, 0).unwrap();
        assert_eq!(
            to_text_value(&Cell::DateTime(morning)),
            AttributeValue::Text("2021-05-03 07:30:00".into())
        );

        let start_time = chrono::NaiveTime::from_hms_opt(7, 30, 0).unwrap();
        assert_eq!(to_text_value(&Cell::Time(start_time)), AttributeValue::Text("07:30:00".into()));
        assert_eq!(to_number(&Cell::Time(start_time)), None);
    }

    #[test]
    fn test_to_number_value() {
        assert_eq!(to_number_value(&Cell::Text("x".into())), AttributeValue::Null);
        assert_eq!(to_number_value(&Cell::Number(3.0)), AttributeValue::Number(3.0));
    }
}
