use chrono::NaiveDate;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::attribute::AttributeValue;
use super::geometry::Crs;

/// Logging layer type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Completed fellings, dated by completion
    Executed,
    /// Felling notifications, dated by submission
    Reported,
}

impl LayerKind {
    pub const ALL: [LayerKind; 2] = [LayerKind::Executed, LayerKind::Reported];

    /// Identifier used in cache names and export sheet names
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Executed => "executed",
            LayerKind::Reported => "reported",
        }
    }

    /// Heading used in the textual report
    pub fn label(&self) -> &'static str {
        match self {
            LayerKind::Executed => "EXECUTED FELLINGS",
            LayerKind::Reported => "REPORTED FELLINGS",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "executed" => Ok(LayerKind::Executed),
            "reported" => Ok(LayerKind::Reported),
            other => Err(format!("unknown layer type '{}', expected executed or reported", other)),
        }
    }
}

/// Feature identity of an area within its source layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AreaId(pub u64);

/// A logging polygon in the working CRS
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingArea {
    pub id: AreaId,
    pub kind: LayerKind,

    /// Parsed value of the layer's date column
    pub date: Option<NaiveDate>,

    pub geometry: MultiPolygon<f64>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// One loaded and filtered logging layer
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingLayer {
    pub kind: LayerKind,
    pub crs: Crs,

    /// Attribute the year filter and date range read from
    pub date_column: String,

    pub areas: Vec<LoggingArea>,
}

impl LoggingLayer {
    pub fn new(kind: LayerKind, crs: Crs, date_column: impl Into<String>) -> Self {
        Self { kind, crs, date_column: date_column.into(), areas: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Earliest and latest year among the areas' dates
    pub fn year_range(&self) -> Option<(i32, i32)> {
        use chrono::Datelike;

        self.areas.iter().filter_map(|a| a.date).map(|d| d.year()).fold(None, |acc, y| {
            Some(match acc {
                None => (y, y),
                Some((lo, hi)) => (lo.min(y), hi.max(y)),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(id: u64, date: Option<&str>) -> LoggingArea {
        LoggingArea {
            id: AreaId(id),
            kind: LayerKind::Executed,
            date: date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            geometry: MultiPolygon::new(vec![]),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_layer_kind_parse() {
        assert_eq!("Executed".parse::<LayerKind>().unwrap(), LayerKind::Executed);
        assert_eq!("reported".parse::<LayerKind>().unwrap(), LayerKind::Reported);
        assert!("planned".parse::<LayerKind>().is_err());
    }

    #[test]
    fn test_year_range() {
        let mut layer = LoggingLayer::new(LayerKind::Executed, Crs::sweref99_tm(), "Avvdatum");
        assert_eq!(layer.year_range(), None);

        layer.areas = vec![area(0, Some("2019-03-01")), area(1, None), area(2, Some("2023-11-30"))];
        assert_eq!(layer.year_range(), Some((2019, 2023)));
    }
}
