//! Raw records as handed over by the input adapters, before cleaning.

use chrono::{NaiveDateTime, NaiveTime};
use geo::MultiPolygon;
use std::collections::BTreeMap;

use super::attribute::AttributeValue;
use super::geometry::Crs;

/// A spreadsheet cell as read
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    /// Time of day without a date (serial below one day)
    Time(NaiveTime),
}

/// A tabular input after the header offset has been applied
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell of a row, `Empty` for short rows
    pub fn cell<'a>(&self, row: &'a [Cell], index: usize) -> &'a Cell {
        const EMPTY: &Cell = &Cell::Empty;
        row.get(index).unwrap_or(EMPTY)
    }
}

/// A polygon feature in the layer's native CRS
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    /// Position of the feature in its source
    pub index: u64,
    pub geometry: MultiPolygon<f64>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// A polygon layer as read from its source
#[derive(Debug, Clone, PartialEq)]
pub struct RawLayer {
    pub name: String,
    pub crs: Crs,
    pub features: Vec<RawFeature>,
}
