use geo::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::attribute::AttributeValue;
use super::geometry::{BoundingBox, Crs};

/// Row identity of an observation within the concatenated input
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObservationId(pub u64);

/// A cleaned species observation located in the working CRS.
///
/// `fields` holds every whitelisted input column that was present, already
/// coerced: the numeric columns as numbers (or null), everything else as
/// text where a missing value is the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: ObservationId,

    /// Easting in map units
    pub x: f64,

    /// Northing in map units
    pub y: f64,

    /// Positional precision radius in meters
    pub accuracy: Option<f64>,

    pub quantity: Option<f64>,

    /// File name the row was read from
    pub source: String,

    pub fields: BTreeMap<String, AttributeValue>,
}

impl Observation {
    pub fn point(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }

    /// Text value of a column, empty when absent or not textual
    pub fn text(&self, column: &str) -> &str {
        self.fields.get(column).and_then(|v| v.as_str()).unwrap_or("")
    }

    pub fn field(&self, column: &str) -> Option<&AttributeValue> {
        self.fields.get(column)
    }
}

/// The full observation collection of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSet {
    pub crs: Crs,

    /// Whitelisted columns present in at least one input, in whitelist order
    pub columns: Vec<String>,

    pub observations: Vec<Observation>,
}

impl ObservationSet {
    pub fn new(crs: Crs, columns: Vec<String>, observations: Vec<Observation>) -> Self {
        Self { crs, columns, observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Total bounds of all observation points
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.observations.iter().map(Observation::point))
    }
}
