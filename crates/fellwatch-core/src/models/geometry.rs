//! Coordinate reference systems and planar extents.

use geo::{coord, Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::sweref99_tm()
    }
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(4326, "WGS 84")
    }

    /// SWEREF99 TM (EPSG:3006), the Swedish national grid
    pub fn sweref99_tm() -> Self {
        Self::new(3006, "SWEREF99 TM")
    }

    /// Build from a bare EPSG code, naming the well-known ones
    pub fn from_epsg(epsg: u32) -> Self {
        match epsg {
            4326 => Self::wgs84(),
            3006 => Self::sweref99_tm(),
            other => Self::new(other, format!("EPSG:{}", other)),
        }
    }

    /// Parse identifiers such as `EPSG:3006` or `urn:ogc:def:crs:EPSG::3006`
    pub fn parse(identifier: &str) -> Option<Self> {
        let code = identifier.rsplit(':').next()?.trim();
        code.parse::<u32>().ok().map(Self::from_epsg)
    }

    /// `EPSG:<code>` form used in cache metadata and projection setup
    pub fn identifier(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }

    pub fn same_as(&self, other: &Crs) -> bool {
        self.epsg == other.epsg
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{} ({})", self.epsg, self.name)
    }
}

/// Axis-aligned extent in map units, `(minx, miny, maxx, maxy)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Total bounds of a set of points. `None` for an empty set.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point<f64>>,
    {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self::new(p.x(), p.y(), p.x(), p.y()),
                Some(b) => Self::new(
                    b.min_x.min(p.x()),
                    b.min_y.min(p.y()),
                    b.max_x.max(p.x()),
                    b.max_y.max(p.y()),
                ),
            })
        })
    }

    pub fn from_rect(rect: Rect<f64>) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(coord! { x: self.min_x, y: self.min_y }, coord! { x: self.max_x, y: self.max_y })
    }

    /// Grown by `margin` on every side
    pub fn expand(&self, margin: f64) -> Self {
        Self::new(self.min_x - margin, self.min_y - margin, self.max_x + margin, self.max_y + margin)
    }

    /// Closed-interval overlap test, touching edges count as intersecting
    pub fn intersects_rect(&self, rect: &Rect<f64>) -> bool {
        self.min_x <= rect.max().x
            && self.max_x >= rect.min().x
            && self.min_y <= rect.max().y
            && self.max_y >= rect.min().y
    }

    /// The four corners, counter-clockwise from the minimum
    pub fn corners(&self) -> [Point<f64>; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}
