//! CRS transformation between a layer's native CRS and the working CRS

use fellwatch_core::error::{FellwatchError, Result};
use fellwatch_core::models::{BoundingBox, Crs};
use geo::{Coord, MapCoords, MultiPolygon, Point};
use proj::Proj;

/// Check if two CRS are the same
pub fn crs_match(crs1: &Crs, crs2: &Crs) -> bool {
    crs1.same_as(crs2)
}

/// Coordinate transformation from one CRS to another.
///
/// Holds no projection when both CRSs match, in which case every
/// conversion is the identity.
pub struct Reprojector {
    from: Crs,
    to: Crs,
    proj: Option<Proj>,
}

impl Reprojector {
    pub fn new(from: &Crs, to: &Crs) -> Result<Self> {
        let proj = if crs_match(from, to) {
            None
        } else {
            let proj = Proj::new_known_crs(&from.identifier(), &to.identifier(), None)
                .map_err(|e| FellwatchError::Projection {
                    from: from.identifier(),
                    to: to.identifier(),
                    reason: e.to_string(),
                })?;
            Some(proj)
        };

        Ok(Self { from: from.clone(), to: to.clone(), proj })
    }

    pub fn is_identity(&self) -> bool {
        self.proj.is_none()
    }

    pub fn source(&self) -> &Crs {
        &self.from
    }

    pub fn target(&self) -> &Crs {
        &self.to
    }

    fn convert(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let Some(proj) = &self.proj else {
            return Ok(coord);
        };

        let (x, y) = proj.convert((coord.x, coord.y)).map_err(|e| FellwatchError::Projection {
            from: self.from.identifier(),
            to: self.to.identifier(),
            reason: e.to_string(),
        })?;

        if !x.is_finite() || !y.is_finite() {
            return Err(FellwatchError::Projection {
                from: self.from.identifier(),
                to: self.to.identifier(),
                reason: format!("({}, {}) has no finite image", coord.x, coord.y),
            });
        }

        Ok(Coord { x, y })
    }

    pub fn point(&self, point: &Point<f64>) -> Result<Point<f64>> {
        self.convert(point.0).map(Point::from)
    }

    pub fn multipolygon(&self, geometry: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        if self.is_identity() {
            return Ok(geometry.clone());
        }
        geometry.try_map_coords(|coord| self.convert(coord))
    }

    /// Envelope of the transformed corners of `bbox`
    pub fn bbox(&self, bbox: &BoundingBox) -> Result<BoundingBox> {
        if self.is_identity() {
            return Ok(*bbox);
        }

        let corners = bbox
            .corners()
            .iter()
            .map(|corner| self.point(corner))
            .collect::<Result<Vec<_>>>()?;

        BoundingBox::from_points(corners).ok_or_else(|| FellwatchError::Projection {
            from: self.from.identifier(),
            to: self.to.identifier(),
            reason: "empty bounding box".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_identity_when_crs_match() {
        let reprojector = Reprojector::new(&Crs::sweref99_tm(), &Crs::from_epsg(3006)).unwrap();
        assert!(reprojector.is_identity());

        let area = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]]);
        assert_eq!(reprojector.multipolygon(&area).unwrap(), area);

        let bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(reprojector.bbox(&bbox).unwrap(), bbox);
    }

    #[test]
    fn test_wgs84_to_sweref99() {
        let reprojector = Reprojector::new(&Crs::wgs84(), &Crs::sweref99_tm()).unwrap();
        assert!(!reprojector.is_identity());

        // Longitude first: 18°E 59°N lies in central Sweden
        let projected = reprojector.point(&Point::new(18.0, 59.0)).unwrap();
        assert!(projected.x() > 600_000.0 && projected.x() < 700_000.0);
        assert!(projected.y() > 6_500_000.0 && projected.y() < 6_600_000.0);

        let back = Reprojector::new(&Crs::sweref99_tm(), &Crs::wgs84()).unwrap();
        let round_trip = back.point(&projected).unwrap();
        assert!((round_trip.x() - 18.0).abs() < 1e-6);
        assert!((round_trip.y() - 59.0).abs() < 1e-6);
    }

    #[test]
    fn test_bbox_covers_transformed_corners() {
        let reprojector = Reprojector::new(&Crs::sweref99_tm(), &Crs::wgs84()).unwrap();
        let bbox = BoundingBox::new(600_000.0, 6_500_000.0, 700_000.0, 6_600_000.0);
        let transformed = reprojector.bbox(&bbox).unwrap();

        for corner in bbox.corners() {
            let p = reprojector.point(&corner).unwrap();
            assert!(p.x() >= transformed.min_x && p.x() <= transformed.max_x);
            assert!(p.y() >= transformed.min_y && p.y() <= transformed.max_y);
        }
    }

    #[test]
    fn test_unknown_crs_fails() {
        let result = Reprojector::new(&Crs::from_epsg(999_999), &Crs::sweref99_tm());
        assert!(matches!(result, Err(FellwatchError::Projection { .. })));
    }
}
