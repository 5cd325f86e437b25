//! Spatial predicates used by the matcher

use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::{Area, ConvexHull, Coord, Distance, Euclidean, Line, MultiPoint, MultiPolygon, Point, Rect};

/// Convex hull of the observation points.
///
/// The hull of one distinct point is that point and the hull of collinear
/// points is the segment between the extremes; both are kept as their own
/// variants so distances stay exact.
#[derive(Debug, Clone, PartialEq)]
pub enum StudyExtent {
    Point(Point<f64>),
    Line(Line<f64>),
    Polygon(geo::Polygon<f64>),
}

impl StudyExtent {
    /// Build the extent of `points`. `None` when there are no points.
    pub fn from_points(points: &[Point<f64>]) -> Option<Self> {
        let first = *points.first()?;

        if points.iter().all(|p| p.0 == first.0) {
            return Some(StudyExtent::Point(first));
        }

        let hull = MultiPoint::from(points.to_vec()).convex_hull();
        if hull.unsigned_area() > 0.0 {
            return Some(StudyExtent::Polygon(hull));
        }

        // All points collinear: lexicographic extremes are the segment ends
        let lexicographic = |a: &&Point<f64>, b: &&Point<f64>| {
            a.x().total_cmp(&b.x()).then(a.y().total_cmp(&b.y()))
        };
        let start = points.iter().min_by(lexicographic)?;
        let end = points.iter().max_by(lexicographic)?;
        Some(StudyExtent::Line(Line::new(start.0, end.0)))
    }

    /// Smallest Euclidean distance to any member polygon of `area`
    pub fn distance_to(&self, area: &MultiPolygon<f64>) -> f64 {
        area.iter()
            .map(|polygon| match self {
                StudyExtent::Point(p) => Euclidean.distance(p, polygon),
                StudyExtent::Line(l) => Euclidean.distance(l, polygon),
                StudyExtent::Polygon(hull) => Euclidean.distance(hull, polygon),
            })
            .fold(f64::INFINITY, f64::min)
    }

    /// Whether `area` touches the extent grown by `distance`
    pub fn within_distance(&self, area: &MultiPolygon<f64>, distance: f64) -> bool {
        self.distance_to(area) <= distance
    }

    pub fn bounding_rect(&self) -> Rect<f64> {
        match self {
            StudyExtent::Point(p) => Rect::new(p.0, p.0),
            StudyExtent::Line(l) => l.bounding_rect(),
            StudyExtent::Polygon(hull) => {
                hull.bounding_rect().unwrap_or_else(|| Rect::new(Coord::zero(), Coord::zero()))
            }
        }
    }
}

/// Whether `point` lies strictly within `area`; boundary points do not count
pub fn point_inside(point: &Point<f64>, area: &MultiPolygon<f64>) -> bool {
    area.contains(point)
}

/// Euclidean distance from `point` to the nearest member polygon of `area`,
/// zero when the point is inside or on the boundary
pub fn point_distance(point: &Point<f64>, area: &MultiPolygon<f64>) -> f64 {
    area.iter().map(|polygon| Euclidean.distance(point, polygon)).fold(f64::INFINITY, f64::min)
}

/// Whether the disc of radius `distance` around `point` touches `area`
pub fn point_within_distance(point: &Point<f64>, area: &MultiPolygon<f64>, distance: f64) -> bool {
    point_distance(point, area) <= distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(min_x: f64, min_y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: min_x, y: min_y),
            (x: min_x + size, y: min_y),
            (x: min_x + size, y: min_y + size),
            (x: min_x, y: min_y + size),
            (x: min_x, y: min_y),
        ]])
    }

    #[test]
    fn test_point_inside_excludes_boundary() {
        let area = square(0.0, 0.0, 100.0);
        assert!(point_inside(&Point::new(50.0, 50.0), &area));
        assert!(!point_inside(&Point::new(100.0, 50.0), &area));
        assert!(!point_inside(&Point::new(130.0, 50.0), &area));
    }

    #[test]
    fn test_point_inside_hole_is_outside() {
        let with_hole = MultiPolygon::new(vec![polygon!(
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 100.0, y: 0.0),
                (x: 100.0, y: 100.0),
                (x: 0.0, y: 100.0),
                (x: 0.0, y: 0.0),
            ],
            interiors: [[
                (x: 40.0, y: 40.0),
                (x: 60.0, y: 40.0),
                (x: 60.0, y: 60.0),
                (x: 40.0, y: 60.0),
                (x: 40.0, y: 40.0),
            ]],
        )]);
        let center = Point::new(50.0, 50.0);
        assert!(!point_inside(&center, &with_hole));
        assert!((point_distance(&center, &with_hole) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_within_distance_is_inclusive() {
        let area = square(0.0, 0.0, 100.0);
        assert!(point_within_distance(&Point::new(150.0, 50.0), &area, 50.0));
        assert!(!point_within_distance(&Point::new(150.1, 50.0), &area, 50.0));
        // Corner distance is Euclidean, not per-axis
        assert!(!point_within_distance(&Point::new(140.0, 140.0), &area, 50.0));
    }

    #[test]
    fn test_point_distance_uses_nearest_member() {
        let mut area = square(0.0, 0.0, 10.0);
        area.0.extend(square(100.0, 0.0, 10.0).0);
        assert!((point_distance(&Point::new(95.0, 5.0), &area) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_extent_single_point() {
        let points = vec![Point::new(5.0, 5.0), Point::new(5.0, 5.0)];
        let extent = StudyExtent::from_points(&points).unwrap();
        assert_eq!(extent, StudyExtent::Point(Point::new(5.0, 5.0)));
        assert!((extent.distance_to(&square(10.0, 0.0, 10.0)) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_extent_collinear_points() {
        let points = vec![Point::new(5.0, 0.0), Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let extent = StudyExtent::from_points(&points).unwrap();
        assert_eq!(
            extent,
            StudyExtent::Line(Line::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 0.0 }))
        );
        assert!(extent.within_distance(&square(0.0, 20.0, 5.0), 20.0));
        assert!(!extent.within_distance(&square(0.0, 20.0, 5.0), 19.0));
    }

    #[test]
    fn test_extent_polygon_hull() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(50.0, 100.0),
            Point::new(50.0, 20.0),
        ];
        let extent = StudyExtent::from_points(&points).unwrap();
        assert!(matches!(extent, StudyExtent::Polygon(_)));

        // Overlapping the hull
        assert_eq!(extent.distance_to(&square(40.0, 40.0, 5.0)), 0.0);
        // 30 units below the hull's bottom edge
        assert!(extent.within_distance(&square(40.0, -40.0, 10.0), 30.0));
        assert!(!extent.within_distance(&square(40.0, -40.0, 10.0), 29.0));
    }

    #[test]
    fn test_extent_empty() {
        assert!(StudyExtent::from_points(&[]).is_none());
    }

    #[test]
    fn test_empty_area_is_infinitely_far() {
        let area = MultiPolygon::<f64>::new(vec![]);
        assert!(!point_within_distance(&Point::new(0.0, 0.0), &area, 1e9));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn extent_is_never_farther_than_its_points(
                coords in prop::collection::vec((-500.0..500.0f64, -500.0..500.0f64), 1..20),
            ) {
                let points: Vec<Point<f64>> = coords.iter().map(|&(x, y)| Point::new(x, y)).collect();
                let extent = StudyExtent::from_points(&points).unwrap();
                let area = square(600.0, 600.0, 50.0);

                let extent_distance = extent.distance_to(&area);
                for point in &points {
                    prop_assert!(extent_distance <= point_distance(point, &area) + 1e-6);
                }
            }
        }
    }
}
