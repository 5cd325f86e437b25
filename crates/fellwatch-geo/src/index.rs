use geo::algorithm::bounding_rect::BoundingRect;
use geo::{MultiPolygon, Point, Rect};
use rstar::{RTree, RTreeObject, AABB};

/// Envelope of one area, pointing back at its position in the layer
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedArea {
    /// Position of the area in the slice the index was built from
    pub position: usize,

    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedArea {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over area envelopes.
///
/// Queries return candidates only; callers apply the exact predicate.
pub struct AreaIndex {
    tree: RTree<IndexedArea>,
}

impl AreaIndex {
    /// Index the given geometries by position. Empty geometries are left out.
    pub fn build<'a, I>(geometries: I) -> Self
    where
        I: IntoIterator<Item = &'a MultiPolygon<f64>>,
    {
        let indexed: Vec<IndexedArea> = geometries
            .into_iter()
            .enumerate()
            .filter_map(|(position, geometry)| {
                geometry.bounding_rect().map(|rect| IndexedArea {
                    position,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        Self { tree: RTree::bulk_load(indexed) }
    }

    /// Positions whose envelope comes within `distance` of `point`, ascending
    pub fn candidates_near(&self, point: &Point<f64>, distance: f64) -> Vec<usize> {
        self.query([point.x() - distance, point.y() - distance], [
            point.x() + distance,
            point.y() + distance,
        ])
    }

    /// Positions whose envelope comes within `distance` of `rect`, ascending
    pub fn candidates_in_rect(&self, rect: &Rect<f64>, distance: f64) -> Vec<usize> {
        self.query([rect.min().x - distance, rect.min().y - distance], [
            rect.max().x + distance,
            rect.max().y + distance,
        ])
    }

    fn query(&self, min: [f64; 2], max: [f64; 2]) -> Vec<usize> {
        let bbox = AABB::from_corners(min, max);
        let mut positions: Vec<usize> =
            self.tree.locate_in_envelope_intersecting(&bbox).map(|a| a.position).collect();
        positions.sort_unstable();
        positions
    }

    /// Get the total number of indexed areas
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
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
    fn test_candidates_near() {
        let areas = vec![square(0.0, 0.0, 10.0), square(100.0, 100.0, 10.0), square(20.0, 0.0, 10.0)];
        let index = AreaIndex::build(&areas);

        assert_eq!(index.len(), 3);
        assert_eq!(index.candidates_near(&Point::new(15.0, 5.0), 5.0), vec![0, 2]);
        assert_eq!(index.candidates_near(&Point::new(15.0, 5.0), 4.0), Vec::<usize>::new());
        assert_eq!(index.candidates_near(&Point::new(105.0, 105.0), 0.0), vec![1]);
    }

    #[test]
    fn test_candidates_in_rect() {
        let areas = vec![square(0.0, 0.0, 10.0), square(100.0, 100.0, 10.0)];
        let index = AreaIndex::build(&areas);
        let rect = Rect::new(geo::coord! { x: 40.0, y: 40.0 }, geo::coord! { x: 60.0, y: 60.0 });

        assert!(index.candidates_in_rect(&rect, 10.0).is_empty());
        assert_eq!(index.candidates_in_rect(&rect, 40.0), vec![0, 1]);
    }

    #[test]
    fn test_empty_geometry_not_indexed() {
        let areas = vec![MultiPolygon::new(vec![]), square(0.0, 0.0, 1.0)];
        let index = AreaIndex::build(&areas);
        assert_eq!(index.len(), 1);
        assert_eq!(index.candidates_near(&Point::new(0.5, 0.5), 0.0), vec![1]);
    }
}
