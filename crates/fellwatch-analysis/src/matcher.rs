//! Containment and proximity matching between observations and areas.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use geo::Point;

use fellwatch_core::config::AnalysisConfig;
use fellwatch_core::error::{FellwatchError, Result};
use fellwatch_core::models::{
    AreaId, DedupPolicy, LayerKind, LayerResult, LoggingArea, LoggingLayer, MatchRecord,
    MatchStatus, ObservationId, ObservationSet,
};
use fellwatch_geo::spatial::{point_inside, point_within_distance};
use fellwatch_geo::{AreaIndex, StudyExtent};

/// Raw pairings of one layer before the merge step.
///
/// Both lists are sorted by (observation, area). Every Inside pair also
/// appears in `near`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pairings {
    pub inside: Vec<MatchRecord>,
    pub near: Vec<MatchRecord>,
}

/// Matches observations against logging layers
#[derive(Debug, Clone, Copy)]
pub struct SpatialMatcher {
    buffer: f64,
    dedup: DedupPolicy,
}

impl SpatialMatcher {
    pub fn new(buffer: f64, dedup: DedupPolicy) -> Self {
        Self { buffer, dedup }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.buffer_distance, config.dedup)
    }

    /// Match every layer. Fails when there are no observations.
    pub fn match_layers(
        &self,
        observations: &ObservationSet,
        layers: &BTreeMap<LayerKind, LoggingLayer>,
    ) -> Result<BTreeMap<LayerKind, LayerResult>> {
        let points: Vec<Point<f64>> = observations.iter().map(|o| o.point()).collect();
        let extent = StudyExtent::from_points(&points).ok_or(FellwatchError::EmptyObservations)?;

        Ok(layers
            .iter()
            .map(|(kind, layer)| (*kind, self.match_layer(observations, &extent, layer)))
            .collect())
    }

    /// Match one layer against the observations inside `extent`
    pub fn match_layer(
        &self,
        observations: &ObservationSet,
        extent: &StudyExtent,
        layer: &LoggingLayer,
    ) -> LayerResult {
        let relevant = self.relevant_areas(extent, layer);
        tracing::info!(layer = %layer.kind, relevant = relevant.len(), "Relevant areas in study extent");

        if relevant.is_empty() {
            return LayerResult::empty(layer.kind);
        }

        let pairings = self.pairings(observations, &relevant);
        let (matches, discarded) = merge_matches(&pairings.inside, &pairings.near, self.dedup);
        if discarded > 0 {
            tracing::warn!(
                layer = %layer.kind,
                discarded,
                "Observations matching several areas kept only their first pairing"
            );
        }
        tracing::debug!(
            layer = %layer.kind,
            inside = pairings.inside.len(),
            near = pairings.near.len(),
            kept = matches.len(),
            "Merged pairings"
        );

        LayerResult { kind: layer.kind, matches, relevant_count: relevant.len() }
    }

    /// Areas whose distance to the extent is at most the buffer
    pub fn relevant_areas<'a>(
        &self,
        extent: &StudyExtent,
        layer: &'a LoggingLayer,
    ) -> Vec<&'a LoggingArea> {
        let index = AreaIndex::build(layer.areas.iter().map(|a| &a.geometry));
        index
            .candidates_in_rect(&extent.bounding_rect(), self.buffer)
            .into_iter()
            .map(|position| &layer.areas[position])
            .filter(|area| extent.within_distance(&area.geometry, self.buffer))
            .collect()
    }

    /// All Inside and Near pairs between the observations and `areas`
    pub fn pairings(&self, observations: &ObservationSet, areas: &[&LoggingArea]) -> Pairings {
        let index = AreaIndex::build(areas.iter().map(|a| &a.geometry));
        let mut pairings = Pairings::default();

        for observation in observations.iter() {
            let point = observation.point();
            for position in index.candidates_near(&point, self.buffer) {
                let area = areas[position];
                if !point_within_distance(&point, &area.geometry, self.buffer) {
                    continue;
                }
                pairings.near.push(MatchRecord::new(observation.id, area.id, MatchStatus::Near));
                if point_inside(&point, &area.geometry) {
                    pairings.inside.push(MatchRecord::new(
                        observation.id,
                        area.id,
                        MatchStatus::Inside,
                    ));
                }
            }
        }

        let by_pair = |a: &MatchRecord, b: &MatchRecord| {
            (a.observation, a.area).cmp(&(b.observation, b.area))
        };
        pairings.inside.sort_by(by_pair);
        pairings.near.sort_by(by_pair);
        pairings
    }
}

/// Merge Inside then Near pairings, first seen wins.
///
/// Candidates are ordered by status priority, keeping their relative order
/// otherwise, so an Inside pairing always beats a Near one for the same key.
/// Returns the kept records and the number of distinct pairs the policy
/// discarded. A Near entry repeating an Inside pair is never counted.
pub fn merge_matches(
    inside: &[MatchRecord],
    near: &[MatchRecord],
    policy: DedupPolicy,
) -> (Vec<MatchRecord>, usize) {
    let mut seen_observations: HashSet<ObservationId> = HashSet::new();
    let mut seen_pairs: HashSet<(ObservationId, AreaId)> = HashSet::new();
    let mut merged = Vec::new();

    let mut candidates: Vec<&MatchRecord> = inside.iter().chain(near).collect();
    candidates.sort_by_key(|record| std::cmp::Reverse(record.status.priority()));

    for record in candidates {
        let pair = (record.observation, record.area);
        let first = match policy {
            DedupPolicy::PerObservation => seen_observations.insert(record.observation),
            DedupPolicy::PerPair => !seen_pairs.contains(&pair),
        };
        seen_pairs.insert(pair);
        if first {
            merged.push(*record);
        }
    }

    let distinct: BTreeSet<(ObservationId, AreaId)> =
        inside.iter().chain(near).map(|r| (r.observation, r.area)).collect();
    let discarded = distinct.len() - merged.len();
    (merged, discarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fellwatch_core::models::{Crs, Observation};
    use geo::{polygon, MultiPolygon};

    fn square(min_x: f64, min_y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: min_x, y: min_y),
            (x: min_x + size, y: min_y),
            (x: min_x + size, y: min_y + size),
            (x: min_x, y: min_y + size),
            (x: min_x, y: min_y),
        ]])
    }

    fn area(id: u64, geometry: MultiPolygon<f64>) -> LoggingArea {
        LoggingArea {
            id: AreaId(id),
            kind: LayerKind::Executed,
            date: None,
            geometry,
            attributes: BTreeMap::new(),
        }
    }

    fn layer(areas: Vec<LoggingArea>) -> LoggingLayer {
        let mut layer = LoggingLayer::new(LayerKind::Executed, Crs::sweref99_tm(), "Avvdatum");
        layer.areas = areas;
        layer
    }

    fn observations(coords: &[(f64, f64)]) -> ObservationSet {
        let observations = coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Observation {
                id: ObservationId(i as u64),
                x,
                y,
                accuracy: Some(10.0),
                quantity: None,
                source: "fynd.xlsx".to_string(),
                fields: BTreeMap::new(),
            })
            .collect();
        ObservationSet::new(Crs::sweref99_tm(), vec![], observations)
    }

    fn record(obs: u64, area: u64, status: MatchStatus) -> MatchRecord {
        MatchRecord::new(ObservationId(obs), AreaId(area), status)
    }

    fn match_one(
        matcher: &SpatialMatcher,
        observations: &ObservationSet,
        layer: &LoggingLayer,
    ) -> LayerResult {
        let mut layers = BTreeMap::new();
        layers.insert(layer.kind, layer.clone());
        matcher.match_layers(observations, &layers).unwrap().remove(&layer.kind).unwrap()
    }

    #[test]
    fn test_inside_and_near() {
        let observations = observations(&[(50.0, 50.0), (1130.0, 50.0)]);
        let layer = layer(vec![area(0, square(0.0, 0.0, 100.0)), area(1, square(1000.0, 0.0, 100.0))]);
        let matcher = SpatialMatcher::new(50.0, DedupPolicy::PerObservation);

        let result = match_one(&matcher, &observations, &layer);

        assert_eq!(result.matches, vec![record(0, 0, MatchStatus::Inside), record(1, 1, MatchStatus::Near)]);
        assert_eq!(result.relevant_count, 2);
        assert_eq!(result.coverage_percent(), 100.0);
    }

    #[test]
    fn test_boundary_point_is_near() {
        let observations = observations(&[(100.0, 50.0)]);
        let layer = layer(vec![area(0, square(0.0, 0.0, 100.0))]);
        let matcher = SpatialMatcher::new(50.0, DedupPolicy::PerObservation);

        let result = match_one(&matcher, &observations, &layer);
        assert_eq!(result.matches, vec![record(0, 0, MatchStatus::Near)]);
    }

    #[test]
    fn test_near_zone_is_inclusive() {
        let observations = observations(&[(150.0, 50.0), (150.5, 200.0)]);
        let layer = layer(vec![area(0, square(0.0, 0.0, 100.0)), area(1, square(0.0, 150.0, 100.0))]);
        let matcher = SpatialMatcher::new(50.0, DedupPolicy::PerObservation);

        let result = match_one(&matcher, &observations, &layer);
        assert_eq!(result.matches, vec![record(0, 0, MatchStatus::Near)]);
    }

    #[test]
    fn test_relevant_count_excludes_distant_areas() {
        let observations = observations(&[(0.0, 0.0), (100.0, 0.0), (50.0, 100.0)]);
        let layer = layer(vec![
            area(0, square(40.0, 40.0, 5.0)),
            area(1, square(40.0, -60.0, 10.0)),
            area(2, square(5000.0, 5000.0, 10.0)),
        ]);
        let matcher = SpatialMatcher::new(50.0, DedupPolicy::PerObservation);

        let result = match_one(&matcher, &observations, &layer);
        assert_eq!(result.relevant_count, 2);
        assert!(result.matches.is_empty());
        assert_eq!(result.coverage_percent(), 0.0);
    }

    #[test]
    fn test_zero_relevant_areas() {
        let observations = observations(&[(0.0, 0.0)]);
        let layer = layer(vec![area(0, square(5000.0, 5000.0, 10.0))]);
        let matcher = SpatialMatcher::new(50.0, DedupPolicy::PerObservation);

        let result = match_one(&matcher, &observations, &layer);
        assert_eq!(result, LayerResult::empty(LayerKind::Executed));
    }

    #[test]
    fn test_empty_observations_fail() {
        let matcher = SpatialMatcher::new(50.0, DedupPolicy::PerObservation);
        let mut layers = BTreeMap::new();
        layers.insert(LayerKind::Executed, layer(vec![]));

        let result = matcher.match_layers(&observations(&[]), &layers);
        assert!(matches!(result, Err(FellwatchError::EmptyObservations)));
    }

    #[test]
    fn test_per_observation_keeps_first_inside() {
        // Overlapping areas: the point is inside both and near a third
        let observations = observations(&[(50.0, 50.0)]);
        let layer = layer(vec![
            area(3, square(0.0, 0.0, 100.0)),
            area(1, square(20.0, 20.0, 60.0)),
            area(2, square(120.0, 0.0, 100.0)),
        ]);

        let per_observation = SpatialMatcher::new(80.0, DedupPolicy::PerObservation);
        let result = match_one(&per_observation, &observations, &layer);
        assert_eq!(result.matches, vec![record(0, 1, MatchStatus::Inside)]);

        let per_pair = SpatialMatcher::new(80.0, DedupPolicy::PerPair);
        let result = match_one(&per_pair, &observations, &layer);
        assert_eq!(
            result.matches,
            vec![
                record(0, 1, MatchStatus::Inside),
                record(0, 3, MatchStatus::Inside),
                record(0, 2, MatchStatus::Near),
            ]
        );
    }

    #[test]
    fn test_merge_counts_discarded_pairs() {
        let inside = vec![record(0, 1, MatchStatus::Inside)];
        let near = vec![
            record(0, 1, MatchStatus::Near),
            record(0, 2, MatchStatus::Near),
            record(1, 2, MatchStatus::Near),
            record(1, 3, MatchStatus::Near),
        ];

        let (merged, discarded) = merge_matches(&inside, &near, DedupPolicy::PerObservation);
        assert_eq!(merged, vec![record(0, 1, MatchStatus::Inside), record(1, 2, MatchStatus::Near)]);
        assert_eq!(discarded, 2);

        let (merged, discarded) = merge_matches(&inside, &near, DedupPolicy::PerPair);
        assert_eq!(merged.len(), 4);
        assert_eq!(discarded, 0);
    }

    #[test]
    fn test_merge_prefers_inside_regardless_of_order() {
        let near = vec![record(0, 2, MatchStatus::Near), record(0, 1, MatchStatus::Inside)];

        let (merged, discarded) = merge_matches(&[], &near, DedupPolicy::PerObservation);
        assert_eq!(merged, vec![record(0, 1, MatchStatus::Inside)]);
        assert_eq!(discarded, 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn scenario() -> impl Strategy<Value = (Vec<(f64, f64)>, Vec<(f64, f64, f64)>)> {
            (
                prop::collection::vec((0.0..1000.0f64, 0.0..1000.0f64), 1..25),
                prop::collection::vec((0.0..1000.0f64, 0.0..1000.0f64, 1.0..200.0f64), 0..12),
            )
        }

        fn build_layer(squares: &[(f64, f64, f64)]) -> LoggingLayer {
            layer(
                squares
                    .iter()
                    .enumerate()
                    .map(|(i, &(x, y, size))| area(i as u64, square(x, y, size)))
                    .collect(),
            )
        }

        proptest! {
            #[test]
            fn per_observation_keeps_one_record_each((coords, squares) in scenario()) {
                let observations = observations(&coords);
                let layer = build_layer(&squares);
                let matcher = SpatialMatcher::new(50.0, DedupPolicy::PerObservation);

                let result = match_one(&matcher, &observations, &layer);
                let distinct = result.observations();
                prop_assert_eq!(distinct.len(), result.matches.len());
            }

            #[test]
            fn inside_pairings_never_outnumber_near((coords, squares) in scenario()) {
                let observations = observations(&coords);
                let layer = build_layer(&squares);
                let matcher = SpatialMatcher::new(50.0, DedupPolicy::PerPair);
                let points: Vec<Point<f64>> = observations.iter().map(|o| o.point()).collect();
                let extent = StudyExtent::from_points(&points).unwrap();

                let relevant = matcher.relevant_areas(&extent, &layer);
                let pairings = matcher.pairings(&observations, &relevant);
                prop_assert!(pairings.inside.len() <= pairings.near.len());
                for inside in &pairings.inside {
                    prop_assert!(pairings
                        .near
                        .iter()
                        .any(|n| n.observation == inside.observation && n.area == inside.area));
                }
            }

            #[test]
            fn coverage_stays_within_bounds((coords, squares) in scenario()) {
                let observations = observations(&coords);
                let layer = build_layer(&squares);
                let matcher = SpatialMatcher::new(50.0, DedupPolicy::PerPair);

                let result = match_one(&matcher, &observations, &layer);
                let coverage = result.coverage_percent();
                prop_assert!((0.0..=100.0).contains(&coverage));
                prop_assert!(result.affected_areas().len() <= result.relevant_count);
            }
        }
    }
}
