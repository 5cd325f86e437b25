//! Match records produced by the spatial matcher.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::logging_area::{AreaId, LayerKind};
use super::observation::ObservationId;

/// Relation between an observation and a logging area
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// The observation point lies strictly within the area
    Inside,
    /// The near-zone disc touches the area but the point is outside it
    Near,
}

impl MatchStatus {
    /// Higher wins when both statuses apply to the same pair
    pub fn priority(&self) -> u8 {
        match self {
            MatchStatus::Inside => 1,
            MatchStatus::Near => 0,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Inside => f.write_str("Inside"),
            MatchStatus::Near => f.write_str("Near"),
        }
    }
}

/// How merged matches are deduplicated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DedupPolicy {
    /// One record per observation: the first Inside pairing, else the first
    /// Near pairing. Later pairings of the same observation are discarded.
    #[default]
    PerObservation,
    /// One record per (observation, area) pair
    PerPair,
}

impl FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per-observation" | "observation" => Ok(DedupPolicy::PerObservation),
            "per-pair" | "pair" => Ok(DedupPolicy::PerPair),
            other => Err(format!(
                "unknown dedup policy '{}', expected per-observation or per-pair",
                other
            )),
        }
    }
}

/// One observation associated with one area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchRecord {
    pub observation: ObservationId,
    pub area: AreaId,
    pub status: MatchStatus,
}

impl MatchRecord {
    pub fn new(observation: ObservationId, area: AreaId, status: MatchStatus) -> Self {
        Self { observation, area, status }
    }
}

/// Matches of one layer plus the coverage denominator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerResult {
    pub kind: LayerKind,
    pub matches: Vec<MatchRecord>,

    /// Areas intersecting the study extent
    pub relevant_count: usize,
}

impl LayerResult {
    pub fn empty(kind: LayerKind) -> Self {
        Self { kind, matches: Vec::new(), relevant_count: 0 }
    }

    pub fn count(&self, status: MatchStatus) -> usize {
        self.matches.iter().filter(|m| m.status == status).count()
    }

    /// Distinct areas with at least one match of any status
    pub fn affected_areas(&self) -> BTreeSet<AreaId> {
        self.matches.iter().map(|m| m.area).collect()
    }

    /// Distinct areas with at least one Inside match
    pub fn inside_areas(&self) -> BTreeSet<AreaId> {
        self.matches.iter().filter(|m| m.status == MatchStatus::Inside).map(|m| m.area).collect()
    }

    /// Areas matched only through the near zone
    pub fn near_only_areas(&self) -> BTreeSet<AreaId> {
        let inside = self.inside_areas();
        self.affected_areas().difference(&inside).copied().collect()
    }

    /// Distinct observations appearing in any match
    pub fn observations(&self) -> BTreeSet<ObservationId> {
        self.matches.iter().map(|m| m.observation).collect()
    }

    /// Affected areas as a share of relevant areas, 0 when none are relevant
    pub fn coverage_percent(&self) -> f64 {
        percentage(self.affected_areas().len(), self.relevant_count)
    }
}

/// `part / whole * 100`, guarded against an empty whole
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(obs: u64, area: u64, status: MatchStatus) -> MatchRecord {
        MatchRecord::new(ObservationId(obs), AreaId(area), status)
    }

    #[test]
    fn test_area_sets() {
        let result = LayerResult {
            kind: LayerKind::Executed,
            matches: vec![
                record(0, 10, MatchStatus::Inside),
                record(1, 10, MatchStatus::Near),
                record(2, 11, MatchStatus::Near),
                record(3, 12, MatchStatus::Inside),
            ],
            relevant_count: 8,
        };

        assert_eq!(result.count(MatchStatus::Inside), 2);
        assert_eq!(result.count(MatchStatus::Near), 2);
        assert_eq!(result.affected_areas().len(), 3);
        assert_eq!(result.inside_areas().len(), 2);
        assert_eq!(result.near_only_areas().into_iter().collect::<Vec<_>>(), vec![AreaId(11)]);
        assert!((result.coverage_percent() - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_guards_zero_denominator() {
        let result = LayerResult::empty(LayerKind::Reported);
        assert_eq!(result.coverage_percent(), 0.0);
    }

    #[test]
    fn test_dedup_policy_parse() {
        assert_eq!("per-pair".parse::<DedupPolicy>().unwrap(), DedupPolicy::PerPair);
        assert_eq!(
            "Per-Observation".parse::<DedupPolicy>().unwrap(),
            DedupPolicy::PerObservation
        );
        assert!("none".parse::<DedupPolicy>().is_err());
    }
}
