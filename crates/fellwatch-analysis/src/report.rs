//! Summary statistics and the detail export.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use fellwatch_core::config::AnalysisConfig;
use fellwatch_core::models::{
    percentage, AttributeValue, ExportSheet, ExportWorkbook, LayerKind, LayerResult, LoggingArea,
    LoggingLayer, MatchStatus, ObservationId, ObservationSet,
};
use fellwatch_core::processing::year_of;

/// Name of the sheet listing every observation
pub const ALL_FINDINGS_SHEET: &str = "AllFindings";

/// Export column carrying the observation's source file
pub const SOURCE_COLUMN: &str = "Källa";

const RULE_WIDTH: usize = 70;

/// Statistics of one layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub kind: LayerKind,
    pub label: String,

    /// First and last year among the layer's area dates
    pub date_range: Option<(i32, i32)>,

    pub inside: usize,
    pub near: usize,
    pub inside_areas: usize,
    pub near_only_areas: usize,
    pub affected_areas: usize,
    pub relevant_areas: usize,
    pub coverage_percent: f64,
}

impl LayerSummary {
    pub fn new(result: &LayerResult, layer: Option<&LoggingLayer>) -> Self {
        Self {
            kind: result.kind,
            label: result.kind.label().to_string(),
            date_range: layer.and_then(LoggingLayer::year_range),
            inside: result.count(MatchStatus::Inside),
            near: result.count(MatchStatus::Near),
            inside_areas: result.inside_areas().len(),
            near_only_areas: result.near_only_areas().len(),
            affected_areas: result.affected_areas().len(),
            relevant_areas: result.relevant_count,
            coverage_percent: result.coverage_percent(),
        }
    }

    pub fn date_range_text(&self) -> String {
        match self.date_range {
            Some((first, last)) => format!("{} to {}", first, last),
            None => "missing".to_string(),
        }
    }
}

/// Run-level summary of an analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Distinct species names in order of first appearance
    pub species: Vec<String>,
    pub observation_years: Option<(i32, i32)>,
    pub regions: Vec<String>,
    pub accuracy_threshold: f64,
    pub buffer_distance: f64,
    pub layers: Vec<LayerSummary>,
    pub total_observations: usize,

    /// Observations matched in at least one layer
    pub affected_observations: usize,
    pub affected_percent: f64,
}

impl Report {
    pub fn build(
        config: &AnalysisConfig,
        observations: &ObservationSet,
        results: &BTreeMap<LayerKind, LayerResult>,
        layers: &BTreeMap<LayerKind, LoggingLayer>,
    ) -> Self {
        let columns = &config.columns;

        let years: Vec<i32> = observations
            .iter()
            .filter_map(|o| o.field(&columns.date).and_then(year_of))
            .collect();
        let observation_years = years.iter().min().copied().zip(years.iter().max().copied());

        let summaries: Vec<LayerSummary> = config
            .layers
            .iter()
            .filter_map(|layer| results.get(&layer.kind))
            .map(|result| LayerSummary::new(result, layers.get(&result.kind)))
            .collect();

        let affected: BTreeSet<ObservationId> =
            results.values().flat_map(|r| r.observations()).collect();

        Self {
            species: distinct_texts(observations, &columns.species),
            observation_years,
            regions: distinct_texts(observations, &columns.region),
            accuracy_threshold: config.accuracy_threshold,
            buffer_distance: config.buffer_distance,
            layers: summaries,
            total_observations: observations.len(),
            affected_observations: affected.len(),
            affected_percent: percentage(affected.len(), observations.len()),
        }
    }

    pub fn species_text(&self) -> String {
        self.species.join(", ").to_uppercase()
    }

    pub fn region_text(&self) -> String {
        if self.regions.is_empty() {
            "Unknown area".to_string()
        } else {
            self.regions.join(", ")
        }
    }

    pub fn observation_years_text(&self) -> String {
        match self.observation_years {
            Some((first, last)) => format!("{} to {}", first, last),
            None => "missing".to_string(),
        }
    }
}

fn distinct_texts(observations: &ObservationSet, column: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    observations
        .iter()
        .map(|o| o.text(column).trim())
        .filter(|text| !text.is_empty() && seen.insert(text.to_string()))
        .map(str::to_string)
        .collect()
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(f, "{}", rule)?;
        writeln!(f, "    {:<26}{}", "ANALYSIS OF:", self.species_text())?;
        writeln!(f, "    {:<26}{} (within observation extent)", "Study area:", self.region_text())?;
        writeln!(f, "    {:<26}{}", "Observation period:", self.observation_years_text())?;
        writeln!(f, "    {:<26}Accuracy <= {} meters", "Filter:", self.accuracy_threshold)?;
        writeln!(f, "{}", rule)?;
        writeln!(f)?;

        let near_label = format!("In near zone (0-{}m):", self.buffer_distance);
        for layer in &self.layers {
            writeln!(f, "{} ({}):", layer.label, layer.date_range_text())?;
            writeln!(f, "  OBSERVATION SITES:")?;
            writeln!(f, "    - {:<44}{}", "Directly within felling:", layer.inside)?;
            writeln!(f, "    - {:<44}{}", near_label, layer.near)?;
            writeln!(f, "  FELLING AREAS:")?;
            writeln!(f, "    - {:<44}{}", "Areas with observations inside:", layer.inside_areas)?;
            writeln!(f, "    - {:<44}{}", "Areas with near-zone observations only:", layer.near_only_areas)?;
            writeln!(
                f,
                "    - {:<44}{} of {} ({:.1}%)",
                "TOTAL affected areas:",
                layer.affected_areas,
                layer.relevant_areas,
                layer.coverage_percent
            )?;
            writeln!(f)?;
        }

        writeln!(
            f,
            "{:<50}{} of {}",
            "TOTAL DISTINCT SITES AFFECTED:", self.affected_observations, self.total_observations
        )?;
        writeln!(f, "{:<50}{:.1}%", "SHARE OF SITES AFFECTED:", self.affected_percent)?;
        write!(f, "{}", rule)
    }
}

/// Assemble the detail export: every observation, then one sheet per
/// layer that has matches
pub fn build_export(
    observations: &ObservationSet,
    results: &BTreeMap<LayerKind, LayerResult>,
    layers: &BTreeMap<LayerKind, LoggingLayer>,
) -> ExportWorkbook {
    let mut columns = observations.columns.clone();
    columns.push(SOURCE_COLUMN.to_string());

    let mut all = ExportSheet::new(ALL_FINDINGS_SHEET, columns.clone());
    for observation in observations.iter() {
        all.push_row(observation_row(observations, observation.id));
    }

    let mut sheets = vec![all];
    for (kind, result) in results {
        if result.matches.is_empty() {
            continue;
        }

        let areas: BTreeMap<_, &LoggingArea> = layers
            .get(kind)
            .map(|layer| layer.areas.iter().map(|a| (a.id, a)).collect())
            .unwrap_or_default();
        let attribute_names: BTreeSet<&String> =
            areas.values().flat_map(|a| a.attributes.keys()).collect();

        let mut match_columns = columns.clone();
        match_columns.push("area_id".to_string());
        for name in &attribute_names {
            if columns.contains(*name) {
                match_columns.push(format!("{}_area", name));
            } else {
                match_columns.push((*name).clone());
            }
        }
        match_columns.push("status".to_string());

        let mut sheet = ExportSheet::new(format!("Matches_{}", kind.as_str()), match_columns);
        for record in &result.matches {
            let mut row = observation_row(observations, record.observation);
            row.push(AttributeValue::Number(record.area.0 as f64));
            let area = areas.get(&record.area);
            for name in &attribute_names {
                row.push(
                    area.and_then(|a| a.attributes.get(*name)).cloned().unwrap_or(AttributeValue::Null),
                );
            }
            row.push(AttributeValue::Text(record.status.to_string()));
            sheet.push_row(row);
        }
        sheets.push(sheet);
    }

    ExportWorkbook { sheets }
}

fn observation_row(observations: &ObservationSet, id: ObservationId) -> Vec<AttributeValue> {
    let observation = observations
        .observations
        .get(id.0 as usize)
        .filter(|o| o.id == id)
        .or_else(|| observations.iter().find(|o| o.id == id));
    let Some(observation) = observation else {
        return vec![AttributeValue::Null; observations.columns.len() + 1];
    };

    let mut row: Vec<AttributeValue> = observations
        .columns
        .iter()
        .map(|c| observation.field(c).cloned().unwrap_or(AttributeValue::Null))
        .collect();
    row.push(AttributeValue::Text(observation.source.clone()));
    row
}
