use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use fellwatch_core::config::AnalysisConfig;
use fellwatch_core::error::{FellwatchError, Result};
use fellwatch_core::models::{AttributeValue, Observation, ObservationId, ObservationSet, RawTable};
use fellwatch_core::ports::TableReader;
use fellwatch_core::processing::{to_number_value, to_text_value};

/// Row counts of one cleaned input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningStats {
    pub rows: usize,

    /// Rows whose accuracy radius exceeded the threshold
    pub inaccurate: usize,

    /// Rows without a numeric coordinate pair
    pub missing_coordinates: usize,
}

impl CleaningStats {
    pub fn kept(&self) -> usize {
        self.rows - self.inaccurate - self.missing_coordinates
    }
}

/// Turns raw spreadsheet rows into located observations
pub struct ObservationLoader<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> ObservationLoader<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Read, clean and concatenate every input file in order
    pub fn load<T: TableReader>(&self, reader: &T, files: &[PathBuf]) -> Result<ObservationSet> {
        let mut observations = Vec::new();
        let mut present = BTreeSet::new();

        for path in files {
            let source =
                path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            tracing::info!(file = %source, "Reading observations");

            let table = reader.read_table(path, self.config.header_offset)?;
            present.extend(
                self.config.keep_columns.iter().filter(|c| table.column_index(c).is_some()).cloned(),
            );

            let (cleaned, stats) = self.clean_table(&table, &source, observations.len() as u64)?;
            tracing::info!(
                file = %source,
                rows = stats.rows,
                kept = stats.kept(),
                inaccurate = stats.inaccurate,
                missing_coordinates = stats.missing_coordinates,
                "Cleaned observations"
            );
            observations.extend(cleaned);
        }

        let columns: Vec<String> =
            self.config.keep_columns.iter().filter(|c| present.contains(*c)).cloned().collect();

        // Columns only some files have are filled like missing cells
        for observation in &mut observations {
            for column in &columns {
                if !observation.fields.contains_key(column) {
                    let value = if self.config.columns.is_numeric(column) {
                        AttributeValue::Null
                    } else {
                        AttributeValue::Text(String::new())
                    };
                    observation.fields.insert(column.clone(), value);
                }
            }
        }

        Ok(ObservationSet::new(self.config.crs.clone(), columns, observations))
    }

    /// Clean one table. Ids continue from `first_id`.
    pub fn clean_table(
        &self,
        table: &RawTable,
        source: &str,
        first_id: u64,
    ) -> Result<(Vec<Observation>, CleaningStats)> {
        let mapping = &self.config.columns;

        for required in [&mapping.east, &mapping.north] {
            if table.column_index(required).is_none() {
                return Err(FellwatchError::MissingColumn {
                    file: source.to_string(),
                    column: required.clone(),
                });
            }
        }

        let present: Vec<(&String, usize)> = self
            .config
            .keep_columns
            .iter()
            .filter_map(|c| table.column_index(c).map(|i| (c, i)))
            .collect();

        let mut stats = CleaningStats::default();
        let mut observations = Vec::new();

        for row in &table.rows {
            stats.rows += 1;

            let fields: BTreeMap<String, AttributeValue> = present
                .iter()
                .map(|(column, index)| {
                    let cell = table.cell(row, *index);
                    let value = if mapping.is_numeric(column) {
                        to_number_value(cell)
                    } else {
                        to_text_value(cell)
                    };
                    ((*column).clone(), value)
                })
                .collect();

            let number = |column: &str| fields.get(column).and_then(AttributeValue::as_f64);

            let accuracy = number(&mapping.accuracy);
            if accuracy.is_some_and(|a| a > self.config.accuracy_threshold) {
                stats.inaccurate += 1;
                continue;
            }

            let (Some(x), Some(y)) = (number(&mapping.east), number(&mapping.north)) else {
                stats.missing_coordinates += 1;
                continue;
            };

            let quantity = number(&mapping.quantity);

            observations.push(Observation {
                id: ObservationId(first_id + observations.len() as u64),
                x,
                y,
                accuracy,
                quantity,
                source: source.to_string(),
                fields,
            });
        }

        Ok((observations, stats))
    }
}
