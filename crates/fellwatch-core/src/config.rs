use crate::error::{FellwatchError, Result};
use crate::models::{Crs, DedupPolicy, LayerKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name looked up in the base directory
pub const CONFIG_FILE_NAME: &str = "fellwatch.toml";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Cli => 2,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Names of the input columns the pipeline interprets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub east: String,
    pub north: String,
    pub accuracy: String,
    pub quantity: String,
    pub species: String,
    pub date: String,
    pub region: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            east: "Ost".to_string(),
            north: "Nord".to_string(),
            accuracy: "Noggrannhet".to_string(),
            quantity: "Antal".to_string(),
            species: "Artnamn".to_string(),
            date: "Startdatum".to_string(),
            region: "Län".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Columns coerced to numbers during cleaning
    pub fn is_numeric(&self, column: &str) -> bool {
        column == self.east
            || column == self.north
            || column == self.accuracy
            || column == self.quantity
    }
}

/// One logging layer source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub kind: LayerKind,

    /// File name inside the map directory
    pub file: String,

    /// Attribute holding the date the year filter applies to
    pub date_column: String,
}

impl LayerConfig {
    pub fn defaults() -> Vec<LayerConfig> {
        vec![
            LayerConfig {
                kind: LayerKind::Executed,
                file: "sksUtfordAvverk.geojson".to_string(),
                date_column: "Avvdatum".to_string(),
            },
            LayerConfig {
                kind: LayerKind::Reported,
                file: "sksAvverkAnm.geojson".to_string(),
                date_column: "Inkomdatum".to_string(),
            },
        ]
    }
}

fn default_keep_columns() -> Vec<String> {
    [
        "Rödlistade",
        "Artnamn",
        "Vetenskapligt namn",
        "Antal",
        "Enhet",
        "Huvudlokal",
        "Lokalnamn",
        "Ost",
        "Nord",
        "Noggrannhet",
        "Diffusion",
        "Startdatum",
        "Starttid",
        "Publik kommentar",
        "Rapportör",
        "Observatörer",
        "Län",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

/// Fully resolved settings of one analysis run.
///
/// Built once at startup and passed by reference to every stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    /// Directory scanned for observation spreadsheets
    pub input_dir: PathBuf,

    /// Directory holding the logging layer files
    pub map_dir: PathBuf,

    /// Directory for caches and the export
    pub processed_dir: PathBuf,

    pub observation_cache: PathBuf,
    pub output_file: PathBuf,
    pub layers: Vec<LayerConfig>,

    /// Working CRS all geometry is expressed in
    pub crs: Crs,

    /// Observations with a larger accuracy radius are dropped
    pub accuracy_threshold: f64,

    /// Near-zone radius and study extent margin, in map units
    pub buffer_distance: f64,

    /// Rows above the header row in each spreadsheet
    pub header_offset: usize,

    pub keep_columns: Vec<String>,
    pub columns: ColumnMapping,
    pub dedup: DedupPolicy,
}

impl AnalysisConfig {
    /// Defaults rooted at `base_dir`
    pub fn for_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        LayeredConfig::with_defaults(base_dir).build()
    }

    pub fn layer_source(&self, layer: &LayerConfig) -> PathBuf {
        self.map_dir.join(&layer.file)
    }

    pub fn layer_cache(&self, kind: LayerKind) -> PathBuf {
        self.processed_dir.join(format!("{}_cache.geojson", kind.as_str()))
    }

    pub fn layer(&self, kind: LayerKind) -> Option<&LayerConfig> {
        self.layers.iter().find(|l| l.kind == kind)
    }

    /// Check invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        if !self.accuracy_threshold.is_finite() || self.accuracy_threshold < 0.0 {
            return Err(FellwatchError::ConfigInvalid {
                key: "accuracy_threshold".to_string(),
                reason: format!("must be a non-negative number, got {}", self.accuracy_threshold),
            });
        }

        if !self.buffer_distance.is_finite() || self.buffer_distance < 0.0 {
            return Err(FellwatchError::ConfigInvalid {
                key: "buffer_distance".to_string(),
                reason: format!("must be a non-negative number, got {}", self.buffer_distance),
            });
        }

        if self.layers.is_empty() {
            return Err(FellwatchError::ConfigInvalid {
                key: "layers".to_string(),
                reason: "at least one logging layer is required".to_string(),
            });
        }

        for kind in LayerKind::ALL {
            if self.layers.iter().filter(|l| l.kind == kind).count() > 1 {
                return Err(FellwatchError::ConfigInvalid {
                    key: "layers".to_string(),
                    reason: format!("layer type '{}' is configured more than once", kind),
                });
            }
        }

        for column in [&self.columns.east, &self.columns.north] {
            if !self.keep_columns.contains(column) {
                return Err(FellwatchError::ConfigInvalid {
                    key: "keep_columns".to_string(),
                    reason: format!("coordinate column '{}' must be kept", column),
                });
            }
        }

        Ok(())
    }
}

/// Layered configuration for Fellwatch
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub base_dir: ConfigValue<PathBuf>,
    pub input_dir: ConfigValue<Option<PathBuf>>,
    pub map_dir: ConfigValue<Option<PathBuf>>,
    pub processed_dir: ConfigValue<Option<PathBuf>>,
    pub crs: ConfigValue<u32>,
    pub accuracy_threshold: ConfigValue<f64>,
    pub buffer_distance: ConfigValue<f64>,
    pub header_offset: ConfigValue<usize>,
    pub dedup: ConfigValue<DedupPolicy>,
    pub keep_columns: ConfigValue<Vec<String>>,
    pub columns: ConfigValue<ColumnMapping>,
    pub layers: ConfigValue<Vec<LayerConfig>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: ConfigValue::new(base_dir.into(), ConfigSource::Default),
            input_dir: ConfigValue::new(None, ConfigSource::Default),
            map_dir: ConfigValue::new(None, ConfigSource::Default),
            processed_dir: ConfigValue::new(None, ConfigSource::Default),
            crs: ConfigValue::new(3006, ConfigSource::Default),
            accuracy_threshold: ConfigValue::new(50.0, ConfigSource::Default),
            buffer_distance: ConfigValue::new(50.0, ConfigSource::Default),
            header_offset: ConfigValue::new(2, ConfigSource::Default),
            dedup: ConfigValue::new(DedupPolicy::PerObservation, ConfigSource::Default),
            keep_columns: ConfigValue::new(default_keep_columns(), ConfigSource::Default),
            columns: ConfigValue::new(ColumnMapping::default(), ConfigSource::Default),
            layers: ConfigValue::new(LayerConfig::defaults(), ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| FellwatchError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| FellwatchError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        // Relative paths in the file are relative to the file's directory
        let file_dir = path.as_ref().parent().map(Path::to_path_buf).unwrap_or_default();
        let anchor = |p: PathBuf| if p.is_absolute() { p } else { file_dir.join(p) };

        if let Some(base_dir) = file_config.base_dir {
            self.base_dir.update(anchor(base_dir), ConfigSource::File);
        }
        if let Some(input_dir) = file_config.input_dir {
            self.input_dir.update(Some(anchor(input_dir)), ConfigSource::File);
        }
        if let Some(map_dir) = file_config.map_dir {
            self.map_dir.update(Some(anchor(map_dir)), ConfigSource::File);
        }
        if let Some(processed_dir) = file_config.processed_dir {
            self.processed_dir.update(Some(anchor(processed_dir)), ConfigSource::File);
        }
        if let Some(crs) = file_config.crs {
            self.crs.update(crs, ConfigSource::File);
        }
        if let Some(threshold) = file_config.accuracy_threshold {
            self.accuracy_threshold.update(threshold, ConfigSource::File);
        }
        if let Some(buffer) = file_config.buffer_distance {
            self.buffer_distance.update(buffer, ConfigSource::File);
        }
        if let Some(offset) = file_config.header_offset {
            self.header_offset.update(offset, ConfigSource::File);
        }
        if let Some(dedup) = file_config.dedup {
            self.dedup.update(dedup, ConfigSource::File);
        }
        if let Some(keep_columns) = file_config.keep_columns {
            self.keep_columns.update(keep_columns, ConfigSource::File);
        }
        if let Some(columns) = file_config.columns {
            self.columns.update(columns, ConfigSource::File);
        }
        if let Some(layers) = file_config.layers {
            self.layers.update(layers, ConfigSource::File);
        }

        tracing::debug!(path = %path.as_ref().display(), "Applied configuration file");
        Ok(self)
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(base_dir) = overrides.base_dir {
            self.base_dir.update(base_dir, ConfigSource::Cli);
        }

        if let Some(threshold) = overrides.accuracy_threshold {
            self.accuracy_threshold.update(threshold, ConfigSource::Cli);
        }

        if let Some(buffer) = overrides.buffer_distance {
            self.buffer_distance.update(buffer, ConfigSource::Cli);
        }

        if let Some(dedup) = overrides.dedup {
            self.dedup.update(dedup, ConfigSource::Cli);
        }
    }

    /// Resolve into the settings value handed to the pipeline
    pub fn resolve(&self) -> Result<AnalysisConfig> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }

    fn build(&self) -> AnalysisConfig {
        let base = &self.base_dir.value;
        let dir_or_base = |dir: &Option<PathBuf>| dir.clone().unwrap_or_else(|| base.clone());
        let processed_dir =
            self.processed_dir.value.clone().unwrap_or_else(|| base.join("processed"));

        AnalysisConfig {
            input_dir: dir_or_base(&self.input_dir.value),
            map_dir: dir_or_base(&self.map_dir.value),
            observation_cache: processed_dir.join("observations_cache.geojson"),
            output_file: processed_dir.join("analysis_results.xlsx"),
            processed_dir,
            layers: self.layers.value.clone(),
            crs: Crs::from_epsg(self.crs.value),
            accuracy_threshold: self.accuracy_threshold.value,
            buffer_distance: self.buffer_distance.value,
            header_offset: self.header_offset.value,
            keep_columns: self.keep_columns.value.clone(),
            columns: self.columns.value.clone(),
            dedup: self.dedup.value,
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let mut map = BTreeMap::new();
        let resolved = self.build();

        map.insert(
            "base_dir".to_string(),
            (self.base_dir.value.display().to_string(), self.base_dir.source),
        );
        map.insert(
            "input_dir".to_string(),
            (resolved.input_dir.display().to_string(), self.input_dir.source),
        );
        map.insert(
            "map_dir".to_string(),
            (resolved.map_dir.display().to_string(), self.map_dir.source),
        );
        map.insert(
            "processed_dir".to_string(),
            (resolved.processed_dir.display().to_string(), self.processed_dir.source),
        );
        map.insert("crs".to_string(), (format!("EPSG:{}", self.crs.value), self.crs.source));
        map.insert(
            "accuracy_threshold".to_string(),
            (self.accuracy_threshold.value.to_string(), self.accuracy_threshold.source),
        );
        map.insert(
            "buffer_distance".to_string(),
            (self.buffer_distance.value.to_string(), self.buffer_distance.source),
        );
        map.insert(
            "header_offset".to_string(),
            (self.header_offset.value.to_string(), self.header_offset.source),
        );
        map.insert("dedup".to_string(), (format!("{:?}", self.dedup.value), self.dedup.source));
        map.insert(
            "keep_columns".to_string(),
            (self.keep_columns.value.join(", "), self.keep_columns.source),
        );
        map.insert(
            "layers".to_string(),
            (
                self.layers
                    .value
                    .iter()
                    .map(|l| format!("{}={} ({})", l.kind, l.file, l.date_column))
                    .collect::<Vec<_>>()
                    .join(", "),
                self.layers.source,
            ),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    base_dir: Option<PathBuf>,
    input_dir: Option<PathBuf>,
    map_dir: Option<PathBuf>,
    processed_dir: Option<PathBuf>,
    crs: Option<u32>,
    accuracy_threshold: Option<f64>,
    buffer_distance: Option<f64>,
    header_offset: Option<usize>,
    dedup: Option<DedupPolicy>,
    keep_columns: Option<Vec<String>>,
    columns: Option<ColumnMapping>,
    layers: Option<Vec<LayerConfig>>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub base_dir: Option<PathBuf>,
    pub accuracy_threshold: Option<f64>,
    pub buffer_distance: Option<f64>,
    pub dedup: Option<DedupPolicy>,
}
