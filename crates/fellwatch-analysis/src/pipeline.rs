use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use fellwatch_core::config::{AnalysisConfig, LayerConfig};
use fellwatch_core::error::{FellwatchError, Result};
use fellwatch_core::models::{LayerKind, LayerResult, LoggingLayer, ObservationSet};
use fellwatch_core::ports::{DatasetCache, ExportWriter, LayerReader, TableReader};
use fellwatch_core::processing::year_of;

use crate::loader::{discover_input_files, LayerFilter, LayerLoader, ObservationLoader};
use crate::matcher::SpatialMatcher;
use crate::report::{build_export, Report};

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: Report,
    pub observations: ObservationSet,
    pub layers: BTreeMap<LayerKind, LoggingLayer>,
    pub results: BTreeMap<LayerKind, LayerResult>,

    /// Where the detail export was written
    pub output_file: PathBuf,
}

/// Result of a cache lookup
enum Cached<D> {
    Hit(D),
    Miss,

    /// A cache file exists but could not be used; it is left untouched
    Unusable,
}

/// Analysis pipeline orchestrating loading, matching and reporting
pub struct AnalysisPipeline<T, L, OC, LC, E>
where
    T: TableReader,
    L: LayerReader,
    OC: DatasetCache<ObservationSet>,
    LC: DatasetCache<LoggingLayer>,
    E: ExportWriter,
{
    table_reader: T,
    layer_reader: L,
    observation_cache: OC,
    layer_cache: LC,
    export_writer: E,
}

impl<T, L, OC, LC, E> AnalysisPipeline<T, L, OC, LC, E>
where
    T: TableReader,
    L: LayerReader,
    OC: DatasetCache<ObservationSet>,
    LC: DatasetCache<LoggingLayer>,
    E: ExportWriter,
{
    /// Create a new analysis pipeline
    pub fn new(
        table_reader: T,
        layer_reader: L,
        observation_cache: OC,
        layer_cache: LC,
        export_writer: E,
    ) -> Self {
        Self { table_reader, layer_reader, observation_cache, layer_cache, export_writer }
    }

    /// Run the whole analysis and write the detail export
    pub fn run(&self, config: &AnalysisConfig) -> Result<AnalysisOutcome> {
        ensure_dir(&config.processed_dir)?;
        if let Some(parent) = config.output_file.parent() {
            ensure_dir(parent)?;
        }

        // Phase 1: Observations
        let observations = self.load_observations(config)?;
        let bounds = observations.bounds().ok_or(FellwatchError::EmptyObservations)?;

        // Phase 2: Logging layers restricted to the observations
        let filter = LayerFilter {
            bbox: bounds.expand(config.buffer_distance),
            min_year: first_observation_year(config, &observations),
        };
        let layers = self.load_layers(config, &filter)?;

        // Phase 3: Matching
        let results = SpatialMatcher::from_config(config).match_layers(&observations, &layers)?;

        // Phase 4: Report and export
        let report = Report::build(config, &observations, &results, &layers);
        let workbook = build_export(&observations, &results, &layers);
        self.export_writer.write(&config.output_file, &workbook)?;
        tracing::info!(
            path = %config.output_file.display(),
            sheets = workbook.sheets.len(),
            "Saved detail export"
        );

        Ok(AnalysisOutcome {
            report,
            observations,
            layers,
            results,
            output_file: config.output_file.clone(),
        })
    }

    /// Load observations from the cache, or parse the inputs and cache them
    pub fn load_observations(&self, config: &AnalysisConfig) -> Result<ObservationSet> {
        let key = &config.observation_cache;
        let cached = lookup(&self.observation_cache, key, "observations")?;
        if let Cached::Hit(observations) = cached {
            return Ok(observations);
        }

        let files = discover_input_files(&config.input_dir, self.table_reader.supported_extensions())?;
        tracing::info!(dir = %config.input_dir.display(), files = files.len(), "Parsing observation files");

        let observations = ObservationLoader::new(config).load(&self.table_reader, &files)?;
        tracing::info!(count = observations.len(), "Loaded observations");

        if matches!(cached, Cached::Miss) {
            store(&self.observation_cache, key, &observations, "observations");
        }
        Ok(observations)
    }

    /// Load every configured layer, from its cache when one exists
    pub fn load_layers(
        &self,
        config: &AnalysisConfig,
        filter: &LayerFilter,
    ) -> Result<BTreeMap<LayerKind, LoggingLayer>> {
        let mut layers = BTreeMap::new();
        for layer in &config.layers {
            let loaded = self.load_layer(config, layer, filter)?;
            layers.insert(layer.kind, loaded);
        }
        Ok(layers)
    }

    fn load_layer(
        &self,
        config: &AnalysisConfig,
        layer: &LayerConfig,
        filter: &LayerFilter,
    ) -> Result<LoggingLayer> {
        let key = config.layer_cache(layer.kind);
        let cached = lookup(&self.layer_cache, &key, layer.kind.as_str())?;
        if let Cached::Hit(loaded) = cached {
            return Ok(loaded);
        }

        let source = config.layer_source(layer);
        tracing::info!(layer = %layer.kind, path = %source.display(), "Reading layer");
        let raw = self.layer_reader.read_layer_within(&source, &filter.bbox, &config.crs)?;
        let filtered = LayerLoader::new(config).filter_layer(raw, layer, filter)?;

        if matches!(cached, Cached::Miss) {
            store(&self.layer_cache, &key, &filtered, layer.kind.as_str());
        }
        Ok(filtered)
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|source| FellwatchError::OutputDirectory { path: path.to_path_buf(), source })
}

fn lookup<D, C: DatasetCache<D>>(cache: &C, key: &Path, dataset: &str) -> Result<Cached<D>> {
    match cache.try_load(key) {
        Ok(Some(loaded)) => {
            tracing::info!(dataset, path = %key.display(), "Loaded from cache");
            Ok(Cached::Hit(loaded))
        }
        Ok(None) => {
            tracing::debug!(dataset, path = %key.display(), "No cache found");
            Ok(Cached::Miss)
        }
        Err(e @ FellwatchError::Cache { .. }) => {
            tracing::warn!(dataset, error = %e, "Ignoring unusable cache, parsing the source instead");
            Ok(Cached::Unusable)
        }
        Err(e) => Err(e),
    }
}

fn store<D, C: DatasetCache<D>>(cache: &C, key: &Path, data: &D, dataset: &str) {
    match cache.save(key, data) {
        Ok(()) => tracing::info!(dataset, path = %key.display(), "Cache written"),
        Err(e) => tracing::warn!(dataset, error = %e, "Could not write cache, continuing"),
    }
}

/// Earliest year among the observation dates, used as the layer year filter
pub fn first_observation_year(config: &AnalysisConfig, observations: &ObservationSet) -> Option<i32> {
    let column = &config.columns.date;
    let year = observations.iter().filter_map(|o| o.field(column).and_then(year_of)).min();
    if year.is_none() {
        tracing::warn!(column = %column, "No parseable observation dates, layer year filter disabled");
    }
    year
}
