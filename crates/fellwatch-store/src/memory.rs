//! In-memory port implementations for development and testing.
//!
//! These implementations use `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use fellwatch_core::error::{FellwatchError, Result};
use fellwatch_core::models::{ExportWorkbook, RawLayer, RawTable};
use fellwatch_core::ports::{DatasetCache, ExportWriter, LayerReader, TableReader};

fn not_found(path: &Path) -> FellwatchError {
    FellwatchError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{} not found", path.display()),
    ))
}

/// Tables served by path; the header offset is ignored
#[derive(Debug, Clone, Default)]
pub struct MemoryTableReader {
    tables: HashMap<PathBuf, RawTable>,
}

impl MemoryTableReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, path: impl Into<PathBuf>, table: RawTable) -> Self {
        self.tables.insert(path.into(), table);
        self
    }
}

impl TableReader for MemoryTableReader {
    fn read_table(&self, path: &Path, _header_offset: usize) -> Result<RawTable> {
        self.tables.get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["xlsx"]
    }
}

/// Layers served by path, counting reads
#[derive(Debug, Clone, Default)]
pub struct MemoryLayerReader {
    layers: HashMap<PathBuf, RawLayer>,
    reads: Arc<RwLock<usize>>,
}

impl MemoryLayerReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, path: impl Into<PathBuf>, layer: RawLayer) -> Self {
        self.layers.insert(path.into(), layer);
        self
    }

    /// Number of `read_layer` calls so far
    pub fn reads(&self) -> usize {
        *self.reads.read().unwrap()
    }
}

impl LayerReader for MemoryLayerReader {
    fn read_layer(&self, path: &Path) -> Result<RawLayer> {
        *self.reads.write().unwrap() += 1;
        self.layers.get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["geojson"]
    }

    fn format_name(&self) -> &str {
        "Memory"
    }
}

/// Cache entries kept in a shared map
#[derive(Debug, Clone)]
pub struct MemoryDatasetCache<D> {
    entries: Arc<RwLock<HashMap<PathBuf, D>>>,
    read_only: bool,
}

impl<D> Default for MemoryDatasetCache<D> {
    fn default() -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())), read_only: false }
    }
}

impl<D: Clone> MemoryDatasetCache<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose every `save` fails with a permission error
    pub fn read_only() -> Self {
        Self { read_only: true, ..Self::default() }
    }

    pub fn contains(&self, key: &Path) -> bool {
        self.entries.read().unwrap().contains_key(key)
    }

    pub fn get(&self, key: &Path) -> Option<D> {
        self.entries.read().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<PathBuf>, dataset: D) {
        self.entries.write().unwrap().insert(key.into(), dataset);
    }
}

impl<D: Clone> DatasetCache<D> for MemoryDatasetCache<D> {
    fn try_load(&self, key: &Path) -> Result<Option<D>> {
        Ok(self.get(key))
    }

    fn save(&self, key: &Path, dataset: &D) -> Result<()> {
        if self.read_only {
            return Err(FellwatchError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("{} is read-only", key.display()),
            )));
        }
        self.insert(key, dataset.clone());
        Ok(())
    }
}

/// Export writer capturing workbooks instead of writing files
#[derive(Debug, Clone, Default)]
pub struct MemoryExportWriter {
    written: Arc<RwLock<Vec<(PathBuf, ExportWorkbook)>>>,
}

impl MemoryExportWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently written workbook
    pub fn last(&self) -> Option<(PathBuf, ExportWorkbook)> {
        self.written.read().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.written.read().unwrap().len()
    }
}

impl ExportWriter for MemoryExportWriter {
    fn write(&self, path: &Path, workbook: &ExportWorkbook) -> Result<()> {
        self.written.write().unwrap().push((path.to_path_buf(), workbook.clone()));
        Ok(())
    }
}
