use std::path::Path;

use crate::error::Result;

/// Port for persisted dataset caches.
///
/// Existence of an entry gates reuse; content is trusted as-is.
pub trait DatasetCache<D> {
    /// Load the dataset stored under `key`, `None` when no entry exists
    fn try_load(&self, key: &Path) -> Result<Option<D>>;

    /// Persist `dataset` under `key`, replacing any previous entry
    fn save(&self, key: &Path, dataset: &D) -> Result<()>;
}
