use std::path::Path;

use crate::error::Result;
use crate::models::{BoundingBox, Crs, RawLayer, RawTable};

/// Port for reading tabular observation inputs
pub trait TableReader {
    /// Read the first sheet of `path`, skipping `header_offset` rows before the header row
    fn read_table(&self, path: &Path, header_offset: usize) -> Result<RawTable>;

    /// File extensions this reader accepts (lowercase, without dot)
    fn supported_extensions(&self) -> &[&str];
}

/// Port for reading polygon layers
pub trait LayerReader {
    /// Read all polygon features of `path` in the layer's native CRS
    fn read_layer(&self, path: &Path) -> Result<RawLayer>;

    /// Read only the features whose bounding rectangle meets `extent`, given in `extent_crs`.
    ///
    /// Readers that cannot filter while reading fall back to `read_layer`, and
    /// callers must not rely on the result being restricted.
    fn read_layer_within(
        &self,
        path: &Path,
        _extent: &BoundingBox,
        _extent_crs: &Crs,
    ) -> Result<RawLayer> {
        self.read_layer(path)
    }

    /// File extensions this reader accepts (lowercase, without dot)
    fn supported_extensions(&self) -> &[&'static str];

    /// Human-readable format name (e.g., "GeoJSON")
    fn format_name(&self) -> &str;
}
