//! Input format readers
//!
//! Each polygon format implements the `LayerReader` port, and the
//! `LayerReaderRegistry` dispatches to the right reader by file extension.
//! Observation spreadsheets are read through the `TableReader` port.

use std::path::Path;

use geo::algorithm::bounding_rect::BoundingRect;
use geo::MultiPolygon;

use fellwatch_core::error::{FellwatchError, Result};
use fellwatch_core::models::{BoundingBox, Crs, RawLayer};
use fellwatch_core::ports::LayerReader;
use fellwatch_geo::transform::Reprojector;

pub mod geojson;
pub mod shapefile;
pub mod xlsx;

pub use self::geojson::GeoJsonLayerReader;
pub use self::shapefile::ShapefileLayerReader;
pub use self::xlsx::XlsxTableReader;

/// Lowercase extension of `path`, if any
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(str::to_lowercase)
}

/// File stem used as the layer name
pub(crate) fn layer_name(path: &Path) -> String {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string()
}

/// `extent` expressed in the layer's native CRS
pub(crate) fn native_extent(extent: &BoundingBox, extent_crs: &Crs, native: &Crs) -> Result<BoundingBox> {
    Reprojector::new(extent_crs, native)?.bbox(extent)
}

/// Whether the bounding rectangle of `geometry` meets `extent`
pub(crate) fn meets_extent(geometry: &MultiPolygon<f64>, extent: &BoundingBox) -> bool {
    geometry.bounding_rect().is_some_and(|rect| extent.intersects_rect(&rect))
}

/// Central registry for layer readers
pub struct LayerReaderRegistry {
    readers: Vec<Box<dyn LayerReader>>,
    extensions: Vec<&'static str>,
}

impl LayerReaderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { readers: Vec::new(), extensions: Vec::new() }
    }

    /// Registry with the GeoJSON and Shapefile readers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(GeoJsonLayerReader));
        registry.register(Box::new(ShapefileLayerReader));
        registry
    }

    /// Register a layer reader
    pub fn register(&mut self, reader: Box<dyn LayerReader>) {
        self.extensions.extend(reader.supported_extensions().iter().copied());
        self.readers.push(reader);
    }

    /// Detect format and return the reader for this file extension
    pub fn detect_format(&self, path: &Path) -> Result<&dyn LayerReader> {
        let extension = extension_of(path).ok_or_else(|| FellwatchError::UnsupportedFormat {
            extension: "none".to_string(),
            supported: self.supported_formats(),
        })?;

        self.readers
            .iter()
            .find(|r| r.supported_extensions().contains(&extension.as_str()))
            .map(|r| r.as_ref())
            .ok_or_else(|| FellwatchError::UnsupportedFormat {
                extension,
                supported: self.supported_formats(),
            })
    }

    /// Read `path` with the matching reader
    pub fn read(&self, path: &Path) -> Result<RawLayer> {
        let reader = self.detect_format(path)?;
        tracing::debug!(path = %path.display(), format = reader.format_name(), "Reading layer");
        reader.read_layer(path)
    }

    /// Get list of all supported format extensions
    pub fn supported_formats(&self) -> Vec<String> {
        self.extensions.iter().map(|s| s.to_string()).collect()
    }
}

impl LayerReader for LayerReaderRegistry {
    fn read_layer(&self, path: &Path) -> Result<RawLayer> {
        self.read(path)
    }

    fn read_layer_within(&self, path: &Path, extent: &BoundingBox, extent_crs: &Crs) -> Result<RawLayer> {
        let reader = self.detect_format(path)?;
        tracing::debug!(path = %path.display(), format = reader.format_name(), "Reading layer within extent");
        reader.read_layer_within(path, extent, extent_crs)
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &self.extensions
    }

    fn format_name(&self) -> &str {
        "Auto-detected"
    }
}

impl Default for LayerReaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_detect_format() {
        let registry = LayerReaderRegistry::with_defaults();

        let reader = registry.detect_format(&PathBuf::from("maps/sksUtfordAvverk.geojson")).unwrap();
        assert_eq!(reader.format_name(), "GeoJSON");

        let reader = registry.detect_format(&PathBuf::from("maps/avverk.SHP")).unwrap();
        assert_eq!(reader.format_name(), "Shapefile");
    }

    #[test]
    fn test_unsupported_format() {
        let registry = LayerReaderRegistry::with_defaults();

        match registry.detect_format(&PathBuf::from("maps/avverk.gpkg")) {
            Err(FellwatchError::UnsupportedFormat { extension, supported }) => {
                assert_eq!(extension, "gpkg");
                assert!(supported.contains(&"shp".to_string()));
                assert!(supported.contains(&"geojson".to_string()));
            }
            _ => panic!("expected UnsupportedFormat"),
        }

        assert!(registry.detect_format(&PathBuf::from("maps/noext")).is_err());
    }

    #[test]
    fn test_registry_as_reader() {
        let registry = LayerReaderRegistry::with_defaults();
        assert_eq!(registry.supported_extensions(), &["json", "geojson", "shp"]);
        assert!(registry.read_layer(&PathBuf::from("maps/avverk.gpkg")).is_err());
    }
}
