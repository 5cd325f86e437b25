//! Fellwatch Store - Input, cache and export adapters
//!
//! This crate implements the ports defined in `fellwatch-core`: spreadsheet
//! and polygon layer readers, the GeoJSON dataset cache, the spreadsheet
//! export writer, and in-memory variants used in tests.

pub mod cache;
pub mod export;
pub mod formats;
pub mod memory;

pub use cache::GeoJsonCache;
pub use export::XlsxExportWriter;
pub use formats::{GeoJsonLayerReader, LayerReaderRegistry, ShapefileLayerReader, XlsxTableReader};
