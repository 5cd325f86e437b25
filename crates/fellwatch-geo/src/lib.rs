//! Fellwatch Geo - Geometry, CRS, and spatial operations
//!
//! This crate handles the geometric side of the analysis: GeoJSON geometry
//! conversion, reprojection between CRSs, polygon validation, the study
//! extent and the R-tree used to find candidate areas.

pub mod index;
pub mod models;
pub mod spatial;
pub mod transform;
pub mod validation;

pub use index::AreaIndex;
pub use spatial::StudyExtent;
pub use transform::Reprojector;
