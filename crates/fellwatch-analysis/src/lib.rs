//! Fellwatch Analysis - Loading, matching and reporting
//!
//! The stages of one run, leaves first: the observation loader, the logging
//! layer loader, the spatial matcher and the reporter. `AnalysisPipeline`
//! drives them against the storage ports.

pub mod loader;
pub mod matcher;
pub mod pipeline;
pub mod report;

pub use loader::{discover_input_files, LayerFilter, LayerLoader, ObservationLoader};
pub use matcher::{merge_matches, Pairings, SpatialMatcher};
pub use pipeline::{AnalysisOutcome, AnalysisPipeline};
pub use report::{build_export, LayerSummary, Report};
