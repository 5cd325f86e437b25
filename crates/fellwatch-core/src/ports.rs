//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod cache;
pub mod export;
pub mod input;

pub use cache::DatasetCache;
pub use export::ExportWriter;
pub use input::{LayerReader, TableReader};
