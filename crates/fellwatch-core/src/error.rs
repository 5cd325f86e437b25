//! Error types for Fellwatch

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FellwatchError {
    // Input errors
    #[error("No observation files found in {dir}")]
    NoInputFiles { dir: PathBuf },

    #[error("Observation set is empty; a study extent needs at least one observation")]
    EmptyObservations,

    #[error("Required column '{column}' missing in {file}")]
    MissingColumn { file: String, column: String },

    // Format errors
    #[error("{format} error: {message}")]
    Format { format: String, message: String },

    #[error("Unsupported format: {extension}. Supported formats: {}", supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    // Cache errors
    #[error("Cache file {path} is unreadable: {reason}")]
    Cache { path: PathBuf, reason: String },

    // CRS errors
    #[error("Failed to project from {from} to {to}: {reason}")]
    Projection {
        from: String,
        to: String,
        reason: String,
    },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Output errors
    #[error("Cannot create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Export failed: {0}")]
    Export(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, FellwatchError>;
