//! Fellwatch Core - Domain models, configuration, and port definitions
//!
//! This crate contains the domain types shared by every stage of the
//! observation/logging correlation pipeline, together with the port traits
//! that the storage adapters implement.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;
pub mod processing;

pub use error::{FellwatchError, Result};
