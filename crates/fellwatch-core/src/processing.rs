//! Field-level coercion shared by the loaders.
//!
//! Coercion never fails: values that cannot be interpreted become missing.

pub mod coerce;
pub mod dates;

pub use coerce::{to_number, to_number_value, to_text_value};
pub use dates::{date_of, parse_date, year_of};
