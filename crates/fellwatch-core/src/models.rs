pub mod attribute;
pub mod export;
pub mod geometry;
pub mod logging_area;
pub mod matching;
pub mod observation;
pub mod table;

pub use attribute::AttributeValue;
pub use export::{ExportSheet, ExportWorkbook};
pub use geometry::{BoundingBox, Crs};
pub use logging_area::{AreaId, LayerKind, LoggingArea, LoggingLayer};
pub use matching::{percentage, DedupPolicy, LayerResult, MatchRecord, MatchStatus};
pub use observation::{Observation, ObservationId, ObservationSet};
pub use table::{Cell, RawFeature, RawLayer, RawTable};
