use chrono::Datelike;
use geo::algorithm::bounding_rect::BoundingRect;

use fellwatch_core::config::{AnalysisConfig, LayerConfig};
use fellwatch_core::error::Result;
use fellwatch_core::models::{AreaId, BoundingBox, LoggingArea, LoggingLayer, RawLayer};
use fellwatch_core::processing::date_of;
use fellwatch_geo::transform::Reprojector;
use fellwatch_geo::validation::validate_area;

/// Spatial and temporal restriction applied to freshly read layers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerFilter {
    /// Extent in the working CRS
    pub bbox: BoundingBox,

    /// Earliest year kept; `None` disables the year filter
    pub min_year: Option<i32>,
}

/// Restricts and reprojects raw polygon layers into the working CRS
pub struct LayerLoader<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> LayerLoader<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Apply the bounding box, reprojection and year filter to `raw`
    pub fn filter_layer(
        &self,
        raw: RawLayer,
        layer: &LayerConfig,
        filter: &LayerFilter,
    ) -> Result<LoggingLayer> {
        let working = &self.config.crs;
        let total = raw.features.len();

        // The bbox is compared in the layer's own CRS, before reprojection
        let native_bbox = Reprojector::new(working, &raw.crs)?.bbox(&filter.bbox)?;
        let to_working = Reprojector::new(&raw.crs, working)?;
        if !to_working.is_identity() {
            tracing::info!(layer = %layer.kind, from = %raw.crs, to = %working, "Reprojecting layer");
        }

        let has_date_column =
            raw.features.iter().any(|f| f.attributes.contains_key(&layer.date_column));
        let min_year = match filter.min_year {
            Some(_) if !has_date_column => {
                tracing::warn!(
                    layer = %layer.kind,
                    column = %layer.date_column,
                    "Date column not found, year filter skipped"
                );
                None
            }
            other => other,
        };

        let mut outside_bbox = 0usize;
        let mut invalid = 0usize;
        let mut too_old = 0usize;
        let mut result = LoggingLayer::new(layer.kind, working.clone(), layer.date_column.clone());

        for feature in raw.features {
            let in_bbox = feature
                .geometry
                .bounding_rect()
                .map(|rect| native_bbox.intersects_rect(&rect))
                .unwrap_or(false);
            if !in_bbox {
                outside_bbox += 1;
                continue;
            }

            let validation = validate_area(&feature.geometry);
            if !validation.is_valid {
                tracing::debug!(
                    layer = %layer.kind,
                    feature = feature.index,
                    reason = validation.summary().unwrap_or_default(),
                    "Skipping invalid geometry"
                );
                invalid += 1;
                continue;
            }

            let date = feature.attributes.get(&layer.date_column).and_then(date_of);
            if let Some(min_year) = min_year {
                if !date.is_some_and(|d| d.year() >= min_year) {
                    too_old += 1;
                    continue;
                }
            }

            result.areas.push(LoggingArea {
                id: AreaId(feature.index),
                kind: layer.kind,
                date,
                geometry: to_working.multipolygon(&feature.geometry)?,
                attributes: feature.attributes,
            });
        }

        tracing::info!(
            layer = %layer.kind,
            total,
            kept = result.len(),
            outside_bbox,
            "Filtered layer to study bounding box"
        );
        if invalid > 0 {
            tracing::warn!(layer = %layer.kind, invalid, "Dropped areas with invalid geometry");
        }
        if let Some(min_year) = min_year {
            if too_old > 0 {
                tracing::info!(
                    layer = %layer.kind,
                    dropped = too_old,
                    min_year,
                    "Dropped areas dated before the first observation year"
                );
            }
        }

        Ok(result)
    }
}
