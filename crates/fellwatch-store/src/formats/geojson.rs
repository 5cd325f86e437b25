//! GeoJSON layer reader

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use fellwatch_core::error::{FellwatchError, Result};
use fellwatch_core::models::{AttributeValue, BoundingBox, Crs, RawFeature, RawLayer};
use fellwatch_core::ports::LayerReader;
use fellwatch_geo::models::to_multipolygon;

/// GeoJSON format reader
pub struct GeoJsonLayerReader;

impl LayerReader for GeoJsonLayerReader {
    fn read_layer(&self, path: &Path) -> Result<RawLayer> {
        let (features, crs) = extract_features_and_crs(&parse_file(path)?)?;
        Ok(RawLayer { name: super::layer_name(path), crs, features })
    }

    fn read_layer_within(&self, path: &Path, extent: &BoundingBox, extent_crs: &Crs) -> Result<RawLayer> {
        let (mut features, crs) = extract_features_and_crs(&parse_file(path)?)?;
        let native = super::native_extent(extent, extent_crs, &crs)?;

        let total = features.len();
        features.retain(|feature| super::meets_extent(&feature.geometry, &native));
        tracing::debug!(outside = total - features.len(), kept = features.len(), path = %path.display(), "Skipped features outside extent");

        Ok(RawLayer { name: super::layer_name(path), crs, features })
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["json", "geojson"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }
}

fn parse_file(path: &Path) -> Result<geojson::GeoJson> {
    let content = fs::read_to_string(path)?;
    content.parse().map_err(|e| FellwatchError::Format {
        format: "GeoJSON".to_string(),
        message: format!("Failed to parse {}: {}", path.display(), e),
    })
}

/// Polygon features and declared CRS, defaulting to WGS 84
fn extract_features_and_crs(geojson: &geojson::GeoJson) -> Result<(Vec<RawFeature>, Crs)> {
    match geojson {
        geojson::GeoJson::FeatureCollection(fc) => {
            let crs = fc
                .foreign_members
                .as_ref()
                .and_then(|fm| fm.get("crs"))
                .and_then(crs_from_member)
                .unwrap_or_else(Crs::wgs84);

            let mut features = Vec::with_capacity(fc.features.len());
            let mut skipped = 0usize;
            for (idx, feature) in fc.features.iter().enumerate() {
                match convert_feature(feature, idx as u64)? {
                    Some(f) => features.push(f),
                    None => skipped += 1,
                }
            }

            if skipped > 0 {
                tracing::warn!(skipped, "Skipped features without polygon geometry");
            }

            Ok((features, crs))
        }
        geojson::GeoJson::Feature(feature) => {
            let features = convert_feature(feature, 0)?.into_iter().collect();
            Ok((features, Crs::wgs84()))
        }
        geojson::GeoJson::Geometry(geometry) => {
            let features = to_multipolygon(geometry)?
                .map(|geometry| RawFeature { index: 0, geometry, attributes: BTreeMap::new() })
                .into_iter()
                .collect();
            Ok((features, Crs::wgs84()))
        }
    }
}

/// Convert a GeoJSON feature, `None` when it has no polygonal geometry
fn convert_feature(feature: &geojson::Feature, index: u64) -> Result<Option<RawFeature>> {
    let Some(geometry) = feature.geometry.as_ref() else {
        return Ok(None);
    };
    let Some(geometry) = to_multipolygon(geometry)? else {
        return Ok(None);
    };

    let attributes = feature
        .properties
        .as_ref()
        .map(|props| {
            props.iter().map(|(k, v)| (k.clone(), AttributeValue::from_json(v))).collect()
        })
        .unwrap_or_default();

    Ok(Some(RawFeature { index, geometry, attributes }))
}

/// Accepts both `"EPSG:3006"` and the named-CRS object form
pub(crate) fn crs_from_member(crs: &serde_json::Value) -> Option<Crs> {
    match crs {
        serde_json::Value::String(name) => Crs::parse(name),
        serde_json::Value::Object(_) => crs
            .get("properties")
            .and_then(|props| props.get("name"))
            .and_then(|name| name.as_str())
            .and_then(Crs::parse),
        _ => None,
    }
}
