//! GeoJSON-backed dataset cache
//!
//! Observations and logging layers are stored as FeatureCollections. The
//! collection carries its CRS and dataset metadata as foreign members so a
//! cache file is self-describing:
//!
//! ```json
//! {"type": "FeatureCollection", "crs": "EPSG:3006", "dataset": "observations",
//!  "columns": ["Artnamn", "Ost", "Nord"], "features": [...]}
//! ```

use geojson::{feature::Id, Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use fellwatch_core::error::{FellwatchError, Result};
use fellwatch_core::models::{
    AreaId, AttributeValue, Crs, LayerKind, LoggingArea, LoggingLayer, Observation, ObservationId,
    ObservationSet,
};
use fellwatch_core::ports::DatasetCache;
use fellwatch_core::processing::date_of;
use fellwatch_geo::models::{from_multipolygon, from_point, to_multipolygon, to_point};

use crate::formats::geojson::crs_from_member;

const OBSERVATIONS: &str = "observations";
const LOGGING_LAYER: &str = "logging_layer";

// Reserved observation properties; input columns never start with '_'
const SOURCE_KEY: &str = "_source";
const ACCURACY_KEY: &str = "_accuracy";
const QUANTITY_KEY: &str = "_quantity";

/// File cache storing datasets as GeoJSON
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonCache;

impl GeoJsonCache {
    pub fn new() -> Self {
        Self
    }

    fn read_collection(path: &Path, expected: &str) -> Result<Option<CachedCollection>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let collection = match content.parse::<GeoJson>() {
            Ok(GeoJson::FeatureCollection(fc)) => fc,
            Ok(_) => return Err(cache_error(path, "not a FeatureCollection")),
            Err(e) => return Err(cache_error(path, e)),
        };

        let members = collection.foreign_members.clone().unwrap_or_default();

        let dataset = members.get("dataset").and_then(JsonValue::as_str).unwrap_or_default();
        if dataset != expected {
            return Err(cache_error(
                path,
                format!("holds '{}' data, expected '{}'", dataset, expected),
            ));
        }

        let crs = members
            .get("crs")
            .and_then(crs_from_member)
            .ok_or_else(|| cache_error(path, "missing or invalid 'crs' member"))?;

        Ok(Some(CachedCollection { crs, members, features: collection.features }))
    }

    fn write_collection(path: &Path, members: JsonObject, features: Vec<Feature>) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let collection = GeoJson::FeatureCollection(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(members),
        });

        fs::write(path, collection.to_string())?;
        Ok(())
    }
}

struct CachedCollection {
    crs: Crs,
    members: JsonObject,
    features: Vec<Feature>,
}

fn cache_error(path: &Path, reason: impl ToString) -> FellwatchError {
    FellwatchError::Cache { path: path.to_path_buf(), reason: reason.to_string() }
}

fn feature_id(feature: &Feature, path: &Path) -> Result<u64> {
    match &feature.id {
        Some(Id::Number(n)) => n.as_u64().ok_or_else(|| cache_error(path, "feature id is not an integer")),
        Some(Id::String(s)) => s.parse().map_err(|_| cache_error(path, "feature id is not an integer")),
        None => Err(cache_error(path, "feature without id")),
    }
}

fn properties_of(feature: &Feature) -> BTreeMap<String, AttributeValue> {
    feature
        .properties
        .as_ref()
        .map(|props| props.iter().map(|(k, v)| (k.clone(), AttributeValue::from_json(v))).collect())
        .unwrap_or_default()
}

fn properties_from(attributes: &BTreeMap<String, AttributeValue>) -> JsonObject {
    attributes.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
}

impl DatasetCache<ObservationSet> for GeoJsonCache {
    fn try_load(&self, key: &Path) -> Result<Option<ObservationSet>> {
        let Some(cached) = Self::read_collection(key, OBSERVATIONS)? else {
            return Ok(None);
        };

        let columns = cached
            .members
            .get("columns")
            .and_then(JsonValue::as_array)
            .map(|cols| cols.iter().filter_map(|c| c.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        let observations = cached
            .features
            .iter()
            .map(|feature| {
                let geometry =
                    feature.geometry.as_ref().ok_or_else(|| cache_error(key, "feature without geometry"))?;
                let point = to_point(geometry).map_err(|e| cache_error(key, e))?;

                let mut fields = properties_of(feature);
                let source = fields
                    .remove(SOURCE_KEY)
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                let accuracy = fields.remove(ACCURACY_KEY).and_then(|v| v.as_f64());
                let quantity = fields.remove(QUANTITY_KEY).and_then(|v| v.as_f64());

                Ok(Observation {
                    id: ObservationId(feature_id(feature, key)?),
                    x: point.x(),
                    y: point.y(),
                    accuracy,
                    quantity,
                    source,
                    fields,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(ObservationSet::new(cached.crs, columns, observations)))
    }

    fn save(&self, key: &Path, dataset: &ObservationSet) -> Result<()> {
        let mut members = JsonObject::new();
        members.insert("dataset".to_string(), JsonValue::from(OBSERVATIONS));
        members.insert("crs".to_string(), JsonValue::from(dataset.crs.identifier()));
        members.insert("columns".to_string(), JsonValue::from(dataset.columns.clone()));

        let features = dataset
            .iter()
            .map(|obs| {
                let mut properties = properties_from(&obs.fields);
                properties.insert(SOURCE_KEY.to_string(), JsonValue::from(obs.source.clone()));
                properties.insert(
                    ACCURACY_KEY.to_string(),
                    AttributeValue::from(obs.accuracy).to_json(),
                );
                properties.insert(
                    QUANTITY_KEY.to_string(),
                    AttributeValue::from(obs.quantity).to_json(),
                );

                Feature {
                    bbox: None,
                    geometry: Some(from_point(&obs.point())),
                    id: Some(Id::Number(obs.id.0.into())),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        Self::write_collection(key, members, features)?;
        tracing::debug!(path = %key.display(), count = dataset.len(), "Cached observations");
        Ok(())
    }
}

impl DatasetCache<LoggingLayer> for GeoJsonCache {
    fn try_load(&self, key: &Path) -> Result<Option<LoggingLayer>> {
        let Some(cached) = Self::read_collection(key, LOGGING_LAYER)? else {
            return Ok(None);
        };

        let kind = cached
            .members
            .get("layer")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| cache_error(key, "missing 'layer' member"))?
            .parse::<LayerKind>()
            .map_err(|e| cache_error(key, e))?;

        let date_column = cached
            .members
            .get("date_column")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| cache_error(key, "missing 'date_column' member"))?
            .to_string();

        let mut layer = LoggingLayer::new(kind, cached.crs, date_column);
        for feature in &cached.features {
            let geometry = feature
                .geometry
                .as_ref()
                .map(to_multipolygon)
                .transpose()
                .map_err(|e| cache_error(key, e))?
                .flatten()
                .ok_or_else(|| cache_error(key, "feature without polygon geometry"))?;

            let attributes = properties_of(feature);
            let date = attributes.get(&layer.date_column).and_then(date_of);

            layer.areas.push(LoggingArea {
                id: AreaId(feature_id(feature, key)?),
                kind,
                date,
                geometry,
                attributes,
            });
        }

        Ok(Some(layer))
    }

    fn save(&self, key: &Path, dataset: &LoggingLayer) -> Result<()> {
        let mut members = JsonObject::new();
        members.insert("dataset".to_string(), JsonValue::from(LOGGING_LAYER));
        members.insert("crs".to_string(), JsonValue::from(dataset.crs.identifier()));
        members.insert("layer".to_string(), JsonValue::from(dataset.kind.as_str()));
        members.insert("date_column".to_string(), JsonValue::from(dataset.date_column.clone()));

        let features = dataset
            .areas
            .iter()
            .map(|area| Feature {
                bbox: None,
                geometry: Some(from_multipolygon(&area.geometry)),
                id: Some(Id::Number(area.id.0.into())),
                properties: Some(properties_from(&area.attributes)),
                foreign_members: None,
            })
            .collect();

        Self::write_collection(key, members, features)?;
        tracing::debug!(path = %key.display(), layer = %dataset.kind, count = dataset.len(), "Cached logging layer");
        Ok(())
    }
}
