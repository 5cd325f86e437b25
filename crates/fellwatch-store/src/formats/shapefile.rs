//! Shapefile layer reader
//!
//! Shapefiles consist of multiple component files (.shp, .shx, .dbf, .prj).
//! The first three must be present; a missing .prj means WGS 84.

use ::shapefile::dbase::{FieldValue as DbaseFieldValue, Record};
use ::shapefile::{PolygonRing, Shape};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use fellwatch_core::error::{FellwatchError, Result};
use fellwatch_core::models::{AttributeValue, BoundingBox, Crs, RawFeature, RawLayer};
use fellwatch_core::ports::LayerReader;

/// Shapefile format reader
pub struct ShapefileLayerReader;

impl LayerReader for ShapefileLayerReader {
    fn read_layer(&self, path: &Path) -> Result<RawLayer> {
        read_shapefile(path, None)
    }

    fn read_layer_within(&self, path: &Path, extent: &BoundingBox, extent_crs: &Crs) -> Result<RawLayer> {
        read_shapefile(path, Some((extent, extent_crs)))
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["shp"]
    }

    fn format_name(&self) -> &str {
        "Shapefile"
    }
}

/// Stream the shapes, dropping those outside `extent` before their record is converted
fn read_shapefile(path: &Path, extent: Option<(&BoundingBox, &Crs)>) -> Result<RawLayer> {
    verify_components(path)?;

    let mut reader =
        ::shapefile::Reader::from_path(path).map_err(|e| format_error(format!(
            "Failed to open {}: {}",
            path.display(),
            e
        )))?;

    let crs = extract_crs(path)?;
    let native = extent
        .map(|(bbox, bbox_crs)| super::native_extent(bbox, bbox_crs, &crs))
        .transpose()?;

    let mut features = Vec::new();
    let mut skipped = 0usize;
    let mut outside = 0usize;
    for (index, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) =
            result.map_err(|e| format_error(format!("Failed to read feature: {}", e)))?;

        let Some(geometry) = shape_to_multipolygon(&shape)? else {
            skipped += 1;
            continue;
        };
        if native.is_some_and(|bbox| !super::meets_extent(&geometry, &bbox)) {
            outside += 1;
            continue;
        }
        features.push(RawFeature {
            index: index as u64,
            geometry,
            attributes: extract_attributes(record),
        });
    }

    if skipped > 0 {
        tracing::warn!(skipped, path = %path.display(), "Skipped non-polygon shapes");
    }
    if native.is_some() {
        tracing::debug!(outside, kept = features.len(), path = %path.display(), "Skipped shapes outside extent");
    }

    Ok(RawLayer { name: super::layer_name(path), crs, features })
}

fn format_error(message: String) -> FellwatchError {
    FellwatchError::Format { format: "Shapefile".to_string(), message }
}

/// Verify that all required Shapefile component files exist
fn verify_components(path: &Path) -> Result<()> {
    let missing: Vec<String> = ["shp", "shx", "dbf"]
        .iter()
        .filter(|ext| !path.with_extension(ext).exists())
        .map(|ext| format!(".{}", ext))
        .collect();

    if !missing.is_empty() {
        return Err(format_error(format!(
            "Missing required component files: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

/// CRS from the .prj file
fn extract_crs(path: &Path) -> Result<Crs> {
    let prj_path = path.with_extension("prj");

    if !prj_path.exists() {
        tracing::warn!(path = %path.display(), "No .prj file, assuming EPSG:4326");
        return Ok(Crs::wgs84());
    }

    let prj_content = fs::read_to_string(&prj_path)
        .map_err(|e| format_error(format!("Failed to read .prj file: {}", e)))?;

    match parse_epsg_from_wkt(&prj_content) {
        Some(epsg) => Ok(Crs::from_epsg(epsg)),
        None => {
            tracing::warn!(
                path = %prj_path.display(),
                "Could not identify CRS in .prj file, assuming EPSG:4326"
            );
            Ok(Crs::wgs84())
        }
    }
}

/// EPSG code of a WKT definition.
///
/// The last `AUTHORITY["EPSG",...]` belongs to the outermost CRS; ESRI-style
/// files without authorities are recognized by name.
fn parse_epsg_from_wkt(wkt: &str) -> Option<u32> {
    const AUTHORITY: &str = "AUTHORITY[\"EPSG\",\"";

    if let Some(start) = wkt.rfind(AUTHORITY) {
        let code_start = start + AUTHORITY.len();
        let code: String =
            wkt[code_start..].chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(code) = code.parse::<u32>() {
            return Some(code);
        }
    }

    if let Some(start) = wkt.find("EPSG:") {
        let code: String = wkt[start + 5..].chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(code) = code.parse::<u32>() {
            return Some(code);
        }
    }

    let upper = wkt.to_uppercase();
    if upper.starts_with("PROJCS[\"SWEREF99_TM\"") || upper.starts_with("PROJCS[\"SWEREF99 TM\"") {
        return Some(3006);
    }
    if upper.starts_with("GEOGCS[\"GCS_WGS_1984\"") || upper.starts_with("GEOGCS[\"WGS 84\"") {
        return Some(4326);
    }

    None
}

/// Polygon shapes become multipolygons; other shape types yield `None`.
///
/// Each outer ring starts a polygon and inner rings attach to the polygon
/// started last.
fn shape_to_multipolygon(shape: &Shape) -> Result<Option<MultiPolygon<f64>>> {
    let rings: Vec<(bool, LineString<f64>)> = match shape {
        Shape::Polygon(polygon) => polygon
            .rings()
            .iter()
            .map(|ring| (is_outer(ring), ring_coords(ring.points().iter().map(|p| (p.x, p.y)))))
            .collect(),
        Shape::PolygonM(polygon) => polygon
            .rings()
            .iter()
            .map(|ring| (is_outer(ring), ring_coords(ring.points().iter().map(|p| (p.x, p.y)))))
            .collect(),
        Shape::PolygonZ(polygon) => polygon
            .rings()
            .iter()
            .map(|ring| (is_outer(ring), ring_coords(ring.points().iter().map(|p| (p.x, p.y)))))
            .collect(),
        Shape::Multipatch(_) => {
            return Err(format_error("Multipatch geometry type is not supported".to_string()))
        }
        _ => return Ok(None),
    };

    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
    for (outer, ring) in rings {
        match polygons.last_mut() {
            Some((_, interiors)) if !outer => interiors.push(ring),
            _ => polygons.push((ring, Vec::new())),
        }
    }

    Ok(Some(MultiPolygon::new(
        polygons.into_iter().map(|(exterior, interiors)| Polygon::new(exterior, interiors)).collect(),
    )))
}

fn is_outer<P>(ring: &PolygonRing<P>) -> bool {
    matches!(ring, PolygonRing::Outer(_))
}

fn ring_coords(points: impl Iterator<Item = (f64, f64)>) -> LineString<f64> {
    LineString::new(points.map(|(x, y)| Coord { x, y }).collect())
}

/// Extract attributes from a DBF record
fn extract_attributes(record: Record) -> BTreeMap<String, AttributeValue> {
    record.into_iter().map(|(name, value)| (name, convert_dbase_value(value))).collect()
}

/// Convert a dBase field value
fn convert_dbase_value(value: DbaseFieldValue) -> AttributeValue {
    match value {
        DbaseFieldValue::Character(Some(s)) => AttributeValue::Text(s.trim().to_string()),
        DbaseFieldValue::Numeric(Some(n)) => AttributeValue::Number(n),
        DbaseFieldValue::Logical(Some(b)) => AttributeValue::Bool(b),
        DbaseFieldValue::Date(Some(date)) => AttributeValue::Text(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        DbaseFieldValue::Float(Some(f)) => AttributeValue::Number(f as f64),
        DbaseFieldValue::Integer(i) => AttributeValue::Number(i as f64),
        DbaseFieldValue::Currency(c) => AttributeValue::Number(c),
        DbaseFieldValue::DateTime(dt) => AttributeValue::Text(format!(
            "{:04}-{:02}-{:02}",
            dt.date().year(),
            dt.date().month(),
            dt.date().day()
        )),
        DbaseFieldValue::Double(d) => AttributeValue::Number(d),
        DbaseFieldValue::Memo(s) => AttributeValue::Text(s),
        DbaseFieldValue::Character(None)
        | DbaseFieldValue::Numeric(None)
        | DbaseFieldValue::Logical(None)
        | DbaseFieldValue::Date(None)
        | DbaseFieldValue::Float(None) => AttributeValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::shapefile::{Point as ShpPoint, Polygon as ShpPolygon};

    #[test]
    fn test_supported_extensions() {
        assert_eq!(ShapefileLayerReader.supported_extensions(), &["shp"]);
        assert_eq!(ShapefileLayerReader.format_name(), "Shapefile");
    }

    #[test]
    fn test_missing_components() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("avverk.shp");
        fs::write(&path, b"").unwrap();

        match ShapefileLayerReader.read_layer(&path) {
            Err(FellwatchError::Format { message, .. }) => {
                assert!(message.contains(".shx"));
                assert!(message.contains(".dbf"));
            }
            other => panic!("expected Format error, got {:?}", other.map(|l| l.name)),
        }
    }

    #[test]
    fn test_parse_epsg_from_wkt() {
        let geographic = r#"GEOGCS["WGS 84",DATUM["WGS_1984"],AUTHORITY["EPSG","4326"]]"#;
        assert_eq!(parse_epsg_from_wkt(geographic), Some(4326));

        // Outermost authority wins over the datum's
        let projected = r#"PROJCS["SWEREF99 TM",GEOGCS["SWEREF99",AUTHORITY["EPSG","4619"]],UNIT["metre",1],AUTHORITY["EPSG","3006"]]"#;
        assert_eq!(parse_epsg_from_wkt(projected), Some(3006));

        let esri = r#"PROJCS["SWEREF99_TM",GEOGCS["GCS_SWEREF99",DATUM["D_SWEREF99"]]]"#;
        assert_eq!(parse_epsg_from_wkt(esri), Some(3006));

        assert_eq!(parse_epsg_from_wkt("EPSG:3857"), Some(3857));
        assert_eq!(parse_epsg_from_wkt("LOCAL_CS[\"unknown\"]"), None);
    }

    #[test]
    fn test_polygon_rings_grouped() {
        let shape = Shape::Polygon(ShpPolygon::with_rings(vec![
            PolygonRing::Outer(vec![
                ShpPoint::new(0.0, 0.0),
                ShpPoint::new(0.0, 10.0),
                ShpPoint::new(10.0, 10.0),
                ShpPoint::new(10.0, 0.0),
                ShpPoint::new(0.0, 0.0),
            ]),
            PolygonRing::Inner(vec![
                ShpPoint::new(2.0, 2.0),
                ShpPoint::new(4.0, 2.0),
                ShpPoint::new(4.0, 4.0),
                ShpPoint::new(2.0, 4.0),
                ShpPoint::new(2.0, 2.0),
            ]),
            PolygonRing::Outer(vec![
                ShpPoint::new(20.0, 0.0),
                ShpPoint::new(20.0, 5.0),
                ShpPoint::new(25.0, 5.0),
                ShpPoint::new(25.0, 0.0),
                ShpPoint::new(20.0, 0.0),
            ]),
        ]));

        let multi = shape_to_multipolygon(&shape).unwrap().unwrap();
        assert_eq!(multi.0.len(), 2);
        assert_eq!(multi.0[0].interiors().len(), 1);
        assert!(multi.0[1].interiors().is_empty());
    }

    #[test]
    fn test_point_shape_skipped() {
        let shape = Shape::Point(ShpPoint::new(1.0, 2.0));
        assert!(shape_to_multipolygon(&shape).unwrap().is_none());
    }

    #[test]
    fn test_dbase_values() {
        assert_eq!(
            convert_dbase_value(DbaseFieldValue::Character(Some("  A-1 ".to_string()))),
            AttributeValue::Text("A-1".to_string())
        );
        assert_eq!(convert_dbase_value(DbaseFieldValue::Numeric(None)), AttributeValue::Null);
        assert_eq!(convert_dbase_value(DbaseFieldValue::Integer(7)), AttributeValue::Number(7.0));
    }
}
