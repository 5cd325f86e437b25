//! Conversions between GeoJSON geometries and `geo` types

use fellwatch_core::error::{FellwatchError, Result};
use geo::{Geometry as GeoGeometry, MultiPolygon, Point};

fn format_error(message: String) -> FellwatchError {
    FellwatchError::Format { format: "GeoJSON".to_string(), message }
}

/// Convert a GeoJSON geometry to a `MultiPolygon`.
///
/// Polygons are promoted to a single-member multipolygon. Returns `Ok(None)`
/// for non-polygonal geometry types.
pub fn to_multipolygon(geometry: &geojson::Geometry) -> Result<Option<MultiPolygon<f64>>> {
    let converted = GeoGeometry::<f64>::try_from(geometry.value.clone())
        .map_err(|e| format_error(format!("Invalid geometry: {}", e)))?;

    Ok(match converted {
        GeoGeometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon])),
        GeoGeometry::MultiPolygon(multi) => Some(multi),
        _ => None,
    })
}

/// Convert a GeoJSON geometry to a `Point`
pub fn to_point(geometry: &geojson::Geometry) -> Result<Point<f64>> {
    match GeoGeometry::<f64>::try_from(geometry.value.clone()) {
        Ok(GeoGeometry::Point(point)) => Ok(point),
        Ok(other) => Err(format_error(format!("Expected a Point geometry, found {}", kind_of(&other)))),
        Err(e) => Err(format_error(format!("Invalid geometry: {}", e))),
    }
}

pub fn from_multipolygon(multi: &MultiPolygon<f64>) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(multi))
}

pub fn from_point(point: &Point<f64>) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(point))
}

fn kind_of(geometry: &GeoGeometry<f64>) -> &'static str {
    match geometry {
        GeoGeometry::Point(_) => "Point",
        GeoGeometry::Line(_) => "Line",
        GeoGeometry::LineString(_) => "LineString",
        GeoGeometry::Polygon(_) => "Polygon",
        GeoGeometry::MultiPoint(_) => "MultiPoint",
        GeoGeometry::MultiLineString(_) => "MultiLineString",
        GeoGeometry::MultiPolygon(_) => "MultiPolygon",
        GeoGeometry::GeometryCollection(_) => "GeometryCollection",
        GeoGeometry::Rect(_) => "Rect",
        GeoGeometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn parse(json: &str) -> geojson::Geometry {
        json.parse::<geojson::Geometry>().unwrap()
    }

    #[test]
    fn test_polygon_promoted_to_multipolygon() {
        let geometry =
            parse(r#"{"type":"Polygon","coordinates":[[[0,0],[10,0],[10,10],[0,10],[0,0]]]}"#);
        let multi = to_multipolygon(&geometry).unwrap().unwrap();
        assert_eq!(multi.0.len(), 1);
        assert_eq!(multi.0[0].exterior().0.len(), 5);
    }

    #[test]
    fn test_non_polygonal_geometry_is_skipped() {
        let geometry = parse(r#"{"type":"LineString","coordinates":[[0,0],[1,1]]}"#);
        assert!(to_multipolygon(&geometry).unwrap().is_none());
    }

    #[test]
    fn test_point_conversion() {
        let point = Point::new(674032.0, 6580822.0);
        let geometry = from_point(&point);
        assert_eq!(to_point(&geometry).unwrap(), point);

        let not_point =
            parse(r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#);
        assert!(to_point(&not_point).is_err());
    }

    #[test]
    fn test_multipolygon_to_geojson() {
        let multi = MultiPolygon::new(vec![
            polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 0.0)],
        ]);
        let geometry = from_multipolygon(&multi);
        assert!(matches!(geometry.value, geojson::Value::MultiPolygon(_)));
        assert_eq!(to_multipolygon(&geometry).unwrap().unwrap(), multi);
    }
}
