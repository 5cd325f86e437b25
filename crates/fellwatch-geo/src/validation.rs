use geo::{CoordsIter, LineString, MultiPolygon};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    /// First error reason, for log lines
    pub fn summary(&self) -> Option<&str> {
        self.errors.first().map(|e| e.reason.as_str())
    }
}

/// Check that an area geometry can take part in matching
pub fn validate_area(geometry: &MultiPolygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if geometry.0.is_empty() {
        result.add_error("MultiPolygon".to_string(), "Geometry is empty".to_string());
        return result;
    }

    if geometry.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        result.add_error("MultiPolygon".to_string(), "Coordinates must be finite".to_string());
    }

    for (i, polygon) in geometry.iter().enumerate() {
        validate_ring(&mut result, &format!("Polygon {} exterior", i), polygon.exterior());
        for (j, interior) in polygon.interiors().iter().enumerate() {
            validate_ring(&mut result, &format!("Polygon {} interior {}", i, j), interior);
        }
    }

    result
}

fn validate_ring(result: &mut ValidationResult, location: &str, ring: &LineString<f64>) {
    if ring.0.len() < 4 {
        result.add_error(
            location.to_string(),
            format!("Ring must have at least 4 coordinates, found {}", ring.0.len()),
        );
    } else if !ring.is_closed() {
        result.add_error(location.to_string(), "Ring must be closed".to_string());
    }
}
