//! Common validation utilities.

use validator::ValidationError;

/// Minimum number of vertices for a zone boundary to form a closed polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Upper bound of a zone's active alert count. Matches the `INTEGER`
/// column the count is stored in.
pub const MAX_ACTIVE_ALERTS: u32 = i32::MAX as u32;

/// Maximum length of a zone name, in characters.
pub const MAX_ZONE_NAME_LENGTH: usize = 100;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates a zone name: non-empty after trimming and at most
/// [`MAX_ZONE_NAME_LENGTH`] characters.
pub fn validate_zone_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("zone_name_blank");
        err.message = Some("Zone name is required".into());
        return Err(err);
    }
    if trimmed.chars().count() > MAX_ZONE_NAME_LENGTH {
        let mut err = ValidationError::new("zone_name_length");
        err.message = Some("Zone name must be at most 100 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that a boundary has either no vertices (unset) or enough
/// vertices to close a polygon.
pub fn validate_vertex_count(count: usize) -> Result<(), ValidationError> {
    if count == 0 || count >= MIN_POLYGON_VERTICES {
        Ok(())
    } else {
        let mut err = ValidationError::new("polygon_vertices");
        err.message = Some("At least 3 points are required to create a zone".into());
        Err(err)
    }
}

/// Validates an explicitly set active alert count.
pub fn validate_active_alerts(count: u32) -> Result<(), ValidationError> {
    if count <= MAX_ACTIVE_ALERTS {
        Ok(())
    } else {
        let mut err = ValidationError::new("active_alerts_range");
        err.message = Some("Active alerts must be at most 2147483647".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_active_alerts() {
        assert!(validate_active_alerts(0).is_ok());
        assert!(validate_active_alerts(MAX_ACTIVE_ALERTS).is_ok());
        assert!(validate_active_alerts(MAX_ACTIVE_ALERTS + 1).is_err());
        assert!(validate_active_alerts(u32::MAX).is_err());
    }

    // Latitude tests
    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.1).is_err());
        assert!(validate_latitude(-90.1).is_err());
    }

    #[test]
    fn test_validate_latitude_rejects_nan() {
        assert!(validate_latitude(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_latitude_error_message() {
        let err = validate_latitude(100.0).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Latitude must be between -90 and 90"
        );
    }

    // Longitude tests
    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.1).is_err());
        assert!(validate_longitude(-180.1).is_err());
    }

    #[test]
    fn test_validate_longitude_error_message() {
        let err = validate_longitude(200.0).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Longitude must be between -180 and 180"
        );
    }

    // Zone name tests
    #[test]
    fn test_validate_zone_name() {
        assert!(validate_zone_name("North pasture").is_ok());
        assert!(validate_zone_name("  Corral  ").is_ok());
        assert!(validate_zone_name("").is_err());
        assert!(validate_zone_name("   \t").is_err());
    }

    #[test]
    fn test_validate_zone_name_length() {
        let long = "a".repeat(MAX_ZONE_NAME_LENGTH + 1);
        let err = validate_zone_name(&long).unwrap_err();
        assert_eq!(err.code, "zone_name_length");

        let exact = "a".repeat(MAX_ZONE_NAME_LENGTH);
        assert!(validate_zone_name(&exact).is_ok());
    }

    #[test]
    fn test_validate_zone_name_blank_code() {
        let err = validate_zone_name(" ").unwrap_err();
        assert_eq!(err.code, "zone_name_blank");
    }

    // Vertex count tests
    #[test]
    fn test_validate_vertex_count() {
        assert!(validate_vertex_count(0).is_ok());
        assert!(validate_vertex_count(1).is_err());
        assert!(validate_vertex_count(2).is_err());
        assert!(validate_vertex_count(3).is_ok());
        assert!(validate_vertex_count(12).is_ok());
    }
}
