//! Geometry preview handlers for unsaved drawings.

use axum::Json;
use domain::models::{AreaPreviewRequest, AreaResponse, GeoPoint};

use crate::error::ApiError;

/// Area, centroid and map center of a drawing that has not been saved.
///
/// POST /api/v1/geometry/area
pub async fn area_preview(
    Json(request): Json<AreaPreviewRequest>,
) -> Result<Json<AreaResponse>, ApiError> {
    let points = request
        .points
        .into_iter()
        .map(GeoPoint::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(AreaResponse::for_bounds(None, &points)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::PointInput;
    use domain::services::DEFAULT_MAP_CENTER;

    fn request(points: &[(f64, f64)]) -> Json<AreaPreviewRequest> {
        Json(AreaPreviewRequest {
            points: points
                .iter()
                .map(|&(lat, lng)| PointInput { lat, lng })
                .collect(),
        })
    }

    #[tokio::test]
    async fn test_area_preview_triangle() {
        let triangle = request(&[(0.0, 0.0), (4.0, 0.0), (0.0, 3.0)]);
        let Json(area) = tokio_test::assert_ok!(area_preview(triangle).await);
        assert_eq!(area.vertices, 3);
        assert!((area.area_deg2 - 6.0).abs() < 1e-9);
        assert!(area.area_km2 > 0.0);
        assert!(area.zone_id.is_none());
    }

    #[tokio::test]
    async fn test_area_preview_empty_centers_on_default() {
        let Json(area) = tokio_test::assert_ok!(area_preview(request(&[])).await);
        assert_eq!(area.area_deg2, 0.0);
        assert!(area.centroid.is_none());
        assert_eq!(area.map_center, DEFAULT_MAP_CENTER);
    }

    #[tokio::test]
    async fn test_area_preview_rejects_out_of_range_point() {
        let result = area_preview(request(&[(0.0, 0.0), (91.0, 0.0), (0.0, 3.0)])).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
