//! Request and response payloads for the zone HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ZoneError;
use crate::models::{Alert, AnimalDetection, GeoPoint, Zone, ZoneId, ZonePatch, ZoneStatus};
use crate::services::{
    area, detections_by_zone, ZoneAlertSummary, ZoneDirectory, ZoneRef, ZoneSnapshot,
};

/// A map click as sent by clients: `{ "lat": .., "lng": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointInput {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lng: f64,
}

impl TryFrom<PointInput> for GeoPoint {
    type Error = ZoneError;

    fn try_from(p: PointInput) -> Result<Self, Self::Error> {
        GeoPoint::new(p.lat, p.lng)
    }
}

/// Request payload for creating a zone from a drawing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateZoneRequest {
    pub name: String,
    #[serde(default)]
    pub status: ZoneStatus,
    pub points: Vec<PointInput>,
}

/// Request payload for updating a zone (partial update).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateZoneRequest {
    pub name: Option<String>,
    pub status: Option<ZoneStatus>,
    pub points: Option<Vec<PointInput>>,
    pub active_alerts: Option<u32>,
}

impl UpdateZoneRequest {
    /// Converts into a patch, checking every coordinate. A status change
    /// stamps or clears `last_patrolled_at` like `set_status` does.
    pub fn into_patch(self) -> Result<ZonePatch, ZoneError> {
        let bounds = self
            .points
            .map(|points| {
                points
                    .into_iter()
                    .map(GeoPoint::try_from)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;
        let base = self
            .status
            .map(|status| ZonePatch::status(status, Utc::now()))
            .unwrap_or_default();
        Ok(ZonePatch {
            name: self.name,
            bounds,
            active_alerts: self.active_alerts,
            ..base
        })
    }
}

/// Request payload for changing the patrol status.
#[derive(Debug, Clone, Deserialize)]
pub struct SetZoneStatusRequest {
    pub status: ZoneStatus,
}

/// Request payload for adjusting the active alert count.
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustAlertsRequest {
    pub delta: i64,
}

/// Query parameters for listing zones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListZonesQuery {
    pub status: Option<ZoneStatus>,
    #[serde(default)]
    pub with_alerts: bool,
}

/// Response payload for a single zone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneResponse {
    pub id: ZoneId,
    pub name: String,
    pub status: ZoneStatus,
    pub bounds: Vec<GeoPoint>,
    pub active_alerts: u32,
    pub last_patrolled_at: Option<DateTime<Utc>>,
    pub complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Zone> for ZoneResponse {
    fn from(z: Zone) -> Self {
        Self {
            complete: z.is_complete(),
            id: z.id,
            name: z.name,
            status: z.status,
            bounds: z.bounds,
            active_alerts: z.active_alerts,
            last_patrolled_at: z.last_patrolled_at,
            created_at: z.created_at,
            updated_at: z.updated_at,
        }
    }
}

/// Response for listing zones, and the payload of each stream event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListZonesResponse {
    pub zones: Vec<ZoneResponse>,
    pub total: usize,
    pub stale: bool,
    pub version: u64,
}

impl ListZonesResponse {
    pub fn from_snapshot(snapshot: &ZoneSnapshot, query: &ListZonesQuery) -> Self {
        let zones: Vec<ZoneResponse> = snapshot
            .zones
            .iter()
            .filter(|z| query.status.map_or(true, |s| z.status == s))
            .filter(|z| !query.with_alerts || z.active_alerts > 0)
            .cloned()
            .map(ZoneResponse::from)
            .collect();
        Self {
            total: zones.len(),
            zones,
            stale: snapshot.stale,
            version: snapshot.version,
        }
    }
}

/// Request payload for previewing the area of an unsaved drawing.
#[derive(Debug, Clone, Deserialize)]
pub struct AreaPreviewRequest {
    pub points: Vec<PointInput>,
}

/// Area figures for a boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ZoneId>,
    pub vertices: usize,
    /// Raw shoelace value in degree², the figure editors display.
    pub area_deg2: f64,
    pub area_km2: f64,
    pub centroid: Option<GeoPoint>,
    /// Where a map showing this boundary should be centered.
    pub map_center: GeoPoint,
}

impl AreaResponse {
    pub fn for_bounds(zone_id: Option<ZoneId>, bounds: &[GeoPoint]) -> Self {
        Self {
            zone_id,
            vertices: bounds.len(),
            area_deg2: area::shoelace_area(bounds),
            area_km2: area::geodesic_area_km2(bounds),
            centroid: area::centroid(bounds),
            map_center: area::map_center(bounds),
        }
    }
}

/// Request payload for resolving zone ids to display names.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveZonesRequest {
    pub zone_ids: Vec<Option<ZoneId>>,
}

/// Resolved zones, in request order.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveZonesResponse {
    pub zones: Vec<ZoneRef>,
}

/// Request payload for the per-zone alert breakdown.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertSummaryRequest {
    pub alerts: Vec<Alert>,
}

/// Per-zone alert breakdown plus alerts pointing at deleted zones.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummaryResponse {
    pub zones: Vec<ZoneAlertSummary>,
    pub orphaned_alert_ids: Vec<String>,
}

/// Request payload for counting detections per zone.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionSummaryRequest {
    pub detections: Vec<AnimalDetection>,
}

/// Detections counted for one referenced zone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDetectionsResponse {
    pub zone_id: ZoneId,
    pub name: String,
    pub known: bool,
    pub detections: usize,
    pub animals: u64,
}

/// Zones with at least one detection, in zone id order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSummaryResponse {
    pub zones: Vec<ZoneDetectionsResponse>,
}

impl DetectionSummaryResponse {
    pub fn build(directory: &ZoneDirectory, detections: &[AnimalDetection]) -> Self {
        let zones = detections_by_zone(detections)
            .into_iter()
            .map(|(zone_id, count)| ZoneDetectionsResponse {
                name: directory.resolve_zone_name(Some(&zone_id)).to_string(),
                known: directory.contains(&zone_id),
                zone_id,
                detections: count.detections,
                animals: count.animals,
            })
            .collect();
        Self { zones }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LastPatrolledUpdate;
    use serde_json::json;

    #[test]
    fn test_point_input_accepts_short_and_long_keys() {
        let short: PointInput = serde_json::from_value(json!({"lat": 1.0, "lng": 2.0})).unwrap();
        let long: PointInput =
            serde_json::from_value(json!({"latitude": 1.0, "longitude": 2.0})).unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn test_create_request_defaults_to_pending() {
        let request: CreateZoneRequest =
            serde_json::from_value(json!({"name": "Creek", "points": []})).unwrap();
        assert_eq!(request.status, ZoneStatus::Pending);
    }

    #[test]
    fn test_update_request_into_patch() {
        let request: UpdateZoneRequest = serde_json::from_value(json!({
            "name": "Upper creek",
            "points": [{"lat": 0.0, "lng": 0.0}, {"lat": 0.0, "lng": 1.0}, {"lat": 1.0, "lng": 0.0}]
        }))
        .unwrap();
        let patch = request.into_patch().unwrap();
        assert_eq!(patch.name.as_deref(), Some("Upper creek"));
        assert_eq!(patch.bounds.map(|b| b.len()), Some(3));
        assert!(patch.status.is_none());
    }

    #[test]
    fn test_update_request_status_updates_patrol_time() {
        let patrolled: UpdateZoneRequest =
            serde_json::from_value(json!({"status": "patrolled", "name": "Creek"})).unwrap();
        let patch = patrolled.into_patch().unwrap();
        assert_eq!(patch.status, Some(ZoneStatus::Patrolled));
        assert_eq!(patch.name.as_deref(), Some("Creek"));
        assert!(matches!(patch.last_patrolled_at, LastPatrolledUpdate::Set(_)));

        let pending: UpdateZoneRequest =
            serde_json::from_value(json!({"status": "pending"})).unwrap();
        let patch = pending.into_patch().unwrap();
        assert_eq!(patch.last_patrolled_at, LastPatrolledUpdate::Clear);

        let renamed: UpdateZoneRequest = serde_json::from_value(json!({"name": "Ford"})).unwrap();
        let patch = renamed.into_patch().unwrap();
        assert_eq!(patch.last_patrolled_at, LastPatrolledUpdate::Keep);
    }

    #[test]
    fn test_update_request_rejects_out_of_range_point() {
        let request = UpdateZoneRequest {
            points: Some(vec![PointInput { lat: 0.0, lng: 200.0 }]),
            ..Default::default()
        };
        assert!(matches!(request.into_patch(), Err(ZoneError::Validation(_))));
    }

    #[test]
    fn test_list_query_parses_camel_case() {
        let query: ListZonesQuery =
            serde_json::from_value(json!({"status": "patrolled", "withAlerts": true})).unwrap();
        assert_eq!(query.status, Some(ZoneStatus::Patrolled));
        assert!(query.with_alerts);
    }

    #[test]
    fn test_area_response_for_unit_square() {
        let bounds = vec![
            GeoPoint::new(0.0, 0.0).unwrap(),
            GeoPoint::new(0.0, 1.0).unwrap(),
            GeoPoint::new(1.0, 1.0).unwrap(),
            GeoPoint::new(1.0, 0.0).unwrap(),
        ];
        let area = AreaResponse::for_bounds(None, &bounds);
        assert_eq!(area.vertices, 4);
        assert!((area.area_deg2 - 1.0).abs() < 1e-12);
        assert!(area.area_km2 > 12_000.0);
        let centroid = area.centroid.unwrap();
        assert!((centroid.latitude() - 0.5).abs() < 1e-12);
        assert_eq!(area.map_center, centroid);
    }

    #[test]
    fn test_area_response_empty_drawing() {
        let area = AreaResponse::for_bounds(None, &[]);
        assert_eq!(area.area_deg2, 0.0);
        assert_eq!(area.area_km2, 0.0);
        assert!(area.centroid.is_none());
        assert_eq!(area.map_center, area::DEFAULT_MAP_CENTER);
    }

    #[test]
    fn test_zone_response_marks_incomplete() {
        let now = Utc::now();
        let zone = Zone {
            id: ZoneId::from("z1"),
            name: "Unmapped".into(),
            status: ZoneStatus::Pending,
            bounds: vec![],
            active_alerts: 0,
            last_patrolled_at: None,
            created_at: now,
            updated_at: now,
        };
        let body = serde_json::to_value(ZoneResponse::from(zone)).unwrap();
        assert_eq!(body["complete"], false);
        assert_eq!(body["activeAlerts"], 0);
        assert!(body["lastPatrolledAt"].is_null());
    }
}
