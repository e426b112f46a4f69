//! Zone domain model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared::validation::MAX_ACTIVE_ALERTS;

use crate::models::GeoPoint;
use crate::services::area;

/// Store-assigned zone identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ZoneId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ZoneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Patrol status of a zone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    Patrolled,
    #[default]
    Pending,
}

impl ZoneStatus {
    /// Converts to the stored string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneStatus::Patrolled => "patrolled",
            ZoneStatus::Pending => "pending",
        }
    }

    /// Parses from the stored string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "patrolled" => Some(ZoneStatus::Patrolled),
            "pending" => Some(ZoneStatus::Pending),
            _ => None,
        }
    }
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named polygonal patrol area.
///
/// `bounds` is an implicitly closed ring: the last point connects back to
/// the first. It holds either no points (unset) or at least three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub status: ZoneStatus,
    pub bounds: Vec<GeoPoint>,
    pub active_alerts: u32,
    pub last_patrolled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Zone {
    /// Whether the boundary forms a closed polygon.
    pub fn is_complete(&self) -> bool {
        self.bounds.len() >= shared::validation::MIN_POLYGON_VERTICES
    }

    /// Raw shoelace area of the boundary, in degree².
    pub fn area(&self) -> f64 {
        area::shoelace_area(&self.bounds)
    }

    /// Spherical area of the boundary, in km².
    pub fn area_km2(&self) -> f64 {
        area::geodesic_area_km2(&self.bounds)
    }

    /// Applies a patch in place. Fields absent from the patch are kept.
    pub fn apply(&mut self, patch: &ZonePatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(bounds) = &patch.bounds {
            self.bounds = bounds.clone();
        }
        if let Some(active_alerts) = patch.active_alerts {
            self.active_alerts = active_alerts;
        }
        match patch.last_patrolled_at {
            LastPatrolledUpdate::Keep => {}
            LastPatrolledUpdate::Set(at) => self.last_patrolled_at = Some(at),
            LastPatrolledUpdate::Clear => self.last_patrolled_at = None,
        }
        self.updated_at = now;
    }
}

/// Fields an operator supplies when creating a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewZone {
    pub name: String,
    #[serde(default)]
    pub status: ZoneStatus,
    pub bounds: Vec<GeoPoint>,
}

/// How a patch treats `last_patrolled_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LastPatrolledUpdate {
    #[default]
    Keep,
    Set(DateTime<Utc>),
    Clear,
}

/// Partial update merged into an existing zone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZonePatch {
    pub name: Option<String>,
    pub status: Option<ZoneStatus>,
    pub bounds: Option<Vec<GeoPoint>>,
    pub active_alerts: Option<u32>,
    pub last_patrolled_at: LastPatrolledUpdate,
}

impl ZonePatch {
    /// Patch that changes the status and stamps or clears the patrol time.
    pub fn status(status: ZoneStatus, now: DateTime<Utc>) -> Self {
        let last_patrolled_at = match status {
            ZoneStatus::Patrolled => LastPatrolledUpdate::Set(now),
            ZoneStatus::Pending => LastPatrolledUpdate::Clear,
        };
        Self {
            status: Some(status),
            last_patrolled_at,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.bounds.is_none()
            && self.active_alerts.is_none()
            && self.last_patrolled_at == LastPatrolledUpdate::Keep
    }
}

/// Narrows an alert delta to the range a single adjustment can move the
/// count by. Keeps store arithmetic from overflowing.
pub fn clamp_alert_delta(delta: i64) -> i64 {
    let max = i64::from(MAX_ACTIVE_ALERTS);
    delta.clamp(-max, max)
}

/// Applies an alert delta, saturating into `[0, MAX_ACTIVE_ALERTS]`.
pub fn apply_alert_delta(current: u32, delta: i64) -> u32 {
    let next = i64::from(current)
        .saturating_add(delta)
        .clamp(0, i64::from(MAX_ACTIVE_ALERTS));
    u32::try_from(next).unwrap_or(MAX_ACTIVE_ALERTS)
}

/// An entity that points at a zone through a stored foreign key.
pub trait ZoneReference {
    fn zone_id(&self) -> Option<&ZoneId>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_apply_alert_delta_saturates_at_extremes() {
        assert_eq!(apply_alert_delta(1, i64::MAX), MAX_ACTIVE_ALERTS);
        assert_eq!(apply_alert_delta(MAX_ACTIVE_ALERTS, i64::MAX), MAX_ACTIVE_ALERTS);
        assert_eq!(apply_alert_delta(5, i64::MIN), 0);
        assert_eq!(apply_alert_delta(u32::MAX, -1), MAX_ACTIVE_ALERTS);
        assert_eq!(apply_alert_delta(3, -1), 2);
    }

    #[test]
    fn test_clamp_alert_delta() {
        let max = i64::from(MAX_ACTIVE_ALERTS);
        assert_eq!(clamp_alert_delta(i64::MAX), max);
        assert_eq!(clamp_alert_delta(i64::MIN), -max);
        assert_eq!(clamp_alert_delta(-7), -7);
    }

    fn pt(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    fn test_zone() -> Zone {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Zone {
            id: ZoneId::from("zone-1"),
            name: "North pasture".to_string(),
            status: ZoneStatus::Pending,
            bounds: vec![pt(0.0, 0.0), pt(0.0, 1.0), pt(1.0, 1.0), pt(1.0, 0.0)],
            active_alerts: 0,
            last_patrolled_at: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_zone_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ZoneStatus::Patrolled).unwrap(),
            "\"patrolled\""
        );
        let pending: ZoneStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(pending, ZoneStatus::Pending);
    }

    #[test]
    fn test_zone_status_parse() {
        assert_eq!(ZoneStatus::parse("patrolled"), Some(ZoneStatus::Patrolled));
        assert_eq!(ZoneStatus::parse("pending"), Some(ZoneStatus::Pending));
        assert_eq!(ZoneStatus::parse("flying"), None);
        assert_eq!(ZoneStatus::default(), ZoneStatus::Pending);
    }

    #[test]
    fn test_zone_id_display_and_serde() {
        let id = ZoneId::from("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        assert_ne!(ZoneId::generate(), ZoneId::generate());
    }

    #[test]
    fn test_zone_serialization_camel_case() {
        let json = serde_json::to_value(test_zone()).unwrap();
        assert_eq!(json["activeAlerts"], 0);
        assert!(json["lastPatrolledAt"].is_null());
        assert_eq!(json["bounds"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_zone_area_and_completeness() {
        let mut zone = test_zone();
        assert!(zone.is_complete());
        assert_eq!(zone.area(), 1.0);

        zone.bounds.truncate(2);
        assert!(!zone.is_complete());
        assert_eq!(zone.area(), 0.0);
    }

    #[test]
    fn test_apply_patch_merges_fields() {
        let mut zone = test_zone();
        let now = Utc::now();
        let patch = ZonePatch {
            name: Some("South pasture".into()),
            active_alerts: Some(3),
            ..Default::default()
        };
        zone.apply(&patch, now);

        assert_eq!(zone.name, "South pasture");
        assert_eq!(zone.active_alerts, 3);
        assert_eq!(zone.status, ZoneStatus::Pending);
        assert_eq!(zone.bounds.len(), 4);
        assert_eq!(zone.updated_at, now);
    }

    #[test]
    fn test_status_patch_stamps_and_clears() {
        let now = Utc::now();
        let mut zone = test_zone();

        zone.apply(&ZonePatch::status(ZoneStatus::Patrolled, now), now);
        assert_eq!(zone.status, ZoneStatus::Patrolled);
        assert_eq!(zone.last_patrolled_at, Some(now));

        zone.apply(&ZonePatch::status(ZoneStatus::Pending, now), now);
        assert_eq!(zone.status, ZoneStatus::Pending);
        assert_eq!(zone.last_patrolled_at, None);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(ZonePatch::default().is_empty());
        assert!(!ZonePatch::status(ZoneStatus::Pending, Utc::now()).is_empty());
    }

    #[test]
    fn test_new_zone_defaults_status() {
        let draft: NewZone = serde_json::from_str(r#"{"name":"Corral","bounds":[]}"#).unwrap();
        assert_eq!(draft.status, ZoneStatus::Pending);
    }
}
