//! Domain models for the AeroSentinel zone service.

pub mod alert;
pub mod animal_detection;
pub mod drone;
pub mod geo_point;
pub mod zone;
pub mod zone_request;

pub use alert::{Alert, AlertKind, AlertStatus};
pub use animal_detection::AnimalDetection;
pub use drone::{Drone, DroneStatus};
pub use geo_point::GeoPoint;
pub use zone::{
    apply_alert_delta, clamp_alert_delta, LastPatrolledUpdate, NewZone, Zone, ZoneId, ZonePatch,
    ZoneReference, ZoneStatus,
};
pub use zone_request::{
    AdjustAlertsRequest, AlertSummaryRequest, AlertSummaryResponse, AreaPreviewRequest,
    AreaResponse, CreateZoneRequest, DetectionSummaryRequest, DetectionSummaryResponse,
    ListZonesQuery, ListZonesResponse, PointInput, ResolveZonesRequest, ResolveZonesResponse,
    SetZoneStatusRequest, UpdateZoneRequest, ZoneDetectionsResponse, ZoneResponse,
};
