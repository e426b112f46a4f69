//! Domain services for the AeroSentinel zone service.
//!
//! Services contain the zone geometry logic and the registry that operates
//! on domain models.

pub mod area;
pub mod feed;
pub mod membership;
pub mod polygon;
pub mod registry;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use area::{centroid, geodesic_area_km2, map_center, shoelace_area, DEFAULT_MAP_CENTER};
pub use feed::{ZoneFeed, ZoneSnapshot, ZoneSubscription};
pub use membership::{
    alert_summary, detections_by_zone, partition_by_status, ZoneAlertSummary, ZoneDetectionCount,
    ZoneDirectory, ZoneRef, ZoneSeverity, UNKNOWN_ZONE_LABEL,
};
pub use polygon::{DraftPoint, PointId, PolygonBuilder, SaveRequest};
pub use registry::ZoneRegistry;
pub use store::{ZoneChange, ZoneStore};
