//! Drone domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{GeoPoint, ZoneId, ZoneReference};

/// Operational state reported by a drone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DroneStatus {
    Idle,
    Flying,
    Charging,
    Offline,
}

/// A patrol drone. Only `last_zone_id` ties it to the zone registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drone {
    pub id: String,
    pub name: String,
    pub model: String,
    pub status: DroneStatus,
    pub battery: u8,
    pub last_location: Option<GeoPoint>,
    pub last_zone_id: Option<ZoneId>,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
}

impl ZoneReference for Drone {
    fn zone_id(&self) -> Option<&ZoneId> {
        self.last_zone_id.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drone_deserialization() {
        let json = r#"{
            "id": "d-1",
            "name": "Halcon",
            "model": "M300",
            "status": "flying",
            "battery": 76,
            "lastLocation": {"latitude": -31.4, "longitude": -64.2},
            "lastZoneId": "zone-7",
            "lastHeartbeatAt": null
        }"#;

        let drone: Drone = serde_json::from_str(json).unwrap();
        assert_eq!(drone.status, DroneStatus::Flying);
        assert_eq!(drone.zone_id(), Some(&ZoneId::from("zone-7")));
        assert_eq!(drone.last_location.unwrap().latitude(), -31.4);
    }

    #[test]
    fn test_unassigned_drone_has_no_zone() {
        let json = r#"{
            "id": "d-2", "name": "Condor", "model": "M30", "status": "idle",
            "battery": 100, "lastLocation": null, "lastZoneId": null, "lastHeartbeatAt": null
        }"#;
        let drone: Drone = serde_json::from_str(json).unwrap();
        assert!(drone.zone_id().is_none());
    }
}
