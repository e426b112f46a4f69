//! Alert domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{GeoPoint, ZoneId, ZoneReference};

/// What triggered the alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Person,
    Animal,
    Vehicle,
    Unknown,
}

/// Review state of an alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    New,
    Ack,
    Closed,
}

/// A detection raised by a drone inside (or near) a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub critical: bool,
    pub zone_id: Option<ZoneId>,
    pub drone_id: Option<String>,
    pub status: AlertStatus,
    pub location: Option<GeoPoint>,
    pub detected_at: DateTime<Utc>,
}

impl ZoneReference for Alert {
    fn zone_id(&self) -> Option<&ZoneId> {
        self.zone_id.as_ref()
    }
}
