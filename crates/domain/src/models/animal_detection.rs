//! Animal detection domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{GeoPoint, ZoneId, ZoneReference};

/// A counted group of animals spotted during a patrol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalDetection {
    pub id: String,
    pub species: String,
    pub count: u32,
    pub zone_id: Option<ZoneId>,
    /// Opaque image reference (URL or storage URI); resolved elsewhere.
    pub image_ref: Option<String>,
    pub location: Option<GeoPoint>,
    pub detected_at: DateTime<Utc>,
}

impl ZoneReference for AnimalDetection {
    fn zone_id(&self) -> Option<&ZoneId> {
        self.zone_id.as_ref()
    }
}
