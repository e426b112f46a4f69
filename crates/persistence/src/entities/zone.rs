//! Zone entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use validator::Validate;

use domain::models::{GeoPoint, Zone, ZoneId, ZoneStatus};
use domain::StoreError;
use shared::validation::validate_vertex_count;

/// Database row mapping for the zones table.
#[derive(Debug, Clone, FromRow)]
pub struct ZoneEntity {
    pub id: String,
    pub name: String,
    pub status: String,
    pub bounds: serde_json::Value, // JSONB array of {latitude, longitude}
    pub active_alerts: i32,
    pub last_patrolled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ZoneEntity {
    fn corrupt(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Corrupt {
            id: self.id.clone(),
            reason: reason.into(),
        }
    }
}

/// Rows are checked against the zone schema on the way out.
impl TryFrom<ZoneEntity> for Zone {
    type Error = StoreError;

    fn try_from(entity: ZoneEntity) -> Result<Self, Self::Error> {
        let status = ZoneStatus::parse(&entity.status)
            .ok_or_else(|| entity.corrupt(format!("unknown status '{}'", entity.status)))?;

        let bounds: Vec<GeoPoint> = serde_json::from_value(entity.bounds.clone())
            .map_err(|e| entity.corrupt(format!("malformed bounds: {}", e)))?;
        validate_vertex_count(bounds.len())
            .map_err(|_| entity.corrupt(format!("bounds has {} points", bounds.len())))?;
        for point in &bounds {
            point
                .validate()
                .map_err(|_| entity.corrupt("bound out of range"))?;
        }

        let active_alerts = u32::try_from(entity.active_alerts)
            .map_err(|_| entity.corrupt(format!("negative active_alerts {}", entity.active_alerts)))?;

        Ok(Self {
            id: ZoneId::from(entity.id),
            name: entity.name,
            status,
            bounds,
            active_alerts,
            last_patrolled_at: entity.last_patrolled_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}
