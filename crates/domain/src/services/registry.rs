//! Zone registry: validated CRUD over a [`ZoneStore`] plus the live feed.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use validator::Validate;

use shared::validation::{validate_active_alerts, validate_vertex_count, validate_zone_name};

use crate::error::ZoneError;
use crate::models::{GeoPoint, NewZone, Zone, ZoneId, ZonePatch, ZoneStatus};
use crate::services::feed::{ZoneFeed, ZoneSnapshot, ZoneSubscription};
use crate::services::membership::ZoneDirectory;
use crate::services::polygon::SaveRequest;
use crate::services::store::ZoneStore;

/// Durable storage and live distribution of zones.
///
/// Every successful write resyncs the feed before returning, so callers
/// (and every other local subscriber) observe their own writes.
#[derive(Clone)]
pub struct ZoneRegistry {
    store: Arc<dyn ZoneStore>,
    feed: Arc<ZoneFeed>,
}

impl ZoneRegistry {
    /// Creates the registry and starts its feed. Requires a Tokio runtime.
    pub fn new(store: Arc<dyn ZoneStore>) -> Self {
        let feed = Arc::new(ZoneFeed::start(store.clone()));
        Self { store, feed }
    }

    /// Live subscription to the full zone set.
    pub fn list(&self) -> ZoneSubscription {
        self.feed.subscribe()
    }

    /// The most recently published zone set.
    pub fn snapshot(&self) -> ZoneSnapshot {
        self.feed.current()
    }

    /// Zones of the current snapshot with the given status.
    pub fn by_status(&self, status: ZoneStatus) -> Vec<Zone> {
        self.feed.current().by_status(status)
    }

    /// Zones of the current snapshot with at least one active alert.
    pub fn with_active_alerts(&self) -> Vec<Zone> {
        self.feed.current().with_active_alerts()
    }

    /// Id index over the current snapshot.
    pub fn directory(&self) -> ZoneDirectory {
        ZoneDirectory::from_zones(&self.feed.current().zones)
    }

    pub fn subscriber_count(&self) -> usize {
        self.feed.subscriber_count()
    }

    /// Reads one zone straight from the store.
    pub async fn get(&self, id: &ZoneId) -> Result<Zone, ZoneError> {
        match self.store.fetch(id).await? {
            Some(zone) => Ok(zone),
            None => Err(self.not_found(id).await),
        }
    }

    /// Persists a new zone and returns its id.
    pub async fn create(&self, draft: NewZone) -> Result<ZoneId, ZoneError> {
        validate_name(&draft.name)?;
        validate_bounds(&draft.bounds)?;

        let draft = NewZone {
            name: draft.name.trim().to_string(),
            ..draft
        };
        let zone = self.store.insert(draft).await?;
        info!(
            zone_id = %zone.id,
            name = %zone.name,
            vertices = zone.bounds.len(),
            "Zone created"
        );

        self.feed.resync(self.store.as_ref()).await;
        Ok(zone.id)
    }

    /// Merges a patch into an existing zone.
    pub async fn update(&self, id: &ZoneId, patch: ZonePatch) -> Result<Zone, ZoneError> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(bounds) = &patch.bounds {
            validate_bounds(bounds)?;
        }
        if let Some(active_alerts) = patch.active_alerts {
            validate_active_alerts(active_alerts).map_err(validation_message)?;
        }
        let patch = ZonePatch {
            name: patch.name.map(|n| n.trim().to_string()),
            ..patch
        };

        let Some(zone) = self.store.patch(id, &patch).await? else {
            return Err(self.not_found(id).await);
        };
        info!(zone_id = %id, "Zone updated");

        self.feed.resync(self.store.as_ref()).await;
        Ok(zone)
    }

    /// Deletes a zone. Entities referencing it are left untouched.
    pub async fn delete(&self, id: &ZoneId) -> Result<(), ZoneError> {
        if !self.store.remove(id).await? {
            return Err(self.not_found(id).await);
        }
        info!(zone_id = %id, "Zone deleted");

        self.feed.resync(self.store.as_ref()).await;
        Ok(())
    }

    /// Changes the patrol status. `patrolled` stamps the patrol time,
    /// `pending` clears it.
    pub async fn set_status(&self, id: &ZoneId, status: ZoneStatus) -> Result<Zone, ZoneError> {
        let patch = ZonePatch::status(status, Utc::now());
        let Some(zone) = self.store.patch(id, &patch).await? else {
            return Err(self.not_found(id).await);
        };
        info!(zone_id = %id, status = %status, "Zone status changed");

        self.feed.resync(self.store.as_ref()).await;
        Ok(zone)
    }

    /// Adds `delta` (possibly negative) to the active alert count, clamping
    /// at zero. Applied atomically by the store.
    pub async fn increment_active_alerts(&self, id: &ZoneId, delta: i64) -> Result<Zone, ZoneError> {
        let Some(zone) = self.store.add_active_alerts(id, delta).await? else {
            return Err(self.not_found(id).await);
        };
        info!(
            zone_id = %id,
            delta,
            active_alerts = zone.active_alerts,
            "Zone active alerts adjusted"
        );

        self.feed.resync(self.store.as_ref()).await;
        Ok(zone)
    }

    /// Commits a drawing session.
    pub async fn save(&self, request: SaveRequest) -> Result<ZoneId, ZoneError> {
        match request {
            SaveRequest::Create(draft) => self.create(draft).await,
            SaveRequest::Update(id, patch) => self.update(&id, patch).await.map(|z| z.id),
        }
    }

    /// The zone is gone from the store: drop it from local state too.
    async fn not_found(&self, id: &ZoneId) -> ZoneError {
        warn!(zone_id = %id, "Zone not found in store, resyncing");
        self.feed.resync(self.store.as_ref()).await;
        ZoneError::NotFound(id.clone())
    }

    /// Stops the feed.
    pub fn shutdown(&self) {
        warn!("Zone registry shutting down");
        self.feed.shutdown();
    }
}

fn validate_name(name: &str) -> Result<(), ZoneError> {
    validate_zone_name(name).map_err(validation_message)
}

fn validate_bounds(bounds: &[GeoPoint]) -> Result<(), ZoneError> {
    validate_vertex_count(bounds.len()).map_err(validation_message)?;
    for point in bounds {
        point.validate()?;
    }
    Ok(())
}

fn validation_message(e: validator::ValidationError) -> ZoneError {
    ZoneError::Validation(
        e.message
            .map(|m| m.to_string())
            .unwrap_or_else(|| e.code.to_string()),
    )
}
