//! In-memory zone store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, RwLock};

use domain::models::{apply_alert_delta, NewZone, Zone, ZoneId, ZonePatch};
use domain::services::{ZoneChange, ZoneStore};
use domain::StoreError;

/// Process-local `ZoneStore`. Contents are lost on restart.
pub struct MemoryZoneStore {
    zones: RwLock<HashMap<ZoneId, Zone>>,
    changes: broadcast::Sender<ZoneChange>,
}

impl MemoryZoneStore {
    pub fn new(buffer: usize) -> Self {
        let (changes, _) = broadcast::channel(buffer.max(1));
        Self {
            zones: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn notify(&self, change: ZoneChange) {
        // No receivers is fine: nobody is watching yet.
        let _ = self.changes.send(change);
    }
}

impl Default for MemoryZoneStore {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl ZoneStore for MemoryZoneStore {
    async fn fetch_all(&self) -> Result<Vec<Zone>, StoreError> {
        let mut zones: Vec<Zone> = self.zones.read().await.values().cloned().collect();
        zones.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(zones)
    }

    async fn fetch(&self, id: &ZoneId) -> Result<Option<Zone>, StoreError> {
        Ok(self.zones.read().await.get(id).cloned())
    }

    async fn insert(&self, draft: NewZone) -> Result<Zone, StoreError> {
        let now = Utc::now();
        let zone = Zone {
            id: ZoneId::generate(),
            name: draft.name,
            status: draft.status,
            bounds: draft.bounds,
            active_alerts: 0,
            last_patrolled_at: None,
            created_at: now,
            updated_at: now,
        };
        self.zones
            .write()
            .await
            .insert(zone.id.clone(), zone.clone());
        self.notify(ZoneChange::Upserted(zone.id.clone()));
        Ok(zone)
    }

    async fn patch(&self, id: &ZoneId, patch: &ZonePatch) -> Result<Option<Zone>, StoreError> {
        let updated = {
            let mut zones = self.zones.write().await;
            zones.get_mut(id).map(|zone| {
                zone.apply(patch, Utc::now());
                zone.clone()
            })
        };
        if updated.is_some() {
            self.notify(ZoneChange::Upserted(id.clone()));
        }
        Ok(updated)
    }

    async fn remove(&self, id: &ZoneId) -> Result<bool, StoreError> {
        let removed = self.zones.write().await.remove(id).is_some();
        if removed {
            self.notify(ZoneChange::Removed(id.clone()));
        }
        Ok(removed)
    }

    async fn add_active_alerts(
        &self,
        id: &ZoneId,
        delta: i64,
    ) -> Result<Option<Zone>, StoreError> {
        let updated = {
            let mut zones = self.zones.write().await;
            zones.get_mut(id).map(|zone| {
                zone.active_alerts = apply_alert_delta(zone.active_alerts, delta);
                zone.updated_at = Utc::now();
                zone.clone()
            })
        };
        if updated.is_some() {
            self.notify(ZoneChange::Upserted(id.clone()));
        }
        Ok(updated)
    }

    fn changes(&self) -> broadcast::Receiver<ZoneChange> {
        self.changes.subscribe()
    }
}
