//! In-crate store double for registry and feed tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use tokio::sync::broadcast;

use crate::error::StoreError;
use crate::models::{apply_alert_delta, NewZone, Zone, ZoneId, ZonePatch, ZoneStatus};
use crate::services::store::{ZoneChange, ZoneStore};

pub(crate) struct ScriptedStore {
    zones: Mutex<HashMap<ZoneId, Zone>>,
    changes: broadcast::Sender<ZoneChange>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl ScriptedStore {
    pub(crate) fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            zones: Mutex::new(HashMap::new()),
            changes,
            failing: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Simulates a write made by another session.
    pub(crate) fn insert_remote(&self, id: &str, name: &str) {
        let now = Utc::now();
        let zone = Zone {
            id: ZoneId::from(id),
            name: name.to_string(),
            status: ZoneStatus::Pending,
            bounds: vec![],
            active_alerts: 0,
            last_patrolled_at: None,
            created_at: now,
            updated_at: now,
        };
        self.zones.lock().unwrap().insert(zone.id.clone(), zone);
        let _ = self.changes.send(ZoneChange::Upserted(ZoneId::from(id)));
    }

    /// Deletes a zone without publishing a change, as when the change
    /// stream is down.
    pub(crate) fn remove_unannounced(&self, id: &ZoneId) {
        self.zones.lock().unwrap().remove(id);
    }

    pub(crate) fn interrupt(&self, reason: &str) {
        let _ = self
            .changes
            .send(ZoneChange::Interrupted(reason.to_string()));
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("scripted failure".into()))
        } else {
            Ok(())
        }
    }

    fn write(&self) -> Result<(), StoreError> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ZoneStore for ScriptedStore {
    async fn fetch_all(&self) -> Result<Vec<Zone>, StoreError> {
        self.check()?;
        Ok(self.zones.lock().unwrap().values().cloned().collect())
    }

    async fn fetch(&self, id: &ZoneId) -> Result<Option<Zone>, StoreError> {
        self.check()?;
        Ok(self.zones.lock().unwrap().get(id).cloned())
    }

    async fn insert(&self, draft: NewZone) -> Result<Zone, StoreError> {
        self.write()?;
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
            .lock()
            .unwrap()
            .insert(zone.id.clone(), zone.clone());
        let _ = self.changes.send(ZoneChange::Upserted(zone.id.clone()));
        Ok(zone)
    }

    async fn patch(&self, id: &ZoneId, patch: &ZonePatch) -> Result<Option<Zone>, StoreError> {
        self.write()?;
        let updated = {
            let mut zones = self.zones.lock().unwrap();
            zones.get_mut(id).map(|zone| {
                zone.apply(patch, Utc::now());
                zone.clone()
            })
        };
        if updated.is_some() {
            let _ = self.changes.send(ZoneChange::Upserted(id.clone()));
        }
        Ok(updated)
    }

    async fn remove(&self, id: &ZoneId) -> Result<bool, StoreError> {
        self.write()?;
        let removed = self.zones.lock().unwrap().remove(id).is_some();
        if removed {
            let _ = self.changes.send(ZoneChange::Removed(id.clone()));
        }
        Ok(removed)
    }

    async fn add_active_alerts(
        &self,
        id: &ZoneId,
        delta: i64,
    ) -> Result<Option<Zone>, StoreError> {
        self.write()?;
        let updated = {
            let mut zones = self.zones.lock().unwrap();
            zones.get_mut(id).map(|zone| {
                zone.active_alerts = apply_alert_delta(zone.active_alerts, delta);
                zone.updated_at = Utc::now();
                zone.clone()
            })
        };
        if updated.is_some() {
            let _ = self.changes.send(ZoneChange::Upserted(id.clone()));
        }
        Ok(updated)
    }

    fn changes(&self) -> broadcast::Receiver<ZoneChange> {
        self.changes.subscribe()
    }
}
