//! Storage port for zone records.
//!
//! The registry depends only on this trait; `persistence` provides the
//! PostgreSQL and in-memory implementations.

use tokio::sync::broadcast;

use crate::error::StoreError;
use crate::models::{NewZone, Zone, ZoneId, ZonePatch};

/// Change notification published by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneChange {
    Upserted(ZoneId),
    Removed(ZoneId),
    /// The store lost its upstream change stream; snapshots may be outdated
    /// until the next successful change.
    Interrupted(String),
    /// The upstream change stream was (re)established; changes may have
    /// been missed while it was down.
    Reconnected,
}

/// A realtime document store holding the `zones` collection.
#[async_trait::async_trait]
pub trait ZoneStore: Send + Sync {
    /// Reads the full current set of zones.
    async fn fetch_all(&self) -> Result<Vec<Zone>, StoreError>;

    /// Reads a single zone.
    async fn fetch(&self, id: &ZoneId) -> Result<Option<Zone>, StoreError>;

    /// Persists a new zone with `active_alerts = 0`, no patrol time and a
    /// store-generated id.
    async fn insert(&self, draft: NewZone) -> Result<Zone, StoreError>;

    /// Merges a patch into an existing zone. `None` if the zone is absent.
    async fn patch(&self, id: &ZoneId, patch: &ZonePatch) -> Result<Option<Zone>, StoreError>;

    /// Deletes a zone. `false` if the zone is absent.
    async fn remove(&self, id: &ZoneId) -> Result<bool, StoreError>;

    /// Atomically adds `delta` to the active alert count, clamping at zero.
    /// `None` if the zone is absent.
    async fn add_active_alerts(&self, id: &ZoneId, delta: i64)
        -> Result<Option<Zone>, StoreError>;

    /// Subscribes to change notifications for the collection.
    fn changes(&self) -> broadcast::Receiver<ZoneChange>;
}
