//! Live zone feed.
//!
//! One [`ZoneFeed`] per store fans a single upstream change stream out to
//! any number of local [`ZoneSubscription`]s. Every change re-reads the
//! full collection, so subscribers always receive the complete current
//! set rather than incremental diffs.

use std::sync::Arc;

use tokio::sync::{broadcast, watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::{Zone, ZoneId, ZoneStatus};
use crate::services::store::{ZoneChange, ZoneStore};

/// The full zone set as last observed from the store.
#[derive(Debug, Clone, Default)]
pub struct ZoneSnapshot {
    pub zones: Arc<Vec<Zone>>,
    /// Set when the upstream stream dropped or a re-read failed. Cleared by
    /// the next successful read.
    pub stale: bool,
    /// `false` until the first successful read.
    pub loaded: bool,
    /// Bumped on every publish.
    pub version: u64,
}

impl ZoneSnapshot {
    pub fn get(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.id == id)
    }

    pub fn by_status(&self, status: ZoneStatus) -> Vec<Zone> {
        self.zones
            .iter()
            .filter(|z| z.status == status)
            .cloned()
            .collect()
    }

    pub fn with_active_alerts(&self) -> Vec<Zone> {
        self.zones
            .iter()
            .filter(|z| z.active_alerts > 0)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// A consumer's handle on the live feed. Dropping it unsubscribes.
#[derive(Debug)]
pub struct ZoneSubscription {
    rx: watch::Receiver<ZoneSnapshot>,
}

impl ZoneSubscription {
    /// The latest snapshot, marking it as seen.
    pub fn current(&mut self) -> ZoneSnapshot {
        self.rx.borrow_and_update().clone()
    }

    /// Waits for the next publish. `None` once the feed has shut down.
    pub async fn changed(&mut self) -> Option<ZoneSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn into_receiver(self) -> watch::Receiver<ZoneSnapshot> {
        self.rx
    }
}

/// Subscription multiplexer for the `zones` collection.
pub struct ZoneFeed {
    tx: Arc<watch::Sender<ZoneSnapshot>>,
    refresh_lock: Arc<Mutex<()>>,
    cancel: CancellationToken,
}

impl ZoneFeed {
    /// Subscribes to the store's change stream and spawns the pump task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(store: Arc<dyn ZoneStore>) -> Self {
        let (tx, _) = watch::channel(ZoneSnapshot::default());
        let feed = Self {
            tx: Arc::new(tx),
            refresh_lock: Arc::new(Mutex::new(())),
            cancel: CancellationToken::new(),
        };

        let changes = store.changes();
        tokio::spawn(pump(
            store,
            changes,
            feed.tx.clone(),
            feed.refresh_lock.clone(),
            feed.cancel.clone(),
        ));
        feed
    }

    pub fn subscribe(&self) -> ZoneSubscription {
        ZoneSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn current(&self) -> ZoneSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Re-reads the collection and publishes it.
    pub async fn resync(&self, store: &dyn ZoneStore) {
        refresh(store, &self.tx, &self.refresh_lock).await;
    }

    /// Stops the pump. Existing subscriptions keep their last snapshot,
    /// marked stale.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        mark_stale(&self.tx, "feed shut down");
    }
}

impl Drop for ZoneFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn pump(
    store: Arc<dyn ZoneStore>,
    mut changes: broadcast::Receiver<ZoneChange>,
    tx: Arc<watch::Sender<ZoneSnapshot>>,
    refresh_lock: Arc<Mutex<()>>,
    cancel: CancellationToken,
) {
    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = refresh(store.as_ref(), &tx, &refresh_lock) => {}
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            msg = changes.recv() => match msg {
                Ok(ZoneChange::Interrupted(reason)) => mark_stale(&tx, &reason),
                Ok(change) => {
                    debug!(?change, "Zone change received");
                    refresh(store.as_ref(), &tx, &refresh_lock).await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Zone feed lagged, resyncing");
                    refresh(store.as_ref(), &tx, &refresh_lock).await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    mark_stale(&tx, "change stream closed");
                    break;
                }
            },
        }
    }
    debug!("Zone feed pump stopped");
}

async fn refresh(
    store: &dyn ZoneStore,
    tx: &watch::Sender<ZoneSnapshot>,
    refresh_lock: &Mutex<()>,
) {
    // Serialized so an older read never overwrites a newer one.
    let _guard = refresh_lock.lock().await;
    match store.fetch_all().await {
        Ok(zones) => tx.send_modify(|snap| {
            snap.zones = Arc::new(zones);
            snap.stale = false;
            snap.loaded = true;
            snap.version += 1;
        }),
        Err(e) => {
            warn!(error = %e, "Failed to refresh zone feed");
            mark_stale(tx, &e.to_string());
        }
    }
}

fn mark_stale(tx: &watch::Sender<ZoneSnapshot>, reason: &str) {
    warn!(reason, "Zone feed marked stale");
    tx.send_modify(|snap| {
        snap.stale = true;
        snap.version += 1;
    });
}
