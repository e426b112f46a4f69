//! PostgreSQL zone store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use domain::models::{
    clamp_alert_delta, GeoPoint, LastPatrolledUpdate, NewZone, Zone, ZoneId, ZonePatch,
};
use domain::services::{ZoneChange, ZoneStore};
use domain::StoreError;
use shared::validation::MAX_ACTIVE_ALERTS;

use crate::entities::ZoneEntity;
use crate::metrics::{record_listener_interruption, QueryTimer};

/// Channel the `zones` trigger notifies on.
pub const DEFAULT_NOTIFY_CHANNEL: &str = "zones_changed";

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// `ZoneStore` backed by the `zones` table.
///
/// A background task holds a `LISTEN` connection and turns trigger
/// notifications into [`ZoneChange`]s. The task stops when the store is
/// dropped.
pub struct PgZoneStore {
    pool: PgPool,
    changes: broadcast::Sender<ZoneChange>,
    cancel: CancellationToken,
}

impl PgZoneStore {
    /// Creates the store and spawns its listener. Requires a Tokio runtime.
    pub fn new(pool: PgPool, channel: impl Into<String>, buffer: usize) -> Self {
        let (changes, _) = broadcast::channel(buffer.max(1));
        let cancel = CancellationToken::new();
        tokio::spawn(listen(
            pool.clone(),
            channel.into(),
            changes.clone(),
            cancel.clone(),
        ));
        Self {
            pool,
            changes,
            cancel,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Drop for PgZoneStore {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[async_trait]
impl ZoneStore for PgZoneStore {
    async fn fetch_all(&self) -> Result<Vec<Zone>, StoreError> {
        let timer = QueryTimer::new("fetch_zones");
        let result = sqlx::query_as::<_, ZoneEntity>(
            r#"
            SELECT * FROM zones ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();

        let zones = result
            .map_err(unavailable)?
            .into_iter()
            .filter_map(|entity| match Zone::try_from(entity) {
                Ok(zone) => Some(zone),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupt zone record");
                    None
                }
            })
            .collect();
        Ok(zones)
    }

    async fn fetch(&self, id: &ZoneId) -> Result<Option<Zone>, StoreError> {
        let timer = QueryTimer::new("fetch_zone");
        let result = sqlx::query_as::<_, ZoneEntity>(
            r#"
            SELECT * FROM zones WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map_err(unavailable)?.map(Zone::try_from).transpose()
    }

    async fn insert(&self, draft: NewZone) -> Result<Zone, StoreError> {
        let id = ZoneId::generate();
        let bounds = encode_bounds(&id, &draft.bounds)?;

        let timer = QueryTimer::new("insert_zone");
        let result = sqlx::query_as::<_, ZoneEntity>(
            r#"
            INSERT INTO zones (id, name, status, bounds)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(id.as_str())
        .bind(&draft.name)
        .bind(draft.status.as_str())
        .bind(bounds)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        Zone::try_from(result.map_err(unavailable)?)
    }

    async fn patch(&self, id: &ZoneId, patch: &ZonePatch) -> Result<Option<Zone>, StoreError> {
        let bounds = patch
            .bounds
            .as_deref()
            .map(|bounds| encode_bounds(id, bounds))
            .transpose()?;
        let active_alerts = patch
            .active_alerts
            .map(|n| i32::try_from(n.min(MAX_ACTIVE_ALERTS)).unwrap_or(i32::MAX));
        let (patrol_mode, patrolled_at) = match patch.last_patrolled_at {
            LastPatrolledUpdate::Keep => ("keep", None),
            LastPatrolledUpdate::Set(at) => ("set", Some(at)),
            LastPatrolledUpdate::Clear => ("clear", None),
        };

        let timer = QueryTimer::new("update_zone");
        let result = sqlx::query_as::<_, ZoneEntity>(
            r#"
            UPDATE zones SET
                name = COALESCE($2, name),
                status = COALESCE($3, status),
                bounds = COALESCE($4, bounds),
                active_alerts = COALESCE($5, active_alerts),
                last_patrolled_at = CASE $6::TEXT
                    WHEN 'set' THEN $7::TIMESTAMPTZ
                    WHEN 'clear' THEN NULL
                    ELSE last_patrolled_at
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_str())
        .bind(patch.name.as_deref())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(bounds)
        .bind(active_alerts)
        .bind(patrol_mode)
        .bind(patrolled_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map_err(unavailable)?.map(Zone::try_from).transpose()
    }

    async fn remove(&self, id: &ZoneId) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("delete_zone");
        let result = sqlx::query(
            r#"
            DELETE FROM zones WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await;
        timer.record();

        Ok(result.map_err(unavailable)?.rows_affected() > 0)
    }

    async fn add_active_alerts(
        &self,
        id: &ZoneId,
        delta: i64,
    ) -> Result<Option<Zone>, StoreError> {
        let timer = QueryTimer::new("add_zone_active_alerts");
        let result = sqlx::query_as::<_, ZoneEntity>(
            r#"
            UPDATE zones SET
                active_alerts = LEAST(GREATEST(active_alerts::BIGINT + $2, 0), 2147483647)::INTEGER,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_str())
        .bind(clamp_alert_delta(delta))
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map_err(unavailable)?.map(Zone::try_from).transpose()
    }

    fn changes(&self) -> broadcast::Receiver<ZoneChange> {
        self.changes.subscribe()
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn encode_bounds(id: &ZoneId, bounds: &[GeoPoint]) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(bounds).map_err(|e| StoreError::Corrupt {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

/// Keeps a `LISTEN` connection open, reconnecting after a delay whenever it
/// drops. Each (re)connect is announced with [`ZoneChange::Reconnected`] so
/// the feed re-reads whatever it may have missed.
async fn listen(
    pool: PgPool,
    channel: String,
    changes: broadcast::Sender<ZoneChange>,
    cancel: CancellationToken,
) {
    let mut interrupted = false;

    loop {
        match connect_listener(&pool, &channel).await {
            Ok(mut listener) => {
                if interrupted {
                    info!(channel = %channel, "Zone listener reconnected");
                } else {
                    info!(channel = %channel, "Zone listener started");
                }
                interrupted = false;
                let _ = changes.send(ZoneChange::Reconnected);

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        received = listener.try_recv() => match received {
                            Ok(Some(notification)) => {
                                match parse_notification(notification.payload()) {
                                    Some(change) => {
                                        debug!(?change, "Zone notification");
                                        let _ = changes.send(change);
                                    }
                                    None => warn!(
                                        payload = notification.payload(),
                                        "Ignoring unrecognised zone notification"
                                    ),
                                }
                            }
                            Ok(None) => {
                                report_interruption(&changes, "listener connection lost");
                                interrupted = true;
                                break;
                            }
                            Err(e) => {
                                report_interruption(&changes, &e.to_string());
                                interrupted = true;
                                break;
                            }
                        },
                    }
                }
            }
            Err(e) => {
                if !interrupted {
                    report_interruption(&changes, &e.to_string());
                    interrupted = true;
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
        }
    }
}

async fn connect_listener(pool: &PgPool, channel: &str) -> Result<PgListener, sqlx::Error> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(channel).await?;
    Ok(listener)
}

fn report_interruption(changes: &broadcast::Sender<ZoneChange>, reason: &str) {
    warn!(reason, "Zone change stream interrupted");
    record_listener_interruption();
    let _ = changes.send(ZoneChange::Interrupted(reason.to_string()));
}

/// Decodes a trigger payload: `{"op": "insert"|"update"|"delete", "id": ...}`.
fn parse_notification(payload: &str) -> Option<ZoneChange> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    let id = ZoneId::from(value.get("id")?.as_str()?);
    match value.get("op")?.as_str()? {
        "insert" | "update" => Some(ZoneChange::Upserted(id)),
        "delete" => Some(ZoneChange::Removed(id)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notification_upsert() {
        assert_eq!(
            parse_notification(r#"{"op":"insert","id":"z1"}"#),
            Some(ZoneChange::Upserted(ZoneId::from("z1")))
        );
        assert_eq!(
            parse_notification(r#"{"op":"update","id":"z1"}"#),
            Some(ZoneChange::Upserted(ZoneId::from("z1")))
        );
    }

    #[test]
    fn test_parse_notification_delete() {
        assert_eq!(
            parse_notification(r#"{"op":"delete","id":"z9"}"#),
            Some(ZoneChange::Removed(ZoneId::from("z9")))
        );
    }

    #[test]
    fn test_parse_notification_rejects_garbage() {
        assert_eq!(parse_notification("not json"), None);
        assert_eq!(parse_notification(r#"{"op":"truncate","id":"z1"}"#), None);
        assert_eq!(parse_notification(r#"{"op":"insert"}"#), None);
        assert_eq!(parse_notification(r#"{"op":"insert","id":7}"#), None);
    }

    #[test]
    fn test_encode_bounds_shape() {
        let bounds = vec![GeoPoint::new(1.5, -2.5).unwrap()];
        let value = encode_bounds(&ZoneId::from("z1"), &bounds).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"latitude": 1.5, "longitude": -2.5}])
        );
    }
}
