//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: StoreHealth,
    pub feed: FeedHealth,
}

/// Zone store health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreHealth {
    pub backend: String,
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Live feed status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FeedHealth {
    pub loaded: bool,
    pub stale: bool,
    pub version: u64,
    pub zones: usize,
    pub subscribers: usize,
}

/// Simple status response for liveness checks.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Full health check endpoint.
///
/// Unhealthy (503) when the database is unreachable. A stale feed is
/// reported as `degraded` but still answers 200.
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let store = match &state.pool {
        Some(pool) => {
            let start = std::time::Instant::now();
            let connected = sqlx::query("SELECT 1").execute(pool).await.is_ok();
            let latency_ms = start.elapsed().as_millis() as u64;
            persistence::metrics::record_pool_metrics(pool);
            StoreHealth {
                backend: state.config.store.backend.as_str().to_string(),
                connected,
                latency_ms: connected.then_some(latency_ms),
            }
        }
        None => StoreHealth {
            backend: state.config.store.backend.as_str().to_string(),
            connected: true,
            latency_ms: None,
        },
    };

    let snapshot = state.registry.snapshot();
    let feed = FeedHealth {
        loaded: snapshot.loaded,
        stale: snapshot.stale,
        version: snapshot.version,
        zones: snapshot.len(),
        subscribers: state.registry.subscriber_count(),
    };

    let (code, status) = overall_status(&store, &feed);
    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store,
        feed,
    };
    (code, Json(response))
}

fn overall_status(store: &StoreHealth, feed: &FeedHealth) -> (StatusCode, &'static str) {
    if !store.connected {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    } else if feed.stale {
        (StatusCode::OK, "degraded")
    } else {
        (StatusCode::OK, "healthy")
    }
}

/// Liveness endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}
