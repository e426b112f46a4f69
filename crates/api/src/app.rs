use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::services::ZoneRegistry;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{geometry, health, zones};

#[derive(Clone)]
pub struct AppState {
    pub registry: ZoneRegistry,
    pub config: Arc<Config>,
    /// Present only with the PostgreSQL backend.
    pub pool: Option<PgPool>,
}

pub fn create_app(config: Config, registry: ZoneRegistry, pool: Option<PgPool>) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        registry,
        config: config.clone(),
        pool,
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    let zone_routes = Router::new()
        .route(
            "/api/v1/zones",
            get(zones::list_zones).post(zones::create_zone),
        )
        .route("/api/v1/zones/resolve", post(zones::resolve_zones))
        .route("/api/v1/zones/alert-summary", post(zones::alert_summary))
        .route(
            "/api/v1/zones/detection-summary",
            post(zones::detection_summary),
        )
        .route(
            "/api/v1/zones/:zone_id",
            get(zones::get_zone)
                .patch(zones::update_zone)
                .delete(zones::delete_zone),
        )
        .route("/api/v1/zones/:zone_id/status", put(zones::set_zone_status))
        .route("/api/v1/zones/:zone_id/alerts", post(zones::adjust_alerts))
        .route("/api/v1/zones/:zone_id/area", get(zones::zone_area))
        .route("/api/v1/geometry/area", post(geometry::area_preview))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CompressionLayer::new());

    // The stream is long-lived: no timeout, no compression buffering.
    let stream_routes = Router::new().route("/api/v1/zones/stream", get(zones::stream_zones));

    Router::new()
        .merge(public_routes)
        .merge(zone_routes)
        .merge(stream_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
