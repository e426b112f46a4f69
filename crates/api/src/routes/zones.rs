//! Zone endpoint handlers.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use domain::models::{
    AdjustAlertsRequest, AlertSummaryRequest, AlertSummaryResponse, AreaResponse,
    CreateZoneRequest, DetectionSummaryRequest, DetectionSummaryResponse, ListZonesQuery,
    ListZonesResponse, ResolveZonesRequest, ResolveZonesResponse, SetZoneStatusRequest,
    UpdateZoneRequest, ZoneId, ZoneResponse,
};
use domain::services::{alert_summary as summarize_alerts, PolygonBuilder, ZoneDirectory, ZoneRef};
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use tracing::debug;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_zone_write, ZoneStreamGuard};

/// List zones from the live snapshot.
///
/// GET /api/v1/zones?status=<patrolled|pending>&withAlerts=<bool>
pub async fn list_zones(
    State(state): State<AppState>,
    Query(query): Query<ListZonesQuery>,
) -> Json<ListZonesResponse> {
    let snapshot = state.registry.snapshot();
    Json(ListZonesResponse::from_snapshot(&snapshot, &query))
}

/// Create a zone from a drawing.
///
/// POST /api/v1/zones
pub async fn create_zone(
    State(state): State<AppState>,
    Json(request): Json<CreateZoneRequest>,
) -> Result<(StatusCode, Json<ZoneResponse>), ApiError> {
    let mut builder = PolygonBuilder::new();
    builder.start_new();
    builder.set_name(request.name);
    builder.set_status(request.status);
    for point in &request.points {
        builder.add_point(point.lat, point.lng);
    }

    let id = state.registry.save(builder.build()?).await?;
    let zone = state.registry.get(&id).await?;
    record_zone_write("create");

    Ok((StatusCode::CREATED, Json(zone.into())))
}

/// Get a single zone.
///
/// GET /api/v1/zones/:zone_id
pub async fn get_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<ZoneId>,
) -> Result<Json<ZoneResponse>, ApiError> {
    let zone = state.registry.get(&zone_id).await?;
    Ok(Json(zone.into()))
}

/// Partially update a zone.
///
/// PATCH /api/v1/zones/:zone_id
pub async fn update_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<ZoneId>,
    Json(request): Json<UpdateZoneRequest>,
) -> Result<Json<ZoneResponse>, ApiError> {
    let patch = request.into_patch()?;
    let zone = state.registry.update(&zone_id, patch).await?;
    record_zone_write("update");
    Ok(Json(zone.into()))
}

/// Delete a zone. Entities referencing it are left untouched.
///
/// DELETE /api/v1/zones/:zone_id
pub async fn delete_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<ZoneId>,
) -> Result<StatusCode, ApiError> {
    state.registry.delete(&zone_id).await?;
    record_zone_write("delete");
    Ok(StatusCode::NO_CONTENT)
}

/// Set the patrol status of a zone.
///
/// PUT /api/v1/zones/:zone_id/status
pub async fn set_zone_status(
    State(state): State<AppState>,
    Path(zone_id): Path<ZoneId>,
    Json(request): Json<SetZoneStatusRequest>,
) -> Result<Json<ZoneResponse>, ApiError> {
    let zone = state.registry.set_status(&zone_id, request.status).await?;
    record_zone_write("set_status");
    Ok(Json(zone.into()))
}

/// Adjust the active alert count of a zone.
///
/// POST /api/v1/zones/:zone_id/alerts
pub async fn adjust_alerts(
    State(state): State<AppState>,
    Path(zone_id): Path<ZoneId>,
    Json(request): Json<AdjustAlertsRequest>,
) -> Result<Json<ZoneResponse>, ApiError> {
    let zone = state
        .registry
        .increment_active_alerts(&zone_id, request.delta)
        .await?;
    record_zone_write("adjust_alerts");
    Ok(Json(zone.into()))
}

/// Area figures for a stored zone.
///
/// GET /api/v1/zones/:zone_id/area
pub async fn zone_area(
    State(state): State<AppState>,
    Path(zone_id): Path<ZoneId>,
) -> Result<Json<AreaResponse>, ApiError> {
    let zone = state.registry.get(&zone_id).await?;
    Ok(Json(AreaResponse::for_bounds(Some(zone.id), &zone.bounds)))
}

/// Resolve zone ids to display names against the current snapshot.
///
/// POST /api/v1/zones/resolve
pub async fn resolve_zones(
    State(state): State<AppState>,
    Json(request): Json<ResolveZonesRequest>,
) -> Json<ResolveZonesResponse> {
    let directory = state.registry.directory();
    let zones = request
        .zone_ids
        .into_iter()
        .map(|id| resolve_id(&directory, id))
        .collect();
    Json(ResolveZonesResponse { zones })
}

fn resolve_id(directory: &ZoneDirectory, zone_id: Option<ZoneId>) -> ZoneRef {
    let name = directory.resolve_zone_name(zone_id.as_ref()).to_string();
    let status = zone_id
        .as_ref()
        .and_then(|id| directory.resolve_zone_status(id));
    ZoneRef {
        known: status.is_some(),
        zone_id,
        name,
        status,
    }
}

/// Per-zone alert breakdown over the current snapshot.
///
/// POST /api/v1/zones/alert-summary
pub async fn alert_summary(
    State(state): State<AppState>,
    Json(request): Json<AlertSummaryRequest>,
) -> Json<AlertSummaryResponse> {
    let snapshot = state.registry.snapshot();
    let directory = ZoneDirectory::from_zones(&snapshot.zones);

    let zones = summarize_alerts(&snapshot.zones, &request.alerts);
    let orphaned_alert_ids = directory
        .orphaned(&request.alerts)
        .into_iter()
        .map(|a| a.id.clone())
        .collect();

    Json(AlertSummaryResponse {
        zones,
        orphaned_alert_ids,
    })
}

/// Detection and animal counts per referenced zone.
///
/// POST /api/v1/zones/detection-summary
pub async fn detection_summary(
    State(state): State<AppState>,
    Json(request): Json<DetectionSummaryRequest>,
) -> Json<DetectionSummaryResponse> {
    let directory = state.registry.directory();
    Json(DetectionSummaryResponse::build(&directory, &request.detections))
}

/// Live zone set as Server-Sent Events.
///
/// GET /api/v1/zones/stream?status=<patrolled|pending>&withAlerts=<bool>
///
/// Sends a `zones` event with the full (filtered) set on every publish
/// and a `stale` event while the feed has lost its upstream. Nothing is
/// sent before the first load. Dropping the connection unsubscribes.
pub async fn stream_zones(
    State(state): State<AppState>,
    Query(query): Query<ListZonesQuery>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription = state.registry.list();
    let guard = ZoneStreamGuard::open();
    debug!(
        subscribers = state.registry.subscriber_count(),
        "Zone stream opened"
    );

    let events = WatchStream::new(subscription.into_receiver())
        .filter(|snapshot| snapshot.loaded || snapshot.stale)
        .map(move |snapshot| {
            let _open = &guard;
            let name = if snapshot.stale { "stale" } else { "zones" };
            Event::default()
                .event(name)
                .json_data(ListZonesResponse::from_snapshot(&snapshot, &query))
        });

    let keep_alive = Duration::from_secs(state.config.realtime.keep_alive_secs);
    Sse::new(events).keep_alive(KeepAlive::new().interval(keep_alive))
}
