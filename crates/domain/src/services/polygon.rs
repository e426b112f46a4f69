//! Interactive zone boundary drawing.
//!
//! A [`PolygonBuilder`] accumulates vertices clicked on the map surface.
//! It never talks to storage: [`PolygonBuilder::build`] validates the
//! session and produces a [`SaveRequest`] for the zone registry.

use serde::{Deserialize, Serialize};

use shared::validation::{validate_zone_name, MIN_POLYGON_VERTICES};

use crate::error::ZoneError;
use crate::models::{GeoPoint, LastPatrolledUpdate, NewZone, Zone, ZoneId, ZonePatch, ZoneStatus};

/// Identifier of a vertex within one drawing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(u64);

/// A vertex as captured from the map, before range validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DraftPoint {
    pub id: PointId,
    pub lat: f64,
    pub lng: f64,
}

/// The outcome of a valid drawing session.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    Create(NewZone),
    Update(ZoneId, ZonePatch),
}

/// Drawing-session state for one zone boundary.
#[derive(Debug, Clone, Default)]
pub struct PolygonBuilder {
    points: Vec<DraftPoint>,
    next_id: u64,
    drawing: bool,
    name: String,
    status: ZoneStatus,
    editing: Option<ZoneId>,
}

impl PolygonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the session for a new zone and enters drawing mode.
    pub fn start_new(&mut self) {
        self.points.clear();
        self.name.clear();
        self.status = ZoneStatus::Pending;
        self.editing = None;
        self.drawing = true;
    }

    /// Loads an existing zone so that saving updates it.
    pub fn edit(&mut self, zone: &Zone) {
        self.points.clear();
        for p in &zone.bounds {
            self.add_point(p.latitude(), p.longitude());
        }
        self.name = zone.name.clone();
        self.status = zone.status;
        self.editing = Some(zone.id.clone());
        self.drawing = true;
    }

    /// Appends a vertex. Always succeeds; no de-duplication or
    /// self-intersection check is made.
    pub fn add_point(&mut self, lat: f64, lng: f64) -> PointId {
        let id = PointId(self.next_id);
        self.next_id += 1;
        self.points.push(DraftPoint { id, lat, lng });
        id
    }

    /// Map click callback: adds a vertex only while in drawing mode.
    pub fn handle_map_click(&mut self, lat: f64, lng: f64) -> Option<PointId> {
        if !self.drawing {
            return None;
        }
        Some(self.add_point(lat, lng))
    }

    /// Removes a vertex, preserving the order of the rest.
    /// Returns `false` if no vertex has that id.
    pub fn remove_point(&mut self, id: PointId) -> bool {
        let before = self.points.len();
        self.points.retain(|p| p.id != id);
        self.points.len() != before
    }

    /// Empties the sequence and exits drawing mode.
    pub fn clear(&mut self) {
        self.points.clear();
        self.drawing = false;
        self.editing = None;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_status(&mut self, status: ZoneStatus) {
        self.status = status;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ZoneStatus {
        self.status
    }

    pub fn points(&self) -> &[DraftPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// The zone being edited, if this session started from [`Self::edit`].
    pub fn editing(&self) -> Option<&ZoneId> {
        self.editing.as_ref()
    }

    /// At least three vertices and a name that is non-empty once trimmed.
    ///
    /// Degenerate (collinear) rings pass: only the vertex count is checked.
    pub fn is_valid_for_save(&self) -> bool {
        self.points.len() >= MIN_POLYGON_VERTICES && !self.name.trim().is_empty()
    }

    /// Validates the session and converts it into a save request.
    pub fn build(&self) -> Result<SaveRequest, ZoneError> {
        if self.points.len() < MIN_POLYGON_VERTICES {
            return Err(ZoneError::Validation(
                "At least 3 points are required to create a zone".to_string(),
            ));
        }
        validate_zone_name(&self.name).map_err(|e| {
            ZoneError::Validation(
                e.message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Zone name is invalid".to_string()),
            )
        })?;

        let bounds = self
            .points
            .iter()
            .map(|p| GeoPoint::new(p.lat, p.lng))
            .collect::<Result<Vec<_>, _>>()?;
        let name = self.name.trim().to_string();

        Ok(match &self.editing {
            Some(id) => SaveRequest::Update(
                id.clone(),
                ZonePatch {
                    name: Some(name),
                    status: Some(self.status),
                    bounds: Some(bounds),
                    last_patrolled_at: LastPatrolledUpdate::Clear,
                    ..Default::default()
                },
            ),
            None => SaveRequest::Create(NewZone {
                name,
                status: self.status,
                bounds,
            }),
        })
    }
}
