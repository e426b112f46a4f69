//! Spatial membership resolution.
//!
//! Drones, alerts and animal detections point at zones through a stored
//! `zone_id`. Resolution is a plain foreign-key join against the loaded
//! zone set; no point-in-polygon test is made. A dangling id resolves to
//! [`UNKNOWN_ZONE_LABEL`] instead of failing, since deleting a zone does
//! not cascade to the entities referencing it.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{Alert, AnimalDetection, Zone, ZoneId, ZoneReference, ZoneStatus};

/// Display label for a zone id that is not in the loaded set.
pub const UNKNOWN_ZONE_LABEL: &str = "Zona desconocida";

/// Display attributes of a referenced zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRef {
    pub zone_id: Option<ZoneId>,
    pub name: String,
    pub status: Option<ZoneStatus>,
    pub known: bool,
}

/// Id-indexed view over a loaded zone set.
#[derive(Debug, Clone, Default)]
pub struct ZoneDirectory {
    by_id: HashMap<ZoneId, (String, ZoneStatus)>,
}

impl ZoneDirectory {
    pub fn from_zones(zones: &[Zone]) -> Self {
        let by_id = zones
            .iter()
            .map(|z| (z.id.clone(), (z.name.clone(), z.status)))
            .collect();
        Self { by_id }
    }

    pub fn contains(&self, id: &ZoneId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Zone name for `zone_id`, or [`UNKNOWN_ZONE_LABEL`].
    pub fn resolve_zone_name(&self, zone_id: Option<&ZoneId>) -> &str {
        zone_id
            .and_then(|id| self.by_id.get(id))
            .map(|(name, _)| name.as_str())
            .unwrap_or(UNKNOWN_ZONE_LABEL)
    }

    pub fn resolve_zone_status(&self, zone_id: &ZoneId) -> Option<ZoneStatus> {
        self.by_id.get(zone_id).map(|(_, status)| *status)
    }

    /// Resolves the zone an entity points at.
    pub fn resolve<E: ZoneReference + ?Sized>(&self, entity: &E) -> ZoneRef {
        let zone_id = entity.zone_id().cloned();
        match zone_id.as_ref().and_then(|id| self.by_id.get(id)) {
            Some((name, status)) => ZoneRef {
                zone_id,
                name: name.clone(),
                status: Some(*status),
                known: true,
            },
            None => ZoneRef {
                zone_id,
                name: UNKNOWN_ZONE_LABEL.to_string(),
                status: None,
                known: false,
            },
        }
    }

    /// Entities whose zone id is set but does not resolve.
    pub fn orphaned<'a, E: ZoneReference>(&self, entities: &'a [E]) -> Vec<&'a E> {
        entities
            .iter()
            .filter(|e| e.zone_id().is_some_and(|id| !self.contains(id)))
            .collect()
    }
}

/// Alert severity of a zone, driven by its worst open alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneSeverity {
    Critical,
    Warning,
    Clear,
}

/// Per-zone alert counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneAlertSummary {
    pub zone_id: ZoneId,
    pub name: String,
    pub critical: usize,
    pub non_critical: usize,
    pub total: usize,
    pub severity: ZoneSeverity,
    /// Share of the busiest zone's alert total, 0–100.
    pub relative_load: f64,
}

/// Counts alerts per zone, in zone order.
pub fn alert_summary(zones: &[Zone], alerts: &[Alert]) -> Vec<ZoneAlertSummary> {
    let mut counts: HashMap<&ZoneId, (usize, usize)> = HashMap::new();
    for alert in alerts {
        if let Some(id) = alert.zone_id() {
            let entry = counts.entry(id).or_default();
            if alert.critical {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
    }

    let max_total = zones
        .iter()
        .map(|z| counts.get(&z.id).map_or(0, |(c, n)| c + n))
        .max()
        .unwrap_or(0);

    zones
        .iter()
        .map(|zone| {
            let (critical, non_critical) = counts.get(&zone.id).copied().unwrap_or_default();
            let total = critical + non_critical;
            let severity = if critical > 0 {
                ZoneSeverity::Critical
            } else if non_critical > 0 {
                ZoneSeverity::Warning
            } else {
                ZoneSeverity::Clear
            };
            let relative_load = if max_total > 0 {
                total as f64 / max_total as f64 * 100.0
            } else {
                0.0
            };
            ZoneAlertSummary {
                zone_id: zone.id.clone(),
                name: zone.name.clone(),
                critical,
                non_critical,
                total,
                severity,
                relative_load,
            }
        })
        .collect()
}

/// Detection records and animals counted per referenced zone id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ZoneDetectionCount {
    pub detections: usize,
    pub animals: u64,
}

/// Groups detections by the zone they reference. Dangling ids are kept so
/// callers can label them with `resolve_zone_name`.
pub fn detections_by_zone(
    detections: &[AnimalDetection],
) -> BTreeMap<ZoneId, ZoneDetectionCount> {
    let mut counts: BTreeMap<ZoneId, ZoneDetectionCount> = BTreeMap::new();
    for detection in detections {
        if let Some(id) = detection.zone_id() {
            let entry = counts.entry(id.clone()).or_default();
            entry.detections += 1;
            entry.animals += u64::from(detection.count);
        }
    }
    counts
}

/// Splits zones into `(patrolled, pending)`.
pub fn partition_by_status(zones: &[Zone]) -> (Vec<&Zone>, Vec<&Zone>) {
    zones
        .iter()
        .partition(|z| z.status == ZoneStatus::Patrolled)
}
