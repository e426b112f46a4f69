//! Area estimation for zone boundaries.
//!
//! Two figures are available:
//! - [`shoelace_area`]: the shoelace formula applied directly to
//!   latitude/longitude pairs. The result is in degree², not a physical
//!   unit, and is kept for display parity with existing dashboards.
//! - [`geodesic_area_km2`]: spherical area using the Chamberlain–Duquette
//!   algorithm, in km².
//!
//! Neither handles rings crossing the antimeridian or enclosing a pole.

use geo::{ChamberlainDuquetteArea, LineString, Polygon};

use crate::models::GeoPoint;

/// Map center used when there are no points to average.
pub const DEFAULT_MAP_CENTER: GeoPoint = GeoPoint::new_unchecked(40.7128, -74.0060);

const MIN_RING_POINTS: usize = shared::validation::MIN_POLYGON_VERTICES;

/// Shoelace area of an implicitly closed ring, in degree².
///
/// Returns `0.0` for fewer than three points. The result does not depend
/// on the starting vertex or winding direction.
pub fn shoelace_area(bounds: &[GeoPoint]) -> f64 {
    let n = bounds.len();
    if n < MIN_RING_POINTS {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += bounds[i].latitude() * bounds[j].longitude();
        area -= bounds[j].latitude() * bounds[i].longitude();
    }
    area.abs() / 2.0
}

/// Spherical area of an implicitly closed ring, in km².
pub fn geodesic_area_km2(bounds: &[GeoPoint]) -> f64 {
    if bounds.len() < MIN_RING_POINTS {
        return 0.0;
    }

    let exterior: LineString<f64> = bounds
        .iter()
        .map(|p| geo::Coord::from(*p))
        .collect::<Vec<_>>()
        .into();
    let polygon = Polygon::new(exterior, vec![]);
    polygon.chamberlain_duquette_unsigned_area() / 1_000_000.0
}

/// Arithmetic mean of the given points, or `None` when empty.
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lng) = points.iter().fold((0.0, 0.0), |(lat, lng), p| {
        (lat + p.latitude(), lng + p.longitude())
    });
    Some(GeoPoint::new_unchecked(lat / n, lng / n))
}

/// Center for a map view over the given points.
pub fn map_center(points: &[GeoPoint]) -> GeoPoint {
    centroid(points).unwrap_or(DEFAULT_MAP_CENTER)
}
