//! Domain layer for the AeroSentinel zone service.
//!
//! This crate contains:
//! - Domain models (GeoPoint, Zone, and the entities that reference zones)
//! - Zone geometry services (polygon drawing, area estimation)
//! - The zone registry, its live feed and the storage port it talks to
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::{StoreError, ZoneError};
