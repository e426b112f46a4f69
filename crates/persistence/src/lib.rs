//! Persistence layer for the AeroSentinel zone service.
//!
//! This crate contains:
//! - Database connection management and embedded migrations
//! - The `zones` row mapping
//! - PostgreSQL and in-memory `ZoneStore` implementations

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

pub use repositories::{MemoryZoneStore, PgZoneStore};
