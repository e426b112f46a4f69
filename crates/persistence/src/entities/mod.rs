//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod zone;

pub use zone::ZoneEntity;
