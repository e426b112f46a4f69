//! `ZoneStore` implementations.

pub mod memory;
pub mod zone;

pub use memory::MemoryZoneStore;
pub use zone::PgZoneStore;
