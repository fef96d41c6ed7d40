//! Repository implementations for zone data.

pub mod zone;

pub use zone::{TestZoneConfig, ZoneRepository};
