//! Persistence layer for Zone Guard.
//!
//! This crate contains:
//! - Zone data source management (file and HTTP)
//! - Entity definitions (zone dataset record mappings)
//! - Repository implementations

pub mod entities;
pub mod metrics;
pub mod repositories;
pub mod sources;
