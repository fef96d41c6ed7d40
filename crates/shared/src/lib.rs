//! Shared utilities and common types for Zone Guard.
//!
//! This crate provides common functionality used across all other crates:
//! - Geodesy (coordinates and great-circle distance)
//! - Common validation logic

pub mod geodesy;
pub mod validation;

pub use geodesy::{distance_meters, Coordinate, EARTH_RADIUS_METERS};
