//! Domain layer for Zone Guard.
//!
//! This crate contains:
//! - Domain models (Zone, LocationSample, escalation phases and outcomes)
//! - The proximity monitor and escalation state machine
//! - Alert sink, notification and dialer abstractions
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::DomainError;
