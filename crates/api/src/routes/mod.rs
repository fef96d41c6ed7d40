//! HTTP route handlers.

pub mod health;
pub mod location;
pub mod session;
pub mod zones;
