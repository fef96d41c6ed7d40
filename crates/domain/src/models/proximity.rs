//! Proximity state and zone transitions.

use super::zone::Zone;

/// Derived state held by the proximity monitor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProximityState {
    pub in_danger_zone: bool,
    /// Nearest qualifying zone for the latest sample.
    pub active_zone: Option<Zone>,
}

/// Edge-triggered change of `in_danger_zone`.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Entered(Zone),
    Exited,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Entered(_) => "entered",
            Transition::Exited => "exited",
        }
    }
}
