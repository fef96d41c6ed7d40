//! Proximity monitor.
//!
//! Evaluates each location sample against the zone index and reports
//! edge-triggered enter/exit transitions.

use tracing::{debug, info, warn};

use crate::models::{LocationErrorReport, LocationSample, ProximityState, Transition, Zone};
use crate::services::zone_index::ZoneIndex;

/// Tracks whether the latest sample is inside a qualifying zone.
#[derive(Debug, Default)]
pub struct ProximityMonitor {
    index: ZoneIndex,
    state: ProximityState,
}

impl ProximityMonitor {
    pub fn new(index: ZoneIndex) -> Self {
        Self {
            index,
            state: ProximityState::default(),
        }
    }

    pub fn index(&self) -> &ZoneIndex {
        &self.index
    }

    pub fn state(&self) -> &ProximityState {
        &self.state
    }

    pub fn in_danger_zone(&self) -> bool {
        self.state.in_danger_zone
    }

    pub fn active_zone(&self) -> Option<&Zone> {
        self.state.active_zone.as_ref()
    }

    /// Swaps in a new zone collection.
    ///
    /// The last known `in_danger_zone` is kept; the next sample is
    /// evaluated against the new zones.
    pub fn replace_index(&mut self, index: ZoneIndex) {
        info!(
            previous = self.index.len(),
            current = index.len(),
            "Zone index replaced"
        );
        self.index = index;
    }

    /// Evaluates a sample. Emits a transition only when `in_danger_zone`
    /// changes.
    pub fn on_location(&mut self, sample: &LocationSample) -> Option<Transition> {
        let nearest = self
            .index
            .nearest_alerting(sample.coordinate())
            .map(|(zone, distance)| (zone.clone(), distance));

        let was_inside = self.state.in_danger_zone;

        match nearest {
            Some((zone, distance)) => {
                debug!(
                    zone = %zone.name,
                    risk_level = %zone.risk_level,
                    distance_m = distance.round(),
                    "Sample inside alerting zone"
                );
                self.state.in_danger_zone = true;
                self.state.active_zone = Some(zone.clone());
                if was_inside {
                    None
                } else {
                    info!(zone = %zone.name, risk_level = %zone.risk_level, "Entered danger zone");
                    Some(Transition::Entered(zone))
                }
            }
            None => {
                self.state.in_danger_zone = false;
                self.state.active_zone = None;
                if was_inside {
                    info!("Exited danger zone");
                    Some(Transition::Exited)
                } else {
                    None
                }
            }
        }
    }

    /// Records a provider failure. State is left as it was; there is no retry.
    pub fn on_location_error(&self, report: &LocationErrorReport) {
        warn!(
            kind = %report.kind,
            message = report.message.as_deref().unwrap_or(""),
            in_danger_zone = self.state.in_danger_zone,
            "Location unavailable, proximity state frozen"
        );
    }
}
