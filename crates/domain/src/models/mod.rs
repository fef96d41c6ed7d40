//! Domain models for Zone Guard.

pub mod escalation;
pub mod location;
pub mod proximity;
pub mod zone;

pub use escalation::{
    EngineSnapshot, Outcome, Phase, SessionAction, SessionSnapshot, SessionTrigger,
};
pub use location::{
    LocationErrorKind, LocationErrorReport, LocationSample, LocationSampleRequest,
    LocationSampleResponse, SampleRejection,
};
pub use proximity::{ProximityState, Transition};
pub use zone::{ListZonesQuery, ListZonesResponse, RiskLevel, Zone, ZoneResponse, ZoneSort};
