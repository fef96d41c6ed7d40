//! Background tasks.

mod escalation_driver;

pub use escalation_driver::EscalationDriver;
