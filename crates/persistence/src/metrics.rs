//! Zone source metrics collection.
//!
//! Provides functions for recording zone-loading metrics.

use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Record zone source load duration.
pub fn record_load_duration(source: &str, duration_secs: f64) {
    histogram!(
        "zone_source_load_duration_seconds",
        "source" => source.to_string()
    )
    .record(duration_secs);
}

/// Record the outcome of a load attempt and the resulting zone count.
pub fn record_load_result(source: &str, zones: Option<usize>) {
    let status = if zones.is_some() { "ok" } else { "error" };
    counter!(
        "zone_source_loads_total",
        "source" => source.to_string(),
        "status" => status
    )
    .increment(1);
    gauge!("zones_loaded").set(zones.unwrap_or(0) as f64);
}

/// A helper to time zone source loads and record metrics.
///
/// Usage:
/// ```ignore
/// let timer = LoadTimer::new("file");
/// let result = source.fetch().await;
/// timer.record();
/// result
/// ```
pub struct LoadTimer {
    source: String,
    start: Instant,
}

impl LoadTimer {
    /// Create a new timer for the given source kind.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_load_duration(&self.source, duration);
    }
}
