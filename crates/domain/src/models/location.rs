//! Location sample domain model.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use shared::Coordinate;
use validator::Validate;

use super::escalation::SessionSnapshot;

/// The most recent device position. No history is retained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub lat: f64,
    pub lng: f64,
    /// When the provider captured the fix. Unknown means "now".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

impl LocationSample {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            captured_at: None,
        }
    }

    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = Some(captured_at);
        self
    }

    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

impl From<Coordinate> for LocationSample {
    fn from(c: Coordinate) -> Self {
        Self::new(c.lat, c.lng)
    }
}

/// Request payload pushed by a location provider.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationSampleRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub lat: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub lng: f64,

    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: Option<f64>,

    /// Capture time in milliseconds since epoch.
    #[validate(custom(function = "shared::validation::validate_sample_timestamp"))]
    pub timestamp: Option<i64>,
}

impl LocationSampleRequest {
    pub fn sample(&self) -> LocationSample {
        let sample = LocationSample::new(self.lat, self.lng);
        match self
            .timestamp
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        {
            Some(captured_at) => sample.with_captured_at(captured_at),
            None => sample,
        }
    }
}

/// Reasons a location provider can stop delivering samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationErrorKind {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

impl std::fmt::Display for LocationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationErrorKind::PermissionDenied => write!(f, "permission_denied"),
            LocationErrorKind::PositionUnavailable => write!(f, "position_unavailable"),
            LocationErrorKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// Why a sample was not evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleRejection {
    /// Older than the configured maximum sample age.
    Stale,
    /// Captured before the last accepted sample.
    OutOfOrder,
}

impl SampleRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleRejection::Stale => "stale",
            SampleRejection::OutOfOrder => "out_of_order",
        }
    }
}

impl std::fmt::Display for SampleRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported on the location provider's error channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationErrorReport {
    pub kind: LocationErrorKind,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response after a sample has been evaluated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSampleResponse {
    /// `entered`, `exited` or absent when nothing changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
    pub in_danger_zone: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_zone: Option<String>,
    /// Session opened by this sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSnapshot>,
    /// Set when the sample was dropped without changing any state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<SampleRejection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_sample_request_minimal() {
        let json = r#"{"lat": 28.61, "lng": 77.20}"#;
        let request: LocationSampleRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.sample(), LocationSample::new(28.61, 77.20));
        assert!(request.accuracy.is_none());
        assert!(request.timestamp.is_none());
    }

    #[test]
    fn test_location_sample_request_rejects_bad_latitude() {
        let json = r#"{"lat": 128.61, "lng": 77.20}"#;
        let request: LocationSampleRequest = serde_json::from_str(json).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("lat"));
    }

    #[test]
    fn test_location_sample_request_rejects_negative_accuracy() {
        let json = r#"{"lat": 1.0, "lng": 2.0, "accuracy": -3.0}"#;
        let request: LocationSampleRequest = serde_json::from_str(json).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("accuracy"));
    }

    #[test]
    fn test_location_error_report_deserialization() {
        let json = r#"{"kind": "permissionDenied", "message": "User denied Geolocation"}"#;
        let report: LocationErrorReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.kind, LocationErrorKind::PermissionDenied);
        assert_eq!(report.kind.to_string(), "permission_denied");

        let report: LocationErrorReport = serde_json::from_str(r#"{"kind": "timeout"}"#).unwrap();
        assert_eq!(report.kind, LocationErrorKind::Timeout);
        assert!(report.message.is_none());
    }

    #[test]
    fn test_location_sample_response_skips_none() {
        let response = LocationSampleResponse {
            transition: None,
            in_danger_zone: false,
            active_zone: None,
            session: None,
            ignored: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"inDangerZone":false}"#);
    }

    #[test]
    fn test_location_sample_request_carries_capture_time() {
        let json = r#"{"lat": 1.0, "lng": 2.0, "timestamp": 1700000000000}"#;
        let request: LocationSampleRequest = serde_json::from_str(json).unwrap();
        let sample = request.sample();
        assert_eq!(
            sample.captured_at.map(|t| t.timestamp_millis()),
            Some(1_700_000_000_000)
        );
    }

    #[test]
    fn test_ignored_response_serialization() {
        let response = LocationSampleResponse {
            transition: None,
            in_danger_zone: true,
            active_zone: Some("Delhi".to_string()),
            session: None,
            ignored: Some(SampleRejection::OutOfOrder),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"inDangerZone":true,"activeZone":"Delhi","ignored":"out_of_order"}"#
        );
    }
}
