//! Common validation utilities.

use chrono::{TimeZone, Utc};
use validator::ValidationError;

/// Maximum allowed future timestamp tolerance in seconds (5 minutes for clock skew).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 300;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates that accuracy is non-negative.
pub fn validate_accuracy(accuracy: f64) -> Result<(), ValidationError> {
    if accuracy >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("accuracy_range");
        err.message = Some("Accuracy must be non-negative".into());
        Err(err)
    }
}

/// Validates that a sample timestamp (milliseconds since epoch) is usable.
/// - Must be representable as a UTC instant
/// - Must not be more than 5 minutes in the future (allows for clock skew)
///
/// Staleness is judged by the escalation engine against its maximum sample age.
pub fn validate_sample_timestamp(timestamp_millis: i64) -> Result<(), ValidationError> {
    let Some(timestamp) = Utc.timestamp_millis_opt(timestamp_millis).single() else {
        let mut err = ValidationError::new("timestamp_invalid");
        err.message = Some("Invalid timestamp format".into());
        return Err(err);
    };

    let future_limit = Utc::now() + chrono::Duration::seconds(MAX_FUTURE_TOLERANCE_SECS);
    if timestamp > future_limit {
        let mut err = ValidationError::new("timestamp_future");
        err.message = Some("Timestamp cannot be in the future".into());
        return Err(err);
    }

    Ok(())
}

/// Returns the age of a sample timestamp in seconds, or `None` when the
/// timestamp cannot be represented.
pub fn sample_age_secs(timestamp_millis: i64) -> Option<i64> {
    let timestamp = Utc.timestamp_millis_opt(timestamp_millis).single()?;
    Some((Utc::now() - timestamp).num_seconds())
}
