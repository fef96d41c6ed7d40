//! Zone entity (dataset record mapping).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use domain::models::{RiskLevel, Zone};
use shared::Coordinate;

/// One undecoded element of the dataset array.
pub type ZoneRow = serde_json::Value;

/// Splits a dataset into rows. Only a top level that is not an array is an
/// error; each row is decoded on its own later.
pub fn parse_rows(bytes: &[u8]) -> Result<Vec<ZoneRow>, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Coordinates as they appear in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub lat: f64,
    pub lng: f64,
}

/// One element of the zone dataset.
///
/// `{state|name, location: {lat, lng}, riskLevel, totalIncidents}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRecord {
    #[serde(alias = "state")]
    pub name: String,
    pub location: LocationRecord,
    pub risk_level: String,
    #[serde(default)]
    pub total_incidents: u32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZoneRecordError {
    #[error("Malformed zone record: {0}")]
    Malformed(String),

    #[error("Zone name is empty")]
    EmptyName,

    #[error("Unknown risk level '{0}'")]
    UnknownRiskLevel(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(#[from] shared::geodesy::CoordinateError),
}

impl ZoneRecord {
    /// Decodes one dataset row.
    pub fn from_row(row: ZoneRow) -> Result<Self, ZoneRecordError> {
        serde_json::from_value(row).map_err(|e| ZoneRecordError::Malformed(e.to_string()))
    }
}

/// Best-effort name of a row for log messages.
pub fn row_label(row: &ZoneRow) -> &str {
    row.get("name")
        .or_else(|| row.get("state"))
        .and_then(ZoneRow::as_str)
        .unwrap_or("<unnamed>")
}

impl TryFrom<ZoneRecord> for Zone {
    type Error = ZoneRecordError;

    fn try_from(record: ZoneRecord) -> Result<Self, Self::Error> {
        let name = record.name.trim();
        if name.is_empty() {
            return Err(ZoneRecordError::EmptyName);
        }
        let risk_level = RiskLevel::parse(&record.risk_level)
            .ok_or_else(|| ZoneRecordError::UnknownRiskLevel(record.risk_level.clone()))?;
        let location = Coordinate::checked(record.location.lat, record.location.lng)?;

        Ok(Zone::new(name, location, risk_level, record.total_incidents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_record() -> ZoneRecord {
        ZoneRecord {
            name: "Delhi".to_string(),
            location: LocationRecord {
                lat: 28.6139,
                lng: 77.209,
            },
            risk_level: "critical".to_string(),
            total_incidents: 1250,
        }
    }

    #[test]
    fn test_zone_record_to_domain() {
        let record = create_test_record();
        let zone = Zone::try_from(record.clone()).unwrap();

        assert_eq!(zone.name, record.name);
        assert_eq!(zone.location.lat, record.location.lat);
        assert_eq!(zone.location.lng, record.location.lng);
        assert_eq!(zone.risk_level, RiskLevel::Critical);
        assert_eq!(zone.total_incidents, 1250);
    }

    #[test]
    fn test_zone_record_accepts_state_alias() {
        let json = r#"{"state":"Bihar","location":{"lat":25.1,"lng":85.3},"riskLevel":"High","totalIncidents":900}"#;
        let record: ZoneRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Bihar");

        let zone = Zone::try_from(record).unwrap();
        assert_eq!(zone.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_zone_record_defaults_incidents() {
        let json = r#"{"name":"Goa","location":{"lat":15.3,"lng":74.1},"riskLevel":"low"}"#;
        let record: ZoneRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.total_incidents, 0);
    }

    #[test]
    fn test_from_row_rejects_malformed_rows() {
        let rows = parse_rows(
            br#"[
                {"state":"Delhi","location":{"lat":28.6,"lng":77.2},"riskLevel":"critical","totalIncidents":-1},
                {"state":"Goa","riskLevel":"low"},
                {"state":"Kerala","name":"Kerala","location":{"lat":8.5,"lng":76.9},"riskLevel":"low"},
                {"state":"Bihar","location":{"lat":25.1,"lng":85.3},"riskLevel":"high","totalIncidents":2.5}
            ]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(row_label(&rows[1]), "Goa");

        for row in rows {
            assert!(matches!(
                ZoneRecord::from_row(row),
                Err(ZoneRecordError::Malformed(_))
            ));
        }
    }

    #[test]
    fn test_parse_rows_requires_array() {
        assert!(parse_rows(br#"{"state":"Delhi"}"#).is_err());
        assert!(parse_rows(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_zone_record_rejects_unknown_risk() {
        let mut record = create_test_record();
        record.risk_level = "extreme".to_string();
        assert_eq!(
            Zone::try_from(record),
            Err(ZoneRecordError::UnknownRiskLevel("extreme".to_string()))
        );
    }

    #[test]
    fn test_zone_record_rejects_bad_coordinates_and_name() {
        let mut record = create_test_record();
        record.location.lat = 95.0;
        assert!(matches!(
            Zone::try_from(record),
            Err(ZoneRecordError::InvalidCoordinates(_))
        ));

        let mut record = create_test_record();
        record.name = "  ".to_string();
        assert_eq!(Zone::try_from(record), Err(ZoneRecordError::EmptyName));
    }
}
