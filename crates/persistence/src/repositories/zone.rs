//! Zone repository.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use domain::models::{RiskLevel, Zone};
use domain::services::ZoneIndex;
use shared::Coordinate;

use crate::entities::{row_label, ZoneRecord};
use crate::metrics::{record_load_result, LoadTimer};
use crate::sources::{ZoneSource, ZoneSourceError};

/// Synthetic zone appended to every load, for exercising the engine in the
/// field without travelling to a real zone.
#[derive(Debug, Clone, PartialEq)]
pub struct TestZoneConfig {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub risk_level: RiskLevel,
}

impl TestZoneConfig {
    fn to_zone(&self) -> Zone {
        Zone::new(
            self.name.clone(),
            Coordinate::new(self.lat, self.lng),
            self.risk_level,
            0,
        )
    }
}

/// Repository for loading the zone collection.
#[derive(Clone)]
pub struct ZoneRepository {
    source: Arc<dyn ZoneSource>,
    test_zone: Option<TestZoneConfig>,
    unavailable_logged: Arc<AtomicBool>,
}

impl ZoneRepository {
    /// Creates a new ZoneRepository reading from the given source.
    pub fn new(source: Arc<dyn ZoneSource>) -> Self {
        Self {
            source,
            test_zone: None,
            unavailable_logged: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_test_zone(mut self, test_zone: Option<TestZoneConfig>) -> Self {
        self.test_zone = test_zone;
        self
    }

    pub fn source(&self) -> &dyn ZoneSource {
        self.source.as_ref()
    }

    /// Load the zone index, reporting source failures.
    ///
    /// Rows that do not decode or validate are skipped with a warning; they
    /// never fail the load.
    pub async fn try_load(&self) -> Result<ZoneIndex, ZoneSourceError> {
        let kind = self.source.kind().as_str();
        let timer = LoadTimer::new(kind);
        let result = self.source.fetch().await;
        timer.record();

        let rows = match result {
            Ok(rows) => rows,
            Err(e) => {
                record_load_result(kind, None);
                return Err(e);
            }
        };

        let total = rows.len();
        let mut index = ZoneIndex::empty();
        for (position, row) in rows.into_iter().enumerate() {
            let name = row_label(&row).to_string();
            match ZoneRecord::from_row(row).and_then(Zone::try_from) {
                Ok(zone) => index.push(zone),
                Err(e) => {
                    tracing::warn!(
                        zone = %name,
                        position = position,
                        error = %e,
                        "Skipping invalid zone record"
                    );
                }
            }
        }

        if let Some(test_zone) = &self.test_zone {
            tracing::info!(zone = %test_zone.name, "Appending synthetic test zone");
            index.push(test_zone.to_zone());
        }

        record_load_result(kind, Some(index.len()));
        self.unavailable_logged.store(false, Ordering::Relaxed);
        tracing::info!(
            source = %self.source.describe(),
            records = total,
            zones = index.len(),
            "Zones loaded"
        );

        Ok(index)
    }

    /// Load the zone index, degrading to an empty collection when the
    /// source is unavailable. The failure is logged once until a load
    /// succeeds again.
    pub async fn load(&self) -> ZoneIndex {
        match self.try_load().await {
            Ok(index) => index,
            Err(e) => {
                if !self.unavailable_logged.swap(true, Ordering::Relaxed) {
                    tracing::warn!(
                        source = %self.source.describe(),
                        error = %e,
                        "Zone data unavailable, running with no zones"
                    );
                } else {
                    tracing::debug!(error = %e, "Zone data still unavailable");
                }

                let mut index = ZoneIndex::empty();
                if let Some(test_zone) = &self.test_zone {
                    index.push(test_zone.to_zone());
                }
                index
            }
        }
    }
}
