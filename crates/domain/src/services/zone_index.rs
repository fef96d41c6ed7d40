//! In-memory zone index.

use shared::Coordinate;

use crate::models::{ListZonesQuery, RiskLevel, Zone, ZoneSort};

/// Alert radius in meters for a risk level.
pub const fn radius_for(risk_level: RiskLevel) -> f64 {
    risk_level.alert_radius_meters()
}

/// Ordered, append-only collection of zones.
///
/// Order has no effect on alerting except as the tie-break between
/// equidistant zones (first occurrence wins).
#[derive(Debug, Clone, Default)]
pub struct ZoneIndex {
    zones: Vec<Zone>,
}

impl ZoneIndex {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn all_zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Appends a zone. Existing entries are never modified.
    pub fn push(&mut self, zone: Zone) {
        self.zones.push(zone);
    }

    /// Nearest high/critical zone whose alert radius contains `point`,
    /// with its distance in meters.
    pub fn nearest_alerting(&self, point: Coordinate) -> Option<(&Zone, f64)> {
        let mut nearest: Option<(&Zone, f64)> = None;

        for zone in self
            .zones
            .iter()
            .filter(|z| z.risk_level.triggers_escalation())
        {
            let distance = point.distance_to(&zone.location);
            if distance.is_nan() || distance >= radius_for(zone.risk_level) {
                continue;
            }
            // Strict comparison keeps the first of equidistant zones
            match nearest {
                Some((_, best)) if distance >= best => {}
                _ => nearest = Some((zone, distance)),
            }
        }

        nearest
    }

    /// Zones filtered and sorted for display.
    pub fn list(&self, query: &ListZonesQuery) -> Vec<&Zone> {
        let mut zones: Vec<&Zone> = self
            .zones
            .iter()
            .filter(|z| query.min_risk.map_or(true, |min| z.risk_level >= min))
            .collect();

        match query.sort {
            ZoneSort::Incidents => {
                zones.sort_by(|a, b| b.total_incidents.cmp(&a.total_incidents));
            }
            ZoneSort::Risk => zones.sort_by(|a, b| {
                b.risk_level
                    .cmp(&a.risk_level)
                    .then(b.total_incidents.cmp(&a.total_incidents))
            }),
            ZoneSort::Name => zones.sort_by(|a, b| a.name.cmp(&b.name)),
        }

        zones
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(name: &str, lat: f64, lng: f64, risk: RiskLevel, incidents: u32) -> Zone {
        Zone::new(name, Coordinate::new(lat, lng), risk, incidents)
    }

    #[test]
    fn test_radius_for() {
        assert_eq!(radius_for(RiskLevel::Critical), 60_000.0);
        assert_eq!(radius_for(RiskLevel::High), 40_000.0);
        assert_eq!(radius_for(RiskLevel::Medium), 25_000.0);
        assert_eq!(radius_for(RiskLevel::Low), 15_000.0);
    }

    #[test]
    fn test_nearest_alerting_within_radius() {
        let index = ZoneIndex::new(vec![zone("Origin", 0.0, 0.0, RiskLevel::Critical, 1)]);

        let hit = index.nearest_alerting(Coordinate::new(0.0, 0.5));
        assert_eq!(hit.map(|(z, _)| z.name.as_str()), Some("Origin"));

        assert!(index.nearest_alerting(Coordinate::new(0.0, 0.6)).is_none());
    }

    #[test]
    fn test_nearest_alerting_random_points_inside_radius() {
        use fake::Fake;

        let index = ZoneIndex::new(vec![zone("Origin", 0.0, 0.0, RiskLevel::Critical, 1)]);
        for _ in 0..50 {
            let point = Coordinate::new((-0.3..0.3).fake(), (-0.3..0.3).fake());
            let (hit, distance) = index.nearest_alerting(point).unwrap();
            assert_eq!(hit.name, "Origin");
            assert!(distance <= 60_000.0);
        }
    }

    #[test]
    fn test_nearest_alerting_ignores_low_and_medium() {
        let index = ZoneIndex::new(vec![
            zone("Low", 10.0, 10.0, RiskLevel::Low, 1),
            zone("Medium", 10.0, 10.0, RiskLevel::Medium, 1),
        ]);
        assert!(index.nearest_alerting(Coordinate::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn test_nearest_alerting_picks_closest() {
        let index = ZoneIndex::new(vec![
            zone("Far", 0.0, 0.3, RiskLevel::Critical, 1),
            zone("Near", 0.0, 0.1, RiskLevel::High, 1),
        ]);
        let (nearest, distance) = index.nearest_alerting(Coordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(nearest.name, "Near");
        assert!(distance < 12_000.0);
    }

    #[test]
    fn test_nearest_alerting_tie_breaks_by_input_order() {
        let index = ZoneIndex::new(vec![
            zone("First", 0.0, 0.1, RiskLevel::High, 1),
            zone("Second", 0.0, -0.1, RiskLevel::Critical, 1),
        ]);
        let (nearest, _) = index.nearest_alerting(Coordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(nearest.name, "First");
    }

    #[test]
    fn test_non_finite_point_never_alerts() {
        let index = ZoneIndex::new(vec![zone("Origin", 0.0, 0.0, RiskLevel::Critical, 1)]);
        assert!(index
            .nearest_alerting(Coordinate::new(f64::NAN, 0.0))
            .is_none());
        assert!(index
            .nearest_alerting(Coordinate::new(0.0, f64::INFINITY))
            .is_none());
    }

    #[test]
    fn test_empty_index_never_alerts() {
        let index = ZoneIndex::empty();
        assert!(index.is_empty());
        assert!(index.nearest_alerting(Coordinate::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_push_appends() {
        let mut index = ZoneIndex::new(vec![zone("A", 0.0, 0.0, RiskLevel::Low, 1)]);
        index.push(zone("B", 1.0, 1.0, RiskLevel::High, 2));
        assert_eq!(index.len(), 2);
        assert_eq!(index.all_zones()[0].name, "A");
        assert_eq!(index.all_zones()[1].name, "B");
    }

    #[test]
    fn test_list_filters_and_sorts() {
        let index = ZoneIndex::new(vec![
            zone("Bravo", 0.0, 0.0, RiskLevel::High, 10),
            zone("Alpha", 0.0, 0.0, RiskLevel::Low, 500),
            zone("Charlie", 0.0, 0.0, RiskLevel::Critical, 5),
        ]);

        let names = |zones: Vec<&Zone>| zones.iter().map(|z| z.name.clone()).collect::<Vec<_>>();

        assert_eq!(
            names(index.list(&ListZonesQuery::default())),
            vec!["Alpha", "Bravo", "Charlie"]
        );

        let query = ListZonesQuery {
            min_risk: Some(RiskLevel::High),
            sort: ZoneSort::Risk,
        };
        assert_eq!(names(index.list(&query)), vec!["Charlie", "Bravo"]);

        let query = ListZonesQuery {
            min_risk: None,
            sort: ZoneSort::Name,
        };
        assert_eq!(names(index.list(&query)), vec!["Alpha", "Bravo", "Charlie"]);
    }
}
