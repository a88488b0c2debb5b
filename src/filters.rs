//! Event filtering for the recent list, map and watch views.
//!
//! Events missing the attribute a filter needs never match it.

use std::f64::consts::PI;

use crate::models::Quake;

/// Earth radius in kilometers for haversine calculations.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Bounding box for geographic filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

fn parse_numbers(s: &str, expected: usize, what: &str, shape: &str) -> Result<Vec<f64>, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != expected {
        return Err(format!(
            "{what} requires {expected} values ({shape}), got {}",
            parts.len()
        ));
    }
    parts
        .iter()
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| format!("invalid number in {what}: {e}"))
}

fn check_lat(name: &str, value: f64) -> Result<(), String> {
    if (-90.0..=90.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{name} {value} out of range [-90, 90]"))
    }
}

fn check_lon(name: &str, value: f64) -> Result<(), String> {
    if (-180.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{name} {value} out of range [-180, 180]"))
    }
}

impl std::str::FromStr for BBox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let vals = parse_numbers(s, 4, "bbox", "minlat,minlon,maxlat,maxlon")?;
        let bbox = Self {
            min_lat: vals[0],
            min_lon: vals[1],
            max_lat: vals[2],
            max_lon: vals[3],
        };

        check_lat("min_lat", bbox.min_lat)?;
        check_lat("max_lat", bbox.max_lat)?;
        check_lon("min_lon", bbox.min_lon)?;
        check_lon("max_lon", bbox.max_lon)?;
        if bbox.min_lat > bbox.max_lat {
            return Err(format!(
                "min_lat {} must be <= max_lat {}",
                bbox.min_lat, bbox.max_lat
            ));
        }

        Ok(bbox)
    }
}

impl BBox {
    /// Check if a point is within the bounding box.
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Radius filter for geographic filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusFilter {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_km: f64,
}

impl std::str::FromStr for RadiusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let vals = parse_numbers(s, 3, "radius", "lat,lon,radius_km")?;
        let filter = Self {
            center_lat: vals[0],
            center_lon: vals[1],
            radius_km: vals[2],
        };

        check_lat("latitude", filter.center_lat)?;
        check_lon("longitude", filter.center_lon)?;
        if filter.radius_km <= 0.0 {
            return Err(format!("radius must be positive, got {}", filter.radius_km));
        }

        Ok(filter)
    }
}

impl RadiusFilter {
    /// Check if a point is within the radius using haversine formula.
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        haversine_distance(self.center_lat, self.center_lon, lat, lon) <= self.radius_km
    }
}

/// Calculate the great-circle distance between two points using the haversine formula.
///
/// Returns distance in kilometers.
#[must_use]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1 * PI / 180.0;
    let lat2_rad = lat2 * PI / 180.0;
    let delta_lat = (lat2 - lat1) * PI / 180.0;
    let delta_lon = (lon2 - lon1) * PI / 180.0;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Combined filter criteria.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EventFilter {
    pub min_magnitude: Option<f64>,
    pub max_depth: Option<f64>,
    pub province: Option<String>,
    pub bbox: Option<BBox>,
    pub radius: Option<RadiusFilter>,
}

impl EventFilter {
    /// True when no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check if an event passes all filter criteria.
    #[must_use]
    pub fn matches(&self, event: &Quake) -> bool {
        self.check_magnitude(event)
            && self.check_depth(event)
            && self.check_province(event)
            && self.check_bbox(event)
            && self.check_radius(event)
    }

    /// Keep the events that pass, preserving order.
    #[must_use]
    pub fn apply(&self, events: Vec<Quake>) -> Vec<Quake> {
        if self.is_empty() {
            return events;
        }
        events.into_iter().filter(|e| self.matches(e)).collect()
    }

    fn check_magnitude(&self, event: &Quake) -> bool {
        match self.min_magnitude {
            None => true,
            Some(min) => event.magnitude.is_some_and(|m| m >= min),
        }
    }

    fn check_depth(&self, event: &Quake) -> bool {
        match self.max_depth {
            None => true,
            Some(max) => event.depth_km.is_some_and(|d| d <= max),
        }
    }

    fn check_province(&self, event: &Quake) -> bool {
        match &self.province {
            None => true,
            Some(wanted) => event
                .province
                .as_deref()
                .is_some_and(|p| p.trim().eq_ignore_ascii_case(wanted.trim())),
        }
    }

    fn check_bbox(&self, event: &Quake) -> bool {
        match &self.bbox {
            None => true,
            Some(bbox) => coordinates(event).is_some_and(|(lat, lon)| bbox.contains(lat, lon)),
        }
    }

    fn check_radius(&self, event: &Quake) -> bool {
        match &self.radius {
            None => true,
            Some(radius) => coordinates(event).is_some_and(|(lat, lon)| radius.contains(lat, lon)),
        }
    }
}

fn coordinates(event: &Quake) -> Option<(f64, f64)> {
    Some((event.latitude?, event.longitude?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KatalogRecord;

    fn quake(json: &str) -> Quake {
        let record: KatalogRecord = serde_json::from_str(json).expect("valid record");
        Quake::from_record(&record, 0)
    }

    #[test]
    fn test_bbox_parse() {
        let bbox: BBox = "-11,94,6,142".parse().unwrap();
        assert!((bbox.min_lat - (-11.0)).abs() < 0.001);
        assert!((bbox.max_lon - 142.0).abs() < 0.001);
    }

    #[test]
    fn test_bbox_rejects_bad_input() {
        assert!("1,2,3".parse::<BBox>().is_err());
        assert!("a,2,3,4".parse::<BBox>().is_err());
        assert!("95,0,96,1".parse::<BBox>().is_err());
        assert!("5,0,-5,1".parse::<BBox>().is_err());
    }

    #[test]
    fn test_bbox_contains() {
        // Java
        let bbox: BBox = "-9,105,-5.5,115".parse().unwrap();
        assert!(bbox.contains(-7.0, 110.0));
        assert!(!bbox.contains(-3.0, 110.0));
    }

    #[test]
    fn test_radius_parse() {
        let radius: RadiusFilter = "-6.2,106.8,150".parse().unwrap();
        assert!((radius.center_lat - (-6.2)).abs() < 0.001);
        assert!((radius.radius_km - 150.0).abs() < 0.001);
        assert!("-6.2,106.8,0".parse::<RadiusFilter>().is_err());
    }

    #[test]
    fn test_haversine() {
        // Jakarta to Surabaya is roughly 660 km
        let distance = haversine_distance(-6.2, 106.8, -7.25, 112.75);
        assert!(distance > 600.0 && distance < 720.0);
    }

    #[test]
    fn test_radius_contains() {
        let radius: RadiusFilter = "-6.2,106.8,100".parse().unwrap();
        // Jakarta to Bogor is ~45km
        assert!(radius.contains(-6.6, 106.8));
        // Jakarta to Surabaya is ~660km
        assert!(!radius.contains(-7.25, 112.75));
    }

    #[test]
    fn test_missing_attributes_never_match() {
        let bare = quake("{}");
        let filter = EventFilter {
            min_magnitude: Some(1.0),
            ..Default::default()
        };
        assert!(!filter.matches(&bare));

        let filter = EventFilter {
            bbox: Some("-90,-180,90,180".parse().unwrap()),
            ..Default::default()
        };
        assert!(!filter.matches(&bare));
    }

    #[test]
    fn test_province_is_case_insensitive() {
        let q = quake(r#"{"provinsi":"Jawa Barat"}"#);
        let filter = EventFilter {
            province: Some("jawa barat".into()),
            ..Default::default()
        };
        assert!(filter.matches(&q));
    }

    #[test]
    fn test_apply_preserves_order() {
        let events = vec![
            quake(r#"{"id":"a","mag":5.0,"depth":10}"#),
            quake(r#"{"id":"b","mag":2.0,"depth":10}"#),
            quake(r#"{"id":"c","mag":4.0,"depth":300}"#),
            quake(r#"{"id":"d","mag":4.5,"depth":70}"#),
        ];
        let filter = EventFilter {
            min_magnitude: Some(3.0),
            max_depth: Some(100.0),
            ..Default::default()
        };
        let ids: Vec<_> = filter.apply(events).into_iter().map(|q| q.id).collect();
        assert_eq!(ids, ["a", "d"]);
    }
}
