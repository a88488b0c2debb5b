//! Predictable provinces and their pin positions.
//!
//! Each province is pinned at a representative point near its centroid.
//! Names must match the backend exactly, the model is keyed by them.

use crate::projection::MapFrame;

/// A province the prediction model knows about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Province {
    pub id: &'static str,
    pub name: &'static str,
    /// Pin latitude (degrees)
    pub lat: f64,
    /// Pin longitude (degrees)
    pub lon: f64,
}

impl Province {
    /// Pin position as percentages of the Indonesia frame.
    #[must_use]
    pub fn pin(&self) -> Option<(f64, f64)> {
        MapFrame::INDONESIA.project(self.lat, self.lon)
    }
}

const fn province(id: &'static str, name: &'static str, lat: f64, lon: f64) -> Province {
    Province { id, name, lat, lon }
}

/// All provinces, sorted by name.
pub const PROVINCES: [Province; 34] = [
    province("ID-AC", "Aceh", 4.7, 96.7),
    province("ID-BA", "Bali", -8.4, 115.2),
    province("ID-BT", "Banten", -6.4, 106.1),
    province("ID-BE", "Bengkulu", -3.6, 102.3),
    province("ID-YO", "DI Yogyakarta", -7.9, 110.4),
    province("ID-JK", "DKI Jakarta", -6.2, 106.8),
    province("ID-GO", "Gorontalo", 0.7, 122.4),
    province("ID-JA", "Jambi", -1.6, 103.0),
    province("ID-JB", "Jawa Barat", -6.9, 107.6),
    province("ID-JT", "Jawa Tengah", -7.2, 110.0),
    province("ID-JI", "Jawa Timur", -7.6, 112.5),
    province("ID-KB", "Kalimantan Barat", 0.0, 110.5),
    province("ID-KS", "Kalimantan Selatan", -3.1, 115.3),
    province("ID-KT", "Kalimantan Tengah", -1.7, 113.4),
    province("ID-KI", "Kalimantan Timur", 0.8, 116.4),
    province("ID-KU", "Kalimantan Utara", 3.1, 116.2),
    province("ID-BB", "Kepulauan Bangka Belitung", -2.5, 106.4),
    province("ID-KR", "Kepulauan Riau", 1.1, 104.4),
    province("ID-LA", "Lampung", -4.9, 105.1),
    province("ID-MA", "Maluku", -3.2, 129.4),
    province("ID-MU", "Maluku Utara", 1.6, 127.8),
    province("ID-NB", "Nusa Tenggara Barat", -8.6, 117.4),
    province("ID-NT", "Nusa Tenggara Timur", -8.7, 121.1),
    province("ID-PA", "Papua", -4.3, 138.1),
    province("ID-PB", "Papua Barat", -1.3, 133.2),
    province("ID-RI", "Riau", 0.3, 101.7),
    province("ID-SR", "Sulawesi Barat", -2.8, 119.2),
    province("ID-SN", "Sulawesi Selatan", -3.7, 120.0),
    province("ID-ST", "Sulawesi Tengah", -1.4, 121.4),
    province("ID-SG", "Sulawesi Tenggara", -4.1, 122.2),
    province("ID-SA", "Sulawesi Utara", 1.3, 124.8),
    province("ID-SB", "Sumatera Barat", -0.7, 100.8),
    province("ID-SS", "Sumatera Selatan", -3.3, 104.9),
    province("ID-SU", "Sumatera Utara", 2.1, 99.5),
];

/// Look up a province by its exact backend name.
#[must_use]
pub fn find(name: &str) -> Option<&'static Province> {
    PROVINCES.iter().find(|p| p.name == name)
}

/// Look up a province ignoring case and surrounding whitespace.
#[must_use]
pub fn find_loose(name: &str) -> Option<&'static Province> {
    let name = name.trim();
    PROVINCES.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Province names in listing order.
pub fn names() -> impl Iterator<Item = &'static str> {
    PROVINCES.iter().map(|p| p.name)
}
