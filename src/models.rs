//! Data models for the prediction backend's responses.
//!
//! The `/katalog` endpoint is loosely typed: coordinates and magnitudes
//! arrive as numbers or numeric strings, longitude as `lon` or `lng`, and
//! the id may be missing. [`KatalogRecord`] accepts all of that and
//! [`Quake`] is the normalized shape every view renders.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::styling::{MagnitudeBucket, Severity};

/// A raw earthquake record from `GET /katalog`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KatalogRecord {
    /// Event id (number or string), often absent
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,

    /// Event timestamp as sent by the backend
    #[serde(default, deserialize_with = "lenient_string")]
    pub tgl: Option<String>,

    /// Latitude (degrees)
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,

    /// Longitude (degrees)
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lon: Option<f64>,

    /// Longitude under its alternate key
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lng: Option<f64>,

    /// Depth in kilometers
    #[serde(default, deserialize_with = "lenient_f64")]
    pub depth: Option<f64>,

    /// Magnitude
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mag: Option<f64>,

    /// Province name
    #[serde(default, deserialize_with = "lenient_string")]
    pub provinsi: Option<String>,
}

fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|f| f.is_finite())
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Parse a catalog timestamp.
///
/// Accepts RFC 3339 and the naive `YYYY-MM-DD[ T]HH:MM:SS[.f]` and
/// `YYYY-MM-DD` forms. Naive values are taken as UTC.
#[must_use]
pub fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

/// A normalized earthquake event.
#[derive(Debug, Clone, PartialEq)]
pub struct Quake {
    /// Stable key: the backend id, or `"{tgl}-{index}"`
    pub id: String,
    /// True when `id` was built from the response position
    pub synthetic_id: bool,
    /// Timestamp string as received
    pub raw_time: Option<String>,
    /// Parsed timestamp
    pub time: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub depth_km: Option<f64>,
    pub magnitude: Option<f64>,
    pub province: Option<String>,
}

impl Quake {
    /// Normalize one catalog record. `index` is its position in the response.
    #[must_use]
    pub fn from_record(record: &KatalogRecord, index: usize) -> Self {
        let id = record.id.clone().unwrap_or_else(|| {
            format!("{}-{index}", record.tgl.as_deref().unwrap_or("unknown"))
        });

        Self {
            id,
            synthetic_id: record.id.is_none(),
            raw_time: record.tgl.clone(),
            time: record.tgl.as_deref().and_then(parse_time),
            latitude: record.lat,
            longitude: record.lon.or(record.lng),
            depth_km: record.depth,
            magnitude: record.mag,
            province: record.provinsi.clone(),
        }
    }

    /// Normalize a whole catalog response, preserving order.
    #[must_use]
    pub fn from_records(records: &[KatalogRecord]) -> Vec<Self> {
        records
            .iter()
            .enumerate()
            .map(|(i, r)| Self::from_record(r, i))
            .collect()
    }

    /// Province name for display.
    #[must_use]
    pub fn province_label(&self) -> &str {
        self.province.as_deref().unwrap_or("Unknown location")
    }

    /// Timestamp in the local timezone, falling back to the raw string.
    #[must_use]
    pub fn time_label(&self) -> String {
        match (self.time, self.raw_time.as_deref()) {
            (Some(t), _) => t
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            (None, Some(raw)) => raw.to_string(),
            (None, None) => "unknown".into(),
        }
    }

    /// Build a map marker, if the event has a province and coordinates.
    #[must_use]
    pub fn map_location(&self) -> Option<QuakeLocation> {
        let province = self.province.clone()?;
        let lat = self.latitude?;
        let lng = self.longitude?;

        let mag_label = self
            .magnitude
            .map_or_else(|| "N/A".to_string(), |m| m.to_string());

        Some(QuakeLocation {
            id: self.id.clone(),
            name: format!("Gempa {province} (Mag: {mag_label})"),
            lat,
            lng,
            province,
            mag: self.magnitude,
        })
    }
}

/// Marker data for the quake map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuakeLocation {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub province: String,
    pub mag: Option<f64>,
}

impl QuakeLocation {
    /// Marker color bucket.
    #[must_use]
    pub fn bucket(&self) -> MagnitudeBucket {
        MagnitudeBucket::from_magnitude(self.mag)
    }
}

/// Collect map markers from a catalog, dropping incomplete events.
#[must_use]
pub fn map_locations(quakes: &[Quake]) -> Vec<QuakeLocation> {
    quakes.iter().filter_map(Quake::map_location).collect()
}

/// A province prediction from `POST /predict_lstm`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Prediction {
    #[serde(rename = "Provinsi")]
    pub province: String,

    /// Probability of an earthquake within 30 days (0..1)
    #[serde(rename = "Probabilitas_Gempa_30_Hari")]
    pub probability: f64,

    /// 1 when the model predicts an earthquake
    #[serde(rename = "Prediksi_Gempa")]
    pub prediction: u8,

    #[serde(rename = "Message", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Prediction {
    #[must_use]
    pub fn is_likely(&self) -> bool {
        self.prediction == 1
    }
}

/// Error body returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: Option<String>,
}

/// Simplified event for output.
///
/// This is the normalized structure we emit in JSON/NDJSON output.
#[derive(Debug, Clone, Serialize)]
pub struct OutputQuake {
    pub id: String,
    pub time: String,
    pub magnitude: Option<f64>,
    pub depth_km: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub province: Option<String>,
    pub severity: Option<&'static str>,
}

impl From<&Quake> for OutputQuake {
    fn from(q: &Quake) -> Self {
        Self {
            id: q.id.clone(),
            time: q
                .time
                .map(|t| t.to_rfc3339())
                .or_else(|| q.raw_time.clone())
                .unwrap_or_else(|| "unknown".into()),
            magnitude: q.magnitude,
            depth_km: q.depth_km,
            latitude: q.latitude,
            longitude: q.longitude,
            province: q.province.clone(),
            severity: q.magnitude.map(|m| Severity::from_magnitude(m).label()),
        }
    }
}
