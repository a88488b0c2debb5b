//! Province predictions: bulk fetch for the risk map, detail card and popup.

use std::io::{self, Write};
use std::thread;

use tracing::{debug, warn};

use crate::client::GempaClient;
use crate::errors::GempaError;
use crate::models::{Prediction, QuakeLocation};
use crate::provinces::{self, Province};
use crate::styling::{BOLD, DIM, ERROR_RED, RESET, RiskLevel};
use crate::view::ViewState;

/// Requests in flight at once when fetching every province.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Shown when no province could be predicted at all.
pub const ALL_FAILED_MESSAGE: &str =
    "Failed to fetch prediction data. Make sure the backend is running and reachable.";

/// Message attached to predictions selected from the map.
pub const MAP_SELECTION_MESSAGE: &str = "Prediction based on the latest historical data.";

/// Anything that can answer a province prediction.
pub trait PredictionSource: Sync {
    /// # Errors
    ///
    /// Returns the backend or transport failure.
    fn predict(&self, provinsi: &str) -> Result<Prediction, GempaError>;
}

impl PredictionSource for GempaClient {
    fn predict(&self, provinsi: &str) -> Result<Prediction, GempaError> {
        GempaClient::predict(self, provinsi)
    }
}

/// A province pin with its prediction, if it loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceRisk {
    pub province: &'static Province,
    pub prediction: Option<Prediction>,
    pub error: Option<String>,
}

impl ProvinceRisk {
    #[must_use]
    pub fn loaded(province: &'static Province, prediction: Prediction) -> Self {
        Self {
            province,
            prediction: Some(prediction),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(province: &'static Province, error: String) -> Self {
        Self {
            province,
            prediction: None,
            error: Some(error),
        }
    }

    #[must_use]
    pub fn probability(&self) -> Option<f64> {
        self.prediction.as_ref().map(|p| p.probability)
    }

    #[must_use]
    pub fn level(&self) -> RiskLevel {
        RiskLevel::classify(
            self.probability(),
            self.prediction.as_ref().map(|p| p.prediction),
        )
    }
}

/// Predictions for every requested province.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskReport {
    pub entries: Vec<ProvinceRisk>,
    /// Set when provinces were requested and none succeeded
    pub error: Option<String>,
}

impl RiskReport {
    #[must_use]
    pub fn from_entries(entries: Vec<ProvinceRisk>) -> Self {
        let error = (!entries.is_empty() && entries.iter().all(|e| e.prediction.is_none()))
            .then(|| ALL_FAILED_MESSAGE.to_string());
        Self { entries, error }
    }

    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.entries.iter().filter(|e| e.prediction.is_some()).count()
    }

    /// View state for the risk map: error only when nothing loaded.
    #[must_use]
    pub fn into_view(self) -> ViewState<Vec<ProvinceRisk>> {
        match self.error {
            Some(error) => ViewState::Error(error),
            None => ViewState::Ready(self.entries),
        }
    }
}

/// Fetch predictions for `targets`, at most `concurrency` at a time.
///
/// Order follows `targets`. A failed province keeps its pin without a
/// probability; failures are logged, never propagated.
pub fn fetch_all<S: PredictionSource>(
    source: &S,
    targets: &[&'static Province],
    concurrency: usize,
) -> RiskReport {
    let mut entries = Vec::with_capacity(targets.len());

    for chunk in targets.chunks(concurrency.max(1)) {
        let results: Vec<ProvinceRisk> = thread::scope(|scope| {
            let handles: Vec<_> = chunk
                .iter()
                .map(|&province| scope.spawn(move || fetch_one(source, province)))
                .collect();
            handles
                .into_iter()
                .zip(chunk)
                .map(|(handle, &province)| {
                    handle.join().unwrap_or_else(|_| {
                        ProvinceRisk::failed(province, "prediction worker panicked".into())
                    })
                })
                .collect()
        });
        entries.extend(results);
    }

    let report = RiskReport::from_entries(entries);
    debug!(
        loaded = report.loaded_count(),
        total = report.entries.len(),
        "province predictions fetched"
    );
    report
}

fn fetch_one<S: PredictionSource>(source: &S, province: &'static Province) -> ProvinceRisk {
    match source.predict(province.name) {
        Ok(prediction) => ProvinceRisk::loaded(province, prediction),
        Err(e) => {
            warn!("prediction failed for {}: {}", province.name, e);
            ProvinceRisk::failed(province, e.to_string())
        }
    }
}

/// Fetch predictions for every known province.
pub fn fetch_every_province<S: PredictionSource>(source: &S, concurrency: usize) -> RiskReport {
    let targets: Vec<&'static Province> = provinces::PROVINCES.iter().collect();
    fetch_all(source, &targets, concurrency)
}

/// Resolve a pin selection against already-fetched predictions.
///
/// # Errors
///
/// Returns the display message when the province is unknown or its
/// prediction did not load.
pub fn select(entries: &[ProvinceRisk], name: &str) -> Result<Prediction, String> {
    let Some(entry) = entries.iter().find(|e| e.province.name == name) else {
        return Err(format!("No coordinate information for {name}."));
    };
    match &entry.prediction {
        Some(p) => Ok(Prediction {
            message: Some(MAP_SELECTION_MESSAGE.to_string()),
            ..p.clone()
        }),
        None => Err(format!(
            "Prediction details for {name} are not available or failed to load earlier."
        )),
    }
}

/// Headline for a prediction.
#[must_use]
pub fn headline(prediction: &Prediction) -> &'static str {
    if prediction.is_likely() {
        "LIKELY EARTHQUAKE"
    } else {
        "UNLIKELY EARTHQUAKE"
    }
}

/// Write the prediction detail card.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_detail<W: Write>(writer: &mut W, state: &ViewState<Prediction>) -> io::Result<()> {
    let prediction = match state {
        ViewState::Loading => return writeln!(writer, "{DIM}Predicting...{RESET}"),
        ViewState::Error(message) => {
            return writeln!(writer, "{ERROR_RED}{BOLD}Error{RESET}\n{ERROR_RED}{message}{RESET}");
        }
        ViewState::Ready(p) => p,
    };

    let color = if prediction.is_likely() {
        RiskLevel::Likely.ansi()
    } else {
        RiskLevel::Unlikely.ansi()
    };

    writeln!(writer, "{BOLD}Prediction for {}{RESET}", prediction.province)?;
    writeln!(writer, "{color}{BOLD}{}{RESET}", headline(prediction))?;
    writeln!(
        writer,
        "Probability (next 30 days): {BOLD}{:.2}%{RESET} ({:.4})",
        prediction.probability * 100.0,
        prediction.probability
    )?;
    if let Some(message) = &prediction.message {
        writeln!(writer, "{DIM}{message}{RESET}")?;
    }
    Ok(())
}

/// Write the popup for a map marker: its name and the province probability.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_popup<W: Write>(
    writer: &mut W,
    location: &QuakeLocation,
    state: &ViewState<f64>,
) -> io::Result<()> {
    writeln!(writer, "{BOLD}{}{RESET}", location.name)?;
    match state {
        ViewState::Loading => writeln!(writer, "{DIM}Loading prediction...{RESET}"),
        ViewState::Error(message) => writeln!(writer, "{ERROR_RED}{message}{RESET}"),
        ViewState::Ready(p) => writeln!(writer, "Earthquake probability: {BOLD}{:.0}%{RESET}", p * 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Answers from a fixed table; unknown provinces fail like the backend.
    struct TableSource(Vec<(&'static str, f64, u8)>);

    impl PredictionSource for TableSource {
        fn predict(&self, provinsi: &str) -> Result<Prediction, GempaError> {
            self.0
                .iter()
                .find(|(name, _, _)| *name == provinsi)
                .map(|&(name, probability, prediction)| Prediction {
                    province: name.into(),
                    probability,
                    prediction,
                    message: None,
                })
                .ok_or_else(|| GempaError::Api {
                    status: 400,
                    message: format!("No scaler for province '{provinsi}'."),
                })
        }
    }

    fn render_detail(state: &ViewState<Prediction>) -> String {
        let mut out = Vec::new();
        write_detail(&mut out, state).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_fetch_all_keeps_order_and_failures() {
        let source = TableSource(vec![("Bali", 0.2, 0), ("Papua", 0.9, 1)]);
        let report = fetch_every_province(&source, 5);

        assert_eq!(report.entries.len(), provinces::PROVINCES.len());
        assert!(report.error.is_none());
        assert_eq!(report.loaded_count(), 2);

        let names: Vec<_> = report.entries.iter().map(|e| e.province.name).collect();
        assert_eq!(names, provinces::names().collect::<Vec<_>>());

        let aceh = &report.entries[0];
        assert_eq!(aceh.level(), RiskLevel::Unknown);
        assert!(aceh.error.as_deref().is_some_and(|e| e.contains("No scaler")));
    }

    #[test]
    fn test_all_failed_sets_error() {
        let report = fetch_every_province(&TableSource(Vec::new()), 3);
        assert_eq!(report.error.as_deref(), Some(ALL_FAILED_MESSAGE));
        assert_eq!(report.into_view(), ViewState::Error(ALL_FAILED_MESSAGE.into()));
    }

    #[test]
    fn test_no_targets_is_not_an_error() {
        let report = fetch_all(&TableSource(Vec::new()), &[], 3);
        assert!(report.error.is_none());
    }

    #[test]
    fn test_select() {
        let source = TableSource(vec![("Maluku", 0.64, 1)]);
        let report = fetch_every_province(&source, 34);

        let picked = select(&report.entries, "Maluku").unwrap();
        assert_eq!(picked.message.as_deref(), Some(MAP_SELECTION_MESSAGE));

        let missing = select(&report.entries, "Bali").unwrap_err();
        assert!(missing.contains("not available"));

        let unknown = select(&report.entries, "Atlantis").unwrap_err();
        assert!(unknown.contains("No coordinate information"));
    }

    #[test]
    fn test_detail_card() {
        let out = render_detail(&ViewState::Ready(Prediction {
            province: "Sulawesi Tengah".into(),
            probability: 0.123_456,
            prediction: 0,
            message: Some("Based on the last 30 records.".into()),
        }));
        assert!(out.contains("Prediction for Sulawesi Tengah"));
        assert!(out.contains("UNLIKELY EARTHQUAKE"));
        assert!(out.contains("12.35%"));
        assert!(out.contains("(0.1235)"));
        assert!(out.contains("Based on the last 30 records."));
    }

    #[test]
    fn test_detail_error() {
        let out = render_detail(&ViewState::Error("Province name is required".into()));
        assert!(out.contains("Error"));
        assert!(out.contains("Province name is required"));
    }

    #[test]
    fn test_popup_whole_percent() {
        let location = QuakeLocation {
            id: "1".into(),
            name: "Gempa Bali (Mag: 3.1)".into(),
            lat: -8.4,
            lng: 115.2,
            province: "Bali".into(),
            mag: Some(3.1),
        };
        let mut out = Vec::new();
        write_popup(&mut out, &location, &ViewState::Ready(0.456)).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Gempa Bali (Mag: 3.1)"));
        assert!(out.contains("46%"));
    }
}
