//! Prediction backend API client.
//!
//! Provides blocking HTTP access to the `/katalog` and `/predict_lstm`
//! endpoints. Uses reqwest with rustls for TLS.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::errors::GempaError;
use crate::models::{ApiErrorBody, KatalogRecord, Prediction};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("gempaview/", env!("CARGO_PKG_VERSION"));

/// Where the backend listens by default.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Connection settings for [`GempaClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Client for the earthquake prediction backend.
#[derive(Debug, Clone)]
pub struct GempaClient {
    client: Client,
    base_url: String,
}

impl GempaClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &ClientConfig) -> Result<Self, GempaError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the `limit` most recent catalog records.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the backend answers with a
    /// non-success status, or the body is not a JSON array.
    #[instrument(skip(self))]
    pub fn fetch_katalog(&self, limit: usize) -> Result<Vec<KatalogRecord>, GempaError> {
        let url = format!("{}/katalog", self.base_url);
        debug!("fetching katalog from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()?;
        let response = check_status(response)?;

        let text = response.text()?;
        let body: Value = serde_json::from_str(&text)?;
        let Value::Array(items) = body else {
            return Err(GempaError::InvalidResponse(
                "katalog response is not an array".into(),
            ));
        };

        let records = items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<KatalogRecord>, _>>()?;

        debug!("fetched {} records", records.len());
        Ok(records)
    }

    /// Request the 30-day prediction for one province.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank province, an API error
    /// carrying the backend's `error` message on a non-success status, and
    /// an invalid-response error when the probability is missing.
    #[instrument(skip(self))]
    pub fn predict(&self, provinsi: &str) -> Result<Prediction, GempaError> {
        let provinsi = provinsi.trim();
        if provinsi.is_empty() {
            return Err(GempaError::Validation(
                "Please select a province first.".into(),
            ));
        }

        let url = format!("{}/predict_lstm", self.base_url);
        debug!("requesting prediction from {}", url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "provinsi": provinsi }))
            .send()?;
        let response = check_status(response)?;

        let text = response.text()?;
        let body: Value = serde_json::from_str(&text)?;
        if !body
            .get("Probabilitas_Gempa_30_Hari")
            .is_some_and(Value::is_number)
        {
            return Err(GempaError::InvalidResponse(
                "probability key missing or not a number".into(),
            ));
        }

        let prediction: Prediction = serde_json::from_value(body)?;
        debug!(probability = prediction.probability, "prediction received");
        Ok(prediction)
    }
}

/// Turn a non-success response into [`GempaError::Api`].
///
/// The message is the body's `error` field when the backend sent one.
fn check_status(response: Response) -> Result<Response, GempaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

    Err(GempaError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ClientConfig {
            base_url: "http://example.test:5000/".into(),
            ..ClientConfig::default()
        };
        let client = GempaClient::new(&config).expect("client builds");
        assert_eq!(client.base_url(), "http://example.test:5000");
    }

    #[test]
    fn test_blank_province_rejected_without_request() {
        // Nothing listens on port 9; a request would fail with Http, not Validation
        let config = ClientConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..ClientConfig::default()
        };
        let client = GempaClient::new(&config).expect("client builds");
        let err = client.predict("   ").expect_err("blank province");
        assert!(matches!(err, GempaError::Validation(_)));
    }
}
