//! Web server for the gempaview dashboard.
//!
//! Provides the map dashboard using:
//! - Axum for HTTP server
//! - SSE (Server-Sent Events) for new catalog events in the sidebar
//! - HTMX panels rendered server-side by [`crate::html`]
//!
//! The backend client is blocking, so every call to it runs on the
//! blocking pool.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::chart::{self, CHART_LIMIT};
use crate::client::GempaClient;
use crate::dedup::DedupeRing;
use crate::errors::GempaError;
use crate::html;
use crate::map::MAP_LIMIT;
use crate::models::{KatalogRecord, Prediction, Quake, QuakeLocation, map_locations};
use crate::predictions::{self, DEFAULT_CONCURRENCY, ProvinceRisk};
use crate::sidebar::RECENT_LIMIT;
use crate::view::ViewState;

/// Minimum seconds between catalog polls accepted from the command line.
pub const MIN_POLL_INTERVAL: u64 = 5;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub poll_interval: u64,
    /// Records requested per poll
    pub poll_limit: usize,
    pub concurrency: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            poll_interval: 30,
            poll_limit: MAP_LIMIT,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    client: Arc<GempaClient>,
    /// Channel for broadcasting event cards to SSE clients
    tx: broadcast::Sender<String>,
    /// Flag to control catalog polling
    feed_active: Arc<AtomicBool>,
    /// Predictions from the last risk map load
    risk_cache: Arc<RwLock<Option<Vec<ProvinceRisk>>>>,
    config: ServerConfig,
}

impl AppState {
    #[must_use]
    pub fn new(client: Arc<GempaClient>, config: ServerConfig) -> Self {
        let (tx, _rx) = broadcast::channel::<String>(100);
        Self {
            client,
            tx,
            feed_active: Arc::new(AtomicBool::new(true)),
            risk_cache: Arc::new(RwLock::new(None)),
            config,
        }
    }

    fn cached_selection(&self, provinsi: &str) -> Option<Prediction> {
        let cache = self.risk_cache.read().ok()?;
        predictions::select(cache.as_deref()?, provinsi).ok()
    }

    fn store_risks(&self, entries: &[ProvinceRisk]) {
        if let Ok(mut cache) = self.risk_cache.write() {
            *cache = Some(entries.to_vec());
        }
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/risk", get(risk_page_handler))
        .route("/api/quakes", get(quakes_handler))
        .route("/panel/recent", get(recent_panel_handler))
        .route("/panel/chart", get(chart_panel_handler))
        .route("/panel/popup", get(popup_panel_handler))
        .route("/panel/risk", get(risk_panel_handler))
        .route("/panel/prediction", get(prediction_panel_handler))
        .route("/predict", post(predict_form_handler))
        .route("/stream", get(sse_handler))
        .route("/feed/start", post(start_feed_handler))
        .route("/feed/stop", post(stop_feed_handler))
        .route("/feed/status", get(feed_status_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Bind to the configured address and serve until the process exits.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or serving fails.
pub async fn run_server(client: Arc<GempaClient>, config: ServerConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("gempaview dashboard starting at http://{}", addr);
    serve(listener, AppState::new(client, config)).await
}

/// Serve the dashboard on an already-bound listener, with the catalog poller.
///
/// # Errors
///
/// Returns an error if serving fails.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    let poll_state = state.clone();
    tokio::spawn(async move {
        poll_catalog(poll_state).await;
    });

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

/// Run a blocking backend call off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, String>
where
    F: FnOnce() -> Result<T, GempaError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(e) => Err(format!("backend task failed: {e}")),
    }
}

async fn fetch_quakes(state: &AppState, limit: usize) -> Result<Vec<Quake>, String> {
    let client = Arc::clone(&state.client);
    let records: Vec<KatalogRecord> = blocking(move || client.fetch_katalog(limit)).await?;
    Ok(Quake::from_records(&records))
}

async fn fetch_prediction(state: &AppState, provinsi: String) -> Result<Prediction, String> {
    let client = Arc::clone(&state.client);
    blocking(move || client.predict(&provinsi)).await
}

/// Background task that polls the catalog and broadcasts new events.
///
/// The first successful poll only seeds the ring: those events are
/// already on the page through the recent panel.
async fn poll_catalog(state: AppState) {
    let interval = Duration::from_secs(state.config.poll_interval.max(1));
    let mut dedup = DedupeRing::with_default_capacity();
    let mut primed = false;

    loop {
        if !state.feed_active.load(Ordering::Relaxed) {
            tokio::time::sleep(Duration::from_secs(1)).await;
            continue;
        }

        match fetch_quakes(&state, state.config.poll_limit).await {
            Ok(quakes) => {
                let mut sent = 0usize;
                // Oldest first so the newest card ends up on top
                for quake in quakes.iter().rev() {
                    if !dedup.check(quake).should_emit() || !primed {
                        continue;
                    }
                    let _ = state.tx.send(html::quake_card(quake));
                    sent += 1;
                }
                if sent > 0 {
                    tracing::debug!("broadcast {} catalog events", sent);
                }
                primed = true;
            }
            Err(e) => {
                tracing::warn!("catalog poll failed: {}", e);
            }
        }

        tokio::time::sleep(interval).await;
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn index_handler() -> Html<String> {
    Html(html::index_page())
}

async fn risk_page_handler() -> Html<String> {
    Html(html::risk_page())
}

/// Map marker with its legend color.
#[derive(Debug, Serialize)]
struct Marker {
    #[serde(flatten)]
    location: QuakeLocation,
    color: &'static str,
}

/// Quake map markers as JSON for Leaflet.
async fn quakes_handler(State(state): State<AppState>) -> Response {
    match fetch_quakes(&state, MAP_LIMIT).await {
        Ok(quakes) => {
            let markers: Vec<Marker> = map_locations(&quakes)
                .into_iter()
                .map(|location| Marker {
                    color: location.bucket().css_color(),
                    location,
                })
                .collect();
            Json(markers).into_response()
        }
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": e })),
        )
            .into_response(),
    }
}

async fn recent_panel_handler(State(state): State<AppState>) -> Html<String> {
    let view = ViewState::from_result(fetch_quakes(&state, RECENT_LIMIT).await);
    Html(html::recent_panel(&view))
}

async fn chart_panel_handler(State(state): State<AppState>) -> Html<String> {
    let view = ViewState::from_result(fetch_quakes(&state, CHART_LIMIT).await)
        .map(|quakes| chart::count_by_province(&quakes));
    Html(html::chart_panel(&view, CHART_LIMIT))
}

#[derive(Debug, Deserialize)]
struct PopupQuery {
    #[serde(default)]
    provinsi: String,
    name: Option<String>,
}

async fn popup_panel_handler(
    State(state): State<AppState>,
    Query(query): Query<PopupQuery>,
) -> Html<String> {
    let name = query
        .name
        .unwrap_or_else(|| format!("Gempa {}", query.provinsi));
    let view = ViewState::from_result(fetch_prediction(&state, query.provinsi).await)
        .map(|p| p.probability);
    Html(html::popup_panel(&name, &view))
}

async fn risk_panel_handler(State(state): State<AppState>) -> Html<String> {
    let client = Arc::clone(&state.client);
    let concurrency = state.config.concurrency;
    let report = tokio::task::spawn_blocking(move || {
        predictions::fetch_every_province(client.as_ref(), concurrency)
    })
    .await;

    let view = match report {
        Ok(report) => {
            state.store_risks(&report.entries);
            report.into_view()
        }
        Err(e) => ViewState::Error(format!("backend task failed: {e}")),
    };
    Html(html::risk_panel(&view))
}

#[derive(Debug, Deserialize)]
struct ProvinceQuery {
    #[serde(default)]
    provinsi: String,
}

/// Detail card for a pin: from the last map load, else a fresh call.
async fn prediction_panel_handler(
    State(state): State<AppState>,
    Query(query): Query<ProvinceQuery>,
) -> Html<String> {
    if let Some(prediction) = state.cached_selection(&query.provinsi) {
        return Html(html::prediction_panel(&ViewState::Ready(prediction)));
    }
    let view = ViewState::from_result(fetch_prediction(&state, query.provinsi).await);
    Html(html::prediction_panel(&view))
}

async fn predict_form_handler(
    State(state): State<AppState>,
    Form(form): Form<ProvinceQuery>,
) -> Html<String> {
    let view = ViewState::from_result(fetch_prediction(&state, form.provinsi).await);
    Html(html::prediction_panel(&view))
}

/// SSE stream handler for new catalog events.
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(html) => Some(Ok(Event::default().event("earthquake").data(html))),
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn start_feed_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.feed_active.store(true, Ordering::Relaxed);
    tracing::info!("feed resumed via UI");
    Html(html::feed_status(true))
}

async fn stop_feed_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.feed_active.store(false, Ordering::Relaxed);
    tracing::info!("feed paused via UI");
    Html(html::feed_status(false))
}

async fn feed_status_handler(State(state): State<AppState>) -> Html<&'static str> {
    Html(html::feed_status(state.feed_active.load(Ordering::Relaxed)))
}

async fn health_handler() -> &'static str {
    "OK"
}
