//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::chart::CHART_LIMIT;
use crate::client::{ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::filters::{BBox, EventFilter, RadiusFilter};
use crate::map::{DEFAULT_GRID, MAP_LIMIT};
use crate::output::Format;
use crate::predictions::DEFAULT_CONCURRENCY;
use crate::projection::Grid;
use crate::sidebar::RECENT_LIMIT;

/// Earthquake map, history and prediction views for an Indonesian
/// earthquake backend.
#[derive(Parser, Debug)]
#[command(name = "gempaview")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Backend base URL
    #[arg(long, global = true, env = "GEMPA_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Client settings from the global flags.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.timeout.max(1)),
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the latest earthquakes with their magnitude classes
    Recent(RecentArgs),

    /// Plot recent earthquakes on a map of Indonesia
    Map(MapArgs),

    /// Show the popup for a map marker: location and province probability
    Popup(PopupArgs),

    /// Predict the 30-day earthquake probability for one province
    Predict(PredictArgs),

    /// List the provinces the backend can predict
    Provinces,

    /// Show the prediction map for every province
    Risk(RiskArgs),

    /// Chart recent earthquakes per province
    Chart(ChartArgs),

    /// Poll the catalog and print new earthquakes as they appear
    Watch(WatchArgs),

    /// Start the web dashboard
    Ui(UiArgs),
}

/// Event filters shared by list and map commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Minimum magnitude to show
    #[arg(long)]
    pub min_magnitude: Option<f64>,

    /// Maximum depth in km to show
    #[arg(long)]
    pub max_depth: Option<f64>,

    /// Only show events in this province (case-insensitive)
    #[arg(long)]
    pub province: Option<String>,

    /// Bounding box filter: minlat,minlon,maxlat,maxlon
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    pub bbox: Option<BBox>,

    /// Radius filter: lat,lon,radius_km
    #[arg(long, value_parser = parse_radius, allow_hyphen_values = true)]
    pub radius: Option<RadiusFilter>,
}

impl FilterArgs {
    #[must_use]
    pub fn to_filter(&self) -> EventFilter {
        EventFilter {
            min_magnitude: self.min_magnitude,
            max_depth: self.max_depth,
            province: self.province.clone(),
            bbox: self.bbox,
            radius: self.radius,
        }
    }
}

/// Terminal map size.
#[derive(Args, Debug, Clone, Copy)]
pub struct GridArgs {
    /// Map width in columns
    #[arg(long, default_value_t = DEFAULT_GRID.width)]
    pub width: usize,

    /// Map height in rows
    #[arg(long, default_value_t = DEFAULT_GRID.height)]
    pub height: usize,
}

impl GridArgs {
    #[must_use]
    pub fn grid(self) -> Grid {
        Grid::new(self.width.max(10), self.height.max(5))
    }
}

/// Arguments for the `recent` command.
#[derive(Parser, Debug)]
pub struct RecentArgs {
    /// Number of records to request
    #[arg(long, short = 'n', default_value_t = RECENT_LIMIT)]
    pub limit: usize,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `map` command.
#[derive(Parser, Debug)]
pub struct MapArgs {
    /// Number of records to request
    #[arg(long, short = 'n', default_value_t = MAP_LIMIT)]
    pub limit: usize,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub grid: GridArgs,
}

/// Arguments for the `popup` command.
#[derive(Parser, Debug)]
pub struct PopupArgs {
    /// Event id of the marker (defaults to the newest mappable event)
    pub id: Option<String>,

    /// Number of records to search
    #[arg(long, short = 'n', default_value_t = MAP_LIMIT)]
    pub limit: usize,
}

/// Arguments for the `predict` command.
#[derive(Parser, Debug)]
pub struct PredictArgs {
    /// Province name, e.g. "Jawa Barat"
    pub provinsi: String,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `risk` command.
#[derive(Parser, Debug)]
pub struct RiskArgs {
    /// Prediction requests in flight at once
    #[arg(long, short = 'j', default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Show the detail card for this province after the map
    #[arg(long)]
    pub select: Option<String>,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `chart` command.
#[derive(Parser, Debug)]
pub struct ChartArgs {
    /// Number of records to count
    #[arg(long, short = 'n', default_value_t = CHART_LIMIT)]
    pub limit: usize,

    /// Longest bar in columns
    #[arg(long, default_value = "40")]
    pub width: usize,
}

/// Arguments for the `watch` command.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Number of records to request per poll
    #[arg(long, short = 'n', default_value_t = MAP_LIMIT)]
    pub limit: usize,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Poll interval in seconds (minimum 5)
    #[arg(long, default_value = "30")]
    pub poll_interval: u64,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `ui` command.
#[derive(Parser, Debug)]
pub struct UiArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Poll interval in seconds for the live sidebar (minimum 5)
    #[arg(long, default_value = "30")]
    pub poll_interval: u64,

    /// Prediction requests in flight at once for the risk map
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

/// Parse a bounding box from string.
fn parse_bbox(s: &str) -> Result<BBox, String> {
    s.parse()
}

/// Parse a radius filter from string.
fn parse_radius(s: &str) -> Result<RadiusFilter, String> {
    s.parse()
}
