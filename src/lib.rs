//! gempaview - Indonesian earthquake catalog and prediction viewer.
//!
//! Talks to an earthquake backend (`/katalog`, `/predict_lstm`) and renders
//! its data as terminal views or as a web dashboard.

pub mod chart;
pub mod cli;
pub mod client;
pub mod dedup;
pub mod errors;
pub mod filters;
pub mod html;
pub mod map;
pub mod models;
pub mod output;
pub mod predictions;
pub mod projection;
pub mod provinces;
pub mod server;
pub mod sidebar;
pub mod styling;
pub mod view;

pub use client::{ClientConfig, GempaClient};
pub use errors::GempaError;
