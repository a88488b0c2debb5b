//! Output formatters for list-style commands.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use serde::Serialize;

use crate::models::{OutputQuake, Prediction, Quake};
use crate::predictions::ProvinceRisk;
use crate::styling::{BOLD, DIM, MagnitudeBucket, RESET, Severity};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// One province row in JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRisk<'a> {
    pub id: &'static str,
    pub province: &'static str,
    pub probability: Option<f64>,
    pub prediction: Option<u8>,
    pub level: &'static str,
    pub error: Option<&'a str>,
}

impl<'a> From<&'a ProvinceRisk> for OutputRisk<'a> {
    fn from(r: &'a ProvinceRisk) -> Self {
        Self {
            id: r.province.id,
            province: r.province.name,
            probability: r.probability(),
            prediction: r.prediction.as_ref().map(|p| p.prediction),
            level: r.level().label(),
            error: r.error.as_deref(),
        }
    }
}

fn to_io<E: std::error::Error + Send + Sync + 'static>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

fn write_json_array<W: Write, T: Serialize>(writer: &mut W, items: &[T]) -> io::Result<()> {
    let json = serde_json::to_string_pretty(items).map_err(to_io)?;
    writeln!(writer, "{json}")
}

fn write_json_lines<W: Write, T: Serialize>(writer: &mut W, items: &[T]) -> io::Result<()> {
    for item in items {
        let json = serde_json::to_string(item).map_err(to_io)?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write events in human-readable format, one line each.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, quakes: &[Quake]) -> io::Result<()> {
    for quake in quakes {
        let bucket = MagnitudeBucket::from_magnitude(quake.magnitude);
        let color = bucket.ansi();
        let mag = quake
            .magnitude
            .map_or_else(|| "?".into(), |m| format!("{m:.1}"));
        let label = quake
            .magnitude
            .map_or("UNKNOWN", |m| Severity::from_magnitude(m).label());
        let depth = quake
            .depth_km
            .map_or_else(|| "    ?".into(), |d| format!("{d:>5.0}"));

        writeln!(
            writer,
            "{color}{BOLD}M{mag}{RESET} │ \
             {color}{label:8}{RESET} │ \
             {DIM}{depth}km{RESET} │ \
             {time} │ \
             {place}",
            time = quake.time_label(),
            place = quake.province_label(),
        )?;
    }
    Ok(())
}

/// Write events in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_quakes<W: Write>(writer: &mut W, quakes: &[Quake], format: Format) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, quakes),
        Format::Json => {
            let out: Vec<OutputQuake> = quakes.iter().map(OutputQuake::from).collect();
            write_json_array(writer, &out)
        }
        Format::Ndjson => {
            let out: Vec<OutputQuake> = quakes.iter().map(OutputQuake::from).collect();
            write_json_lines(writer, &out)
        }
    }
}

/// Write a single prediction as JSON (the backend's own field names).
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_prediction_json<W: Write>(writer: &mut W, prediction: &Prediction, format: Format) -> io::Result<()> {
    let json = if format == Format::Ndjson {
        serde_json::to_string(prediction)
    } else {
        serde_json::to_string_pretty(prediction)
    }
    .map_err(to_io)?;
    writeln!(writer, "{json}")
}

/// Write province predictions as JSON or NDJSON.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_risks<W: Write>(writer: &mut W, risks: &[ProvinceRisk], format: Format) -> io::Result<()> {
    let out: Vec<OutputRisk<'_>> = risks.iter().map(OutputRisk::from).collect();
    match format {
        Format::Ndjson => write_json_lines(writer, &out),
        Format::Human | Format::Json => write_json_array(writer, &out),
    }
}
