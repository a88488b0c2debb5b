//! Terminal map of Indonesia with quake and prediction pins.

use std::io::{self, Write};

use crate::models::QuakeLocation;
use crate::predictions::ProvinceRisk;
use crate::projection::{Grid, MapFrame, is_land};
use crate::styling::{BOLD, DIM, ERROR_RED, MagnitudeBucket, RESET, RiskLevel};
use crate::view::ViewState;

/// Default terminal map size in cells.
pub const DEFAULT_GRID: Grid = Grid::new(97, 21);

/// How many events the quake map asks for.
pub const MAP_LIMIT: usize = 50;

const LAND_GLYPH: char = '·';
const LAND_COLOR: &str = "\x1b[2;37m";

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    glyph: char,
    color: &'static str,
    /// Higher wins when two pins share a cell
    rank: f64,
}

const EMPTY: Cell = Cell {
    glyph: ' ',
    color: "",
    rank: f64::NEG_INFINITY,
};

/// A character raster over the Indonesia frame.
#[derive(Debug, Clone)]
pub struct Canvas {
    grid: Grid,
    frame: MapFrame,
    cells: Vec<Cell>,
}

impl Canvas {
    /// Blank canvas with the coastline drawn in.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        let frame = MapFrame::INDONESIA;
        let mut cells = vec![EMPTY; grid.width * grid.height];
        for row in 0..grid.height {
            for col in 0..grid.width {
                let (x, y) = grid.cell_center(col, row);
                let (lat, lon) = frame.unproject(x, y);
                if is_land(lat, lon) {
                    cells[row * grid.width + col] = Cell {
                        glyph: LAND_GLYPH,
                        color: LAND_COLOR,
                        rank: f64::NEG_INFINITY,
                    };
                }
            }
        }
        Self { grid, frame, cells }
    }

    /// Place a pin at a frame percentage. Returns the cell it landed in.
    pub fn plot(&mut self, x: f64, y: f64, glyph: char, color: &'static str, rank: f64) -> (usize, usize) {
        let (col, row) = self.grid.cell(x, y);
        let cell = &mut self.cells[row * self.grid.width + col];
        if cell.glyph == ' ' || cell.glyph == LAND_GLYPH || rank >= cell.rank {
            *cell = Cell { glyph, color, rank };
        }
        (col, row)
    }

    /// Place a pin at a geographic position; `false` when outside the frame.
    pub fn plot_geo(&mut self, lat: f64, lon: f64, glyph: char, color: &'static str, rank: f64) -> bool {
        match self.frame.project(lat, lon) {
            Some((x, y)) => {
                self.plot(x, y, glyph, color, rank);
                true
            }
            None => false,
        }
    }

    /// Glyph at a cell, for inspection.
    #[must_use]
    pub fn glyph_at(&self, col: usize, row: usize) -> Option<char> {
        self.cells.get(row * self.grid.width + col).map(|c| c.glyph)
    }

    /// Write the canvas inside a box.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let rule = "─".repeat(self.grid.width);
        writeln!(writer, "{DIM}┌{rule}┐{RESET}")?;
        for row in self.cells.chunks(self.grid.width) {
            write!(writer, "{DIM}│{RESET}")?;
            for cell in row {
                if cell.color.is_empty() {
                    write!(writer, "{}", cell.glyph)?;
                } else {
                    write!(writer, "{}{}{RESET}", cell.color, cell.glyph)?;
                }
            }
            writeln!(writer, "{DIM}│{RESET}")?;
        }
        writeln!(writer, "{DIM}└{rule}┘{RESET}")
    }
}

/// Pin glyph for a prediction, larger with higher probability.
#[must_use]
pub fn risk_glyph(probability: Option<f64>) -> char {
    match probability {
        None => '○',
        Some(p) if p < 0.34 => '•',
        Some(p) if p < 0.67 => '●',
        Some(_) => '◉',
    }
}

/// Write the magnitude legend.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_legend<W: Write>(writer: &mut W) -> io::Result<()> {
    write!(writer, "{BOLD}Magnitude{RESET} ")?;
    for bucket in MagnitudeBucket::LEGEND {
        write!(writer, " {}●{RESET} {}", bucket.ansi(), bucket.legend_label())?;
    }
    writeln!(writer)
}

/// Write the quake map for a load state.
///
/// Stronger events are drawn over weaker ones sharing a cell.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_quake_map<W: Write>(
    writer: &mut W,
    state: &ViewState<Vec<QuakeLocation>>,
    grid: Grid,
) -> io::Result<()> {
    let mut canvas = Canvas::new(grid);
    let mut outside = 0usize;

    match state {
        ViewState::Loading => writeln!(writer, "{DIM}Loading map...{RESET}")?,
        ViewState::Error(message) => writeln!(writer, "{ERROR_RED}Error: {message}{RESET}")?,
        ViewState::Ready(locations) => {
            for loc in locations {
                let bucket = loc.bucket();
                let rank = loc.mag.unwrap_or(f64::MIN);
                if !canvas.plot_geo(loc.lat, loc.lng, '●', bucket.ansi(), rank) {
                    outside += 1;
                }
            }
        }
    }

    canvas.write(writer)?;
    write_legend(writer)?;

    if let ViewState::Ready(locations) = state {
        write!(writer, "{DIM}{} events plotted", locations.len() - outside)?;
        if outside > 0 {
            write!(writer, ", {outside} outside the map")?;
        }
        writeln!(writer, "{RESET}")?;
    }
    Ok(())
}

/// Write the prediction map and the province table.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_risk_map<W: Write>(
    writer: &mut W,
    state: &ViewState<Vec<ProvinceRisk>>,
    grid: Grid,
) -> io::Result<()> {
    let mut canvas = Canvas::new(grid);

    let entries = match state {
        ViewState::Loading => {
            writeln!(writer, "{DIM}Loading map data...{RESET}")?;
            return canvas.write(writer);
        }
        ViewState::Error(message) => {
            writeln!(writer, "{ERROR_RED}Failed to load pin data.{RESET}")?;
            canvas.write(writer)?;
            return writeln!(writer, "{ERROR_RED}{BOLD}Error{RESET} {message}");
        }
        ViewState::Ready(entries) => entries,
    };

    if entries.is_empty() {
        canvas.write(writer)?;
        return writeln!(writer, "{DIM}No prediction data for the map.{RESET}");
    }

    for entry in entries {
        if let Some((x, y)) = entry.province.pin() {
            let probability = entry.probability();
            let rank = probability.unwrap_or(-1.0);
            canvas.plot(x, y, risk_glyph(probability), entry.level().ansi(), rank);
        }
    }
    canvas.write(writer)?;

    write!(writer, "{BOLD}Risk{RESET} ")?;
    for level in [
        RiskLevel::Likely,
        RiskLevel::Severe,
        RiskLevel::High,
        RiskLevel::Elevated,
        RiskLevel::Low,
        RiskLevel::Unlikely,
        RiskLevel::Unknown,
    ] {
        write!(writer, " {}●{RESET} {}", level.ansi(), level.label())?;
    }
    writeln!(writer)?;
    writeln!(writer)?;

    for entry in entries {
        let level = entry.level();
        let probability = entry
            .probability()
            .map_or_else(|| "  n/a".to_string(), |p| format!("{:>5.1}%", p * 100.0));
        writeln!(
            writer,
            "  {color}{glyph}{RESET} {name:<26} {color}{probability}{RESET}  {DIM}{label}{RESET}",
            color = level.ansi(),
            glyph = risk_glyph(entry.probability()),
            name = entry.province.name,
            label = level.label(),
        )?;
    }
    Ok(())
}
