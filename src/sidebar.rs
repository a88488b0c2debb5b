//! Recent-earthquake sidebar: magnitude classification and the latest events.

use std::io::{self, Write};

use crate::models::Quake;
use crate::styling::{BOLD, DIM, ERROR_RED, MagnitudeBucket, RESET, Severity};
use crate::view::ViewState;

/// How many events the sidebar asks for.
pub const RECENT_LIMIT: usize = 10;

/// Message shown for an empty catalog.
pub const EMPTY_MESSAGE: &str = "No recent earthquake data.";

/// Event counts per severity class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub light: usize,
    pub moderate: usize,
    pub strong: usize,
    pub major: usize,
    /// Events without a magnitude
    pub unknown: usize,
}

impl Classification {
    #[must_use]
    pub fn from_quakes(quakes: &[Quake]) -> Self {
        let mut counts = Self::default();
        for quake in quakes {
            match quake.magnitude.map(Severity::from_magnitude) {
                Some(Severity::Light) => counts.light += 1,
                Some(Severity::Moderate) => counts.moderate += 1,
                Some(Severity::Strong) => counts.strong += 1,
                Some(Severity::Major) => counts.major += 1,
                None => counts.unknown += 1,
            }
        }
        counts
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Light => self.light,
            Severity::Moderate => self.moderate,
            Severity::Strong => self.strong,
            Severity::Major => self.major,
        }
    }
}

/// Magnitude shown in list rows.
#[must_use]
pub fn magnitude_text(quake: &Quake) -> String {
    quake.magnitude.map_or_else(|| "N/A".into(), |m| format!("{m:.1}"))
}

/// Depth shown in list rows.
#[must_use]
pub fn depth_text(quake: &Quake) -> String {
    quake.depth_km.map_or_else(|| "N/A".into(), |d| format!("{d} km"))
}

/// Write the classification block.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_classification<W: Write>(writer: &mut W, counts: &Classification) -> io::Result<()> {
    writeln!(writer, "{BOLD}Earthquake classes{RESET}")?;
    for severity in Severity::ALL {
        writeln!(
            writer,
            "  {color}{count:>4}{RESET}  {label:<9} {DIM}{range}{RESET}",
            color = severity.ansi(),
            count = counts.count(severity),
            label = severity.label(),
            range = severity.range(),
        )?;
    }
    if counts.unknown > 0 {
        writeln!(writer, "  {DIM}{:>4}  without magnitude{RESET}", counts.unknown)?;
    }
    Ok(())
}

/// Write one list row.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_row<W: Write>(writer: &mut W, quake: &Quake) -> io::Result<()> {
    let color = MagnitudeBucket::from_magnitude(quake.magnitude).ansi();
    writeln!(
        writer,
        "{color}●{RESET} {BOLD}{province}{RESET}\n  {DIM}{time}{RESET}  Mag: {color}{mag}{RESET}  Depth: {depth}",
        province = quake.province_label(),
        time = quake.time_label(),
        mag = magnitude_text(quake),
        depth = depth_text(quake),
    )
}

/// Write the whole sidebar for a load state.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_sidebar<W: Write>(writer: &mut W, state: &ViewState<Vec<Quake>>) -> io::Result<()> {
    writeln!(writer, "{BOLD}Earthquake Map{RESET}")?;
    writeln!(writer, "{DIM}Prediction & Information{RESET}")?;
    writeln!(writer)?;

    match state {
        ViewState::Loading => writeln!(writer, "{DIM}Loading data...{RESET}"),
        ViewState::Error(message) => writeln!(writer, "{ERROR_RED}{message}{RESET}"),
        ViewState::Ready(quakes) => {
            write_classification(writer, &Classification::from_quakes(quakes))?;
            writeln!(writer)?;
            writeln!(writer, "{BOLD}Recent earthquakes{RESET}")?;
            if quakes.is_empty() {
                return writeln!(writer, "{DIM}{EMPTY_MESSAGE}{RESET}");
            }
            for quake in quakes {
                write_row(writer, quake)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KatalogRecord;

    fn quakes(json: &str) -> Vec<Quake> {
        let records: Vec<KatalogRecord> = serde_json::from_str(json).expect("valid records");
        Quake::from_records(&records)
    }

    fn render(state: &ViewState<Vec<Quake>>) -> String {
        let mut out = Vec::new();
        write_sidebar(&mut out, state).expect("write to vec");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn test_classification_counts() {
        let counts = Classification::from_quakes(&quakes(
            r#"[{"mag":2.0},{"mag":4.4},{"mag":4.5},{"mag":6.2},{"mag":7.4},{}]"#,
        ));
        assert_eq!(
            counts,
            Classification {
                light: 2,
                moderate: 1,
                strong: 1,
                major: 1,
                unknown: 1,
            }
        );
    }

    #[test]
    fn test_empty_catalog_renders_no_data() {
        let out = render(&ViewState::Ready(Vec::new()));
        assert!(out.contains(EMPTY_MESSAGE));
    }

    #[test]
    fn test_error_is_shown() {
        let out = render(&ViewState::Error("Failed to load recent earthquakes.".into()));
        assert!(out.contains("Failed to load recent earthquakes."));
        assert!(!out.contains("Recent earthquakes"));
    }

    #[test]
    fn test_loading_branch() {
        assert!(render(&ViewState::Loading).contains("Loading data..."));
    }

    #[test]
    fn test_rows_show_fields_and_fallbacks() {
        let out = render(&ViewState::Ready(quakes(
            r#"[{"provinsi":"Bali","mag":3.25,"depth":12.4,"tgl":"2024-06-01"},{"tgl":"2024-06-02"}]"#,
        )));
        assert!(out.contains("Bali"));
        assert!(out.contains("Mag: "));
        assert!(out.contains("3.2") || out.contains("3.3"));
        assert!(out.contains("12.4 km"));
        assert!(out.contains("Unknown location"));
        assert!(out.contains("N/A"));
    }

    #[test]
    fn test_depth_keeps_precision() {
        let rows = quakes(r#"[{"depth":12.4},{"depth":"24"},{"depth":0}]"#);
        let depths: Vec<String> = rows.iter().map(depth_text).collect();
        assert_eq!(depths, ["12.4 km", "24 km", "0 km"]);
    }
}
