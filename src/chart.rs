//! Earthquake history chart: event counts per province.

use std::io::{self, Write};

use crate::models::Quake;
use crate::styling::{BOLD, DIM, ERROR_RED, RESET};
use crate::view::ViewState;

/// How many events the chart is computed over.
pub const CHART_LIMIT: usize = 200;

/// Label for events without a province.
pub const UNKNOWN_PROVINCE: &str = "Unknown";

/// Message when the chart data could not be loaded.
pub const FAILED_MESSAGE: &str = "Failed to load chart data.";

const BAR_COLOR: &str = "\x1b[94m";

/// Count events per province, in order of first appearance.
#[must_use]
pub fn count_by_province(quakes: &[Quake]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for quake in quakes {
        let name = quake.province.as_deref().unwrap_or(UNKNOWN_PROVINCE);
        match counts.iter_mut().find(|(p, _)| p == name) {
            Some((_, n)) => *n += 1,
            None => counts.push((name.to_string(), 1)),
        }
    }
    counts
}

/// Chart title including the sample size.
#[must_use]
pub fn dataset_label(limit: usize) -> String {
    format!("Earthquakes per province ({limit} most recent)")
}

/// Bar length in cells for `count` out of `max`, at least one cell for a
/// non-zero count.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn bar_len(count: usize, max: usize, width: usize) -> usize {
    if count == 0 || max == 0 {
        return 0;
    }
    let len = (count as f64 / max as f64 * width as f64).round() as usize;
    len.clamp(1, width)
}

/// Write the chart for a load state.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_chart<W: Write>(
    writer: &mut W,
    state: &ViewState<Vec<(String, usize)>>,
    limit: usize,
    width: usize,
) -> io::Result<()> {
    writeln!(writer, "{BOLD}Earthquake history{RESET}")?;

    let counts = match state {
        ViewState::Loading => return writeln!(writer, "{DIM}Loading chart...{RESET}"),
        ViewState::Error(_) => return writeln!(writer, "{ERROR_RED}{FAILED_MESSAGE}{RESET}"),
        ViewState::Ready(counts) => counts,
    };

    writeln!(writer, "{DIM}{}{RESET}", dataset_label(limit))?;
    if counts.is_empty() {
        return writeln!(writer, "{DIM}No data.{RESET}");
    }

    let label_width = counts.iter().map(|(p, _)| p.chars().count()).max().unwrap_or(0);
    let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);

    for (province, count) in counts {
        let bar = "█".repeat(bar_len(*count, max, width));
        writeln!(writer, "{province:>label_width$} │{BAR_COLOR}{bar}{RESET} {count}")?;
    }
    Ok(())
}
