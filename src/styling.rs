//! Color buckets for map pins, legends and sidebar classes.
//!
//! Every bucket carries both an ANSI escape for the terminal views and a
//! CSS color for the dashboard so the two surfaces agree.

// ANSI escape codes
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const ERROR_RED: &str = "\x1b[91m";

/// Marker color for a quake, by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MagnitudeBucket {
    /// No magnitude reported
    NoData,
    /// `< 2.5`
    Green,
    /// `2.5 - 3.4`
    Yellow,
    /// `3.5 - 4.4`
    Orange,
    /// `>= 4.5`
    Red,
}

impl MagnitudeBucket {
    /// Legend order, strongest last, "no data" at the end.
    pub const LEGEND: [Self; 5] = [Self::Green, Self::Yellow, Self::Orange, Self::Red, Self::NoData];

    #[must_use]
    pub fn from_magnitude(mag: Option<f64>) -> Self {
        match mag {
            None => Self::NoData,
            Some(m) if m < 2.5 => Self::Green,
            Some(m) if m < 3.5 => Self::Yellow,
            Some(m) if m < 4.5 => Self::Orange,
            Some(_) => Self::Red,
        }
    }

    #[must_use]
    pub const fn css_color(self) -> &'static str {
        match self {
            Self::NoData => "#808080",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }

    #[must_use]
    pub const fn ansi(self) -> &'static str {
        match self {
            Self::NoData => "\x1b[90m",
            Self::Green => "\x1b[92m",
            Self::Yellow => "\x1b[93m",
            Self::Orange => "\x1b[38;5;208m",
            Self::Red => "\x1b[91m",
        }
    }

    #[must_use]
    pub const fn legend_label(self) -> &'static str {
        match self {
            Self::NoData => "N/A (no magnitude)",
            Self::Green => "< 2.5",
            Self::Yellow => "2.5 - 3.4",
            Self::Orange => "3.5 - 4.4",
            Self::Red => "≥ 4.5",
        }
    }
}

/// Pin color for a province prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    /// Prediction unavailable
    Unknown,
    /// Model says yes and probability agrees
    Likely,
    /// Model says no and probability agrees
    Unlikely,
    /// `p >= 0.7` without a consistent flag
    Severe,
    /// `p >= 0.5`
    High,
    /// `p >= 0.3`
    Elevated,
    /// `p < 0.3`
    Low,
}

impl RiskLevel {
    /// Classify a pin. The flag only decides when it agrees with the
    /// probability; otherwise the probability gradient applies.
    #[must_use]
    pub fn classify(probability: Option<f64>, prediction: Option<u8>) -> Self {
        let Some(p) = probability else {
            return Self::Unknown;
        };
        match prediction {
            Some(1) if p >= 0.5 => Self::Likely,
            Some(0) if p < 0.5 => Self::Unlikely,
            _ if p >= 0.7 => Self::Severe,
            _ if p >= 0.5 => Self::High,
            _ if p >= 0.3 => Self::Elevated,
            _ => Self::Low,
        }
    }

    #[must_use]
    pub const fn css_color(self) -> &'static str {
        match self {
            Self::Unknown => "#6b7280",
            Self::Likely => "#dc2626",
            Self::Unlikely => "#16a34a",
            Self::Severe => "#b91c1c",
            Self::High => "#f97316",
            Self::Elevated => "#facc15",
            Self::Low => "#4ade80",
        }
    }

    #[must_use]
    pub const fn ansi(self) -> &'static str {
        match self {
            Self::Unknown => "\x1b[90m",
            Self::Likely => "\x1b[91m",
            Self::Unlikely => "\x1b[32m",
            Self::Severe => "\x1b[31m",
            Self::High => "\x1b[38;5;208m",
            Self::Elevated => "\x1b[93m",
            Self::Low => "\x1b[92m",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "no data",
            Self::Likely => "likely",
            Self::Unlikely => "unlikely",
            Self::Severe => "severe",
            Self::High => "high",
            Self::Elevated => "elevated",
            Self::Low => "low",
        }
    }
}

/// Default pin radius, in percent of the map frame.
pub const DEFAULT_PIN_RADIUS: f64 = 1.5;

/// Pin radius in percent of the map frame; grows with probability.
#[must_use]
pub fn pin_radius(probability: Option<f64>) -> f64 {
    probability.map_or(DEFAULT_PIN_RADIUS, |p| 1.0 + p * 2.0)
}

/// Sidebar magnitude classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Light,
    Moderate,
    Strong,
    Major,
}

impl Severity {
    pub const ALL: [Self; 4] = [Self::Light, Self::Moderate, Self::Strong, Self::Major];

    #[must_use]
    pub fn from_magnitude(mag: f64) -> Self {
        match mag {
            m if m >= 7.0 => Self::Major,
            m if m >= 6.0 => Self::Strong,
            m if m >= 4.5 => Self::Moderate,
            _ => Self::Light,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Light => "LIGHT",
            Self::Moderate => "MODERATE",
            Self::Strong => "STRONG",
            Self::Major => "MAJOR",
        }
    }

    #[must_use]
    pub const fn range(self) -> &'static str {
        match self {
            Self::Light => "< 4.5",
            Self::Moderate => "4.5 - 5.9",
            Self::Strong => "6.0 - 6.9",
            Self::Major => "≥ 7.0",
        }
    }

    #[must_use]
    pub const fn ansi(self) -> &'static str {
        match self {
            Self::Light => "\x1b[92m",
            Self::Moderate => "\x1b[93m",
            Self::Strong => "\x1b[38;5;208m",
            Self::Major => "\x1b[91m",
        }
    }

    #[must_use]
    pub const fn css_color(self) -> &'static str {
        match self {
            Self::Light => "#16a34a",
            Self::Moderate => "#ca8a04",
            Self::Strong => "#ea580c",
            Self::Major => "#dc2626",
        }
    }
}
