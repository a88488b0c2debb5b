//! Coordinate-to-pixel mapping for the Indonesia map.
//!
//! The frame is equirectangular: latitude and longitude map linearly onto
//! percentages of the frame, which [`Grid`] then maps onto character cells
//! (terminal) or SVG user units (dashboard).

/// Geographic bounds of a map frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFrame {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl MapFrame {
    /// Indonesia, from Aceh to Papua and from Miangas to Rote.
    pub const INDONESIA: Self = Self {
        north: 7.0,
        south: -11.5,
        west: 94.0,
        east: 142.0,
    };

    /// Map center used by the tile map.
    pub const CENTER: (f64, f64) = (-2.5, 118.0);

    /// Project a point to `(x%, y%)`; `None` outside the frame.
    #[must_use]
    pub fn project(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if lat > self.north || lat < self.south || lon < self.west || lon > self.east {
            return None;
        }
        let x = (lon - self.west) / (self.east - self.west) * 100.0;
        let y = (self.north - lat) / (self.north - self.south) * 100.0;
        Some((x, y))
    }

    /// Inverse of [`Self::project`].
    #[must_use]
    pub fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = self.west + x / 100.0 * (self.east - self.west);
        let lat = self.north - y / 100.0 * (self.north - self.south);
        (lat, lon)
    }

    /// Width over height in degrees.
    #[must_use]
    pub fn aspect(&self) -> f64 {
        (self.east - self.west) / (self.north - self.south)
    }
}

/// A raster of `width` x `height` cells over a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
}

impl Grid {
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Cell `(col, row)` for a frame percentage, clamped to the grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn cell(&self, x: f64, y: f64) -> (usize, usize) {
        let max_col = self.width.saturating_sub(1) as f64;
        let max_row = self.height.saturating_sub(1) as f64;
        let col = (x / 100.0 * max_col).round().clamp(0.0, max_col);
        let row = (y / 100.0 * max_row).round().clamp(0.0, max_row);
        (col as usize, row as usize)
    }

    /// Frame percentage at the center of a cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        let max_col = self.width.saturating_sub(1).max(1) as f64;
        let max_row = self.height.saturating_sub(1).max(1) as f64;
        (col as f64 / max_col * 100.0, row as f64 / max_row * 100.0)
    }
}

/// Coarse outlines of the main landmasses, as `(lat, lon)` rings.
pub const LAND: [&[(f64, f64)]; 9] = [
    // Sumatra
    &[
        (5.7, 95.2), (5.2, 97.5), (3.8, 98.8), (2.2, 100.4), (1.3, 102.0),
        (0.5, 103.5), (-1.0, 104.4), (-2.4, 106.0), (-3.5, 106.0), (-5.9, 105.8),
        (-5.8, 104.6), (-4.0, 102.3), (-2.5, 101.0), (-0.8, 100.2), (0.6, 99.1),
        (2.2, 98.2), (3.7, 96.7), (5.0, 95.3),
    ],
    // Java
    &[
        (-5.9, 106.0), (-6.1, 108.3), (-6.8, 110.6), (-6.9, 112.6), (-7.7, 114.4),
        (-8.7, 114.4), (-8.3, 111.0), (-7.7, 108.5), (-7.4, 106.4), (-6.8, 105.2),
    ],
    // Borneo
    &[
        (7.0, 116.9), (5.0, 119.2), (4.0, 117.8), (1.0, 118.9), (-1.0, 116.9),
        (-4.0, 116.0), (-3.5, 114.6), (-3.0, 111.0), (-2.9, 110.1), (-1.0, 110.0),
        (0.9, 108.9), (2.0, 109.6), (4.5, 114.0), (6.0, 116.0),
    ],
    // Sulawesi
    &[
        (1.5, 125.1), (0.5, 123.3), (0.6, 120.8), (-0.9, 121.1), (-0.9, 123.4),
        (-1.5, 123.0), (-3.0, 122.3), (-4.6, 123.2), (-5.6, 122.8), (-4.0, 121.6),
        (-3.0, 121.0), (-2.6, 120.4), (-5.6, 120.4), (-5.4, 119.4), (-3.5, 118.8),
        (-2.5, 119.1), (-0.9, 119.8), (0.6, 120.0), (1.1, 120.8), (0.9, 122.3),
        (1.0, 124.3),
    ],
    // New Guinea, clipped at the frame edge
    &[
        (-0.8, 131.0), (-0.3, 132.5), (-0.9, 134.2), (-2.4, 135.2), (-1.6, 137.5),
        (-2.6, 140.7), (-2.6, 142.0), (-9.1, 142.0), (-8.3, 139.0), (-7.4, 138.5),
        (-5.2, 137.8), (-4.2, 135.2), (-3.4, 132.8), (-2.3, 133.5), (-2.0, 131.8),
        (-1.2, 131.0),
    ],
    // Lesser Sunda Islands
    &[
        (-8.1, 114.6), (-8.3, 117.0), (-8.2, 119.0), (-8.2, 122.8), (-8.3, 124.5),
        (-8.1, 127.0), (-8.9, 126.0), (-10.3, 123.5), (-9.9, 120.0), (-8.9, 118.0),
        (-8.8, 115.0),
    ],
    // Halmahera
    &[(2.3, 127.9), (0.8, 128.6), (-0.8, 128.2), (0.0, 127.5), (1.2, 127.5)],
    // Seram and Buru
    &[(-2.8, 126.0), (-2.8, 130.8), (-3.8, 130.8), (-3.6, 128.2), (-3.8, 126.0)],
    // Malay Peninsula
    &[
        (7.0, 100.2), (6.2, 102.3), (4.0, 103.4), (1.4, 104.2), (1.3, 103.5),
        (2.8, 101.3), (4.7, 100.6), (6.5, 99.8),
    ],
];

/// Even-odd point-in-polygon test.
fn ring_contains(ring: &[(f64, f64)], lat: f64, lon: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len().saturating_sub(1);
    for (i, &(lat_i, lon_i)) in ring.iter().enumerate() {
        let (lat_j, lon_j) = ring[j];
        if (lat_i > lat) != (lat_j > lat) {
            let cross = lon_i + (lat - lat_i) / (lat_j - lat_i) * (lon_j - lon_i);
            if lon < cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Whether a point falls on one of the [`LAND`] outlines.
#[must_use]
pub fn is_land(lat: f64, lon: f64) -> bool {
    LAND.iter().any(|ring| ring_contains(ring, lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_project_corners() {
        let frame = MapFrame::INDONESIA;
        assert_eq!(frame.project(7.0, 94.0), Some((0.0, 0.0)));
        assert_eq!(frame.project(-11.5, 142.0), Some((100.0, 100.0)));
    }

    #[test]
    fn test_project_outside_frame() {
        let frame = MapFrame::INDONESIA;
        assert!(frame.project(35.6, 139.7).is_none()); // Tokyo
        assert!(frame.project(-2.0, 150.0).is_none());
        assert!(frame.project(f64::NAN, 110.0).is_none());
    }

    #[test]
    fn test_unproject_inverts_project() {
        let frame = MapFrame::INDONESIA;
        let (x, y) = frame.project(-6.2, 106.8).expect("Jakarta is in frame");
        let (lat, lon) = frame.unproject(x, y);
        assert!(approx(lat, -6.2));
        assert!(approx(lon, 106.8));
    }

    #[test]
    fn test_grid_cells() {
        let grid = Grid::new(97, 21);
        assert_eq!(grid.cell(0.0, 0.0), (0, 0));
        assert_eq!(grid.cell(100.0, 100.0), (96, 20));
        assert_eq!(grid.cell(50.0, 50.0), (48, 10));
        // Out-of-range percentages clamp
        assert_eq!(grid.cell(-5.0, 140.0), (0, 20));
    }

    #[test]
    fn test_cell_center_round_trip() {
        let grid = Grid::new(97, 21);
        let (x, y) = grid.cell_center(48, 10);
        assert_eq!(grid.cell(x, y), (48, 10));
    }

    #[test]
    fn test_land_mask() {
        assert!(is_land(-0.9, 100.4)); // Padang
        assert!(is_land(-7.3, 110.0)); // Central Java
        assert!(is_land(-1.0, 114.0)); // Central Kalimantan
        assert!(!is_land(-5.0, 110.0)); // Java Sea
        assert!(!is_land(-10.0, 100.0)); // Indian Ocean
    }
}
