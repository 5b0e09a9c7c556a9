//! Rectangles, grid configuration and the pure geometry derived from them.
//!
//! Everything in this module is stateless.  A [`GridGeometry`] borrows a
//! monitor area and a [`GridConfig`] and answers "where is cell `(c, r)`",
//! "where is zone `i`" and "which lines should be drawn".  Coordinates are
//! `f64` throughout; rounding to whole pixels is left to the backend that
//! finally moves the window.

use serde::{Deserialize, Serialize};

/// Upper bound on grid columns.
pub const MAX_GRID_COLUMNS: u32 = 24;
/// Upper bound on grid rows.
pub const MAX_GRID_ROWS: u32 = 16;
/// Aspect ratio above which a monitor counts as ultrawide.
pub const ULTRAWIDE_ASPECT_RATIO: f64 = 2.0;

/// Tolerance used when comparing floating point geometry.
const EPSILON: f64 = 1e-6;

//  Primitives

/// A point in monitor-local or screen-global space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A line segment, used for grid and snap guides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub from: Point,
    pub to: Point,
}

impl Line {
    /// Vertical line at `x` spanning `top..bottom`.
    pub fn vertical(x: f64, top: f64, bottom: f64) -> Self {
        Self {
            from: Point::new(x, top),
            to: Point::new(x, bottom),
        }
    }

    /// Horizontal line at `y` spanning `left..right`.
    pub fn horizontal(y: f64, left: f64, right: f64) -> Self {
        Self {
            from: Point::new(left, y),
            to: Point::new(right, y),
        }
    }
}

/// An axis-aligned rectangle.
///
/// `width` and `height` are never negative: [`Rect::new`] clamps them to
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Exclusive right edge (`x + width`).
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Exclusive bottom edge (`y + height`).
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            0.0
        }
    }

    /// Whether `p` lies inside the half-open rectangle.
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Whether `other` lies fully inside `self` (within floating tolerance).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.bottom() <= self.bottom() + EPSILON
    }

    /// Whether the interiors of the two rectangles overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right() - EPSILON
            && other.x < self.right() - EPSILON
            && self.y < other.bottom() - EPSILON
            && other.y < self.bottom() - EPSILON
    }

    /// Shift by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Field-wise equality within floating tolerance.
    pub fn approx_eq(&self, other: &Rect) -> bool {
        (self.x - other.x).abs() <= EPSILON
            && (self.y - other.y).abs() <= EPSILON
            && (self.width - other.width).abs() <= EPSILON
            && (self.height - other.height).abs() <= EPSILON
    }

    /// Linear interpolation of every field independently.
    pub fn lerp(&self, to: &Rect, t: f64) -> Self {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Self::new(
            mix(self.x, to.x),
            mix(self.y, to.y),
            mix(self.width, to.width),
            mix(self.height, to.height),
        )
    }

    /// The same rectangle snapped to whole pixels.
    pub fn rounded(&self) -> Self {
        Self::new(
            self.x.round(),
            self.y.round(),
            self.width.round(),
            self.height.round(),
        )
    }
}

//  Grid configuration

/// A horizontal slice of a monitor expressed as fractions of its width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub start: f64,
    pub end: f64,
}

impl Zone {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, fraction: f64) -> bool {
        self.start <= fraction && fraction <= self.end
    }
}

/// Problems detected by [`GridConfig::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridConfigError {
    #[error("columns must be in 1..=24, got {0}")]
    Columns(u32),
    #[error("rows must be in 1..=16, got {0}")]
    Rows(u32),
    #[error("zone {index} ({start}, {end}) must satisfy 0 <= start < end <= 1")]
    Zone { index: usize, start: f64, end: f64 },
}

/// How a monitor is carved up: a `columns × rows` grid, optional 2×2
/// subdivisions per cell, and one or more horizontal zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns: u32,
    pub rows: u32,
    pub subdivisions: bool,
    pub zones: Vec<Zone>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 6,
            rows: 4,
            subdivisions: false,
            zones: vec![Zone::new(0.0, 1.0)],
        }
    }
}

/// Knobs used when a grid configuration has to be synthesized for a
/// monitor nobody configured yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridDefaults {
    pub rows: u32,
    pub standard_columns: u32,
    pub ultrawide_columns: u32,
}

impl Default for GridDefaults {
    fn default() -> Self {
        Self {
            rows: 4,
            standard_columns: 6,
            ultrawide_columns: 12,
        }
    }
}

impl GridConfig {
    /// More than one zone means the monitor is treated as ultrawide.
    pub fn is_ultrawide(&self) -> bool {
        self.zones.len() > 1
    }

    /// Synthesize a configuration for a monitor with the given work area.
    pub fn for_work_area(area: &Rect, defaults: &GridDefaults) -> Self {
        let ratio = area.aspect_ratio();
        if ratio > ULTRAWIDE_ASPECT_RATIO {
            Self {
                columns: defaults.ultrawide_columns,
                rows: defaults.rows,
                subdivisions: true,
                zones: default_zones(ratio),
            }
        } else {
            Self {
                columns: defaults.standard_columns,
                rows: defaults.rows,
                subdivisions: false,
                zones: vec![Zone::new(0.0, 1.0)],
            }
        }
    }

    pub fn validate(&self) -> Result<(), GridConfigError> {
        if self.columns == 0 || self.columns > MAX_GRID_COLUMNS {
            return Err(GridConfigError::Columns(self.columns));
        }
        if self.rows == 0 || self.rows > MAX_GRID_ROWS {
            return Err(GridConfigError::Rows(self.rows));
        }
        for (index, zone) in self.zones.iter().enumerate() {
            let in_range = (0.0..=1.0).contains(&zone.start) && (0.0..=1.0).contains(&zone.end);
            if !in_range || zone.start >= zone.end {
                return Err(GridConfigError::Zone {
                    index,
                    start: zone.start,
                    end: zone.end,
                });
            }
        }
        Ok(())
    }
}

/// Zone split for a monitor of the given aspect ratio.
///
/// Super-ultrawide (≥ 3.5) gets quarter/half/quarter, ultrawide (≥ 2.5)
/// gets thirds, anything narrower gets halves.
pub fn default_zones(aspect_ratio: f64) -> Vec<Zone> {
    if aspect_ratio >= 3.5 {
        vec![
            Zone::new(0.0, 0.25),
            Zone::new(0.25, 0.75),
            Zone::new(0.75, 1.0),
        ]
    } else if aspect_ratio >= 2.5 {
        vec![
            Zone::new(0.0, 0.33),
            Zone::new(0.33, 0.67),
            Zone::new(0.67, 1.0),
        ]
    } else {
        vec![Zone::new(0.0, 0.5), Zone::new(0.5, 1.0)]
    }
}

//  Derived geometry

/// The three line sets a renderer needs to draw a grid overlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridLines {
    pub main: Vec<Line>,
    pub sub: Vec<Line>,
    pub zones: Vec<Line>,
}

/// Read-only view that maps `(area, config)` to rectangles.
#[derive(Debug, Clone, Copy)]
pub struct GridGeometry<'a> {
    area: Rect,
    config: &'a GridConfig,
}

impl<'a> GridGeometry<'a> {
    pub fn new(area: Rect, config: &'a GridConfig) -> Self {
        Self { area, config }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Size of one grid cell as `(width, height)`.
    pub fn cell_size(&self) -> (f64, f64) {
        (
            self.area.width / self.config.columns.max(1) as f64,
            self.area.height / self.config.rows.max(1) as f64,
        )
    }

    /// Size of one subcell (half a cell in each direction).
    pub fn subcell_size(&self) -> (f64, f64) {
        let (w, h) = self.cell_size();
        (w / 2.0, h / 2.0)
    }

    pub fn cell_rect(&self, col: u32, row: u32) -> Rect {
        let (w, h) = self.cell_size();
        Rect::new(
            self.area.x + col as f64 * w,
            self.area.y + row as f64 * h,
            w,
            h,
        )
    }

    /// One quarter of cell `(col, row)`; `None` unless subdivisions are
    /// enabled and `subcol`/`subrow` are 0 or 1.
    pub fn subcell_rect(&self, col: u32, row: u32, subcol: u32, subrow: u32) -> Option<Rect> {
        if !self.config.subdivisions || subcol > 1 || subrow > 1 {
            return None;
        }
        let cell = self.cell_rect(col, row);
        let (w, h) = self.subcell_size();
        Some(Rect::new(
            cell.x + subcol as f64 * w,
            cell.y + subrow as f64 * h,
            w,
            h,
        ))
    }

    /// Full-height rectangle of zone `index`.
    pub fn zone_rect(&self, index: usize) -> Option<Rect> {
        let zone = self.config.zones.get(index)?;
        Some(Rect::new(
            self.area.x + zone.start * self.area.width,
            self.area.y,
            (zone.end - zone.start) * self.area.width,
            self.area.height,
        ))
    }

    /// Index of the first zone whose span contains the horizontal
    /// `fraction` of the area.
    pub fn zone_at(&self, fraction: f64) -> Option<usize> {
        self.config.zones.iter().position(|z| z.contains(fraction))
    }

    /// Lines for the main grid, subdivisions and zone dividers.
    pub fn grid_lines(&self) -> GridLines {
        let a = self.area;
        let (cw, ch) = self.cell_size();
        let mut lines = GridLines::default();

        for col in 0..=self.config.columns {
            lines
                .main
                .push(Line::vertical(a.x + col as f64 * cw, a.y, a.bottom()));
        }
        for row in 0..=self.config.rows {
            lines
                .main
                .push(Line::horizontal(a.y + row as f64 * ch, a.x, a.right()));
        }

        if self.config.subdivisions {
            for col in 0..self.config.columns {
                for row in 0..self.config.rows {
                    let cell = self.cell_rect(col, row);
                    let mid_x = cell.x + cell.width / 2.0;
                    let mid_y = cell.y + cell.height / 2.0;
                    lines.sub.push(Line::vertical(mid_x, cell.y, cell.bottom()));
                    lines.sub.push(Line::horizontal(mid_y, cell.x, cell.right()));
                }
            }
        }

        for zone in self.config.zones.iter().skip(1) {
            let x = a.x + zone.start * a.width;
            lines.zones.push(Line::vertical(x, a.y, a.bottom()));
        }

        lines
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn fhd() -> Rect {
        Rect::new(0.0, 0.0, 1920.0, 1080.0)
    }

    #[test]
    fn rect_clamps_negative_size() {
        let r = Rect::new(5.0, 5.0, -10.0, -1.0);
        assert_eq!(r.width, 0.0);
        assert_eq!(r.height, 0.0);
    }

    #[test]
    fn cell_rect_includes_monitor_origin() {
        let cfg = GridConfig::default();
        let g = GridGeometry::new(Rect::new(1920.0, 100.0, 1920.0, 1080.0), &cfg);
        let cell = g.cell_rect(1, 2);
        assert_eq!(cell, Rect::new(1920.0 + 320.0, 100.0 + 540.0, 320.0, 270.0));
    }

    #[test]
    fn subcell_requires_subdivisions() {
        let mut cfg = GridConfig::default();
        assert!(GridGeometry::new(fhd(), &cfg).subcell_rect(0, 0, 1, 1).is_none());

        cfg.subdivisions = true;
        let g = GridGeometry::new(fhd(), &cfg);
        assert_eq!(
            g.subcell_rect(1, 0, 1, 1),
            Some(Rect::new(320.0 + 160.0, 135.0, 160.0, 135.0))
        );
        assert!(g.subcell_rect(0, 0, 2, 0).is_none());
    }

    #[test]
    fn zone_rect_out_of_range_is_none() {
        let cfg = GridConfig::default();
        let g = GridGeometry::new(fhd(), &cfg);
        assert_eq!(g.zone_rect(0), Some(fhd()));
        assert!(g.zone_rect(1).is_none());
    }

    #[test]
    fn zone_widths_sum_to_monitor_width() {
        let area = Rect::new(0.0, 0.0, 3440.0, 1440.0);
        for ratio in [2.2, 2.6, 3.6] {
            let cfg = GridConfig {
                zones: default_zones(ratio),
                ..GridConfig::default()
            };
            let g = GridGeometry::new(area, &cfg);
            let total: f64 = (0..cfg.zones.len())
                .filter_map(|i| g.zone_rect(i))
                .map(|r| r.width)
                .sum();
            assert!((total - area.width).abs() < 1e-6, "ratio {ratio}: {total}");
        }
    }

    #[test]
    fn grid_lines_counts() {
        let cfg = GridConfig {
            columns: 4,
            rows: 3,
            subdivisions: true,
            zones: vec![Zone::new(0.0, 0.5), Zone::new(0.5, 1.0)],
        };
        let lines = GridGeometry::new(fhd(), &cfg).grid_lines();
        assert_eq!(lines.main.len(), 5 + 4);
        assert_eq!(lines.sub.len(), 4 * 3 * 2);
        assert_eq!(lines.zones, vec![Line::vertical(960.0, 0.0, 1080.0)]);
    }

    #[test]
    fn no_subdivision_lines_when_disabled() {
        let cfg = GridConfig::default();
        let lines = GridGeometry::new(fhd(), &cfg).grid_lines();
        assert!(lines.sub.is_empty());
        assert!(lines.zones.is_empty());
    }

    #[test]
    fn default_config_for_standard_monitor() {
        let cfg = GridConfig::for_work_area(&fhd(), &GridDefaults::default());
        assert_eq!(cfg.columns, 6);
        assert_eq!(cfg.rows, 4);
        assert!(!cfg.subdivisions);
        assert!(!cfg.is_ultrawide());
    }

    #[test]
    fn default_config_for_ultrawide_monitor() {
        let area = Rect::new(0.0, 0.0, 5120.0, 1440.0);
        let cfg = GridConfig::for_work_area(&area, &GridDefaults::default());
        assert_eq!(cfg.columns, 12);
        assert!(cfg.subdivisions);
        assert_eq!(cfg.zones.len(), 3);
        assert_eq!(cfg.zones[1], Zone::new(0.25, 0.75));
    }

    #[test]
    fn validate_rejects_bad_configs() {
        let mut cfg = GridConfig::default();
        assert!(cfg.validate().is_ok());

        cfg.columns = 0;
        assert_eq!(cfg.validate(), Err(GridConfigError::Columns(0)));

        cfg = GridConfig {
            zones: vec![Zone::new(0.6, 0.4)],
            ..GridConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(GridConfigError::Zone { index: 0, .. })));
    }

    #[test]
    fn empty_config_json_uses_defaults() {
        let cfg: GridConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, GridConfig::default());
    }

    #[test]
    fn lerp_interpolates_each_field() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(100.0, 50.0, 300.0, 100.0);
        assert_eq!(a.lerp(&b, 0.5), Rect::new(50.0, 25.0, 200.0, 100.0));
    }
}
