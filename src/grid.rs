//! Per-monitor grid state: snapping, pinning and justification.
//!
//! A [`GridSystem`] owns one monitor's [`GridConfig`], the set of windows
//! pinned on that monitor and the guide lines of the most recent snap.  All
//! coordinates are in the space of the area it was built with; the engine
//! uses monitor-local areas so pinned rectangles are monitor-relative.

use crate::geometry::{GridConfig, GridGeometry, GridLines, Line, Point, Rect};
use crate::window::WindowHandle;
use log::debug;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const EPSILON: f64 = 1e-6;

/// How unpinned windows are distributed along the horizontal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JustifyType {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

impl JustifyType {
    pub const ALL: [JustifyType; 6] = [
        JustifyType::Start,
        JustifyType::End,
        JustifyType::Center,
        JustifyType::SpaceBetween,
        JustifyType::SpaceAround,
        JustifyType::SpaceEvenly,
    ];
}

impl fmt::Display for JustifyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JustifyType::Start => "start",
            JustifyType::End => "end",
            JustifyType::Center => "center",
            JustifyType::SpaceBetween => "space-between",
            JustifyType::SpaceAround => "space-around",
            JustifyType::SpaceEvenly => "space-evenly",
        };
        f.write_str(s)
    }
}

/// Case-insensitive; accepts "space-between", "space_between",
/// "SpaceBetween", etc.
impl FromStr for JustifyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let squash = |s: &str| -> String {
            s.chars()
                .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
                .flat_map(|c| c.to_lowercase())
                .collect()
        };
        let wanted = squash(s);
        JustifyType::ALL
            .into_iter()
            .find(|j| squash(&j.to_string()) == wanted)
            .ok_or_else(|| format!("invalid justify type: {:?}", s))
    }
}

impl<'de> Deserialize<'de> for JustifyType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(DeError::custom)
    }
}

/// Grid state for a single monitor.
#[derive(Debug, Clone)]
pub struct GridSystem {
    area: Rect,
    config: GridConfig,
    pinned: HashMap<WindowHandle, Rect>,
    snap_guides: Vec<Line>,
}

impl GridSystem {
    pub fn new(area: Rect, config: GridConfig) -> Self {
        Self {
            area,
            config,
            pinned: HashMap::new(),
            snap_guides: Vec::new(),
        }
    }

    //  Accessors

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn geometry(&self) -> GridGeometry<'_> {
        GridGeometry::new(self.area, &self.config)
    }

    /// Replace the grid configuration.  Pinned windows are kept.
    pub fn set_config(&mut self, config: GridConfig) {
        self.config = config;
        self.snap_guides.clear();
    }

    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
        self.snap_guides.clear();
    }

    /// The four lines bracketing the most recent snap result.
    pub fn snap_guides(&self) -> &[Line] {
        &self.snap_guides
    }

    pub fn grid_lines(&self) -> GridLines {
        self.geometry().grid_lines()
    }

    //  Snapping

    /// Round `rect` to whole cells (or subcells) and keep it inside the area.
    ///
    /// Offsets and sizes are divided by the unit size and rounded
    /// half-to-even.  The result is at least one unit in each direction and
    /// at most the whole area.  Subcell units are only used when
    /// `use_subdivisions` is set *and* the grid has subdivisions enabled.
    pub fn snap_to_grid(&mut self, rect: &Rect, use_subdivisions: bool) -> Rect {
        let geo = self.geometry();
        let (uw, uh) = if use_subdivisions && self.config.subdivisions {
            geo.subcell_size()
        } else {
            geo.cell_size()
        };
        let a = self.area;

        if uw <= 0.0 || uh <= 0.0 {
            self.snap_guides.clear();
            return Rect::new(a.x, a.y, 0.0, 0.0);
        }

        let snap = |value: f64, unit: f64| (value / unit).round_ties_even() * unit;

        let width = snap(rect.width, uw).max(uw).min(a.width);
        let height = snap(rect.height, uh).max(uh).min(a.height);
        let x = (a.x + snap(rect.x - a.x, uw)).min(a.right() - width).max(a.x);
        let y = (a.y + snap(rect.y - a.y, uh)).min(a.bottom() - height).max(a.y);

        let snapped = Rect::new(x, y, width, height);
        self.set_snap_guides(&snapped);
        snapped
    }

    /// Give `rect` the horizontal extent of the zone under `point`.
    ///
    /// The vertical extent is kept.  When no zone contains the point the
    /// rectangle is returned unchanged.
    pub fn snap_to_zone(&mut self, rect: &Rect, point: Point) -> Rect {
        if self.area.width <= 0.0 {
            return *rect;
        }
        let geo = self.geometry();
        let fraction = (point.x - self.area.x) / self.area.width;
        let zone = geo.zone_at(fraction).and_then(|i| geo.zone_rect(i));
        match zone {
            Some(zone) => {
                let snapped = Rect::new(zone.x, rect.y, zone.width, rect.height);
                self.set_snap_guides(&snapped);
                snapped
            }
            None => {
                self.snap_guides.clear();
                *rect
            }
        }
    }

    fn set_snap_guides(&mut self, rect: &Rect) {
        let a = self.area;
        self.snap_guides = vec![
            Line::vertical(rect.x, a.y, a.bottom()),
            Line::vertical(rect.right(), a.y, a.bottom()),
            Line::horizontal(rect.y, a.x, a.right()),
            Line::horizontal(rect.bottom(), a.x, a.right()),
        ];
    }

    //  Pinning

    /// Pin `handle` at `rect`.  Returns `false` if it was already pinned.
    pub fn pin_window(&mut self, handle: WindowHandle, rect: Rect) -> bool {
        if self.pinned.contains_key(&handle) {
            return false;
        }
        self.pinned.insert(handle, rect);
        true
    }

    pub fn unpin_window(&mut self, handle: WindowHandle) -> bool {
        self.pinned.remove(&handle).is_some()
    }

    pub fn is_pinned(&self, handle: WindowHandle) -> bool {
        self.pinned.contains_key(&handle)
    }

    pub fn pinned(&self) -> &HashMap<WindowHandle, Rect> {
        &self.pinned
    }

    //  Justification

    /// Horizontal spans of the area not covered by any pinned window.
    ///
    /// Gaps narrower than one cell are not worth placing a window into and
    /// are dropped.
    pub fn free_segments(&self) -> Vec<(f64, f64)> {
        let a = self.area;
        let (cell_w, _) = self.geometry().cell_size();

        let mut spans: Vec<(f64, f64)> = self
            .pinned
            .values()
            .map(|r| (r.x.max(a.x), r.right().min(a.right())))
            .filter(|(l, r)| r > l)
            .collect();
        spans.sort_by(|l, r| l.0.total_cmp(&r.0));

        let mut segments = Vec::new();
        let mut last = a.x;
        for (left, right) in spans {
            if left - last >= cell_w - EPSILON {
                segments.push((last, left));
            }
            last = last.max(right);
        }
        if a.right() - last >= cell_w - EPSILON {
            segments.push((last, a.right()));
        }
        segments
    }

    /// Lay out `windows` horizontally according to `justify`.
    ///
    /// Pinned windows come back at their pinned rectangles.  The others are
    /// placed in the supplied order into the free segments; windows that do
    /// not fit anywhere are left out of the result.  Only `x` changes.
    pub fn calculate_justified_layout(
        &self,
        windows: &[(WindowHandle, Rect)],
        justify: JustifyType,
    ) -> HashMap<WindowHandle, Rect> {
        let mut result = HashMap::new();
        let mut free = Vec::new();
        for (handle, rect) in windows {
            match self.pinned.get(handle) {
                Some(pinned) => {
                    result.insert(*handle, *pinned);
                }
                None => free.push((*handle, *rect)),
            }
        }
        if free.is_empty() {
            return result;
        }

        let segments = self.free_segments();
        if segments.is_empty() {
            debug!("justify: no free space left between pinned windows");
            return result;
        }

        let placed = match justify {
            JustifyType::Start => pack_start(&free, &segments),
            JustifyType::End => pack_end(&free, &segments),
            _ => distribute(&free, &segments, justify).unwrap_or_else(|| {
                debug!("justify {}: falling back to start", justify);
                pack_start(&free, &segments)
            }),
        };
        result.extend(placed);
        result
    }

    //  Presets

    /// Whole-screen partitions offered to the user as presets.
    ///
    /// Zones (ultrawide grids only), then a side/main/side split of
    /// 25/50/25, then every cell column by column.
    pub fn suggested_layouts(&self) -> Vec<Vec<Rect>> {
        let geo = self.geometry();
        let a = self.area;
        let mut layouts = Vec::new();

        if self.config.is_ultrawide() {
            layouts.push(
                (0..self.config.zones.len())
                    .filter_map(|i| geo.zone_rect(i))
                    .collect(),
            );
        }

        let main = a.width * 0.5;
        let side = (a.width - main) / 2.0;
        layouts.push(vec![
            Rect::new(a.x, a.y, side, a.height),
            Rect::new(a.x + side, a.y, main, a.height),
            Rect::new(a.right() - side, a.y, side, a.height),
        ]);

        let mut cells = Vec::new();
        for col in 0..self.config.columns {
            for row in 0..self.config.rows {
                cells.push(geo.cell_rect(col, row));
            }
        }
        layouts.push(cells);

        layouts
    }
}

/// First-fit from the leading edge of each segment.
fn pack_start(windows: &[(WindowHandle, Rect)], segments: &[(f64, f64)]) -> Vec<(WindowHandle, Rect)> {
    let mut placed = Vec::new();
    let mut seg = 0;
    let mut cursor = segments[0].0;

    'windows: for (handle, rect) in windows {
        loop {
            let Some(&(_, end)) = segments.get(seg) else {
                break 'windows;
            };
            if cursor + rect.width <= end + EPSILON {
                placed.push((*handle, Rect { x: cursor, ..*rect }));
                cursor += rect.width;
                break;
            }
            seg += 1;
            if let Some(&(start, _)) = segments.get(seg) {
                cursor = start;
            }
        }
    }
    placed
}

/// Mirror image of [`pack_start`]: walk windows and segments from the right.
fn pack_end(windows: &[(WindowHandle, Rect)], segments: &[(f64, f64)]) -> Vec<(WindowHandle, Rect)> {
    let mut placed = Vec::new();
    let mut seg = segments.len();
    let mut cursor = segments[seg - 1].1;

    'windows: for (handle, rect) in windows.iter().rev() {
        loop {
            let Some(&(start, _)) = seg.checked_sub(1).and_then(|i| segments.get(i)) else {
                break 'windows;
            };
            if cursor - rect.width >= start - EPSILON {
                cursor -= rect.width;
                placed.push((*handle, Rect { x: cursor, ..*rect }));
                break;
            }
            seg -= 1;
            if let Some(&(_, end)) = seg.checked_sub(1).and_then(|i| segments.get(i)) {
                cursor = end;
            }
        }
    }
    placed.reverse();
    placed
}

/// Spread windows over the concatenated free width.
///
/// Returns `None` when the windows do not fit or when a window would land
/// across a pinned window.
fn distribute(
    windows: &[(WindowHandle, Rect)],
    segments: &[(f64, f64)],
    justify: JustifyType,
) -> Option<Vec<(WindowHandle, Rect)>> {
    let n = windows.len() as f64;
    let total: f64 = windows.iter().map(|(_, r)| r.width).sum();
    let free: f64 = segments.iter().map(|(s, e)| e - s).sum();
    if total > free + EPSILON {
        return None;
    }
    let slack = free - total;

    let (lead, gap) = match justify {
        JustifyType::SpaceBetween if windows.len() >= 2 => (0.0, slack / (n - 1.0)),
        JustifyType::SpaceAround => (slack / (2.0 * n), slack / n),
        JustifyType::SpaceEvenly => (slack / (n + 1.0), slack / (n + 1.0)),
        _ => (slack / 2.0, 0.0),
    };

    let mut placed = Vec::with_capacity(windows.len());
    let mut offset = lead;
    for (handle, rect) in windows {
        let x = to_screen_x(segments, offset, rect.width)?;
        placed.push((*handle, Rect { x, ..*rect }));
        offset += rect.width + gap;
    }
    Some(placed)
}

/// Map `[offset, offset + width]` on the concatenated free axis back to an
/// x coordinate, provided it lies within a single segment.
fn to_screen_x(segments: &[(f64, f64)], offset: f64, width: f64) -> Option<f64> {
    let mut consumed = 0.0;
    for (start, end) in segments {
        let len = end - start;
        if offset < consumed + len - EPSILON || (width <= EPSILON && offset <= consumed + len) {
            if offset + width > consumed + len + EPSILON {
                return None;
            }
            return Some(start + (offset - consumed).max(0.0));
        }
        consumed += len;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Zone;

    fn fhd_grid() -> GridSystem {
        GridSystem::new(Rect::new(0.0, 0.0, 1920.0, 1080.0), GridConfig::default())
    }

    fn uw_grid() -> GridSystem {
        GridSystem::new(
            Rect::new(0.0, 0.0, 3440.0, 1440.0),
            GridConfig {
                columns: 12,
                rows: 4,
                subdivisions: true,
                zones: vec![
                    Zone::new(0.0, 0.25),
                    Zone::new(0.25, 0.75),
                    Zone::new(0.75, 1.0),
                ],
            },
        )
    }

    fn win(id: u64, x: f64, width: f64) -> (WindowHandle, Rect) {
        (WindowHandle(id), Rect::new(x, 100.0, width, 500.0))
    }

    fn assert_no_overlap(rects: &[Rect]) {
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    //  Snapping

    #[test]
    fn snap_to_grid_rounds_to_nearest_cell() {
        let mut g = fhd_grid();
        let snapped = g.snap_to_grid(&Rect::new(10.0, 10.0, 300.0, 200.0), false);
        assert_eq!(snapped, Rect::new(0.0, 0.0, 320.0, 270.0));
        assert_eq!(g.snap_guides().len(), 4);
    }

    #[test]
    fn snap_to_grid_uses_half_to_even() {
        let mut g = fhd_grid();
        // 480 / 320 = 1.5 rounds to 2, 800 / 320 = 2.5 rounds to 2.
        let snapped = g.snap_to_grid(&Rect::new(480.0, 0.0, 800.0, 270.0), false);
        assert_eq!(snapped.x, 640.0);
        assert_eq!(snapped.width, 640.0);
    }

    #[test]
    fn snap_to_grid_clamps_inside_area() {
        let mut g = fhd_grid();
        let snapped = g.snap_to_grid(&Rect::new(1800.0, 1000.0, 700.0, 300.0), false);
        assert_eq!(snapped, Rect::new(1280.0, 810.0, 640.0, 270.0));

        let huge = g.snap_to_grid(&Rect::new(-500.0, -500.0, 5000.0, 5000.0), false);
        assert_eq!(huge, Rect::new(0.0, 0.0, 1920.0, 1080.0));
    }

    #[test]
    fn snap_to_grid_subdivisions_only_when_enabled() {
        let mut g = fhd_grid();
        let r = Rect::new(0.0, 0.0, 150.0, 130.0);
        assert_eq!(g.snap_to_grid(&r, true).width, 320.0);

        let mut cfg = GridConfig::default();
        cfg.subdivisions = true;
        g.set_config(cfg);
        let snapped = g.snap_to_grid(&r, true);
        assert_eq!(snapped.width, 160.0);
        assert_eq!(snapped.height, 135.0);
    }

    #[test]
    fn snap_to_grid_always_contained_with_minimum_size() {
        let area = Rect::new(100.0, 50.0, 2560.0, 1440.0);
        let rects = [
            Rect::new(0.0, 0.0, 0.0, 0.0),
            Rect::new(-300.0, 2000.0, 10.0, 10.0),
            Rect::new(2500.0, 1400.0, 900.0, 900.0),
            Rect::new(733.3, 211.7, 1234.5, 678.9),
            Rect::new(100.0, 50.0, 99999.0, 99999.0),
        ];
        for columns in [1, 5, 7, 12, 24] {
            for rows in [1, 3, 4, 16] {
                for subdivisions in [false, true] {
                    let cfg = GridConfig {
                        columns,
                        rows,
                        subdivisions,
                        zones: vec![Zone::new(0.0, 1.0)],
                    };
                    let mut g = GridSystem::new(area, cfg);
                    let (uw, uh) = if subdivisions {
                        g.geometry().subcell_size()
                    } else {
                        g.geometry().cell_size()
                    };
                    for r in &rects {
                        let s = g.snap_to_grid(r, true);
                        assert!(area.contains_rect(&s), "{columns}x{rows}: {:?}", s);
                        assert!(s.width >= uw - 1e-9 && s.height >= uh - 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn snap_to_zone_picks_zone_under_point() {
        let mut g = uw_grid();
        let input = Rect::new(100.0, 200.0, 500.0, 600.0);
        let snapped = g.snap_to_zone(&input, Point::new(2000.0, 10.0));
        assert_eq!(snapped.x, 860.0);
        assert_eq!(snapped.right(), 2580.0);
        assert_eq!(snapped.y, 200.0);
        assert_eq!(snapped.height, 600.0);
    }

    #[test]
    fn snap_to_zone_outside_area_passes_through() {
        let mut g = uw_grid();
        let input = Rect::new(100.0, 200.0, 500.0, 600.0);
        assert_eq!(g.snap_to_zone(&input, Point::new(-50.0, 0.0)), input);
        assert!(g.snap_guides().is_empty());
    }

    //  Pinning

    #[test]
    fn pin_is_idempotent_failure() {
        let mut g = fhd_grid();
        let r = Rect::new(0.0, 0.0, 320.0, 270.0);
        assert!(g.pin_window(WindowHandle(1), r));
        assert!(!g.pin_window(WindowHandle(1), r));
        assert!(g.is_pinned(WindowHandle(1)));
        assert!(g.unpin_window(WindowHandle(1)));
        assert!(!g.unpin_window(WindowHandle(1)));
    }

    //  Justification

    #[test]
    fn space_between_leaves_no_edge_gaps() {
        let g = GridSystem::new(Rect::new(0.0, 0.0, 2400.0, 1080.0), GridConfig::default());
        let windows = [win(1, 50.0, 400.0), win(2, 10.0, 400.0), win(3, 900.0, 400.0)];
        let out = g.calculate_justified_layout(&windows, JustifyType::SpaceBetween);
        assert_eq!(out[&WindowHandle(1)].x, 0.0);
        assert_eq!(out[&WindowHandle(2)].x, 1000.0);
        assert_eq!(out[&WindowHandle(3)].x, 2000.0);
        assert_eq!(out[&WindowHandle(3)].y, 100.0);
    }

    #[test]
    fn space_between_single_window_centers() {
        let g = GridSystem::new(Rect::new(0.0, 0.0, 2400.0, 1080.0), GridConfig::default());
        let out = g.calculate_justified_layout(&[win(1, 0.0, 400.0)], JustifyType::SpaceBetween);
        assert_eq!(out[&WindowHandle(1)].x, 1000.0);
    }

    #[test]
    fn space_around_and_evenly_gaps() {
        let g = GridSystem::new(Rect::new(0.0, 0.0, 2400.0, 1080.0), GridConfig::default());
        let windows = [win(1, 0.0, 400.0), win(2, 0.0, 400.0)];

        let around = g.calculate_justified_layout(&windows, JustifyType::SpaceAround);
        assert_eq!(around[&WindowHandle(1)].x, 400.0);
        assert_eq!(around[&WindowHandle(2)].x, 1600.0);

        let evenly = g.calculate_justified_layout(&windows, JustifyType::SpaceEvenly);
        let unit = 1600.0 / 3.0;
        assert!((evenly[&WindowHandle(1)].x - unit).abs() < 1e-9);
        assert!((evenly[&WindowHandle(2)].x - (2.0 * unit + 400.0)).abs() < 1e-9);
    }

    #[test]
    fn start_and_end_pack_against_edges() {
        let g = fhd_grid();
        let windows = [win(1, 700.0, 400.0), win(2, 100.0, 600.0)];

        let start = g.calculate_justified_layout(&windows, JustifyType::Start);
        assert_eq!(start[&WindowHandle(1)].x, 0.0);
        assert_eq!(start[&WindowHandle(2)].x, 400.0);

        let end = g.calculate_justified_layout(&windows, JustifyType::End);
        assert_eq!(end[&WindowHandle(1)].x, 920.0);
        assert_eq!(end[&WindowHandle(2)].x, 1320.0);
    }

    #[test]
    fn pinned_windows_stay_and_split_free_space() {
        let mut g = fhd_grid();
        let pinned = Rect::new(640.0, 0.0, 640.0, 1080.0);
        g.pin_window(WindowHandle(9), pinned);
        assert_eq!(g.free_segments(), vec![(0.0, 640.0), (1280.0, 1920.0)]);

        let windows = [win(9, 0.0, 100.0), win(1, 0.0, 400.0), win(2, 0.0, 400.0)];
        let out = g.calculate_justified_layout(&windows, JustifyType::Start);
        assert_eq!(out[&WindowHandle(9)], pinned);
        assert_eq!(out[&WindowHandle(1)].x, 0.0);
        // Does not fit the rest of the first segment, so it moves on.
        assert_eq!(out[&WindowHandle(2)].x, 1280.0);
    }

    #[test]
    fn narrow_gaps_are_not_free_space() {
        let mut g = fhd_grid();
        g.pin_window(WindowHandle(1), Rect::new(100.0, 0.0, 1720.0, 1080.0));
        // 100px on each side, narrower than a 320px cell.
        assert!(g.free_segments().is_empty());
        let out = g.calculate_justified_layout(&[win(2, 0.0, 50.0)], JustifyType::Center);
        assert!(out.is_empty());
    }

    #[test]
    fn windows_that_fit_nowhere_are_omitted() {
        let g = fhd_grid();
        let windows = [win(1, 0.0, 1500.0), win(2, 0.0, 1500.0)];
        let out = g.calculate_justified_layout(&windows, JustifyType::Center);
        assert_eq!(out.len(), 1);
        assert_eq!(out[&WindowHandle(1)].x, 0.0);
    }

    #[test]
    fn distribution_across_pinned_window_falls_back_to_start() {
        let mut g = fhd_grid();
        g.pin_window(WindowHandle(9), Rect::new(640.0, 0.0, 640.0, 1080.0));
        // Centered run of 900px would straddle the pinned window.
        let windows = [win(1, 0.0, 300.0), win(2, 0.0, 300.0), win(3, 0.0, 300.0)];
        let out = g.calculate_justified_layout(&windows, JustifyType::Center);
        assert_eq!(out[&WindowHandle(1)].x, 0.0);
        assert_eq!(out[&WindowHandle(2)].x, 300.0);
        assert_eq!(out[&WindowHandle(3)].x, 1280.0);
    }

    #[test]
    fn justified_layout_never_overlaps_when_it_fits() {
        let mut g = fhd_grid();
        g.pin_window(WindowHandle(100), Rect::new(1600.0, 0.0, 320.0, 1080.0));
        let windows = [win(1, 0.0, 300.0), win(2, 0.0, 250.0), win(3, 0.0, 500.0)];
        for justify in JustifyType::ALL {
            let out = g.calculate_justified_layout(&windows, justify);
            assert_eq!(out.len(), 3, "{justify}");
            let mut rects: Vec<Rect> = out.values().copied().collect();
            rects.push(g.pinned()[&WindowHandle(100)]);
            assert_no_overlap(&rects);
            for r in out.values() {
                assert!(g.area().contains_rect(r), "{justify}: {:?}", r);
            }
        }
    }

    #[test]
    fn only_pinned_input_is_returned_unchanged() {
        let mut g = fhd_grid();
        let r = Rect::new(0.0, 0.0, 320.0, 270.0);
        g.pin_window(WindowHandle(1), r);
        let out = g.calculate_justified_layout(&[(WindowHandle(1), r)], JustifyType::End);
        assert_eq!(out.len(), 1);
        assert_eq!(out[&WindowHandle(1)], r);
    }

    #[test]
    fn justify_type_parses_loosely() {
        assert_eq!("space-between".parse::<JustifyType>(), Ok(JustifyType::SpaceBetween));
        assert_eq!("Space_Evenly".parse::<JustifyType>(), Ok(JustifyType::SpaceEvenly));
        assert_eq!("SpaceAround".parse::<JustifyType>(), Ok(JustifyType::SpaceAround));
        assert!("middle".parse::<JustifyType>().is_err());
        let j: JustifyType = serde_json::from_str("\"Center\"").unwrap();
        assert_eq!(j, JustifyType::Center);
        let json = serde_json::to_string(&JustifyType::SpaceAround).unwrap();
        assert_eq!(json, "\"space-around\"");
    }

    //  Presets

    #[test]
    fn suggested_layouts_include_zones_for_ultrawide() {
        let layouts = uw_grid().suggested_layouts();
        assert_eq!(layouts.len(), 3);
        assert_eq!(layouts[0].len(), 3);
        assert_eq!(layouts[1][1], Rect::new(860.0, 0.0, 1720.0, 1440.0));
        assert_eq!(layouts[2].len(), 12 * 4);

        let standard = fhd_grid().suggested_layouts();
        assert_eq!(standard.len(), 2);
        assert_eq!(standard[1][1], Rect::new(0.0, 270.0, 320.0, 270.0));
    }
}
