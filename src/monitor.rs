//! Monitors as enumerated by the window system and as cached by the
//! managers.

use crate::geometry::{GridConfig, GridDefaults, Point, Rect, ULTRAWIDE_ASPECT_RATIO};
use serde::{Deserialize, Serialize};

/// Raw information about a connected monitor, as reported by a
/// [`WindowSystem`](crate::traits::WindowSystem).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorInfo {
    /// Stable identifier (e.g. `"DP-1"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Usable area in screen-global coordinates (panels and bars excluded).
    pub work_area: Rect,
    pub is_primary: bool,
}

/// A monitor together with the grid configuration used on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monitor {
    pub id: String,
    pub name: String,
    pub work_area: Rect,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub is_ultrawide: bool,
    #[serde(default)]
    pub grid_config: GridConfig,
}

impl Monitor {
    /// Build a monitor with a grid configuration synthesized from its
    /// aspect ratio.
    pub fn from_info(info: &MonitorInfo, defaults: &GridDefaults) -> Self {
        Self::with_grid(info, GridConfig::for_work_area(&info.work_area, defaults))
    }

    pub fn with_grid(info: &MonitorInfo, grid_config: GridConfig) -> Self {
        Self {
            id: info.id.clone(),
            name: info.name.clone(),
            work_area: info.work_area,
            is_primary: info.is_primary,
            is_ultrawide: info.work_area.aspect_ratio() > ULTRAWIDE_ASPECT_RATIO,
            grid_config,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.work_area.aspect_ratio()
    }

    /// The work area with its origin moved to `(0, 0)`.
    pub fn local_area(&self) -> Rect {
        Rect::new(0.0, 0.0, self.work_area.width, self.work_area.height)
    }

    /// Convert a screen-global rectangle to monitor-relative coordinates.
    pub fn to_local(&self, rect: &Rect) -> Rect {
        rect.translate(-self.work_area.x, -self.work_area.y)
    }

    /// Convert a monitor-relative rectangle to screen-global coordinates.
    pub fn to_screen(&self, rect: &Rect) -> Rect {
        rect.translate(self.work_area.x, self.work_area.y)
    }

    pub fn contains(&self, p: Point) -> bool {
        self.work_area.contains_point(p)
    }
}
