//! A named window arrangement for one monitor.

use crate::geometry::GridConfig;
use crate::window::{WindowHandle, WindowPatch, WindowRef};
use serde::{Deserialize, Serialize};

/// A named set of window placements plus the grid used to make them.
///
/// Window rectangles are relative to the monitor's work area so a layer
/// survives the monitor moving on the virtual desktop.  Window order is
/// preserved; it decides matching priority when the layer is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub monitor_id: String,
    #[serde(default)]
    pub windows: Vec<WindowRef>,
    #[serde(default)]
    pub grid_config: GridConfig,
}

impl Layer {
    pub fn new(name: impl Into<String>, monitor_id: impl Into<String>, grid_config: GridConfig) -> Self {
        Self {
            name: name.into(),
            monitor_id: monitor_id.into(),
            windows: Vec::new(),
            grid_config,
        }
    }

    /// Name of the layer synthesized for a monitor that has none.
    pub fn default_name(monitor_id: &str) -> String {
        format!("Default-{}", monitor_id)
    }

    /// Update the entry with the same handle in place, or append.
    pub fn add_window(&mut self, window: WindowRef) {
        match self.window_mut(window.handle) {
            Some(existing) => *existing = window,
            None => self.windows.push(window),
        }
    }

    pub fn remove_window(&mut self, handle: WindowHandle) -> Option<WindowRef> {
        let index = self.windows.iter().position(|w| w.handle == handle)?;
        Some(self.windows.remove(index))
    }

    pub fn window(&self, handle: WindowHandle) -> Option<&WindowRef> {
        self.windows.iter().find(|w| w.handle == handle)
    }

    pub fn window_mut(&mut self, handle: WindowHandle) -> Option<&mut WindowRef> {
        self.windows.iter_mut().find(|w| w.handle == handle)
    }

    pub fn contains(&self, handle: WindowHandle) -> bool {
        self.window(handle).is_some()
    }

    /// Apply `patch` to the entry for `handle`.  Returns `false` if the
    /// layer does not track it.
    pub fn update_window(&mut self, handle: WindowHandle, patch: &WindowPatch) -> bool {
        match self.window_mut(handle) {
            Some(w) => {
                w.apply(patch);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn window(id: u64, title: &str) -> WindowRef {
        WindowRef::new(WindowHandle(id), title, "kitty", Rect::new(0.0, 0.0, 100.0, 100.0))
    }

    #[test]
    fn add_window_upserts_by_handle() {
        let mut layer = Layer::new("Work", "DP-1", GridConfig::default());
        layer.add_window(window(1, "a"));
        layer.add_window(window(2, "b"));
        layer.add_window(window(1, "renamed"));
        assert_eq!(layer.windows.len(), 2);
        assert_eq!(layer.windows[0].title, "renamed");
        assert_eq!(layer.windows[1].handle, WindowHandle(2));
    }

    #[test]
    fn remove_and_update_report_missing_handles() {
        let mut layer = Layer::new("Work", "DP-1", GridConfig::default());
        layer.add_window(window(1, "a"));
        assert!(!layer.update_window(WindowHandle(7), &WindowPatch::pinned(true)));
        assert!(layer.update_window(WindowHandle(1), &WindowPatch::pinned(true)));
        assert!(layer.window(WindowHandle(1)).is_some_and(|w| w.is_pinned));
        assert!(layer.remove_window(WindowHandle(7)).is_none());
        assert!(layer.remove_window(WindowHandle(1)).is_some());
        assert!(layer.windows.is_empty());
    }

    #[test]
    fn default_name_includes_monitor() {
        assert_eq!(Layer::default_name("HDMI-A-1"), "Default-HDMI-A-1");
    }

    #[test]
    fn layer_json_tolerates_missing_fields() {
        let layer: Layer = serde_json::from_str(r#"{"name":"x","monitor_id":"DP-1"}"#).unwrap();
        assert!(layer.windows.is_empty());
        assert_eq!(layer.grid_config, GridConfig::default());
    }
}
