//! Window identity and the snapshot of a window stored in layers.

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque native window identity.
///
/// Unique per live window but **not** stable across application restarts,
/// which is why stored layers re-match windows by process name and title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl FromStr for WindowHandle {
    type Err = std::num::ParseIntError;

    /// Accepts `0x`-prefixed hex (as compositors print addresses) or
    /// plain decimal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).map(WindowHandle),
            None => s.parse().map(WindowHandle),
        }
    }
}

/// Show state of a native window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
}

/// A window as seen by the layout engine.
///
/// Enumerated windows carry screen-global rectangles; once stored in a
/// [`Layer`](crate::layer::Layer) the rectangle is relative to the layer's
/// monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRef {
    pub handle: WindowHandle,
    pub title: String,
    pub process_name: String,
    pub rect: Rect,
    #[serde(default)]
    pub is_pinned: bool,
}

impl WindowRef {
    pub fn new(
        handle: WindowHandle,
        title: impl Into<String>,
        process_name: impl Into<String>,
        rect: Rect,
    ) -> Self {
        Self {
            handle,
            title: title.into(),
            process_name: process_name.into(),
            rect,
            is_pinned: false,
        }
    }

    /// Same process and same title.  Handles are deliberately ignored.
    pub fn matches(&self, other: &WindowRef) -> bool {
        self.process_name == other.process_name && self.title == other.title
    }

    /// Apply every field set in `patch`.
    pub fn apply(&mut self, patch: &WindowPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(process_name) = &patch.process_name {
            self.process_name = process_name.clone();
        }
        if let Some(rect) = patch.rect {
            self.rect = rect;
        }
        if let Some(is_pinned) = patch.is_pinned {
            self.is_pinned = is_pinned;
        }
    }
}

/// A partial update of a [`WindowRef`]; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowPatch {
    pub title: Option<String>,
    pub process_name: Option<String>,
    pub rect: Option<Rect>,
    pub is_pinned: Option<bool>,
}

impl WindowPatch {
    pub fn rect(rect: Rect) -> Self {
        Self {
            rect: Some(rect),
            ..Self::default()
        }
    }

    pub fn pinned(is_pinned: bool) -> Self {
        Self {
            is_pinned: Some(is_pinned),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.process_name.is_none()
            && self.rect.is_none()
            && self.is_pinned.is_none()
    }

    /// Fold `other` into `self`; later values win.
    pub fn merge(&mut self, other: &WindowPatch) {
        if other.title.is_some() {
            self.title.clone_from(&other.title);
        }
        if other.process_name.is_some() {
            self.process_name.clone_from(&other.process_name);
        }
        if other.rect.is_some() {
            self.rect = other.rect;
        }
        if other.is_pinned.is_some() {
            self.is_pinned = other.is_pinned;
        }
    }
}
