//! The command vocabulary of the daemon.
//!
//! [`Command`] describes every action the [`Engine`](crate::engine::Engine)
//! can perform.  Commands arrive as JSON (see
//! [`listener`](crate::ipc::listener)); the enum is externally tagged, so
//! unit variants are plain strings and the rest are single-key objects.
//! Zone and layout indices accept either a number or a numeric string, and
//! justify types are parsed leniently ("space-between", "SpaceBetween").

use crate::grid::JustifyType;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A 0-based index that accepts `2` or `"2"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Index(pub usize);

impl<'de> Deserialize<'de> for Index {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = Index;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "non-negative integer or string")
            }
            fn visit_u64<E>(self, n: u64) -> Result<Index, E> {
                Ok(Index(n as usize))
            }
            fn visit_str<E>(self, s: &str) -> Result<Index, E>
            where
                E: DeError,
            {
                let n: usize = s
                    .trim()
                    .parse()
                    .map_err(|_| DeError::custom("expected a non-negative integer"))?;
                Ok(Index(n))
            }
        }
        deserializer.deserialize_any(V)
    }
}

fn default_true() -> bool {
    true
}

/// Every action the daemon can perform.
///
/// "Focused" always means the window the window system reports as active;
/// its monitor is the one under the window's center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Snap the focused window to the grid of its monitor and record the
    /// new position in the active layer (or the open edit session).
    SnapFocused {
        #[serde(default)]
        subdivisions: bool,
    },

    /// Stretch the focused window across the zone under its center.
    SnapFocusedToZone,

    /// Move the focused window into zone `n` of its monitor.
    MoveFocusedToZone(Index),

    /// Redistribute the unpinned windows of the active layer on the focused
    /// monitor.
    Justify(JustifyType),

    /// Pin or unpin the focused window.  Pinned windows keep their place
    /// during justification and are never moved when a layer is applied.
    TogglePin,

    /// Make `name` the active layer.  `monitor` defaults to the layer's own
    /// monitor.
    ApplyLayer {
        name: String,
        #[serde(default)]
        monitor: Option<String>,
        #[serde(default = "default_true")]
        animate: bool,
    },

    /// Cycle to the next layer of the focused monitor.
    NextLayer,

    /// Create an empty layer on `monitor` (default: the focused monitor).
    CreateLayer {
        name: String,
        #[serde(default)]
        monitor: Option<String>,
    },
    DeleteLayer(String),
    RenameLayer { from: String, to: String },

    /// Record every visible window on the focused monitor into its active
    /// layer.
    CaptureLayout,

    /// Persist all layers.
    Save,

    /// Drop unsaved layer changes and re-apply the stored active layers.
    DiscardChanges,

    ActivateProfile(String),
    /// Snapshot the current monitors as a new profile.
    CreateProfile(String),
    DeleteProfile(String),
    RenameProfile { from: String, to: String },

    /// Arrange the focused monitor's unpinned windows using preset `n` of
    /// its suggested layouts.
    ApplySuggestedLayout(Index),

    /// Open an edit session on the focused monitor's active layer.  Window
    /// changes go to the session until it is committed or discarded.
    BeginEdit,
    CommitEdit,
    DiscardEdit,
    /// Undo every change of the edit session but keep it open.
    RevertEdit,

    /// Re-enumerate monitors.
    RefreshMonitors,
}
