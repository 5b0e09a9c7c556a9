//! Transactional edit sessions over a [`Layer`].
//!
//! A session keeps the layer as it was (`original`) next to the working
//! copy (`modified`) and tracks which handles were added, removed or
//! patched.  Nothing touches the source layer until the caller commits and
//! stores the result.

use crate::geometry::{GridConfig, GridConfigError};
use crate::layer::Layer;
use crate::traits::{notify, LayoutEvent};
use crate::window::{WindowHandle, WindowPatch, WindowRef};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::mpsc;

/// Identifies one edit session.  Ids are never reused by a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempLayoutId(pub u64);

impl fmt::Display for TempLayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "temp-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TempLayoutError {
    #[error("no edit session {0}")]
    UnknownSession(TempLayoutId),
    #[error("window {0} is not part of the layout")]
    UnknownWindow(WindowHandle),
    #[error("invalid grid: {0}")]
    InvalidGrid(#[from] GridConfigError),
}

/// One edit to a temporary layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutChange {
    /// Add a window, or replace the entry with the same handle.
    AddWindow(WindowRef),
    RemoveWindow(WindowHandle),
    /// Patch some properties of an existing entry.
    UpdateWindow { handle: WindowHandle, patch: WindowPatch },
    GridConfig(GridConfig),
}

/// A read-only summary of what a session changed, for previews.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutDiff {
    pub added: Vec<WindowRef>,
    pub removed: Vec<WindowRef>,
    pub modified: Vec<(WindowHandle, WindowPatch)>,
    /// The new grid, if it differs from the original.
    pub grid_config: Option<GridConfig>,
}

impl LayoutDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && self.grid_config.is_none()
    }
}

/// An open edit session.
#[derive(Debug, Clone, PartialEq)]
pub struct TempLayout {
    pub id: TempLayoutId,
    pub layer_name: String,
    pub monitor_id: String,
    pub original_windows: Vec<WindowRef>,
    pub modified_windows: Vec<WindowRef>,
    pub original_grid: GridConfig,
    pub grid_config: GridConfig,
    pub added: BTreeSet<WindowHandle>,
    pub removed: BTreeSet<WindowHandle>,
    /// Accumulated property changes per handle.
    pub modified: BTreeMap<WindowHandle, WindowPatch>,
}

impl TempLayout {
    fn new(id: TempLayoutId, layer: &Layer) -> Self {
        Self {
            id,
            layer_name: layer.name.clone(),
            monitor_id: layer.monitor_id.clone(),
            original_windows: layer.windows.clone(),
            modified_windows: layer.windows.clone(),
            original_grid: layer.grid_config.clone(),
            grid_config: layer.grid_config.clone(),
            added: BTreeSet::new(),
            removed: BTreeSet::new(),
            modified: BTreeMap::new(),
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
            || !self.removed.is_empty()
            || !self.modified.is_empty()
            || self.grid_config != self.original_grid
    }

    pub fn window(&self, handle: WindowHandle) -> Option<&WindowRef> {
        self.modified_windows.iter().find(|w| w.handle == handle)
    }

    /// The working copy as a layer with the source layer's name.
    pub fn to_layer(&self) -> Layer {
        Layer {
            name: self.layer_name.clone(),
            monitor_id: self.monitor_id.clone(),
            windows: self.modified_windows.clone(),
            grid_config: self.grid_config.clone(),
        }
    }

    pub fn diff(&self) -> LayoutDiff {
        let pick = |windows: &[WindowRef], handles: &BTreeSet<WindowHandle>| -> Vec<WindowRef> {
            windows
                .iter()
                .filter(|w| handles.contains(&w.handle))
                .cloned()
                .collect()
        };
        LayoutDiff {
            added: pick(&self.modified_windows, &self.added),
            removed: pick(&self.original_windows, &self.removed),
            modified: self
                .modified
                .iter()
                .map(|(h, p)| (*h, p.clone()))
                .collect(),
            grid_config: (self.grid_config != self.original_grid).then(|| self.grid_config.clone()),
        }
    }

    fn revert(&mut self) {
        self.modified_windows = self.original_windows.clone();
        self.grid_config = self.original_grid.clone();
        self.added.clear();
        self.removed.clear();
        self.modified.clear();
    }

    fn apply(&mut self, change: LayoutChange) -> Result<(), TempLayoutError> {
        match change {
            LayoutChange::AddWindow(window) => {
                let handle = window.handle;
                if let Some(existing) = self.modified_windows.iter_mut().find(|w| w.handle == handle) {
                    let patch = full_patch(&window);
                    *existing = window;
                    if !self.added.contains(&handle) {
                        self.modified.entry(handle).or_default().merge(&patch);
                    }
                } else if self.original_windows.iter().any(|w| w.handle == handle) {
                    // Removed earlier in this session and now back.
                    self.removed.remove(&handle);
                    self.modified.insert(handle, full_patch(&window));
                    self.modified_windows.push(window);
                } else {
                    self.added.insert(handle);
                    self.modified_windows.push(window);
                }
            }
            LayoutChange::RemoveWindow(handle) => {
                let index = self
                    .modified_windows
                    .iter()
                    .position(|w| w.handle == handle)
                    .ok_or(TempLayoutError::UnknownWindow(handle))?;
                self.modified_windows.remove(index);
                self.modified.remove(&handle);
                if !self.added.remove(&handle) {
                    self.removed.insert(handle);
                }
            }
            LayoutChange::UpdateWindow { handle, patch } => {
                let window = self
                    .modified_windows
                    .iter_mut()
                    .find(|w| w.handle == handle)
                    .ok_or(TempLayoutError::UnknownWindow(handle))?;
                window.apply(&patch);
                if !self.added.contains(&handle) {
                    self.modified.entry(handle).or_default().merge(&patch);
                }
            }
            LayoutChange::GridConfig(config) => {
                config.validate()?;
                self.grid_config = config;
            }
        }
        Ok(())
    }
}

fn full_patch(window: &WindowRef) -> WindowPatch {
    WindowPatch {
        title: Some(window.title.clone()),
        process_name: Some(window.process_name.clone()),
        rect: Some(window.rect),
        is_pinned: Some(window.is_pinned),
    }
}

/// Owns every open [`TempLayout`].
#[derive(Default)]
pub struct TempLayoutManager {
    sessions: BTreeMap<TempLayoutId, TempLayout>,
    next_id: u64,
    events: Option<mpsc::Sender<LayoutEvent>>,
}

impl TempLayoutManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_event_sink(&mut self, tx: mpsc::Sender<LayoutEvent>) {
        self.events = Some(tx);
    }

    /// Open a session on an independent copy of `layer`.
    pub fn create_temp_layout(&mut self, layer: &Layer) -> TempLayoutId {
        self.next_id += 1;
        let id = TempLayoutId(self.next_id);
        self.sessions.insert(id, TempLayout::new(id, layer));
        debug!("{}: editing layer {}", id, layer.name);
        notify(&self.events, LayoutEvent::TempLayoutCreated(id));
        id
    }

    pub fn get(&self, id: TempLayoutId) -> Option<&TempLayout> {
        self.sessions.get(&id)
    }

    /// Apply `changes` in order.  Either all of them take effect or, on the
    /// first error, none do.
    pub fn apply_changes(
        &mut self,
        id: TempLayoutId,
        changes: impl IntoIterator<Item = LayoutChange>,
    ) -> Result<(), TempLayoutError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(TempLayoutError::UnknownSession(id))?;
        let mut scratch = session.clone();
        for change in changes {
            scratch.apply(change)?;
        }
        *session = scratch;
        notify(&self.events, LayoutEvent::TempLayoutModified(id));
        Ok(())
    }

    pub fn has_changes(&self, id: TempLayoutId) -> bool {
        self.sessions.get(&id).is_some_and(TempLayout::has_changes)
    }

    /// Preview of the session's changes.
    pub fn changes(&self, id: TempLayoutId) -> Option<LayoutDiff> {
        self.sessions.get(&id).map(TempLayout::diff)
    }

    /// Sessions with pending changes.
    pub fn modified_ids(&self) -> Vec<TempLayoutId> {
        self.sessions
            .values()
            .filter(|s| s.has_changes())
            .map(|s| s.id)
            .collect()
    }

    /// End the session and hand back the edited layer.
    pub fn commit(&mut self, id: TempLayoutId) -> Option<Layer> {
        let session = self.sessions.remove(&id)?;
        debug!("{}: committed", id);
        notify(&self.events, LayoutEvent::TempLayoutCommitted(id));
        Some(session.to_layer())
    }

    /// End the session without producing anything.
    pub fn discard(&mut self, id: TempLayoutId) -> bool {
        if self.sessions.remove(&id).is_none() {
            return false;
        }
        debug!("{}: discarded", id);
        notify(&self.events, LayoutEvent::TempLayoutDiscarded(id));
        true
    }

    /// Reset the working copy to the original; the session stays open.
    pub fn revert(&mut self, id: TempLayoutId) -> bool {
        let Some(session) = self.sessions.get_mut(&id) else {
            return false;
        };
        session.revert();
        notify(&self.events, LayoutEvent::TempLayoutModified(id));
        true
    }

    /// Discard every open session.  Returns how many there were.
    pub fn cleanup(&mut self) -> usize {
        let ids: Vec<TempLayoutId> = self.sessions.keys().copied().collect();
        for id in &ids {
            self.discard(*id);
        }
        ids.len()
    }
}
