//! Ownership of all layers, the active layer per monitor, persistence, and
//! applying a layer to the real windows on screen.
//!
//! # Invariant
//!
//! After [`LayerManager::load`] and after every mutation, each monitor the
//! manager knows about has at least one layer and exactly one active layer
//! that belongs to it.

use crate::animator::WindowAnimator;
use crate::geometry::{GridConfig, GridConfigError, GridDefaults, Point, Rect};
use crate::layer::Layer;
use crate::monitor::{Monitor, MonitorInfo};
use crate::storage::{Storage, StorageError};
use crate::traits::{notify, LayoutEvent, WindowSystem};
use crate::window::{WindowHandle, WindowRef, WindowState};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc;
use std::time::Instant;

/// On-disk representation of every layer plus the active-layer map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerFile {
    /// `monitor_id -> layer name`
    pub active_layers: BTreeMap<String, String>,
    pub layers: Vec<Layer>,
}

/// Errors from layer operations.  Every variant leaves the manager
/// unchanged.
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    #[error("unknown layer: {0}")]
    UnknownLayer(String),
    #[error("unknown monitor: {0}")]
    UnknownMonitor(String),
    #[error("layer {layer} belongs to monitor {actual}, not {requested}")]
    WrongMonitor {
        layer: String,
        requested: String,
        actual: String,
    },
    #[error("a layer named {0:?} already exists")]
    DuplicateName(String),
    #[error("layer name must not be empty")]
    EmptyName,
    #[error("cannot delete {0}: it is the last layer on its monitor")]
    LastLayer(String),
    #[error("window {0} no longer exists")]
    WindowGone(WindowHandle),
    #[error("invalid grid: {0}")]
    InvalidGrid(#[from] GridConfigError),
    #[error("window system error: {0}")]
    WindowSystem(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// What [`LayerManager::apply_layer`] did, window by window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Visible windows minimized because the layer does not contain them.
    pub minimized: usize,
    /// Windows moved into place immediately.
    pub positioned: usize,
    /// Windows handed to the animator.
    pub animated: usize,
    /// Layer entries with no matching live window.
    pub unmatched: usize,
    /// Native calls that failed.
    pub failed: usize,
}

/// Owns every [`Layer`] and decides which one is active on each monitor.
pub struct LayerManager<S> {
    storage: S,
    defaults: GridDefaults,
    monitors: BTreeMap<String, Monitor>,
    layers: BTreeMap<String, Layer>,
    /// `monitor_id -> layer name`
    active: BTreeMap<String, String>,
    /// Names with unsaved changes, deleted layers included.
    modified: BTreeSet<String>,
    events: Option<mpsc::Sender<LayoutEvent>>,
}

impl<S: Storage<LayerFile>> LayerManager<S> {
    /// Create an empty manager.  Call [`refresh_monitors`](Self::refresh_monitors)
    /// and [`load`](Self::load) before use.
    pub fn new(storage: S, defaults: GridDefaults) -> Self {
        Self {
            storage,
            defaults,
            monitors: BTreeMap::new(),
            layers: BTreeMap::new(),
            active: BTreeMap::new(),
            modified: BTreeSet::new(),
            events: None,
        }
    }

    pub fn set_event_sink(&mut self, tx: mpsc::Sender<LayoutEvent>) {
        self.events = Some(tx);
    }

    //  Monitors

    /// Replace the monitor cache and make sure every monitor has a layer.
    pub fn refresh_monitors(&mut self, infos: &[MonitorInfo]) {
        self.monitors = infos
            .iter()
            .map(|info| (info.id.clone(), Monitor::from_info(info, &self.defaults)))
            .collect();
        debug!("layer manager knows {} monitor(s)", self.monitors.len());
        self.ensure_invariants();
    }

    /// Override the grid used for layers created on `monitor_id` from now
    /// on, e.g. from the active monitor profile.  Existing layers keep
    /// their own grid.
    pub fn set_monitor_grid(&mut self, monitor_id: &str, config: GridConfig) -> bool {
        match self.monitors.get_mut(monitor_id) {
            Some(monitor) => {
                monitor.grid_config = config;
                true
            }
            None => false,
        }
    }

    pub fn monitor(&self, monitor_id: &str) -> Option<&Monitor> {
        self.monitors.get(monitor_id)
    }

    pub fn monitors(&self) -> impl Iterator<Item = &Monitor> {
        self.monitors.values()
    }

    pub fn primary_monitor(&self) -> Option<&Monitor> {
        self.monitors
            .values()
            .find(|m| m.is_primary)
            .or_else(|| self.monitors.values().next())
    }

    /// The monitor whose work area contains `p`.
    pub fn monitor_at(&self, p: Point) -> Option<&Monitor> {
        self.monitors.values().find(|m| m.contains(p))
    }

    //  Persistence

    /// Read layers from storage.
    ///
    /// Never fails: an unreadable or missing file starts from scratch, and
    /// default layers are synthesized for monitors that have none.
    pub fn load(&mut self) {
        let file = match self.storage.load() {
            Ok(Some(file)) => file,
            Ok(None) => {
                info!("no saved layers, starting with defaults");
                LayerFile::default()
            }
            Err(e) => {
                warn!("failed to load layers ({}), starting with defaults", e);
                LayerFile::default()
            }
        };

        self.layers.clear();
        for layer in file.layers {
            if self.layers.contains_key(&layer.name) {
                warn!("duplicate layer {:?} in saved state, keeping the first", layer.name);
                continue;
            }
            self.layers.insert(layer.name.clone(), layer);
        }
        self.active = file.active_layers;
        self.modified.clear();
        self.ensure_invariants();
        info!("loaded {} layer(s)", self.layers.len());
    }

    /// Write every layer and the active map.  Clears the modified set on
    /// success; on failure nothing changes.
    pub fn save(&mut self) -> Result<(), LayerError> {
        let file = LayerFile {
            active_layers: self.active.clone(),
            layers: self.layers.values().cloned().collect(),
        };
        self.storage.save(&file)?;
        self.modified.clear();
        info!("saved {} layer(s)", file.layers.len());
        notify(&self.events, LayoutEvent::UnsavedChanges(false));
        Ok(())
    }

    /// Drop unsaved changes by reloading from storage.
    pub fn discard_changes(&mut self) {
        self.load();
        for (monitor_id, layer) in &self.active {
            notify(
                &self.events,
                LayoutEvent::LayerChanged {
                    monitor_id: monitor_id.clone(),
                    layer: layer.clone(),
                },
            );
        }
        notify(&self.events, LayoutEvent::UnsavedChanges(false));
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.modified.is_empty()
    }

    pub fn modified_layers(&self) -> impl Iterator<Item = &str> {
        self.modified.iter().map(String::as_str)
    }

    //  Queries

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    /// Layers on `monitor_id`, ordered by name.
    pub fn layers_for_monitor<'a>(&'a self, monitor_id: &'a str) -> impl Iterator<Item = &'a Layer> + 'a {
        self.layers.values().filter(move |l| l.monitor_id == monitor_id)
    }

    pub fn active_layer_name(&self, monitor_id: &str) -> Option<&str> {
        self.active.get(monitor_id).map(String::as_str)
    }

    pub fn active_layer(&self, monitor_id: &str) -> Option<&Layer> {
        self.active.get(monitor_id).and_then(|name| self.layers.get(name))
    }

    /// Grid configuration of the active layer on `monitor_id`.
    pub fn grid_config_for(&self, monitor_id: &str) -> Option<&GridConfig> {
        self.active_layer(monitor_id).map(|l| &l.grid_config)
    }

    /// The layer after the active one on `monitor_id`, wrapping around.
    pub fn next_layer_name(&self, monitor_id: &str) -> Option<String> {
        let names: Vec<&str> = self
            .layers_for_monitor(monitor_id)
            .map(|l| l.name.as_str())
            .collect();
        let current = self.active_layer_name(monitor_id)?;
        let index = names.iter().position(|n| *n == current)?;
        names.get((index + 1) % names.len()).map(|n| n.to_string())
    }

    //  Applying

    /// Make `name` the visible arrangement on `monitor_id`.
    ///
    /// Windows are matched to layer entries by handle and process first,
    /// then by process name and title in enumeration order.  Visible
    /// windows on the monitor that match nothing (and are not pinned in the
    /// layer) are minimized first; matched, unpinned entries are then
    /// restored and moved, directly or through `animator`.  Individual
    /// window failures are counted in the report and never abort the rest.
    pub fn apply_layer<W: WindowSystem>(
        &mut self,
        wm: &W,
        animator: &mut WindowAnimator,
        name: &str,
        monitor_id: &str,
        animate: bool,
        now: Instant,
    ) -> Result<ApplyReport, LayerError> {
        let layer = self
            .layers
            .get(name)
            .ok_or_else(|| LayerError::UnknownLayer(name.to_string()))?;
        let monitor = self
            .monitors
            .get(monitor_id)
            .ok_or_else(|| LayerError::UnknownMonitor(monitor_id.to_string()))?;
        if layer.monitor_id != monitor_id {
            return Err(LayerError::WrongMonitor {
                layer: name.to_string(),
                requested: monitor_id.to_string(),
                actual: layer.monitor_id.clone(),
            });
        }

        let live = wm
            .windows()
            .map_err(|e| LayerError::WindowSystem(e.to_string()))?;
        let candidates: Vec<Candidate> = live
            .into_iter()
            .filter_map(|window| {
                let state = wm.window_state(window.handle)?;
                let on_monitor = monitor.contains(window.rect.center());
                (on_monitor || state == WindowState::Minimized).then_some(Candidate {
                    window,
                    state,
                    on_monitor,
                })
            })
            .collect();

        let assignment = match_windows(&layer.windows, &candidates);
        let mut claimed = vec![false; candidates.len()];
        for ci in assignment.iter().flatten() {
            claimed[*ci] = true;
        }

        let mut report = ApplyReport::default();

        // Pass 1: get everything that does not belong out of the way.
        for (ci, c) in candidates.iter().enumerate() {
            if claimed[ci] || !c.on_monitor || c.state == WindowState::Minimized {
                continue;
            }
            if layer.window(c.window.handle).is_some_and(|w| w.is_pinned) {
                continue;
            }
            animator.stop(c.window.handle);
            if wm.set_state(c.window.handle, WindowState::Minimized) {
                report.minimized += 1;
            } else {
                report.failed += 1;
            }
        }

        // Pass 2: restore and position the layer's windows.
        let mut batch = Vec::new();
        for (entry, ci) in layer.windows.iter().zip(&assignment) {
            let Some(ci) = ci else {
                report.unmatched += 1;
                continue;
            };
            if entry.is_pinned {
                continue;
            }
            let c = &candidates[*ci];
            if c.state == WindowState::Minimized && !wm.set_state(c.window.handle, WindowState::Normal) {
                report.failed += 1;
                continue;
            }
            let target = monitor.to_screen(&entry.rect);
            if animate {
                batch.push((c.window.handle, target));
                continue;
            }
            // A job from an earlier animated apply must not keep moving it.
            animator.stop(c.window.handle);
            if wm.set_rect(c.window.handle, &target) {
                report.positioned += 1;
            } else {
                report.failed += 1;
            }
        }
        if !batch.is_empty() {
            let started = animator.animate_many(wm, &batch, None, true, now);
            report.animated += started;
            report.failed += batch.len() - started;
        }

        // Relaunched applications get new handles; remember the live ones so
        // later updates by handle find their entries.
        let rebinds: Vec<(usize, WindowHandle)> = assignment
            .iter()
            .enumerate()
            .filter_map(|(ei, ci)| ci.map(|ci| (ei, candidates[ci].window.handle)))
            .collect();
        if let Some(layer) = self.layers.get_mut(name) {
            for (ei, handle) in rebinds {
                layer.windows[ei].handle = handle;
            }
        }

        self.active.insert(monitor_id.to_string(), name.to_string());
        info!("applied layer {} on {}: {:?}", name, monitor_id, report);
        notify(
            &self.events,
            LayoutEvent::LayerChanged {
                monitor_id: monitor_id.to_string(),
                layer: name.to_string(),
            },
        );
        Ok(report)
    }

    //  Window bookkeeping

    /// Record that `handle` now sits at the screen-global `screen_rect`.
    ///
    /// The window is stored monitor-relative in the active layer of
    /// `monitor_id` (or of the monitor under the rectangle's center),
    /// replacing an existing entry with the same handle.  `is_pinned` of
    /// `None` keeps the current pin state.
    pub fn update_window<W: WindowSystem>(
        &mut self,
        wm: &W,
        handle: WindowHandle,
        screen_rect: Rect,
        monitor_id: Option<&str>,
        is_pinned: Option<bool>,
    ) -> Result<(), LayerError> {
        let live = wm
            .window(handle)
            .map_err(|e| LayerError::WindowSystem(e.to_string()))?
            .ok_or(LayerError::WindowGone(handle))?;

        let monitor = match monitor_id {
            Some(id) => self
                .monitors
                .get(id)
                .ok_or_else(|| LayerError::UnknownMonitor(id.to_string()))?,
            None => self
                .monitor_at(screen_rect.center())
                .ok_or_else(|| LayerError::UnknownMonitor(format!("at {:?}", screen_rect.center())))?,
        };
        let monitor_id = monitor.id.clone();
        let local = monitor.to_local(&screen_rect);
        let name = self
            .active
            .get(&monitor_id)
            .cloned()
            .ok_or_else(|| LayerError::UnknownMonitor(monitor_id.clone()))?;

        // A window belongs to one monitor; forget it in other active layers.
        let elsewhere: Vec<String> = self
            .active
            .iter()
            .filter(|(m, _)| **m != monitor_id)
            .map(|(_, l)| l.clone())
            .collect();
        for other in elsewhere {
            let removed = self
                .layers
                .get_mut(&other)
                .and_then(|l| l.remove_window(handle))
                .is_some();
            if removed {
                self.mark_modified(&other);
            }
        }

        let layer = self
            .layers
            .get_mut(&name)
            .ok_or_else(|| LayerError::UnknownLayer(name.clone()))?;
        let is_pinned = is_pinned
            .or_else(|| layer.window(handle).map(|w| w.is_pinned))
            .unwrap_or(false);
        layer.add_window(WindowRef {
            handle,
            title: live.title,
            process_name: live.process_name,
            rect: local,
            is_pinned,
        });
        debug!("layer {}: {} at {:?}", name, handle, local);
        self.mark_modified(&name);
        Ok(())
    }

    /// Flip the pin flag of `handle` in whichever active layer tracks it.
    /// Returns the new state, or `None` if no active layer has the window.
    pub fn toggle_window_pin(&mut self, handle: WindowHandle) -> Option<bool> {
        let name = self
            .active
            .values()
            .find(|name| self.layers.get(*name).is_some_and(|l| l.contains(handle)))?
            .clone();
        let window = self.layers.get_mut(&name)?.window_mut(handle)?;
        window.is_pinned = !window.is_pinned;
        let pinned = window.is_pinned;
        self.mark_modified(&name);
        Some(pinned)
    }

    //  CRUD

    /// Create an empty layer on `monitor_id` using the monitor's grid.
    pub fn create_layer(&mut self, name: &str, monitor_id: &str) -> Result<(), LayerError> {
        let name = self.check_new_name(name)?;
        let monitor = self
            .monitors
            .get(monitor_id)
            .ok_or_else(|| LayerError::UnknownMonitor(monitor_id.to_string()))?;
        let layer = Layer::new(name.clone(), monitor_id, monitor.grid_config.clone());
        self.layers.insert(name.clone(), layer);
        info!("created layer {} on {}", name, monitor_id);
        self.mark_modified(&name);
        Ok(())
    }

    /// Delete `name`.  The last layer of a monitor cannot be deleted; if
    /// `name` was active, the next layer on the same monitor takes over.
    pub fn delete_layer(&mut self, name: &str) -> Result<(), LayerError> {
        let monitor_id = self
            .layers
            .get(name)
            .map(|l| l.monitor_id.clone())
            .ok_or_else(|| LayerError::UnknownLayer(name.to_string()))?;
        if self.layers_for_monitor(&monitor_id).count() < 2 {
            return Err(LayerError::LastLayer(name.to_string()));
        }
        self.layers.remove(name);
        info!("deleted layer {}", name);

        if self.active.get(&monitor_id).map(String::as_str) == Some(name) {
            let next = self.layers_for_monitor(&monitor_id).next().map(|l| l.name.clone());
            if let Some(next) = next {
                self.active.insert(monitor_id.clone(), next.clone());
                notify(
                    &self.events,
                    LayoutEvent::LayerChanged {
                        monitor_id,
                        layer: next,
                    },
                );
            }
        }
        self.mark_modified(name);
        Ok(())
    }

    /// Rename a layer, repointing the active map and the modified set.
    pub fn rename_layer(&mut self, old: &str, new: &str) -> Result<(), LayerError> {
        if !self.layers.contains_key(old) {
            return Err(LayerError::UnknownLayer(old.to_string()));
        }
        if old == new.trim() {
            return Ok(());
        }
        let new = self.check_new_name(new)?;
        let Some(mut layer) = self.layers.remove(old) else {
            return Err(LayerError::UnknownLayer(old.to_string()));
        };
        layer.name = new.clone();
        self.layers.insert(new.clone(), layer);

        for active in self.active.values_mut() {
            if active == old {
                *active = new.clone();
            }
        }
        self.modified.insert(old.to_string());
        info!("renamed layer {} to {}", old, new);
        self.mark_modified(&new);
        Ok(())
    }

    /// Insert or replace a whole layer, e.g. one committed from a temporary
    /// edit session.  A replaced layer must stay on its monitor.
    pub fn store_layer(&mut self, layer: Layer) -> Result<(), LayerError> {
        if let Some(existing) = self.layers.get(&layer.name) {
            if existing.monitor_id != layer.monitor_id {
                return Err(LayerError::WrongMonitor {
                    layer: layer.name.clone(),
                    requested: layer.monitor_id.clone(),
                    actual: existing.monitor_id.clone(),
                });
            }
        }
        layer.grid_config.validate()?;
        let name = layer.name.clone();
        self.layers.insert(name.clone(), layer);
        self.mark_modified(&name);
        self.ensure_invariants();
        Ok(())
    }

    pub fn set_grid_config(&mut self, name: &str, config: GridConfig) -> Result<(), LayerError> {
        config.validate()?;
        let layer = self
            .layers
            .get_mut(name)
            .ok_or_else(|| LayerError::UnknownLayer(name.to_string()))?;
        layer.grid_config = config;
        self.mark_modified(name);
        Ok(())
    }

    //  Internals

    fn check_new_name(&self, name: &str) -> Result<String, LayerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LayerError::EmptyName);
        }
        if self.layers.contains_key(name) {
            return Err(LayerError::DuplicateName(name.to_string()));
        }
        Ok(name.to_string())
    }

    fn mark_modified(&mut self, name: &str) {
        self.modified.insert(name.to_string());
        if self.layers.contains_key(name) {
            notify(
                &self.events,
                LayoutEvent::LayerUpdated {
                    layer: name.to_string(),
                },
            );
        }
        notify(&self.events, LayoutEvent::UnsavedChanges(true));
    }

    /// Give every known monitor a layer and a valid active assignment.
    fn ensure_invariants(&mut self) {
        for (monitor_id, monitor) in &self.monitors {
            if !self.layers.values().any(|l| &l.monitor_id == monitor_id) {
                let base = Layer::default_name(monitor_id);
                let mut name = base.clone();
                let mut n = 2;
                while self.layers.contains_key(&name) {
                    name = format!("{} ({})", base, n);
                    n += 1;
                }
                debug!("synthesizing layer {} for {}", name, monitor_id);
                self.layers.insert(
                    name.clone(),
                    Layer::new(name, monitor_id.clone(), monitor.grid_config.clone()),
                );
            }

            let valid = self
                .active
                .get(monitor_id)
                .and_then(|name| self.layers.get(name))
                .is_some_and(|l| &l.monitor_id == monitor_id);
            if !valid {
                let first = self
                    .layers
                    .values()
                    .find(|l| &l.monitor_id == monitor_id)
                    .map(|l| l.name.clone());
                if let Some(first) = first {
                    debug!("active layer on {} is now {}", monitor_id, first);
                    self.active.insert(monitor_id.clone(), first);
                }
            }
        }
    }
}

/// A live window considered by [`LayerManager::apply_layer`].
struct Candidate {
    window: WindowRef,
    state: WindowState,
    on_monitor: bool,
}

/// For each layer entry, the index of the candidate it is bound to.
///
/// Same handle and process wins; otherwise the first unclaimed candidate
/// with the same process name and title, in enumeration order.
fn match_windows(entries: &[WindowRef], candidates: &[Candidate]) -> Vec<Option<usize>> {
    let mut claimed = vec![false; candidates.len()];
    let mut assignment = vec![None; entries.len()];

    for (ei, entry) in entries.iter().enumerate() {
        let found = candidates.iter().position(|c| {
            c.window.handle == entry.handle && c.window.process_name == entry.process_name
        });
        if let Some(ci) = found {
            if !claimed[ci] {
                claimed[ci] = true;
                assignment[ei] = Some(ci);
            }
        }
    }

    for (ei, entry) in entries.iter().enumerate() {
        if assignment[ei].is_some() {
            continue;
        }
        let found = candidates
            .iter()
            .enumerate()
            .position(|(ci, c)| !claimed[ci] && entry.matches(&c.window));
        if let Some(ci) = found {
            claimed[ci] = true;
            assignment[ei] = Some(ci);
        }
    }
    assignment
}
