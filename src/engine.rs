//! The orchestrator that ties the window system, the layout managers and
//! the animator together.
//!
//! [`Engine`] owns one [`GridSystem`] per monitor plus every manager, and
//! reacts to [`Command`]s by computing target rectangles, moving windows and
//! recording the result in the active layer (or in the open edit session).

use crate::animator::WindowAnimator;
use crate::command::{Command, Index};
use crate::config::{AnimationConfig, Config};
use crate::geometry::Rect;
use crate::grid::{GridSystem, JustifyType};
use crate::layer_manager::{ApplyReport, LayerError, LayerFile, LayerManager};
use crate::monitor::Monitor;
use crate::profiles::{ProfileError, ProfileFile, ProfileManager};
use crate::storage::Storage;
use crate::temp_layout::{LayoutChange, TempLayoutError, TempLayoutId, TempLayoutManager};
use crate::traits::{LayoutEvent, WindowSystem};
use crate::window::{WindowHandle, WindowPatch, WindowRef, WindowState};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::mpsc;
use std::time::Instant;

/// Possible errors from the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The window system returned an error.
    #[error("window system error: {0}")]
    WindowSystem(String),
    #[error(transparent)]
    Layer(#[from] LayerError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    TempLayout(#[from] TempLayoutError),
    #[error("no focused window")]
    NoFocusedWindow,
    #[error("no monitor")]
    NoMonitor,
    #[error("no zone {0} on this monitor")]
    NoSuchZone(usize),
    #[error("no suggested layout {0}")]
    NoSuchLayout(usize),
    #[error("no edit session is open")]
    NoEditSession,
    #[error("an edit session is already open")]
    EditInProgress,
}

/// The open edit session and the monitor whose active layer it wraps.
#[derive(Debug, Clone)]
struct EditSession {
    id: TempLayoutId,
    monitor_id: String,
}

/// Orchestrates layout commands for any [`WindowSystem`].
///
/// # Typical usage
///
/// ```ignore
/// let wm = HyprlandWindowSystem::new();
/// let mut engine = Engine::new(wm, JsonFile::new(layers), JsonFile::new(profiles), &config);
/// engine.start()?;
/// engine.handle(Command::SnapFocused { subdivisions: false })?;
/// engine.tick(Instant::now());
/// ```
pub struct Engine<W: WindowSystem, LS, PS> {
    wm: W,
    layers: LayerManager<LS>,
    profiles: ProfileManager<PS>,
    temp: TempLayoutManager,
    animator: WindowAnimator,
    grids: BTreeMap<String, GridSystem>,
    animation: AnimationConfig,
    edit: Option<EditSession>,
}

impl<W, LS, PS> Engine<W, LS, PS>
where
    W: WindowSystem,
    LS: Storage<LayerFile>,
    PS: Storage<ProfileFile>,
{
    pub fn new(wm: W, layer_storage: LS, profile_storage: PS, config: &Config) -> Self {
        let mut animator = WindowAnimator::new();
        animator.set_easing(config.animation.easing);
        animator.set_default_duration(config.animation.duration());
        animator.set_stagger(config.animation.stagger());

        Self {
            wm,
            layers: LayerManager::new(layer_storage, config.grid.clone()),
            profiles: ProfileManager::new(profile_storage, config.grid.clone()),
            temp: TempLayoutManager::new(),
            animator,
            grids: BTreeMap::new(),
            animation: config.animation.clone(),
            edit: None,
        }
    }

    /// Forward change notifications of every component to `tx`.
    pub fn set_event_sink(&mut self, tx: mpsc::Sender<LayoutEvent>) {
        self.layers.set_event_sink(tx.clone());
        self.profiles.set_event_sink(tx.clone());
        self.temp.set_event_sink(tx.clone());
        self.animator.set_event_sink(tx);
    }

    /// Enumerate monitors and load layers and profiles.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let infos = self
            .wm
            .monitors()
            .map_err(|e| EngineError::WindowSystem(e.to_string()))?;
        info!("found {} monitor(s)", infos.len());
        self.profiles.load(&infos);
        self.layers.refresh_monitors(&infos);
        self.apply_profile_grids();
        self.layers.load();
        self.sync_grids();
        Ok(())
    }

    pub fn wm(&self) -> &W {
        &self.wm
    }

    pub fn layers(&self) -> &LayerManager<LS> {
        &self.layers
    }

    pub fn profiles(&self) -> &ProfileManager<PS> {
        &self.profiles
    }

    pub fn temp_layouts(&self) -> &TempLayoutManager {
        &self.temp
    }

    pub fn animator(&self) -> &WindowAnimator {
        &self.animator
    }

    pub fn grid(&self, monitor_id: &str) -> Option<&GridSystem> {
        self.grids.get(monitor_id)
    }

    /// The open edit session, if any.
    pub fn edit_session(&self) -> Option<TempLayoutId> {
        self.edit.as_ref().map(|e| e.id)
    }

    /// Advance running window transitions.
    pub fn tick(&mut self, now: Instant) -> Vec<WindowHandle> {
        self.animator.tick(&self.wm, now)
    }

    /// No window transition is running, so nothing needs a tick.
    pub fn is_idle(&self) -> bool {
        self.animator.is_idle()
    }

    /// Leave windows where they are and drop open edit sessions.  Layers
    /// are not saved.
    pub fn shutdown(&mut self) {
        self.animator.stop_all();
        let unsaved = self.temp.modified_ids();
        if !unsaved.is_empty() {
            warn!("dropping {} edit session(s) with uncommitted changes", unsaved.len());
        }
        let dropped = self.temp.cleanup();
        self.edit = None;
        info!("shut down, {} edit session(s) closed", dropped);
    }

    /// Process a single [`Command`].
    pub fn handle(&mut self, cmd: Command) -> Result<(), EngineError> {
        match cmd {
            Command::SnapFocused { subdivisions } => {
                let (window, monitor) = self.focused()?;
                let local = monitor.to_local(&window.rect);
                let grid = self.grid_mut(&monitor.id)?;
                let target = grid.snap_to_grid(&local, subdivisions);
                info!("snap {} to {:?}", window.handle, target);
                self.place(&monitor, window.handle, target)?;
            }

            Command::SnapFocusedToZone => {
                let (window, monitor) = self.focused()?;
                let local = monitor.to_local(&window.rect);
                let grid = self.grid_mut(&monitor.id)?;
                let target = grid.snap_to_zone(&local, local.center());
                info!("snap {} to zone {:?}", window.handle, target);
                self.place(&monitor, window.handle, target)?;
            }

            Command::MoveFocusedToZone(Index(index)) => {
                let (window, monitor) = self.focused()?;
                let local = monitor.to_local(&window.rect);
                let zone = self
                    .grid_mut(&monitor.id)?
                    .geometry()
                    .zone_rect(index)
                    .ok_or(EngineError::NoSuchZone(index))?;
                let target = Rect::new(zone.x, local.y, zone.width, local.height);
                info!("move {} to zone {}", window.handle, index);
                self.place(&monitor, window.handle, target)?;
            }

            Command::Justify(justify) => {
                let monitor = self.focused_monitor()?;
                self.justify(&monitor, justify)?;
            }

            Command::TogglePin => {
                let (window, monitor) = self.focused()?;
                self.toggle_pin(&monitor, &window)?;
            }

            Command::ApplyLayer {
                name,
                monitor,
                animate,
            } => {
                self.ensure_not_editing()?;
                let monitor_id = match monitor {
                    Some(id) => id,
                    None => self
                        .layers
                        .layer(&name)
                        .map(|l| l.monitor_id.clone())
                        .ok_or_else(|| LayerError::UnknownLayer(name.clone()))?,
                };
                self.apply_layer(&name, &monitor_id, animate)?;
            }

            Command::NextLayer => {
                self.ensure_not_editing()?;
                let monitor = self.focused_monitor()?;
                match self.layers.next_layer_name(&monitor.id) {
                    Some(name) => {
                        self.apply_layer(&name, &monitor.id, true)?;
                    }
                    None => debug!("no other layer on {}", monitor.id),
                }
            }

            Command::CreateLayer { name, monitor } => {
                let monitor_id = match monitor {
                    Some(id) => id,
                    None => self.focused_monitor()?.id,
                };
                self.layers.create_layer(&name, &monitor_id)?;
            }

            Command::DeleteLayer(name) => {
                self.ensure_not_editing()?;
                let monitor_id = self
                    .layers
                    .layer(&name)
                    .map(|l| l.monitor_id.clone())
                    .ok_or_else(|| LayerError::UnknownLayer(name.clone()))?;
                let was_active = self.layers.active_layer_name(&monitor_id) == Some(name.as_str());
                self.layers.delete_layer(&name)?;
                if was_active {
                    if let Some(next) = self.layers.active_layer_name(&monitor_id).map(String::from) {
                        self.apply_layer(&next, &monitor_id, true)?;
                    }
                }
            }

            Command::RenameLayer { from, to } => {
                self.ensure_not_editing()?;
                self.layers.rename_layer(&from, &to)?;
            }

            Command::CaptureLayout => {
                let monitor = self.focused_monitor()?;
                self.capture(&monitor)?;
            }

            Command::Save => {
                self.layers.save()?;
            }

            Command::DiscardChanges => {
                self.ensure_not_editing()?;
                self.layers.discard_changes();
                self.sync_grids();
                let active: Vec<(String, String)> = self
                    .layers
                    .monitors()
                    .filter_map(|m| {
                        self.layers
                            .active_layer_name(&m.id)
                            .map(|l| (l.to_string(), m.id.clone()))
                    })
                    .collect();
                for (name, monitor_id) in active {
                    self.apply_layer(&name, &monitor_id, true)?;
                }
            }

            Command::ActivateProfile(name) => {
                let result = self.profiles.activate_profile(&name);
                // A failed write still switched the profile in memory.
                self.apply_profile_grids();
                result?;
            }

            Command::CreateProfile(name) => {
                let infos = self
                    .wm
                    .monitors()
                    .map_err(|e| EngineError::WindowSystem(e.to_string()))?;
                self.profiles.create_profile(&name, &infos)?;
            }

            Command::DeleteProfile(name) => {
                self.profiles.delete_profile(&name)?;
            }

            Command::RenameProfile { from, to } => {
                self.profiles.rename_profile(&from, &to)?;
            }

            Command::ApplySuggestedLayout(Index(index)) => {
                let monitor = self.focused_monitor()?;
                self.apply_suggested_layout(&monitor, index)?;
            }

            Command::BeginEdit => {
                self.ensure_not_editing()?;
                let monitor = self.focused_monitor()?;
                let layer = self
                    .layers
                    .active_layer(&monitor.id)
                    .ok_or_else(|| LayerError::UnknownMonitor(monitor.id.clone()))?;
                let id = self.temp.create_temp_layout(layer);
                info!("editing layer {} as {}", layer.name, id);
                self.edit = Some(EditSession {
                    id,
                    monitor_id: monitor.id.clone(),
                });
                self.sync_grid(&monitor.id);
            }

            Command::CommitEdit => {
                let edit = self.edit.take().ok_or(EngineError::NoEditSession)?;
                let layer = self.temp.commit(edit.id).ok_or(EngineError::NoEditSession)?;
                info!("committing {} into layer {}", edit.id, layer.name);
                self.layers.store_layer(layer)?;
                self.sync_grid(&edit.monitor_id);
            }

            Command::DiscardEdit => {
                let edit = self.edit.take().ok_or(EngineError::NoEditSession)?;
                self.temp.discard(edit.id);
                info!("discarded {}", edit.id);
                self.restore_active_layer(&edit.monitor_id)?;
            }

            Command::RevertEdit => {
                let edit = self.edit.clone().ok_or(EngineError::NoEditSession)?;
                if !self.temp.revert(edit.id) {
                    return Err(EngineError::NoEditSession);
                }
                info!("reverted {}", edit.id);
                self.restore_active_layer(&edit.monitor_id)?;
            }

            Command::RefreshMonitors => {
                let infos = self
                    .wm
                    .monitors()
                    .map_err(|e| EngineError::WindowSystem(e.to_string()))?;
                self.layers.refresh_monitors(&infos);
                self.apply_profile_grids();
                if let Some(edit) = &self.edit {
                    if self.layers.monitor(&edit.monitor_id).is_none() {
                        warn!("monitor of {} disappeared, discarding the session", edit.id);
                        self.temp.discard(edit.id);
                        self.edit = None;
                    }
                }
                self.sync_grids();
            }
        }
        Ok(())
    }

    //  Lookups

    /// The focused window and the monitor under its center.
    fn focused(&self) -> Result<(WindowRef, Monitor), EngineError> {
        let window = self
            .wm
            .active_window()
            .map_err(|e| EngineError::WindowSystem(e.to_string()))?
            .ok_or(EngineError::NoFocusedWindow)?;
        let monitor = self
            .layers
            .monitor_at(window.rect.center())
            .cloned()
            .ok_or(EngineError::NoMonitor)?;
        Ok((window, monitor))
    }

    /// The focused window's monitor, or the primary one.
    fn focused_monitor(&self) -> Result<Monitor, EngineError> {
        match self.focused() {
            Ok((_, monitor)) => Ok(monitor),
            Err(EngineError::NoFocusedWindow) => self
                .layers
                .primary_monitor()
                .cloned()
                .ok_or(EngineError::NoMonitor),
            Err(e) => Err(e),
        }
    }

    fn grid_mut(&mut self, monitor_id: &str) -> Result<&mut GridSystem, EngineError> {
        self.grids.get_mut(monitor_id).ok_or(EngineError::NoMonitor)
    }

    fn editing(&self, monitor_id: &str) -> Option<TempLayoutId> {
        self.edit
            .as_ref()
            .filter(|e| e.monitor_id == monitor_id)
            .map(|e| e.id)
    }

    fn ensure_not_editing(&self) -> Result<(), EngineError> {
        match self.edit {
            Some(_) => Err(EngineError::EditInProgress),
            None => Ok(()),
        }
    }

    /// Entries of the layout currently shown on `monitor_id`: the edit
    /// session's working copy if there is one, else the active layer.
    fn layout_windows(&self, monitor_id: &str) -> Vec<WindowRef> {
        if let Some(session) = self.editing(monitor_id).and_then(|id| self.temp.get(id)) {
            return session.modified_windows.clone();
        }
        self.layers
            .active_layer(monitor_id)
            .map(|l| l.windows.clone())
            .unwrap_or_default()
    }

    //  Window placement

    /// Move `handle` to the monitor-local `target` and record it.
    fn place(&mut self, monitor: &Monitor, handle: WindowHandle, target: Rect) -> Result<(), EngineError> {
        self.move_window(monitor, handle, target);
        self.record(monitor, handle, target)?;
        if self.grids.get(&monitor.id).is_some_and(|g| g.is_pinned(handle)) {
            self.sync_grid(&monitor.id);
        }
        Ok(())
    }

    fn move_window(&mut self, monitor: &Monitor, handle: WindowHandle, target: Rect) -> bool {
        let screen = monitor.to_screen(&target);
        let ok = if self.animation.enabled {
            self.animator
                .animate(&self.wm, handle, screen, None, Instant::now())
        } else {
            self.animator.stop(handle);
            self.wm.set_rect(handle, &screen)
        };
        if !ok {
            warn!("could not move {}", handle);
        }
        ok
    }

    /// Record that `handle` now lives at the monitor-local `rect`.
    fn record(&mut self, monitor: &Monitor, handle: WindowHandle, rect: Rect) -> Result<(), EngineError> {
        let Some(id) = self.editing(&monitor.id) else {
            self.layers
                .update_window(&self.wm, handle, monitor.to_screen(&rect), Some(&monitor.id), None)?;
            return Ok(());
        };

        let tracked = self
            .temp
            .get(id)
            .is_some_and(|session| session.window(handle).is_some());
        let change = if tracked {
            LayoutChange::UpdateWindow {
                handle,
                patch: WindowPatch::rect(rect),
            }
        } else {
            let live = self
                .wm
                .window(handle)
                .map_err(|e| EngineError::WindowSystem(e.to_string()))?
                .ok_or(LayerError::WindowGone(handle))?;
            LayoutChange::AddWindow(WindowRef::new(handle, live.title, live.process_name, rect))
        };
        self.temp.apply_changes(id, [change])?;
        Ok(())
    }

    fn justify(&mut self, monitor: &Monitor, justify: JustifyType) -> Result<(), EngineError> {
        let windows: Vec<(WindowHandle, Rect)> = self
            .layout_windows(&monitor.id)
            .into_iter()
            .filter(|w| self.wm.window_state(w.handle).is_some_and(|s| s != WindowState::Minimized))
            .map(|w| (w.handle, w.rect))
            .collect();
        let grid = self.grids.get(&monitor.id).ok_or(EngineError::NoMonitor)?;
        let layout = grid.calculate_justified_layout(&windows, justify);
        info!(
            "justify {} on {}: {} of {} window(s) placed",
            justify,
            monitor.id,
            layout.len(),
            windows.len()
        );

        for (handle, current) in windows {
            let Some(target) = layout.get(&handle).copied() else {
                continue;
            };
            if target.approx_eq(&current) {
                continue;
            }
            self.place(monitor, handle, target)?;
        }
        Ok(())
    }

    fn apply_suggested_layout(&mut self, monitor: &Monitor, index: usize) -> Result<(), EngineError> {
        let grid = self.grids.get(&monitor.id).ok_or(EngineError::NoMonitor)?;
        let rects = grid
            .suggested_layouts()
            .into_iter()
            .nth(index)
            .ok_or(EngineError::NoSuchLayout(index))?;
        let windows: Vec<WindowHandle> = self
            .layout_windows(&monitor.id)
            .into_iter()
            .filter(|w| !w.is_pinned && self.wm.is_valid(w.handle))
            .map(|w| w.handle)
            .collect();
        info!(
            "suggested layout {} on {}: {} slot(s), {} window(s)",
            index,
            monitor.id,
            rects.len(),
            windows.len()
        );
        for (handle, target) in windows.into_iter().zip(rects) {
            self.place(monitor, handle, target)?;
        }
        Ok(())
    }

    fn toggle_pin(&mut self, monitor: &Monitor, window: &WindowRef) -> Result<(), EngineError> {
        let pinned = match self.editing(&monitor.id) {
            Some(id) => {
                let current = self
                    .temp
                    .get(id)
                    .and_then(|s| s.window(window.handle))
                    .map(|w| w.is_pinned);
                let change = match current {
                    Some(pinned) => LayoutChange::UpdateWindow {
                        handle: window.handle,
                        patch: WindowPatch::pinned(!pinned),
                    },
                    None => LayoutChange::AddWindow(WindowRef {
                        is_pinned: true,
                        rect: monitor.to_local(&window.rect),
                        ..window.clone()
                    }),
                };
                self.temp.apply_changes(id, [change])?;
                !current.unwrap_or(false)
            }
            None => match self.layers.toggle_window_pin(window.handle) {
                Some(pinned) => pinned,
                None => {
                    self.layers
                        .update_window(&self.wm, window.handle, window.rect, Some(&monitor.id), Some(true))?;
                    true
                }
            },
        };
        info!("{} {}", if pinned { "pinned" } else { "unpinned" }, window.handle);
        self.sync_grid(&monitor.id);
        Ok(())
    }

    /// Record every visible window on `monitor` into its current layout.
    fn capture(&mut self, monitor: &Monitor) -> Result<(), EngineError> {
        let windows = self
            .wm
            .windows()
            .map_err(|e| EngineError::WindowSystem(e.to_string()))?;
        let mut captured = 0;
        for window in windows {
            if !monitor.contains(window.rect.center()) {
                continue;
            }
            if self.wm.window_state(window.handle) != Some(WindowState::Normal) {
                continue;
            }
            match self.record(monitor, window.handle, monitor.to_local(&window.rect)) {
                Ok(()) => captured += 1,
                Err(EngineError::Layer(LayerError::WindowGone(h))) => debug!("{} closed during capture", h),
                Err(e) => return Err(e),
            }
        }
        info!("captured {} window(s) on {}", captured, monitor.id);
        Ok(())
    }

    //  Layers

    fn apply_layer(&mut self, name: &str, monitor_id: &str, animate: bool) -> Result<ApplyReport, EngineError> {
        let report = self.layers.apply_layer(
            &self.wm,
            &mut self.animator,
            name,
            monitor_id,
            animate && self.animation.enabled,
            Instant::now(),
        )?;
        self.sync_grid(monitor_id);
        Ok(report)
    }

    /// Put the windows of `monitor_id` back where its stored active layer
    /// says, e.g. after an edit session was thrown away.
    fn restore_active_layer(&mut self, monitor_id: &str) -> Result<(), EngineError> {
        let Some(name) = self.layers.active_layer_name(monitor_id).map(String::from) else {
            return Err(EngineError::NoMonitor);
        };
        self.apply_layer(&name, monitor_id, true)?;
        Ok(())
    }

    /// Use the active profile's grids for layers created from now on.
    fn apply_profile_grids(&mut self) {
        let Some(profile) = self.profiles.current() else {
            return;
        };
        for (monitor_id, monitor) in &profile.monitors {
            if self.layers.set_monitor_grid(monitor_id, monitor.grid_config.clone()) {
                debug!("profile {}: grid for {} applied", profile.name, monitor_id);
            }
        }
    }

    //  Grids

    /// Rebuild the grid of `monitor_id` from the layout shown there,
    /// including its pinned windows.
    fn sync_grid(&mut self, monitor_id: &str) {
        let Some(monitor) = self.layers.monitor(monitor_id) else {
            self.grids.remove(monitor_id);
            return;
        };
        let config = match self.editing(monitor_id).and_then(|id| self.temp.get(id)) {
            Some(session) => session.grid_config.clone(),
            None => self
                .layers
                .grid_config_for(monitor_id)
                .cloned()
                .unwrap_or_else(|| monitor.grid_config.clone()),
        };
        let mut grid = GridSystem::new(monitor.local_area(), config);
        for window in self.layout_windows(monitor_id).into_iter().filter(|w| w.is_pinned) {
            grid.pin_window(window.handle, window.rect);
        }
        self.grids.insert(monitor_id.to_string(), grid);
    }

    fn sync_grids(&mut self) {
        let ids: Vec<String> = self.layers.monitors().map(|m| m.id.clone()).collect();
        self.grids.retain(|id, _| ids.contains(id));
        for id in ids {
            self.sync_grid(&id);
        }
    }
}
