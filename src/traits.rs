//! Core traits that decouple zonetile from any specific compositor or
//! transport mechanism.
//!
//! Every concrete backend (Hyprland, a Unix-socket listener, a test
//! harness, …) implements one of these traits.  The layout managers and the
//! [`Engine`](crate::engine::Engine) only depend on these abstractions.

use crate::command::Command;
use crate::geometry::Rect;
use crate::monitor::MonitorInfo;
use crate::temp_layout::TempLayoutId;
use crate::window::{WindowHandle, WindowRef, WindowState};
use std::sync::mpsc;

/// Abstraction over the native windowing system: enumeration plus the
/// handful of primitives needed to move, resize and minimize windows.
///
/// Enumeration errors are returned as `Self::Error`.  Mutations return
/// `bool` instead, because a window disappearing between enumeration and
/// mutation is routine and callers only ever count such failures.
pub trait WindowSystem {
    /// The error type produced by this backend.
    type Error: std::error::Error + Send + 'static;

    /// Connected monitors with their usable work areas.
    fn monitors(&self) -> Result<Vec<MonitorInfo>, Self::Error>;

    /// Every manageable top-level window, minimized ones included, in a
    /// stable enumeration order.  Rectangles are screen-global.
    fn windows(&self) -> Result<Vec<WindowRef>, Self::Error>;

    /// Look up a single window.
    fn window(&self, handle: WindowHandle) -> Result<Option<WindowRef>, Self::Error> {
        Ok(self.windows()?.into_iter().find(|w| w.handle == handle))
    }

    /// The currently focused window, if any.
    fn active_window(&self) -> Result<Option<WindowRef>, Self::Error>;

    /// Move and resize `handle` to the screen-global `rect`.
    fn set_rect(&self, handle: WindowHandle, rect: &Rect) -> bool;

    fn set_state(&self, handle: WindowHandle, state: WindowState) -> bool;

    /// `None` when the window no longer exists.
    fn window_state(&self, handle: WindowHandle) -> Option<WindowState>;

    /// Whether the window still exists.
    fn is_valid(&self, handle: WindowHandle) -> bool;
}

//  Notifications

/// Change notifications pushed by the managers over an
/// [`mpsc`](std::sync::mpsc) channel.
///
/// Each manager holds an `Option<mpsc::Sender<LayoutEvent>>`; a dropped
/// receiver is ignored.  Listeners (an overlay, a status bar module, a
/// debug logger) requery whatever state they need.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutEvent {
    /// `layer` became the active layer on `monitor_id`.
    LayerChanged { monitor_id: String, layer: String },
    /// The contents of `layer` changed in memory.
    LayerUpdated { layer: String },
    /// Whether any layer has changes that were not saved yet.
    UnsavedChanges(bool),
    /// `profile` became the active monitor profile.
    ProfileChanged { profile: String },
    ProfileUpdated { profile: String },
    TempLayoutCreated(TempLayoutId),
    TempLayoutModified(TempLayoutId),
    TempLayoutCommitted(TempLayoutId),
    TempLayoutDiscarded(TempLayoutId),
    /// A window finished (or abandoned) its transition.
    AnimationCompleted(WindowHandle),
}

/// Send `event` if a sink is attached.
pub(crate) fn notify(sink: &Option<mpsc::Sender<LayoutEvent>>, event: LayoutEvent) {
    if let Some(tx) = sink {
        let _ = tx.send(event);
    }
}

//  Command Source

/// A source of [`Command`]s.
///
/// Implementations listen on some transport (a Unix socket, an in-memory
/// channel, …) and forward parsed commands into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    ///
    /// This method blocks the calling thread.  To run multiple sources
    /// concurrently, spawn each one on its own thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}
