//! Shared test doubles.

use crate::geometry::Rect;
use crate::monitor::MonitorInfo;
use crate::traits::WindowSystem;
use crate::window::{WindowHandle, WindowRef, WindowState};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
#[error("mock window system error")]
pub struct MockError;

/// A mutation recorded by [`MockWs`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetRect(WindowHandle, Rect),
    SetState(WindowHandle, WindowState),
}

/// Record-keeping mock window system.
///
/// Windows live in enumeration order; `set_rect` and `set_state` update
/// them so later queries observe the effect, the way a compositor would.
#[derive(Debug, Default)]
pub struct MockWs {
    pub monitors: RefCell<Vec<MonitorInfo>>,
    pub windows: RefCell<Vec<(WindowRef, WindowState)>>,
    pub active: Cell<Option<WindowHandle>>,
    pub calls: RefCell<Vec<Call>>,
    pub failing: RefCell<HashSet<WindowHandle>>,
    pub fail_enumeration: Cell<bool>,
}

pub fn monitor(id: &str, x: f64, width: f64, height: f64) -> MonitorInfo {
    MonitorInfo {
        id: id.into(),
        name: id.into(),
        work_area: Rect::new(x, 0.0, width, height),
        is_primary: x == 0.0,
    }
}

impl MockWs {
    pub fn new(monitors: Vec<MonitorInfo>) -> Self {
        Self {
            monitors: RefCell::new(monitors),
            ..Self::default()
        }
    }

    pub fn add_window(&self, id: u64, title: &str, process: &str, rect: Rect) -> WindowHandle {
        let handle = WindowHandle(id);
        self.windows
            .borrow_mut()
            .push((WindowRef::new(handle, title, process, rect), WindowState::Normal));
        handle
    }

    pub fn close(&self, id: u64) {
        self.windows.borrow_mut().retain(|(w, _)| w.handle != WindowHandle(id));
    }

    pub fn focus(&self, id: u64) {
        self.active.set(Some(WindowHandle(id)));
    }

    /// Make `set_rect` fail for this window.
    pub fn fail(&self, id: u64) {
        self.failing.borrow_mut().insert(WindowHandle(id));
    }

    pub fn rect_of(&self, id: u64) -> Option<Rect> {
        self.windows
            .borrow()
            .iter()
            .find(|(w, _)| w.handle == WindowHandle(id))
            .map(|(w, _)| w.rect)
    }

    pub fn state_of(&self, id: u64) -> Option<WindowState> {
        self.window_state(WindowHandle(id))
    }

    pub fn set_state_of(&self, id: u64, state: WindowState) {
        if let Some(entry) = self
            .windows
            .borrow_mut()
            .iter_mut()
            .find(|(w, _)| w.handle == WindowHandle(id))
        {
            entry.1 = state;
        }
    }

    pub fn rect_calls(&self) -> Vec<(WindowHandle, Rect)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::SetRect(h, r) => Some((*h, *r)),
                Call::SetState(..) => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl WindowSystem for MockWs {
    type Error = MockError;

    fn monitors(&self) -> Result<Vec<MonitorInfo>, MockError> {
        if self.fail_enumeration.get() {
            return Err(MockError);
        }
        Ok(self.monitors.borrow().clone())
    }

    fn windows(&self) -> Result<Vec<WindowRef>, MockError> {
        if self.fail_enumeration.get() {
            return Err(MockError);
        }
        Ok(self.windows.borrow().iter().map(|(w, _)| w.clone()).collect())
    }

    fn active_window(&self) -> Result<Option<WindowRef>, MockError> {
        match self.active.get() {
            Some(handle) => self.window(handle),
            None => Ok(None),
        }
    }

    fn set_rect(&self, handle: WindowHandle, rect: &Rect) -> bool {
        if self.failing.borrow().contains(&handle) {
            return false;
        }
        let mut windows = self.windows.borrow_mut();
        match windows.iter_mut().find(|(w, _)| w.handle == handle) {
            Some((w, _)) => {
                w.rect = *rect;
                self.calls.borrow_mut().push(Call::SetRect(handle, *rect));
                true
            }
            None => false,
        }
    }

    fn set_state(&self, handle: WindowHandle, state: WindowState) -> bool {
        let mut windows = self.windows.borrow_mut();
        match windows.iter_mut().find(|(w, _)| w.handle == handle) {
            Some(entry) => {
                entry.1 = state;
                self.calls.borrow_mut().push(Call::SetState(handle, state));
                true
            }
            None => false,
        }
    }

    fn window_state(&self, handle: WindowHandle) -> Option<WindowState> {
        self.windows
            .borrow()
            .iter()
            .find(|(w, _)| w.handle == handle)
            .map(|(_, s)| *s)
    }

    fn is_valid(&self, handle: WindowHandle) -> bool {
        self.windows.borrow().iter().any(|(w, _)| w.handle == handle)
    }
}
