//! [`WindowSystem`] implementation backed by Hyprland IPC.
//!
//! Communicates directly with Hyprland through its Unix socket at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`.
//!
//! Only clients on a workspace some monitor currently shows are reported,
//! plus the minimized ones.  Hyprland has no notion of minimizing, so
//! minimized windows are parked on the special workspace
//! [`MINIMIZED_WORKSPACE`] and restored onto the active workspace of the
//! monitor they were minimized from.  Moving a window onto another monitor
//! also moves it to that monitor's active workspace.  Moving and resizing
//! turns a tiled window floating first, since tiled windows ignore pixel
//! geometry.

use super::process::ProcessNames;
use crate::geometry::{Point, Rect};
use crate::monitor::MonitorInfo;
use crate::traits::WindowSystem;
use crate::window::{WindowHandle, WindowRef, WindowState};
use log::{debug, warn};
use serde::Deserialize;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

/// Special workspace that holds minimized windows.
pub const MINIMIZED_WORKSPACE: &str = "special:minimized";

/// Hyprland-backed window system.
///
/// Every call opens a short-lived IPC request; no child processes are
/// spawned.
#[derive(Default)]
pub struct HyprlandWindowSystem {
    names: ProcessNames,
}

/// Errors that can occur when talking to Hyprland.
#[derive(Debug, thiserror::Error)]
#[error("hyprland IPC error: {0}")]
pub struct HyprlandError(String);

impl HyprlandWindowSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn clients(&self) -> Result<Vec<ClientJson>, HyprlandError> {
        let json = ipc_json("clients")?;
        serde_json::from_str(&json).map_err(|e| HyprlandError(format!("parse clients: {}", e)))
    }

    fn hypr_monitors(&self) -> Result<Vec<MonitorJson>, HyprlandError> {
        let json = ipc_json("monitors")?;
        serde_json::from_str(&json).map_err(|e| HyprlandError(format!("parse monitors: {}", e)))
    }

    fn client(&self, handle: WindowHandle) -> Option<ClientJson> {
        match self.clients() {
            Ok(clients) => clients.into_iter().find(|c| c.handle() == Some(handle)),
            Err(e) => {
                warn!("{}: {}", handle, e);
                None
            }
        }
    }

    fn to_window(&self, client: &ClientJson) -> Option<WindowRef> {
        let handle = client.handle()?;
        let process_name = self.names.get(handle, client.pid, &client.class);
        Some(WindowRef::new(handle, client.title.clone(), process_name, client.rect()))
    }
}

//  Direct Hyprland IPC helpers

/// Resolve the Hyprland command socket path.
fn socket_path() -> Result<PathBuf, HyprlandError> {
    let runtime_dir =
        std::env::var("XDG_RUNTIME_DIR").map_err(|_| HyprlandError("XDG_RUNTIME_DIR not set".into()))?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| HyprlandError("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;
    Ok(PathBuf::from(format!("{}/hypr/{}/.socket.sock", runtime_dir, his)))
}

/// Send a raw request and return the response.
fn ipc_request(request: &str) -> Result<String, HyprlandError> {
    let path = socket_path()?;
    let mut stream = UnixStream::connect(&path)
        .map_err(|e| HyprlandError(format!("connect to {}: {}", path.display(), e)))?;
    stream
        .write_all(request.as_bytes())
        .map_err(|e| HyprlandError(format!("write: {}", e)))?;
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .map_err(|e| HyprlandError(format!("read: {}", e)))?;
    String::from_utf8(response).map_err(|e| HyprlandError(format!("utf-8: {}", e)))
}

fn ipc_json(query: &str) -> Result<String, HyprlandError> {
    ipc_request(&format!("j/{}", query))
}

/// Run several dispatches in one request.  Hyprland answers with one
/// `ok` per dispatch.
fn ipc_batch(dispatches: &[String]) -> Result<(), HyprlandError> {
    let request = format!(
        "[[BATCH]]{}",
        dispatches
            .iter()
            .map(|d| format!("dispatch {}", d))
            .collect::<Vec<_>>()
            .join(";")
    );
    let response = ipc_request(&request)?;
    let failed: Vec<&str> = response
        .split_whitespace()
        .filter(|part| *part != "ok")
        .collect();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(HyprlandError(format!("dispatch error: {}", failed.join(" "))))
    }
}

/// `address:0x…` selector for dispatches.
fn selector(handle: WindowHandle) -> String {
    format!("address:{}", handle)
}

//  Minimal serde structs for the JSON we care about

/// Subset of the JSON object returned by `j/monitors`.
#[derive(Debug, Deserialize)]
struct MonitorJson {
    id: i64,
    name: String,
    #[serde(default)]
    description: String,
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    #[serde(default = "unit_scale")]
    scale: f64,
    /// Space claimed by bars: left, top, right, bottom.
    #[serde(default)]
    reserved: [f64; 4],
    #[serde(default, rename = "activeWorkspace")]
    active_workspace: WorkspaceJson,
    /// Id 0 when no special workspace is open on this monitor.
    #[serde(default, rename = "specialWorkspace")]
    special_workspace: WorkspaceJson,
}

fn unit_scale() -> f64 {
    1.0
}

impl MonitorJson {
    fn scale(&self) -> f64 {
        if self.scale > 0.0 {
            self.scale
        } else {
            1.0
        }
    }

    /// Logical bounds including reserved space.
    fn bounds(&self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.width) / self.scale(),
            f64::from(self.height) / self.scale(),
        )
    }

    /// Logical work area: physical size divided by scale, minus reserved
    /// space.
    fn work_area(&self) -> Rect {
        let [left, top, right, bottom] = self.reserved;
        let b = self.bounds();
        Rect::new(
            b.x + left,
            b.y + top,
            (b.width - left - right).max(0.0),
            (b.height - top - bottom).max(0.0),
        )
    }

    fn shows(&self, workspace: &WorkspaceJson) -> bool {
        workspace.id == self.active_workspace.id
            || (self.special_workspace.id != 0 && workspace.id == self.special_workspace.id)
    }
}

/// Whether `client` is on screen somewhere, or parked as minimized.
fn is_shown(client: &ClientJson, monitors: &[MonitorJson]) -> bool {
    client.mapped
        && (client.workspace.name == MINIMIZED_WORKSPACE || monitors.iter().any(|m| m.shows(&client.workspace)))
}

/// Active workspace of the monitor a minimized `client` came from: the
/// monitor Hyprland reports for it, else the one under its position.
fn restore_workspace(client: &ClientJson, monitors: &[MonitorJson]) -> Option<i64> {
    monitors
        .iter()
        .find(|m| m.id == client.monitor)
        .or_else(|| monitor_under(client.rect().center(), monitors))
        .map(|m| m.active_workspace.id)
}

fn monitor_under(point: Point, monitors: &[MonitorJson]) -> Option<&MonitorJson> {
    monitors.iter().find(|m| m.bounds().contains_point(point))
}

/// Workspace a visible `client` has to move to so that `target` is shown,
/// if it is not already there.
fn workspace_change(client: &ClientJson, target: &Rect, monitors: &[MonitorJson]) -> Option<i64> {
    if client.workspace.name == MINIMIZED_WORKSPACE {
        return None;
    }
    let monitor = monitor_under(target.center(), monitors)?;
    if monitor.shows(&client.workspace) {
        None
    } else {
        Some(monitor.active_workspace.id)
    }
}

#[derive(Debug, Default, Deserialize)]
struct WorkspaceJson {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    name: String,
}

/// Subset of the JSON object returned by `j/clients`.
#[derive(Debug, Deserialize)]
struct ClientJson {
    address: String,
    at: [f64; 2],
    size: [f64; 2],
    #[serde(default)]
    title: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    pid: i64,
    #[serde(default)]
    workspace: WorkspaceJson,
    /// Id of the monitor the client is on, -1 when unknown.
    #[serde(default = "no_monitor")]
    monitor: i64,
    #[serde(default = "unit_mapped")]
    mapped: bool,
    /// A bool on older releases, a mode number on newer ones.
    #[serde(default)]
    fullscreen: serde_json::Value,
}

fn unit_mapped() -> bool {
    true
}

fn no_monitor() -> i64 {
    -1
}

impl ClientJson {
    fn handle(&self) -> Option<WindowHandle> {
        self.address.parse().ok()
    }

    fn rect(&self) -> Rect {
        Rect::new(self.at[0], self.at[1], self.size[0], self.size[1])
    }

    fn state(&self) -> WindowState {
        let fullscreen = match &self.fullscreen {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::Number(n) => n.as_i64().is_some_and(|n| n > 0),
            _ => false,
        };
        if self.workspace.name == MINIMIZED_WORKSPACE {
            WindowState::Minimized
        } else if fullscreen {
            WindowState::Maximized
        } else {
            WindowState::Normal
        }
    }
}

//  WindowSystem implementation

impl WindowSystem for HyprlandWindowSystem {
    type Error = HyprlandError;

    fn monitors(&self) -> Result<Vec<MonitorInfo>, Self::Error> {
        let monitors = self.hypr_monitors()?;
        // Hyprland has no primary monitor; the lowest id is the first one
        // that was connected.
        let primary = monitors.iter().map(|m| m.id).min();
        Ok(monitors
            .iter()
            .map(|m| MonitorInfo {
                id: m.name.clone(),
                name: if m.description.is_empty() {
                    m.name.clone()
                } else {
                    m.description.clone()
                },
                work_area: m.work_area(),
                is_primary: Some(m.id) == primary,
            })
            .collect())
    }

    fn windows(&self) -> Result<Vec<WindowRef>, Self::Error> {
        let monitors = self.hypr_monitors()?;
        Ok(self
            .clients()?
            .iter()
            .filter(|c| is_shown(c, &monitors))
            .filter_map(|c| self.to_window(c))
            .collect())
    }

    fn active_window(&self) -> Result<Option<WindowRef>, Self::Error> {
        let json = ipc_json("activewindow")?;
        // Hyprland returns an empty object `{}` when no window is focused.
        if json.trim() == "{}" {
            return Ok(None);
        }
        let client: ClientJson =
            serde_json::from_str(&json).map_err(|e| HyprlandError(format!("parse activewindow: {}", e)))?;
        Ok(self.to_window(&client))
    }

    fn set_rect(&self, handle: WindowHandle, rect: &Rect) -> bool {
        let Some(client) = self.client(handle) else {
            return false;
        };
        let target = rect.rounded();
        let sel = selector(handle);
        let mut dispatches = Vec::new();
        if client.state() == WindowState::Maximized {
            dispatches.push(format!("fullscreenstate 0 0,{}", sel));
        }
        match self.hypr_monitors() {
            Ok(monitors) => {
                if let Some(workspace) = workspace_change(&client, &target, &monitors) {
                    debug!("{} follows its target onto workspace {}", handle, workspace);
                    dispatches.push(format!("movetoworkspacesilent {},{}", workspace, sel));
                }
            }
            Err(e) => warn!("set_rect {}: {}", handle, e),
        }
        dispatches.push(format!("setfloating {}", sel));
        dispatches.push(format!(
            "resizewindowpixel exact {} {},{}",
            target.width, target.height, sel
        ));
        dispatches.push(format!("movewindowpixel exact {} {},{}", target.x, target.y, sel));
        match ipc_batch(&dispatches) {
            Ok(()) => true,
            Err(e) => {
                warn!("set_rect {}: {}", handle, e);
                false
            }
        }
    }

    fn set_state(&self, handle: WindowHandle, state: WindowState) -> bool {
        let Some(client) = self.client(handle) else {
            return false;
        };
        let current = client.state();
        if current == state {
            return true;
        }
        let sel = selector(handle);
        let mut dispatches = Vec::new();
        if current == WindowState::Minimized {
            let workspace = self
                .hypr_monitors()
                .map_err(|e| warn!("set_state {}: {}", handle, e))
                .ok()
                .and_then(|monitors| restore_workspace(&client, &monitors));
            let Some(workspace) = workspace else {
                return false;
            };
            dispatches.push(format!("movetoworkspacesilent {},{}", workspace, sel));
        }
        match state {
            WindowState::Minimized => {
                dispatches.push(format!("movetoworkspacesilent {},{}", MINIMIZED_WORKSPACE, sel));
            }
            WindowState::Maximized => {
                dispatches.push(format!("focuswindow {}", sel));
                dispatches.push("fullscreen 1".into());
            }
            WindowState::Normal => {
                if current == WindowState::Maximized {
                    dispatches.push(format!("fullscreenstate 0 0,{}", sel));
                }
            }
        }
        debug!("set_state {} {:?} -> {:?}", handle, current, state);
        match ipc_batch(&dispatches) {
            Ok(()) => true,
            Err(e) => {
                warn!("set_state {}: {}", handle, e);
                false
            }
        }
    }

    fn window_state(&self, handle: WindowHandle) -> Option<WindowState> {
        self.client(handle).map(|c| c.state())
    }

    fn is_valid(&self, handle: WindowHandle) -> bool {
        let valid = self.client(handle).is_some_and(|c| c.mapped);
        if !valid {
            self.names.invalidate(handle);
        }
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_work_area_is_logical_minus_reserved() {
        let json = r#"[{
            "id": 1, "name": "DP-2", "description": "Dell U3419W",
            "width": 3440, "height": 1440, "x": 1920, "y": 0,
            "scale": 1.0, "reserved": [0, 40, 0, 0], "focused": true
        }, {
            "id": 0, "name": "eDP-1", "width": 2880, "height": 1800,
            "x": 0, "y": 0, "scale": 2.0
        }]"#;
        let monitors: Vec<MonitorJson> = serde_json::from_str(json).unwrap();
        assert_eq!(monitors[0].work_area(), Rect::new(1920.0, 40.0, 3440.0, 1400.0));
        assert_eq!(monitors[1].work_area(), Rect::new(0.0, 0.0, 1440.0, 900.0));
    }

    #[test]
    fn client_state_from_workspace_and_fullscreen() {
        let json = r#"[
            {"address": "0x5a1", "at": [10, 20], "size": [800, 600], "title": "shell",
             "class": "kitty", "pid": 1, "workspace": {"id": 1, "name": "1"}, "fullscreen": 0},
            {"address": "0x5a2", "at": [0, 0], "size": [10, 10],
             "workspace": {"id": -98, "name": "special:minimized"}, "fullscreen": false},
            {"address": "0x5a3", "at": [0, 0], "size": [10, 10],
             "workspace": {"id": 2, "name": "2"}, "fullscreen": 1}
        ]"#;
        let clients: Vec<ClientJson> = serde_json::from_str(json).unwrap();
        assert_eq!(clients[0].handle(), Some(WindowHandle(0x5a1)));
        assert_eq!(clients[0].rect(), Rect::new(10.0, 20.0, 800.0, 600.0));
        assert_eq!(clients[0].state(), WindowState::Normal);
        assert_eq!(clients[1].state(), WindowState::Minimized);
        assert_eq!(clients[2].state(), WindowState::Maximized);
    }

    fn two_monitors() -> Vec<MonitorJson> {
        let json = r#"[{
            "id": 0, "name": "DP-1", "width": 1920, "height": 1080, "x": 0, "y": 0,
            "activeWorkspace": {"id": 1, "name": "1"},
            "specialWorkspace": {"id": 0, "name": ""}
        }, {
            "id": 1, "name": "DP-2", "width": 3440, "height": 1440, "x": 1920, "y": 0,
            "activeWorkspace": {"id": 4, "name": "4"},
            "specialWorkspace": {"id": -99, "name": "special:scratch"}
        }]"#;
        serde_json::from_str(json).unwrap()
    }

    fn client(workspace: (i64, &str), monitor: i64, at: [f64; 2]) -> ClientJson {
        ClientJson {
            address: "0x5a1".into(),
            at,
            size: [400.0, 300.0],
            title: String::new(),
            class: String::new(),
            pid: 0,
            workspace: WorkspaceJson {
                id: workspace.0,
                name: workspace.1.into(),
            },
            monitor,
            mapped: true,
            fullscreen: serde_json::Value::Null,
        }
    }

    #[test]
    fn only_shown_workspaces_are_enumerated() {
        let monitors = two_monitors();
        assert!(is_shown(&client((1, "1"), 0, [10.0, 10.0]), &monitors));
        assert!(is_shown(&client((4, "4"), 1, [2000.0, 10.0]), &monitors));
        assert!(is_shown(&client((-99, "special:scratch"), 1, [2000.0, 10.0]), &monitors));
        assert!(is_shown(&client((-98, MINIMIZED_WORKSPACE), 0, [10.0, 10.0]), &monitors));
        // Workspace 2 is not shown anywhere.
        assert!(!is_shown(&client((2, "2"), 0, [10.0, 10.0]), &monitors));
        let mut unmapped = client((1, "1"), 0, [10.0, 10.0]);
        unmapped.mapped = false;
        assert!(!is_shown(&unmapped, &monitors));
    }

    #[test]
    fn restore_goes_to_the_monitor_minimized_from() {
        let monitors = two_monitors();
        let parked = client((-98, MINIMIZED_WORKSPACE), 1, [2000.0, 10.0]);
        assert_eq!(restore_workspace(&parked, &monitors), Some(4));
        // Unknown monitor: fall back to the one under the window.
        let parked = client((-98, MINIMIZED_WORKSPACE), -1, [10.0, 10.0]);
        assert_eq!(restore_workspace(&parked, &monitors), Some(1));
        let lost = client((-98, MINIMIZED_WORKSPACE), -1, [9000.0, 10.0]);
        assert_eq!(restore_workspace(&lost, &monitors), None);
    }

    #[test]
    fn moving_across_monitors_changes_workspace() {
        let monitors = two_monitors();
        let window = client((1, "1"), 0, [10.0, 10.0]);
        assert_eq!(workspace_change(&window, &Rect::new(0.0, 0.0, 960.0, 1080.0), &monitors), None);
        assert_eq!(
            workspace_change(&window, &Rect::new(1920.0, 0.0, 1720.0, 1440.0), &monitors),
            Some(4)
        );
        let parked = client((-98, MINIMIZED_WORKSPACE), 0, [10.0, 10.0]);
        assert_eq!(workspace_change(&parked, &Rect::new(1920.0, 0.0, 100.0, 100.0), &monitors), None);
    }

    #[test]
    fn selector_uses_hex_address() {
        assert_eq!(selector(WindowHandle(0x5a1)), "address:0x5a1");
    }
}
