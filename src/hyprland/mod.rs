//! Hyprland-specific implementations.
//!
//! This module provides the concrete
//! [`WindowSystem`](crate::traits::WindowSystem) backend, powered by
//! Hyprland's IPC socket.
//!
//! Nothing outside this module should reference Hyprland directly.

pub mod process;
pub mod wm;
