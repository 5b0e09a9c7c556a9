//! **zonetile**: a grid and zone based window layout engine.
//!
//! Every monitor is divided into a `columns × rows` grid and, on wide
//! screens, into a few vertical zones.  Windows snap to cells or zones, can
//! be pinned in place, and are redistributed horizontally around the pinned
//! ones.  Named *layers* store a full arrangement per monitor and can be
//! switched at will; *profiles* remember the grid per monitor setup, and
//! *temporary layouts* let an arrangement be edited transactionally before
//! it is committed.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::WindowSystem`]: abstracts window enumeration and movement
//!   so the layout logic is not coupled to any specific compositor.
//! * [`traits::CommandSource`]: abstracts the transport that delivers
//!   user intent (a Unix socket, a test harness, …) so the main loop is not
//!   coupled to any specific IPC mechanism.
//!
//! [`engine::Engine`] ties the managers together.  Concrete
//! implementations live in [`hyprland`] (Hyprland IPC) and [`ipc`]
//! (Unix-socket command listener).

pub mod animator;
pub mod command;
pub mod config;
pub mod easing;
pub mod engine;
pub mod geometry;
pub mod grid;
pub mod hyprland;
pub mod ipc;
pub mod layer;
pub mod layer_manager;
pub mod monitor;
pub mod profiles;
pub mod storage;
pub mod temp_layout;
pub mod traits;
pub mod window;

#[cfg(test)]
mod testing;
