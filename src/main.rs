//! Entry point for the **zonetile** daemon.
//!
//! Spawns all configured [`CommandSource`](zonetile::traits::CommandSource)s
//! on background threads and processes incoming commands on the main thread.
//! While window transitions are running the loop also wakes up every
//! animation frame to advance them.

use zonetile::animator::TICK_INTERVAL;
use zonetile::command::Command;
use zonetile::config::Config;
use zonetile::engine::Engine;
use zonetile::hyprland::wm::HyprlandWindowSystem;
use zonetile::ipc::listener::UnixSocketListener;
use zonetile::storage::JsonFile;
use zonetile::traits::{CommandSource, LayoutEvent};
use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Instant;

/// Default socket path for the command listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/zonetile.sock", runtime)
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/zonetile`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("zonetile")
}

/// Try to load the config from `$XDG_CONFIG_HOME/zonetile/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();
    let dir = config_dir();
    if let Err(e) = std::fs::create_dir_all(&dir) {
        error!("cannot create {}: {}", dir.display(), e);
    }

    let mut engine = Engine::new(
        HyprlandWindowSystem::new(),
        JsonFile::new(dir.join("layers.json")),
        JsonFile::new(dir.join("profiles.json")),
        &config,
    );
    if let Err(e) = engine.start() {
        error!("failed to start: {}", e);
        std::process::exit(1);
    }

    let (event_tx, event_rx) = mpsc::channel::<LayoutEvent>();
    engine.set_event_sink(event_tx);
    std::thread::spawn(move || {
        for event in event_rx {
            debug!("event: {:?}", event);
        }
    });

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    let socket = config.socket_path.clone().unwrap_or_else(default_socket_path);
    spawn_command_sources(cmd_tx, socket);

    info!("zonetile running");
    loop {
        // Only wake up per frame while a transition is running.
        let received = if engine.is_idle() {
            cmd_rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
        } else {
            cmd_rx.recv_timeout(TICK_INTERVAL)
        };
        match received {
            Ok(cmd) => {
                if let Err(e) = engine.handle(cmd) {
                    error!("command error: {}", e);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        engine.tick(Instant::now());
    }
    info!("all command sources closed, exiting");
    engine.shutdown();
}

//  Helpers

fn spawn_command_sources(tx: mpsc::Sender<Command>, socket: String) {
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&socket);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}
