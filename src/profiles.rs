//! Named snapshots of the whole monitor setup, one of which is active.
//!
//! Unlike layers, profiles are written to storage on every mutation.

use crate::geometry::{GridConfig, GridConfigError, GridDefaults};
use crate::monitor::{Monitor, MonitorInfo};
use crate::storage::{Storage, StorageError};
use crate::traits::{notify, LayoutEvent};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::mpsc;

pub const DEFAULT_PROFILE: &str = "Default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorProfile {
    pub name: String,
    #[serde(default)]
    pub monitors: BTreeMap<String, Monitor>,
    #[serde(default)]
    pub is_active: bool,
}

/// On-disk representation of every profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFile {
    pub profiles: Vec<MonitorProfile>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
    #[error("profile {profile} has no monitor {monitor}")]
    UnknownMonitor { profile: String, monitor: String },
    #[error("a profile named {0:?} already exists")]
    DuplicateName(String),
    #[error("profile name must not be empty")]
    EmptyName,
    #[error("cannot delete the active profile {0}")]
    ActiveProfile(String),
    #[error("cannot delete {0}: it is the last profile")]
    LastProfile(String),
    #[error("invalid grid: {0}")]
    InvalidGrid(#[from] GridConfigError),
    /// The change was made in memory but could not be written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct ProfileManager<S> {
    storage: S,
    defaults: GridDefaults,
    profiles: BTreeMap<String, MonitorProfile>,
    current: Option<String>,
    events: Option<mpsc::Sender<LayoutEvent>>,
}

impl<S: Storage<ProfileFile>> ProfileManager<S> {
    pub fn new(storage: S, defaults: GridDefaults) -> Self {
        Self {
            storage,
            defaults,
            profiles: BTreeMap::new(),
            current: None,
            events: None,
        }
    }

    pub fn set_event_sink(&mut self, tx: mpsc::Sender<LayoutEvent>) {
        self.events = Some(tx);
    }

    /// Read profiles from storage, falling back to a single default profile
    /// built from `displays`.  Exactly one profile is active afterwards.
    pub fn load(&mut self, displays: &[MonitorInfo]) {
        let file = match self.storage.load() {
            Ok(Some(file)) => file,
            Ok(None) => ProfileFile::default(),
            Err(e) => {
                warn!("failed to load profiles ({}), using defaults", e);
                ProfileFile::default()
            }
        };

        self.profiles = file
            .profiles
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        self.current = None;

        if self.profiles.is_empty() {
            info!("creating default monitor profile");
            let monitors = self.snapshot(displays, None);
            self.profiles.insert(
                DEFAULT_PROFILE.to_string(),
                MonitorProfile {
                    name: DEFAULT_PROFILE.to_string(),
                    monitors,
                    is_active: true,
                },
            );
            if let Err(e) = self.persist() {
                warn!("failed to save default profile: {}", e);
            }
        }

        // First active profile wins; if none is marked, the first by name.
        let active = self
            .profiles
            .values()
            .find(|p| p.is_active)
            .or_else(|| self.profiles.values().next())
            .map(|p| p.name.clone());
        for profile in self.profiles.values_mut() {
            profile.is_active = Some(&profile.name) == active.as_ref();
        }
        self.current = active;
        debug!(
            "loaded {} profile(s), active: {:?}",
            self.profiles.len(),
            self.current
        );
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&MonitorProfile> {
        self.current.as_ref().and_then(|n| self.profiles.get(n))
    }

    pub fn profile(&self, name: &str) -> Option<&MonitorProfile> {
        self.profiles.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Snapshot `displays` into a new, inactive profile.  Monitors the
    /// active profile already knows keep their name and grid.
    pub fn create_profile(&mut self, name: &str, displays: &[MonitorInfo]) -> Result<(), ProfileError> {
        let name = self.check_new_name(name)?;
        let monitors = self.snapshot(displays, self.current());
        self.profiles.insert(
            name.clone(),
            MonitorProfile {
                name: name.clone(),
                monitors,
                is_active: false,
            },
        );
        info!("created profile {}", name);
        notify(&self.events, LayoutEvent::ProfileUpdated { profile: name });
        self.persist()
    }

    pub fn activate_profile(&mut self, name: &str) -> Result<(), ProfileError> {
        if !self.profiles.contains_key(name) {
            return Err(ProfileError::UnknownProfile(name.to_string()));
        }
        for profile in self.profiles.values_mut() {
            profile.is_active = profile.name == name;
        }
        self.current = Some(name.to_string());
        info!("activated profile {}", name);
        notify(
            &self.events,
            LayoutEvent::ProfileChanged {
                profile: name.to_string(),
            },
        );
        self.persist()
    }

    /// Refuses the active profile and the last remaining one.
    pub fn delete_profile(&mut self, name: &str) -> Result<(), ProfileError> {
        if !self.profiles.contains_key(name) {
            return Err(ProfileError::UnknownProfile(name.to_string()));
        }
        if self.profiles.len() <= 1 {
            return Err(ProfileError::LastProfile(name.to_string()));
        }
        if self.current.as_deref() == Some(name) {
            return Err(ProfileError::ActiveProfile(name.to_string()));
        }
        self.profiles.remove(name);
        info!("deleted profile {}", name);
        self.persist()
    }

    pub fn rename_profile(&mut self, old: &str, new: &str) -> Result<(), ProfileError> {
        if !self.profiles.contains_key(old) {
            return Err(ProfileError::UnknownProfile(old.to_string()));
        }
        let new = self.check_new_name(new)?;
        let Some(mut profile) = self.profiles.remove(old) else {
            return Err(ProfileError::UnknownProfile(old.to_string()));
        };
        profile.name = new.clone();
        self.profiles.insert(new.clone(), profile);
        if self.current.as_deref() == Some(old) {
            self.current = Some(new.clone());
        }
        info!("renamed profile {} to {}", old, new);
        notify(&self.events, LayoutEvent::ProfileUpdated { profile: new });
        self.persist()
    }

    /// Replace the grid of one monitor in one profile.
    pub fn set_monitor_grid(
        &mut self,
        profile: &str,
        monitor_id: &str,
        config: GridConfig,
    ) -> Result<(), ProfileError> {
        config.validate()?;
        let entry = self
            .profiles
            .get_mut(profile)
            .ok_or_else(|| ProfileError::UnknownProfile(profile.to_string()))?;
        let monitor = entry
            .monitors
            .get_mut(monitor_id)
            .ok_or_else(|| ProfileError::UnknownMonitor {
                profile: profile.to_string(),
                monitor: monitor_id.to_string(),
            })?;
        monitor.grid_config = config;
        notify(
            &self.events,
            LayoutEvent::ProfileUpdated {
                profile: profile.to_string(),
            },
        );
        self.persist()
    }

    fn check_new_name(&self, name: &str) -> Result<String, ProfileError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if self.profiles.contains_key(name) {
            return Err(ProfileError::DuplicateName(name.to_string()));
        }
        Ok(name.to_string())
    }

    /// Build monitor entries for `displays`, reusing names and grids from
    /// `seed` where the monitor id matches.
    fn snapshot(&self, displays: &[MonitorInfo], seed: Option<&MonitorProfile>) -> BTreeMap<String, Monitor> {
        let mut monitors = BTreeMap::new();
        for info in displays {
            let monitor = match seed.and_then(|p| p.monitors.get(&info.id)) {
                Some(existing) => Monitor {
                    name: existing.name.clone(),
                    ..Monitor::with_grid(info, existing.grid_config.clone())
                },
                None => Monitor {
                    name: format!("Display {}", monitors.len() + 1),
                    ..Monitor::from_info(info, &self.defaults)
                },
            };
            monitors.insert(info.id.clone(), monitor);
        }
        monitors
    }

    fn persist(&mut self) -> Result<(), ProfileError> {
        let file = ProfileFile {
            profiles: self.profiles.values().cloned().collect(),
        };
        self.storage.save(&file)?;
        Ok(())
    }
}
