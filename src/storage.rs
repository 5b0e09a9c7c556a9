//! Persistence seam for layers and profiles.
//!
//! Managers never touch the filesystem directly; they go through a
//! [`Storage`] so tests can run against [`MemoryStorage`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

/// Errors from reading or writing persisted state.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A place where a value of type `T` can be loaded from and saved to.
pub trait Storage<T> {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<T>, StorageError>;

    fn save(&self, value: &T) -> Result<(), StorageError>;
}

/// A pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Serialize + DeserializeOwned> Storage<T> for JsonFile {
    fn load(&self) -> Result<Option<T>, StorageError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, value: &T) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(value)?;
        // Write to a sibling file first so a crash never leaves a truncated
        // layers file behind.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory storage holding the serialized JSON text.
///
/// Values round-trip through `serde_json` exactly like [`JsonFile`], so
/// anything that survives here survives on disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    contents: RefCell<Option<String>>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated with raw text, which need not be valid JSON.
    pub fn with_contents(raw: impl Into<String>) -> Self {
        Self {
            contents: RefCell::new(Some(raw.into())),
            ..Self::default()
        }
    }

    /// Make every subsequent [`save`](Storage::save) fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful saves.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn raw(&self) -> Option<String> {
        self.contents.borrow().clone()
    }
}

impl<T: Serialize + DeserializeOwned> Storage<T> for MemoryStorage {
    fn load(&self) -> Result<Option<T>, StorageError> {
        match self.contents.borrow().as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, value: &T) -> Result<(), StorageError> {
        if self.fail_writes.get() {
            return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "writes disabled").into());
        }
        *self.contents.borrow_mut() = Some(serde_json::to_string(value)?);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl<T, S: Storage<T> + ?Sized> Storage<T> for &S {
    fn load(&self) -> Result<Option<T>, StorageError> {
        (**self).load()
    }

    fn save(&self, value: &T) -> Result<(), StorageError> {
        (**self).save(value)
    }
}
