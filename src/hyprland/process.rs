//! Process-name lookup for Hyprland clients.
//!
//! Hyprland reports a window's `pid` and `class` but no executable name.
//! Names are read from `/proc/<pid>/comm` and cached per window handle in a
//! bounded LRU; the compositor backend evicts an entry as soon as its
//! liveness check fails, so a recycled address never inherits a stale name.

use crate::window::WindowHandle;
use lru::LruCache;
use std::cell::RefCell;
use std::num::NonZeroUsize;

/// Default maximum number of cached names.
const DEFAULT_CAPACITY: usize = 256;

/// Size-bounded cache of process names keyed by window handle.
pub struct ProcessNames {
    cache: RefCell<LruCache<WindowHandle, String>>,
}

impl Default for ProcessNames {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ProcessNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RefCell::new(LruCache::new(cap)),
        }
    }

    /// The process name of `handle`, reading `/proc` on a miss.
    pub fn get(&self, handle: WindowHandle, pid: i64, class: &str) -> String {
        self.get_with(handle, pid, class, read_comm)
    }

    /// Like [`get`](Self::get) with a custom lookup.  Falls back to the
    /// window class when the lookup yields nothing.
    pub fn get_with(
        &self,
        handle: WindowHandle,
        pid: i64,
        class: &str,
        lookup: impl FnOnce(i64) -> Option<String>,
    ) -> String {
        if let Some(found) = self.cache.borrow_mut().get(&handle) {
            return found.clone();
        }
        let name = lookup(pid).unwrap_or_else(|| class.to_string());
        self.cache.borrow_mut().put(handle, name.clone());
        name
    }

    /// Forget `handle`.  Returns whether it was cached.
    pub fn invalidate(&self, handle: WindowHandle) -> bool {
        self.cache.borrow_mut().pop(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

/// Read `/proc/<pid>/comm`.  Xwayland and sandboxed clients can report a
/// pid of 0 or -1.
fn read_comm(pid: i64) -> Option<String> {
    if pid <= 0 {
        return None;
    }
    let comm = std::fs::read_to_string(format!("/proc/{}/comm", pid)).ok()?;
    let comm = comm.trim();
    (!comm.is_empty()).then(|| comm.to_string())
}
