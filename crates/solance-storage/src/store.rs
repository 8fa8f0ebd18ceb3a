use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{MemoryBackend, StoreBackend};
use crate::file::FileBackend;

/// Total key-value store over a fallible backend.
///
/// Every operation succeeds from the caller's point of view. Writes are
/// mirrored into an in-memory shadow; if the backend rejects a write or
/// delete, that key is served from the shadow until a later backend write
/// for it succeeds. Backend read failures (including malformed entries)
/// fall back to the shadow, which is empty unless this process wrote the
/// key.
pub struct LocalStore {
    backend: Box<dyn StoreBackend>,
    shadow: Mutex<Shadow>,
}

#[derive(Default)]
struct Shadow {
    values: HashMap<String, Value>,
    /// Keys whose latest write never reached the backend.
    unsynced: HashSet<String>,
}

impl LocalStore {
    pub fn new(backend: Box<dyn StoreBackend>) -> Self {
        Self {
            backend,
            shadow: Mutex::new(Shadow::default()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    /// File-backed store rooted at `dir`. If the directory cannot be
    /// created the store runs in memory for the rest of the process.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        match FileBackend::open(&dir) {
            Ok(backend) => {
                debug!(dir = %dir.display(), "opened file store");
                Self::new(Box::new(backend))
            }
            Err(e) => {
                warn!(error = %e, "local storage unavailable, keeping state in memory");
                Self::in_memory()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let shadow = self.shadow.lock().unwrap_or_else(|e| e.into_inner());
        if shadow.unsynced.contains(key) {
            return shadow.values.get(key).cloned();
        }
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "store read failed, using in-memory value");
                shadow.values.get(key).cloned()
            }
        }
    }

    pub fn set(&self, key: &str, value: Value) {
        let mut shadow = self.shadow.lock().unwrap_or_else(|e| e.into_inner());
        match self.backend.set(key, &value) {
            Ok(()) => {
                shadow.unsynced.remove(key);
            }
            Err(e) => {
                warn!(key, error = %e, "store write failed, keeping value in memory");
                shadow.unsynced.insert(key.to_string());
            }
        }
        shadow.values.insert(key.to_string(), value);
    }

    pub fn delete(&self, key: &str) {
        let mut shadow = self.shadow.lock().unwrap_or_else(|e| e.into_inner());
        shadow.values.remove(key);
        match self.backend.delete(key) {
            Ok(()) => {
                shadow.unsynced.remove(key);
            }
            Err(e) => {
                warn!(key, error = %e, "store delete failed, hiding key in memory");
                shadow.unsynced.insert(key.to_string());
            }
        }
    }
}
