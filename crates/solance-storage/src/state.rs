use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::store::LocalStore;

/// Load a typed value. Missing and malformed entries both read as `None`;
/// malformed ones are logged.
pub fn load_state<T: DeserializeOwned>(store: &LocalStore, key: &str) -> Option<T> {
    let value = store.get(key)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(key, error = %e, "ignoring malformed store entry");
            None
        }
    }
}

/// Load a typed value, falling back to `T::default()`.
pub fn load_state_or_default<T: DeserializeOwned + Default>(store: &LocalStore, key: &str) -> T {
    load_state(store, key).unwrap_or_default()
}

/// Save a typed value. Serialization failures are logged and dropped,
/// matching the store's never-fail contract.
pub fn save_state<T: Serialize>(store: &LocalStore, key: &str, value: &T) {
    match serde_json::to_value(value) {
        Ok(json) => store.set(key, json),
        Err(e) => warn!(key, error = %e, "failed to serialize store entry"),
    }
}
