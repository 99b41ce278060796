use std::collections::HashMap;
use std::path::PathBuf;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::Error;

/// Engine-owned global variable store. Optionally backed by a JSON file so
/// marked variables survive restarts. Concurrent writers are last-write-wins.
pub struct VariableStore {
    values: DashMap<String, String>,
    persist_path: Option<PathBuf>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
            persist_path: None,
        }
    }

    /// Load any previously persisted values from `path`; later calls to
    /// [`VariableStore::persist`] write the current map back there.
    pub fn with_persistence(path: PathBuf) -> Self {
        let values = DashMap::new();
        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(saved) => {
                    for (k, v) in saved {
                        values.insert(k, v);
                    }
                }
                Err(e) => warn!("Ignoring malformed variable file {:?}: {}", path, e),
            },
            Err(_) => debug!("No persisted variables at {:?}", path),
        }
        Self {
            values,
            persist_path: Some(path),
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).map(|v| v.clone())
    }

    pub fn set(&self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn remove(&self, name: &str) {
        self.values.remove(name);
    }

    /// Write the whole map to the persistence file, when one is configured.
    pub fn persist(&self) -> Result<(), Error> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let snapshot: HashMap<String, String> = self
            .values
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let raw = serde_json::to_string_pretty(&snapshot)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-user variable store, keyed by lowercased username.
pub struct UserVariableStore {
    values: DashMap<String, HashMap<String, String>>,
    persist_path: Option<PathBuf>,
}

impl UserVariableStore {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
            persist_path: None,
        }
    }

    pub fn with_persistence(path: PathBuf) -> Self {
        let values = DashMap::new();
        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, HashMap<String, String>>>(&raw)
            {
                Ok(saved) => {
                    for (k, v) in saved {
                        values.insert(k, v);
                    }
                }
                Err(e) => warn!("Ignoring malformed user-variable file {:?}: {}", path, e),
            },
            Err(_) => debug!("No persisted user variables at {:?}", path),
        }
        Self {
            values,
            persist_path: Some(path),
        }
    }

    pub fn get(&self, user: &str, name: &str) -> Option<String> {
        self.values
            .get(&user.to_lowercase())
            .and_then(|vars| vars.get(name).cloned())
    }

    pub fn set(&self, user: &str, name: &str, value: &str) {
        self.values
            .entry(user.to_lowercase())
            .or_default()
            .insert(name.to_string(), value.to_string());
    }

    pub fn persist(&self) -> Result<(), Error> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let snapshot: HashMap<String, HashMap<String, String>> = self
            .values
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let raw = serde_json::to_string_pretty(&snapshot)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl Default for UserVariableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_round_trip() {
        let store = VariableStore::new();
        store.set("counter", "3");
        assert_eq!(store.get("counter").as_deref(), Some("3"));
        store.remove("counter");
        assert!(store.get("counter").is_none());
    }

    #[test]
    fn user_store_is_keyed_case_insensitively() {
        let store = UserVariableStore::new();
        store.set("Alice", "points", "10");
        assert_eq!(store.get("alice", "points").as_deref(), Some("10"));
        assert!(store.get("alice", "rank").is_none());
    }
}
