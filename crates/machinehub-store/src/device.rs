//! File-backed device storage.
//!
//! A small key-value JSON file standing in for the browser's local
//! storage: loaded once on open, written through on every mutation.
//! Corruption is tolerated by starting empty — losing the cursor or a
//! preference is never fatal.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing;

use machinehub_core::access::AccessScope;
use machinehub_core::config::storage::DeviceStorageConfig;
use machinehub_core::types::{MachineId, UserRole};

use crate::keys;

/// Key-value store persisted as a single JSON object.
#[derive(Debug)]
pub struct DeviceStorage {
    /// Backing file path.
    path: PathBuf,
    /// In-memory view of the file.
    values: Mutex<HashMap<String, String>>,
}

impl DeviceStorage {
    /// Open the store, loading existing values. A missing or corrupt
    /// file yields an empty store.
    pub fn open(config: &DeviceStorageConfig) -> Self {
        let path = PathBuf::from(&config.path);
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Device storage corrupt, starting empty: {e}");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            values: Mutex::new(HashMap::new()),
        }
    }

    /// Read a value.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Write a value and persist.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        let mut guard = self.values.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(key.to_string(), value.into());
        self.persist(&guard);
    }

    /// Remove a value and persist.
    pub fn remove(&self, key: &str) {
        let mut guard = self.values.lock().unwrap_or_else(|e| e.into_inner());
        if guard.remove(key).is_some() {
            self.persist(&guard);
        }
    }

    /// Read a JSON-encoded value.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|raw| serde_json::from_str(&raw).ok())
    }

    /// Write a JSON-encoded value.
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, raw),
            Err(e) => tracing::warn!(key, "Failed to encode device storage value: {e}"),
        }
    }

    fn persist(&self, values: &HashMap<String, String>) {
        if self.path.as_os_str().is_empty() {
            return;
        }
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(path = %self.path.display(), "Device storage dir failed: {e}");
                return;
            }
        }
        let encoded = match serde_json::to_string_pretty(values) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!("Failed to encode device storage: {e}");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, encoded) {
            tracing::warn!(path = %self.path.display(), "Device storage write failed: {e}");
        }
    }

    // ── Session helpers ─────────────────────────────────────────

    /// Assigned machine ids: the JSON array when present, else the
    /// legacy single-id key.
    pub fn assigned_machine_ids(&self) -> Vec<MachineId> {
        if let Some(ids) = self.get_json::<Vec<serde_json::Value>>(keys::ASSIGNED_MACHINE_IDS) {
            return ids
                .iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => MachineId::parse(s),
                    serde_json::Value::Number(n) => MachineId::parse(n.to_string()),
                    _ => None,
                })
                .collect();
        }
        self.get(keys::ASSIGNED_MACHINE_ID)
            .and_then(|id| MachineId::parse(id))
            .map(|id| vec![id])
            .unwrap_or_default()
    }

    /// Access scope of the stored session. A missing role yields a fully
    /// scoped non-admin with no assignments.
    pub fn access_scope(&self) -> AccessScope {
        let role = self
            .get(keys::ROLE)
            .and_then(|r| r.parse::<UserRole>().ok())
            .unwrap_or(UserRole::Other(String::new()));
        AccessScope::new(role, self.assigned_machine_ids())
    }
}
