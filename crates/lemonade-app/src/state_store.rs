//! Persistent key/value stores
//!
//! A [`StateStore`] is one JSON object on disk. The workspace store lives in
//! `<workspace>/.lemonade/state.json` and holds `lastSessions`; the global
//! store lives under the user data dir and remembers option picks.

use fs2::FileExt;
use lemonade_core::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::settings::LEMONADE_DIR;

const STATE_FILENAME: &str = "state.json";

#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl StateStore {
    /// Open the store at `path`. Missing or unreadable files start empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = read_object(&path);
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// `<workspace>/.lemonade/state.json`
    pub fn workspace(workspace: &Path) -> Self {
        Self::open(workspace.join(LEMONADE_DIR).join(STATE_FILENAME))
    }

    /// `<data_local_dir>/lemonade/state.json`
    pub fn global() -> Result<Self> {
        let dir = dirs::data_local_dir()
            .ok_or_else(|| Error::state_store("no user data directory"))?;
        Ok(Self::open(dir.join("lemonade").join(STATE_FILENAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_raw(&self, key: &str) -> Option<Value> {
        self.values.lock().ok()?.get(key).cloned()
    }

    /// Typed read; `None` when absent or of the wrong shape
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key)?;
        serde_json::from_value(raw)
            .inspect_err(|e| debug!("State key {} has unexpected shape: {}", key, e))
            .ok()
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Set (`Some`) or delete (`None`) a key and write the store to disk
    pub fn update(&self, key: &str, value: Option<Value>) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| Error::state_store("state lock poisoned"))?;

        match value {
            Some(value) => {
                values.insert(key.to_string(), value);
            }
            None => {
                values.remove(key);
            }
        }

        write_object(&self.path, &values)
    }

    /// Serialize `value` and store it under `key`
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.update(key, Some(serde_json::to_value(value)?))
    }

    pub fn keys(&self) -> Vec<String> {
        self.values
            .lock()
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn read_object(path: &Path) -> Map<String, Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Map::new(),
        Err(e) => {
            warn!("Failed to read state {:?}: {}", path, e);
            return Map::new();
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!("State {:?} is not a JSON object, starting empty", path);
            Map::new()
        }
        Err(e) => {
            warn!("Failed to parse state {:?}: {}", path, e);
            Map::new()
        }
    }
}

/// Temp file + rename under an exclusive lock on a sidecar lock file
fn write_object(path: &Path, values: &Map<String, Value>) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::state_store(format!("invalid state path {:?}", path)))?;
    std::fs::create_dir_all(parent)
        .map_err(|e| Error::state_store(format!("Failed to create {:?}: {}", parent, e)))?;

    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path.with_extension("lock"))
        .map_err(|e| Error::state_store(format!("Failed to open lock file: {}", e)))?;
    lock_file
        .lock_exclusive()
        .map_err(|e| Error::state_store(format!("Failed to lock state: {}", e)))?;

    let content = serde_json::to_string_pretty(values)?;
    let temp_path = path.with_extension("json.tmp");

    std::fs::write(&temp_path, content)
        .map_err(|e| Error::state_store(format!("Failed to write temp file: {}", e)))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| Error::state_store(format!("Failed to rename temp file: {}", e)))?;

    // Lock is released when lock_file is dropped
    trace!("Wrote state {:?}", path);
    Ok(())
}
