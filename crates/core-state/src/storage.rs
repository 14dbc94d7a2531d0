//! Durable backing for the persisted dashboard record.
//!
//! The store serializes its whole state into one JSON document under a fixed
//! namespace key and hands it to a [`StateStorage`] after every mutation.
//! Reads happen once, at hydration.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::trace;

/// Namespace key of the persisted record (also the default file stem).
pub const STORAGE_KEY: &str = "dashboard-storage";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode dashboard state: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("in-memory storage lock poisoned")]
    Poisoned,
}

pub trait StateStorage: Send {
    /// Raw persisted payload, or `None` when nothing was ever written.
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn save(&mut self, payload: &str) -> Result<(), StorageError>;
    /// Short human-readable location for logs.
    fn describe(&self) -> String;
}

/// JSON file on disk. Writes go to a sibling temp file which is then renamed
/// over the target so a crash never leaves a half-written record.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn save(&mut self, payload: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        trace!(target: "state.storage", path = %self.path.display(), size_bytes = payload.len(), "file_saved");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Process-local storage. Clones share the same slot so a test can keep a
/// handle and inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
    writes: Arc<Mutex<u64>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: impl Into<String>) -> Self {
        let storage = Self::default();
        if let Ok(mut slot) = storage.slot.lock() {
            *slot = Some(payload.into());
        }
        storage
    }

    pub fn payload(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }

    /// Number of successful `save` calls.
    pub fn write_count(&self) -> u64 {
        self.writes.lock().map(|w| *w).unwrap_or(0)
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slot.clone())
    }

    fn save(&mut self, payload: &str) -> Result<(), StorageError> {
        let mut slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        *slot = Some(payload.to_string());
        let mut writes = self.writes.lock().map_err(|_| StorageError::Poisoned)?;
        *writes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("absent.json"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn file_storage_creates_parent_dirs_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("state.json");
        let mut storage = JsonFileStorage::new(&path);
        storage.save("{\"x\":1}").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("{\"x\":1}"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn memory_storage_shares_slot_between_clones() {
        let handle = MemoryStorage::new();
        let mut writer = handle.clone();
        writer.save("abc").unwrap();
        assert_eq!(handle.payload().as_deref(), Some("abc"));
        assert_eq!(handle.write_count(), 1);
    }
}
