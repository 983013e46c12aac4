//! Minimal key-value store abstraction.
//!
//! The site collection is persisted as one JSON document under a single key,
//! so the storage boundary is just `get`/`put` on string values. No
//! multi-key atomicity is assumed anywhere.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Site not found: {0}")]
    NotFound(String),

    #[error("Invalid site: {0}")]
    InvalidSite(String),

    #[error("No HTML content to import")]
    EmptyImport,
}

/// String key-value storage for whole JSON documents
pub trait KvStore {
    /// Fetch the value for a key, `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write the value for a key, replacing any previous value
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// File-backed store: one `<key>.json` file per key under a base directory
pub struct FileKvStore {
    base_path: PathBuf,
}

impl FileKvStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn key_file(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let file = self.key_file(key);
        if !file.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&file)?))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path)?;
        fs::write(self.key_file(key), value)?;
        Ok(())
    }
}

/// In-memory store for tests and the `--memory` mode
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
