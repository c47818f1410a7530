//! Key-value storage backends
//!
//! Progress is stored as string blobs keyed by string, mirroring a browser's
//! local storage.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::Config;
use crate::engine::EngineError;

/// A string-keyed blob store
pub trait StorageBackend {
    /// Read the blob stored under a key
    fn get(&self, key: &str) -> Option<String>;

    /// Store a blob, replacing any previous value
    fn set(&mut self, key: &str, value: String) -> Result<(), EngineError>;

    /// Delete a key, returning true if it existed
    fn delete(&mut self, key: &str) -> Result<bool, EngineError>;

    /// Every stored key starting with `prefix`
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

/// In-memory backend, lost when dropped
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), EngineError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, EngineError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> =
            self.entries.keys().filter(|k| k.starts_with(prefix)).cloned().collect();
        keys.sort();
        keys
    }
}

/// Backend persisted as a single JSON object on disk
///
/// The whole map is rewritten on every mutation.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileBackend {
    /// Open the store at the default location in the data directory
    pub fn open_default(config: &Config) -> Result<Self> {
        Ok(Self::open(config.progress_path()?))
    }

    /// Open a store file, starting empty if it is missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::read_entries(&path);
        Self { path, entries }
    }

    fn read_entries(path: &Path) -> BTreeMap<String, String> {
        if !path.exists() {
            return BTreeMap::new();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Failed to read progress from {:?}, starting fresh: {}", path, e);
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!("Corrupt progress file {:?}, starting fresh: {}", path, e);
            BTreeMap::new()
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), EngineError> {
        self.entries.insert(key.to_string(), value);
        self.save()
    }

    fn delete(&mut self, key: &str) -> Result<bool, EngineError> {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.save()?;
        }
        Ok(existed)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect()
    }
}
