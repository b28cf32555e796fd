// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable key-value storage for session data.
//!
//! Keys are flat strings. The session store writes all three keys together
//! on a commit and removes all three on logout; there is no transactional
//! grouping beyond that.

use crate::config::ClientConfig;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Storage keys, shared with the web frontend.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const USER: &str = "user";
    pub const SUBSCRIPTION_STATUS: &str = "subscriptionStatus";

    pub const ALL: [&str; 3] = [TOKEN, USER, SUBSCRIPTION_STATUS];
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Synchronous string-keyed storage.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: SessionStorage + ?Sized> SessionStorage for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Storage selected by [`ClientConfig::storage_path`]: a file when set,
/// process memory otherwise.
pub fn open_configured(config: &ClientConfig) -> Result<Box<dyn SessionStorage>, StorageError> {
    match &config.storage_path {
        Some(path) => Ok(Box::new(FileStorage::open(path)?)),
        None => {
            tracing::info!("No session storage path; session will not survive restart");
            Ok(Box::new(MemoryStorage::new()))
        }
    }
}

/// Process-local storage; contents do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage persisted as one JSON object on disk.
///
/// The whole file is rewritten on every `set`/`remove`.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened session storage");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get(keys::TOKEN), None);
        storage.set(keys::TOKEN, "abc").unwrap();
        storage.set(keys::SUBSCRIPTION_STATUS, "active").unwrap();
        storage.remove(keys::SUBSCRIPTION_STATUS).unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(keys::TOKEN).as_deref(), Some("abc"));
        assert_eq!(reopened.get(keys::SUBSCRIPTION_STATUS), None);
    }

    #[test]
    fn test_file_storage_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileStorage::open(&path),
            Err(StorageError::Serde(_))
        ));
    }

    #[test]
    fn test_open_configured_uses_file_when_path_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let config = ClientConfig {
            storage_path: Some(path.clone()),
            ..ClientConfig::default()
        };

        let storage = open_configured(&config).unwrap();
        storage.set(keys::USER, "{}").unwrap();
        assert!(path.exists());

        let in_memory = open_configured(&ClientConfig::default()).unwrap();
        in_memory.set(keys::USER, "{}").unwrap();
        assert_eq!(in_memory.get(keys::USER).as_deref(), Some("{}"));
    }

    #[test]
    fn test_memory_storage_remove_missing_key() {
        let storage = MemoryStorage::new();
        storage.remove(keys::USER).unwrap();
        assert!(storage.is_empty());
    }
}
