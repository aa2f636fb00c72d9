//! Key-value storage areas with change notifications.
//!
//! A [`LocalStorage`] is one named area (`local`) sitting on a pluggable
//! [`StorageBackend`]. Every mutation that actually changes a value is
//! announced to subscribers as a [`StorageChange`] carrying the old and new
//! values, so listeners never see a change for a write of the same value.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Name reported in change events, matching the extension storage area.
pub const LOCAL_AREA: &str = "local";

/// File name for the file backend inside the data directory
const STORAGE_FILE: &str = "storage.json";

/// Keyring service name for the keyring backend
const KEYRING_SERVICE: &str = "studyaid";

/// Capacity of the change broadcast. Slow listeners past this lag and
/// receive `RecvError::Lagged`.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage file: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Which backend a [`LocalStorage`] is opened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    #[default]
    File,
    Keyring,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "file" => Ok(StorageKind::File),
            "keyring" => Ok(StorageKind::Keyring),
            other => Err(format!("unknown storage kind: {}", other)),
        }
    }
}

/// A change to one key of a storage area.
#[derive(Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub area: &'static str,
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl StorageChange {
    pub fn is_removal(&self) -> bool {
        self.new_value.is_none()
    }
}

impl std::fmt::Debug for StorageChange {
    // Values are credentials more often than not
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageChange")
            .field("area", &self.area)
            .field("key", &self.key)
            .field("had_old", &self.old_value.is_some())
            .field("has_new", &self.new_value.is_some())
            .finish()
    }
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ============================================================================
// Backends
// ============================================================================

/// Process-local storage. Contents are lost on exit.
#[derive(Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values().remove(key);
        Ok(())
    }
}

/// A JSON object on disk, one entry per key.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, values: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(values)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.load().await?;
        if values.remove(key).is_some() {
            self.save(&values).await?;
        }
        Ok(())
    }
}

/// The OS credential store. Each key is one keyring entry under the
/// `studyaid` service.
pub struct KeyringBackend {
    service: String,
}

impl KeyringBackend {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    async fn with_entry<T, F>(&self, key: &str, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(Entry) -> Result<T, keyring::Error> + Send + 'static,
    {
        let service = self.service.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, &key)?;
            op(entry)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
        .map_err(StorageError::from)
    }
}

impl Default for KeyringBackend {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

#[async_trait]
impl StorageBackend for KeyringBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let value = value.to_string();
        self.with_entry(key, move |entry| entry.set_password(&value))
            .await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        })
        .await
    }
}

// ============================================================================
// Storage area
// ============================================================================

/// One storage area shared by everything in the process.
///
/// Clone is cheap and clones share the backend, the write lock and the
/// change channel.
#[derive(Clone)]
pub struct LocalStorage {
    kind: StorageKind,
    backend: Arc<dyn StorageBackend>,
    changes: broadcast::Sender<StorageChange>,
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl LocalStorage {
    pub fn new(kind: StorageKind, backend: Arc<dyn StorageBackend>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            kind,
            backend,
            changes,
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn memory() -> Self {
        Self::new(StorageKind::Memory, Arc::new(MemoryBackend::new()))
    }

    /// Open the area on the configured backend. File storage lives in
    /// `data_dir`.
    pub fn open(kind: StorageKind, data_dir: &Path) -> Self {
        let backend: Arc<dyn StorageBackend> = match kind {
            StorageKind::Memory => Arc::new(MemoryBackend::new()),
            StorageKind::File => Arc::new(FileBackend::new(data_dir.join(STORAGE_FILE))),
            StorageKind::Keyring => Arc::new(KeyringBackend::default()),
        };
        debug!(?kind, "Opened local storage");
        Self::new(kind, backend)
    }

    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.backend.get(key).await
    }

    /// Store `value` under `key`. Returns whether anything changed.
    pub async fn set(&self, key: &str, value: &str) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;
        let old_value = self.backend.get(key).await?;
        if old_value.as_deref() == Some(value) {
            trace!(key, "Storage set skipped, value unchanged");
            return Ok(false);
        }
        self.backend.set(key, value).await?;
        self.announce(key, old_value, Some(value.to_string()));
        Ok(true)
    }

    /// Remove `key`. Returns whether anything was removed.
    pub async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;
        let old_value = self.backend.get(key).await?;
        if old_value.is_none() {
            return Ok(false);
        }
        self.backend.remove(key).await?;
        self.announce(key, old_value, None);
        Ok(true)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }

    fn announce(&self, key: &str, old_value: Option<String>, new_value: Option<String>) {
        let change = StorageChange {
            area: LOCAL_AREA,
            key: key.to_string(),
            old_value,
            new_value,
        };
        trace!(?change, "Storage changed");
        // No receivers is fine
        let _ = self.changes.send(change);
    }
}
