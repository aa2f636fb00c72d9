use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::storage::{LocalStorage, StorageChange};
use super::AccessToken;

/// Storage key holding the access token, shared with the web extension.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// The client-local copy of the access token.
///
/// Never fails: backend errors are logged and read as "no token", so callers
/// only ever deal with present or absent.
#[derive(Clone)]
pub struct SessionStore {
    storage: LocalStorage,
}

impl SessionStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub async fn get(&self) -> Option<AccessToken> {
        match self.storage.get(ACCESS_TOKEN_KEY).await {
            Ok(value) => value.and_then(AccessToken::new),
            Err(e) => {
                warn!(error = %e, "Failed to read session store, treating as signed out");
                None
            }
        }
    }

    /// Overwrite the stored token. Writing the current value is a no-op and
    /// does not notify listeners.
    pub async fn set(&self, token: &AccessToken) {
        match self.storage.set(ACCESS_TOKEN_KEY, token.as_str()).await {
            Ok(true) => debug!("Session store updated"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Failed to write session store"),
        }
    }

    pub async fn clear(&self) {
        match self.storage.remove(ACCESS_TOKEN_KEY).await {
            Ok(true) => debug!("Session store cleared"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Failed to clear session store"),
        }
    }

    pub async fn is_present(&self) -> bool {
        self.get().await.is_some()
    }

    /// Changes to the token key only. Other keys in the same storage area are
    /// filtered out by [`SessionStore::is_token_change`].
    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.storage.subscribe()
    }

    pub fn is_token_change(change: &StorageChange) -> bool {
        change.key == ACCESS_TOKEN_KEY
    }
}
