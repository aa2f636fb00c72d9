//! Authentication state kept on the client.
//!
//! This module provides:
//! - `AccessToken`: the opaque bearer credential issued at login
//! - `LocalStorage`: a key-value storage area with change notifications,
//!   backed by memory, a JSON file, or the OS keyring
//! - `SessionStore`: the local copy of the access token
//!
//! The local copy is never authoritative; see `crate::sync`.

pub mod storage;
pub mod store;
pub mod token;

pub use storage::{
    FileBackend, KeyringBackend, LocalStorage, MemoryBackend, StorageBackend, StorageChange,
    StorageError, StorageKind,
};
pub use store::{SessionStore, ACCESS_TOKEN_KEY};
pub use token::AccessToken;
