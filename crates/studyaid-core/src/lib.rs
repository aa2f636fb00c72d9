//! Core library for StudyAid.
//!
//! Keeps one logical login session in two physical places: a local
//! key-value store private to the client, and an `access_token` cookie on
//! the web app origin. The cookie is authoritative; the local copy is a
//! cache reconciled by a [`sync::SyncLoop`] and observed by a
//! [`session::SessionRouter`] that decides which screen to show.
//!
//! - `auth`: access token type, storage areas and the session store
//! - `cookies`: URL-scoped cookie jar, cookie policy and the cookie mirror
//! - `sync`: poll + event driven reconciliation
//! - `session`: the session consumer state machine
//! - `api`: REST client for the StudyAid backend
//! - `models`: user profile and auth payloads
//! - `config`: configuration file and environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod cookies;
pub mod models;
pub mod session;
pub mod sync;

pub use api::{ApiClient, ApiError};
pub use auth::{AccessToken, LocalStorage, SessionStore, StorageChange};
pub use config::{Config, ConfigError};
pub use cookies::{CookieJar, CookieMirror, CookiePolicy};
pub use models::User;
pub use session::{LoginOutcome, SessionRouter, SessionState};
pub use sync::{Reconciled, SyncHandle, SyncLoop};
