//! Reconciliation of the session store with the session cookie.
//!
//! The cookie is the source of truth. The session store is a cache whose
//! staleness is bounded by the poll interval: cookie events are applied as
//! they arrive, and a periodic tick re-reads the cookie to catch anything
//! the events missed (lagged receivers, other processes).

pub mod reconcile;

pub use reconcile::{Reconciled, SyncHandle, SyncLoop, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
