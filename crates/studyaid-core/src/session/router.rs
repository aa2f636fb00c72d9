use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::{ApiClient, ApiError};
use crate::auth::{AccessToken, SessionStore};
use crate::cookies::CookieMirror;
use crate::models::User;
use crate::sync::{Reconciled, SyncHandle, SyncLoop, DEFAULT_POLL_INTERVAL};

/// Which screen the UI should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum SessionState {
    /// Before the first read of the session store
    Checking,
    Authenticated,
    Unauthenticated,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Checking => "Checking",
            SessionState::Authenticated => "Signed in",
            SessionState::Unauthenticated => "Signed out",
        }
    }
}

/// Result of [`SessionRouter::login`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    SignedIn { user: Option<User> },
    /// The router was unmounted while the request was in flight, so the
    /// token was not stored.
    Discarded,
}

/// Background work owned while mounted
struct Mounted {
    sync: Option<SyncHandle>,
    listener: JoinHandle<()>,
}

impl Drop for Mounted {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// The session consumer.
///
/// `mount` starts the sync loop and a session store listener; `unmount`
/// tears both down. The listener follows store changes made in this process
/// and re-reads the store after every periodic reconciliation, which is
/// where writes from other processes sharing the store show up. Every asynchronous completion compares the generation
/// it started under with the current one and does nothing if the router was
/// unmounted or remounted in between.
pub struct SessionRouter {
    store: SessionStore,
    mirror: CookieMirror,
    poll_interval: Duration,
    state: Arc<watch::Sender<SessionState>>,
    generation: Arc<AtomicU64>,
    mounted: Mutex<Option<Mounted>>,
}

impl SessionRouter {
    pub fn new(store: SessionStore, mirror: CookieMirror) -> Self {
        let (state, _) = watch::channel(SessionState::Checking);
        Self {
            store,
            mirror,
            poll_interval: DEFAULT_POLL_INTERVAL,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            mounted: Mutex::new(None),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver that wakes only on actual state transitions
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn mirror(&self) -> &CookieMirror {
        &self.mirror
    }

    pub async fn is_mounted(&self) -> bool {
        self.mounted.lock().await.is_some()
    }

    /// Start following the session. Mounting twice is a no-op.
    pub async fn mount(&self) {
        let mut mounted = self.mounted.lock().await;
        if mounted.is_some() {
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        publish(&self.state, SessionState::Checking);

        // Subscribe before the first read so no change slips between them
        let (reports, reconciled) = watch::channel(Reconciled::Unchanged);
        let listener = self.spawn_store_listener(generation, reconciled);

        let initial = state_of(&self.store).await;
        if self.is_current(generation) {
            publish(&self.state, initial);
        }
        debug!(state = initial.label(), "Session router mounted");

        let sync = SyncLoop::new(self.store.clone(), self.mirror.clone())
            .with_interval(self.poll_interval)
            .with_reports(reports)
            .start();

        *mounted = Some(Mounted {
            sync: Some(sync),
            listener,
        });
    }

    /// Stop following the session and wait for the sync loop to finish.
    pub async fn unmount(&self) {
        let mounted = self.mounted.lock().await.take();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(mut mounted) = mounted {
            mounted.listener.abort();
            if let Some(sync) = mounted.sync.take() {
                sync.shutdown().await;
            }
            debug!("Session router unmounted");
        }
    }

    /// Persist a fresh token from a login response and show the signed-in
    /// screen. The cookie is written before the store because it is the
    /// authoritative copy: a sync tick landing between the two writes then
    /// adopts the new token instead of clearing it.
    pub async fn sign_in(&self, token: AccessToken) {
        let generation = self.generation.load(Ordering::SeqCst);
        self.mirror.write(&token);
        self.store.set(&token).await;
        if self.is_current(generation) && publish(&self.state, SessionState::Authenticated) {
            info!("Signed in");
        }
    }

    /// Authenticate against the backend and sign in with the returned token.
    /// Failures leave the session untouched.
    pub async fn login(
        &self,
        api: &ApiClient,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, ApiError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let response = api.login(email, password).await?;

        if !self.is_current(generation) {
            debug!("Login finished after the router was torn down, discarding token");
            return Ok(LoginOutcome::Discarded);
        }

        self.sign_in(response.access_token).await;
        Ok(LoginOutcome::SignedIn {
            user: response.user,
        })
    }

    /// Forget the session locally. The cookie goes first so the sync loop
    /// cannot re-adopt it between the two deletions. No server call is made.
    pub async fn logout(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        self.mirror.remove();
        self.store.clear().await;
        if self.is_current(generation) && publish(&self.state, SessionState::Unauthenticated) {
            info!("Signed out");
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn spawn_store_listener(
        &self,
        generation: u64,
        mut reconciled: watch::Receiver<Reconciled>,
    ) -> JoinHandle<()> {
        let mut changes = self.store.subscribe();
        let store = self.store.clone();
        let state = self.state.clone();
        let current = self.generation.clone();

        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    change = changes.recv() => match change {
                        Ok(change) if SessionStore::is_token_change(&change) => {
                            if change.new_value.and_then(AccessToken::new).is_some() {
                                SessionState::Authenticated
                            } else {
                                SessionState::Unauthenticated
                            }
                        }
                        Ok(_) => continue,
                        Err(RecvError::Lagged(_)) => state_of(&store).await,
                        Err(RecvError::Closed) => break,
                    },
                    ticked = reconciled.changed() => {
                        // Sync loop gone
                        if ticked.is_err() {
                            break;
                        }
                        state_of(&store).await
                    }
                };

                if current.load(Ordering::SeqCst) != generation {
                    break;
                }
                if publish(&state, next) {
                    info!(state = next.label(), "Session state changed");
                }
            }
        })
    }
}

/// State implied by what the session store holds right now
async fn state_of(store: &SessionStore) -> SessionState {
    if store.get().await.is_some() {
        SessionState::Authenticated
    } else {
        SessionState::Unauthenticated
    }
}

/// Set the state, waking receivers only if it actually changed.
fn publish(state: &watch::Sender<SessionState>, next: SessionState) -> bool {
    state.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    })
}
