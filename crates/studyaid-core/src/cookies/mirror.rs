use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use url::Url;

use super::jar::{ChangeCause, CookieChange, CookieJar};
use super::policy::CookiePolicy;
use crate::auth::AccessToken;

/// What happened to the session cookie, as seen by the sync loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    Set(AccessToken),
    Removed,
    /// Events were missed; the current value has to be re-read
    Resync,
}

/// The access token cookie on the web app origin.
///
/// Built without a jar when cookies are not available in the running
/// context. Then every read is absent and every write is a no-op.
#[derive(Clone)]
pub struct CookieMirror {
    jar: Option<Arc<CookieJar>>,
    origin: Url,
    policy: CookiePolicy,
}

impl CookieMirror {
    pub fn new(jar: Arc<CookieJar>, origin: Url, policy: CookiePolicy) -> Self {
        Self {
            jar: Some(jar),
            origin,
            policy,
        }
    }

    /// A mirror with no cookie capability
    pub fn unavailable(origin: Url, policy: CookiePolicy) -> Self {
        Self {
            jar: None,
            origin,
            policy,
        }
    }

    pub fn is_available(&self) -> bool {
        self.jar.is_some()
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn policy(&self) -> &CookiePolicy {
        &self.policy
    }

    pub fn read(&self) -> Option<AccessToken> {
        let jar = self.jar.as_ref()?;
        jar.get(&self.origin, &self.policy.name)
            .and_then(|cookie| AccessToken::new(cookie.value))
    }

    pub fn write(&self, token: &AccessToken) {
        let Some(jar) = self.jar.as_ref() else {
            trace!("Cookie capability absent, skipping write");
            return;
        };
        match self.policy.cookie_for(&self.origin, token.as_str()) {
            Some(cookie) => {
                if jar.set(&self.origin, cookie) {
                    debug!(cookie = %self.policy.name, "Session cookie written");
                }
            }
            None => debug!(origin = %self.origin, "Origin has no host, cannot write cookie"),
        }
    }

    pub fn remove(&self) {
        let Some(jar) = self.jar.as_ref() else {
            trace!("Cookie capability absent, skipping remove");
            return;
        };
        if jar.remove(&self.origin, &self.policy.name) {
            debug!(cookie = %self.policy.name, "Session cookie removed");
        }
    }

    /// Pick up changes another process made to a persistent jar.
    pub fn refresh(&self) {
        if let Some(jar) = self.jar.as_ref() {
            jar.reload();
        }
    }

    /// Session cookie events, or `None` without cookie capability.
    pub fn events(&self) -> Option<MirrorEvents> {
        let jar = self.jar.as_ref()?;
        Some(MirrorEvents {
            rx: jar.subscribe(),
            origin: self.origin.clone(),
            name: self.policy.name.clone(),
        })
    }

    /// Call `callback` whenever the session cookie is deleted by anything
    /// other than being overwritten. Needs a tokio runtime. The listener
    /// stops when the returned guard is dropped.
    pub fn on_removed<F>(&self, callback: F) -> Option<Listener>
    where
        F: Fn() + Send + 'static,
    {
        let mut events = self.events()?;
        let handle = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if event == MirrorEvent::Removed {
                    callback();
                }
            }
        });
        Some(Listener { handle })
    }
}

/// Receiver of [`MirrorEvent`]s for one cookie on one origin.
pub struct MirrorEvents {
    rx: broadcast::Receiver<CookieChange>,
    origin: Url,
    name: String,
}

impl MirrorEvents {
    /// Next event for the session cookie. `None` once the jar is gone.
    pub async fn recv(&mut self) -> Option<MirrorEvent> {
        loop {
            match self.rx.recv().await {
                Ok(change) => {
                    if let Some(event) = self.translate(change) {
                        return Some(event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Cookie events lagged");
                    return Some(MirrorEvent::Resync);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn translate(&self, change: CookieChange) -> Option<MirrorEvent> {
        if change.cookie.name != self.name || !change.cookie.matches(&self.origin) {
            return None;
        }
        match (change.removed, change.cause) {
            // The replacement arrives as its own event
            (true, ChangeCause::Overwrite) => None,
            (true, _) => Some(MirrorEvent::Removed),
            (false, _) => AccessToken::new(change.cookie.value).map(MirrorEvent::Set),
        }
    }
}

/// Guard for a listener task; aborts it on drop.
pub struct Listener {
    handle: JoinHandle<()>,
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
