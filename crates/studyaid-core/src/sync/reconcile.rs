use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::auth::SessionStore;
use crate::config::MIN_POLL_INTERVAL_MS;
use crate::cookies::{CookieMirror, MirrorEvent, MirrorEvents};

/// Upper bound on how long the session store may disagree with the cookie
/// when no cookie event reaches us.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Shortest accepted poll interval
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(MIN_POLL_INTERVAL_MS);

/// What one reconciliation did to the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// The cookie's token was written into the store
    Adopted,
    /// The cookie was absent and the store held a token
    Cleared,
    /// The store already agreed with the cookie
    Unchanged,
    /// Cancelled before writing
    Skipped,
}

/// Keeps the session store in line with the session cookie.
#[derive(Clone)]
pub struct SyncLoop {
    store: SessionStore,
    mirror: CookieMirror,
    interval: Duration,
    reports: Option<Arc<watch::Sender<Reconciled>>>,
}

impl SyncLoop {
    pub fn new(store: SessionStore, mirror: CookieMirror) -> Self {
        Self {
            store,
            mirror,
            interval: DEFAULT_POLL_INTERVAL,
            reports: None,
        }
    }

    /// Poll every `interval`, raised to [`MIN_POLL_INTERVAL`] if shorter.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Send the outcome of every periodic reconciliation to `reports`, even
    /// when nothing changed. The store only announces its own writes, so
    /// this is how a consumer learns that another process already brought
    /// the store in line with the cookie.
    pub fn with_reports(mut self, reports: watch::Sender<Reconciled>) -> Self {
        self.reports = Some(Arc::new(reports));
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Copy the cookie into the store once: present overwrites, absent
    /// clears. The store is never written back to the cookie.
    pub async fn reconcile(&self) -> Reconciled {
        self.reconcile_unless(&CancellationToken::new()).await
    }

    async fn reconcile_unless(&self, cancel: &CancellationToken) -> Reconciled {
        let observed = self.mirror.read();
        let current = self.store.get().await;
        if cancel.is_cancelled() {
            return Reconciled::Skipped;
        }

        match observed {
            Some(token) => {
                let outcome = if current.as_ref() == Some(&token) {
                    Reconciled::Unchanged
                } else {
                    Reconciled::Adopted
                };
                self.store.set(&token).await;
                outcome
            }
            None => {
                self.store.clear().await;
                if current.is_some() {
                    Reconciled::Cleared
                } else {
                    Reconciled::Unchanged
                }
            }
        }
    }

    /// Run in the background: reconcile now, on every cookie event, and on
    /// every tick. Needs a tokio runtime.
    pub fn start(self) -> SyncHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(cancel.clone()));
        SyncHandle {
            cancel,
            task: Some(task),
        }
    }

    async fn run(self, cancel: CancellationToken) {
        let mut events = self.mirror.events();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(
            interval_ms = self.interval.as_millis() as u64,
            cookies = self.mirror.is_available(),
            "Session sync started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(event) = next_event(&mut events) => {
                    self.apply(event, &cancel).await;
                }
                _ = ticker.tick() => {
                    self.mirror.refresh();
                    let outcome = self.reconcile_unless(&cancel).await;
                    trace!(?outcome, "Session sync tick");
                    self.report(outcome);
                }
            }
        }

        debug!("Session sync stopped");
    }

    async fn apply(&self, event: MirrorEvent, cancel: &CancellationToken) {
        if cancel.is_cancelled() {
            return;
        }
        match event {
            MirrorEvent::Removed => {
                debug!("Session cookie removed, clearing session store");
                self.store.clear().await;
            }
            MirrorEvent::Set(token) => {
                self.store.set(&token).await;
            }
            MirrorEvent::Resync => {
                let outcome = self.reconcile_unless(cancel).await;
                debug!(?outcome, "Session resynced after missed cookie events");
                self.report(outcome);
            }
        }
    }

    fn report(&self, outcome: Reconciled) {
        if outcome == Reconciled::Skipped {
            return;
        }
        if let Some(reports) = &self.reports {
            reports.send_replace(outcome);
        }
    }
}

/// Next cookie event, or never when there is no cookie capability.
async fn next_event(events: &mut Option<MirrorEvents>) -> Option<MirrorEvent> {
    let event = match events.as_mut() {
        Some(rx) => rx.recv().await,
        None => return std::future::pending().await,
    };
    if event.is_none() {
        *events = None;
    }
    event
}

/// Handle to a running [`SyncLoop`]. Dropping it stops the loop.
pub struct SyncHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Stop the loop and wait for it to finish. Once this returns, the loop
    /// performs no further writes.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use url::Url;

    use super::*;
    use crate::auth::{AccessToken, LocalStorage};
    use crate::cookies::{CookieJar, CookiePolicy};

    fn token(s: &str) -> AccessToken {
        AccessToken::new(s).unwrap()
    }

    fn setup() -> (SessionStore, CookieMirror) {
        let store = SessionStore::new(LocalStorage::memory());
        let mirror = CookieMirror::new(
            Arc::new(CookieJar::new()),
            Url::parse("http://localhost:3000").unwrap(),
            CookiePolicy::default(),
        );
        (store, mirror)
    }

    #[tokio::test]
    async fn test_reconcile_adopts_cookie() {
        let (store, mirror) = setup();
        mirror.write(&token("abc123"));

        let sync = SyncLoop::new(store.clone(), mirror);
        assert_eq!(sync.reconcile().await, Reconciled::Adopted);
        assert_eq!(store.get().await, Some(token("abc123")));
        assert_eq!(sync.reconcile().await, Reconciled::Unchanged);
    }

    #[tokio::test]
    async fn test_reconcile_clears_without_cookie() {
        let (store, mirror) = setup();
        store.set(&token("stale")).await;

        let sync = SyncLoop::new(store.clone(), mirror);
        assert_eq!(sync.reconcile().await, Reconciled::Cleared);
        assert_eq!(store.get().await, None);
        assert_eq!(sync.reconcile().await, Reconciled::Unchanged);
    }

    #[tokio::test]
    async fn test_reconcile_never_writes_cookie() {
        let (store, mirror) = setup();
        store.set(&token("local-only")).await;

        let sync = SyncLoop::new(store, mirror.clone());
        sync.reconcile().await;
        assert_eq!(mirror.read(), None);
    }

    #[tokio::test]
    async fn test_cancelled_reconcile_skips_write() {
        let (store, mirror) = setup();
        mirror.write(&token("abc123"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let sync = SyncLoop::new(store.clone(), mirror);
        assert_eq!(sync.reconcile_unless(&cancel).await, Reconciled::Skipped);
        assert_eq!(store.get().await, None);
    }

    #[test]
    fn test_interval_is_clamped() {
        let (store, mirror) = setup();
        let sync = SyncLoop::new(store, mirror).with_interval(Duration::ZERO);
        assert_eq!(sync.interval(), MIN_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_loop_runs() {
        let (store, mirror) = setup();
        mirror.write(&token("abc123"));
        let handle = SyncLoop::new(store.clone(), mirror)
            .with_interval(Duration::ZERO)
            .start();

        tokio::time::sleep(MIN_POLL_INTERVAL * 2).await;
        assert!(handle.is_running());
        assert_eq!(store.get().await, Some(token("abc123")));
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_report_even_when_unchanged() {
        let (store, mirror) = setup();
        let (reports, mut outcomes) = watch::channel(Reconciled::Skipped);
        let handle = SyncLoop::new(store, mirror)
            .with_interval(MIN_POLL_INTERVAL)
            .with_reports(reports)
            .start();

        // The first tick fires immediately
        outcomes.changed().await.unwrap();
        assert_eq!(*outcomes.borrow_and_update(), Reconciled::Unchanged);

        outcomes.changed().await.unwrap();
        assert_eq!(*outcomes.borrow_and_update(), Reconciled::Unchanged);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_task() {
        let (store, mirror) = setup();
        let handle = SyncLoop::new(store, mirror).start();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(handle.is_running());
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_loop() {
        let (store, mirror) = setup();
        let handle = SyncLoop::new(store.clone(), mirror.clone()).start();
        tokio::time::sleep(Duration::from_millis(1)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_millis(1)).await;

        mirror.write(&token("after-drop"));
        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 2).await;
        assert_eq!(store.get().await, None);
    }
}
