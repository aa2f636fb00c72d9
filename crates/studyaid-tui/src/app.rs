//! Application state management for the StudyAid terminal client.
//!
//! The visible screen follows the session router's [`SessionState`]: a splash
//! while checking, the login form when signed out and the session screen
//! when signed in. Network work runs in background tasks that report back
//! through an MPSC channel polled by the main loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

use studyaid_core::auth::StorageChange;
use studyaid_core::{
    ApiClient, Config, LoginOutcome, SessionRouter, SessionState, SessionStore, User,
};

use crate::services::Services;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 120;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// UI State Types
// ============================================================================

/// Overlay and lifecycle state, independent of the session screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ConfirmingLogout,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

/// Profile panel contents
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    Loading,
    Loaded(User),
    Failed(String),
}

// ============================================================================
// Background Task Results
// ============================================================================

enum BackgroundResult {
    Login(Result<LoginOutcome, String>),
    Profile(Result<User, String>),
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub config: Config,
    router: Arc<SessionRouter>,
    api: ApiClient,

    pub state: AppState,
    pub session: SessionState,
    session_rx: watch::Receiver<SessionState>,
    store_rx: broadcast::Receiver<StorageChange>,
    pub last_change: Option<DateTime<Local>>,

    // Login form
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub login_in_progress: bool,

    // Session screen
    pub profile: Option<Profile>,
    pub token_present: bool,
    pub cookie_present: bool,
    pub status_message: Option<String>,

    bg_rx: mpsc::Receiver<BackgroundResult>,
    bg_tx: mpsc::Sender<BackgroundResult>,
}

impl App {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let services = Services::build(&config)?;
        Ok(Self::from_parts(config, services.router, services.api))
    }

    pub fn from_parts(config: Config, router: Arc<SessionRouter>, api: ApiClient) -> Self {
        let (bg_tx, bg_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let session_rx = router.subscribe();
        let session = *session_rx.borrow();
        let store_rx = router.store().subscribe();
        let login_email = config.last_email.clone().unwrap_or_default();

        Self {
            config,
            router,
            api,

            state: AppState::Normal,
            session,
            session_rx,
            store_rx,
            last_change: None,

            login_focus: if login_email.is_empty() {
                LoginFocus::Email
            } else {
                LoginFocus::Password
            },
            login_email,
            login_password: String::new(),
            login_error: None,
            login_in_progress: false,

            profile: None,
            token_present: false,
            cookie_present: false,
            status_message: None,

            bg_rx,
            bg_tx,
        }
    }

    /// Start following the session.
    pub async fn start(&mut self) {
        self.router.mount().await;
        self.check_background_tasks().await;
    }

    /// Stop the sync loop and remember the last email.
    pub async fn shutdown(&mut self) {
        self.router.unmount().await;
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval()
    }

    pub fn cookie_origin(&self) -> &str {
        self.router.mirror().origin().as_str()
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Attempt login with the credentials from the login form
    pub fn attempt_login(&mut self) {
        if self.login_in_progress {
            return;
        }
        let email = self.login_email.trim().to_string();
        if email.is_empty() || self.login_password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return;
        }

        self.login_error = None;
        self.login_in_progress = true;
        self.config.last_email = Some(email.clone());

        let router = self.router.clone();
        let api = self.api.clone();
        let password = std::mem::take(&mut self.login_password);
        let tx = self.bg_tx.clone();
        tokio::spawn(async move {
            let result = router
                .login(&api, &email, &password)
                .await
                .map_err(|e| {
                    error!(error = %e, "Login failed");
                    e.user_message()
                });
            if tx.send(BackgroundResult::Login(result)).await.is_err() {
                debug!("App gone before login finished");
            }
        });
    }

    pub async fn logout(&mut self) {
        self.router.logout().await;
        self.state = AppState::Normal;
        info!("Logged out from the terminal client");
    }

    /// Fetch the profile for the stored token in the background.
    pub async fn refresh_profile(&mut self) {
        let Some(token) = self.router.store().get().await else {
            self.profile = None;
            return;
        };

        self.profile = Some(Profile::Loading);
        let api = self.api.clone();
        let tx = self.bg_tx.clone();
        tokio::spawn(async move {
            let result = api.current_user(&token).await.map_err(|e| {
                warn!(error = %e, "Failed to fetch profile");
                e.user_message()
            });
            let _ = tx.send(BackgroundResult::Profile(result)).await;
        });
    }

    async fn refresh_indicators(&mut self) {
        self.token_present = self.router.store().is_present().await;
        self.cookie_present = self.router.mirror().read().is_some();
    }

    // =========================================================================
    // Main loop hooks
    // =========================================================================

    /// Apply session transitions and finished background work.
    pub async fn check_background_tasks(&mut self) {
        if self.session_rx.has_changed().unwrap_or(false) {
            let next = *self.session_rx.borrow_and_update();
            self.on_session_change(next).await;
        }

        // Token swaps that keep the session state
        if self.token_changed() {
            self.last_change = Some(Local::now());
            self.refresh_indicators().await;
        }

        let mut results = Vec::new();
        while let Ok(result) = self.bg_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_background_result(result);
        }
    }

    fn token_changed(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.store_rx.try_recv() {
                Ok(change) => changed |= SessionStore::is_token_change(&change),
                Err(TryRecvError::Lagged(_)) => changed = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return changed,
            }
        }
    }

    async fn on_session_change(&mut self, next: SessionState) {
        if next == self.session && self.last_change.is_some() {
            return;
        }
        debug!(from = ?self.session, to = ?next, "Session screen change");
        self.session = next;
        self.last_change = Some(Local::now());
        self.refresh_indicators().await;

        match next {
            SessionState::Authenticated => {
                self.login_error = None;
                self.refresh_profile().await;
            }
            SessionState::Unauthenticated => {
                // Signed out here or elsewhere; back to the form without a message
                self.profile = None;
                self.login_password.clear();
                self.login_focus = if self.login_email.is_empty() {
                    LoginFocus::Email
                } else {
                    LoginFocus::Password
                };
                if self.state == AppState::ConfirmingLogout {
                    self.state = AppState::Normal;
                }
            }
            SessionState::Checking => {}
        }
    }

    fn process_background_result(&mut self, result: BackgroundResult) {
        match result {
            BackgroundResult::Login(result) => {
                self.login_in_progress = false;
                match result {
                    Ok(LoginOutcome::SignedIn { user }) => {
                        if let Some(user) = user {
                            self.profile = Some(Profile::Loaded(user));
                        }
                        self.status_message = None;
                        info!("Login successful");
                    }
                    Ok(LoginOutcome::Discarded) => {}
                    Err(message) => {
                        self.login_error = Some(message);
                        self.login_focus = LoginFocus::Password;
                    }
                }
            }
            BackgroundResult::Profile(result) => {
                if !self.session.is_authenticated() {
                    return;
                }
                self.profile = Some(match result {
                    Ok(user) => Profile::Loaded(user),
                    Err(message) => Profile::Failed(message),
                });
            }
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if an email character should be accepted
pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
