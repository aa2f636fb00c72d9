//! URL-scoped cookie jar.
//!
//! Cookies are keyed by `(domain, path, name)` and matched against request
//! URLs with the usual domain-match and path-match rules. Every mutation is
//! announced as a [`CookieChange`], with the same shape as a browser's
//! cookie `changed` event: overwriting a cookie first reports the old one as
//! removed with [`ChangeCause::Overwrite`], then the new one as set.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};
use url::Url;

use super::policy::SameSite;

/// Capacity of the change broadcast
const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    /// Lowercase, no leading dot
    pub domain: String,
    pub host_only: bool,
    pub path: String,
    #[serde(default)]
    pub same_site: SameSite,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    /// `None` for session cookies
    pub expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl StoredCookie {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.map(|at| at <= now).unwrap_or(false)
    }

    fn same_key(&self, other: &StoredCookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }

    /// Equal ignoring creation time
    fn same_content(&self, other: &StoredCookie) -> bool {
        self.same_key(other)
            && self.value == other.value
            && self.host_only == other.host_only
            && self.same_site == other.same_site
            && self.secure == other.secure
            && self.http_only == other.http_only
            && self.expires == other.expires
    }

    /// Whether this cookie would be sent with a request to `url`.
    pub fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        if self.secure && url.scheme() != "https" {
            return false;
        }
        domain_matches(&self.domain, self.host_only, &host.to_ascii_lowercase())
            && path_matches(&self.path, url.path())
    }
}

impl std::fmt::Debug for StoredCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCookie")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("host_only", &self.host_only)
            .field("path", &self.path)
            .field("expires", &self.expires)
            .finish_non_exhaustive()
    }
}

/// Why a cookie changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    /// Set or removed by a direct call, a `Set-Cookie` header, or another
    /// process (seen on reload)
    Explicit,
    /// Removed because a cookie with the same key replaced it
    Overwrite,
    /// Removed because its expiry passed
    Expired,
    /// Removed by a write whose expiry was already in the past
    ExpiredOverwrite,
}

#[derive(Debug, Clone)]
pub struct CookieChange {
    pub cookie: StoredCookie,
    pub removed: bool,
    pub cause: ChangeCause,
}

/// In-process cookie jar, optionally persisted as JSON.
///
/// Share it as `Arc<CookieJar>`: the same jar backs the cookie mirror and
/// the HTTP client's cookie provider.
pub struct CookieJar {
    cookies: RwLock<Vec<StoredCookie>>,
    path: Option<PathBuf>,
    changes: broadcast::Sender<CookieChange>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    /// An empty jar that lives only in memory
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            cookies: RwLock::new(Vec::new()),
            path: None,
            changes,
        }
    }

    /// A jar backed by `path`. An unreadable file starts the jar empty.
    pub fn persistent(path: PathBuf) -> Self {
        let cookies = match Self::read_file(&path) {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to load cookie jar, starting empty");
                Vec::new()
            }
        };
        let now = Utc::now();
        let cookies: Vec<_> = cookies.into_iter().filter(|c| !c.is_expired(now)).collect();
        debug!(count = cookies.len(), "Cookie jar loaded");

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            cookies: RwLock::new(cookies),
            path: Some(path),
            changes,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.path.is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CookieChange> {
        self.changes.subscribe()
    }

    pub fn len(&self) -> usize {
        self.read_cookies().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The cookie named `name` that would be sent to `url`, preferring the
    /// longest path. Expired cookies are purged first.
    pub fn get(&self, url: &Url, name: &str) -> Option<StoredCookie> {
        self.purge_expired();
        self.read_cookies()
            .iter()
            .filter(|c| c.name == name && c.matches(url))
            .max_by_key(|c| c.path.len())
            .cloned()
    }

    /// Every live cookie that would be sent to `url`
    pub fn get_all(&self, url: &Url) -> Vec<StoredCookie> {
        self.purge_expired();
        let mut matching: Vec<_> = self
            .read_cookies()
            .iter()
            .filter(|c| c.matches(url))
            .cloned()
            .collect();
        // Longer paths first, then older first
        matching.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then(a.created_at.cmp(&b.created_at))
        });
        matching
    }

    /// Store `cookie` on behalf of `url`. Rejects cookies whose domain the
    /// URL could not set. A cookie that is already expired deletes any
    /// cookie with the same key. Returns whether the jar changed.
    pub fn set(&self, url: &Url, cookie: StoredCookie) -> bool {
        let Some(host) = url.host_str().map(|h| h.to_ascii_lowercase()) else {
            return false;
        };
        if !domain_matches(&cookie.domain, false, &host) {
            warn!(cookie = %cookie.name, domain = %cookie.domain, host = %host, "Rejected cookie for foreign domain");
            return false;
        }

        let now = Utc::now();
        self.mutate(|cookies, changes| {
            let existing = cookies.iter().position(|c| c.same_key(&cookie));

            if cookie.is_expired(now) {
                if let Some(index) = existing {
                    let old = cookies.remove(index);
                    changes.push(CookieChange {
                        cookie: old,
                        removed: true,
                        cause: ChangeCause::ExpiredOverwrite,
                    });
                }
                return;
            }

            if let Some(index) = existing {
                if cookies[index].same_content(&cookie) {
                    return;
                }
                let old = std::mem::replace(&mut cookies[index], cookie.clone());
                changes.push(CookieChange {
                    cookie: old,
                    removed: true,
                    cause: ChangeCause::Overwrite,
                });
            } else {
                cookies.push(cookie.clone());
            }
            changes.push(CookieChange {
                cookie,
                removed: false,
                cause: ChangeCause::Explicit,
            });
        })
    }

    /// Remove every cookie named `name` that would be sent to `url`.
    /// Returns whether anything was removed.
    pub fn remove(&self, url: &Url, name: &str) -> bool {
        self.mutate(|cookies, changes| {
            let mut index = 0;
            while index < cookies.len() {
                if cookies[index].name == name && cookies[index].matches(url) {
                    let old = cookies.remove(index);
                    changes.push(CookieChange {
                        cookie: old,
                        removed: true,
                        cause: ChangeCause::Explicit,
                    });
                } else {
                    index += 1;
                }
            }
        })
    }

    /// Apply one `Set-Cookie` header received from `url`.
    pub fn set_from_header(&self, url: &Url, header: &str) -> bool {
        match parse_set_cookie(url, header, Utc::now()) {
            Some(cookie) => self.set(url, cookie),
            None => {
                debug!("Ignoring malformed Set-Cookie header");
                false
            }
        }
    }

    /// `Cookie` request header value for `url`
    pub fn header_for(&self, url: &Url) -> Option<String> {
        let cookies = self.get_all(url);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Re-read a persistent jar from disk and announce whatever another
    /// process changed. Returns the number of changes. In-memory jars have
    /// nothing to reload.
    pub fn reload(&self) -> usize {
        let Some(path) = self.path.as_deref() else {
            return 0;
        };
        let on_disk = match Self::read_file(path) {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!(error = %e, "Failed to reload cookie jar");
                return 0;
            }
        };
        let now = Utc::now();
        let on_disk: Vec<_> = on_disk.into_iter().filter(|c| !c.is_expired(now)).collect();

        let mut changes = Vec::new();
        {
            let mut cookies = self.write_cookies();
            for current in cookies.iter() {
                match on_disk.iter().find(|c| c.same_key(current)) {
                    None => changes.push(CookieChange {
                        cookie: current.clone(),
                        removed: true,
                        cause: ChangeCause::Explicit,
                    }),
                    Some(fresh) if !fresh.same_content(current) => {
                        changes.push(CookieChange {
                            cookie: current.clone(),
                            removed: true,
                            cause: ChangeCause::Overwrite,
                        });
                        changes.push(CookieChange {
                            cookie: fresh.clone(),
                            removed: false,
                            cause: ChangeCause::Explicit,
                        });
                    }
                    Some(_) => {}
                }
            }
            for fresh in &on_disk {
                if !cookies.iter().any(|c| c.same_key(fresh)) {
                    changes.push(CookieChange {
                        cookie: fresh.clone(),
                        removed: false,
                        cause: ChangeCause::Explicit,
                    });
                }
            }
            *cookies = on_disk;
        }

        if !changes.is_empty() {
            debug!(count = changes.len(), "Cookie jar changed on disk");
        }
        let count = changes.len();
        self.announce(changes);
        count
    }

    // ===== Internals =====

    fn read_cookies(&self) -> std::sync::RwLockReadGuard<'_, Vec<StoredCookie>> {
        self.cookies.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_cookies(&self) -> std::sync::RwLockWriteGuard<'_, Vec<StoredCookie>> {
        self.cookies.write().unwrap_or_else(|e| e.into_inner())
    }

    fn purge_expired(&self) {
        let now = Utc::now();
        if !self.read_cookies().iter().any(|c| c.is_expired(now)) {
            return;
        }
        self.mutate(|cookies, changes| {
            let (expired, live): (Vec<_>, Vec<_>) =
                cookies.drain(..).partition(|c| c.is_expired(now));
            *cookies = live;
            changes.extend(expired.into_iter().map(|cookie| CookieChange {
                cookie,
                removed: true,
                cause: ChangeCause::Expired,
            }));
        });
    }

    /// Run `f` under the write lock, persist if it produced changes, then
    /// announce them after the lock is released.
    fn mutate<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut Vec<StoredCookie>, &mut Vec<CookieChange>),
    {
        let mut changes = Vec::new();
        {
            let mut cookies = self.write_cookies();
            f(&mut cookies, &mut changes);
            if !changes.is_empty() {
                self.persist(&cookies);
            }
        }
        let changed = !changes.is_empty();
        self.announce(changes);
        changed
    }

    fn announce(&self, changes: Vec<CookieChange>) {
        for change in changes {
            trace!(cookie = %change.cookie.name, removed = change.removed, cause = ?change.cause, "Cookie changed");
            let _ = self.changes.send(change);
        }
    }

    fn persist(&self, cookies: &[StoredCookie]) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        if let Err(e) = Self::write_file(path, cookies) {
            warn!(error = %e, path = %path.display(), "Failed to persist cookie jar");
        }
    }

    fn read_file(path: &Path) -> anyhow::Result<Vec<StoredCookie>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_file(path: &Path, cookies: &[StoredCookie]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(cookies)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

impl reqwest::cookie::CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            if let Ok(value) = header.to_str() {
                self.set_from_header(url, value);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.header_for(url)
            .and_then(|value| HeaderValue::from_str(&value).ok())
    }
}

// ============================================================================
// Matching and parsing
// ============================================================================

fn domain_matches(domain: &str, host_only: bool, host: &str) -> bool {
    if host_only {
        return host == domain;
    }
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

/// Directory of the request path, used when `Set-Cookie` has no `Path`
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => path[..index].to_string(),
    }
}

/// Expiry `seconds` from `now`. Zero or negative means already expired; a
/// lifetime past what a timestamp can hold never expires.
pub(crate) fn expiry_after(now: DateTime<Utc>, seconds: i64) -> Option<DateTime<Utc>> {
    if seconds <= 0 {
        return Some(now);
    }
    Duration::try_seconds(seconds).and_then(|lifetime| now.checked_add_signed(lifetime))
}

fn parse_set_cookie(url: &Url, header: &str, now: DateTime<Utc>) -> Option<StoredCookie> {
    let parsed = cookie::Cookie::parse(header.to_string()).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();

    let (domain, host_only) = match parsed.domain() {
        Some(d) if !d.trim_start_matches('.').is_empty() => {
            (d.trim_start_matches('.').to_ascii_lowercase(), false)
        }
        _ => (host, true),
    };

    let path = match parsed.path() {
        Some(p) if p.starts_with('/') => p.to_string(),
        _ => default_path(url),
    };

    // Max-Age wins over Expires
    let expires = if let Some(max_age) = parsed.max_age() {
        expiry_after(now, max_age.whole_seconds())
    } else {
        parsed
            .expires_datetime()
            .and_then(|at| DateTime::from_timestamp(at.unix_timestamp(), 0))
    };

    let same_site = match parsed.same_site() {
        Some(cookie::SameSite::Lax) => SameSite::Lax,
        Some(cookie::SameSite::Strict) => SameSite::Strict,
        Some(cookie::SameSite::None) => SameSite::None,
        None => SameSite::Unspecified,
    };

    Some(StoredCookie {
        name: parsed.name().to_string(),
        value: parsed.value().to_string(),
        domain,
        host_only,
        path,
        same_site,
        secure: parsed.secure().unwrap_or(false),
        http_only: parsed.http_only().unwrap_or(false),
        expires,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::CookiePolicy;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn session_cookie(origin: &Url, value: &str) -> StoredCookie {
        CookiePolicy::default().cookie_for(origin, value).unwrap()
    }

    #[test]
    fn test_domain_matches() {
        assert!(domain_matches("localhost", true, "localhost"));
        assert!(!domain_matches("example.com", true, "app.example.com"));
        assert!(domain_matches("example.com", false, "app.example.com"));
        assert!(domain_matches("example.com", false, "example.com"));
        assert!(!domain_matches("example.com", false, "badexample.com"));
    }

    #[test]
    fn test_path_matches() {
        assert!(path_matches("/", "/"));
        assert!(path_matches("/", "/api/auth/login"));
        assert!(path_matches("/api", "/api/users"));
        assert!(path_matches("/api/", "/api/users"));
        assert!(!path_matches("/api", "/apiary"));
        assert!(!path_matches("/api/users", "/api"));
    }

    #[test]
    fn test_default_path() {
        assert_eq!(default_path(&url("http://localhost/")), "/");
        assert_eq!(default_path(&url("http://localhost/login")), "/");
        assert_eq!(default_path(&url("http://localhost/api/auth/login")), "/api/auth");
    }

    #[test]
    fn test_set_and_get() {
        let jar = CookieJar::new();
        let origin = url("http://localhost:3000");
        assert!(jar.set(&origin, session_cookie(&origin, "abc123")));

        let found = jar.get(&url("http://localhost:3000/collections"), "access_token");
        assert_eq!(found.map(|c| c.value), Some("abc123".to_string()));
        // Cookies are not scoped by port
        assert!(jar.get(&url("http://localhost:5000/api"), "access_token").is_some());
        assert!(jar.get(&url("http://example.com"), "access_token").is_none());
    }

    #[test]
    fn test_overwrite_emits_overwrite_then_set() {
        let jar = CookieJar::new();
        let origin = url("http://localhost:3000");
        jar.set(&origin, session_cookie(&origin, "one"));
        let mut rx = jar.subscribe();

        jar.set(&origin, session_cookie(&origin, "two"));

        let first = rx.try_recv().unwrap();
        assert!(first.removed);
        assert_eq!(first.cause, ChangeCause::Overwrite);
        assert_eq!(first.cookie.value, "one");

        let second = rx.try_recv().unwrap();
        assert!(!second.removed);
        assert_eq!(second.cookie.value, "two");
    }

    #[test]
    fn test_identical_set_is_quiet() {
        let jar = CookieJar::new();
        let origin = url("http://localhost:3000");
        jar.set(&origin, session_cookie(&origin, "same"));
        let mut rx = jar.subscribe();

        assert!(!jar.set(&origin, session_cookie(&origin, "same")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_remove_emits_explicit_removal() {
        let jar = CookieJar::new();
        let origin = url("http://localhost:3000");
        jar.set(&origin, session_cookie(&origin, "abc123"));
        let mut rx = jar.subscribe();

        assert!(jar.remove(&origin, "access_token"));
        assert!(!jar.remove(&origin, "access_token"));

        let change = rx.try_recv().unwrap();
        assert!(change.removed);
        assert_eq!(change.cause, ChangeCause::Explicit);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_rejects_foreign_domain() {
        let jar = CookieJar::new();
        let mut cookie = session_cookie(&url("http://evil.test"), "x");
        cookie.host_only = false;
        assert!(!jar.set(&url("http://localhost:3000"), cookie));
        assert!(jar.is_empty());
    }

    #[test]
    fn test_expired_cookie_is_purged_on_get() {
        let jar = CookieJar::new();
        let origin = url("http://localhost:3000");
        let mut cookie = session_cookie(&origin, "abc123");
        cookie.expires = Some(Utc::now() + Duration::seconds(60));
        jar.set(&origin, cookie);

        // Age it in place
        jar.write_cookies()[0].expires = Some(Utc::now() - Duration::seconds(1));
        let mut rx = jar.subscribe();

        assert!(jar.get(&origin, "access_token").is_none());
        let change = rx.try_recv().unwrap();
        assert_eq!(change.cause, ChangeCause::Expired);
    }

    #[test]
    fn test_set_cookie_max_age_zero_deletes() {
        let jar = CookieJar::new();
        let origin = url("http://localhost:3000");
        jar.set(&origin, session_cookie(&origin, "abc123"));
        let mut rx = jar.subscribe();

        jar.set_from_header(&url("http://localhost:3000/logout"), "access_token=; Max-Age=0; Path=/");

        assert!(jar.get(&origin, "access_token").is_none());
        let change = rx.try_recv().unwrap();
        assert!(change.removed);
        assert_eq!(change.cause, ChangeCause::ExpiredOverwrite);
    }

    #[test]
    fn test_huge_max_age_never_expires() {
        let jar = CookieJar::new();
        let origin = url("http://localhost:3000");

        assert!(jar.set_from_header(&origin, "access_token=abc; Path=/; Max-Age=10000000000000"));

        let cookie = jar.get(&origin, "access_token").unwrap();
        assert_eq!(cookie.value, "abc");
        assert!(cookie.expires.is_none());
    }

    #[test]
    fn test_expiry_after() {
        let now = Utc::now();
        assert_eq!(expiry_after(now, 60), Some(now + Duration::seconds(60)));
        assert_eq!(expiry_after(now, 0), Some(now));
        assert_eq!(expiry_after(now, -5), Some(now));
        assert_eq!(expiry_after(now, i64::MAX), None);
    }

    #[test]
    fn test_parse_set_cookie_attributes() {
        let now = Utc::now();
        let cookie = parse_set_cookie(
            &url("https://app.studyaid.app/api/auth/login"),
            "access_token=jwt.value.sig; Domain=.studyaid.app; Path=/; Secure; HttpOnly; SameSite=Strict; Max-Age=60",
            now,
        )
        .unwrap();
        assert_eq!(cookie.name, "access_token");
        assert_eq!(cookie.value, "jwt.value.sig");
        assert_eq!(cookie.domain, "studyaid.app");
        assert!(!cookie.host_only);
        assert!(cookie.secure);
        assert!(cookie.http_only);
        assert_eq!(cookie.same_site, SameSite::Strict);
        assert_eq!(cookie.expires, Some(now + Duration::seconds(60)));
    }

    #[test]
    fn test_secure_cookie_needs_https() {
        let jar = CookieJar::new();
        let origin = url("https://app.studyaid.app");
        jar.set_from_header(&origin, "access_token=abc; Secure; Path=/");
        assert!(jar.get(&origin, "access_token").is_some());
        assert!(jar.get(&url("http://app.studyaid.app"), "access_token").is_none());
    }

    #[test]
    fn test_header_for_orders_longer_paths_first() {
        let jar = CookieJar::new();
        let origin = url("http://localhost:3000/app/page");
        jar.set_from_header(&origin, "a=1; Path=/");
        jar.set_from_header(&origin, "b=2; Path=/app");
        assert_eq!(jar.header_for(&origin).as_deref(), Some("b=2; a=1"));
        assert_eq!(jar.header_for(&url("http://localhost:3000/")).as_deref(), Some("a=1"));
    }

    #[test]
    fn test_persistent_jar_round_trip_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let origin = url("http://localhost:3000");

        let jar = CookieJar::persistent(path.clone());
        assert!(jar.is_persistent());
        jar.set(&origin, session_cookie(&origin, "abc123"));

        let other = CookieJar::persistent(path.clone());
        assert_eq!(
            other.get(&origin, "access_token").map(|c| c.value),
            Some("abc123".to_string())
        );

        // Another process signs out
        other.remove(&origin, "access_token");

        let mut rx = jar.subscribe();
        assert_eq!(jar.reload(), 1);
        let change = rx.try_recv().unwrap();
        assert!(change.removed);
        assert_eq!(change.cause, ChangeCause::Explicit);
        assert!(jar.get(&origin, "access_token").is_none());
    }

    #[test]
    fn test_reload_without_file_changes_is_quiet() {
        let jar = CookieJar::new();
        assert!(!jar.is_persistent());
        assert_eq!(jar.reload(), 0);
    }

    #[test]
    fn test_debug_hides_value() {
        let cookie = session_cookie(&url("http://localhost"), "secret-token");
        assert!(!format!("{:?}", cookie).contains("secret-token"));
    }
}
