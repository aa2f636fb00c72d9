use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;

use super::jar::{expiry_after, StoredCookie};

/// Default session cookie name, read by the web app
pub const DEFAULT_COOKIE_NAME: &str = "access_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    #[default]
    Lax,
    Strict,
    None,
    Unspecified,
}

impl SameSite {
    pub fn as_attribute(&self) -> Option<&'static str> {
        match self {
            SameSite::Lax => Some("Lax"),
            SameSite::Strict => Some("Strict"),
            SameSite::None => Some("None"),
            SameSite::Unspecified => None,
        }
    }
}

/// How the session cookie is written. One policy for every write path.
///
/// Defaults: `access_token`, path `/`, `SameSite=Lax`, host-only, no expiry
/// (a session cookie), not `Secure` and not `HttpOnly` so the web app can
/// read it from script on plain-http development origins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookiePolicy {
    pub name: String,
    pub path: String,
    pub same_site: SameSite,
    /// `None` writes a host-only cookie for the web app host
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    /// `None` writes a session cookie
    pub max_age_secs: Option<i64>,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            path: "/".to_string(),
            same_site: SameSite::Lax,
            domain: None,
            secure: false,
            http_only: false,
            max_age_secs: None,
        }
    }
}

impl CookiePolicy {
    /// Build the cookie for `value` as it should be stored for `origin`.
    /// Returns `None` if the origin has no host.
    pub fn cookie_for(&self, origin: &Url, value: &str) -> Option<StoredCookie> {
        let host = origin.host_str()?.to_ascii_lowercase();
        let (domain, host_only) = match self.domain.as_deref() {
            Some(d) => (d.trim_start_matches('.').to_ascii_lowercase(), false),
            None => (host, true),
        };
        let now = Utc::now();
        Some(StoredCookie {
            name: self.name.clone(),
            value: value.to_string(),
            domain,
            host_only,
            path: if self.path.is_empty() {
                "/".to_string()
            } else {
                self.path.clone()
            },
            same_site: self.same_site,
            secure: self.secure,
            http_only: self.http_only,
            expires: self.max_age_secs.and_then(|secs| expiry_after(now, secs)),
            created_at: now,
        })
    }
}
