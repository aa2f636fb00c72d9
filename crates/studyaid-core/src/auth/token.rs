use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque bearer credential issued by the backend at login.
///
/// The value is never printed by `Debug`; use [`AccessToken::as_str`] when
/// it has to go on the wire.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token. Blank strings are not tokens.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<{} bytes>)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_is_not_a_token() {
        assert!(AccessToken::new("").is_none());
        assert!(AccessToken::new("   ").is_none());
        assert!(AccessToken::new("abc123").is_some());
    }

    #[test]
    fn test_debug_hides_value() {
        let token = AccessToken::new("super-secret").unwrap();
        let debug = format!("{:?}", token);
        assert!(!debug.contains("super-secret"));
        assert_eq!(debug, "AccessToken(<12 bytes>)");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let token = AccessToken::new("abc123").unwrap();
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"abc123\"");
    }
}
