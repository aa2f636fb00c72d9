use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::User;
use crate::auth::AccessToken;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 6;

/// Input rejected before it is sent, with the same rules the backend uses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username must be between 3 and 50 characters")]
    UsernameLength,

    #[error("Not a valid email address")]
    InvalidEmail,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Password is required")]
    PasswordMissing,

    #[error("Reset token is required")]
    TokenMissing,
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidEmail),
    }
}

fn check_new_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        Err(ValidationError::PasswordTooShort)
    } else {
        Ok(())
    }
}

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_email(&self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::PasswordMissing);
        }
        Ok(())
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub access_token: AccessToken,
    pub user: Option<User>,
}

#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.username.trim().chars().count();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
            return Err(ValidationError::UsernameLength);
        }
        check_email(&self.email)?;
        check_new_password(&self.password)
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `/api/auth/reset-password-request`
#[derive(Debug, Clone, Serialize)]
pub struct ResetRequest {
    pub email: String,
}

impl ResetRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_email(&self.email)
    }
}

/// The backend hands the reset token straight back instead of emailing it.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetRequestResponse {
    #[serde(default)]
    pub message: String,
    pub token: String,
}

#[derive(Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.token.trim().is_empty() {
            return Err(ValidationError::TokenMissing);
        }
        check_new_password(&self.new_password)
    }
}

impl fmt::Debug for ResetPasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPasswordRequest")
            .field("token", &"<redacted>")
            .field("new_password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetResponse {
    #[serde(default)]
    pub message: String,
    pub user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_register_validation() {
        assert_eq!(register("ada", "ada@example.com", "secret").validate(), Ok(()));
        assert_eq!(
            register("ab", "ada@example.com", "secret").validate(),
            Err(ValidationError::UsernameLength)
        );
        assert_eq!(
            register(&"x".repeat(51), "ada@example.com", "secret").validate(),
            Err(ValidationError::UsernameLength)
        );
        assert_eq!(
            register("ada", "not-an-email", "secret").validate(),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            register("ada", "ada@example.com", "short").validate(),
            Err(ValidationError::PasswordTooShort)
        );
    }

    #[test]
    fn test_login_validation() {
        let ok = LoginRequest {
            email: "ada@example.com".to_string(),
            password: "x".to_string(),
        };
        assert_eq!(ok.validate(), Ok(()));

        let no_password = LoginRequest {
            email: "ada@example.com".to_string(),
            password: String::new(),
        };
        assert_eq!(no_password.validate(), Err(ValidationError::PasswordMissing));

        let bad_email = LoginRequest {
            email: "@example.com".to_string(),
            password: "x".to_string(),
        };
        assert_eq!(bad_email.validate(), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_reset_password_validation() {
        let missing = ResetPasswordRequest {
            token: " ".to_string(),
            new_password: "longenough".to_string(),
        };
        assert_eq!(missing.validate(), Err(ValidationError::TokenMissing));

        let short = ResetPasswordRequest {
            token: "tok".to_string(),
            new_password: "123".to_string(),
        };
        assert_eq!(short.validate(), Err(ValidationError::PasswordTooShort));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let req = register("ada", "ada@example.com", "hunter22");
        let debug = format!("{:?}", req);
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("ada@example.com"));
    }
}
