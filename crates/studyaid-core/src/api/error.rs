use thiserror::Error;

use crate::models::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rejected by server: {0}")]
    Validation(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }

    /// The most specific message in a backend error body.
    ///
    /// The backend answers with `{"error": ..}`, `{"message": ..}` or a
    /// field map such as `{"email": ["Not a valid email address."]}`.
    fn extract_message(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let object = value.as_object()?;

        for key in ["error", "message", "msg"] {
            if let Some(text) = object.get(key).and_then(|v| v.as_str()) {
                return Some(text.to_string());
            }
        }

        object.iter().find_map(|(field, messages)| {
            let first = match messages {
                serde_json::Value::Array(items) => items.first()?.as_str()?,
                serde_json::Value::String(text) => text.as_str(),
                _ => return None,
            };
            Some(format!("{}: {}", field, first))
        })
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::extract_message(body).unwrap_or_else(|| Self::truncate_body(body));
        match status.as_u16() {
            400 | 409 | 422 => ApiError::Validation(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Short text for the login form's error line
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized(_) => "Invalid email or password".to_string(),
            ApiError::Validation(msg) | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Invalid(err) => err.to_string(),
            ApiError::AccessDenied(_) => "Access denied".to_string(),
            ApiError::RateLimited => "Too many attempts. Please wait and try again.".to_string(),
            ApiError::ServerError(_) => "Server error. Please try again later.".to_string(),
            ApiError::NetworkError(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::NetworkError(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            ApiError::InvalidResponse(_) => "Unexpected response from server".to_string(),
        }
    }
}
