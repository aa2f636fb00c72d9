use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::AccessToken;
use crate::cookies::CookieJar;
use crate::models::{
    LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest, ResetRequest,
    ResetRequestResponse, ResetResponse, User,
};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) GET requests.
/// Auth POSTs are never retried.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 500;

#[derive(Debug, Deserialize)]
struct RawLoginResponse {
    access_token: String,
    #[serde(default)]
    user: Option<User>,
}

/// API client for the StudyAid backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url`. With a jar, cookies set by the backend
    /// are stored there and sent back on later requests.
    pub fn new(base_url: &str, jar: Option<Arc<CookieJar>>) -> Result<Self, ApiError> {
        let mut builder = Client::builder().timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS));
        if let Some(jar) = jar {
            builder = builder.cookie_provider(jar);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        let response = Self::check_response(response).await?;
        Self::parse(response, path).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &AccessToken) -> Result<T, ApiError> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .bearer_auth(token.as_str())
                .send()
                .await?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(ApiError::RateLimited);
                }
                warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
                continue;
            }

            let response = Self::check_response(response).await?;
            return Self::parse(response, path).await;
        }
    }

    // ===== Auth =====

    /// Exchange credentials for an access token.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        request.validate()?;

        let raw: RawLoginResponse = self.post("auth/login", &request).await?;
        let access_token = AccessToken::new(raw.access_token)
            .ok_or_else(|| ApiError::InvalidResponse("Login response has an empty token".into()))?;

        debug!(email = %request.email, "Login accepted");
        Ok(LoginResponse {
            access_token,
            user: raw.user,
        })
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        request.validate()?;
        self.post("auth/register", request).await
    }

    /// Ask for a password reset token for `email`.
    pub async fn request_password_reset(&self, email: &str) -> Result<ResetRequestResponse, ApiError> {
        let request = ResetRequest {
            email: email.trim().to_string(),
        };
        request.validate()?;
        self.post("auth/reset-password-request", &request).await
    }

    /// Set a new password using a reset token.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<ResetResponse, ApiError> {
        let request = ResetPasswordRequest {
            token: token.trim().to_string(),
            new_password: new_password.to_string(),
        };
        request.validate()?;
        self.post("auth/reset-password", &request).await
    }

    // ===== Users =====

    /// Profile of the user the token belongs to
    pub async fn current_user(&self, token: &AccessToken) -> Result<User, ApiError> {
        self.get("users/me", token).await
    }
}
