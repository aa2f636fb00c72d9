//! Login, registration and password reset against a mock backend.

use std::sync::Arc;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use studyaid_core::cookies::CookiePolicy;
use studyaid_core::models::RegisterRequest;
use studyaid_core::{
    AccessToken, ApiClient, ApiError, CookieJar, CookieMirror, LocalStorage, LoginOutcome,
    SessionRouter, SessionState, SessionStore,
};

fn user_json() -> serde_json::Value {
    json!({
        "id": 1,
        "username": "ada",
        "email": "ada@example.com",
        "is_admin": false,
        "last_login": null
    })
}

fn router(jar: Arc<CookieJar>) -> SessionRouter {
    let mirror = CookieMirror::new(
        jar,
        Url::parse("http://localhost:3000").unwrap(),
        CookiePolicy::default(),
    );
    SessionRouter::new(SessionStore::new(LocalStorage::memory()), mirror)
}

#[tokio::test]
async fn test_login_signs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "ada@example.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "abc123",
            "user": user_json()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), None).unwrap();
    let jar = Arc::new(CookieJar::new());
    let router = router(jar);
    router.mount().await;

    let outcome = router.login(&api, "ada@example.com", "secret").await.unwrap();
    match outcome {
        LoginOutcome::SignedIn { user } => assert_eq!(user.unwrap().username, "ada"),
        other => panic!("unexpected {:?}", other),
    }

    let expected = AccessToken::new("abc123");
    assert_eq!(router.store().get().await, expected);
    assert_eq!(router.mirror().read(), expected);
    assert_eq!(router.state(), SessionState::Authenticated);
    router.unmount().await;
}

#[tokio::test]
async fn test_rejected_login_leaves_session_alone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), None).unwrap();
    let router = router(Arc::new(CookieJar::new()));
    router.mount().await;

    let err = router.login(&api, "ada@example.com", "wrong").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Invalid email or password");
    assert_eq!(router.store().get().await, None);
    assert_eq!(router.state(), SessionState::Unauthenticated);
    router.unmount().await;
}

#[tokio::test]
async fn test_login_after_unmount_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "abc123", "user": user_json()}))
                .set_delay(std::time::Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), None).unwrap();
    let router = Arc::new(router(Arc::new(CookieJar::new())));
    router.mount().await;

    let pending = {
        let router = router.clone();
        tokio::spawn(async move { router.login(&api, "ada@example.com", "secret").await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    router.unmount().await;

    let outcome = pending.await.unwrap().unwrap();
    assert_eq!(outcome, LoginOutcome::Discarded);
    assert_eq!(router.store().get().await, None);
    assert_eq!(router.mirror().read(), None);
}

#[tokio::test]
async fn test_empty_token_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": ""})))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), None).unwrap();
    let err = api.login("ada@example.com", "secret").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_register_returns_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(user_json()))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), None).unwrap();
    let user = api
        .register(&RegisterRequest {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.email, "ada@example.com");
}

#[tokio::test]
async fn test_register_validation_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"username": ["Username already exists"]})),
        )
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), None).unwrap();
    let err = api
        .register(&RegisterRequest {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "username: Username already exists");
}

#[tokio::test]
async fn test_password_reset_flow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/reset-password-request"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Reset token generated", "token": "reset-tok"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/reset-password"))
        .and(body_json(json!({"token": "reset-tok", "new_password": "new-secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Password reset successfully",
            "user": user_json()
        })))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), None).unwrap();
    let issued = api.request_password_reset("ada@example.com").await.unwrap();
    assert_eq!(issued.token, "reset-tok");

    let done = api.reset_password(&issued.token, "new-secret").await.unwrap();
    assert_eq!(done.message, "Password reset successfully");
    assert_eq!(done.user.unwrap().username, "ada");
}

#[tokio::test]
async fn test_reset_request_unknown_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/reset-password-request"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "User not found"})))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), None).unwrap();
    let err = api.request_password_reset("nobody@example.com").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.user_message(), "User not found");
}

#[tokio::test]
async fn test_current_user_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), None).unwrap();
    let user = api
        .current_user(&AccessToken::new("abc123").unwrap())
        .await
        .unwrap();
    assert_eq!(user.id, 1);
}

#[tokio::test]
async fn test_backend_cookies_land_in_jar() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "backend_session=xyz; Path=/")
                .set_body_json(json!({"access_token": "abc123"})),
        )
        .mount(&server)
        .await;

    let jar = Arc::new(CookieJar::new());
    let api = ApiClient::new(&server.uri(), Some(jar.clone())).unwrap();
    api.login("ada@example.com", "secret").await.unwrap();

    let backend = Url::parse(&server.uri()).unwrap();
    assert_eq!(
        jar.get(&backend, "backend_session").map(|c| c.value),
        Some("xyz".to_string())
    );
}
