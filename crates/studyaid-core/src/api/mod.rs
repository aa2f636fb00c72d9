//! REST client for the StudyAid backend.
//!
//! Covers the auth routes (login, registration, password reset) and the
//! profile endpoint. Login returns the bearer token that the session router
//! stores; every other call authenticates with that token.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
