//! Data models for the StudyAid backend.
//!
//! - `User`: the signed-in user's profile
//! - Auth payloads: login, registration and password reset requests and
//!   responses

pub mod auth;
pub mod user;

pub use auth::{
    LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest,
    ResetRequest, ResetRequestResponse, ResetResponse, ValidationError,
};
pub use user::User;
