//! Cookie handling for the web app origin.
//!
//! This module provides:
//! - `CookieJar`: a URL-scoped cookie jar with change events, optional file
//!   persistence, and a `reqwest::cookie::CookieStore` implementation
//! - `CookiePolicy`: the single policy used to write the session cookie
//! - `CookieMirror`: the access token as seen through the jar, tolerant of
//!   the jar being unavailable

pub mod jar;
pub mod mirror;
pub mod policy;

pub use jar::{ChangeCause, CookieChange, CookieJar, StoredCookie};
pub use mirror::{CookieMirror, Listener, MirrorEvent, MirrorEvents};
pub use policy::{CookiePolicy, SameSite};
