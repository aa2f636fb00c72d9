//! Session consumer: decides whether the signed-in or signed-out screens are
//! shown, and owns login and logout.
//!
//! The router only ever exposes a [`SessionState`]; storage failures and
//! cookie races surface as a plain transition to `Unauthenticated`.

pub mod router;

pub use router::{LoginOutcome, SessionRouter, SessionState};
