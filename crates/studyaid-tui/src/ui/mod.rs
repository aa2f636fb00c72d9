//! Terminal UI module using ratatui.
//!
//! - `render`: frame rendering for the splash, login and session screens
//! - `input`: keyboard event handling
//! - `styles`: color scheme and text styling

pub mod input;
pub mod render;
pub mod styles;
