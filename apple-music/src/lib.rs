//! Read-only access to the macOS Music player.
//!
//! Every query runs a small JavaScript for Automation snippet through
//! `osascript` and decodes its JSON output. Nothing here controls playback.

mod apple_music;
mod error;
mod script_controller;
mod track;

pub use apple_music::{AppleMusic, PlayerState};
pub use error::Error;
pub use track::Track;
