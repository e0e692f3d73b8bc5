//! Scrobbles tracks played in the macOS Music player.
//!
//! Playback notifications from the player drive a [`MediaMonitor`](media_monitor::MediaMonitor)
//! which sends "now playing" updates right away and schedules a scrobble for the
//! halfway point of each track, re-checking at fire time that the same track is
//! still playing.

pub mod config;
pub mod event_loop;
pub mod identity;
pub mod listener;
pub mod media_monitor;
pub mod player;
pub mod policy;
pub mod scrobbler;
pub mod text_cleanup;
pub mod timer;
pub mod track;
