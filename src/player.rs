// Live player queries
// Used at scrobble time to confirm what is actually playing.

use crate::identity::PersistentId;
use crate::track::Track;
use anyhow::{Context, Result};
use apple_music::{AppleMusic, PlayerState};

/// The player's current track at query time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentTrack {
    /// `None` when the player cannot identify the track, e.g. for streams.
    pub persistent_id: Option<PersistentId>,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub track_number: Option<u32>,
    pub duration_seconds: Option<f64>,
}

impl Track {
    /// Builds a submission from the live track. Needs artist and title.
    pub fn from_current(current: &CurrentTrack) -> Option<Self> {
        Some(Self {
            title: current.title.clone()?,
            artist: current.artist.clone()?,
            album: current.album.clone(),
            album_artist: current.album_artist.clone(),
            track_number: current.track_number,
            duration: current.duration_seconds.map(|secs| secs as u64),
        })
    }
}

/// Read access to whatever the player is doing right now.
pub trait MediaPlayerQuery {
    fn is_playing(&self) -> bool;

    /// `Ok(None)` when nothing is loaded; `Err` when the player could not be asked.
    fn current_track(&self) -> Result<Option<CurrentTrack>>;

    /// Position within the current track, in seconds.
    fn playback_position_seconds(&self) -> f64;
}

impl MediaPlayerQuery for AppleMusic {
    fn is_playing(&self) -> bool {
        match self.player_state() {
            Ok(state) => state == PlayerState::Playing,
            Err(e) => {
                log::warn!("Failed to read {} player state: {}", self.app_name(), e);
                false
            }
        }
    }

    fn current_track(&self) -> Result<Option<CurrentTrack>> {
        let track = AppleMusic::current_track(self)
            .with_context(|| format!("Failed to read {} current track", self.app_name()))?;
        Ok(track.map(current_from_script))
    }

    fn playback_position_seconds(&self) -> f64 {
        self.player_position().unwrap_or_else(|e| {
            log::warn!("Failed to read {} player position: {}", self.app_name(), e);
            0.0
        })
    }
}

fn current_from_script(track: apple_music::Track) -> CurrentTrack {
    let persistent_id = track.persistent_id.as_deref().and_then(|hex| match hex.parse() {
        Ok(id) => Some(id),
        Err(e) => {
            log::debug!("Ignoring unparsable persistent ID {:?}: {}", hex, e);
            None
        }
    });

    CurrentTrack {
        persistent_id,
        artist: non_empty(track.artist),
        title: non_empty(track.name),
        album: non_empty(track.album),
        album_artist: non_empty(track.album_artist),
        track_number: track.track_number.filter(|&n| n > 0),
        duration_seconds: track.duration,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
