// Last.fm scrobbler implementation

use super::traits::TrackingService;
use crate::config::LastFmConfig;
use crate::track::Track;
use anyhow::{Context, Result};
use rustfm_scrobble_proxy::{Scrobble, Scrobbler};

pub struct LastFmScrobbler {
    scrobbler: Scrobbler,
}

impl LastFmScrobbler {
    /// Uses the configured session key, or exchanges username and password for one.
    pub fn new(config: &LastFmConfig) -> Result<Self> {
        let mut scrobbler = Scrobbler::new(&config.api_key, &config.api_secret);

        if !config.session_key.is_empty() {
            scrobbler.authenticate_with_session_key(&config.session_key);
        } else {
            scrobbler
                .authenticate_with_password(&config.username, &config.password)
                .context("Failed to authenticate with Last.fm")?;
            log::debug!("Connected to Last.fm as {}", config.username);
        }

        Ok(Self { scrobbler })
    }

    fn to_scrobble(track: &Track) -> Scrobble {
        Scrobble::new(&track.artist, &track.title, track.album.as_deref())
    }
}

impl TrackingService for LastFmScrobbler {
    fn now_playing(&self, track: &Track) -> Result<()> {
        self.scrobbler
            .now_playing(&Self::to_scrobble(track))
            .context("Failed to update now playing on Last.fm")?;
        log::info!("Last.fm: Now playing updated");
        Ok(())
    }

    fn scrobble(&self, track: &Track, timestamp: i64) -> Result<()> {
        let mut scrobble = Self::to_scrobble(track);
        scrobble.with_timestamp(timestamp.max(0) as u64);
        self.scrobbler
            .scrobble(&scrobble)
            .context("Failed to scrobble to Last.fm")?;
        log::info!("Last.fm: Scrobbled successfully");
        Ok(())
    }
}
