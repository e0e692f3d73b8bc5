// Scrobbler module
// Contains implementations for various scrobbling services

pub mod lastfm;
pub mod listenbrainz;
pub mod traits;

pub use traits::TrackingService;

use crate::config::Config;
use crate::track::Track;
use anyhow::Result;
use self::lastfm::LastFmScrobbler;
use self::listenbrainz::ListenBrainzScrobbler;

/// Every enabled scrobbling service, addressed as one.
///
/// A failure in one service is logged and does not stop the others. Nothing
/// is retried.
pub struct Services {
    services: Vec<Box<dyn TrackingService>>,
}

impl Services {
    pub fn new(services: Vec<Box<dyn TrackingService>>) -> Self {
        Self { services }
    }

    /// Connects to every service enabled in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut services: Vec<Box<dyn TrackingService>> = Vec::new();

        if let Some(lastfm) = config.lastfm.as_ref().filter(|l| l.enabled) {
            services.push(Box::new(LastFmScrobbler::new(lastfm)?));
            log::info!("Last.fm scrobbling enabled");
        }

        for lb in config.listenbrainz.iter().filter(|l| l.enabled) {
            services.push(Box::new(ListenBrainzScrobbler::connect(lb)?));
            log::info!("ListenBrainz ({}) scrobbling enabled", lb.name);
        }

        Ok(Self::new(services))
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl TrackingService for Services {
    fn now_playing(&self, track: &Track) -> Result<()> {
        for service in &self.services {
            if let Err(e) = service.now_playing(track) {
                log::warn!("{:#}", e);
            }
        }
        Ok(())
    }

    fn scrobble(&self, track: &Track, timestamp: i64) -> Result<()> {
        for service in &self.services {
            if let Err(e) = service.scrobble(track, timestamp) {
                log::warn!("{:#}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::traits::MockTrackingService;
    use super::*;

    fn track() -> Track {
        Track {
            title: "Teardrop".to_string(),
            artist: "Massive Attack".to_string(),
            album: Some("Mezzanine".to_string()),
            album_artist: None,
            track_number: Some(3),
            duration: Some(330),
        }
    }

    #[test]
    fn failing_service_does_not_stop_others() {
        let mut failing = MockTrackingService::new();
        failing
            .expect_scrobble()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("service unavailable")));

        let mut working = MockTrackingService::new();
        working
            .expect_scrobble()
            .withf(|track, timestamp| track.title == "Teardrop" && *timestamp == 1_700_000_000)
            .times(1)
            .returning(|_, _| Ok(()));

        let services = Services::new(vec![Box::new(failing), Box::new(working)]);
        assert!(services.scrobble(&track(), 1_700_000_000).is_ok());
    }

    #[test]
    fn now_playing_reaches_every_service() {
        let mut first = MockTrackingService::new();
        first.expect_now_playing().times(1).returning(|_| Ok(()));
        let mut second = MockTrackingService::new();
        second.expect_now_playing().times(1).returning(|_| Ok(()));

        let services = Services::new(vec![Box::new(first), Box::new(second)]);
        assert!(services.now_playing(&track()).is_ok());
    }

    #[test]
    fn no_services_is_a_no_op() {
        let services = Services::new(Vec::new());
        assert!(services.is_empty());
        assert!(services.scrobble(&track(), 0).is_ok());
    }
}
