// Media monitoring module
// Turns player notifications into now playing updates and delayed scrobbles

use crate::player::MediaPlayerQuery;
use crate::policy::{self, Decision};
use crate::scrobbler::TrackingService;
use crate::text_cleanup::TextCleaner;
use crate::timer::{Timer, TimerFire, TimerHandle};
use crate::track::{PlaybackEvent, PlayerState, Track, TrackMetadata};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// How long to wait before asking the player for the length of a track
/// announced without one.
pub const LENGTH_PROBE_DELAY: Duration = Duration::from_secs(5);

/// What a timer should do when it comes due. Both variants carry the metadata
/// snapshot taken from the notification that scheduled it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerPayload {
    /// Resolve the length of a track announced as zero-length, then schedule its scrobble.
    ProbeLength(TrackMetadata),
    /// Scrobble the track if it is still the one playing.
    Scrobble(TrackMetadata),
}

/// The single outstanding timer. The snapshot it acts on travels in its payload.
#[derive(Debug)]
struct PendingScrobble {
    handle: TimerHandle,
}

/// Scrobbling state machine.
///
/// Idle while `pending` is empty, awaiting a scrobble (or a length probe)
/// otherwise. Every new timer is preceded by cancelling the previous one, so
/// at most one is ever live. Nothing here returns errors: every outcome is a
/// logged decision.
pub struct MediaMonitor<P, S, T> {
    player: P,
    service: S,
    timer: T,
    text_cleaner: TextCleaner,
    length_probe_delay: Duration,
    pending: Option<PendingScrobble>,
}

impl<P, S, T> MediaMonitor<P, S, T>
where
    P: MediaPlayerQuery,
    S: TrackingService,
    T: Timer<TimerPayload>,
{
    pub fn new(player: P, service: S, timer: T, text_cleaner: TextCleaner) -> Self {
        Self {
            player,
            service,
            timer,
            text_cleaner,
            length_probe_delay: LENGTH_PROBE_DELAY,
            pending: None,
        }
    }

    pub fn with_length_probe_delay(mut self, delay: Duration) -> Self {
        self.length_probe_delay = delay;
        self
    }

    /// True while a timer is outstanding.
    pub fn is_awaiting_scrobble(&self) -> bool {
        self.pending.is_some()
    }

    /// Handles a playback notification.
    pub fn on_event(&mut self, event: PlaybackEvent) {
        log::debug!("Got a playback event: {:?}", event.state);

        match event.state {
            PlayerState::Playing => {
                let metadata = event.metadata.unwrap_or_default();
                if self.update_now_playing(&metadata) {
                    self.prepare_to_scrobble(metadata);
                } else {
                    log::debug!("Now playing update skipped, so not going to scrobble");
                }
            }
            PlayerState::Paused | PlayerState::Stopped => self.cancel_scrobble_timer(),
            PlayerState::Unknown(state) => {
                log::info!("Unrecognised player state: {:?}", state);
            }
        }
    }

    /// Handles a timer coming due.
    pub fn on_timer_fired(&mut self, fire: TimerFire<TimerPayload>) {
        self.on_timer_fired_at(fire, Utc::now());
    }

    fn on_timer_fired_at(&mut self, fire: TimerFire<TimerPayload>, now: DateTime<Utc>) {
        log::debug!("Timer {} fired", fire.handle.id());

        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.handle == fire.handle);
        if fire.handle.is_cancelled() || !is_current {
            log::warn!("Timer {} is no longer pending, ignoring its fire", fire.handle.id());
            return;
        }

        self.pending = None;

        match fire.payload {
            TimerPayload::ProbeLength(snapshot) => self.resolve_length(snapshot),
            TimerPayload::Scrobble(snapshot) => self.scrobble(snapshot, now),
        }
    }

    /// Sends the now playing update. Returns false when the track lacks the
    /// artist or title needed to report it.
    fn update_now_playing(&self, metadata: &TrackMetadata) -> bool {
        // Streams and radio often arrive without artist or title
        let Some(track) = Track::from_metadata(metadata) else {
            log::debug!("No artist or title in notification, skipping now playing");
            return false;
        };
        let track = self.text_cleaner.clean_track(track);

        log::debug!("Updating now playing with {:?}", track);
        if let Err(e) = self.service.now_playing(&track) {
            log::warn!("{:#}", e);
        }
        true
    }

    fn prepare_to_scrobble(&mut self, metadata: TrackMetadata) {
        self.cancel_scrobble_timer();

        if metadata.persistent_id.is_none() {
            log::warn!(
                "Track being played doesn't have a persistent ID, treating it as a stream; \
                 it will be scrobbled from the notification metadata"
            );
        }

        let duration_millis = metadata.duration_millis.unwrap_or(0);
        if duration_millis == 0 {
            log::debug!(
                "Track has zero length, asking the player for it in {:?}",
                self.length_probe_delay
            );
            self.schedule(self.length_probe_delay, TimerPayload::ProbeLength(metadata));
            return;
        }

        // The fallback only runs for zero-length tracks, handled above
        if let Decision::ScheduleAfter(secs) = policy::decide(duration_millis, || None) {
            self.schedule(Duration::from_secs(secs), TimerPayload::Scrobble(metadata));
        }
    }

    fn resolve_length(&mut self, snapshot: TrackMetadata) {
        let player = &self.player;
        let decision = policy::decide(0, || {
            match player.current_track() {
                Ok(track) => {
                    let length = track.and_then(|t| t.duration_seconds);
                    log::debug!("Current track duration: {:?}", length);
                    length
                }
                Err(e) => {
                    log::warn!("{:#}", e);
                    None
                }
            }
        });

        if let Decision::ScheduleAfter(secs) = decision {
            self.schedule(Duration::from_secs(secs), TimerPayload::Scrobble(snapshot));
        }
    }

    fn schedule(&mut self, delay: Duration, payload: TimerPayload) {
        log::debug!("Setting up a timer for {:?}", delay);
        let handle = self.timer.schedule(delay, payload);
        self.pending = Some(PendingScrobble { handle });
    }

    fn cancel_scrobble_timer(&mut self) {
        match self.pending.take() {
            Some(pending) => {
                log::debug!("Invalidating timer {}", pending.handle.id());
                self.timer.cancel(&pending.handle);
            }
            None => log::debug!("No timer to invalidate"),
        }
    }

    fn scrobble(&self, snapshot: TrackMetadata, now: DateTime<Utc>) {
        if !self.player.is_playing() {
            log::debug!("Player isn't playing, not scrobbling");
            return;
        }

        let track = match snapshot.persistent_id {
            None => {
                log::debug!("No persistent ID to verify, scrobbling from the notification metadata");
                Track::from_metadata(&snapshot)
            }
            Some(expected) => {
                log::debug!("Expected persistent ID of track to be scrobbled: {}", expected);

                let current = match self.player.current_track() {
                    Ok(Some(current)) => current,
                    Ok(None) => {
                        log::debug!("Player has no current track, not scrobbling");
                        return;
                    }
                    Err(e) => {
                        log::warn!("{:#}, not scrobbling", e);
                        return;
                    }
                };

                match current.persistent_id {
                    Some(actual) if actual != expected => {
                        log::warn!(
                            "Track now playing is different to the one that prompted the timer, \
                             not scrobbling: {} (expected) vs {} (actual)",
                            expected,
                            actual
                        );
                        return;
                    }
                    Some(_) => {
                        log::debug!("Correct track is playing, going to scrobble it");
                        Track::from_current(&current)
                    }
                    None => {
                        log::warn!(
                            "Track playing has no persistent ID, assuming it's a stream and \
                             scrobbling based on metadata from the original notification"
                        );
                        Track::from_metadata(&snapshot)
                    }
                }
            }
        };

        let Some(track) = track else {
            log::debug!("Artist or title are missing at scrobble time, not scrobbling");
            return;
        };
        let track = self.text_cleaner.clean_track(track);
        let timestamp = start_timestamp(now, self.player.playback_position_seconds());

        log::info!(
            "Scrobbling: {} - {} (started at {})",
            track.artist,
            track.title,
            timestamp
        );
        if let Err(e) = self.service.scrobble(&track, timestamp) {
            log::warn!("{:#}", e);
        }
    }

    #[cfg(test)]
    fn timer(&self) -> &T {
        &self.timer
    }
}

/// Estimates when the current track started: `now` minus the whole seconds
/// already played.
pub fn start_timestamp(now: DateTime<Utc>, position_seconds: f64) -> i64 {
    let played = if position_seconds.is_finite() && position_seconds > 0.0 {
        position_seconds.floor() as i64
    } else {
        0
    };
    now.timestamp() - played
}
