// Scrobble timing rules
// A track counts as played once half of it, or 4 minutes, has been heard.

/// Shortest track (seconds) that can count as a play.
pub const MIN_TRACK_LENGTH: f64 = 30.0;

/// Upper bound (seconds) on the wait before scrobbling.
pub const HALFWAY_THRESHOLD: u64 = 240;

/// Outcome of [`decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Do not scrobble this track.
    Abandon,
    /// Scrobble after this many seconds.
    ScheduleAfter(u64),
}

/// Decides whether and when to scrobble a track of `duration_millis`.
///
/// A zero length means the player did not know it yet; `resolve_fallback_length`
/// is then asked for the real length in seconds. It is not called otherwise.
pub fn decide<F>(duration_millis: u64, resolve_fallback_length: F) -> Decision
where
    F: FnOnce() -> Option<f64>,
{
    let mut track_length = duration_millis as f64 / 1000.0;

    if track_length == 0.0 {
        match resolve_fallback_length() {
            Some(length) if length.is_finite() && length > 0.0 => {
                log::debug!("Resolved zero-length track to {}s", length);
                track_length = length;
            }
            other => {
                log::debug!("Track length still unknown ({:?}), giving up", other);
                return Decision::Abandon;
            }
        }
    }

    if track_length < MIN_TRACK_LENGTH {
        log::debug!("Track is too short ({}s), so not going to scrobble it", track_length);
        return Decision::Abandon;
    }

    let halfway = (track_length / 2.0).ceil() as u64;
    Decision::ScheduleAfter(halfway.min(HALFWAY_THRESHOLD))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never() -> Option<f64> {
        panic!("fallback resolver must not be called for a known length");
    }

    #[test]
    fn long_tracks_cap_at_threshold() {
        assert_eq!(decide(500_000, never), Decision::ScheduleAfter(240));
    }

    #[test]
    fn short_tracks_wait_for_halfway() {
        assert_eq!(decide(40_000, never), Decision::ScheduleAfter(20));
    }

    #[test]
    fn halfway_rounds_up() {
        assert_eq!(decide(61_001, never), Decision::ScheduleAfter(31));
        assert_eq!(decide(30_000, never), Decision::ScheduleAfter(15));
    }

    #[test]
    fn tracks_under_minimum_are_abandoned() {
        assert_eq!(decide(10_000, never), Decision::Abandon);
        assert_eq!(decide(29_999, never), Decision::Abandon);
        assert_eq!(decide(500, never), Decision::Abandon);
    }

    #[test]
    fn zero_length_uses_fallback() {
        assert_eq!(decide(0, || Some(200.0)), Decision::ScheduleAfter(100));
        assert_eq!(decide(0, || None), Decision::Abandon);
    }

    #[test]
    fn resolved_length_still_needs_minimum() {
        assert_eq!(decide(0, || Some(12.0)), Decision::Abandon);
        assert_eq!(decide(0, || Some(0.0)), Decision::Abandon);
        assert_eq!(decide(0, || Some(f64::NAN)), Decision::Abandon);
    }
}
