// Common traits for scrobbling services

use crate::track::Track;
use anyhow::Result;

/// Common trait for all scrobbling services
#[cfg_attr(test, mockall::automock)]
pub trait TrackingService {
    /// Update "now playing" status
    fn now_playing(&self, track: &Track) -> Result<()>;

    /// Submit a scrobble; `timestamp` is when the track started, in Unix seconds
    fn scrobble(&self, track: &Track, timestamp: i64) -> Result<()>;
}
