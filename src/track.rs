// Playback events and track data
// Notification payloads are decoded once here; the rest of the crate only
// sees typed fields.

use crate::identity::PersistentId;
use serde_json::{Map, Value};

/// Player state carried by a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerState {
    Playing,
    Paused,
    Stopped,
    /// Anything else, kept verbatim for logging.
    Unknown(String),
}

impl From<&str> for PlayerState {
    fn from(state: &str) -> Self {
        match state {
            "Playing" => Self::Playing,
            "Paused" => Self::Paused,
            "Stopped" => Self::Stopped,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Track information captured from a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    /// 0 or `None` when the player does not know the length yet.
    pub duration_millis: Option<u64>,
    pub persistent_id: Option<PersistentId>,
}

impl TrackMetadata {
    /// Duration in whole seconds, `None` when unknown.
    pub fn duration_secs(&self) -> Option<u64> {
        self.duration_millis
            .map(|millis| millis / 1000)
            .filter(|&secs| secs > 0)
    }
}

/// A playback state change delivered by the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackEvent {
    pub state: PlayerState,
    pub metadata: Option<TrackMetadata>,
}

impl PlaybackEvent {
    /// Decodes the user info dictionary of a `playerInfo` notification.
    ///
    /// Never fails: missing or malformed fields are treated as absent.
    pub fn from_user_info(info: &Map<String, Value>) -> Self {
        let state = match info.get("Player State") {
            Some(Value::String(state)) => PlayerState::from(state.as_str()),
            Some(other) => PlayerState::Unknown(other.to_string()),
            None => PlayerState::Unknown(String::new()),
        };

        let metadata = TrackMetadata {
            artist: string_field(info, "Artist"),
            album_artist: string_field(info, "Album Artist"),
            title: string_field(info, "Name"),
            album: string_field(info, "Album"),
            track_number: integer_field(info, "Track Number").and_then(|n| u32::try_from(n).ok()),
            duration_millis: integer_field(info, "Total Time").and_then(|n| u64::try_from(n).ok()),
            persistent_id: persistent_id_field(info),
        };

        let metadata = (metadata != TrackMetadata::default()).then_some(metadata);
        Self { state, metadata }
    }
}

fn string_field(info: &Map<String, Value>, key: &str) -> Option<String> {
    match info.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null => None,
        other => {
            log::debug!("Ignoring non-string {:?}: {}", key, other);
            None
        }
    }
}

fn integer_field(info: &Map<String, Value>, key: &str) -> Option<i64> {
    match info.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::Null => None,
        other => {
            log::debug!("Ignoring non-numeric {:?}: {}", key, other);
            None
        }
    }
}

fn persistent_id_field(info: &Map<String, Value>) -> Option<PersistentId> {
    match info.get("PersistentID")? {
        Value::Number(n) => {
            if let Some(signed) = n.as_i64() {
                Some(PersistentId::from_signed(signed))
            } else {
                n.as_u64().map(PersistentId::new)
            }
        }
        Value::String(hex) => hex.parse().ok(),
        _ => None,
    }
}

/// Track fields submitted to scrobbling services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub track_number: Option<u32>,
    pub duration: Option<u64>, // Duration in seconds
}

impl Track {
    /// Builds a submission from notification metadata. Needs artist and title.
    pub fn from_metadata(metadata: &TrackMetadata) -> Option<Self> {
        Some(Self {
            title: metadata.title.clone()?,
            artist: metadata.artist.clone()?,
            album: metadata.album.clone(),
            album_artist: metadata.album_artist.clone(),
            track_number: metadata.track_number,
            duration: metadata.duration_secs(),
        })
    }
}
