use crate::error::Error;
use crate::script_controller::ScriptController;
use crate::track::Track;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

const CURRENT_TRACK_BODY: &str = r#"
    let track;
    try {
        track = app.currentTrack();
        track.name();
    } catch (e) {
        return JSON.stringify(null);
    }
    const get = (property) => {
        try { return track[property](); } catch (e) { return null; }
    };
    return JSON.stringify({
        persistentID: get('persistentID'),
        name: get('name'),
        artist: get('artist'),
        album: get('album'),
        albumArtist: get('albumArtist'),
        trackNumber: get('trackNumber'),
        duration: get('duration'),
    });
"#;

/// Entry point for queries against one player application.
///
/// The wrapped string is the application name, `Music` on current macOS
/// releases and `iTunes` on older ones.
pub struct AppleMusic(String);

impl Default for AppleMusic {
    fn default() -> Self {
        Self("Music".to_string())
    }
}

impl AppleMusic {
    /// New with specified app name
    pub fn new(app: String) -> Self {
        Self(app)
    }

    pub fn app_name(&self) -> &str {
        &self.0
    }

    /// Returns the player state. A player that is not running counts as stopped.
    pub fn player_state(&self) -> Result<PlayerState, Error> {
        let state: Option<String> = ScriptController
            .execute_json(&self.script("return JSON.stringify(app.playerState());"))?;

        match state {
            Some(state) => PlayerState::from_str(&state).map_err(|_| Error::UnknownState(state)),
            None => Ok(PlayerState::Stopped),
        }
    }

    /// Returns currently playing Track, if any.
    pub fn current_track(&self) -> Result<Option<Track>, Error> {
        ScriptController.execute_json(&self.script(CURRENT_TRACK_BODY))
    }

    /// Playback position within the current track, in seconds.
    pub fn player_position(&self) -> Result<f64, Error> {
        let position: Option<f64> = ScriptController
            .execute_json(&self.script("return JSON.stringify(app.playerPosition());"))?;
        Ok(position.unwrap_or(0.0))
    }

    /// Wraps `body` so it only runs when the player is already open; querying a
    /// closed application would launch it.
    fn script(&self, body: &str) -> String {
        let name = serde_json::Value::String(self.0.clone());
        format!(
            "(() => {{ const app = Application({}); if (!app.running()) {{ return JSON.stringify(null); }} {} }})()",
            name, body
        )
    }
}

/// Player state as reported by the scripting bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
    #[strum(serialize = "fast forwarding")]
    FastForwarding,
    Rewinding,
}
