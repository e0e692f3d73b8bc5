// ListenBrainz scrobbler implementation
// API Documentation: https://listenbrainz.readthedocs.io/

use super::traits::TrackingService;
use crate::config::ListenBrainzConfig;
use crate::track::Track;
use anyhow::{Context, Result};
use backoff::ExponentialBackoff;
use listenbrainz::ListenBrainz;
use serde_json::{json, Map, Value};
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.listenbrainz.org";

/// Give up validating the token at start-up after this long.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ListenBrainzScrobbler {
    name: String,
    token: String,
    api_url: String,
}

impl ListenBrainzScrobbler {
    /// Validates the token, retrying while the network comes up.
    pub fn connect(config: &ListenBrainzConfig) -> Result<Self> {
        let policy = ExponentialBackoff {
            max_elapsed_time: Some(CONNECT_TIMEOUT),
            ..ExponentialBackoff::default()
        };

        backoff::retry_notify(
            policy,
            || {
                let mut client = if config.api_url == DEFAULT_API_URL {
                    ListenBrainz::new()
                } else {
                    ListenBrainz::new_with_url(&config.api_url)
                };
                client
                    .authenticate(&config.token)
                    .map_err(backoff::Error::transient)
            },
            |err: listenbrainz::Error, wait: Duration| {
                log::warn!(
                    "ListenBrainz ({}): authentication failed, retrying in {:?}: {}",
                    config.name,
                    wait,
                    err
                );
            },
        )
        .map_err(|err| match err {
            backoff::Error::Permanent(err) | backoff::Error::Transient { err, .. } => err,
        })
        .with_context(|| format!("Failed to authenticate with ListenBrainz ({})", config.name))?;

        Ok(Self {
            name: config.name.clone(),
            token: config.token.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Submit a listen to ListenBrainz
    fn submit_listen(&self, listen_type: &str, track: &Track, timestamp: Option<i64>) -> Result<()> {
        let payload = listen_payload(listen_type, track, timestamp);
        let url = format!("{}/1/submit-listens", self.api_url);

        let response = attohttpc::post(&url)
            .header("Authorization", format!("Token {}", self.token))
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .context("Failed to encode ListenBrainz request")?
            .send()
            .context("Failed to send request to ListenBrainz")?;

        if !response.is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("ListenBrainz API error ({}): {}", status, body);
        }

        Ok(())
    }
}

/// Builds a `submit-listens` body. `playing_now` listens carry no timestamp.
fn listen_payload(listen_type: &str, track: &Track, timestamp: Option<i64>) -> Value {
    let mut additional_info = Map::new();
    additional_info.insert("submission_client".to_string(), json!(env!("CARGO_PKG_NAME")));
    additional_info.insert(
        "submission_client_version".to_string(),
        json!(env!("CARGO_PKG_VERSION")),
    );
    if let Some(album_artist) = &track.album_artist {
        additional_info.insert("release_artist_name".to_string(), json!(album_artist));
    }
    if let Some(track_number) = track.track_number {
        additional_info.insert("tracknumber".to_string(), json!(track_number));
    }
    if let Some(duration) = track.duration {
        additional_info.insert("duration".to_string(), json!(duration));
    }

    let mut track_metadata = json!({
        "artist_name": track.artist,
        "track_name": track.title,
        "additional_info": additional_info,
    });
    if let Some(album) = &track.album {
        track_metadata["release_name"] = json!(album);
    }

    let mut listen = json!({ "track_metadata": track_metadata });
    if let Some(ts) = timestamp {
        listen["listened_at"] = json!(ts);
    }

    json!({
        "listen_type": listen_type,
        "payload": [listen],
    })
}

impl TrackingService for ListenBrainzScrobbler {
    fn now_playing(&self, track: &Track) -> Result<()> {
        log::debug!(
            "Sending now playing to ListenBrainz ({}): {} - {}",
            self.name,
            track.artist,
            track.title
        );
        self.submit_listen("playing_now", track, None)
            .with_context(|| format!("Failed to update now playing on ListenBrainz ({})", self.name))?;
        log::info!("ListenBrainz ({}): Now playing updated", self.name);
        Ok(())
    }

    fn scrobble(&self, track: &Track, timestamp: i64) -> Result<()> {
        log::debug!(
            "Scrobbling to ListenBrainz ({}): {} - {}",
            self.name,
            track.artist,
            track.title
        );
        self.submit_listen("single", track, Some(timestamp))
            .with_context(|| format!("Failed to scrobble to ListenBrainz ({})", self.name))?;
        log::info!("ListenBrainz ({}): Scrobbled successfully", self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track {
            title: "Svefn-g-englar".to_string(),
            artist: "Sigur Rós".to_string(),
            album: Some("Ágætis byrjun".to_string()),
            album_artist: Some("Sigur Rós".to_string()),
            track_number: Some(2),
            duration: Some(604),
        }
    }

    #[test]
    fn scrobble_payload_carries_all_track_fields() {
        let payload = listen_payload("single", &track(), Some(1_700_000_000));

        assert_eq!(payload["listen_type"], "single");
        let listen = &payload["payload"][0];
        assert_eq!(listen["listened_at"], 1_700_000_000);

        let metadata = &listen["track_metadata"];
        assert_eq!(metadata["artist_name"], "Sigur Rós");
        assert_eq!(metadata["track_name"], "Svefn-g-englar");
        assert_eq!(metadata["release_name"], "Ágætis byrjun");

        let info = &metadata["additional_info"];
        assert_eq!(info["release_artist_name"], "Sigur Rós");
        assert_eq!(info["tracknumber"], 2);
        assert_eq!(info["duration"], 604);
        assert_eq!(info["submission_client"], env!("CARGO_PKG_NAME"));
    }

    #[test]
    fn playing_now_payload_has_no_timestamp() {
        let payload = listen_payload("playing_now", &track(), None);
        assert_eq!(payload["listen_type"], "playing_now");
        assert!(payload["payload"][0].get("listened_at").is_none());
    }

    #[test]
    fn absent_fields_are_left_out() {
        let sparse = Track {
            album: None,
            album_artist: None,
            track_number: None,
            duration: None,
            ..track()
        };

        let payload = listen_payload("single", &sparse, Some(0));
        let metadata = &payload["payload"][0]["track_metadata"];
        assert!(metadata.get("release_name").is_none());
        let info = metadata["additional_info"].as_object().unwrap();
        assert!(!info.contains_key("tracknumber"));
        assert!(!info.contains_key("duration"));
        assert!(!info.contains_key("release_artist_name"));
    }
}
