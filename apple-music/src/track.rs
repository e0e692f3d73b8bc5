use serde::Deserialize;

/// The player's current track as reported by the scripting bridge.
///
/// Every property is optional: streams and radio stations leave most of them unset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// 16 hex digit identifier, as the player formats it.
    #[serde(rename = "persistentID")]
    pub persistent_id: Option<String>,
    pub name: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    /// 0 when the track has no number.
    pub track_number: Option<u32>,
    /// Length in seconds.
    pub duration: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_script_output() {
        let json = r#"{
            "persistentID": "0A1B2C3D4E5F6071",
            "name": "Blue in Green",
            "artist": "Miles Davis",
            "album": "Kind of Blue",
            "albumArtist": "Miles Davis",
            "trackNumber": 3,
            "duration": 337.56
        }"#;

        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.persistent_id.as_deref(), Some("0A1B2C3D4E5F6071"));
        assert_eq!(track.album_artist.as_deref(), Some("Miles Davis"));
        assert_eq!(track.track_number, Some(3));
        assert_eq!(track.duration, Some(337.56));
    }

    #[test]
    fn stream_tracks_leave_properties_null() {
        let json = r#"{"persistentID": null, "name": "Live Radio", "artist": null}"#;

        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.persistent_id, None);
        assert_eq!(track.name.as_deref(), Some("Live Radio"));
        assert_eq!(track.duration, None);
    }
}
