// Configuration management module
// Handles loading, saving, and validating configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Player application queried at scrobble time ("Music", or "iTunes" on old systems)
    #[serde(default = "default_player_app")]
    pub player_app: String,

    /// Seconds to wait before asking the player for the length of a track
    /// announced without one
    #[serde(default = "default_length_probe_delay")]
    pub length_probe_delay: u64,

    /// Text cleanup configuration
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Last.fm configuration
    pub lastfm: Option<LastFmConfig>,

    /// ListenBrainz configurations (can have multiple instances)
    #[serde(default)]
    pub listenbrainz: Vec<ListenBrainzConfig>,
}

fn default_player_app() -> String {
    "Music".to_string()
}

fn default_length_probe_delay() -> u64 {
    5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Enable text cleanup
    pub enabled: bool,

    /// Regex patterns to remove from track/album/artist names
    /// Applied in order, each pattern is removed from the text
    pub patterns: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: vec![
                r"\s*\[Explicit\]".to_string(),
                r"\s*\[Clean\]".to_string(),
                r"\s*\(Explicit\)".to_string(),
                r"\s*\(Clean\)".to_string(),
                r"\s*- Explicit".to_string(),
                r"\s*- Clean".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastFmConfig {
    pub enabled: bool,
    pub api_key: String,
    pub api_secret: String,
    /// Preferred; when empty, username and password are exchanged for a session at start-up
    #[serde(default)]
    pub session_key: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenBrainzConfig {
    pub enabled: bool,
    pub name: String,
    pub token: String,
    pub api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_app: default_player_app(),
            length_probe_delay: default_length_probe_delay(),
            cleanup: CleanupConfig::default(),
            lastfm: Some(LastFmConfig {
                enabled: false,
                api_key: String::new(),
                api_secret: String::new(),
                session_key: String::new(),
                username: String::new(),
                password: String::new(),
            }),
            listenbrainz: vec![ListenBrainzConfig {
                enabled: false,
                name: "Primary".to_string(),
                token: String::new(),
                api_url: "https://api.listenbrainz.org".to_string(),
            }],
        }
    }
}

impl Config {
    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?;

        Ok(config_dir.join("music_scrobbler.conf"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, or create a default there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("Config file not found, creating default at {:?}", path);
            let default_config = Self::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        Self::parse(&content)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        fs::write(path, self.to_toml()?)
            .context("Failed to write config file")?;

        log::info!("Config saved to {:?}", path);

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.player_app.trim().is_empty() {
            anyhow::bail!("player_app must not be empty");
        }

        if self.length_probe_delay == 0 || self.length_probe_delay > 30 {
            anyhow::bail!("length_probe_delay must be between 1 and 30 seconds");
        }

        // Check that at least one scrobbler is enabled
        let lastfm_enabled = self.lastfm.as_ref().map(|l| l.enabled).unwrap_or(false);
        let listenbrainz_enabled = self.listenbrainz.iter().any(|l| l.enabled);

        if !lastfm_enabled && !listenbrainz_enabled {
            log::warn!("No scrobbling services are enabled");
        }

        // Validate Last.fm config if enabled
        if let Some(lastfm) = &self.lastfm {
            if lastfm.enabled {
                if lastfm.api_key.is_empty() {
                    anyhow::bail!("Last.fm api_key is required when Last.fm is enabled");
                }
                if lastfm.api_secret.is_empty() {
                    anyhow::bail!("Last.fm api_secret is required when Last.fm is enabled");
                }
                if lastfm.session_key.is_empty()
                    && (lastfm.username.is_empty() || lastfm.password.is_empty())
                {
                    anyhow::bail!("Last.fm needs either session_key or username and password");
                }
            }
        }

        // Validate ListenBrainz configs if enabled
        for lb in &self.listenbrainz {
            if lb.enabled {
                if lb.token.is_empty() {
                    anyhow::bail!("ListenBrainz token is required when enabled (instance: {})", lb.name);
                }
                if lb.api_url.is_empty() {
                    anyhow::bail!("ListenBrainz api_url is required (instance: {})", lb.name);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let parsed = Config::parse(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let config = Config::parse(
            r#"
            [lastfm]
            enabled = true
            api_key = "key"
            api_secret = "secret"
            session_key = "session"
            "#,
        )
        .unwrap();

        assert_eq!(config.player_app, "Music");
        assert_eq!(config.length_probe_delay, 5);
        assert!(config.cleanup.enabled);
        assert!(config.listenbrainz.is_empty());
        assert_eq!(config.lastfm.unwrap().username, "");
    }

    #[test]
    fn lastfm_accepts_password_login() {
        let config = Config::parse(
            r#"
            [lastfm]
            enabled = true
            api_key = "key"
            api_secret = "secret"
            username = "listener"
            password = "hunter2"
            "#,
        );
        assert!(config.is_ok());
    }

    #[test]
    fn lastfm_without_credentials_is_rejected() {
        let err = Config::parse(
            r#"
            [lastfm]
            enabled = true
            api_key = "key"
            api_secret = "secret"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("session_key"));
    }

    #[test]
    fn probe_delay_is_bounded() {
        assert!(Config::parse("length_probe_delay = 0").is_err());
        assert!(Config::parse("length_probe_delay = 31").is_err());
        assert!(Config::parse("length_probe_delay = 30").is_ok());
    }

    #[test]
    fn enabled_listenbrainz_needs_token() {
        let err = Config::parse(
            r#"
            [[listenbrainz]]
            enabled = true
            name = "Home"
            token = ""
            api_url = "https://api.listenbrainz.org"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Home"));
    }
}
