use thiserror::Error;

/// Errors raised while talking to the player through `osascript`.
#[derive(Error, Debug)]
pub enum Error {
    /// `osascript` could not be started at all.
    #[error("failed to run osascript: {0}")]
    Spawn(#[from] std::io::Error),

    /// The script ran but exited unsuccessfully.
    #[error("script failed: {0}")]
    Script(String),

    /// The script output was not the JSON we asked for.
    #[error("unexpected script output: {0}")]
    Parse(#[from] serde_json::Error),

    /// The player reported a state we do not know about.
    #[error("unknown player state: {0}")]
    UnknownState(String),
}
