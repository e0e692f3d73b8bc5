use crate::error::Error;
use serde::de::DeserializeOwned;
use std::process::Command;

/// Runs JXA snippets through `osascript`.
pub struct ScriptController;

impl ScriptController {
    /// Executes `script` and returns its trimmed standard output.
    pub fn execute(&self, script: &str) -> Result<String, Error> {
        log::trace!("osascript: {}", script);

        let output = Command::new("osascript")
            .args(["-l", "JavaScript", "-e", script])
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(Error::Script(stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Executes `script`, which must evaluate to a `JSON.stringify` result, and decodes it.
    pub fn execute_json<T: DeserializeOwned>(&self, script: &str) -> Result<T, Error> {
        let output = self.execute(script)?;
        Ok(serde_json::from_str(&output)?)
    }
}
