//! Settings kept on the local machine for signed-out use.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use viajero_core::UserSettings;

use crate::error::Result;

/// A JSON file holding [`UserSettings`].
#[derive(Debug, Clone)]
pub struct LocalSettingsFile {
    path: PathBuf,
}

impl LocalSettingsFile {
    /// Use the file at `path`. It need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved settings. A missing or unreadable file yields the
    /// defaults.
    pub async fn load(&self) -> UserSettings {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no local settings yet");
                return UserSettings::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read local settings");
                return UserSettings::default();
            }
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "ignoring malformed local settings");
            UserSettings::default()
        })
    }

    /// Write the settings, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, settings: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.path, text).await?;
        Ok(())
    }
}
