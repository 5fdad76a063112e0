//! Colour settings, kept remotely for signed-in users and in a local file
//! otherwise.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info};
use viajero_core::{BrazilianState, HexColor, UserId, UserSettings, UserSettingsRecord};
use viajero_store::{LocalSettingsFile, Store};

use crate::error::Result;

#[derive(Debug, Default)]
struct Current {
    user_id: Option<UserId>,
    settings: UserSettings,
}

/// Settings with a remote and a local backend.
pub struct SettingsRepository {
    store: Arc<dyn Store>,
    local: LocalSettingsFile,
    current: RwLock<Current>,
}

impl SettingsRepository {
    /// Start signed out with the local file's settings.
    pub async fn new(store: Arc<dyn Store>, local: LocalSettingsFile) -> Self {
        let settings = local.load().await;
        Self {
            store,
            local,
            current: RwLock::new(Current {
                user_id: None,
                settings,
            }),
        }
    }

    /// Switch to a user's saved settings, or the defaults if they never
    /// saved any.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be read; the defaults are
    /// used in that case.
    pub async fn on_login(&self, user_id: UserId) -> Result<()> {
        let loaded = self.store.get_settings(user_id).await;
        let mut current = self.current.write().await;
        current.user_id = Some(user_id);
        match loaded {
            Ok(Some(settings)) => {
                debug!(user_id = %user_id, "loaded saved settings");
                current.settings = settings;
                Ok(())
            }
            Ok(None) => {
                current.settings = UserSettings::default();
                Ok(())
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "failed to load settings");
                current.settings = UserSettings::default();
                Err(e.into())
            }
        }
    }

    /// Switch back to the local settings.
    pub async fn on_logout(&self) {
        let settings = self.local.load().await;
        let mut current = self.current.write().await;
        current.user_id = None;
        current.settings = settings;
    }

    /// The settings in effect.
    pub async fn current(&self) -> UserSettings {
        self.current.read().await.settings.clone()
    }

    /// Colour of a state, `#ff7800` when none is set.
    pub async fn state_color(&self, state: BrazilianState) -> String {
        self.current
            .read()
            .await
            .settings
            .state_color(state)
            .to_string()
    }

    /// Colour of wishlisted cities.
    pub async fn wishlist_color(&self) -> String {
        self.current
            .read()
            .await
            .settings
            .wishlist_color
            .as_str()
            .to_string()
    }

    /// Change one state's colour.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be saved.
    pub async fn set_state_color(&self, state: BrazilianState, color: HexColor) -> Result<()> {
        self.update(|settings| settings.set_state_color(state, color))
            .await
    }

    /// Change the wishlist colour.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be saved.
    pub async fn set_wishlist_color(&self, color: HexColor) -> Result<()> {
        self.update(|settings| settings.wishlist_color = color).await
    }

    /// Restore the default state palette.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be saved.
    pub async fn reset_state_colors(&self) -> Result<()> {
        self.update(UserSettings::reset_state_colors).await
    }

    async fn update(&self, change: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let mut current = self.current.write().await;
        let mut settings = current.settings.clone();
        change(&mut settings);
        match current.user_id {
            Some(user_id) => {
                let record = UserSettingsRecord {
                    user_id,
                    settings: settings.clone(),
                };
                self.store.put_settings(&record).await.map_err(|e| {
                    error!(user_id = %user_id, error = %e, "failed to save settings");
                    e
                })?;
                info!(user_id = %user_id, "settings saved");
            }
            None => {
                self.local.save(&settings).await?;
                debug!(path = %self.local.path().display(), "settings saved locally");
            }
        }
        current.settings = settings;
        Ok(())
    }
}
