//! Profile and account data.

use std::sync::Arc;

use tracing::{error, info, warn};
use viajero_core::{PhotoUpload, Profile, UserId, ViajeroError, AVATAR_BUCKET};
use viajero_store::{object_path, ObjectStore, Store};

use crate::error::Result;

/// Display name, avatar and account deletion.
pub struct Account {
    store: Arc<dyn Store>,
    objects: Arc<dyn ObjectStore>,
}

impl Account {
    /// Create the service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    /// The user's profile, empty if never saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be read.
    pub async fn profile(&self, user_id: UserId) -> Result<Profile> {
        Ok(self
            .store
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| Profile::new(user_id)))
    }

    /// Change the display name. A blank name clears it.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be saved.
    pub async fn update_display_name(&self, user_id: UserId, name: &str) -> Result<Profile> {
        let mut profile = self.profile(user_id).await?;
        let name = name.trim();
        profile.display_name = (!name.is_empty()).then(|| name.to_string());
        self.store.put_profile(&profile).await?;
        info!(user_id = %user_id, "display name updated");
        Ok(profile)
    }

    /// Replace the avatar with `upload`, stored at `{user}/avatar.{ext}`.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for an empty file, or an error if the upload
    /// or profile update fails.
    pub async fn upload_avatar(&self, user_id: UserId, upload: &PhotoUpload) -> Result<Profile> {
        if upload.bytes.is_empty() {
            return Err(ViajeroError::MissingField("avatar").into());
        }
        let mut profile = self.profile(user_id).await?;
        let path = profile.avatar_path(&upload.extension());

        let mut stale = vec![path.clone()];
        if let Some(old) = profile
            .avatar_url
            .as_deref()
            .and_then(|url| object_path(url, AVATAR_BUCKET))
        {
            if old != path {
                stale.push(old);
            }
        }
        self.objects.remove(AVATAR_BUCKET, &stale).await?;

        let url = self
            .objects
            .upload(AVATAR_BUCKET, &path, upload.bytes.clone(), &upload.mime_type())
            .await
            .map_err(|e| {
                error!(user_id = %user_id, error = %e, "avatar upload failed");
                e
            })?;
        profile.avatar_url = Some(url);
        self.store.put_profile(&profile).await?;
        info!(user_id = %user_id, "avatar updated");
        Ok(profile)
    }

    /// Delete the account, its stored files and every row it owns.
    ///
    /// `photo_paths` are the object paths of the user's review photos.
    /// Files that cannot be removed are logged and left behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the account itself cannot be deleted.
    pub async fn delete_account(&self, user_id: UserId, photo_paths: &[String]) -> Result<()> {
        let profile = self.profile(user_id).await.ok();
        if let Err(e) = self
            .objects
            .remove(viajero_core::REVIEW_PHOTO_BUCKET, photo_paths)
            .await
        {
            warn!(user_id = %user_id, error = %e, "failed to remove review photos");
        }
        if let Some(avatar) = profile
            .and_then(|p| p.avatar_url)
            .and_then(|url| object_path(&url, AVATAR_BUCKET))
        {
            if let Err(e) = self.objects.remove(AVATAR_BUCKET, &[avatar]).await {
                warn!(user_id = %user_id, error = %e, "failed to remove avatar");
            }
        }
        self.store.delete_account(user_id).await.map_err(|e| {
            error!(user_id = %user_id, error = %e, "failed to delete account");
            e
        })?;
        info!(user_id = %user_id, "account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viajero_store::{MemoryObjectStore, MemoryStore};

    fn upload(name: &str) -> PhotoUpload {
        PhotoUpload {
            file_name: name.into(),
            content_type: None,
            bytes: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn avatar_replaces_previous_file() {
        let objects = Arc::new(MemoryObjectStore::new());
        let account = Account::new(Arc::new(MemoryStore::new()), objects.clone());
        let user = UserId::generate();

        account.upload_avatar(user, &upload("me.png")).await.unwrap();
        let profile = account.upload_avatar(user, &upload("me.jpg")).await.unwrap();

        assert_eq!(
            objects.paths(AVATAR_BUCKET).await,
            vec![format!("{user}/avatar.jpg")]
        );
        assert!(profile.avatar_url.unwrap().ends_with("avatar.jpg"));
    }

    #[tokio::test]
    async fn blank_display_name_clears_it() {
        let account = Account::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryObjectStore::new()),
        );
        let user = UserId::generate();
        account.update_display_name(user, " Ana ").await.unwrap();
        assert_eq!(
            account.profile(user).await.unwrap().display_name.as_deref(),
            Some("Ana")
        );
        account.update_display_name(user, "  ").await.unwrap();
        assert_eq!(account.profile(user).await.unwrap().display_name, None);
    }

    #[tokio::test]
    async fn empty_avatar_is_rejected() {
        let account = Account::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryObjectStore::new()),
        );
        let empty = PhotoUpload {
            bytes: Vec::new(),
            ..upload("me.png")
        };
        assert!(account
            .upload_avatar(UserId::generate(), &empty)
            .await
            .is_err());
    }
}
