//! User profile: display name and avatar.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// Storage bucket holding avatars.
pub const AVATAR_BUCKET: &str = "avatars";

/// The `profiles` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Owner.
    pub user_id: UserId,
    /// Name shown in the header.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Public avatar URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Profile {
    /// An empty profile for a new user.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            display_name: None,
            avatar_url: None,
        }
    }

    /// Display name, or the local part of the email when unset.
    #[must_use]
    pub fn label<'a>(&'a self, email: &'a str) -> &'a str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or(email))
    }

    /// Object path of an avatar upload: `{user}/avatar.{ext}`.
    #[must_use]
    pub fn avatar_path(&self, extension: &str) -> String {
        format!("{}/avatar.{extension}", self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_falls_back_to_email_local_part() {
        let mut profile = Profile::new(UserId::generate());
        assert_eq!(profile.label("ana@example.com"), "ana");
        profile.display_name = Some("Ana Souza".into());
        assert_eq!(profile.label("ana@example.com"), "Ana Souza");
    }

    #[test]
    fn avatar_path_is_scoped_by_user() {
        let profile = Profile::new(UserId::generate());
        assert!(profile.avatar_path("png").starts_with(&profile.user_id.to_string()));
    }
}
