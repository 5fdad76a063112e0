//! The signed-in user's access token, shared between the auth client and
//! the stores that send it.

use std::sync::Arc;

use tokio::sync::RwLock;

/// A shared, replaceable bearer token.
///
/// Clones share the same slot: setting it on sign-in is seen by every
/// client holding a clone.
#[derive(Debug, Clone, Default)]
pub struct AccessToken(Arc<RwLock<Option<String>>>);

impl AccessToken {
    /// An empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the token.
    pub async fn set(&self, token: impl Into<String>) {
        *self.0.write().await = Some(token.into());
    }

    /// Forget the token.
    pub async fn clear(&self) {
        *self.0.write().await = None;
    }

    /// The current token.
    pub async fn get(&self) -> Option<String> {
        self.0.read().await.clone()
    }
}
