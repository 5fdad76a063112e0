//! Persistence layer for Viaje.ro.
//!
//! The app never talks to a backend directly; it goes through three traits:
//!
//! - [`Store`]: tracked cities, reviews, photos, settings and profiles
//! - [`ObjectStore`]: uploaded photo and avatar files
//! - [`GeometrySource`]: municipality outlines
//!
//! # Implementations
//!
//! - `RestStore` speaks the PostgREST / storage HTTP interface of the hosted
//!   backend and implements all three traits.
//! - `MemoryStore` and `MemoryObjectStore` keep everything in process and
//!   back the tests.
//! - `GeoJsonSource` serves outlines from a local or remote FeatureCollection.
//! - `LocalSettingsFile` keeps settings for signed-out use.
//!
//! # Example
//!
//! ```no_run
//! use viajero_core::{CityList, UserId};
//! use viajero_store::{MemoryStore, Store};
//!
//! # async fn run() -> viajero_store::Result<()> {
//! let store = MemoryStore::new();
//! let visited = store.list_cities(UserId::generate(), CityList::Visited).await?;
//! assert!(visited.is_empty());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod geojson;
pub mod local;
pub mod memory;
pub mod rest;
pub mod token;

pub use error::{Result, StoreError};
pub use geojson::GeoJsonSource;
pub use local::LocalSettingsFile;
pub use memory::{MemoryObjectStore, MemoryStore};
pub use rest::{RestOptions, RestStore};
pub use token::AccessToken;

use async_trait::async_trait;
use viajero_core::{
    CityKey, CityList, CityReview, CityReviewPhoto, CoverPosition, PhotoId, Profile, ReviewId,
    ReviewUpsert, TrackedCity, UserId, UserSettings, UserSettingsRecord,
};
use viajero_geo::Geometry;

/// The storage trait defining all record operations.
///
/// Every call is scoped to one user; row-level security on the hosted
/// backend enforces the same scoping server-side.
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Tracked Cities
    // =========================================================================

    /// List a user's cities, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn list_cities(&self, user_id: UserId, list: CityList) -> Result<Vec<TrackedCity>>;

    /// Add a city to a list.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if the city is already on the list,
    /// or another error if the backend request fails.
    async fn insert_city(&self, list: CityList, city: &TrackedCity) -> Result<()>;

    /// Remove a city from a list. Removing an absent city is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn delete_city(&self, user_id: UserId, list: CityList, key: &CityKey) -> Result<()>;

    // =========================================================================
    // Reviews
    // =========================================================================

    /// List a user's reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn list_reviews(&self, user_id: UserId) -> Result<Vec<CityReview>>;

    /// Create or update the user's review of a municipality.
    ///
    /// Conflicts resolve on `(user_id, city_name, state_name)`; an existing
    /// review keeps its id and creation time.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn upsert_review(&self, review: &ReviewUpsert) -> Result<CityReview>;

    /// Delete a review and its photo rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn delete_review(&self, user_id: UserId, key: &CityKey) -> Result<()>;

    /// Store a new cover placement on a review.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn update_cover_position(
        &self,
        user_id: UserId,
        key: &CityKey,
        position: CoverPosition,
    ) -> Result<()>;

    // =========================================================================
    // Review Photos
    // =========================================================================

    /// List the photos of several reviews in one request, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn list_photos(&self, review_ids: &[ReviewId]) -> Result<Vec<CityReviewPhoto>>;

    /// Attach an uploaded photo to a review. New photos are never the cover.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn insert_photo(&self, review_id: ReviewId, photo_url: &str) -> Result<CityReviewPhoto>;

    /// Delete a photo row.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn delete_photo(&self, photo_id: PhotoId) -> Result<()>;

    /// Clear the cover flag on every photo of a review.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn clear_cover(&self, review_id: ReviewId) -> Result<()>;

    /// Flag one photo as the cover. Callers clear the review first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn mark_cover(&self, photo_id: PhotoId) -> Result<()>;

    // =========================================================================
    // Settings and Profile
    // =========================================================================

    /// Load a user's settings, `None` if never saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn get_settings(&self, user_id: UserId) -> Result<Option<UserSettings>>;

    /// Save a user's settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn put_settings(&self, record: &UserSettingsRecord) -> Result<()>;

    /// Load a user's profile, `None` if never saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>>;

    /// Save a user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn put_profile(&self, profile: &Profile) -> Result<()>;

    // =========================================================================
    // Account
    // =========================================================================

    /// Delete the account and everything it owns.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    async fn delete_account(&self, user_id: UserId) -> Result<()>;
}

/// File storage for photos and avatars.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload an object and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if the path is taken, or another error
    /// if the upload fails.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;

    /// Public URL of an object.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Remove objects. Missing paths are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()>;

    /// Download an object by its public URL.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is no such object, or another
    /// error if the download fails.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Where municipality outlines come from.
#[async_trait]
pub trait GeometrySource: Send + Sync {
    /// Outline of a municipality, `None` if the source has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the source could not be queried.
    async fn geometry(&self, key: &CityKey) -> Result<Option<Geometry>>;
}

/// Object path of a public URL within `bucket`: everything after
/// `/{bucket}/`.
#[must_use]
pub fn object_path(public_url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/{bucket}/");
    public_url
        .split_once(&marker)
        .map(|(_, path)| path.to_string())
        .filter(|path| !path.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_strips_everything_up_to_the_bucket() {
        let url = "https://x.supabase.co/storage/v1/object/public/city-review-photos/u/r/a.jpg";
        assert_eq!(
            object_path(url, "city-review-photos").as_deref(),
            Some("u/r/a.jpg")
        );
        assert_eq!(object_path(url, "avatars"), None);
        assert_eq!(object_path("https://x/avatars/", "avatars"), None);
    }
}
