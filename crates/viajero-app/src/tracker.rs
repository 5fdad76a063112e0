//! The signed-in user's cities and reviews.
//!
//! Reads come from a cached snapshot. Every mutation writes to the store and
//! then reloads the affected collection, so readers may see the previous
//! snapshot until that reload lands. Signing out bumps a generation counter;
//! a reload that started under an earlier generation drops its result
//! instead of overwriting the new session's cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info};
use viajero_core::{
    BrazilianState, CityKey, CityList, CityReview, CityReviewPhoto, CityStatistics, CoverPosition,
    ReferenceData, ReviewId, TrackedCity, UserId, ViajeroError,
};
use viajero_store::{ObjectStore, Store, StoreError};

use crate::auth::Session;
use crate::error::{AppError, Result};

/// Cached collections of the current session.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Visited cities, newest first.
    pub visited: Vec<TrackedCity>,
    /// Wishlisted cities, newest first.
    pub wishlist: Vec<TrackedCity>,
    /// Reviews.
    pub reviews: Vec<CityReview>,
    /// Photos of every review.
    pub photos: Vec<CityReviewPhoto>,
}

impl Snapshot {
    /// Cities on a list.
    #[must_use]
    pub fn list(&self, list: CityList) -> &[TrackedCity] {
        match list {
            CityList::Visited => &self.visited,
            CityList::Wishlist => &self.wishlist,
        }
    }

    fn list_mut(&mut self, list: CityList) -> &mut Vec<TrackedCity> {
        match list {
            CityList::Visited => &mut self.visited,
            CityList::Wishlist => &mut self.wishlist,
        }
    }
}

/// A review's cover, as needed to draw it on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Cover {
    /// Public URL of the cover photo.
    pub photo_url: String,
    /// Stored placement.
    pub position: CoverPosition,
}

/// Cities, reviews and photos of the signed-in user.
pub struct Tracker {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) objects: Arc<dyn ObjectStore>,
    pub(crate) reference: Arc<ReferenceData>,
    session: RwLock<Option<Session>>,
    generation: AtomicU64,
    pub(crate) cache: RwLock<Snapshot>,
}

impl Tracker {
    /// Create a tracker with no session.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        objects: Arc<dyn ObjectStore>,
        reference: Arc<ReferenceData>,
    ) -> Self {
        Self {
            store,
            objects,
            reference,
            session: RwLock::new(None),
            generation: AtomicU64::new(0),
            cache: RwLock::new(Snapshot::default()),
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Start a session and load its collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial load fails; the session stays active.
    pub async fn sign_in(&self, session: Session) -> Result<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.cache.write().await = Snapshot::default();
        info!(user_id = %session.user_id, "session started");
        *self.session.write().await = Some(session);
        self.reload_all().await
    }

    /// End the session and drop its cached data.
    pub async fn sign_out(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(session) = self.session.write().await.take() {
            info!(user_id = %session.user_id, "session ended");
        }
        *self.cache.write().await = Snapshot::default();
    }

    /// The current session.
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// The signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a session.
    pub async fn user_id(&self) -> Result<UserId> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.user_id)
            .ok_or(AppError::NotSignedIn)
    }

    /// A copy of the cached collections.
    pub async fn snapshot(&self) -> Snapshot {
        self.cache.read().await.clone()
    }

    // =========================================================================
    // Reloads
    // =========================================================================

    /// Reload every collection.
    ///
    /// # Errors
    ///
    /// Returns the first store error.
    pub async fn reload_all(&self) -> Result<()> {
        self.reload_cities(CityList::Visited).await?;
        self.reload_cities(CityList::Wishlist).await?;
        self.reload_reviews().await?;
        Ok(())
    }

    /// Reload one city list. Returns `false` if the result was discarded
    /// because the session changed meanwhile.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn reload_cities(&self, list: CityList) -> Result<bool> {
        let user_id = self.user_id().await?;
        let generation = self.generation.load(Ordering::SeqCst);
        let cities = self.store.list_cities(user_id, list).await.map_err(|e| {
            error!(user_id = %user_id, list = %list, error = %e, "failed to load cities");
            e
        })?;

        let mut cache = self.cache.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(list = %list, "discarding cities loaded for a previous session");
            return Ok(false);
        }
        *cache.list_mut(list) = cities;
        Ok(true)
    }

    /// Reload reviews and, in one batched request, their photos.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn reload_reviews(&self) -> Result<bool> {
        let user_id = self.user_id().await?;
        let generation = self.generation.load(Ordering::SeqCst);
        let reviews = self.store.list_reviews(user_id).await.map_err(|e| {
            error!(user_id = %user_id, error = %e, "failed to load reviews");
            e
        })?;
        let ids: Vec<ReviewId> = reviews.iter().map(|r| r.id).collect();
        let photos = self.store.list_photos(&ids).await.map_err(|e| {
            error!(user_id = %user_id, error = %e, "failed to load review photos");
            e
        })?;

        let mut cache = self.cache.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("discarding reviews loaded for a previous session");
            return Ok(false);
        }
        cache.reviews = reviews;
        cache.photos = photos;
        Ok(true)
    }

    // =========================================================================
    // Cities
    // =========================================================================

    /// Cities on a list, newest first.
    pub async fn cities(&self, list: CityList) -> Vec<TrackedCity> {
        self.cache.read().await.list(list).to_vec()
    }

    /// Whether a city is on a list.
    pub async fn contains(&self, list: CityList, key: &CityKey) -> bool {
        self.cache.read().await.list(list).iter().any(|c| c.is(key))
    }

    /// Add a municipality to a list.
    ///
    /// The name is resolved against the reference data, which supplies the
    /// area and IBGE code.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a session, `CityNotFound` for an unknown
    /// municipality, `Duplicate` if it is already on the list, or a store
    /// error.
    pub async fn add_city(&self, list: CityList, city: &str, state: &str) -> Result<TrackedCity> {
        let user_id = self.user_id().await?;
        let not_found = || ViajeroError::CityNotFound {
            city: city.trim().to_string(),
            state: state.trim().to_string(),
        };
        let state = BrazilianState::lookup(state).ok_or_else(not_found)?;
        let data = self.reference.city(city, state).ok_or_else(not_found)?;
        let key = data.key();
        let duplicate = || ViajeroError::Duplicate {
            city: key.city.clone(),
            state: key.state.to_string(),
            list,
        };

        if self.contains(list, &key).await {
            return Err(duplicate().into());
        }

        let record = TrackedCity::new(
            user_id,
            key.clone(),
            data.area_territorial_km2,
            Some(data.codigo_ibge.clone()),
        );
        match self.store.insert_city(list, &record).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                self.reload_cities(list).await?;
                return Err(duplicate().into());
            }
            Err(e) => {
                error!(user_id = %user_id, city = %key.city, state = %key.state, error = %e, "failed to add city");
                return Err(e.into());
            }
        }
        info!(user_id = %user_id, city = %key.city, state = %key.state, list = %list, "city added");
        self.reload_cities(list).await?;
        Ok(record)
    }

    /// Add to the visited list.
    ///
    /// # Errors
    ///
    /// See [`Tracker::add_city`].
    pub async fn add_visited(&self, city: &str, state: &str) -> Result<TrackedCity> {
        self.add_city(CityList::Visited, city, state).await
    }

    /// Add to the wishlist.
    ///
    /// # Errors
    ///
    /// See [`Tracker::add_city`].
    pub async fn add_wishlist(&self, city: &str, state: &str) -> Result<TrackedCity> {
        self.add_city(CityList::Wishlist, city, state).await
    }

    /// Remove a municipality from a list.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a session or a store error.
    pub async fn remove_city(&self, list: CityList, key: &CityKey) -> Result<()> {
        let user_id = self.user_id().await?;
        self.store
            .delete_city(user_id, list, key)
            .await
            .map_err(|e| {
                error!(user_id = %user_id, city = %key.city, state = %key.state, error = %e, "failed to remove city");
                e
            })?;
        info!(user_id = %user_id, city = %key.city, state = %key.state, list = %list, "city removed");
        self.reload_cities(list).await?;
        Ok(())
    }

    /// Remove from the visited list.
    ///
    /// # Errors
    ///
    /// See [`Tracker::remove_city`].
    pub async fn remove_visited(&self, key: &CityKey) -> Result<()> {
        self.remove_city(CityList::Visited, key).await
    }

    /// Remove from the wishlist.
    ///
    /// # Errors
    ///
    /// See [`Tracker::remove_city`].
    pub async fn remove_wishlist(&self, key: &CityKey) -> Result<()> {
        self.remove_city(CityList::Wishlist, key).await
    }

    /// Statistics over a list.
    pub async fn statistics(&self, list: CityList) -> CityStatistics {
        let cache = self.cache.read().await;
        CityStatistics::compute(cache.list(list), &self.reference)
    }

    /// Reference data in use.
    #[must_use]
    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    // =========================================================================
    // Covers
    // =========================================================================

    /// Cover photo and placement per reviewed municipality that has one.
    pub async fn covers(&self) -> HashMap<CityKey, Cover> {
        let cache = self.cache.read().await;
        cache
            .reviews
            .iter()
            .filter_map(|review| {
                let photo = cache
                    .photos
                    .iter()
                    .find(|p| p.review_id == review.id && p.is_cover)?;
                Some((
                    review.key(),
                    Cover {
                        photo_url: photo.photo_url.clone(),
                        position: review.cover_position(),
                    },
                ))
            })
            .collect()
    }
}
