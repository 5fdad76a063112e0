//! In-process storage.
//!
//! Applies the same constraints as the hosted schema (one city per list,
//! one review per municipality, photo rows removed with their review) so
//! app logic tested against it behaves as it does in production.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};
use viajero_core::{
    CityKey, CityList, CityReview, CityReviewPhoto, CoverPosition, PhotoId, Profile, ReviewId,
    ReviewUpsert, TrackedCity, UserId, UserSettings, UserSettingsRecord,
};

use crate::error::{Result, StoreError};
use crate::{object_path, ObjectStore, Store};

#[derive(Debug, Default)]
struct Tables {
    visited: Vec<TrackedCity>,
    wishlist: Vec<TrackedCity>,
    reviews: Vec<CityReview>,
    photos: Vec<CityReviewPhoto>,
    settings: HashMap<UserId, UserSettings>,
    profiles: HashMap<UserId, Profile>,
    fail_next: Option<String>,
}

impl Tables {
    fn cities(&mut self, list: CityList) -> &mut Vec<TrackedCity> {
        match list {
            CityList::Visited => &mut self.visited,
            CityList::Wishlist => &mut self.wishlist,
        }
    }
}

/// In-memory [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    calls: AtomicUsize,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next call fail with an API error carrying `message`.
    pub async fn fail_next(&self, message: impl Into<String>) {
        self.tables.lock().await.fail_next = Some(message.into());
    }

    async fn begin(&self) -> Result<MutexGuard<'_, Tables>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().await;
        if let Some(message) = tables.fail_next.take() {
            return Err(StoreError::Api {
                status: 500,
                code: "injected".to_string(),
                message,
            });
        }
        Ok(tables)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_cities(&self, user_id: UserId, list: CityList) -> Result<Vec<TrackedCity>> {
        let mut tables = self.begin().await?;
        let mut cities: Vec<TrackedCity> = tables
            .cities(list)
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        cities.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(cities)
    }

    async fn insert_city(&self, list: CityList, city: &TrackedCity) -> Result<()> {
        let mut tables = self.begin().await?;
        let rows = tables.cities(list);
        if rows
            .iter()
            .any(|c| c.user_id == city.user_id && c.is(&city.key()))
        {
            return Err(StoreError::Duplicate(format!(
                "{} already on {}",
                city.key(),
                list.table()
            )));
        }
        rows.push(city.clone());
        Ok(())
    }

    async fn delete_city(&self, user_id: UserId, list: CityList, key: &CityKey) -> Result<()> {
        let mut tables = self.begin().await?;
        tables
            .cities(list)
            .retain(|c| !(c.user_id == user_id && c.is(key)));
        Ok(())
    }

    async fn list_reviews(&self, user_id: UserId) -> Result<Vec<CityReview>> {
        let tables = self.begin().await?;
        Ok(tables
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_review(&self, review: &ReviewUpsert) -> Result<CityReview> {
        let mut tables = self.begin().await?;
        let key = CityKey::new(review.city_name.clone(), review.state_name);
        let existing = tables
            .reviews
            .iter()
            .position(|r| r.user_id == review.user_id && r.key() == key);

        let stored = if let Some(index) = existing {
            let row = &mut tables.reviews[index];
            apply_upsert(row, review);
            row.clone()
        } else {
            let mut row = CityReview {
                id: ReviewId::generate(),
                user_id: review.user_id,
                city_name: review.city_name.clone(),
                state_name: review.state_name,
                city_code: None,
                rating: review.rating,
                comment: None,
                cover_photo_position_x: None,
                cover_photo_position_y: None,
                cover_photo_scale: None,
                visit_start_date: None,
                visit_end_date: None,
                created_at: Utc::now(),
                updated_at: review.updated_at,
            };
            apply_upsert(&mut row, review);
            tables.reviews.push(row.clone());
            row
        };
        Ok(stored)
    }

    async fn delete_review(&self, user_id: UserId, key: &CityKey) -> Result<()> {
        let mut tables = self.begin().await?;
        let removed: Vec<ReviewId> = tables
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id && &r.key() == key)
            .map(|r| r.id)
            .collect();
        tables
            .reviews
            .retain(|r| !(r.user_id == user_id && &r.key() == key));
        tables.photos.retain(|p| !removed.contains(&p.review_id));
        Ok(())
    }

    async fn update_cover_position(
        &self,
        user_id: UserId,
        key: &CityKey,
        position: CoverPosition,
    ) -> Result<()> {
        let mut tables = self.begin().await?;
        let review = tables
            .reviews
            .iter_mut()
            .find(|r| r.user_id == user_id && &r.key() == key)
            .ok_or_else(|| StoreError::NotFound(format!("review of {key}")))?;
        review.cover_photo_position_x = Some(position.x);
        review.cover_photo_position_y = Some(position.y);
        review.cover_photo_scale = Some(position.scale);
        review.updated_at = Utc::now();
        Ok(())
    }

    async fn list_photos(&self, review_ids: &[ReviewId]) -> Result<Vec<CityReviewPhoto>> {
        let tables = self.begin().await?;
        let mut photos: Vec<CityReviewPhoto> = tables
            .photos
            .iter()
            .filter(|p| review_ids.contains(&p.review_id))
            .cloned()
            .collect();
        photos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(photos)
    }

    async fn insert_photo(&self, review_id: ReviewId, photo_url: &str) -> Result<CityReviewPhoto> {
        let mut tables = self.begin().await?;
        if !tables.reviews.iter().any(|r| r.id == review_id) {
            return Err(StoreError::NotFound(format!("review {review_id}")));
        }
        let photo = CityReviewPhoto {
            id: PhotoId::generate(),
            review_id,
            photo_url: photo_url.to_string(),
            is_cover: false,
            created_at: Utc::now(),
        };
        tables.photos.push(photo.clone());
        Ok(photo)
    }

    async fn delete_photo(&self, photo_id: PhotoId) -> Result<()> {
        let mut tables = self.begin().await?;
        tables.photos.retain(|p| p.id != photo_id);
        Ok(())
    }

    async fn clear_cover(&self, review_id: ReviewId) -> Result<()> {
        let mut tables = self.begin().await?;
        for photo in tables.photos.iter_mut().filter(|p| p.review_id == review_id) {
            photo.is_cover = false;
        }
        Ok(())
    }

    async fn mark_cover(&self, photo_id: PhotoId) -> Result<()> {
        let mut tables = self.begin().await?;
        let photo = tables
            .photos
            .iter_mut()
            .find(|p| p.id == photo_id)
            .ok_or_else(|| StoreError::NotFound(format!("photo {photo_id}")))?;
        photo.is_cover = true;
        Ok(())
    }

    async fn get_settings(&self, user_id: UserId) -> Result<Option<UserSettings>> {
        let tables = self.begin().await?;
        Ok(tables.settings.get(&user_id).cloned())
    }

    async fn put_settings(&self, record: &UserSettingsRecord) -> Result<()> {
        let mut tables = self.begin().await?;
        tables
            .settings
            .insert(record.user_id, record.settings.clone());
        Ok(())
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>> {
        let tables = self.begin().await?;
        Ok(tables.profiles.get(&user_id).cloned())
    }

    async fn put_profile(&self, profile: &Profile) -> Result<()> {
        let mut tables = self.begin().await?;
        tables.profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn delete_account(&self, user_id: UserId) -> Result<()> {
        let mut tables = self.begin().await?;
        tables.visited.retain(|c| c.user_id != user_id);
        tables.wishlist.retain(|c| c.user_id != user_id);
        let reviews: Vec<ReviewId> = tables
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.id)
            .collect();
        tables.reviews.retain(|r| r.user_id != user_id);
        tables.photos.retain(|p| !reviews.contains(&p.review_id));
        tables.settings.remove(&user_id);
        tables.profiles.remove(&user_id);
        Ok(())
    }
}

fn apply_upsert(row: &mut CityReview, review: &ReviewUpsert) {
    row.city_code.clone_from(&review.city_code);
    row.rating = review.rating;
    row.comment.clone_from(&review.comment);
    row.cover_photo_position_x = Some(review.cover_photo_position_x);
    row.cover_photo_position_y = Some(review.cover_photo_position_y);
    row.cover_photo_scale = Some(review.cover_photo_scale);
    row.visit_start_date = review.visit_start_date;
    row.visit_end_date = review.visit_end_date;
    row.updated_at = review.updated_at;
}

/// Public URL prefix used by [`MemoryObjectStore`].
pub const MEMORY_OBJECT_URL: &str = "memory://storage/object/public";

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// In-memory [`ObjectStore`], keyed by `(bucket, path)`.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
}

impl MemoryObjectStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths currently stored in `bucket`.
    pub async fn paths(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, path)| path.clone())
            .collect()
    }

    /// Content type of a stored object.
    pub async fn content_type(&self, bucket: &str, path: &str) -> Option<String> {
        self.objects
            .lock()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .map(|o| o.content_type.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let mut objects = self.objects.lock().await;
        let key = (bucket.to_string(), path.to_string());
        if objects.contains_key(&key) {
            return Err(StoreError::Duplicate(format!("{bucket}/{path}")));
        }
        objects.insert(
            key,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(self.public_url(bucket, path))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{MEMORY_OBJECT_URL}/{bucket}/{path}")
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        let mut objects = self.objects.lock().await;
        for path in paths {
            objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let rest = url
            .strip_prefix(MEMORY_OBJECT_URL)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StoreError::NotFound(url.to_string()))?;
        let (bucket, _) = rest
            .split_once('/')
            .ok_or_else(|| StoreError::NotFound(url.to_string()))?;
        let path = object_path(url, bucket).ok_or_else(|| StoreError::NotFound(url.to_string()))?;
        self.objects
            .lock()
            .await
            .get(&(bucket.to_string(), path))
            .map(|o| o.bytes.clone())
            .ok_or_else(|| StoreError::NotFound(url.to_string()))
    }
}
