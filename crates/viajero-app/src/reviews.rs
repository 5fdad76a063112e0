//! Reviews, photos and covers.

use chrono::Utc;
use tracing::{error, info, warn};
use ulid::Ulid;
use viajero_core::review::cover_photo;
use viajero_core::{
    CityKey, CityReview, CityReviewPhoto, CoverPosition, PhotoId, PhotoUpload, ReviewDraft,
    ReviewId, ReviewUpsert, UserId, REVIEW_PHOTO_BUCKET,
};
use viajero_store::object_path;

use crate::error::{AppError, Result};
use crate::tracker::Tracker;

impl Tracker {
    // =========================================================================
    // Reads
    // =========================================================================

    /// The user's review of a municipality.
    pub async fn review(&self, key: &CityKey) -> Option<CityReview> {
        self.cache
            .read()
            .await
            .reviews
            .iter()
            .find(|r| &r.key() == key)
            .cloned()
    }

    /// Every review.
    pub async fn reviews(&self) -> Vec<CityReview> {
        self.cache.read().await.reviews.clone()
    }

    /// Photos of a review, oldest first.
    pub async fn photos(&self, review_id: ReviewId) -> Vec<CityReviewPhoto> {
        self.cache
            .read()
            .await
            .photos
            .iter()
            .filter(|p| p.review_id == review_id)
            .cloned()
            .collect()
    }

    /// The review's cover photo.
    pub async fn cover_photo(&self, review_id: ReviewId) -> Option<CityReviewPhoto> {
        cover_photo(&self.photos(review_id).await).cloned()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create or update the review of a municipality and upload its new
    /// photos.
    ///
    /// The draft is checked against the cached photo count before anything
    /// is written. Photos go to
    /// `city-review-photos/{user}/{review}/{ulid}.{ext}`; if the draft names
    /// one of them as cover, the review's cover is moved to it.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad draft, `NotSignedIn` without a
    /// session, or a store error. After a store error the cache is still
    /// reloaded so it shows whatever was saved.
    pub async fn save_review(&self, key: &CityKey, draft: &ReviewDraft) -> Result<CityReview> {
        let user_id = self.user_id().await?;
        let existing = self.review(key).await;
        let existing_photos = match &existing {
            Some(review) => self.photos(review.id).await.len(),
            None => 0,
        };
        let rating = draft.validate(existing_photos)?;

        let city_code = self
            .reference
            .city_by_key(key)
            .map(|c| c.codigo_ibge.clone())
            .or_else(|| existing.and_then(|r| r.city_code));
        let upsert = ReviewUpsert {
            user_id,
            city_name: key.city.clone(),
            state_name: key.state,
            city_code,
            rating,
            comment: draft.stored_comment(),
            cover_photo_position_x: draft.cover_position.x,
            cover_photo_position_y: draft.cover_position.y,
            cover_photo_scale: draft.cover_position.scale,
            visit_start_date: draft.visit_start_date,
            visit_end_date: draft.visit_end_date,
            updated_at: Utc::now(),
        };

        let review = self.store.upsert_review(&upsert).await.map_err(|e| {
            error!(user_id = %user_id, city = %key.city, state = %key.state, error = %e, "failed to save review");
            e
        })?;
        info!(user_id = %user_id, review_id = %review.id, rating = rating.value(), "review saved");

        let attached = self.attach_photos(user_id, &review, draft).await;
        self.reload_reviews().await?;
        attached?;
        Ok(review)
    }

    async fn attach_photos(
        &self,
        user_id: UserId,
        review: &CityReview,
        draft: &ReviewDraft,
    ) -> Result<()> {
        let mut inserted = Vec::with_capacity(draft.new_photos.len());
        for upload in &draft.new_photos {
            inserted.push(self.upload_photo(user_id, review.id, upload).await?);
        }
        if let Some(photo) = draft.cover_photo_index.and_then(|i| inserted.get(i)) {
            self.store.clear_cover(review.id).await?;
            self.store.mark_cover(photo.id).await?;
        }
        Ok(())
    }

    async fn upload_photo(
        &self,
        user_id: UserId,
        review_id: ReviewId,
        upload: &PhotoUpload,
    ) -> Result<CityReviewPhoto> {
        let path = format!("{user_id}/{review_id}/{}.{}", Ulid::new(), upload.extension());
        let url = self
            .objects
            .upload(
                REVIEW_PHOTO_BUCKET,
                &path,
                upload.bytes.clone(),
                &upload.mime_type(),
            )
            .await
            .map_err(|e| {
                error!(review_id = %review_id, file = %upload.file_name, error = %e, "photo upload failed");
                e
            })?;
        Ok(self.store.insert_photo(review_id, &url).await?)
    }

    /// Delete a review, its photos and their stored files.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such review, or a store error.
    pub async fn delete_review(&self, key: &CityKey) -> Result<()> {
        let user_id = self.user_id().await?;
        let review = self
            .review(key)
            .await
            .ok_or_else(|| AppError::NotFound(format!("review of {key}")))?;
        let paths: Vec<String> = self
            .photos(review.id)
            .await
            .iter()
            .filter_map(|p| object_path(&p.photo_url, REVIEW_PHOTO_BUCKET))
            .collect();

        if !paths.is_empty() {
            self.objects.remove(REVIEW_PHOTO_BUCKET, &paths).await?;
        }
        self.store.delete_review(user_id, key).await.map_err(|e| {
            error!(user_id = %user_id, review_id = %review.id, error = %e, "failed to delete review");
            e
        })?;
        info!(user_id = %user_id, review_id = %review.id, photos = paths.len(), "review deleted");
        self.reload_reviews().await?;
        Ok(())
    }

    /// Delete one photo and its stored file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the photo is not in the cache, or a store error.
    pub async fn delete_photo(&self, photo_id: PhotoId) -> Result<()> {
        self.user_id().await?;
        let photo = self.photo(photo_id).await?;
        match object_path(&photo.photo_url, REVIEW_PHOTO_BUCKET) {
            Some(path) => self.objects.remove(REVIEW_PHOTO_BUCKET, &[path]).await?,
            None => warn!(photo_id = %photo_id, url = %photo.photo_url, "photo URL outside the photo bucket"),
        }
        self.store.delete_photo(photo_id).await?;
        info!(photo_id = %photo_id, review_id = %photo.review_id, "photo deleted");
        self.reload_reviews().await?;
        Ok(())
    }

    /// Make a photo the review's cover. Any previous cover is cleared first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the photo does not belong to the review, or a
    /// store error.
    pub async fn set_cover_photo(&self, review_id: ReviewId, photo_id: PhotoId) -> Result<()> {
        self.user_id().await?;
        let photo = self.photo(photo_id).await?;
        if photo.review_id != review_id {
            return Err(AppError::NotFound(format!(
                "photo {photo_id} in review {review_id}"
            )));
        }
        self.store.clear_cover(review_id).await?;
        self.store.mark_cover(photo_id).await?;
        info!(review_id = %review_id, photo_id = %photo_id, "cover set");
        self.reload_reviews().await?;
        Ok(())
    }

    /// Leave the review without a cover.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a session, or a store error.
    pub async fn remove_cover_photo(&self, review_id: ReviewId) -> Result<()> {
        self.user_id().await?;
        self.store.clear_cover(review_id).await?;
        info!(review_id = %review_id, "cover removed");
        self.reload_reviews().await?;
        Ok(())
    }

    /// Store a new cover placement.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoverPosition` for an out-of-range position,
    /// `NotSignedIn` without a session, or a store error.
    pub async fn update_cover_position(&self, key: &CityKey, position: CoverPosition) -> Result<()> {
        position.validate()?;
        let user_id = self.user_id().await?;
        self.store
            .update_cover_position(user_id, key, position)
            .await
            .map_err(|e| {
                error!(user_id = %user_id, city = %key.city, state = %key.state, error = %e, "failed to update cover position");
                e
            })?;
        self.reload_reviews().await?;
        Ok(())
    }

    async fn photo(&self, photo_id: PhotoId) -> Result<CityReviewPhoto> {
        self.cache
            .read()
            .await
            .photos
            .iter()
            .find(|p| p.id == photo_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("photo {photo_id}")))
    }
}
