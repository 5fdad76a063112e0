//! City reviews, their photos, and the cover-photo placement.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ViajeroError};
use crate::{BrazilianState, CityKey, PhotoId, ReviewId, UserId};

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of photos attached to one review.
pub const MAX_PHOTOS_PER_REVIEW: usize = 10;

/// Smallest accepted cover zoom.
pub const MIN_COVER_SCALE: f64 = 0.5;

/// Largest accepted cover zoom.
pub const MAX_COVER_SCALE: f64 = 10.0;

/// Storage bucket holding review photos.
pub const REVIEW_PHOTO_BUCKET: &str = "city-review-photos";

/// A star rating from 0.5 to 5 in half steps.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating(f64);

impl Rating {
    /// Validate a raw rating.
    ///
    /// Zero means "no star selected" and gets its own error so the form can
    /// ask the user to pick one.
    ///
    /// # Errors
    ///
    /// Returns `MissingRating` for 0 and `InvalidRating` for anything that is
    /// not one of 0.5, 1.0, ..., 5.0.
    pub fn new(value: f64) -> Result<Self> {
        if value == 0.0 {
            return Err(ViajeroError::MissingRating);
        }
        let doubled = value * 2.0;
        if !value.is_finite() || !(0.5..=5.0).contains(&value) || doubled.fract() != 0.0 {
            return Err(ViajeroError::InvalidRating { value });
        }
        Ok(Self(value))
    }

    /// The rating value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Number of full stars and whether a half star follows.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn stars(self) -> (u8, bool) {
        let full = self.0.floor() as u8;
        (full, self.0.fract() != 0.0)
    }
}

impl TryFrom<f64> for Rating {
    type Error = ViajeroError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Where the cover photo sits inside the municipality outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverPosition {
    /// Horizontal focal point in [0, 1].
    pub x: f64,
    /// Vertical focal point in [0, 1].
    pub y: f64,
    /// Zoom factor in [`MIN_COVER_SCALE`, `MAX_COVER_SCALE`].
    pub scale: f64,
}

impl Default for CoverPosition {
    fn default() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            scale: 1.0,
        }
    }
}

impl CoverPosition {
    /// Build a validated position.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoverPosition` if any component is out of range or not
    /// finite.
    pub fn new(x: f64, y: f64, scale: f64) -> Result<Self> {
        let position = Self { x, y, scale };
        position.validate()?;
        Ok(position)
    }

    /// Check ranges and finiteness.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoverPosition` describing the first bad component.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("x", self.x), ("y", self.y)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ViajeroError::InvalidCoverPosition(format!(
                    "{name}={value} is outside [0, 1]"
                )));
            }
        }
        if !self.scale.is_finite() || !(MIN_COVER_SCALE..=MAX_COVER_SCALE).contains(&self.scale) {
            return Err(ViajeroError::InvalidCoverPosition(format!(
                "scale={} is outside [{MIN_COVER_SCALE}, {MAX_COVER_SCALE}]",
                self.scale
            )));
        }
        Ok(())
    }
}

/// A review as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityReview {
    /// Review id.
    pub id: ReviewId,
    /// Author.
    pub user_id: UserId,
    /// Municipality name.
    pub city_name: String,
    /// State name.
    pub state_name: BrazilianState,
    /// IBGE code of the municipality, when it was resolved on save.
    #[serde(default)]
    pub city_code: Option<String>,
    /// Star rating.
    pub rating: Rating,
    /// Free-text comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Cover focal point x (nullable in older rows).
    #[serde(default)]
    pub cover_photo_position_x: Option<f64>,
    /// Cover focal point y (nullable in older rows).
    #[serde(default)]
    pub cover_photo_position_y: Option<f64>,
    /// Cover zoom (nullable in older rows).
    #[serde(default)]
    pub cover_photo_scale: Option<f64>,
    /// First day of the visit.
    #[serde(default)]
    pub visit_start_date: Option<NaiveDate>,
    /// Last day of the visit.
    #[serde(default)]
    pub visit_end_date: Option<NaiveDate>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl CityReview {
    /// The municipality this review is about.
    #[must_use]
    pub fn key(&self) -> CityKey {
        CityKey::new(self.city_name.clone(), self.state_name)
    }

    /// Stored cover placement, with defaults for missing columns.
    #[must_use]
    pub fn cover_position(&self) -> CoverPosition {
        let default = CoverPosition::default();
        CoverPosition {
            x: self.cover_photo_position_x.unwrap_or(default.x),
            y: self.cover_photo_position_y.unwrap_or(default.y),
            scale: self.cover_photo_scale.unwrap_or(default.scale),
        }
    }
}

/// Column set written when a review is upserted.
///
/// Conflicts resolve on `(user_id, city_name, state_name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewUpsert {
    /// Author.
    pub user_id: UserId,
    /// Municipality name.
    pub city_name: String,
    /// State name.
    pub state_name: BrazilianState,
    /// IBGE code.
    pub city_code: Option<String>,
    /// Star rating.
    pub rating: Rating,
    /// Comment, `None` when left blank.
    pub comment: Option<String>,
    /// Cover focal point x.
    pub cover_photo_position_x: f64,
    /// Cover focal point y.
    pub cover_photo_position_y: f64,
    /// Cover zoom.
    pub cover_photo_scale: f64,
    /// First day of the visit.
    pub visit_start_date: Option<NaiveDate>,
    /// Last day of the visit.
    pub visit_end_date: Option<NaiveDate>,
    /// Update time.
    pub updated_at: DateTime<Utc>,
}

/// A photo attached to a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityReviewPhoto {
    /// Photo id.
    pub id: PhotoId,
    /// Owning review.
    pub review_id: ReviewId,
    /// Public URL of the stored object.
    pub photo_url: String,
    /// Whether this is the review's cover.
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_cover: bool,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

fn null_as_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// The cover photo among a review's photos, if one is marked.
#[must_use]
pub fn cover_photo(photos: &[CityReviewPhoto]) -> Option<&CityReviewPhoto> {
    photos.iter().find(|photo| photo.is_cover)
}

/// Check that adding `added` photos keeps the review within the limit.
///
/// # Errors
///
/// Returns `TooManyPhotos` when the total would exceed
/// [`MAX_PHOTOS_PER_REVIEW`].
pub fn check_photo_capacity(existing: usize, added: usize) -> Result<()> {
    if existing + added > MAX_PHOTOS_PER_REVIEW {
        return Err(ViajeroError::TooManyPhotos {
            existing,
            added,
            max: MAX_PHOTOS_PER_REVIEW,
        });
    }
    Ok(())
}

/// A photo selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    /// Original file name, used for the extension.
    pub file_name: String,
    /// MIME type, if known.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    /// Lower-cased file extension, `jpg` when the name has none.
    #[must_use]
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or_else(|| "jpg".to_string(), str::to_lowercase)
    }

    /// MIME type, guessed from the extension when not given.
    #[must_use]
    pub fn mime_type(&self) -> String {
        if let Some(content_type) = &self.content_type {
            return content_type.clone();
        }
        match self.extension().as_str() {
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "image/jpeg",
        }
        .to_string()
    }
}

/// Everything the review form submits.
#[derive(Debug, Clone, Default)]
pub struct ReviewDraft {
    /// Raw star value, 0 when nothing was picked.
    pub rating: f64,
    /// Comment text; blank means none.
    pub comment: String,
    /// Photos to upload with this save.
    pub new_photos: Vec<PhotoUpload>,
    /// Index into `new_photos` of the photo to make the cover.
    pub cover_photo_index: Option<usize>,
    /// Cover placement.
    pub cover_position: CoverPosition,
    /// First day of the visit.
    pub visit_start_date: Option<NaiveDate>,
    /// Last day of the visit.
    pub visit_end_date: Option<NaiveDate>,
}

impl ReviewDraft {
    /// Validate the draft against the photos already on the review.
    ///
    /// Checks run in form order: rating, photo count, cover index, cover
    /// placement, visit dates.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn validate(&self, existing_photos: usize) -> Result<Rating> {
        let rating = Rating::new(self.rating)?;
        check_photo_capacity(existing_photos, self.new_photos.len())?;
        if let Some(index) = self.cover_photo_index {
            if index >= self.new_photos.len() {
                return Err(ViajeroError::InvalidCoverIndex {
                    index,
                    count: self.new_photos.len(),
                });
            }
        }
        self.cover_position.validate()?;
        if let (Some(start), Some(end)) = (self.visit_start_date, self.visit_end_date) {
            if end < start {
                return Err(ViajeroError::InvalidVisitDates);
            }
        }
        Ok(rating)
    }

    /// Comment as stored: `None` when blank.
    #[must_use]
    pub fn stored_comment(&self) -> Option<String> {
        let trimmed = self.comment.trim();
        (!trimmed.is_empty()).then(|| self.comment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn upload(name: &str) -> PhotoUpload {
        PhotoUpload {
            file_name: name.to_string(),
            content_type: None,
            bytes: vec![0xff, 0xd8],
        }
    }

    #[test]
    fn zero_rating_asks_for_a_selection() {
        assert_eq!(Rating::new(0.0), Err(ViajeroError::MissingRating));
        assert!(ViajeroError::MissingRating.to_string().contains("select a star rating"));
    }

    #[test]
    fn half_steps_are_the_only_valid_ratings() {
        for step in 1..=10 {
            let value = f64::from(step) * 0.5;
            assert_eq!(Rating::new(value).unwrap().value(), value);
        }
        for value in [-1.0, 0.25, 0.7, 5.5, 6.0, f64::NAN, f64::INFINITY] {
            assert!(Rating::new(value).is_err(), "{value} should be rejected");
        }
    }

    #[test]
    fn rating_stars() {
        assert_eq!(Rating::new(3.5).unwrap().stars(), (3, true));
        assert_eq!(Rating::new(5.0).unwrap().stars(), (5, false));
    }

    #[test]
    fn rating_deserialization_validates() {
        assert!(serde_json::from_str::<Rating>("4.5").is_ok());
        assert!(serde_json::from_str::<Rating>("4.2").is_err());
    }

    #[test]
    fn photo_capacity_boundary() {
        assert!(check_photo_capacity(0, 10).is_ok());
        assert!(check_photo_capacity(7, 3).is_ok());
        assert_eq!(
            check_photo_capacity(0, 11),
            Err(ViajeroError::TooManyPhotos {
                existing: 0,
                added: 11,
                max: 10
            })
        );
        assert!(check_photo_capacity(10, 1).is_err());
    }

    #[test]
    fn cover_position_ranges() {
        assert!(CoverPosition::new(0.0, 1.0, 0.5).is_ok());
        assert!(CoverPosition::new(0.5, 0.5, 10.0).is_ok());
        assert!(CoverPosition::new(1.1, 0.5, 1.0).is_err());
        assert!(CoverPosition::new(0.5, f64::NAN, 1.0).is_err());
        assert!(CoverPosition::new(0.5, 0.5, 0.4).is_err());
        assert!(CoverPosition::new(0.5, 0.5, 10.5).is_err());
    }

    #[test]
    fn draft_rejects_cover_index_outside_new_photos() {
        let draft = ReviewDraft {
            rating: 4.0,
            new_photos: vec![upload("a.jpg")],
            cover_photo_index: Some(1),
            ..ReviewDraft::default()
        };
        assert_eq!(
            draft.validate(0),
            Err(ViajeroError::InvalidCoverIndex { index: 1, count: 1 })
        );
    }

    #[test]
    fn draft_checks_rating_before_photos() {
        let draft = ReviewDraft {
            rating: 0.0,
            new_photos: (0..11).map(|i| upload(&format!("{i}.png"))).collect(),
            ..ReviewDraft::default()
        };
        assert_eq!(draft.validate(0), Err(ViajeroError::MissingRating));
    }

    #[test]
    fn draft_rejects_reversed_visit_dates() {
        let draft = ReviewDraft {
            rating: 2.5,
            visit_start_date: NaiveDate::from_ymd_opt(2024, 3, 10),
            visit_end_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..ReviewDraft::default()
        };
        assert_eq!(draft.validate(0), Err(ViajeroError::InvalidVisitDates));
    }

    #[test]
    fn blank_comment_is_not_stored() {
        let draft = ReviewDraft {
            comment: "   ".into(),
            ..ReviewDraft::default()
        };
        assert_eq!(draft.stored_comment(), None);
    }

    #[test]
    fn photo_upload_extension_and_mime() {
        assert_eq!(upload("Praia.PNG").extension(), "png");
        assert_eq!(upload("Praia.PNG").mime_type(), "image/png");
        assert_eq!(upload("noext").extension(), "jpg");
    }

    #[test]
    fn review_without_cover_columns_uses_defaults() {
        let json = serde_json::json!({
            "id": ReviewId::generate().to_string(),
            "user_id": UserId::generate().to_string(),
            "city_name": "Tiradentes",
            "state_name": "Minas Gerais",
            "rating": 4.5,
            "comment": null,
            "cover_photo_position_x": null,
            "cover_photo_position_y": 0.25,
            "cover_photo_scale": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        });
        let review: CityReview = serde_json::from_value(json).unwrap();
        let position = review.cover_position();
        assert_eq!(position.x, 0.5);
        assert_eq!(position.y, 0.25);
        assert_eq!(position.scale, 1.0);
    }

    #[test]
    fn null_is_cover_reads_as_false() {
        let json = serde_json::json!({
            "id": PhotoId::generate().to_string(),
            "review_id": ReviewId::generate().to_string(),
            "photo_url": "https://example.com/a.jpg",
            "is_cover": null,
            "created_at": "2024-01-01T00:00:00Z"
        });
        let photo: CityReviewPhoto = serde_json::from_value(json).unwrap();
        assert!(!photo.is_cover);
    }

    proptest! {
        #[test]
        fn accepted_ratings_are_half_steps(value in -10.0f64..10.0) {
            if let Ok(rating) = Rating::new(value) {
                let doubled = rating.value() * 2.0;
                prop_assert_eq!(doubled.fract(), 0.0);
                prop_assert!((0.5..=5.0).contains(&rating.value()));
            }
        }
    }
}
