//! Error types for Viaje.ro domain validation.

use crate::city::CityList;
use crate::credentials::PasswordRule;
use crate::ids::IdError;

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, ViajeroError>;

/// Errors raised by domain validation.
///
/// All of these are detected locally, before any call to the remote store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViajeroError {
    /// No star rating was chosen.
    #[error("please select a star rating")]
    MissingRating,

    /// The rating is outside 0.5..=5 or not a half step.
    #[error("invalid rating: {value} (expected 0.5 to 5 in half steps)")]
    InvalidRating {
        /// The rejected value.
        value: f64,
    },

    /// Too many photos for a single review.
    #[error("a review holds at most {max} photos ({existing} saved, {added} new)")]
    TooManyPhotos {
        /// Photos already saved on the review.
        existing: usize,
        /// Photos being added.
        added: usize,
        /// Upper bound.
        max: usize,
    },

    /// The cover index does not point at one of the new photos.
    #[error("cover photo index {index} is out of range for {count} new photos")]
    InvalidCoverIndex {
        /// The requested index.
        index: usize,
        /// Number of new photos.
        count: usize,
    },

    /// Cover focal point or scale is out of range or not finite.
    #[error("invalid cover position: {0}")]
    InvalidCoverPosition(String),

    /// The visit ends before it starts.
    #[error("visit end date is before the start date")]
    InvalidVisitDates,

    /// Not a `#rgb` / `#rrggbb` colour.
    #[error("invalid colour: {0}")]
    InvalidColor(String),

    /// Not one of the 26 states or the federal district.
    #[error("unknown state: {0}")]
    UnknownState(String),

    /// A required form field is empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Password does not satisfy the sign-up policy.
    #[error("{0}")]
    WeakPassword(PasswordRule),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Malformed email address.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The municipality is not in the reference data.
    #[error("city not found: {city} ({state})")]
    CityNotFound {
        /// City name as entered.
        city: String,
        /// State name as entered.
        state: String,
    },

    /// The city is already on the list.
    #[error("{city} is already on your {list}")]
    Duplicate {
        /// City name.
        city: String,
        /// State name.
        state: String,
        /// Which list rejected it.
        list: CityList,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Reference data could not be read.
    #[error("reference data unavailable: {0}")]
    ReferenceUnavailable(String),

    /// Reference data could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}
