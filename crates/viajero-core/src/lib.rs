//! Core types for Viaje.ro.
//!
//! This crate provides the domain model shared by every other crate:
//!
//! - **Identifiers**: `UserId`, `ReviewId`, `PhotoId`
//! - **Places**: `BrazilianState`, `CityKey`, `TrackedCity`, `CityList`
//! - **Reviews**: `CityReview`, `CityReviewPhoto`, `Rating`, `CoverPosition`
//! - **Settings**: `UserSettings`, `HexColor`
//! - **Reference data**: `ReferenceData` (IBGE municipalities, states, country)
//! - **Statistics**: `CityStatistics`
//!
//! Every check here runs locally; nothing in this crate talks to the network.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod city;
pub mod credentials;
pub mod error;
pub mod ids;
pub mod profile;
pub mod reference;
pub mod review;
pub mod settings;
pub mod state;
pub mod stats;

pub use city::{CityKey, CityList, TrackedCity};
pub use credentials::{PasswordRule, SignUpForm};
pub use error::{Result, ViajeroError};
pub use ids::{IdError, PhotoId, ReviewId, UserId};
pub use profile::{Profile, AVATAR_BUCKET};
pub use reference::{CityData, InfantMortality, ReferenceData, StateData, BRAZIL_AREA_KM2};
pub use review::{
    CityReview, CityReviewPhoto, CoverPosition, PhotoUpload, Rating, ReviewDraft, ReviewUpsert,
    MAX_COVER_SCALE, MAX_PHOTOS_PER_REVIEW, MIN_COVER_SCALE, REVIEW_PHOTO_BUCKET,
};
pub use settings::{HexColor, UserSettings, UserSettingsRecord, DEFAULT_WISHLIST_COLOR};
pub use state::{BrazilianState, FALLBACK_STATE_COLOR};
pub use stats::{CityStatistics, Extremes, IndicatorStats, StateBreakdown};
