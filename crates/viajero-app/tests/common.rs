//! Common test utilities for viajero-app integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Notify;

use viajero_app::{Session, Tracker};
use viajero_core::{
    BrazilianState, CityData, CityKey, CityList, CityReview, CityReviewPhoto, CoverPosition,
    PhotoId, PhotoUpload, Profile, ReferenceData, ReviewDraft, ReviewId, ReviewUpsert, StateData,
    TrackedCity, UserId, UserSettings, UserSettingsRecord,
};
use viajero_store::{MemoryObjectStore, MemoryStore, Result, Store};

/// Test harness with in-memory backends and a signed-in user.
pub struct TestHarness {
    /// Record storage.
    pub store: Arc<MemoryStore>,
    /// File storage.
    pub objects: Arc<MemoryObjectStore>,
    /// Tracker under test.
    pub tracker: Arc<Tracker>,
    /// The signed-in user.
    pub user_id: UserId,
}

impl TestHarness {
    /// A harness with a signed-in user and empty storage.
    pub async fn new() -> Self {
        let harness = Self::signed_out();
        harness
            .tracker
            .sign_in(session(harness.user_id))
            .await
            .expect("Failed to sign in");
        harness
    }

    /// A harness with nobody signed in.
    pub fn signed_out() -> Self {
        let store = Arc::new(MemoryStore::new());
        let objects = Arc::new(MemoryObjectStore::new());
        let tracker = Arc::new(Tracker::new(
            store.clone(),
            objects.clone(),
            Arc::new(reference()),
        ));
        Self {
            store,
            objects,
            tracker,
            user_id: UserId::generate(),
        }
    }
}

/// A session for `user_id` valid for an hour.
pub fn session(user_id: UserId) -> Session {
    Session {
        user_id,
        email: Some("viajante@example.com".into()),
        access_token: "test-token".into(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

/// A municipality record with the given area and IBGE code.
pub fn city_data(name: &str, state: BrazilianState, area: f64, code: &str) -> CityData {
    CityData {
        nome: name.into(),
        estado: state,
        gentilico: String::new(),
        area_territorial_km2: area,
        populacao_estimada_censo_2024: 0.0,
        populacao_estimada_censo_2022: 0.0,
        densidade_demografica_2022: 0.0,
        escolarizacao_6a14_2022: 0.0,
        idhm_2010: 0.0,
        mortalidade_infantil_2023: None,
        pib_per_capita_2020: 0.0,
        codigo_ibge: code.into(),
    }
}

/// A small slice of the IBGE reference data.
pub fn reference() -> ReferenceData {
    ReferenceData::new(
        vec![
            city_data("Belo Horizonte", BrazilianState::MinasGerais, 331.354, "3106200"),
            city_data("Contagem", BrazilianState::MinasGerais, 194.746, "3118601"),
            city_data("Salvador", BrazilianState::Bahia, 693.453, "2927408"),
        ],
        vec![
            StateData {
                estado: BrazilianState::MinasGerais,
                area_territorial_km2: 586_513.983,
            },
            StateData {
                estado: BrazilianState::Bahia,
                area_territorial_km2: 564_760.427,
            },
        ],
        Some(8_510_417.771),
    )
}

/// Key of Belo Horizonte.
pub fn belo_horizonte() -> CityKey {
    CityKey::new("Belo Horizonte", BrazilianState::MinasGerais)
}

/// An encoded PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::new_rgb8(width, height)
        .write_to(&mut bytes, image::ImageOutputFormat::Png)
        .expect("Failed to encode PNG");
    bytes.into_inner()
}

/// A small PNG upload.
pub fn photo(name: &str) -> PhotoUpload {
    PhotoUpload {
        file_name: name.into(),
        content_type: Some("image/png".into()),
        bytes: png(4, 3),
    }
}

/// A draft with the given rating and no photos.
pub fn draft(rating: f64) -> ReviewDraft {
    ReviewDraft {
        rating,
        comment: "Pão de queijo everywhere".into(),
        ..ReviewDraft::default()
    }
}

/// A [`Store`] whose next `list_cities` call waits until released.
#[derive(Default)]
pub struct GatedStore {
    /// Wrapped store.
    pub inner: MemoryStore,
    held: AtomicBool,
    /// Notified when a held call has started.
    pub entered: Notify,
    /// Notify to let a held call finish.
    pub release: Notify,
}

impl GatedStore {
    /// Hold the next `list_cities` call.
    pub fn hold_next_list(&self) {
        self.held.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for GatedStore {
    async fn list_cities(&self, user_id: UserId, list: CityList) -> Result<Vec<TrackedCity>> {
        let cities = self.inner.list_cities(user_id, list).await;
        if self.held.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        cities
    }

    async fn insert_city(&self, list: CityList, city: &TrackedCity) -> Result<()> {
        self.inner.insert_city(list, city).await
    }

    async fn delete_city(&self, user_id: UserId, list: CityList, key: &CityKey) -> Result<()> {
        self.inner.delete_city(user_id, list, key).await
    }

    async fn list_reviews(&self, user_id: UserId) -> Result<Vec<CityReview>> {
        self.inner.list_reviews(user_id).await
    }

    async fn upsert_review(&self, review: &ReviewUpsert) -> Result<CityReview> {
        self.inner.upsert_review(review).await
    }

    async fn delete_review(&self, user_id: UserId, key: &CityKey) -> Result<()> {
        self.inner.delete_review(user_id, key).await
    }

    async fn update_cover_position(
        &self,
        user_id: UserId,
        key: &CityKey,
        position: CoverPosition,
    ) -> Result<()> {
        self.inner.update_cover_position(user_id, key, position).await
    }

    async fn list_photos(&self, review_ids: &[ReviewId]) -> Result<Vec<CityReviewPhoto>> {
        self.inner.list_photos(review_ids).await
    }

    async fn insert_photo(&self, review_id: ReviewId, photo_url: &str) -> Result<CityReviewPhoto> {
        self.inner.insert_photo(review_id, photo_url).await
    }

    async fn delete_photo(&self, photo_id: PhotoId) -> Result<()> {
        self.inner.delete_photo(photo_id).await
    }

    async fn clear_cover(&self, review_id: ReviewId) -> Result<()> {
        self.inner.clear_cover(review_id).await
    }

    async fn mark_cover(&self, photo_id: PhotoId) -> Result<()> {
        self.inner.mark_cover(photo_id).await
    }

    async fn get_settings(&self, user_id: UserId) -> Result<Option<UserSettings>> {
        self.inner.get_settings(user_id).await
    }

    async fn put_settings(&self, record: &UserSettingsRecord) -> Result<()> {
        self.inner.put_settings(record).await
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>> {
        self.inner.get_profile(user_id).await
    }

    async fn put_profile(&self, profile: &Profile) -> Result<()> {
        self.inner.put_profile(profile).await
    }

    async fn delete_account(&self, user_id: UserId) -> Result<()> {
        self.inner.delete_account(user_id).await
    }
}
