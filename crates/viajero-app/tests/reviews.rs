//! Review, photo and cover integration tests.

mod common;

use common::{belo_horizonte, draft, photo, TestHarness};
use viajero_app::AppError;
use viajero_core::{
    BrazilianState, CityKey, CoverPosition, PhotoId, ViajeroError, REVIEW_PHOTO_BUCKET,
};

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn missing_rating_is_rejected_before_the_store() {
    let harness = TestHarness::new().await;
    let calls = harness.store.calls();

    let result = harness
        .tracker
        .save_review(&belo_horizonte(), &draft(0.0))
        .await;

    assert!(matches!(
        result,
        Err(AppError::Validation(ViajeroError::MissingRating))
    ));
    assert_eq!(
        result.unwrap_err().notice().message,
        "Please select a star rating."
    );
    assert_eq!(harness.store.calls(), calls);
}

#[tokio::test]
async fn eleven_photos_are_rejected_and_nothing_is_uploaded() {
    let harness = TestHarness::new().await;
    let calls = harness.store.calls();
    let mut review = draft(4.5);
    review.new_photos = (0..11).map(|i| photo(&format!("p{i}.png"))).collect();

    let result = harness.tracker.save_review(&belo_horizonte(), &review).await;

    assert!(matches!(
        result,
        Err(AppError::Validation(ViajeroError::TooManyPhotos { added: 11, .. }))
    ));
    assert_eq!(harness.store.calls(), calls);
    assert!(harness.objects.paths(REVIEW_PHOTO_BUCKET).await.is_empty());
    assert!(harness.tracker.review(&belo_horizonte()).await.is_none());
}

#[tokio::test]
async fn existing_photos_count_towards_the_limit() {
    let harness = TestHarness::new().await;
    let mut first = draft(4.0);
    first.new_photos = (0..8).map(|i| photo(&format!("a{i}.png"))).collect();
    harness
        .tracker
        .save_review(&belo_horizonte(), &first)
        .await
        .unwrap();

    let mut second = draft(4.0);
    second.new_photos = (0..3).map(|i| photo(&format!("b{i}.png"))).collect();
    let result = harness.tracker.save_review(&belo_horizonte(), &second).await;

    assert!(matches!(
        result,
        Err(AppError::Validation(ViajeroError::TooManyPhotos {
            existing: 8,
            added: 3,
            ..
        }))
    ));
    assert_eq!(harness.objects.paths(REVIEW_PHOTO_BUCKET).await.len(), 8);
}

#[tokio::test]
async fn invalid_cover_position_is_rejected() {
    let harness = TestHarness::new().await;
    let mut review = draft(3.0);
    review.cover_position = CoverPosition {
        x: 0.5,
        y: 0.5,
        scale: 11.0,
    };

    let result = harness.tracker.save_review(&belo_horizonte(), &review).await;

    assert!(matches!(
        result,
        Err(AppError::Validation(ViajeroError::InvalidCoverPosition(_)))
    ));
}

// ============================================================================
// Saving
// ============================================================================

#[tokio::test]
async fn save_review_stores_photos_and_cover() {
    let harness = TestHarness::new().await;
    let mut review = draft(4.5);
    review.new_photos = vec![photo("a.png"), photo("b.jpg"), photo("c.webp")];
    review.cover_photo_index = Some(1);

    let saved = harness
        .tracker
        .save_review(&belo_horizonte(), &review)
        .await
        .unwrap();

    assert_eq!(saved.rating.value(), 4.5);
    assert_eq!(saved.city_code.as_deref(), Some("3106200"));
    let photos = harness.tracker.photos(saved.id).await;
    assert_eq!(photos.len(), 3);
    let covers: Vec<_> = photos.iter().filter(|p| p.is_cover).collect();
    assert_eq!(covers.len(), 1);
    assert!(covers[0].photo_url.ends_with(".jpg"));

    let prefix = format!("{}/{}/", harness.user_id, saved.id);
    let paths = harness.objects.paths(REVIEW_PHOTO_BUCKET).await;
    assert_eq!(paths.len(), 3);
    assert!(paths.iter().all(|p| p.starts_with(&prefix)));

    let cover_map = harness.tracker.covers().await;
    assert_eq!(
        cover_map.get(&belo_horizonte()).map(|c| c.photo_url.as_str()),
        Some(covers[0].photo_url.as_str())
    );
}

#[tokio::test]
async fn saving_again_updates_the_same_review() {
    let harness = TestHarness::new().await;
    let first = harness
        .tracker
        .save_review(&belo_horizonte(), &draft(2.0))
        .await
        .unwrap();

    let mut update = draft(5.0);
    update.comment = "   ".into();
    let second = harness
        .tracker
        .save_review(&belo_horizonte(), &update)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.comment, None);
    assert_eq!(harness.tracker.reviews().await.len(), 1);
}

#[tokio::test]
async fn review_of_a_city_outside_reference_keeps_no_code() {
    let harness = TestHarness::new().await;
    let key = CityKey::new("Ouro Preto", BrazilianState::MinasGerais);

    let saved = harness.tracker.save_review(&key, &draft(5.0)).await.unwrap();

    assert_eq!(saved.city_code, None);
}

// ============================================================================
// Covers
// ============================================================================

#[tokio::test]
async fn only_one_photo_is_ever_the_cover() {
    let harness = TestHarness::new().await;
    let mut review = draft(4.0);
    review.new_photos = vec![photo("a.png"), photo("b.png")];
    let saved = harness
        .tracker
        .save_review(&belo_horizonte(), &review)
        .await
        .unwrap();
    let photos = harness.tracker.photos(saved.id).await;
    let (a, b) = (photos[0].id, photos[1].id);

    harness.tracker.set_cover_photo(saved.id, a).await.unwrap();
    harness.tracker.set_cover_photo(saved.id, b).await.unwrap();

    let covers: Vec<_> = harness
        .tracker
        .photos(saved.id)
        .await
        .into_iter()
        .filter(|p| p.is_cover)
        .collect();
    assert_eq!(covers.len(), 1);
    assert_eq!(covers[0].id, b);
    assert_eq!(
        harness.tracker.cover_photo(saved.id).await.map(|p| p.id),
        Some(b)
    );

    harness.tracker.remove_cover_photo(saved.id).await.unwrap();
    assert!(harness.tracker.cover_photo(saved.id).await.is_none());
    assert!(harness.tracker.covers().await.is_empty());
}

#[tokio::test]
async fn cover_must_belong_to_the_review() {
    let harness = TestHarness::new().await;
    let mut with_photo = draft(4.0);
    with_photo.new_photos = vec![photo("a.png")];
    let first = harness
        .tracker
        .save_review(&belo_horizonte(), &with_photo)
        .await
        .unwrap();
    let second = harness
        .tracker
        .save_review(
            &CityKey::new("Salvador", BrazilianState::Bahia),
            &draft(3.0),
        )
        .await
        .unwrap();
    let foreign = harness.tracker.photos(first.id).await[0].id;

    let result = harness.tracker.set_cover_photo(second.id, foreign).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let missing = harness
        .tracker
        .set_cover_photo(first.id, PhotoId::generate())
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn cover_position_is_validated_then_stored() {
    let harness = TestHarness::new().await;
    harness
        .tracker
        .save_review(&belo_horizonte(), &draft(4.0))
        .await
        .unwrap();
    let calls = harness.store.calls();

    let bad = harness
        .tracker
        .update_cover_position(
            &belo_horizonte(),
            CoverPosition {
                x: 1.5,
                y: 0.5,
                scale: 1.0,
            },
        )
        .await;
    assert!(matches!(
        bad,
        Err(AppError::Validation(ViajeroError::InvalidCoverPosition(_)))
    ));
    assert_eq!(harness.store.calls(), calls);

    let position = CoverPosition {
        x: 0.2,
        y: 0.8,
        scale: 2.5,
    };
    harness
        .tracker
        .update_cover_position(&belo_horizonte(), position)
        .await
        .unwrap();
    let review = harness.tracker.review(&belo_horizonte()).await.unwrap();
    assert_eq!(review.cover_position(), position);
}

// ============================================================================
// Deleting
// ============================================================================

#[tokio::test]
async fn delete_review_removes_photos_and_files() {
    let harness = TestHarness::new().await;
    let mut review = draft(4.0);
    review.new_photos = vec![photo("a.png"), photo("b.png")];
    let saved = harness
        .tracker
        .save_review(&belo_horizonte(), &review)
        .await
        .unwrap();

    harness
        .tracker
        .delete_review(&belo_horizonte())
        .await
        .unwrap();

    assert!(harness.tracker.review(&belo_horizonte()).await.is_none());
    assert!(harness.tracker.photos(saved.id).await.is_empty());
    assert!(harness.objects.paths(REVIEW_PHOTO_BUCKET).await.is_empty());
}

#[tokio::test]
async fn deleting_a_missing_review_is_not_found() {
    let harness = TestHarness::new().await;

    let result = harness.tracker.delete_review(&belo_horizonte()).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn delete_photo_removes_one_file() {
    let harness = TestHarness::new().await;
    let mut review = draft(4.0);
    review.new_photos = vec![photo("a.png"), photo("b.png")];
    let saved = harness
        .tracker
        .save_review(&belo_horizonte(), &review)
        .await
        .unwrap();
    let target = harness.tracker.photos(saved.id).await[0].id;

    harness.tracker.delete_photo(target).await.unwrap();

    let remaining = harness.tracker.photos(saved.id).await;
    assert_eq!(remaining.len(), 1);
    assert_ne!(remaining[0].id, target);
    assert_eq!(harness.objects.paths(REVIEW_PHOTO_BUCKET).await.len(), 1);
}
