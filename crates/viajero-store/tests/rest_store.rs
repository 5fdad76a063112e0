//! `RestStore` against a mocked backend.

use serde_json::json;
use viajero_core::{BrazilianState, CityKey, CityList, ReviewId, TrackedCity, UserId};
use viajero_store::{
    AccessToken, GeometrySource, ObjectStore, RestOptions, RestStore, Store, StoreError,
};
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "5b0a6a43-8f6f-4b1c-9d58-2f8d6f3f2a11";

fn user() -> UserId {
    USER.parse().unwrap()
}

async fn store(server: &MockServer) -> (RestStore, AccessToken) {
    let token = AccessToken::new();
    let store = RestStore::new(server.uri(), "anon-key", token.clone(), &RestOptions::default())
        .unwrap();
    (store, token)
}

// ============================================================================
// Tracked Cities
// ============================================================================

#[tokio::test]
async fn list_cities_filters_by_user_and_orders_by_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/visited_cities"))
        .and(query_param("user_id", format!("eq.{USER}")))
        .and(query_param("order", "visited_at.desc"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "8c7e2c4e-0000-4000-8000-000000000001",
            "user_id": USER,
            "city_name": "Belo Horizonte",
            "state_name": "Minas Gerais",
            "state_abbreviation": "MG",
            "area_km2": null,
            "city_code": "3106200",
            "visited_at": "2024-05-01T12:00:00+00:00"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let (store, _) = store(&server).await;
    let cities = store.list_cities(user(), CityList::Visited).await.unwrap();
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].state_name, BrazilianState::MinasGerais);
    assert_eq!(cities[0].area_km2, 0.0);
}

#[tokio::test]
async fn insert_city_writes_abbreviation_and_list_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/wishlist_cities"))
        .and(body_partial_json(json!({
            "city_name": "Olinda",
            "state_name": "Pernambuco",
            "state_abbreviation": "PE",
            "area_km2": 41.3
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let (store, _) = store(&server).await;
    let city = TrackedCity::new(
        user(),
        CityKey::new("Olinda", BrazilianState::Pernambuco),
        41.3,
        None,
    );
    store.insert_city(CityList::Wishlist, &city).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("added_at").is_some());
}

#[tokio::test]
async fn unique_violation_maps_to_duplicate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/visited_cities"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&server)
        .await;

    let (store, _) = store(&server).await;
    let city = TrackedCity::new(
        user(),
        CityKey::new("Belo Horizonte", BrazilianState::MinasGerais),
        331.354,
        None,
    );
    let result = store.insert_city(CityList::Visited, &city).await;
    assert!(matches!(result, Err(StoreError::Duplicate(_))));
}

#[tokio::test]
async fn signed_in_requests_carry_the_user_token() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/visited_cities"))
        .and(query_param("city_name", "eq.Belo Horizonte"))
        .and(query_param("state_name", "eq.Minas Gerais"))
        .and(header("authorization", "Bearer user-jwt"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (store, token) = store(&server).await;
    token.set("user-jwt").await;
    store
        .delete_city(
            user(),
            CityList::Visited,
            &CityKey::new("Belo Horizonte", BrazilianState::MinasGerais),
        )
        .await
        .unwrap();
}

// ============================================================================
// Reviews and Photos
// ============================================================================

#[tokio::test]
async fn photos_for_all_reviews_come_from_one_request() {
    let server = MockServer::start().await;
    let a = ReviewId::generate();
    let b = ReviewId::generate();
    Mock::given(method("GET"))
        .and(path("/rest/v1/city_review_photos"))
        .and(query_param("review_id", format!("in.({a},{b})")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "8c7e2c4e-0000-4000-8000-0000000000aa",
            "review_id": a.to_string(),
            "photo_url": "https://cdn/x.jpg",
            "is_cover": null,
            "created_at": "2024-05-01T12:00:00Z"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let (store, _) = store(&server).await;
    let photos = store.list_photos(&[a, b]).await.unwrap();
    assert_eq!(photos.len(), 1);
    assert!(!photos[0].is_cover);
}

#[tokio::test]
async fn no_reviews_means_no_photo_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let (store, _) = store(&server).await;
    assert!(store.list_photos(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn clearing_the_cover_patches_every_photo_of_the_review() {
    let server = MockServer::start().await;
    let review = ReviewId::generate();
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/city_review_photos"))
        .and(query_param("review_id", format!("eq.{review}")))
        .and(body_json(json!({ "is_cover": false })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (store, _) = store(&server).await;
    store.clear_cover(review).await.unwrap();
}

// ============================================================================
// Objects
// ============================================================================

#[tokio::test]
async fn upload_returns_public_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/city-review-photos/u/r/p.jpg"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "x"})))
        .expect(1)
        .mount(&server)
        .await;

    let (store, _) = store(&server).await;
    let url = store
        .upload("city-review-photos", "u/r/p.jpg", vec![0xff, 0xd8], "image/jpeg")
        .await
        .unwrap();
    assert_eq!(
        url,
        format!(
            "{}/storage/v1/object/public/city-review-photos/u/r/p.jpg",
            server.uri()
        )
    );
}

#[tokio::test]
async fn remove_sends_prefixes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/avatars"))
        .and(body_json(json!({ "prefixes": ["u/avatar.png"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (store, _) = store(&server).await;
    store
        .remove("avatars", &["u/avatar.png".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn storage_duplicate_status_in_body_is_duplicate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "statusCode": "409",
            "error": "Duplicate",
            "message": "The resource already exists"
        })))
        .mount(&server)
        .await;

    let (store, _) = store(&server).await;
    let result = store.upload("avatars", "u/avatar.png", vec![1], "image/png").await;
    assert!(matches!(result, Err(StoreError::Duplicate(_))));
}

// ============================================================================
// Geometry
// ============================================================================

#[tokio::test]
async fn geometry_rpc_accepts_features_and_null() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/get_municipality_geometry"))
        .and(body_json(json!({"city_name": "Salvador", "state_name": "Bahia"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-38.6, -12.9], [-38.3, -12.9], [-38.3, -13.0], [-38.6, -12.9]]]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/get_municipality_geometry"))
        .and(body_json(json!({"city_name": "Atlantis", "state_name": "Bahia"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .mount(&server)
        .await;

    let (store, _) = store(&server).await;
    let found = store
        .geometry(&CityKey::new("Salvador", BrazilianState::Bahia))
        .await
        .unwrap();
    assert_eq!(found.map(|g| g.polygon_count()), Some(1));
    let missing = store
        .geometry(&CityKey::new("Atlantis", BrazilianState::Bahia))
        .await
        .unwrap();
    assert!(missing.is_none());
}
