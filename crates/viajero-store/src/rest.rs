//! Hosted backend over its PostgREST and storage HTTP interfaces.
//!
//! Tables live under `{base}/rest/v1/{table}`, functions under
//! `{base}/rest/v1/rpc/{name}`, and files under `{base}/storage/v1/object`.
//! Every request carries the project's anon key as `apikey` and the
//! signed-in user's token (or the anon key) as the bearer.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use viajero_core::{
    CityKey, CityList, CityReview, CityReviewPhoto, CoverPosition, PhotoId, Profile, ReviewId,
    ReviewUpsert, TrackedCity, UserId, UserSettings, UserSettingsRecord,
};
use viajero_geo::Geometry;

use crate::error::{Result, StoreError};
use crate::token::AccessToken;
use crate::{GeometrySource, ObjectStore, Store};

const REVIEWS: &str = "city_reviews";
const PHOTOS: &str = "city_review_photos";
const SETTINGS: &str = "user_settings";
const PROFILES: &str = "profiles";
const REVIEW_CONFLICT: &str = "user_id,city_name,state_name";
const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=representation";

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct RestOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for RestOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

/// Error body shapes returned by the backend. PostgREST sends
/// `{code, message}`, storage sends `{statusCode, error, message}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "statusCode")]
    status_code: Option<Value>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

fn value_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Turn a non-success response into a [`StoreError`].
///
/// Shared with the auth client, whose error bodies use `msg` and
/// `error_description` instead of `message`.
pub async fn reply_error(response: Response) -> StoreError {
    let status = response.status().as_u16();
    match response.json::<ErrorBody>().await {
        Ok(body) => {
            let status = value_text(body.status_code)
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(status);
            let message = body
                .message
                .or(body.msg)
                .or(body.error_description)
                .or_else(|| body.error.clone())
                .unwrap_or_else(|| format!("HTTP {status}"));
            let code = value_text(body.code).or(body.error);
            StoreError::from_reply(status, code, message)
        }
        Err(_) => StoreError::from_reply(status, None, format!("HTTP {status}")),
    }
}

/// Handle API response and convert errors.
async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    if response.status().is_success() {
        return Ok(response.json().await?);
    }
    Err(reply_error(response).await)
}

/// Handle a response whose body is ignored.
async fn handle_empty(response: Response) -> Result<()> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(reply_error(response).await)
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// Store backed by the hosted PostgREST / storage interface.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    anon_key: String,
    token: AccessToken,
}

impl RestStore {
    /// Create a client for the project at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        token: AccessToken,
        options: &RestOptions,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| StoreError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            token,
        })
    }

    /// The project base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self
            .token
            .get()
            .await
            .unwrap_or_else(|| self.anon_key.clone());
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("authorization", format!("Bearer {bearer}"))
    }

    async fn table(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        self.request(method, &url).await
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Response> {
        let url = format!("{}/rest/v1/rpc/{function}", self.base_url);
        Ok(self.request(Method::POST, &url).await.json(&args).send().await?)
    }

    fn object_url(&self, bucket: &str) -> String {
        format!("{}/storage/v1/object/{bucket}", self.base_url)
    }
}

#[async_trait]
impl Store for RestStore {
    async fn list_cities(&self, user_id: UserId, list: CityList) -> Result<Vec<TrackedCity>> {
        let response = self
            .table(Method::GET, list.table())
            .await
            .query(&[
                ("select", "*".to_string()),
                ("user_id", eq(user_id)),
                ("order", format!("{}.desc", list.timestamp_column())),
            ])
            .send()
            .await?;
        handle_response(response).await
    }

    async fn insert_city(&self, list: CityList, city: &TrackedCity) -> Result<()> {
        let mut row = Map::new();
        row.insert("user_id".into(), json!(city.user_id));
        row.insert("city_name".into(), json!(city.city_name));
        row.insert("state_name".into(), json!(city.state_name));
        row.insert(
            "state_abbreviation".into(),
            json!(city.state_name.abbreviation()),
        );
        row.insert("area_km2".into(), json!(city.area_km2));
        row.insert("city_code".into(), json!(city.city_code));
        row.insert(list.timestamp_column().into(), json!(city.added_at));

        let response = self
            .table(Method::POST, list.table())
            .await
            .header("prefer", "return=minimal")
            .json(&Value::Object(row))
            .send()
            .await?;
        handle_empty(response).await
    }

    async fn delete_city(&self, user_id: UserId, list: CityList, key: &CityKey) -> Result<()> {
        let response = self
            .table(Method::DELETE, list.table())
            .await
            .query(&[
                ("user_id", eq(user_id)),
                ("city_name", eq(&key.city)),
                ("state_name", eq(key.state)),
            ])
            .send()
            .await?;
        handle_empty(response).await
    }

    async fn list_reviews(&self, user_id: UserId) -> Result<Vec<CityReview>> {
        let response = self
            .table(Method::GET, REVIEWS)
            .await
            .query(&[("select", "*".to_string()), ("user_id", eq(user_id))])
            .send()
            .await?;
        handle_response(response).await
    }

    async fn upsert_review(&self, review: &ReviewUpsert) -> Result<CityReview> {
        let response = self
            .table(Method::POST, REVIEWS)
            .await
            .query(&[("on_conflict", REVIEW_CONFLICT)])
            .header("prefer", UPSERT_PREFER)
            .json(review)
            .send()
            .await?;
        let rows: Vec<CityReview> = handle_response(response).await?;
        rows.into_iter().next().ok_or_else(|| {
            StoreError::NotFound(format!("upserted review {}-{}", review.city_name, review.state_name))
        })
    }

    async fn delete_review(&self, user_id: UserId, key: &CityKey) -> Result<()> {
        let response = self
            .table(Method::DELETE, REVIEWS)
            .await
            .query(&[
                ("user_id", eq(user_id)),
                ("city_name", eq(&key.city)),
                ("state_name", eq(key.state)),
            ])
            .send()
            .await?;
        handle_empty(response).await
    }

    async fn update_cover_position(
        &self,
        user_id: UserId,
        key: &CityKey,
        position: CoverPosition,
    ) -> Result<()> {
        let response = self
            .table(Method::PATCH, REVIEWS)
            .await
            .query(&[
                ("user_id", eq(user_id)),
                ("city_name", eq(&key.city)),
                ("state_name", eq(key.state)),
            ])
            .json(&json!({
                "cover_photo_position_x": position.x,
                "cover_photo_position_y": position.y,
                "cover_photo_scale": position.scale,
                "updated_at": Utc::now(),
            }))
            .send()
            .await?;
        handle_empty(response).await
    }

    async fn list_photos(&self, review_ids: &[ReviewId]) -> Result<Vec<CityReviewPhoto>> {
        if review_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = review_ids.iter().map(ToString::to_string).collect();
        let response = self
            .table(Method::GET, PHOTOS)
            .await
            .query(&[
                ("select", "*".to_string()),
                ("review_id", format!("in.({})", ids.join(","))),
                ("order", "created_at.asc".to_string()),
            ])
            .send()
            .await?;
        handle_response(response).await
    }

    async fn insert_photo(&self, review_id: ReviewId, photo_url: &str) -> Result<CityReviewPhoto> {
        let response = self
            .table(Method::POST, PHOTOS)
            .await
            .header("prefer", "return=representation")
            .json(&json!({
                "review_id": review_id,
                "photo_url": photo_url,
                "is_cover": false,
            }))
            .send()
            .await?;
        let rows: Vec<CityReviewPhoto> = handle_response(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("inserted photo for {review_id}")))
    }

    async fn delete_photo(&self, photo_id: PhotoId) -> Result<()> {
        let response = self
            .table(Method::DELETE, PHOTOS)
            .await
            .query(&[("id", eq(photo_id))])
            .send()
            .await?;
        handle_empty(response).await
    }

    async fn clear_cover(&self, review_id: ReviewId) -> Result<()> {
        let response = self
            .table(Method::PATCH, PHOTOS)
            .await
            .query(&[("review_id", eq(review_id))])
            .json(&json!({ "is_cover": false }))
            .send()
            .await?;
        handle_empty(response).await
    }

    async fn mark_cover(&self, photo_id: PhotoId) -> Result<()> {
        let response = self
            .table(Method::PATCH, PHOTOS)
            .await
            .query(&[("id", eq(photo_id))])
            .json(&json!({ "is_cover": true }))
            .send()
            .await?;
        handle_empty(response).await
    }

    async fn get_settings(&self, user_id: UserId) -> Result<Option<UserSettings>> {
        let response = self
            .table(Method::GET, SETTINGS)
            .await
            .query(&[
                ("select", "state_colors,wishlist_color".to_string()),
                ("user_id", eq(user_id)),
            ])
            .send()
            .await?;
        let rows: Vec<UserSettings> = handle_response(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn put_settings(&self, record: &UserSettingsRecord) -> Result<()> {
        let response = self
            .table(Method::POST, SETTINGS)
            .await
            .query(&[("on_conflict", "user_id")])
            .header("prefer", "resolution=merge-duplicates,return=minimal")
            .json(record)
            .send()
            .await?;
        handle_empty(response).await
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>> {
        let response = self
            .table(Method::GET, PROFILES)
            .await
            .query(&[("select", "*".to_string()), ("user_id", eq(user_id))])
            .send()
            .await?;
        let rows: Vec<Profile> = handle_response(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn put_profile(&self, profile: &Profile) -> Result<()> {
        let response = self
            .table(Method::POST, PROFILES)
            .await
            .query(&[("on_conflict", "user_id")])
            .header("prefer", "resolution=merge-duplicates,return=minimal")
            .json(profile)
            .send()
            .await?;
        handle_empty(response).await
    }

    async fn delete_account(&self, user_id: UserId) -> Result<()> {
        debug!(user_id = %user_id, "deleting account");
        let response = self.rpc("delete_user_account", json!({})).await?;
        handle_empty(response).await
    }
}

#[async_trait]
impl ObjectStore for RestStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let url = format!("{}/{path}", self.object_url(bucket));
        let response = self
            .request(Method::POST, &url)
            .await
            .header("content-type", content_type)
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        handle_empty(response).await?;
        Ok(self.public_url(bucket, path))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let response = self
            .request(Method::DELETE, &self.object_url(bucket))
            .await
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        handle_empty(response).await
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(url.to_string()));
        }
        if !response.status().is_success() {
            return Err(reply_error(response).await);
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl GeometrySource for RestStore {
    async fn geometry(&self, key: &CityKey) -> Result<Option<Geometry>> {
        let response = self
            .rpc(
                "get_municipality_geometry",
                json!({ "city_name": key.city, "state_name": key.state }),
            )
            .await?;
        let value: Value = handle_response(response).await?;
        let geometry = match &value {
            Value::Null => return Ok(None),
            Value::Object(object) if object.contains_key("geometry") => &object["geometry"],
            other => other,
        };
        if geometry.is_null() {
            return Ok(None);
        }
        match Geometry::from_geojson(geometry) {
            Ok(geometry) => Ok(Some(geometry)),
            Err(e) => {
                warn!(city = %key.city, state = %key.state, error = %e, "unusable geometry from backend");
                Ok(None)
            }
        }
    }
}
