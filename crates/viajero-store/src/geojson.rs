//! Outlines served from a GeoJSON FeatureCollection.
//!
//! The collection is read on first use and kept for the life of the
//! source. A collection that cannot be read is logged once and treated as
//! empty, so every lookup then misses and callers fall back to
//! placeholders.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use viajero_core::CityKey;
use viajero_geo::{GeoJsonIndex, Geometry};

use crate::error::{Result, StoreError};
use crate::GeometrySource;

/// Where the collection lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoJsonLocation {
    /// A local file.
    File(PathBuf),
    /// An HTTP(S) URL.
    Url(String),
}

impl GeoJsonLocation {
    /// Interpret a configuration value: `http://` and `https://` values are
    /// URLs, anything else is a path.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            Self::Url(value.to_string())
        } else {
            Self::File(PathBuf::from(value))
        }
    }
}

/// A [`GeometrySource`] over a lazily loaded [`GeoJsonIndex`].
#[derive(Debug)]
pub struct GeoJsonSource {
    origin: Option<Origin>,
    index: OnceCell<GeoJsonIndex>,
}

#[derive(Debug)]
struct Origin {
    location: GeoJsonLocation,
    client: Client,
}

impl GeoJsonSource {
    /// Create a source. Nothing is read until the first lookup.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn new(location: GeoJsonLocation, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| StoreError::Configuration(e.to_string()))?;
        Ok(Self {
            origin: Some(Origin { location, client }),
            index: OnceCell::new(),
        })
    }

    /// A source over an already parsed index. It never reads anything.
    #[must_use]
    pub fn from_index(index: GeoJsonIndex) -> Self {
        Self {
            origin: None,
            index: OnceCell::new_with(Some(index)),
        }
    }

    async fn index(&self) -> &GeoJsonIndex {
        self.index
            .get_or_init(|| async {
                match self.load().await {
                    Ok(index) => {
                        info!(features = index.len(), "loaded municipality outlines");
                        index
                    }
                    Err(e) => {
                        let location = self.origin.as_ref().map(|o| &o.location);
                        warn!(location = ?location, error = %e, "municipality outlines unavailable");
                        GeoJsonIndex::default()
                    }
                }
            })
            .await
    }

    async fn load(&self) -> Result<GeoJsonIndex> {
        let Some(Origin { location, client }) = &self.origin else {
            return Ok(GeoJsonIndex::default());
        };
        let text = match location {
            GeoJsonLocation::File(path) => tokio::fs::read_to_string(path).await?,
            GeoJsonLocation::Url(url) => {
                let response = client.get(url).send().await?;
                if !response.status().is_success() {
                    return Err(StoreError::NotFound(format!(
                        "{url}: HTTP {}",
                        response.status()
                    )));
                }
                response.text().await?
            }
        };
        Ok(GeoJsonIndex::parse(&text)?)
    }
}

#[async_trait]
impl GeometrySource for GeoJsonSource {
    async fn geometry(&self, key: &CityKey) -> Result<Option<Geometry>> {
        let index = self.index().await;
        Ok(index
            .find(&key.city, key.state.name())
            .or_else(|| index.find(&key.city, key.state.abbreviation()))
            .map(|feature| feature.geometry.clone()))
    }
}
