//! Map layers for a city list.
//!
//! Outlines are fetched in fixed-size batches: the lookups inside a batch
//! run concurrently and each finished batch is handed to the caller before
//! the next one starts, so a large list fills in progressively.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};
use viajero_core::{CityKey, CityList, TrackedCity, UserSettings};
use viajero_geo::{
    cover_overlay, fit_shape, normalize, placeholder, Bounds, Geometry, ImageSize, OverlayStyle,
};
use viajero_store::{GeometrySource, ObjectStore};

use crate::tracker::Cover;

/// Fraction added around the union of all layers when framing the map.
pub const FRAME_PADDING: f64 = 0.1;

/// Stroke and fill of a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerStyle {
    /// Stroke and fill colour.
    pub color: String,
    /// Stroke width in pixels.
    pub weight: f64,
    /// Stroke opacity.
    pub opacity: f64,
    /// Fill opacity.
    pub fill_opacity: f64,
}

impl LayerStyle {
    fn standard(color: String) -> Self {
        Self {
            color,
            weight: 2.0,
            opacity: 0.8,
            fill_opacity: 0.3,
        }
    }

    fn cover(color: String) -> Self {
        Self {
            fill_opacity: 0.0,
            ..Self::standard(color)
        }
    }
}

/// How a layer is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerKind {
    /// Outline with a translucent fill.
    Standard,
    /// The cover photo clipped to the outline.
    Cover {
        /// Photo drawn inside the outline.
        photo_url: String,
        /// SVG overlay sized to the outline's bounds.
        overlay: String,
    },
}

/// One municipality on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayer {
    /// Municipality.
    pub key: CityKey,
    /// Outline, or a placeholder square.
    pub geometry: Geometry,
    /// Bounds of `geometry`, where the overlay is pinned.
    pub bounds: Bounds,
    /// Whether `geometry` is a placeholder.
    pub placeholder: bool,
    /// Stroke and fill.
    pub style: LayerStyle,
    /// Standard or cover.
    #[serde(flatten)]
    pub kind: LayerKind,
}

/// Every layer of a list plus the area to frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// Layers in list order.
    pub layers: Vec<MapLayer>,
    /// Padded union of the layer bounds, `None` for an empty list.
    pub bounds: Option<Bounds>,
}

/// Builds map layers.
pub struct MapComposer {
    geometry: Arc<dyn GeometrySource>,
    objects: Arc<dyn ObjectStore>,
    batch_size: usize,
    image_timeout: Duration,
}

impl MapComposer {
    /// Create a composer. A zero batch size is treated as one.
    #[must_use]
    pub fn new(
        geometry: Arc<dyn GeometrySource>,
        objects: Arc<dyn ObjectStore>,
        batch_size: usize,
        image_timeout: Duration,
    ) -> Self {
        Self {
            geometry,
            objects,
            batch_size: batch_size.max(1),
            image_timeout,
        }
    }

    /// Build the layers of `cities`, calling `on_batch` with each batch as
    /// it completes.
    ///
    /// Visited cities with a cover become cover layers when the photo's
    /// size can be read in time; wishlist layers are always standard and use
    /// the wishlist colour.
    pub async fn compose<F>(
        &self,
        list: CityList,
        cities: &[TrackedCity],
        covers: &HashMap<CityKey, Cover>,
        settings: &UserSettings,
        mut on_batch: F,
    ) -> MapView
    where
        F: FnMut(&[MapLayer]) + Send,
    {
        let mut layers = Vec::with_capacity(cities.len());
        for (index, batch) in cities.chunks(self.batch_size).enumerate() {
            let built = join_all(
                batch
                    .iter()
                    .map(|city| self.layer(list, city, covers, settings)),
            )
            .await;
            debug!(batch = index, layers = built.len(), "map batch ready");
            on_batch(&built);
            layers.extend(built);
        }

        let bounds = layers
            .iter()
            .map(|layer| layer.bounds)
            .reduce(Bounds::union)
            .map(|bounds| bounds.padded(FRAME_PADDING));
        MapView { layers, bounds }
    }

    async fn layer(
        &self,
        list: CityList,
        city: &TrackedCity,
        covers: &HashMap<CityKey, Cover>,
        settings: &UserSettings,
    ) -> MapLayer {
        let key = city.key();
        let (geometry, bounds, is_placeholder) = self.outline(&key).await;
        let color = match list {
            CityList::Visited => settings.state_color(key.state).to_string(),
            CityList::Wishlist => settings.wishlist_color.as_str().to_string(),
        };

        let cover = match list {
            CityList::Visited => covers.get(&key),
            CityList::Wishlist => None,
        };
        let kind = match cover {
            Some(cover) => self.cover_kind(&key, &geometry, cover, &color).await,
            None => None,
        };

        let (style, kind) = match kind {
            Some(kind) => (LayerStyle::cover(color), kind),
            None => (LayerStyle::standard(color), LayerKind::Standard),
        };
        MapLayer {
            key,
            geometry,
            bounds,
            placeholder: is_placeholder,
            style,
            kind,
        }
    }

    async fn outline(&self, key: &CityKey) -> (Geometry, Bounds, bool) {
        match self.geometry.geometry(key).await {
            Ok(Some(geometry)) => {
                if let Some(bounds) = geometry.bounds() {
                    return (geometry, bounds, false);
                }
                debug!(city = %key.city, state = %key.state, "outline has no extent");
            }
            Ok(None) => debug!(city = %key.city, state = %key.state, "no outline, using placeholder"),
            Err(e) => {
                warn!(city = %key.city, state = %key.state, error = %e, "outline lookup failed");
            }
        }
        let geometry = placeholder(Some(key.state));
        let bounds = geometry.bounds().unwrap_or(Bounds {
            west: 0.0,
            south: 0.0,
            east: 0.0,
            north: 0.0,
        });
        (geometry, bounds, true)
    }

    async fn cover_kind(
        &self,
        key: &CityKey,
        geometry: &Geometry,
        cover: &Cover,
        color: &str,
    ) -> Option<LayerKind> {
        let size = self.probe(&cover.photo_url).await?;
        let shape = match normalize(geometry.rings()) {
            Ok(shape) => shape,
            Err(e) => {
                warn!(city = %key.city, state = %key.state, error = %e, "cannot clip cover to outline");
                return None;
            }
        };
        let placement = fit_shape(&shape, Some(size), cover.position)?;
        let overlay = cover_overlay(
            &overlay_id(key),
            &shape,
            &placement,
            &cover.photo_url,
            &OverlayStyle::outline(color),
        );
        Some(LayerKind::Cover {
            photo_url: cover.photo_url.clone(),
            overlay,
        })
    }

    async fn probe(&self, url: &str) -> Option<ImageSize> {
        let bytes = match tokio::time::timeout(self.image_timeout, self.objects.fetch(url)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                warn!(url = %url, error = %e, "cover photo unavailable");
                return None;
            }
            Err(_) => {
                warn!(url = %url, timeout = ?self.image_timeout, "cover photo timed out");
                return None;
            }
        };
        let size = image_size(&bytes);
        if size.is_none() {
            warn!(url = %url, "cover photo is not a readable image");
        }
        size
    }
}

/// Pixel size of an encoded image, read from its header.
#[must_use]
pub fn image_size(bytes: &[u8]) -> Option<ImageSize> {
    let reader = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    let (width, height) = reader.into_dimensions().ok()?;
    Some(ImageSize { width, height })
}

fn overlay_id(key: &CityKey) -> String {
    format!("{}-{}", key.city, key.state.abbreviation())
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect()
}
