//! Polygon and multipolygon boundaries in lon/lat.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GeoError, Result};

/// `[longitude, latitude]`.
pub type Position = [f64; 2];

/// A closed ring of positions. The first ring of a polygon is its exterior,
/// the rest are holes.
pub type Ring = Vec<Position>;

/// A municipality boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    /// One exterior ring plus holes.
    Polygon(Vec<Ring>),
    /// Several polygons (islands), each with its own holes.
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Parse a GeoJSON geometry object.
    ///
    /// Positions with altitude are accepted and truncated to two dimensions.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedGeometry` for types other than Polygon and
    /// MultiPolygon, and `InvalidGeoJson` for malformed coordinates.
    pub fn from_geojson(value: &Value) -> Result<Self> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| GeoError::InvalidGeoJson("geometry has no type".into()))?;
        let coordinates = value
            .get("coordinates")
            .cloned()
            .ok_or_else(|| GeoError::InvalidGeoJson("geometry has no coordinates".into()))?;

        match kind {
            "Polygon" => {
                let raw: Vec<Vec<Vec<f64>>> = serde_json::from_value(coordinates)
                    .map_err(|e| GeoError::InvalidGeoJson(e.to_string()))?;
                Ok(Self::Polygon(to_rings(raw)?))
            }
            "MultiPolygon" => {
                let raw: Vec<Vec<Vec<Vec<f64>>>> = serde_json::from_value(coordinates)
                    .map_err(|e| GeoError::InvalidGeoJson(e.to_string()))?;
                let polygons = raw.into_iter().map(to_rings).collect::<Result<_>>()?;
                Ok(Self::MultiPolygon(polygons))
            }
            other => Err(GeoError::UnsupportedGeometry(other.to_string())),
        }
    }

    /// Every ring, exteriors and holes alike, in document order.
    #[must_use]
    pub fn rings(&self) -> Vec<&Ring> {
        match self {
            Self::Polygon(rings) => rings.iter().collect(),
            Self::MultiPolygon(polygons) => polygons.iter().flatten().collect(),
        }
    }

    /// Number of polygons (1 for a Polygon).
    #[must_use]
    pub fn polygon_count(&self) -> usize {
        match self {
            Self::Polygon(_) => 1,
            Self::MultiPolygon(polygons) => polygons.len(),
        }
    }

    /// Bounding box of all finite positions, `None` if there are none.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of_positions(self.rings().into_iter().flatten())
    }
}

fn to_rings(raw: Vec<Vec<Vec<f64>>>) -> Result<Vec<Ring>> {
    raw.into_iter()
        .map(|ring| {
            ring.into_iter()
                .map(|position| match position.as_slice() {
                    [lon, lat, ..] => Ok([*lon, *lat]),
                    _ => Err(GeoError::InvalidGeoJson(
                        "position needs at least two numbers".into(),
                    )),
                })
                .collect()
        })
        .collect()
}

/// A lon/lat bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum longitude.
    pub west: f64,
    /// Minimum latitude.
    pub south: f64,
    /// Maximum longitude.
    pub east: f64,
    /// Maximum latitude.
    pub north: f64,
}

impl Bounds {
    /// Bounding box of the finite positions in `positions`.
    pub fn of_positions<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
        positions
            .into_iter()
            .filter(|[lon, lat]| lon.is_finite() && lat.is_finite())
            .fold(None, |acc: Option<Self>, &[lon, lat]| {
                Some(match acc {
                    None => Self {
                        west: lon,
                        south: lat,
                        east: lon,
                        north: lat,
                    },
                    Some(b) => Self {
                        west: b.west.min(lon),
                        south: b.south.min(lat),
                        east: b.east.max(lon),
                        north: b.north.max(lat),
                    },
                })
            })
    }

    /// Smallest box containing both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }

    /// Grow each side by `fraction` of the box's width or height.
    #[must_use]
    pub fn padded(self, fraction: f64) -> Self {
        let dx = self.width() * fraction;
        let dy = self.height() * fraction;
        Self {
            west: self.west - dx,
            south: self.south - dy,
            east: self.east + dx,
            north: self.north + dy,
        }
    }

    /// Longitude span.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Latitude span.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Centre as `[lon, lat]`.
    #[must_use]
    pub fn center(&self) -> Position {
        [(self.west + self.east) / 2.0, (self.south + self.north) / 2.0]
    }
}
