//! Municipality outlines from a GeoJSON feature collection.
//!
//! IBGE exports and community datasets disagree on property names, so a
//! feature's municipality name is read from the first of `NM_MUN`, `nome`,
//! `name`, and its state from the first of `NM_UF`, `estado`, `state`,
//! `sigla_uf`.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{GeoError, Result};
use crate::geometry::Geometry;

const CITY_KEYS: [&str; 3] = ["NM_MUN", "nome", "name"];
const STATE_KEYS: [&str; 4] = ["NM_UF", "estado", "state", "sigla_uf"];
const CODE_KEYS: [&str; 2] = ["CD_MUN", "codigo_ibge"];

/// One municipality outline.
#[derive(Debug, Clone, PartialEq)]
pub struct MunicipalityFeature {
    /// Municipality name as found in the properties.
    pub city: String,
    /// State as found in the properties (name or abbreviation).
    pub state: String,
    /// IBGE code, if the feature carries one.
    pub code: Option<String>,
    /// Boundary.
    pub geometry: Geometry,
}

/// An in-memory index over a feature collection.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonIndex {
    features: Vec<IndexedFeature>,
}

#[derive(Debug, Clone)]
struct IndexedFeature {
    city_lower: String,
    state_lower: String,
    feature: MunicipalityFeature,
}

impl GeoJsonIndex {
    /// Parse a `FeatureCollection` document.
    ///
    /// Features with an unsupported geometry type or no name are skipped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeoJson` if the document is not JSON or has no
    /// `features` array.
    pub fn parse(text: &str) -> Result<Self> {
        let document: Value =
            serde_json::from_str(text).map_err(|e| GeoError::InvalidGeoJson(e.to_string()))?;
        Self::from_value(&document)
    }

    /// Index an already-decoded `FeatureCollection`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeoJson` if there is no `features` array.
    pub fn from_value(document: &Value) -> Result<Self> {
        let features = document
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| GeoError::InvalidGeoJson("missing features array".into()))?;

        let mut indexed = Vec::with_capacity(features.len());
        let mut skipped = 0usize;
        for feature in features {
            match index_feature(feature) {
                Some(entry) => indexed.push(entry),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "skipped GeoJSON features without a usable outline");
        }
        debug!(features = indexed.len(), "indexed municipality outlines");
        Ok(Self { features: indexed })
    }

    /// Find a municipality by name and state.
    ///
    /// The name must match exactly after trimming and lower-casing. The
    /// state matches exactly, or failing that if either string contains the
    /// other. An exact state match wins, so "Mato Grosso" does not resolve
    /// to a feature in "Mato Grosso do Sul" when both exist.
    #[must_use]
    pub fn find(&self, city: &str, state: &str) -> Option<&MunicipalityFeature> {
        let city = city.trim().to_lowercase();
        let state = state.trim().to_lowercase();
        let mut partial = None;
        for f in self.features.iter().filter(|f| f.city_lower == city) {
            if f.state_lower == state {
                return Some(&f.feature);
            }
            if partial.is_none()
                && !f.state_lower.is_empty()
                && !state.is_empty()
                && (f.state_lower.contains(&state) || state.contains(&f.state_lower))
            {
                partial = Some(&f.feature);
            }
        }
        partial
    }

    /// Number of indexed features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn index_feature(feature: &Value) -> Option<IndexedFeature> {
    let properties = feature.get("properties").and_then(Value::as_object)?;
    let city = first_string(properties, &CITY_KEYS)?;
    let state = first_string(properties, &STATE_KEYS).unwrap_or_default();
    let geometry = match Geometry::from_geojson(feature.get("geometry")?) {
        Ok(geometry) => geometry,
        Err(e) => {
            debug!(city = %city, error = %e, "ignoring feature geometry");
            return None;
        }
    };
    Some(IndexedFeature {
        city_lower: city.trim().to_lowercase(),
        state_lower: state.trim().to_lowercase(),
        feature: MunicipalityFeature {
            code: first_string(properties, &CODE_KEYS),
            city,
            state,
            geometry,
        },
    })
}

fn first_string(properties: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match properties.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"NM_MUN": "Belo Horizonte", "NM_UF": "Minas Gerais", "CD_MUN": "3106200"},
                    "geometry": {"type": "Polygon", "coordinates": [[[-44.06, -19.78], [-43.86, -19.78], [-43.86, -20.06], [-44.06, -19.78]]]}
                },
                {
                    "type": "Feature",
                    "properties": {"nome": "Bom Jesus", "sigla_uf": "PI"},
                    "geometry": {"type": "Polygon", "coordinates": [[[-44.5, -9.0], [-44.0, -9.0], [-44.0, -9.5], [-44.5, -9.0]]]}
                },
                {
                    "type": "Feature",
                    "properties": {"name": "Somewhere"},
                    "geometry": {"type": "Point", "coordinates": [0, 0]}
                }
            ]
        })
    }

    #[test]
    fn finds_by_name_case_insensitively() {
        let index = GeoJsonIndex::from_value(&collection()).unwrap();
        assert_eq!(index.len(), 2);
        let feature = index.find("  BELO horizonte ", "minas gerais").unwrap();
        assert_eq!(feature.code.as_deref(), Some("3106200"));
    }

    #[test]
    fn state_matches_by_containment() {
        let index = GeoJsonIndex::from_value(&collection()).unwrap();
        assert!(index.find("Belo Horizonte", "Minas").is_some());
        assert!(index.find("Bom Jesus", "pi").is_some());
        assert!(index.find("Belo Horizonte", "Bahia").is_none());
    }

    #[test]
    fn unsupported_features_are_skipped() {
        let index = GeoJsonIndex::from_value(&collection()).unwrap();
        assert!(index.find("Somewhere", "").is_none());
    }

    #[test]
    fn missing_features_array_is_invalid() {
        assert!(matches!(
            GeoJsonIndex::parse(r#"{"type": "FeatureCollection"}"#),
            Err(GeoError::InvalidGeoJson(_))
        ));
        assert!(GeoJsonIndex::parse("not json").is_err());
    }
}
