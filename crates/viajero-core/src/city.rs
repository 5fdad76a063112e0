//! Visited and wishlisted municipalities.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{BrazilianState, UserId};

/// Which of the two per-user city collections a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CityList {
    /// Cities the user has been to.
    Visited,
    /// Cities the user wants to go to.
    Wishlist,
}

impl CityList {
    /// Remote table backing this list.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Visited => "visited_cities",
            Self::Wishlist => "wishlist_cities",
        }
    }

    /// Timestamp column the list is ordered by.
    #[must_use]
    pub const fn timestamp_column(self) -> &'static str {
        match self {
            Self::Visited => "visited_at",
            Self::Wishlist => "added_at",
        }
    }
}

impl fmt::Display for CityList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visited => f.write_str("visited list"),
            Self::Wishlist => f.write_str("wishlist"),
        }
    }
}

/// Identifies a municipality: name plus state.
///
/// Names repeat across states (there is a Bom Jesus in five of them), so the
/// state is always part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CityKey {
    /// Municipality name.
    pub city: String,
    /// State the municipality belongs to.
    pub state: BrazilianState,
}

impl CityKey {
    /// Create a key.
    #[must_use]
    pub fn new(city: impl Into<String>, state: BrazilianState) -> Self {
        Self {
            city: city.into(),
            state,
        }
    }
}

impl fmt::Display for CityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.city, self.state)
    }
}

/// A city on one of the user's lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedCity {
    /// Owner.
    pub user_id: UserId,
    /// Municipality name.
    pub city_name: String,
    /// State name.
    pub state_name: BrazilianState,
    /// Territorial area in km² (from the IBGE reference data). Older rows
    /// may store null, read as 0.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub area_km2: f64,
    /// IBGE municipality code, when known.
    #[serde(default)]
    pub city_code: Option<String>,
    /// When the city was added.
    #[serde(alias = "visited_at")]
    pub added_at: DateTime<Utc>,
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl TrackedCity {
    /// Create a new record stamped with the current time.
    #[must_use]
    pub fn new(user_id: UserId, key: CityKey, area_km2: f64, city_code: Option<String>) -> Self {
        Self {
            user_id,
            city_name: key.city,
            state_name: key.state,
            area_km2,
            city_code,
            added_at: Utc::now(),
        }
    }

    /// The (city, state) key of this record.
    #[must_use]
    pub fn key(&self) -> CityKey {
        CityKey::new(self.city_name.clone(), self.state_name)
    }

    /// Whether this record is for the given municipality.
    #[must_use]
    pub fn is(&self, key: &CityKey) -> bool {
        self.state_name == key.state && self.city_name == key.city
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_matches_cache_key_format() {
        let key = CityKey::new("Belo Horizonte", BrazilianState::MinasGerais);
        assert_eq!(key.to_string(), "Belo Horizonte-Minas Gerais");
    }

    #[test]
    fn same_name_in_different_states_are_different_cities() {
        let user = UserId::generate();
        let piaui = TrackedCity::new(
            user,
            CityKey::new("Bom Jesus", BrazilianState::Piaui),
            5469.0,
            None,
        );
        assert!(piaui.is(&CityKey::new("Bom Jesus", BrazilianState::Piaui)));
        assert!(!piaui.is(&CityKey::new("Bom Jesus", BrazilianState::RioGrandeDoSul)));
    }

    #[test]
    fn tracked_city_accepts_visited_at_column() {
        let json = serde_json::json!({
            "user_id": UserId::generate().to_string(),
            "city_name": "Ouro Preto",
            "state_name": "Minas Gerais",
            "area_km2": 1245.865,
            "visited_at": "2024-05-01T12:00:00Z"
        });
        let city: TrackedCity = serde_json::from_value(json).unwrap();
        assert_eq!(city.state_name, BrazilianState::MinasGerais);
        assert!(city.city_code.is_none());
    }

    #[test]
    fn null_area_reads_as_zero() {
        let json = serde_json::json!({
            "user_id": UserId::generate().to_string(),
            "city_name": "Tiradentes",
            "state_name": "Minas Gerais",
            "area_km2": null,
            "added_at": "2024-05-01T12:00:00Z"
        });
        let city: TrackedCity = serde_json::from_value(json).unwrap();
        assert_eq!(city.area_km2, 0.0);
    }

    #[test]
    fn list_tables() {
        assert_eq!(CityList::Visited.table(), "visited_cities");
        assert_eq!(CityList::Wishlist.timestamp_column(), "added_at");
        assert_eq!(CityList::Wishlist.to_string(), "wishlist");
    }
}
