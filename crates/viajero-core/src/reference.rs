//! IBGE reference data: municipalities, states and the country.
//!
//! Three JSON documents are read once at start-up:
//!
//! - `cidades.json`: `{"cidades": [CityData, ...]}`
//! - `estados.json`: `{"estados": [{"estado", "area_territorial_km2"}, ...]}`
//! - `pais.json`: `{"país": [{"país", "area_territorial_km2"}]}`
//!
//! Lookups are case-insensitive on the municipality name and keyed by state,
//! since municipality names repeat across states.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViajeroError};
use crate::{BrazilianState, CityKey};

/// Territorial area of Brazil in km², used when `pais.json` is absent.
pub const BRAZIL_AREA_KM2: f64 = 8_510_417.771;

/// Infant mortality is published either as a rate or as a note such as `"-"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InfantMortality {
    /// Deaths per thousand live births.
    Rate(f64),
    /// Non-numeric entry.
    Text(String),
}

impl InfantMortality {
    /// The numeric rate, if there is one.
    #[must_use]
    pub fn rate(&self) -> Option<f64> {
        match self {
            Self::Rate(rate) => Some(*rate),
            Self::Text(text) => text.replace(',', ".").trim().parse().ok(),
        }
    }
}

impl fmt::Display for InfantMortality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rate(rate) => write!(f, "{rate}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// One municipality's IBGE indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityData {
    /// Municipality name.
    pub nome: String,
    /// State.
    pub estado: BrazilianState,
    /// Demonym.
    #[serde(default)]
    pub gentilico: String,
    /// Territorial area in km².
    pub area_territorial_km2: f64,
    /// Estimated population, 2024.
    #[serde(default)]
    pub populacao_estimada_censo_2024: f64,
    /// Census population, 2022.
    #[serde(default)]
    pub populacao_estimada_censo_2022: f64,
    /// Inhabitants per km², 2022.
    #[serde(default)]
    pub densidade_demografica_2022: f64,
    /// Schooling rate for ages 6 to 14, 2022.
    #[serde(default)]
    pub escolarizacao_6a14_2022: f64,
    /// Municipal human development index, 2010.
    #[serde(default)]
    pub idhm_2010: f64,
    /// Infant mortality, 2023.
    #[serde(default)]
    pub mortalidade_infantil_2023: Option<InfantMortality>,
    /// GDP per capita, 2020.
    #[serde(default)]
    pub pib_per_capita_2020: f64,
    /// IBGE municipality code.
    pub codigo_ibge: String,
}

impl CityData {
    /// The (city, state) key.
    #[must_use]
    pub fn key(&self) -> CityKey {
        CityKey::new(self.nome.clone(), self.estado)
    }
}

/// A state's territorial area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateData {
    /// State.
    pub estado: BrazilianState,
    /// Territorial area in km².
    pub area_territorial_km2: f64,
}

#[derive(Deserialize)]
struct CitiesFile {
    cidades: Vec<CityData>,
}

#[derive(Deserialize)]
struct StatesFile {
    estados: Vec<StateData>,
}

#[derive(Deserialize)]
struct CountryEntry {
    area_territorial_km2: f64,
}

#[derive(Deserialize)]
struct CountryFile {
    #[serde(rename = "país")]
    pais: Vec<CountryEntry>,
}

/// All reference data, indexed for lookup.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    cities: Vec<CityData>,
    states: HashMap<BrazilianState, f64>,
    country_area_km2: Option<f64>,
    index: HashMap<(String, BrazilianState), usize>,
}

impl ReferenceData {
    /// Build from already-decoded records.
    #[must_use]
    pub fn new(cities: Vec<CityData>, states: Vec<StateData>, country_area_km2: Option<f64>) -> Self {
        let index = cities
            .iter()
            .enumerate()
            .map(|(i, city)| ((normalize(&city.nome), city.estado), i))
            .collect();
        Self {
            cities,
            states: states
                .into_iter()
                .map(|s| (s.estado, s.area_territorial_km2))
                .collect(),
            country_area_km2,
            index,
        }
    }

    /// Decode the three JSON documents. `pais` may be omitted.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if any document is malformed.
    pub fn from_json(cidades: &str, estados: &str, pais: Option<&str>) -> Result<Self> {
        let cities: CitiesFile = decode("cidades.json", cidades)?;
        let states: StatesFile = decode("estados.json", estados)?;
        let country = match pais {
            Some(text) => decode::<CountryFile>("pais.json", text)?
                .pais
                .first()
                .map(|entry| entry.area_territorial_km2),
            None => None,
        };
        Ok(Self::new(cities.cidades, states.estados, country))
    }

    /// Read `cidades.json`, `estados.json` and (optionally) `pais.json` from a
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceUnavailable` if a required file cannot be read, or
    /// `Serialization` if one is malformed.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            std::fs::read_to_string(dir.join(name))
                .map_err(|e| ViajeroError::ReferenceUnavailable(format!("{name}: {e}")))
        };
        let cidades = read("cidades.json")?;
        let estados = read("estados.json")?;
        let pais = read("pais.json").ok();
        Self::from_json(&cidades, &estados, pais.as_deref())
    }

    /// Exact lookup by name (case-insensitive, trimmed) and state.
    #[must_use]
    pub fn city(&self, name: &str, state: BrazilianState) -> Option<&CityData> {
        self.index
            .get(&(normalize(name), state))
            .and_then(|&i| self.cities.get(i))
    }

    /// Lookup by key.
    #[must_use]
    pub fn city_by_key(&self, key: &CityKey) -> Option<&CityData> {
        self.city(&key.city, key.state)
    }

    /// First municipality with this name, optionally restricted to a state.
    #[must_use]
    pub fn search_city(&self, name: &str, state: Option<BrazilianState>) -> Option<&CityData> {
        let needle = normalize(name);
        self.cities
            .iter()
            .find(|city| normalize(&city.nome) == needle && state.map_or(true, |s| s == city.estado))
    }

    /// Municipalities whose name contains `term`, for autocomplete.
    pub fn search<'a>(
        &'a self,
        term: &str,
        state: Option<BrazilianState>,
    ) -> impl Iterator<Item = &'a CityData> + 'a {
        let needle = normalize(term);
        self.cities.iter().filter(move |city| {
            state.map_or(true, |s| s == city.estado) && normalize(&city.nome).contains(&needle)
        })
    }

    /// All municipalities of a state.
    pub fn cities_in_state(&self, state: BrazilianState) -> impl Iterator<Item = &CityData> {
        self.cities.iter().filter(move |city| city.estado == state)
    }

    /// States whose name contains `term`, sorted by name.
    #[must_use]
    pub fn search_states(term: &str) -> Vec<BrazilianState> {
        let needle = normalize(term);
        let mut states: Vec<_> = BrazilianState::ALL
            .into_iter()
            .filter(|state| state.name().to_lowercase().contains(&needle))
            .collect();
        states.sort_by_key(|state| state.name());
        states
    }

    /// State area in km², 0 when unknown.
    #[must_use]
    pub fn state_area(&self, state: BrazilianState) -> f64 {
        self.states.get(&state).copied().unwrap_or(0.0)
    }

    /// Country area in km².
    #[must_use]
    pub fn country_area(&self) -> f64 {
        self.country_area_km2.unwrap_or(BRAZIL_AREA_KM2)
    }

    /// Number of municipalities loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    /// Whether no municipalities are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn decode<T: serde::de::DeserializeOwned>(name: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| ViajeroError::Serialization(format!("{name}: {e}")))
}
