//! The 26 Brazilian states and the federal district.
//!
//! State names are the keys of the colour settings map and the grouping key
//! for statistics, so they are modelled as a closed enumeration rather than
//! free-form strings. Serialization uses the full Portuguese name, which is
//! what the remote tables store in `state_name`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ViajeroError;

/// Colour used for a state with no configured colour.
pub const FALLBACK_STATE_COLOR: &str = "#ff7800";

/// A Brazilian federative unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BrazilianState {
    /// AC
    Acre,
    /// AL
    Alagoas,
    /// AP
    Amapa,
    /// AM
    Amazonas,
    /// BA
    Bahia,
    /// CE
    Ceara,
    /// DF
    DistritoFederal,
    /// ES
    EspiritoSanto,
    /// GO
    Goias,
    /// MA
    Maranhao,
    /// MT
    MatoGrosso,
    /// MS
    MatoGrossoDoSul,
    /// MG
    MinasGerais,
    /// PA
    Para,
    /// PB
    Paraiba,
    /// PR
    Parana,
    /// PE
    Pernambuco,
    /// PI
    Piaui,
    /// RJ
    RioDeJaneiro,
    /// RN
    RioGrandeDoNorte,
    /// RS
    RioGrandeDoSul,
    /// RO
    Rondonia,
    /// RR
    Roraima,
    /// SC
    SantaCatarina,
    /// SP
    SaoPaulo,
    /// SE
    Sergipe,
    /// TO
    Tocantins,
}

impl BrazilianState {
    /// All 27 units in alphabetical order of their names.
    pub const ALL: [Self; 27] = [
        Self::Acre,
        Self::Alagoas,
        Self::Amapa,
        Self::Amazonas,
        Self::Bahia,
        Self::Ceara,
        Self::DistritoFederal,
        Self::EspiritoSanto,
        Self::Goias,
        Self::Maranhao,
        Self::MatoGrosso,
        Self::MatoGrossoDoSul,
        Self::MinasGerais,
        Self::Para,
        Self::Paraiba,
        Self::Parana,
        Self::Pernambuco,
        Self::Piaui,
        Self::RioDeJaneiro,
        Self::RioGrandeDoNorte,
        Self::RioGrandeDoSul,
        Self::Rondonia,
        Self::Roraima,
        Self::SantaCatarina,
        Self::SaoPaulo,
        Self::Sergipe,
        Self::Tocantins,
    ];

    /// Full Portuguese name, as stored remotely.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Acre => "Acre",
            Self::Alagoas => "Alagoas",
            Self::Amapa => "Amapá",
            Self::Amazonas => "Amazonas",
            Self::Bahia => "Bahia",
            Self::Ceara => "Ceará",
            Self::DistritoFederal => "Distrito Federal",
            Self::EspiritoSanto => "Espírito Santo",
            Self::Goias => "Goiás",
            Self::Maranhao => "Maranhão",
            Self::MatoGrosso => "Mato Grosso",
            Self::MatoGrossoDoSul => "Mato Grosso do Sul",
            Self::MinasGerais => "Minas Gerais",
            Self::Para => "Pará",
            Self::Paraiba => "Paraíba",
            Self::Parana => "Paraná",
            Self::Pernambuco => "Pernambuco",
            Self::Piaui => "Piauí",
            Self::RioDeJaneiro => "Rio de Janeiro",
            Self::RioGrandeDoNorte => "Rio Grande do Norte",
            Self::RioGrandeDoSul => "Rio Grande do Sul",
            Self::Rondonia => "Rondônia",
            Self::Roraima => "Roraima",
            Self::SantaCatarina => "Santa Catarina",
            Self::SaoPaulo => "São Paulo",
            Self::Sergipe => "Sergipe",
            Self::Tocantins => "Tocantins",
        }
    }

    /// Two-letter abbreviation (`sigla_uf`).
    #[must_use]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Acre => "AC",
            Self::Alagoas => "AL",
            Self::Amapa => "AP",
            Self::Amazonas => "AM",
            Self::Bahia => "BA",
            Self::Ceara => "CE",
            Self::DistritoFederal => "DF",
            Self::EspiritoSanto => "ES",
            Self::Goias => "GO",
            Self::Maranhao => "MA",
            Self::MatoGrosso => "MT",
            Self::MatoGrossoDoSul => "MS",
            Self::MinasGerais => "MG",
            Self::Para => "PA",
            Self::Paraiba => "PB",
            Self::Parana => "PR",
            Self::Pernambuco => "PE",
            Self::Piaui => "PI",
            Self::RioDeJaneiro => "RJ",
            Self::RioGrandeDoNorte => "RN",
            Self::RioGrandeDoSul => "RS",
            Self::Rondonia => "RO",
            Self::Roraima => "RR",
            Self::SantaCatarina => "SC",
            Self::SaoPaulo => "SP",
            Self::Sergipe => "SE",
            Self::Tocantins => "TO",
        }
    }

    /// Default map colour for the state.
    #[must_use]
    pub const fn default_color(self) -> &'static str {
        match self {
            Self::Acre => "#ff7800",
            Self::Alagoas | Self::DistritoFederal | Self::Pernambuco | Self::SantaCatarina => {
                "#06b6d4"
            }
            Self::Amapa | Self::RioGrandeDoSul => "#10b981",
            Self::Amazonas | Self::Rondonia => "#f59e0b",
            Self::Bahia | Self::Roraima => "#ef4444",
            Self::Ceara | Self::RioGrandeDoNorte | Self::SaoPaulo => "#8b5cf6",
            Self::EspiritoSanto => "#84cc16",
            Self::Goias | Self::Tocantins => "#f97316",
            Self::Maranhao => "#ec4899",
            Self::MatoGrosso => "#6366f1",
            Self::MatoGrossoDoSul => "#14b8a6",
            Self::MinasGerais => "#a855f7",
            Self::Para | Self::Sergipe => "#22c55e",
            Self::Paraiba => "#fb7185",
            Self::Parana => "#fbbf24",
            Self::Piaui => "#f43f5e",
            Self::RioDeJaneiro => "#3b82f6",
        }
    }

    /// Approximate geographic centre as `(longitude, latitude)`.
    ///
    /// Used to place a placeholder shape when a municipality outline is not
    /// available.
    #[must_use]
    pub const fn center(self) -> (f64, f64) {
        match self {
            Self::Acre => (-70.0, -9.0),
            Self::Alagoas => (-36.0, -9.5),
            Self::Amapa => (-52.0, 1.0),
            Self::Amazonas => (-63.0, -5.0),
            Self::Bahia => (-41.0, -13.0),
            Self::Ceara => (-39.0, -5.0),
            Self::Maranhao => (-45.0, -5.0),
            Self::DistritoFederal => (-47.9, -15.8),
            Self::EspiritoSanto => (-40.0, -20.0),
            Self::Goias => (-49.0, -16.0),
            Self::MatoGrosso => (-56.0, -12.0),
            Self::MatoGrossoDoSul => (-55.0, -20.0),
            Self::MinasGerais => (-44.0, -19.0),
            Self::Para => (-52.0, -5.0),
            Self::Paraiba => (-36.0, -7.0),
            Self::Parana => (-51.0, -24.0),
            Self::Pernambuco => (-37.0, -8.0),
            Self::Piaui => (-43.0, -7.0),
            Self::RioDeJaneiro => (-43.0, -22.0),
            Self::RioGrandeDoNorte => (-36.0, -6.0),
            Self::RioGrandeDoSul => (-53.0, -30.0),
            Self::Rondonia => (-63.0, -11.0),
            Self::Roraima => (-61.0, 2.0),
            Self::SantaCatarina => (-50.0, -27.0),
            Self::SaoPaulo => (-47.0, -23.0),
            Self::Sergipe => (-37.0, -10.5),
            Self::Tocantins => (-48.0, -10.0),
        }
    }

    /// Look up a state by full name or abbreviation, ignoring case and
    /// surrounding whitespace.
    #[must_use]
    pub fn lookup(input: &str) -> Option<Self> {
        let needle = input.trim().to_lowercase();
        Self::ALL.into_iter().find(|state| {
            state.name().to_lowercase() == needle || state.abbreviation().to_lowercase() == needle
        })
    }
}

impl fmt::Display for BrazilianState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BrazilianState {
    type Err = ViajeroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| ViajeroError::UnknownState(s.to_string()))
    }
}

impl TryFrom<String> for BrazilianState {
    type Error = ViajeroError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BrazilianState> for String {
    fn from(state: BrazilianState) -> Self {
        state.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn there_are_twenty_seven_distinct_units() {
        let names: HashSet<_> = BrazilianState::ALL.iter().map(|s| s.name()).collect();
        let abbreviations: HashSet<_> =
            BrazilianState::ALL.iter().map(|s| s.abbreviation()).collect();
        assert_eq!(names.len(), 27);
        assert_eq!(abbreviations.len(), 27);
    }

    #[test]
    fn lookup_accepts_name_or_abbreviation() {
        assert_eq!(BrazilianState::lookup("minas gerais"), Some(BrazilianState::MinasGerais));
        assert_eq!(BrazilianState::lookup(" MG "), Some(BrazilianState::MinasGerais));
        assert_eq!(BrazilianState::lookup("São Paulo"), Some(BrazilianState::SaoPaulo));
        assert_eq!(BrazilianState::lookup("Atlantis"), None);
    }

    #[test]
    fn serializes_as_portuguese_name() {
        let json = serde_json::to_string(&BrazilianState::Goias).unwrap();
        assert_eq!(json, "\"Goiás\"");
        let parsed: BrazilianState = serde_json::from_str("\"Goiás\"").unwrap();
        assert_eq!(parsed, BrazilianState::Goias);
    }

    #[test]
    fn every_state_has_a_hex_default_color() {
        for state in BrazilianState::ALL {
            let color = state.default_color();
            assert_eq!(color.len(), 7, "{state}");
            assert!(color.starts_with('#'));
        }
    }
}
