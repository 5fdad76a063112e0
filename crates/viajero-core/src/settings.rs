//! Per-user map colours.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViajeroError};
use crate::state::FALLBACK_STATE_COLOR;
use crate::{BrazilianState, UserId};

/// Default colour for wishlisted cities.
pub const DEFAULT_WISHLIST_COLOR: &str = "#ef4444";

/// A `#rgb` or `#rrggbb` colour, stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse and normalise a hex colour.
    ///
    /// # Errors
    ///
    /// Returns `InvalidColor` unless the input is `#` followed by three or six
    /// hex digits.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let valid = trimmed
            .strip_prefix('#')
            .is_some_and(|digits| {
                matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
            });
        if !valid {
            return Err(ViajeroError::InvalidColor(input.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// The colour string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build from a known-good constant.
    fn constant(value: &'static str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for HexColor {
    type Err = ViajeroError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HexColor {
    type Error = ViajeroError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

/// State colours and the wishlist colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Colour per state. States missing from the map use the fallback.
    #[serde(default)]
    pub state_colors: BTreeMap<BrazilianState, HexColor>,
    /// Colour for wishlisted cities.
    #[serde(default = "default_wishlist_color")]
    pub wishlist_color: HexColor,
}

fn default_wishlist_color() -> HexColor {
    HexColor::constant(DEFAULT_WISHLIST_COLOR)
}

/// The per-state default palette.
#[must_use]
pub fn default_state_colors() -> BTreeMap<BrazilianState, HexColor> {
    BrazilianState::ALL
        .into_iter()
        .map(|state| (state, HexColor::constant(state.default_color())))
        .collect()
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            state_colors: default_state_colors(),
            wishlist_color: default_wishlist_color(),
        }
    }
}

impl UserSettings {
    /// Colour for a state, falling back to `#ff7800`.
    #[must_use]
    pub fn state_color(&self, state: BrazilianState) -> &str {
        self.state_colors
            .get(&state)
            .map_or(FALLBACK_STATE_COLOR, HexColor::as_str)
    }

    /// Set one state's colour.
    pub fn set_state_color(&mut self, state: BrazilianState, color: HexColor) {
        self.state_colors.insert(state, color);
    }

    /// Restore the default palette. The wishlist colour is left alone.
    pub fn reset_state_colors(&mut self) {
        self.state_colors = default_state_colors();
    }
}

/// The `user_settings` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettingsRecord {
    /// Owner.
    pub user_id: UserId,
    /// Settings payload.
    #[serde(flatten)]
    pub settings: UserSettings,
}
