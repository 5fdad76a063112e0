//! Stand-in shapes for municipalities with no outline.

use viajero_core::BrazilianState;

use crate::geometry::Geometry;

/// Half the side of a placeholder square, in degrees.
pub const PLACEHOLDER_HALF_SIDE: f64 = 0.05;

/// Centre used when the state is not known.
pub const DEFAULT_CENTER: (f64, f64) = (-44.0, -19.0);

/// A 0.1° square around the state's approximate centre, or around the
/// default centre when `state` is `None`.
#[must_use]
pub fn placeholder(state: Option<BrazilianState>) -> Geometry {
    let (lon, lat) = state.map_or(DEFAULT_CENTER, BrazilianState::center);
    let d = PLACEHOLDER_HALF_SIDE;
    Geometry::Polygon(vec![vec![
        [lon - d, lat - d],
        [lon + d, lat - d],
        [lon + d, lat + d],
        [lon - d, lat + d],
        [lon - d, lat - d],
    ]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn placeholder_is_centred_on_state() {
        let bounds = placeholder(Some(BrazilianState::Bahia)).bounds().unwrap();
        let [lon, lat] = bounds.center();
        assert!((lon + 41.0).abs() < 1e-9);
        assert!((lat + 13.0).abs() < 1e-9);
        assert!((bounds.width() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn unknown_state_uses_default_centre() {
        let [lon, lat] = placeholder(None).bounds().unwrap().center();
        assert!((lon - DEFAULT_CENTER.0).abs() < 1e-9);
        assert!((lat - DEFAULT_CENTER.1).abs() < 1e-9);
    }

    #[test]
    fn placeholder_always_normalizes() {
        for state in BrazilianState::ALL {
            let geometry = placeholder(Some(state));
            assert!(normalize(geometry.rings()).is_ok(), "{state}");
        }
    }
}
