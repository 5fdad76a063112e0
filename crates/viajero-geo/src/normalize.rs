//! Lon/lat to drawing-space transform.
//!
//! Rings are mapped into a viewport whose longer side is 100 units:
//!
//! ```text
//! x = (lon - west)  / lon_span * width
//! y = (north - lat) / lat_span * height
//! ```
//!
//! The y axis points down, matching SVG. The viewport aspect ratio follows
//! `lon_span / lat_span` but is clamped to [0.5, 3.0] so that very thin
//! municipalities still get a usable drawing area.

use serde::Serialize;

use crate::error::{GeoError, Result};
use crate::geometry::{Bounds, Position, Ring};

/// Length of the viewport's longer side.
pub const VIEWPORT_LONG_SIDE: f64 = 100.0;

/// Narrowest allowed viewport aspect ratio (width / height).
pub const MIN_ASPECT: f64 = 0.5;

/// Widest allowed viewport aspect ratio (width / height).
pub const MAX_ASPECT: f64 = 3.0;

/// Drawing-space size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    /// Width in drawing units.
    pub width: f64,
    /// Height in drawing units.
    pub height: f64,
}

impl Viewport {
    /// Size a viewport for a given aspect ratio, clamped to the allowed range.
    #[must_use]
    pub fn for_aspect(aspect: f64) -> Self {
        let aspect = aspect.clamp(MIN_ASPECT, MAX_ASPECT);
        if aspect >= 1.0 {
            Self {
                width: VIEWPORT_LONG_SIDE,
                height: VIEWPORT_LONG_SIDE / aspect,
            }
        } else {
            Self {
                width: VIEWPORT_LONG_SIDE * aspect,
                height: VIEWPORT_LONG_SIDE,
            }
        }
    }

    /// Width over height.
    #[must_use]
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

/// Rings mapped into drawing space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedShape {
    /// Drawing area.
    pub viewport: Viewport,
    /// Source lon/lat bounds.
    pub bounds: Bounds,
    /// Mapped rings, one per input ring, same order.
    pub rings: Vec<Vec<Position>>,
}

impl NormalizedShape {
    /// Width over height of the source bounds, before clamping.
    #[must_use]
    pub fn geographic_aspect(&self) -> f64 {
        self.bounds.width() / self.bounds.height()
    }
}

/// Normalize a set of rings into a shared viewport.
///
/// # Errors
///
/// Returns `Empty` if no ring has any position, and `Degenerate` if the union
/// bounding box has zero or non-finite width or height (or any position is
/// non-finite).
pub fn normalize<'a>(rings: impl IntoIterator<Item = &'a Ring>) -> Result<NormalizedShape> {
    let rings: Vec<&Ring> = rings.into_iter().collect();
    if rings.iter().all(|ring| ring.is_empty()) {
        return Err(GeoError::Empty);
    }
    if let Some([lon, lat]) = rings
        .iter()
        .flat_map(|ring| ring.iter())
        .find(|[lon, lat]| !lon.is_finite() || !lat.is_finite())
    {
        return Err(GeoError::Degenerate(format!("non-finite position [{lon}, {lat}]")));
    }

    let bounds = Bounds::of_positions(rings.iter().copied().flatten()).ok_or(GeoError::Empty)?;
    let lon_span = bounds.width();
    let lat_span = bounds.height();
    if !(lon_span.is_finite() && lat_span.is_finite()) || lon_span <= 0.0 || lat_span <= 0.0 {
        return Err(GeoError::Degenerate(format!(
            "bounding box spans {lon_span} x {lat_span}"
        )));
    }

    let viewport = Viewport::for_aspect(lon_span / lat_span);
    let mapped = rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|&[lon, lat]| {
                    [
                        (lon - bounds.west) / lon_span * viewport.width,
                        (bounds.north - lat) / lat_span * viewport.height,
                    ]
                })
                .collect()
        })
        .collect();

    Ok(NormalizedShape {
        viewport,
        bounds,
        rings: mapped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square(west: f64, south: f64, size: f64) -> Ring {
        vec![
            [west, south],
            [west + size, south],
            [west + size, south + size],
            [west, south + size],
            [west, south],
        ]
    }

    #[test]
    fn square_fills_a_square_viewport() {
        let ring = square(-44.0, -19.0, 0.1);
        let shape = normalize([&ring]).unwrap();
        assert_eq!(shape.viewport, Viewport { width: 100.0, height: 100.0 });
        let [x, y] = shape.rings[0][0];
        assert!(x.abs() < 1e-9);
        assert!((y - 100.0).abs() < 1e-9, "south-west corner maps to bottom-left");
    }

    #[test]
    fn wide_shape_has_landscape_viewport() {
        let ring = vec![[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [0.0, 0.0]];
        let shape = normalize([&ring]).unwrap();
        assert_eq!(shape.viewport, Viewport { width: 100.0, height: 50.0 });
    }

    #[test]
    fn aspect_is_clamped() {
        let sliver = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 1.0], [0.0, 0.0]];
        let shape = normalize([&sliver]).unwrap();
        assert!((shape.viewport.aspect() - MAX_ASPECT).abs() < 1e-9);
        assert!((shape.geographic_aspect() - 10.0).abs() < 1e-9);

        let tall = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 10.0], [0.0, 0.0]];
        let shape = normalize([&tall]).unwrap();
        assert_eq!(shape.viewport, Viewport { width: 50.0, height: 100.0 });
    }

    #[test]
    fn union_bounds_span_all_rings() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(3.0, 0.0, 1.0);
        let shape = normalize([&a, &b]).unwrap();
        assert_eq!(shape.bounds.east, 4.0);
        assert_eq!(shape.rings.len(), 2);
        assert!((shape.rings[1][1][0] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_is_an_error() {
        let none: Vec<Ring> = Vec::new();
        assert_eq!(normalize(&none), Err(GeoError::Empty));
        let blank: Ring = Vec::new();
        assert_eq!(normalize([&blank]), Err(GeoError::Empty));
    }

    #[test]
    fn zero_span_is_degenerate() {
        let line = vec![[0.0, 0.0], [1.0, 0.0]];
        assert!(matches!(normalize([&line]), Err(GeoError::Degenerate(_))));
        let point = vec![[5.0, 5.0]];
        assert!(matches!(normalize([&point]), Err(GeoError::Degenerate(_))));
    }

    #[test]
    fn non_finite_position_is_degenerate() {
        let ring = vec![[0.0, 0.0], [f64::NAN, 1.0], [1.0, 1.0]];
        assert!(matches!(normalize([&ring]), Err(GeoError::Degenerate(_))));
    }

    proptest! {
        #[test]
        fn normalization_is_deterministic_and_in_bounds(
            points in prop::collection::vec((-75.0f64..-30.0, -35.0f64..5.0), 3..40)
        ) {
            let ring: Ring = points.iter().map(|&(lon, lat)| [lon, lat]).collect();
            let first = normalize([&ring]);
            let second = normalize([&ring]);
            prop_assert_eq!(&first, &second);
            if let Ok(shape) = first {
                for [x, y] in &shape.rings[0] {
                    prop_assert!(*x >= -1e-9 && *x <= shape.viewport.width + 1e-9);
                    prop_assert!(*y >= -1e-9 && *y <= shape.viewport.height + 1e-9);
                }
                let aspect = shape.viewport.aspect();
                prop_assert!((MIN_ASPECT - 1e-9..=MAX_ASPECT + 1e-9).contains(&aspect));
            }
        }
    }
}
