//! Cover-fit placement of a photo inside a viewport.

use serde::Serialize;
use viajero_core::{CoverPosition, MAX_COVER_SCALE, MIN_COVER_SCALE};

use crate::normalize::{NormalizedShape, Viewport};

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageSize {
    /// Width over height, `None` for a zero dimension.
    #[must_use]
    pub fn aspect(&self) -> Option<f64> {
        (self.width > 0 && self.height > 0)
            .then(|| f64::from(self.width) / f64::from(self.height))
    }
}

/// Where the image is drawn, in viewport units. `(x, y)` is the top-left
/// corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Drawn width.
    pub width: f64,
    /// Drawn height.
    pub height: f64,
}

impl Placement {
    /// Centre of the drawn image.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Cover-fit an image into `viewport`.
///
/// At scale 1 the image covers the viewport along its constraining axis: an
/// image wider than the viewport is sized by height, otherwise by width. The
/// image centre sits at `(x * width, y * height)` of the focal point.
///
/// Focal components are clamped to [0, 1] and the scale to its allowed
/// range; non-finite components fall back to their defaults. Returns `None`
/// when the image size is unknown or has a zero dimension, or the viewport
/// is empty.
#[must_use]
pub fn fit(viewport: Viewport, image: Option<ImageSize>, position: CoverPosition) -> Option<Placement> {
    let aspect = image?.aspect()?;
    if !(viewport.width > 0.0 && viewport.height > 0.0) {
        return None;
    }
    let position = sanitize(position);

    let (width, height) = if aspect > viewport.aspect() {
        let height = viewport.height * position.scale;
        (height * aspect, height)
    } else {
        let width = viewport.width * position.scale;
        (width, width / aspect)
    };

    Some(Placement {
        x: position.x * viewport.width - width / 2.0,
        y: position.y * viewport.height - height / 2.0,
        width,
        height,
    })
}

/// Cover-fit an image into a normalized shape's viewport so that it keeps
/// its proportions once the viewport is stretched over the shape's bounds.
///
/// The viewport's aspect ratio is clamped, so pinning it to the real bounds
/// stretches it horizontally by `geographic / clamped`. The image is fitted
/// against the unclamped aspect and its horizontal extent is then divided by
/// that factor. Returns `None` in the same cases as [`fit`].
#[must_use]
pub fn fit_shape(
    shape: &NormalizedShape,
    image: Option<ImageSize>,
    position: CoverPosition,
) -> Option<Placement> {
    let viewport = shape.viewport;
    let stretch = shape.geographic_aspect() / viewport.aspect();
    if !(stretch.is_finite() && stretch > 0.0) {
        return None;
    }
    let geographic = Viewport {
        width: viewport.width * stretch,
        height: viewport.height,
    };
    let placement = fit(geographic, image, position)?;
    Some(Placement {
        x: placement.x / stretch,
        width: placement.width / stretch,
        ..placement
    })
}

fn sanitize(position: CoverPosition) -> CoverPosition {
    let default = CoverPosition::default();
    let unit = |value: f64, fallback: f64| {
        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            fallback
        }
    };
    CoverPosition {
        x: unit(position.x, default.x),
        y: unit(position.y, default.y),
        scale: if position.scale.is_finite() {
            position.scale.clamp(MIN_COVER_SCALE, MAX_COVER_SCALE)
        } else {
            default.scale
        },
    }
}
