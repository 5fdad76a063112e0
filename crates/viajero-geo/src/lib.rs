//! Municipality geometry and the cover-photo pipeline for Viaje.ro.
//!
//! A cover photo is drawn inside its municipality's outline in four steps:
//!
//! 1. `normalize` maps the outline's lon/lat rings into a drawing space
//!    whose longer side is 100 units.
//! 2. `clip` turns the mapped rings into one even-odd clip path.
//! 3. `fit` cover-fits the photo at the stored focal point and zoom;
//!    `fit_shape` corrects for the clamped viewport aspect.
//! 4. `positioner` is the drag/zoom state machine that edits the focal
//!    point.
//!
//! Outlines come from a [`GeoJsonIndex`]; when none is found a
//! `placeholder` square stands in.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clip;
pub mod error;
pub mod fit;
pub mod geojson;
pub mod geometry;
pub mod normalize;
pub mod placeholder;
pub mod positioner;

pub use clip::{cover_overlay, path_data, ClipPath, OverlayStyle};
pub use error::{GeoError, Result};
pub use fit::{fit, fit_shape, ImageSize, Placement};
pub use geojson::{GeoJsonIndex, MunicipalityFeature};
pub use geometry::{Bounds, Geometry, Position, Ring};
pub use normalize::{normalize, NormalizedShape, Viewport};
pub use placeholder::placeholder;
pub use positioner::{DragState, Positioner, PreviewTransform, Surface};
