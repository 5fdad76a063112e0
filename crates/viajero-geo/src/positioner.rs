//! Drag-to-position state machine for the cover photo preview.
//!
//! Pointer coordinates are in surface pixels. The focal point is kept
//! normalized to the surface so that the same position renders identically
//! whatever the preview size.

use serde::Serialize;
use viajero_core::{CoverPosition, MAX_COVER_SCALE, MIN_COVER_SCALE};

/// Preview surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Surface {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Surface {
    fn normalize(&self, px: f64, py: f64) -> Option<(f64, f64)> {
        if !(px.is_finite() && py.is_finite()) {
            return None;
        }
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        Some((px / self.width, py / self.height))
    }

    fn contains(&self, px: f64, py: f64) -> bool {
        (0.0..=self.width).contains(&px) && (0.0..=self.height).contains(&py)
    }
}

/// Drag state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DragState {
    /// No drag in progress.
    Idle,
    /// Dragging; `offset` is pointer minus focal point at pointer-down.
    Dragging {
        /// Normalized `(dx, dy)`.
        offset: (f64, f64),
    },
}

/// CSS-style transform for the preview image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviewTransform {
    /// Horizontal translation in percent of the image width.
    pub translate_x_percent: f64,
    /// Vertical translation in percent of the image height.
    pub translate_y_percent: f64,
    /// Zoom.
    pub scale: f64,
}

impl PreviewTransform {
    /// Render as a CSS `transform` value.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!(
            "translate({}%, {}%) scale({})",
            self.translate_x_percent, self.translate_y_percent, self.scale
        )
    }
}

/// Interactive positioner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Positioner {
    surface: Surface,
    x: f64,
    y: f64,
    scale: f64,
    state: DragState,
}

impl Positioner {
    /// Start idle at `initial`, with out-of-range components clamped.
    #[must_use]
    pub fn new(surface: Surface, initial: CoverPosition) -> Self {
        let default = CoverPosition::default();
        let mut positioner = Self {
            surface,
            x: default.x,
            y: default.y,
            scale: default.scale,
            state: DragState::Idle,
        };
        if initial.x.is_finite() {
            positioner.x = clamp01(initial.x);
        }
        if initial.y.is_finite() {
            positioner.y = clamp01(initial.y);
        }
        positioner.set_zoom(initial.scale);
        positioner
    }

    /// Current drag state.
    #[must_use]
    pub const fn state(&self) -> DragState {
        self.state
    }

    /// Current focal point and zoom.
    #[must_use]
    pub const fn position(&self) -> CoverPosition {
        CoverPosition {
            x: self.x,
            y: self.y,
            scale: self.scale,
        }
    }

    /// Begin a drag if the pointer is on the surface. Returns whether a drag
    /// started.
    pub fn pointer_down(&mut self, px: f64, py: f64) -> bool {
        if !self.surface.contains(px, py) {
            return false;
        }
        let Some((nx, ny)) = self.surface.normalize(px, py) else {
            return false;
        };
        self.state = DragState::Dragging {
            offset: (nx - self.x, ny - self.y),
        };
        true
    }

    /// Move the focal point while dragging. Ignored when idle or when the
    /// pointer position is not finite.
    pub fn pointer_move(&mut self, px: f64, py: f64) {
        let DragState::Dragging { offset } = self.state else {
            return;
        };
        let Some((nx, ny)) = self.surface.normalize(px, py) else {
            return;
        };
        let x = nx - offset.0;
        let y = ny - offset.1;
        if x.is_finite() && y.is_finite() {
            self.x = clamp01(x);
            self.y = clamp01(y);
        }
    }

    /// End the drag.
    pub fn pointer_up(&mut self) {
        self.state = DragState::Idle;
    }

    /// The pointer left the surface; ends the drag.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// Set the zoom, clamped to the allowed range. Non-finite input is
    /// ignored. Applies in any state.
    pub fn set_zoom(&mut self, scale: f64) {
        if scale.is_finite() {
            self.scale = scale.clamp(MIN_COVER_SCALE, MAX_COVER_SCALE);
        }
    }

    /// Change the surface size, e.g. after a layout change. Ends any drag.
    pub fn resize(&mut self, surface: Surface) {
        self.surface = surface;
        self.state = DragState::Idle;
    }

    /// Transform for the preview image.
    #[must_use]
    pub fn preview_transform(&self) -> PreviewTransform {
        PreviewTransform {
            translate_x_percent: (self.x - 0.5) * 100.0,
            translate_y_percent: (self.y - 0.5) * 100.0,
            scale: self.scale,
        }
    }
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
