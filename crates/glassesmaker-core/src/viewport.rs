//! Placement of the fixed-size stage inside the window.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Stage size in stage units. Exports are rendered at this size.
pub const STAGE_SIZE: Size = Size::new(320.0, 320.0);

/// Maps between window (screen) pixels and stage coordinates.
///
/// The stage is drawn at `origin` and scaled by `zoom`, which tracks the
/// window's HiDPI scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageViewport {
    /// Screen position of the stage's top-left corner.
    pub origin: Vec2,
    /// Screen pixels per stage unit.
    pub zoom: f64,
}

impl Default for StageViewport {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl StageViewport {
    pub fn new(origin: Vec2, zoom: f64) -> Self {
        Self {
            origin,
            zoom: if zoom > 0.0 { zoom } else { 1.0 },
        }
    }

    /// Center the stage in a screen-space area at the given zoom.
    pub fn centered_in(area: Rect, zoom: f64) -> Self {
        let zoom = if zoom > 0.0 { zoom } else { 1.0 };
        let center = area.center();
        let origin = Vec2::new(
            (center.x - STAGE_SIZE.width * zoom / 2.0).round(),
            (center.y - STAGE_SIZE.height * zoom / 2.0).round(),
        );
        Self { origin, zoom }
    }

    /// Stage to screen transform, for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin) * Affine::scale(self.zoom)
    }

    /// Screen to stage transform, for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.origin)
    }

    pub fn screen_to_stage(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn stage_to_screen(&self, stage_point: Point) -> Point {
        self.transform() * stage_point
    }

    /// The stage rectangle in screen pixels.
    pub fn screen_rect(&self) -> Rect {
        Rect::from_origin_size(
            self.origin.to_point(),
            Size::new(STAGE_SIZE.width * self.zoom, STAGE_SIZE.height * self.zoom),
        )
    }

    /// Whether a screen point lies over the stage.
    pub fn contains_screen(&self, screen_point: Point) -> bool {
        self.screen_rect().contains(screen_point)
    }

    /// Convert a tolerance in screen pixels to stage units.
    pub fn screen_to_stage_distance(&self, pixels: f64) -> f64 {
        pixels / self.zoom
    }
}
