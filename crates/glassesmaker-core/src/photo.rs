//! The uploaded background photo and cover-fit placement.

use image::RgbaImage;
use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Identity of a decoded photo. A new upload always gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhotoId(Uuid);

impl PhotoId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A decoded bitmap. Immutable once created and replaced wholesale on upload.
#[derive(Debug, Clone)]
pub struct Photo {
    id: PhotoId,
    pixels: Arc<RgbaImage>,
}

impl PartialEq for Photo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Photo {
    /// Wrap decoded RGBA pixels.
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            id: PhotoId::new(),
            pixels: Arc::new(pixels),
        }
    }

    pub fn id(&self) -> PhotoId {
        self.id
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> Size {
        Size::new(self.width() as f64, self.height() as f64)
    }
}

/// Placement of a source image filling a target box while preserving aspect
/// ratio. The overflowing axis is cropped evenly on both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    /// Visible region in source pixel coordinates.
    pub source: Rect,
    /// Target box the region is stretched over.
    pub target: Rect,
    /// Uniform source-to-target scale.
    pub scale: f64,
}

impl CoverFit {
    /// Compute the cover placement of `source` inside `target`.
    pub fn compute(source: Size, target: Rect) -> Self {
        if source.width <= 0.0 || source.height <= 0.0 {
            return Self {
                source: Rect::ZERO,
                target,
                scale: 1.0,
            };
        }
        let scale = (target.width() / source.width).max(target.height() / source.height);
        let visible = Size::new(target.width() / scale, target.height() / scale);
        let x0 = (source.width - visible.width) / 2.0;
        let y0 = (source.height - visible.height) / 2.0;
        Self {
            source: Rect::new(x0, y0, x0 + visible.width, y0 + visible.height),
            target,
            scale,
        }
    }

    /// Visible source region snapped to whole pixels, as `(x, y, width, height)`.
    pub fn pixel_crop(&self) -> (u32, u32, u32, u32) {
        let x = self.source.x0.floor().max(0.0) as u32;
        let y = self.source.y0.floor().max(0.0) as u32;
        let w = (self.source.width().round() as u32).max(1);
        let h = (self.source.height().round() as u32).max(1);
        (x, y, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAGE: Rect = Rect::new(0.0, 0.0, 320.0, 320.0);

    #[test]
    fn test_landscape_crops_sides() {
        let fit = CoverFit::compute(Size::new(640.0, 320.0), STAGE);
        assert!((fit.scale - 1.0).abs() < 1e-9);
        assert_eq!(fit.source, Rect::new(160.0, 0.0, 480.0, 320.0));
        assert_eq!(fit.pixel_crop(), (160, 0, 320, 320));
    }

    #[test]
    fn test_portrait_crops_top_and_bottom() {
        let fit = CoverFit::compute(Size::new(100.0, 200.0), STAGE);
        assert!((fit.scale - 3.2).abs() < 1e-9);
        assert!((fit.source.y0 - 50.0).abs() < 1e-9);
        assert!((fit.source.height() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_photos_compare_by_identity() {
        let a = Photo::from_rgba(RgbaImage::new(2, 2));
        let b = Photo::from_rgba(RgbaImage::new(2, 2));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.size(), Size::new(2.0, 2.0));
    }
}
