//! The glasses sticker: its persisted placement and the live scene node.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Glyph shown when the widget starts.
pub const DEFAULT_GLYPH: &str = "😎";
/// Initial top-left anchor of the sticker in stage coordinates.
pub const DEFAULT_POSITION: Point = Point::new(160.0, 120.0);
/// Initial font size.
pub const DEFAULT_FONT_SIZE: f64 = 50.0;

/// The single overlay entity.
///
/// `position` is the top-left anchor of the glyph box; rotation pivots around it.
/// Size lives only in `font_size`; there is no persisted scale factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sticker {
    /// Text drawn as the sticker, one of the glyph choices in practice.
    pub glyph: String,
    /// Top-left anchor in stage coordinates.
    pub position: Point,
    /// Font size in stage units.
    pub font_size: f64,
    /// Rotation in degrees. Values outside [0, 360] are kept as-is.
    pub rotation_degrees: f64,
    /// Whether pointer drags move the sticker.
    pub draggable: bool,
}

impl Default for Sticker {
    fn default() -> Self {
        Self {
            glyph: DEFAULT_GLYPH.to_string(),
            position: DEFAULT_POSITION,
            font_size: DEFAULT_FONT_SIZE,
            rotation_degrees: 0.0,
            draggable: true,
        }
    }
}

/// Size of a glyph's layout box per unit of font size.
///
/// The renderer measures the real value once fonts are loaded; until then a
/// square em box is assumed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlyphExtent {
    pub width_em: f64,
    pub height_em: f64,
}

impl Default for GlyphExtent {
    fn default() -> Self {
        Self {
            width_em: 1.0,
            height_em: 1.0,
        }
    }
}

impl GlyphExtent {
    /// Create an extent, falling back to the square em box for degenerate input.
    pub fn new(width_em: f64, height_em: f64) -> Self {
        if width_em.is_finite() && height_em.is_finite() && width_em > 0.0 && height_em > 0.0 {
            Self { width_em, height_em }
        } else {
            Self::default()
        }
    }

    /// Unscaled box size at the given font size.
    pub fn at(&self, font_size: f64) -> Size {
        Size::new(self.width_em * font_size, self.height_em * font_size)
    }
}

/// The sticker as it exists in the scene, including the transient scale a
/// transformer gesture applies before it is folded into `font_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct StickerNode {
    pub glyph: String,
    pub position: Point,
    pub font_size: f64,
    pub rotation_degrees: f64,
    pub scale: Vec2,
    pub draggable: bool,
}

impl From<&Sticker> for StickerNode {
    fn from(sticker: &Sticker) -> Self {
        Self {
            glyph: sticker.glyph.clone(),
            position: sticker.position,
            font_size: sticker.font_size,
            rotation_degrees: sticker.rotation_degrees,
            scale: Vec2::new(1.0, 1.0),
            draggable: sticker.draggable,
        }
    }
}

impl StickerNode {
    /// Node-to-stage transform: translate, rotate about the anchor, then scale.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.position.to_vec2())
            * Affine::rotate(self.rotation_degrees.to_radians())
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }

    /// Unscaled glyph box in node-local coordinates.
    pub fn local_bounds(&self, extent: GlyphExtent) -> Rect {
        Rect::from_origin_size(Point::ZERO, extent.at(self.font_size))
    }

    /// Axis-aligned bounds of the rotated, scaled glyph box in stage coordinates.
    pub fn stage_bounds(&self, extent: GlyphExtent) -> Rect {
        self.transform()
            .transform_rect_bbox(self.local_bounds(extent))
    }

    /// Whether a stage-space point lands on the glyph box.
    pub fn contains(&self, point: Point, extent: GlyphExtent) -> bool {
        if self.scale.x == 0.0 || self.scale.y == 0.0 {
            return false;
        }
        let local = self.transform().inverse() * point;
        self.local_bounds(extent).contains(local)
    }

    /// Drop any transient scale. Size is carried by `font_size` alone.
    pub fn reset_scale(&mut self) {
        self.scale = Vec2::new(1.0, 1.0);
    }

    /// Whether the node carries no transient scale.
    pub fn is_unit_scale(&self) -> bool {
        (self.scale.x - 1.0).abs() < f64::EPSILON && (self.scale.y - 1.0).abs() < f64::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sticker() {
        let sticker = Sticker::default();
        assert_eq!(sticker.glyph, "😎");
        assert_eq!(sticker.position, Point::new(160.0, 120.0));
        assert!((sticker.font_size - 50.0).abs() < f64::EPSILON);
        assert!(sticker.rotation_degrees.abs() < f64::EPSILON);
        assert!(sticker.draggable);
    }

    #[test]
    fn test_node_from_sticker_has_unit_scale() {
        let node = StickerNode::from(&Sticker::default());
        assert!(node.is_unit_scale());
        assert_eq!(node.position, DEFAULT_POSITION);
    }

    #[test]
    fn test_contains_unrotated() {
        let node = StickerNode::from(&Sticker::default());
        let extent = GlyphExtent::default();
        assert!(node.contains(Point::new(170.0, 130.0), extent));
        assert!(!node.contains(Point::new(150.0, 130.0), extent));
        assert!(!node.contains(Point::new(215.0, 130.0), extent));
    }

    #[test]
    fn test_rotation_pivots_on_anchor() {
        let mut node = StickerNode::from(&Sticker::default());
        node.rotation_degrees = 90.0;
        let extent = GlyphExtent::default();
        // Rotated a quarter turn clockwise, the box now extends to the left of the anchor.
        assert!(node.contains(Point::new(140.0, 130.0), extent));
        assert!(!node.contains(Point::new(170.0, 130.0), extent));

        let bounds = node.stage_bounds(extent);
        assert!((bounds.x1 - 160.0).abs() < 1e-9);
        assert!((bounds.x0 - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_grows_bounds() {
        let mut node = StickerNode::from(&Sticker::default());
        node.scale = Vec2::new(2.0, 2.0);
        let bounds = node.stage_bounds(GlyphExtent::default());
        assert!((bounds.width() - 100.0).abs() < 1e-9);
        node.reset_scale();
        assert!(node.is_unit_scale());
    }

    #[test]
    fn test_degenerate_extent_falls_back() {
        assert_eq!(GlyphExtent::new(0.0, 1.2), GlyphExtent::default());
        assert_eq!(GlyphExtent::new(f64::NAN, 1.0), GlyphExtent::default());
        let extent = GlyphExtent::new(1.2, 1.1);
        let size = extent.at(10.0);
        assert!((size.width - 12.0).abs() < 1e-9);
        assert!((size.height - 11.0).abs() < 1e-9);
    }
}
