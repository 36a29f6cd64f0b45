//! Live drag and transformer gestures on the sticker node.
//!
//! During a gesture the node is moved, rotated and scaled directly. When the
//! gesture ends the result is reported once as a [`TransformEnd`] (or a drag
//! end position) and the transient scale is reset to 1 on both axes.

use crate::input::Modifiers;
use crate::selection::{Edge, HandleKind};
use crate::sticker::{GlyphExtent, StickerNode};
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Smallest width or height a resize may produce, in stage units.
pub const MIN_BOX_SIZE: f64 = 10.0;
/// Rotation snap step while Shift is held.
const ROTATION_SNAP: f64 = PI / 12.0;

/// The transformer's box: rotated top-left corner, size and rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

impl BoundBox {
    /// The box the transformer draws around a node.
    pub fn from_node(node: &StickerNode, extent: GlyphExtent) -> Self {
        let base = extent.at(node.font_size);
        Self {
            x: node.position.x,
            y: node.position.y,
            width: base.width * node.scale.x,
            height: base.height * node.scale.y,
            rotation: node.rotation_degrees.to_radians(),
        }
    }

    /// Box-local to stage transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(Vec2::new(self.x, self.y)) * Affine::rotate(self.rotation)
    }

    pub fn center(&self) -> Point {
        self.transform() * Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Corners in stage coordinates, clockwise from the top-left.
    pub fn corners(&self) -> [Point; 4] {
        let t = self.transform();
        [
            t * Point::new(0.0, 0.0),
            t * Point::new(self.width, 0.0),
            t * Point::new(self.width, self.height),
            t * Point::new(0.0, self.height),
        ]
    }
}

/// Accept or reject a proposed box during a live resize.
///
/// A box narrower or shorter than [`MIN_BOX_SIZE`] is rejected and the old
/// box is kept.
pub fn limit_bound_box(old: BoundBox, new: BoundBox) -> BoundBox {
    if new.width < MIN_BOX_SIZE || new.height < MIN_BOX_SIZE {
        old
    } else {
        new
    }
}

/// Values read from the node when a transformer gesture ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformEnd {
    /// Horizontal scale factor at gesture end. The vertical factor is ignored.
    pub scale_x: f64,
    pub x: f64,
    pub y: f64,
    pub rotation_degrees: f64,
}

/// Read the gesture result off the node and reset its scale to identity.
pub fn end_transform(node: &mut StickerNode) -> TransformEnd {
    let end = TransformEnd {
        scale_x: node.scale.x,
        x: node.position.x,
        y: node.position.y,
        rotation_degrees: node.rotation_degrees,
    };
    node.reset_scale();
    end
}

/// An in-progress drag of the node body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGesture {
    grab_offset: Vec2,
    moved: bool,
}

impl DragGesture {
    pub fn begin(node: &StickerNode, pointer: Point) -> Self {
        Self {
            grab_offset: pointer - node.position,
            moved: false,
        }
    }

    /// Move the node so the grab point stays under the pointer.
    pub fn update(&mut self, node: &mut StickerNode, pointer: Point) {
        let position = pointer - self.grab_offset;
        if position != node.position {
            node.position = position;
            self.moved = true;
        }
    }

    /// Whether the node actually moved. A press without movement is a click.
    pub fn moved(&self) -> bool {
        self.moved
    }
}

/// An in-progress resize or rotation through a transformer anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformGesture {
    handle: HandleKind,
    start: BoundBox,
    last_valid: BoundBox,
    base: Size,
}

impl TransformGesture {
    pub fn begin(handle: HandleKind, node: &StickerNode, extent: GlyphExtent) -> Self {
        let start = BoundBox::from_node(node, extent);
        Self {
            handle,
            start,
            last_valid: start,
            base: extent.at(node.font_size),
        }
    }

    pub fn handle(&self) -> HandleKind {
        self.handle
    }

    /// The last box accepted by [`limit_bound_box`].
    pub fn current(&self) -> BoundBox {
        self.last_valid
    }

    /// The box the pointer asks for, before the size limit.
    pub fn propose(&self, pointer: Point, modifiers: Modifiers) -> BoundBox {
        match self.handle {
            HandleKind::Rotate => self.rotated(pointer, modifiers.shift),
            HandleKind::Corner(corner) => {
                let local = self.start.transform().inverse() * pointer;
                let (mu, mv) = corner.unit();
                let (fu, fv) = corner.opposite().unit();
                let (w0, h0) = (self.start.width, self.start.height);
                let fixed = Point::new(fu * w0, fv * h0);
                let diagonal = Vec2::new((mu - fu) * w0, (mv - fv) * h0);
                let t = if diagonal.hypot2() > 0.0 {
                    (local - fixed).dot(diagonal) / diagonal.hypot2()
                } else {
                    1.0
                };
                let (w, h) = (w0 * t, h0 * t);
                let x0 = if mu < fu { fixed.x - w } else { fixed.x };
                let y0 = if mv < fv { fixed.y - h } else { fixed.y };
                self.resized(Point::new(x0, y0), w, h)
            }
            HandleKind::Edge(edge) => {
                let local = self.start.transform().inverse() * pointer;
                let (w0, h0) = (self.start.width, self.start.height);
                match edge {
                    Edge::Right => self.resized(Point::ZERO, local.x, h0),
                    Edge::Left => self.resized(Point::new(local.x, 0.0), w0 - local.x, h0),
                    Edge::Bottom => self.resized(Point::ZERO, w0, local.y),
                    Edge::Top => self.resized(Point::new(0.0, local.y), w0, h0 - local.y),
                }
            }
        }
    }

    /// Feed a pointer position. The proposal is kept only if it passes the
    /// size limit; otherwise the last valid box stays.
    pub fn update(&mut self, pointer: Point, modifiers: Modifiers) -> BoundBox {
        let proposed = self.propose(pointer, modifiers);
        self.last_valid = limit_bound_box(self.last_valid, proposed);
        self.last_valid
    }

    /// Write the current box onto the node as position, rotation and scale.
    pub fn apply_to(&self, node: &mut StickerNode) {
        let b = self.last_valid;
        node.position = Point::new(b.x, b.y);
        node.rotation_degrees = b.rotation.to_degrees();
        if self.base.width > 0.0 && self.base.height > 0.0 {
            node.scale = Vec2::new(b.width / self.base.width, b.height / self.base.height);
        }
    }

    fn resized(&self, local_origin: Point, width: f64, height: f64) -> BoundBox {
        let origin = self.start.transform() * local_origin;
        BoundBox {
            x: origin.x,
            y: origin.y,
            width,
            height,
            rotation: self.start.rotation,
        }
    }

    fn rotated(&self, pointer: Point, snap: bool) -> BoundBox {
        let center = self.start.center();
        let d = pointer - center;
        let mut angle = d.y.atan2(d.x) + FRAC_PI_2;
        if snap {
            angle = (angle / ROTATION_SNAP).round() * ROTATION_SNAP;
        }
        let angle = angle.rem_euclid(TAU);
        let half = Affine::rotate(angle) * Point::new(self.start.width / 2.0, self.start.height / 2.0);
        let origin = center - half.to_vec2();
        BoundBox {
            x: origin.x,
            y: origin.y,
            width: self.start.width,
            height: self.start.height,
            rotation: angle,
        }
    }
}

/// The pointer gesture currently driving the node, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Drag(DragGesture),
    Transform(TransformGesture),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Corner;
    use crate::sticker::Sticker;

    fn node() -> StickerNode {
        StickerNode::from(&Sticker::default())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_limit_rejects_small_boxes() {
        let old = BoundBox { x: 0.0, y: 0.0, width: 50.0, height: 50.0, rotation: 0.0 };
        let narrow = BoundBox { width: 5.0, ..old };
        let short = BoundBox { height: 9.9, ..old };
        let ok = BoundBox { width: 10.0, height: 10.0, ..old };
        assert_eq!(limit_bound_box(old, narrow), old);
        assert_eq!(limit_bound_box(old, short), old);
        assert_eq!(limit_bound_box(old, ok), ok);
    }

    #[test]
    fn test_corner_resize_keeps_ratio_and_anchor() {
        let mut n = node();
        let extent = GlyphExtent::default();
        let mut gesture = TransformGesture::begin(HandleKind::Corner(Corner::BottomRight), &n, extent);
        // Pull the bottom-right corner from (210, 170) out to (260, 220).
        let b = gesture.update(Point::new(260.0, 220.0), Modifiers::default());
        assert!(approx(b.width, 100.0) && approx(b.height, 100.0));
        assert!(approx(b.x, 160.0) && approx(b.y, 120.0));

        gesture.apply_to(&mut n);
        assert!(approx(n.scale.x, 2.0) && approx(n.scale.y, 2.0));
        assert_eq!(n.position, Point::new(160.0, 120.0));
    }

    #[test]
    fn test_top_left_resize_moves_origin() {
        let n = node();
        let mut gesture = TransformGesture::begin(HandleKind::Corner(Corner::TopLeft), &n, GlyphExtent::default());
        let b = gesture.update(Point::new(185.0, 145.0), Modifiers::default());
        assert!(approx(b.width, 25.0) && approx(b.height, 25.0));
        assert!(approx(b.x, 185.0) && approx(b.y, 145.0));
    }

    #[test]
    fn test_live_clamp_keeps_last_valid_box() {
        let n = node();
        let mut gesture = TransformGesture::begin(HandleKind::Edge(Edge::Right), &n, GlyphExtent::default());
        let valid = gesture.update(Point::new(190.0, 140.0), Modifiers::default());
        assert!(approx(valid.width, 30.0));

        // Width 5 is below the minimum; the box stays at its last valid value.
        let clamped = gesture.update(Point::new(165.0, 140.0), Modifiers::default());
        assert_eq!(clamped, valid);
        assert_eq!(gesture.current(), valid);
    }

    #[test]
    fn test_inverted_corner_drag_is_rejected() {
        let n = node();
        let start = BoundBox::from_node(&n, GlyphExtent::default());
        let mut gesture = TransformGesture::begin(HandleKind::Corner(Corner::BottomRight), &n, GlyphExtent::default());
        assert_eq!(gesture.update(Point::new(100.0, 60.0), Modifiers::default()), start);
    }

    #[test]
    fn test_edge_resize_in_rotated_frame() {
        let mut n = node();
        n.rotation_degrees = 90.0;
        let mut gesture = TransformGesture::begin(HandleKind::Edge(Edge::Bottom), &n, GlyphExtent::default());
        // Box-local +y points toward stage -x after a quarter turn.
        let b = gesture.update(Point::new(80.0, 150.0), Modifiers::default());
        assert!(approx(b.height, 80.0));
        assert!(approx(b.width, 50.0));
        assert!(approx(b.x, 160.0) && approx(b.y, 120.0));
    }

    #[test]
    fn test_rotation_keeps_center() {
        let mut n = node();
        let extent = GlyphExtent::default();
        let mut gesture = TransformGesture::begin(HandleKind::Rotate, &n, extent);
        let center = BoundBox::from_node(&n, extent).center();
        // Pointer straight to the right of the centre is a quarter turn.
        let b = gesture.update(center + Vec2::new(80.0, 0.0), Modifiers::default());
        assert!(approx(b.rotation, FRAC_PI_2));
        let c = b.center();
        assert!(approx(c.x, center.x) && approx(c.y, center.y));

        gesture.apply_to(&mut n);
        assert!(approx(n.rotation_degrees, 90.0));
        assert!(n.is_unit_scale());
    }

    #[test]
    fn test_rotation_snaps_with_shift() {
        let n = node();
        let extent = GlyphExtent::default();
        let mut gesture = TransformGesture::begin(HandleKind::Rotate, &n, extent);
        let center = BoundBox::from_node(&n, extent).center();
        // About 40° from vertical snaps to 45°.
        let angle = 40f64.to_radians();
        let pointer = center + Vec2::new(angle.sin() * 60.0, -angle.cos() * 60.0);
        let b = gesture.update(pointer, Modifiers::shift());
        assert!(approx(b.rotation.to_degrees(), 45.0));
    }

    #[test]
    fn test_rotation_is_normalized() {
        let n = node();
        let extent = GlyphExtent::default();
        let mut gesture = TransformGesture::begin(HandleKind::Rotate, &n, extent);
        let center = BoundBox::from_node(&n, extent).center();
        // Pointer to the left of the centre: -90° becomes 270°.
        let b = gesture.update(center - Vec2::new(80.0, 0.0), Modifiers::default());
        assert!(approx(b.rotation.to_degrees(), 270.0));
    }

    #[test]
    fn test_end_transform_resets_scale() {
        let mut n = node();
        n.scale = Vec2::new(1.6, 1.2);
        n.position = Point::new(40.0, 60.0);
        n.rotation_degrees = 30.0;
        let end = end_transform(&mut n);
        assert!(approx(end.scale_x, 1.6));
        assert_eq!((end.x, end.y), (40.0, 60.0));
        assert!(approx(end.rotation_degrees, 30.0));
        assert!(n.is_unit_scale());
    }

    #[test]
    fn test_drag_keeps_grab_offset() {
        let mut n = node();
        let mut drag = DragGesture::begin(&n, Point::new(170.0, 130.0));
        assert!(!drag.moved());
        drag.update(&mut n, Point::new(60.0, 60.0));
        assert_eq!(n.position, Point::new(50.0, 50.0));
        assert!(drag.moved());
    }
}
