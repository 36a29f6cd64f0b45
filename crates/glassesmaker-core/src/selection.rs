//! Selection state and transformer handles.

use crate::transform::BoundBox;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Anchor size in screen pixels.
pub const HANDLE_SIZE: f64 = 10.0;
/// Anchor hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;
/// Distance from the top edge of the box to the rotation anchor, in stage units.
pub const ROTATE_ANCHOR_OFFSET: f64 = 50.0;

/// Entities on the stage that pointer events can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    Photo,
    Sticker,
}

/// What a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerTarget {
    /// The stage surface itself, with no child shape under the pointer.
    Stage,
    /// A child shape.
    Node(NodeId),
    /// A transformer anchor.
    Handle(HandleKind),
}

/// The currently selected entity. Only the sticker is selectable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection(Option<NodeId>);

impl Selection {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn sticker() -> Self {
        Self(Some(NodeId::Sticker))
    }

    pub fn id(&self) -> Option<NodeId> {
        self.0
    }

    pub fn is_sticker_selected(&self) -> bool {
        self.0 == Some(NodeId::Sticker)
    }

    /// Selection after a pointer-down on `target`.
    ///
    /// Only a hit on the bare stage clears the selection; hits on any child
    /// shape other than the sticker leave it alone.
    pub fn after_pointer_down(self, target: PointerTarget) -> Self {
        match target {
            PointerTarget::Stage => Self::none(),
            PointerTarget::Node(NodeId::Sticker) => Self::sticker(),
            PointerTarget::Node(NodeId::Photo) | PointerTarget::Handle(_) => self,
        }
    }
}

/// Type of transformer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner anchor. Resizes with the aspect ratio kept.
    Corner(Corner),
    /// Edge midpoint anchor. Resizes one axis.
    Edge(Edge),
    /// Rotation anchor above the top edge.
    Rotate,
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Position within a unit box, `(0, 0)` top-left to `(1, 1)` bottom-right.
    pub fn unit(self) -> (f64, f64) {
        match self {
            Corner::TopLeft => (0.0, 0.0),
            Corner::TopRight => (1.0, 0.0),
            Corner::BottomLeft => (0.0, 1.0),
            Corner::BottomRight => (1.0, 1.0),
        }
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub fn unit(self) -> (f64, f64) {
        match self {
            Edge::Top => (0.5, 0.0),
            Edge::Right => (1.0, 0.5),
            Edge::Bottom => (0.5, 1.0),
            Edge::Left => (0.0, 0.5),
        }
    }
}

/// A transformer handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in stage coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a stage-space point hits this handle.
    /// `tolerance` should already be divided by the viewport zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

const ANCHOR_ORDER: [HandleKind; 8] = [
    HandleKind::Corner(Corner::TopLeft),
    HandleKind::Edge(Edge::Top),
    HandleKind::Corner(Corner::TopRight),
    HandleKind::Edge(Edge::Right),
    HandleKind::Edge(Edge::Left),
    HandleKind::Corner(Corner::BottomLeft),
    HandleKind::Edge(Edge::Bottom),
    HandleKind::Corner(Corner::BottomRight),
];

/// Eight resize anchors plus the rotation anchor, rotated with the box.
pub fn transformer_handles(bounds: &BoundBox) -> Vec<Handle> {
    let to_stage = bounds.transform();
    let mut handles: Vec<Handle> = ANCHOR_ORDER
        .iter()
        .map(|&kind| {
            let (u, v) = match kind {
                HandleKind::Corner(c) => c.unit(),
                HandleKind::Edge(e) => e.unit(),
                HandleKind::Rotate => (0.5, 0.0),
            };
            let local = Point::new(u * bounds.width, v * bounds.height);
            Handle::new(to_stage * local, kind)
        })
        .collect();
    let rotater = Point::new(bounds.width / 2.0, -ROTATE_ANCHOR_OFFSET);
    handles.push(Handle::new(to_stage * rotater, HandleKind::Rotate));
    handles
}

/// Find which handle (if any) is hit at the given point.
/// The rotation anchor wins over overlapping resize anchors.
pub fn hit_test_handles(bounds: &BoundBox, point: Point, tolerance: f64) -> Option<HandleKind> {
    transformer_handles(bounds)
        .into_iter()
        .rev()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}
