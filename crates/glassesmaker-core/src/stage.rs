//! Runtime stage: state, the live sticker node and pointer gestures.
//!
//! The stage owns the [`AppState`] and feeds every change through
//! [`AppState::reduce`]. Between events the sticker node mirrors the state;
//! during a drag or transformer gesture the node runs ahead and the state
//! catches up when the gesture ends.

use crate::input::Modifiers;
use crate::loader::{ImageLoader, LoadError, LoadTicket};
use crate::photo::Photo;
use crate::scene::SceneGraph;
use crate::selection::{HANDLE_HIT_TOLERANCE, NodeId, PointerTarget, hit_test_handles};
use crate::state::{AppState, StageEvent};
use crate::sticker::{GlyphExtent, StickerNode};
use crate::transform::{BoundBox, DragGesture, Gesture, TransformGesture, end_transform};
use crate::viewport::STAGE_SIZE;
use kurbo::{Point, Rect};

/// The interactive 320×320 canvas.
#[derive(Debug)]
pub struct Stage {
    state: AppState,
    node: StickerNode,
    gesture: Option<Gesture>,
    overlay_visible: bool,
    loader: ImageLoader,
    extent: GlyphExtent,
    handle_tolerance: f64,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    pub fn new() -> Self {
        let state = AppState::new();
        let node = StickerNode::from(&state.sticker);
        Self {
            state,
            node,
            gesture: None,
            overlay_visible: true,
            loader: ImageLoader::new(),
            extent: GlyphExtent::default(),
            handle_tolerance: HANDLE_HIT_TOLERANCE,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The sticker as currently drawn, including any in-progress gesture.
    pub fn node(&self) -> &StickerNode {
        &self.node
    }

    pub fn glyph_extent(&self) -> GlyphExtent {
        self.extent
    }

    /// Update the measured glyph size. Ignored mid-gesture so the box does
    /// not jump under the pointer.
    pub fn set_glyph_extent(&mut self, extent: GlyphExtent) {
        if self.gesture.is_none() {
            self.extent = extent;
        }
    }

    /// Set the anchor hit tolerance in stage units.
    pub fn set_handle_tolerance(&mut self, tolerance: f64) {
        if tolerance > 0.0 {
            self.handle_tolerance = tolerance;
        }
    }

    pub fn is_overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    /// Show or hide the transformer overlay. Returns the previous visibility.
    pub fn set_overlay_visible(&mut self, visible: bool) -> bool {
        std::mem::replace(&mut self.overlay_visible, visible)
    }

    pub fn has_gesture(&self) -> bool {
        self.gesture.is_some()
    }

    /// Run one event through the reducer.
    pub fn dispatch(&mut self, event: StageEvent) {
        log::debug!("Stage event: {:?}", EventName(&event));
        let state = std::mem::take(&mut self.state);
        self.state = state.reduce(&event);
        if self.gesture.is_none() {
            self.node = StickerNode::from(&self.state.sticker);
        }
    }

    /// Start decoding a new upload. Earlier uploads still in flight go stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.loader.begin()
    }

    /// Settle an upload. Returns true if it replaced the photo.
    pub fn complete_load(&mut self, ticket: LoadTicket, result: Result<Photo, LoadError>) -> bool {
        match self.loader.complete(ticket, result) {
            Some(photo) => {
                self.dispatch(StageEvent::PhotoLoaded(photo));
                true
            }
            None => false,
        }
    }

    /// Whether a load is waiting on its decode.
    pub fn is_loading(&self) -> bool {
        self.loader.is_pending()
    }

    fn transformer_box(&self) -> Option<BoundBox> {
        (self.state.selection.is_sticker_selected() && self.overlay_visible)
            .then(|| BoundBox::from_node(&self.node, self.extent))
    }

    /// What a stage-space point lands on, front to back. `None` when the
    /// point is off the stage.
    pub fn hit_test(&self, point: Point) -> Option<PointerTarget> {
        if !Rect::from_origin_size(Point::ZERO, STAGE_SIZE).contains(point) {
            return None;
        }
        let handle = self
            .transformer_box()
            .and_then(|bounds| hit_test_handles(&bounds, point, self.handle_tolerance));
        if let Some(kind) = handle {
            return Some(PointerTarget::Handle(kind));
        }
        if self.node.contains(point, self.extent) {
            return Some(PointerTarget::Node(NodeId::Sticker));
        }
        if self.state.photo.is_some() {
            Some(PointerTarget::Node(NodeId::Photo))
        } else {
            Some(PointerTarget::Stage)
        }
    }

    /// Mouse down or touch start.
    ///
    /// A gesture still in progress is finished first, as if released.
    pub fn pointer_down(&mut self, point: Point) -> Option<PointerTarget> {
        if self.gesture.is_some() {
            log::debug!("Pointer down during a gesture, settling it first");
            self.pointer_up();
        }
        let target = self.hit_test(point)?;
        self.dispatch(StageEvent::PointerDown(target));
        self.gesture = match target {
            PointerTarget::Handle(kind) => {
                log::debug!("Transform started on {:?}", kind);
                Some(Gesture::Transform(TransformGesture::begin(kind, &self.node, self.extent)))
            }
            PointerTarget::Node(NodeId::Sticker) if self.node.draggable => {
                Some(Gesture::Drag(DragGesture::begin(&self.node, point)))
            }
            _ => None,
        };
        Some(target)
    }

    /// Pointer motion. Returns true if the node changed.
    pub fn pointer_move(&mut self, point: Point, modifiers: Modifiers) -> bool {
        match &mut self.gesture {
            Some(Gesture::Drag(drag)) => {
                let before = self.node.position;
                drag.update(&mut self.node, point);
                self.node.position != before
            }
            Some(Gesture::Transform(transform)) => {
                let before = transform.current();
                let after = transform.update(point, modifiers);
                transform.apply_to(&mut self.node);
                before != after
            }
            None => false,
        }
    }

    /// Mouse up or touch end. Emits the end-of-gesture event, if any.
    pub fn pointer_up(&mut self) -> Option<StageEvent> {
        let event = match self.gesture.take()? {
            Gesture::Drag(drag) if drag.moved() => Some(StageEvent::DragEnd {
                x: self.node.position.x,
                y: self.node.position.y,
            }),
            Gesture::Drag(_) => None,
            Gesture::Transform(_) => Some(StageEvent::TransformEnd(end_transform(&mut self.node))),
        };
        if let Some(event) = &event {
            self.dispatch(event.clone());
        }
        event
    }

    /// Abandon an in-progress gesture and snap the node back to the state.
    pub fn cancel_gesture(&mut self) {
        if self.gesture.take().is_some() {
            self.node = StickerNode::from(&self.state.sticker);
        }
    }

    /// Project the current state and live node onto a scene.
    pub fn scene(&self) -> SceneGraph {
        SceneGraph::project(
            self.state.photo.as_ref(),
            &self.node,
            self.extent,
            self.state.selection.is_sticker_selected(),
            self.overlay_visible,
        )
    }
}

/// Event summary for logs, without dumping photo pixels.
struct EventName<'a>(&'a StageEvent);

impl std::fmt::Debug for EventName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            StageEvent::PhotoLoaded(photo) => write!(f, "PhotoLoaded({})", photo.id()),
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{Corner, HandleKind};
    use image::RgbaImage;

    fn with_photo() -> Stage {
        let mut stage = Stage::new();
        let ticket = stage.begin_load();
        assert!(stage.complete_load(ticket, Ok(Photo::from_rgba(RgbaImage::new(400, 300)))));
        stage
    }

    #[test]
    fn test_click_sticker_selects_without_moving() {
        let mut stage = Stage::new();
        assert_eq!(
            stage.pointer_down(Point::new(170.0, 130.0)),
            Some(PointerTarget::Node(NodeId::Sticker))
        );
        assert!(stage.state().selection.is_sticker_selected());
        assert_eq!(stage.pointer_up(), None);
        assert_eq!(stage.state().sticker.position, Point::new(160.0, 120.0));
    }

    #[test]
    fn test_click_empty_stage_deselects() {
        let mut stage = Stage::new();
        stage.pointer_down(Point::new(170.0, 130.0));
        stage.pointer_up();
        assert_eq!(stage.pointer_down(Point::new(10.0, 10.0)), Some(PointerTarget::Stage));
        assert!(!stage.state().selection.is_sticker_selected());
    }

    #[test]
    fn test_click_on_photo_keeps_selection() {
        let mut stage = with_photo();
        stage.pointer_down(Point::new(170.0, 130.0));
        stage.pointer_up();
        assert_eq!(
            stage.pointer_down(Point::new(10.0, 10.0)),
            Some(PointerTarget::Node(NodeId::Photo))
        );
        assert!(stage.state().selection.is_sticker_selected());
    }

    #[test]
    fn test_off_stage_is_ignored() {
        let mut stage = Stage::new();
        stage.pointer_down(Point::new(170.0, 130.0));
        stage.pointer_up();
        assert_eq!(stage.pointer_down(Point::new(400.0, 10.0)), None);
        assert!(stage.state().selection.is_sticker_selected());
    }

    #[test]
    fn test_drag_updates_state_on_release() {
        let mut stage = Stage::new();
        stage.pointer_down(Point::new(170.0, 130.0));
        assert!(stage.pointer_move(Point::new(60.0, 60.0), Modifiers::default()));
        // State lags the node until the drag ends.
        assert_eq!(stage.state().sticker.position, Point::new(160.0, 120.0));
        assert_eq!(stage.node().position, Point::new(50.0, 50.0));

        assert_eq!(stage.pointer_up(), Some(StageEvent::DragEnd { x: 50.0, y: 50.0 }));
        assert_eq!(stage.state().sticker.position, Point::new(50.0, 50.0));
    }

    #[test]
    fn test_resize_folds_into_font_size() {
        let mut stage = Stage::new();
        stage.pointer_down(Point::new(170.0, 130.0));
        stage.pointer_up();

        let target = stage.pointer_down(Point::new(210.0, 170.0));
        assert_eq!(target, Some(PointerTarget::Handle(HandleKind::Corner(Corner::BottomRight))));
        stage.pointer_move(Point::new(235.0, 195.0), Modifiers::default());
        assert!((stage.node().scale.x - 1.5).abs() < 1e-9);
        assert_eq!(stage.state().sticker.font_size, 50.0);

        stage.pointer_up();
        assert!((stage.state().sticker.font_size - 75.0).abs() < 1e-9);
        assert!(stage.node().is_unit_scale());
        assert!((stage.node().font_size - 75.0).abs() < 1e-9);
        assert!(stage.state().selection.is_sticker_selected());
    }

    #[test]
    fn test_repeated_resizes_do_not_compound() {
        let mut stage = Stage::new();
        stage.pointer_down(Point::new(170.0, 130.0));
        stage.pointer_up();

        // Grow 50 -> 100, then pull the new corner back by half.
        stage.pointer_down(Point::new(210.0, 170.0));
        stage.pointer_move(Point::new(260.0, 220.0), Modifiers::default());
        stage.pointer_up();
        assert!((stage.state().sticker.font_size - 100.0).abs() < 1e-9);

        stage.pointer_down(Point::new(260.0, 220.0));
        stage.pointer_move(Point::new(210.0, 170.0), Modifiers::default());
        stage.pointer_up();
        assert!((stage.state().sticker.font_size - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_press_during_resize_settles_it() {
        let mut stage = Stage::new();
        stage.pointer_down(Point::new(170.0, 130.0));
        stage.pointer_up();

        stage.pointer_down(Point::new(210.0, 170.0));
        stage.pointer_move(Point::new(260.0, 220.0), Modifiers::default());
        // Second press with no release in between.
        assert_eq!(
            stage.pointer_down(Point::new(170.0, 130.0)),
            Some(PointerTarget::Node(NodeId::Sticker))
        );
        assert!((stage.state().sticker.font_size - 100.0).abs() < 1e-9);
        assert!(stage.node().is_unit_scale());

        stage.pointer_move(Point::new(171.0, 131.0), Modifiers::default());
        assert_eq!(stage.pointer_up(), Some(StageEvent::DragEnd { x: 161.0, y: 121.0 }));
        assert!((stage.state().sticker.font_size - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_noop_resize_is_idempotent() {
        let mut stage = Stage::new();
        stage.pointer_down(Point::new(170.0, 130.0));
        stage.pointer_up();
        for _ in 0..5 {
            stage.pointer_down(Point::new(210.0, 170.0));
            stage.pointer_up();
        }
        assert_eq!(stage.state().sticker.font_size, 50.0);
        assert!(stage.node().is_unit_scale());
    }

    #[test]
    fn test_live_resize_clamp() {
        let mut stage = Stage::new();
        stage.pointer_down(Point::new(170.0, 130.0));
        stage.pointer_up();
        stage.pointer_down(Point::new(210.0, 145.0));
        stage.pointer_move(Point::new(190.0, 145.0), Modifiers::default());
        let valid = stage.scene().transformer().map(|t| t.bounds);
        // Width 5 is rejected; the drawn box keeps its last valid size.
        assert!(!stage.pointer_move(Point::new(165.0, 145.0), Modifiers::default()));
        assert_eq!(stage.scene().transformer().map(|t| t.bounds), valid);
    }

    #[test]
    fn test_rotate_handle() {
        let mut stage = Stage::new();
        stage.pointer_down(Point::new(170.0, 130.0));
        stage.pointer_up();
        assert_eq!(
            stage.pointer_down(Point::new(185.0, 70.0)),
            Some(PointerTarget::Handle(HandleKind::Rotate))
        );
        stage.pointer_move(Point::new(265.0, 145.0), Modifiers::default());
        stage.pointer_up();
        let sticker = &stage.state().sticker;
        assert!((sticker.rotation_degrees - 90.0).abs() < 1e-9);
        assert_eq!(sticker.font_size, 50.0);
    }

    #[test]
    fn test_dispatch_resyncs_node() {
        let mut stage = Stage::new();
        stage.dispatch(StageEvent::SizeChanged(80.0));
        stage.dispatch(StageEvent::GlyphSelected("🤓".to_string()));
        assert_eq!(stage.node().font_size, 80.0);
        assert_eq!(stage.node().glyph, "🤓");
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut stage = Stage::new();
        let first = stage.begin_load();
        let second = stage.begin_load();
        assert!(stage.is_loading());
        assert!(!stage.complete_load(first, Ok(Photo::from_rgba(RgbaImage::new(2, 2)))));
        assert!(stage.state().photo.is_none());
        assert!(stage.complete_load(second, Ok(Photo::from_rgba(RgbaImage::new(3, 3)))));
        assert_eq!(stage.state().photo.as_ref().map(Photo::width), Some(3));
    }

    #[test]
    fn test_failed_load_leaves_no_photo() {
        let mut stage = Stage::new();
        let ticket = stage.begin_load();
        assert!(!stage.complete_load(ticket, crate::loader::decode_photo(b"junk")));
        assert!(stage.state().photo.is_none());
        assert_eq!(stage.state().caption(), "Upload a photo to get started");
    }
}
