//! Application state and its reducer.
//!
//! [`AppState`] is never mutated in place. Each [`StageEvent`] produces a new
//! state that differs only in the fields the event names.

use crate::controls;
use crate::photo::Photo;
use crate::selection::{PointerTarget, Selection};
use crate::sticker::Sticker;
use crate::transform::TransformEnd;

/// Everything the widget knows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub photo: Option<Photo>,
    pub sticker: Sticker,
    pub selection: Selection,
}

/// A discrete UI event.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    /// A decode finished and won the request race.
    PhotoLoaded(Photo),
    /// A style button was clicked.
    GlyphSelected(String),
    /// The size slider moved.
    SizeChanged(f64),
    /// The rotation slider moved.
    RotationChanged(f64),
    /// A pointer went down on the stage.
    PointerDown(PointerTarget),
    /// A drag of the sticker ended at this absolute position.
    DragEnd { x: f64, y: f64 },
    /// A transformer gesture ended.
    TransformEnd(TransformEnd),
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    pub fn reduce(self, event: &StageEvent) -> Self {
        let Self {
            photo,
            mut sticker,
            selection,
        } = self;
        match event {
            StageEvent::PhotoLoaded(new_photo) => Self {
                photo: Some(new_photo.clone()),
                sticker,
                selection,
            },
            StageEvent::GlyphSelected(glyph) => {
                sticker.glyph = glyph.clone();
                Self { photo, sticker, selection }
            }
            StageEvent::SizeChanged(size) => {
                sticker.font_size = *size;
                Self { photo, sticker, selection }
            }
            StageEvent::RotationChanged(degrees) => {
                sticker.rotation_degrees = *degrees;
                Self { photo, sticker, selection }
            }
            StageEvent::PointerDown(target) => Self {
                photo,
                sticker,
                selection: selection.after_pointer_down(*target),
            },
            StageEvent::DragEnd { x, y } => {
                sticker.position = kurbo::Point::new(*x, *y);
                Self { photo, sticker, selection }
            }
            StageEvent::TransformEnd(end) => {
                sticker.font_size *= end.scale_x;
                sticker.position = kurbo::Point::new(end.x, end.y);
                sticker.rotation_degrees = end.rotation_degrees;
                Self { photo, sticker, selection }
            }
        }
    }

    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }

    /// Whether the download button is live.
    pub fn can_export(&self) -> bool {
        self.has_photo()
    }

    pub fn caption(&self) -> &'static str {
        controls::caption(self.has_photo())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{GLYPH_CHOICES, ROTATION_SLIDER, SIZE_SLIDER};
    use crate::selection::NodeId;
    use image::RgbaImage;
    use kurbo::Point;

    fn transform_end(scale_x: f64) -> StageEvent {
        StageEvent::TransformEnd(TransformEnd {
            scale_x,
            x: 160.0,
            y: 120.0,
            rotation_degrees: 0.0,
        })
    }

    #[test]
    fn test_photo_load_switches_caption() {
        let state = AppState::new();
        assert_eq!(state.caption(), "Upload a photo to get started");
        assert!(!state.can_export());

        let photo = Photo::from_rgba(RgbaImage::new(4, 4));
        let state = state.reduce(&StageEvent::PhotoLoaded(photo.clone()));
        assert_eq!(state.photo, Some(photo));
        assert_eq!(state.caption(), "Drag the glasses to position them on your photo");
        assert!(state.can_export());
    }

    #[test]
    fn test_new_photo_replaces_old() {
        let first = Photo::from_rgba(RgbaImage::new(4, 4));
        let second = Photo::from_rgba(RgbaImage::new(8, 8));
        let state = AppState::new()
            .reduce(&StageEvent::PhotoLoaded(first))
            .reduce(&StageEvent::PhotoLoaded(second.clone()));
        assert_eq!(state.photo, Some(second));
    }

    #[test]
    fn test_last_glyph_wins() {
        let clicks = [GLYPH_CHOICES[2], GLYPH_CHOICES[4], GLYPH_CHOICES[1], GLYPH_CHOICES[3]];
        let mut state = AppState::new();
        for glyph in clicks {
            state = state.reduce(&StageEvent::GlyphSelected(glyph.to_string()));
            assert_eq!(state.sticker.glyph, glyph);
        }
        assert_eq!(state.sticker.glyph, "🥽");
    }

    #[test]
    fn test_sliders_touch_only_their_field() {
        let before = AppState::new();
        let after = before.clone().reduce(&StageEvent::SizeChanged(SIZE_SLIDER.clamp(80.0)));
        assert_eq!(after.sticker.font_size, 80.0);
        assert_eq!(after.sticker.position, before.sticker.position);
        assert_eq!(after.sticker.rotation_degrees, before.sticker.rotation_degrees);
        assert_eq!(after.sticker.glyph, before.sticker.glyph);

        let after = after.reduce(&StageEvent::RotationChanged(ROTATION_SLIDER.clamp(45.0)));
        assert_eq!(after.sticker.rotation_degrees, 45.0);
        assert_eq!(after.sticker.font_size, 80.0);
    }

    #[test]
    fn test_slider_values_stay_in_range() {
        let mut state = AppState::new();
        for raw in [-50.0, 12.3, 99.9, 180.0, 720.0] {
            state = state
                .reduce(&StageEvent::SizeChanged(SIZE_SLIDER.clamp(raw)))
                .reduce(&StageEvent::RotationChanged(ROTATION_SLIDER.clamp(raw)));
            assert!((10.0..=100.0).contains(&state.sticker.font_size));
            assert!((0.0..=360.0).contains(&state.sticker.rotation_degrees));
        }
    }

    #[test]
    fn test_drag_end_writes_position_unclamped() {
        let state = AppState::new().reduce(&StageEvent::DragEnd { x: -40.0, y: 500.0 });
        assert_eq!(state.sticker.position, Point::new(-40.0, 500.0));
    }

    #[test]
    fn test_transform_end_folds_scale_into_font_size() {
        let state = AppState::new().reduce(&transform_end(1.5));
        assert!((state.sticker.font_size - 75.0).abs() < 1e-9);
        let state = state.reduce(&transform_end(2.0));
        assert!((state.sticker.font_size - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_unit_scale_transform_is_idempotent() {
        let mut state = AppState::new();
        for _ in 0..10 {
            state = state.reduce(&transform_end(1.0));
        }
        assert_eq!(state.sticker.font_size, 50.0);
    }

    #[test]
    fn test_selection_transitions() {
        let state = AppState::new();
        assert_eq!(state.selection.id(), None);
        let state = state.reduce(&StageEvent::PointerDown(PointerTarget::Node(NodeId::Sticker)));
        assert_eq!(state.selection.id(), Some(NodeId::Sticker));
        let state = state.reduce(&StageEvent::PointerDown(PointerTarget::Node(NodeId::Photo)));
        assert_eq!(state.selection.id(), Some(NodeId::Sticker));
        let state = state.reduce(&StageEvent::PointerDown(PointerTarget::Stage));
        assert_eq!(state.selection.id(), None);
    }
}
