//! Routing of window pointer events to the stage.
//!
//! Mouse and touch feed the same pointer path. Positions arrive in physical
//! window pixels and are mapped to stage units through the frame's
//! [`StageViewport`].

use glassesmaker_core::{Modifiers, PointerTarget, Stage, StageEvent, StageViewport};
use kurbo::Point;

/// Phase of a touch contact, independent of the windowing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// Pointer state carried between window events.
#[derive(Debug, Default)]
pub struct EventHandler {
    /// Last known pointer position in window pixels.
    cursor: Option<Point>,
    /// Primary button or first touch is down.
    pressed: bool,
    /// Touch contact driving the current gesture, if any.
    active_touch: Option<u64>,
    modifiers: Modifiers,
}

impl EventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_shift(&mut self, shift: bool) {
        self.modifiers.shift = shift;
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Pointer moved to `screen`. Returns true if the sticker changed.
    pub fn cursor_moved(&mut self, stage: &mut Stage, viewport: &StageViewport, screen: Point) -> bool {
        self.cursor = Some(screen);
        if !self.pressed {
            return false;
        }
        stage.pointer_move(viewport.screen_to_stage(screen), self.modifiers)
    }

    /// Primary button or touch went down at the last cursor position.
    pub fn press(&mut self, stage: &mut Stage, viewport: &StageViewport) -> Option<PointerTarget> {
        let screen = self.cursor?;
        self.pressed = true;
        let target = stage.pointer_down(viewport.screen_to_stage(screen));
        if let Some(target) = target {
            log::debug!("Pointer down on {:?}", target);
        }
        target
    }

    /// Primary button or touch released.
    pub fn release(&mut self, stage: &mut Stage) -> Option<StageEvent> {
        if !std::mem::take(&mut self.pressed) {
            return None;
        }
        stage.pointer_up()
    }

    /// Pointer left the window or the contact was lost.
    pub fn cancel(&mut self, stage: &mut Stage) {
        self.pressed = false;
        self.active_touch = None;
        stage.cancel_gesture();
    }

    /// A touch contact changed. Only the first contact drives the stage.
    /// Returns true if a redraw is needed.
    pub fn touch(
        &mut self,
        stage: &mut Stage,
        viewport: &StageViewport,
        id: u64,
        phase: TouchPhase,
        screen: Point,
    ) -> bool {
        match phase {
            TouchPhase::Started => {
                if self.active_touch.is_some() {
                    return false;
                }
                self.active_touch = Some(id);
                self.cursor = Some(screen);
                self.press(stage, viewport).is_some()
            }
            _ if self.active_touch != Some(id) => false,
            TouchPhase::Moved => self.cursor_moved(stage, viewport, screen),
            TouchPhase::Ended => {
                self.cursor = Some(screen);
                self.active_touch = None;
                self.release(stage);
                true
            }
            TouchPhase::Cancelled => {
                self.cancel(stage);
                true
            }
        }
    }
}
