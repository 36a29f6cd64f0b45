//! Reusable egui widget components with Tailwind-inspired styling.
//!
//! - **Buttons**: glyph toggle buttons, action buttons with icon and disabled state
//! - **Colors**: Tailwind pink scale
//! - **Layout**: card frame, headings, captions, separators
//! - **Slider**: labelled absolute-value slider

pub mod buttons;
pub mod colors;
pub mod layout;
pub mod slider;

pub use buttons::{ActionButton, GlyphButton};
pub use colors::{PINK, TailwindColor};
pub use layout::{caption, card_frame, heading, section_label, separator, subtitle};
pub use slider::LabeledSlider;

/// Standard sizing constants used across widgets.
pub mod sizing {
    /// Glyph button size
    pub const GLYPH: f32 = 44.0;
    /// Action button height
    pub const ACTION_HEIGHT: f32 = 36.0;
    /// Standard corner radius
    pub const CORNER_RADIUS: u8 = 6;
    /// Card corner radius
    pub const PANEL_RADIUS: u8 = 12;
}

/// Standard colors used across widgets.
pub mod theme {
    use crate::colors::PINK;
    use egui::Color32;

    /// Page background (pink-600)
    pub const PAGE_BG: Color32 = PINK.shade(6);
    /// Empty stage (pink-400)
    pub const STAGE_BG: Color32 = PINK.shade(4);
    /// Card background (pink-700)
    pub const CARD_BG: Color32 = PINK.shade(7);
    /// Button background (pink-500)
    pub const BUTTON_BG: Color32 = PINK.shade(5);
    /// Hover and selected background (pink-400)
    pub const ACCENT: Color32 = PINK.shade(4);
    /// Text on pink
    pub const TEXT: Color32 = Color32::WHITE;
    /// Secondary text on pink (pink-100)
    pub const TEXT_MUTED: Color32 = PINK.shade(1);
    /// Disabled control background
    pub const DISABLED_BG: Color32 = Color32::from_rgba_premultiplied(120, 60, 90, 160);
    /// Border color (pink-300)
    pub const BORDER: Color32 = PINK.shade(3);
}
