//! Button components: glyph toggles and action buttons.

use egui::{
    Align2, Color32, CornerRadius, CursorIcon, FontId, Image, ImageSource, Rect, Sense, Stroke,
    StrokeKind, Ui, Vec2, vec2,
};

use crate::{sizing, theme};

/// A square toggle button showing a single glyph.
/// Filled with the accent color when selected.
pub struct GlyphButton<'a> {
    glyph: &'a str,
    selected: bool,
}

impl<'a> GlyphButton<'a> {
    /// Create a new glyph button.
    pub fn new(glyph: &'a str, selected: bool) -> Self {
        Self { glyph, selected }
    }

    /// Show the button and return true if clicked.
    pub fn show(self, ui: &mut Ui) -> bool {
        let (rect, response) = ui.allocate_exact_size(vec2(sizing::GLYPH, sizing::GLYPH), Sense::click());

        if ui.is_rect_visible(rect) {
            let bg_color = if self.selected || response.hovered() {
                theme::ACCENT
            } else {
                theme::BUTTON_BG
            };
            ui.painter()
                .rect_filled(rect, CornerRadius::same(sizing::CORNER_RADIUS), bg_color);
            if self.selected {
                ui.painter().rect_stroke(
                    rect,
                    CornerRadius::same(sizing::CORNER_RADIUS),
                    Stroke::new(2.0, Color32::WHITE),
                    StrokeKind::Inside,
                );
            }
            ui.painter().text(
                rect.center(),
                Align2::CENTER_CENTER,
                self.glyph,
                FontId::proportional(sizing::GLYPH * 0.55),
                Color32::WHITE,
            );
        }

        let clicked = response.clicked();
        response.on_hover_cursor(CursorIcon::PointingHand);
        clicked
    }
}

/// A full-width button with an icon and a label that can be disabled.
pub struct ActionButton<'a> {
    icon: Option<ImageSource<'a>>,
    label: &'a str,
    enabled: bool,
    height: f32,
}

impl<'a> ActionButton<'a> {
    /// Create a new action button.
    pub fn new(label: &'a str) -> Self {
        Self {
            icon: None,
            label,
            enabled: true,
            height: sizing::ACTION_HEIGHT,
        }
    }

    /// Show an icon left of the label.
    pub fn icon(mut self, icon: ImageSource<'a>) -> Self {
        self.icon = Some(icon);
        self
    }

    /// Set whether the button reacts to clicks.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Show the button and return true if clicked while enabled.
    pub fn show(self, ui: &mut Ui) -> bool {
        let sense = if self.enabled { Sense::click() } else { Sense::hover() };
        let (rect, response) = ui.allocate_exact_size(vec2(ui.available_width(), self.height), sense);

        if ui.is_rect_visible(rect) {
            let bg_color = if !self.enabled {
                theme::DISABLED_BG
            } else if response.hovered() {
                theme::ACCENT
            } else {
                theme::BUTTON_BG
            };
            let text_color = if self.enabled {
                theme::TEXT
            } else {
                theme::TEXT.gamma_multiply(0.5)
            };
            ui.painter()
                .rect_filled(rect, CornerRadius::same(sizing::CORNER_RADIUS), bg_color);

            let font_id = FontId::proportional(14.0);
            let galley = ui
                .painter()
                .layout_no_wrap(self.label.to_string(), font_id.clone(), text_color);
            let icon_size = Vec2::splat(18.0);
            let gap = 8.0;
            let content_width = galley.size().x + if self.icon.is_some() { icon_size.x + gap } else { 0.0 };
            let mut x = rect.center().x - content_width / 2.0;

            if let Some(icon) = self.icon {
                let icon_rect = Rect::from_min_size(
                    egui::pos2(x, rect.center().y - icon_size.y / 2.0),
                    icon_size,
                );
                Image::new(icon)
                    .fit_to_exact_size(icon_size)
                    .tint(text_color)
                    .paint_at(ui, icon_rect);
                x += icon_size.x + gap;
            }

            ui.painter().text(
                egui::pos2(x, rect.center().y),
                Align2::LEFT_CENTER,
                self.label,
                font_id,
                text_color,
            );
        }

        if self.enabled {
            let clicked = response.clicked();
            response.on_hover_cursor(CursorIcon::PointingHand);
            clicked
        } else {
            response.on_hover_cursor(CursorIcon::NotAllowed);
            false
        }
    }
}
