//! Layout helpers: card frame, headings, captions, separators.

use egui::{Color32, CornerRadius, Frame, Margin, RichText, Stroke, Ui};

use crate::{sizing, theme};

/// Draw a horizontal separator line.
pub fn separator(ui: &mut Ui) {
    let rect = ui.available_rect_before_wrap();
    let y = rect.top() + 4.0;
    ui.painter().line_segment(
        [
            egui::Pos2::new(rect.left(), y),
            egui::Pos2::new(rect.right(), y),
        ],
        Stroke::new(1.0, theme::BORDER.gamma_multiply(0.5)),
    );
    ui.add_space(8.0);
}

/// Draw a section label (small, muted text).
pub fn section_label(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).size(12.0).color(theme::TEXT_MUTED));
}

/// Page title.
pub fn heading(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).size(26.0).strong().color(theme::TEXT));
}

pub fn subtitle(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).size(14.0).color(theme::TEXT_MUTED));
}

/// Helper caption under the stage.
pub fn caption(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).size(12.0).italics().color(theme::TEXT_MUTED));
}

/// Card frame with shadow.
pub fn card_frame() -> Frame {
    Frame::new()
        .fill(theme::CARD_BG)
        .corner_radius(CornerRadius::same(sizing::PANEL_RADIUS))
        .stroke(Stroke::new(1.0, theme::BORDER.gamma_multiply(0.3)))
        .shadow(egui::epaint::Shadow {
            spread: 0,
            blur: 16,
            offset: [0, 4],
            color: Color32::from_black_alpha(40),
        })
        .inner_margin(Margin::same(16))
}
