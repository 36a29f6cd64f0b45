//! UI components using egui.

use egui::{Align2, Context, Id, Pos2, Rect, Vec2, include_image};
use glassesmaker_core::{AppState, GLYPH_CHOICES, ROTATION_SLIDER, SIZE_SLIDER, SliderRange};
use glassesmaker_widgets::{
    ActionButton, GlyphButton, LabeledSlider, caption, card_frame, heading, section_label,
    separator, subtitle,
};

/// Gap between the control card and the window edge, in points.
const PANEL_MARGIN: f32 = 16.0;
/// Width of the control card, in points.
const PANEL_WIDTH: f32 = 280.0;

/// Actions that can be triggered from the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// Open the platform file picker.
    UploadPhoto,
    /// Switch the sticker glyph.
    SelectGlyph(String),
    /// Set the sticker font size.
    SetSize(f64),
    /// Set the sticker rotation in degrees.
    SetRotation(f64),
    /// Export the stage as a PNG.
    Download,
}

/// Layout state shared between the UI and the stage placement.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Screen rect of the control card from the last frame, in points.
    pub panel_rect: Option<Rect>,
    /// Screen rect of the stage from the last frame, in points.
    pub stage_rect: Option<Rect>,
    /// An upload is waiting on its decode.
    pub loading: bool,
}

impl UiState {
    /// Area left for the stage: the window minus the control card.
    pub fn stage_area(&self, screen: Rect) -> Rect {
        match self.panel_rect {
            Some(panel) if panel.max.x + PANEL_MARGIN < screen.max.x => Rect::from_min_max(
                Pos2::new(panel.max.x + PANEL_MARGIN, screen.min.y),
                screen.max,
            ),
            _ => screen,
        }
    }
}

/// Render all UI and return any triggered action.
pub fn render_ui(ctx: &Context, ui_state: &mut UiState, state: &AppState) -> Option<UiAction> {
    egui_extras::install_image_loaders(ctx);

    let panel_action = render_control_panel(ctx, ui_state, state);
    render_caption(ctx, ui_state, state);
    panel_action
}

/// Current value for a slider, clamped into its range for display.
fn slider_value(range: &SliderRange, value: f64) -> f64 {
    range.clamp(value)
}

fn render_control_panel(ctx: &Context, ui_state: &mut UiState, state: &AppState) -> Option<UiAction> {
    let mut action = None;

    let response = egui::Area::new(Id::new("controls"))
        .anchor(Align2::LEFT_TOP, Vec2::new(PANEL_MARGIN, PANEL_MARGIN))
        .show(ctx, |ui| {
            card_frame().show(ui, |ui| {
                ui.set_width(PANEL_WIDTH);
                ui.vertical(|ui| {
                    heading(ui, "Custom Glasses Maker");
                    subtitle(ui, "Upload your photo and add glasses.");
                    separator(ui);

                    let upload_label = if ui_state.loading { "Loading..." } else { "Upload Photo" };
                    if ActionButton::new(upload_label)
                        .icon(include_image!("../assets/upload.svg"))
                        .show(ui)
                    {
                        action = Some(UiAction::UploadPhoto);
                    }
                    ui.add_space(8.0);

                    section_label(ui, "Choose Glasses Style:");
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing = Vec2::new(6.0, 0.0);
                        for glyph in GLYPH_CHOICES {
                            if GlyphButton::new(glyph, state.sticker.glyph == glyph).show(ui) {
                                action = Some(UiAction::SelectGlyph(glyph.to_string()));
                            }
                        }
                    });
                    ui.add_space(8.0);

                    section_label(ui, "Size:");
                    let mut size = slider_value(&SIZE_SLIDER, state.sticker.font_size);
                    if LabeledSlider::new("Font size", &mut size, SIZE_SLIDER.min..=SIZE_SLIDER.max)
                        .step(SIZE_SLIDER.step)
                        .suffix("px")
                        .show(ui)
                    {
                        action = Some(UiAction::SetSize(SIZE_SLIDER.clamp(size)));
                    }
                    ui.add_space(8.0);

                    section_label(ui, "Rotation:");
                    let mut rotation = slider_value(&ROTATION_SLIDER, state.sticker.rotation_degrees);
                    if LabeledSlider::new(
                        "Angle",
                        &mut rotation,
                        ROTATION_SLIDER.min..=ROTATION_SLIDER.max,
                    )
                    .step(ROTATION_SLIDER.step)
                    .suffix("°")
                    .show(ui)
                    {
                        action = Some(UiAction::SetRotation(ROTATION_SLIDER.clamp(rotation)));
                    }
                    separator(ui);

                    if ActionButton::new("Download Image")
                        .icon(include_image!("../assets/download.svg"))
                        .enabled(state.can_export())
                        .show(ui)
                    {
                        action = Some(UiAction::Download);
                    }
                });
            });
        });

    ui_state.panel_rect = Some(response.response.rect);
    action
}

/// Helper text centered under the stage.
fn render_caption(ctx: &Context, ui_state: &UiState, state: &AppState) {
    let Some(stage) = ui_state.stage_rect else {
        return;
    };
    egui::Area::new(Id::new("caption"))
        .pivot(Align2::CENTER_TOP)
        .fixed_pos(Pos2::new(stage.center().x, stage.max.y + 12.0))
        .interactable(false)
        .show(ctx, |ui| caption(ui, state.caption()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_frame(ui_state: &mut UiState, state: &AppState) -> Option<UiAction> {
        let ctx = Context::default();
        let mut action = None;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            action = render_ui(ctx, ui_state, state);
        });
        action
    }

    #[test]
    fn test_idle_frame_has_no_action() {
        let mut ui_state = UiState::default();
        assert_eq!(run_frame(&mut ui_state, &AppState::default()), None);
        assert!(ui_state.panel_rect.is_some());
    }

    #[test]
    fn test_stage_area_excludes_panel() {
        let screen = Rect::from_min_size(Pos2::ZERO, Vec2::new(1000.0, 600.0));
        let ui_state = UiState {
            panel_rect: Some(Rect::from_min_max(Pos2::new(16.0, 16.0), Pos2::new(300.0, 500.0))),
            ..Default::default()
        };
        let area = ui_state.stage_area(screen);
        assert_eq!(area.min, Pos2::new(316.0, 0.0));
        assert_eq!(area.max, screen.max);
    }

    #[test]
    fn test_stage_area_without_panel_is_screen() {
        let screen = Rect::from_min_size(Pos2::ZERO, Vec2::new(200.0, 200.0));
        assert_eq!(UiState::default().stage_area(screen), screen);
    }

    #[test]
    fn test_slider_value_is_clamped_for_display() {
        assert_eq!(slider_value(&SIZE_SLIDER, 250.0), 100.0);
        assert_eq!(slider_value(&SIZE_SLIDER, 4.0), 10.0);
        assert_eq!(slider_value(&ROTATION_SLIDER, 45.0), 45.0);
    }
}
