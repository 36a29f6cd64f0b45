//! Labelled slider that sets an absolute value.

use egui::{RichText, Slider, Ui};
use std::ops::RangeInclusive;

use crate::theme;

/// A label with the current value above a full-width slider.
pub struct LabeledSlider<'a> {
    label: &'a str,
    value: &'a mut f64,
    range: RangeInclusive<f64>,
    step: f64,
    suffix: &'a str,
}

impl<'a> LabeledSlider<'a> {
    pub fn new(label: &'a str, value: &'a mut f64, range: RangeInclusive<f64>) -> Self {
        Self {
            label,
            value,
            range,
            step: 1.0,
            suffix: "",
        }
    }

    /// Snap to multiples of `step`.
    pub fn step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Unit shown after the value, e.g. `"°"`.
    pub fn suffix(mut self, suffix: &'a str) -> Self {
        self.suffix = suffix;
        self
    }

    /// Show the slider. Returns true when the user changed the value.
    pub fn show(self, ui: &mut Ui) -> bool {
        ui.horizontal(|ui| {
            ui.label(RichText::new(self.label).color(theme::TEXT));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    RichText::new(format!("{:.0}{}", *self.value, self.suffix))
                        .color(theme::TEXT_MUTED)
                        .monospace(),
                );
            });
        });

        let previous = ui.spacing().slider_width;
        ui.spacing_mut().slider_width = ui.available_width();
        let response = ui.add(
            Slider::new(self.value, self.range)
                .step_by(self.step)
                .show_value(false),
        );
        ui.spacing_mut().slider_width = previous;
        response.changed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slider_without_input_reports_no_change() {
        let ctx = egui::Context::default();
        let mut size = 50.0;
        let mut changed = true;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                changed = LabeledSlider::new("Size", &mut size, 10.0..=100.0).show(ui);
            });
        });
        assert!(!changed);
        assert_eq!(size, 50.0);
    }
}
