//! Side panel control definitions.

/// Glyphs offered by the style buttons, in display order.
pub const GLYPH_CHOICES: [&str; 5] = ["😎", "🕶️", "👓", "🥽", "🤓"];

/// Caption shown under the stage once a photo is loaded.
pub const CAPTION_WITH_PHOTO: &str = "Drag the glasses to position them on your photo";
/// Caption shown before any photo is loaded.
pub const CAPTION_WITHOUT_PHOTO: &str = "Upload a photo to get started";

/// Helper caption for the current photo state.
pub fn caption(has_photo: bool) -> &'static str {
    if has_photo {
        CAPTION_WITH_PHOTO
    } else {
        CAPTION_WITHOUT_PHOTO
    }
}

/// An absolute-set slider: range, step and initial value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl SliderRange {
    /// Snap to the step grid and clamp into range, the way the control does
    /// before it emits a change event.
    pub fn clamp(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.default;
        }
        let snapped = if self.step > 0.0 {
            self.min + ((value - self.min) / self.step).round() * self.step
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Sticker font size.
pub const SIZE_SLIDER: SliderRange = SliderRange {
    min: 10.0,
    max: 100.0,
    step: 1.0,
    default: 50.0,
};

/// Sticker rotation in degrees.
pub const ROTATION_SLIDER: SliderRange = SliderRange {
    min: 0.0,
    max: 360.0,
    step: 1.0,
    default: 0.0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_range() {
        assert_eq!(SIZE_SLIDER.clamp(5.0), 10.0);
        assert_eq!(SIZE_SLIDER.clamp(250.0), 100.0);
        assert_eq!(ROTATION_SLIDER.clamp(-30.0), 0.0);
        assert_eq!(ROTATION_SLIDER.clamp(400.0), 360.0);
    }

    #[test]
    fn test_clamp_snaps_to_step() {
        assert_eq!(SIZE_SLIDER.clamp(79.6), 80.0);
        assert_eq!(ROTATION_SLIDER.clamp(44.4), 44.0);
        assert_eq!(SIZE_SLIDER.clamp(f64::NAN), 50.0);
    }

    #[test]
    fn test_any_input_lands_in_range() {
        for raw in [-1e9, -1.0, 0.0, 9.99, 10.0, 55.5, 100.0, 100.4, 1e9] {
            assert!(SIZE_SLIDER.contains(SIZE_SLIDER.clamp(raw)));
            assert!(ROTATION_SLIDER.contains(ROTATION_SLIDER.clamp(raw)));
        }
    }

    #[test]
    fn test_caption() {
        assert_eq!(caption(false), "Upload a photo to get started");
        assert_eq!(caption(true), "Drag the glasses to position them on your photo");
    }

    #[test]
    fn test_defaults_match_initial_sticker() {
        let sticker = crate::sticker::Sticker::default();
        assert_eq!(SIZE_SLIDER.default, sticker.font_size);
        assert_eq!(ROTATION_SLIDER.default, sticker.rotation_degrees);
        assert_eq!(GLYPH_CHOICES[0], sticker.glyph);
    }
}
