//! Tailwind color scale.

use egui::Color32;

/// A Tailwind color with all shade variants (50-950).
#[derive(Clone, Copy)]
pub struct TailwindColor {
    /// Shades from 50 to 950 (11 total)
    pub shades: [Color32; 11],
}

impl TailwindColor {
    /// Build a scale from RGB tuples, lightest first.
    pub const fn new(rgb: [(u8, u8, u8); 11]) -> Self {
        let mut shades = [Color32::BLACK; 11];
        let mut i = 0;
        while i < 11 {
            shades[i] = Color32::from_rgb(rgb[i].0, rgb[i].1, rgb[i].2);
            i += 1;
        }
        Self { shades }
    }

    /// Get shade by index (0=50, 1=100, ..., 5=500, ..., 10=950)
    pub const fn shade(&self, index: usize) -> Color32 {
        self.shades[index]
    }
}

// https://tailwindcss.com/docs/colors
pub const PINK: TailwindColor = TailwindColor::new([
    (253, 242, 248), (252, 231, 243), (251, 207, 232), (249, 168, 212),
    (244, 114, 182), (236, 72, 153), (219, 39, 119), (190, 24, 93),
    (157, 23, 77), (131, 24, 67), (80, 7, 36),
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pink_shades() {
        assert_eq!(PINK.shade(6), Color32::from_rgb(219, 39, 119));
        assert_eq!(PINK.shade(4).to_array(), [244, 114, 182, 255]);
    }
}
