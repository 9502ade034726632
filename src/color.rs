//! Color related types and functions.
//!
//! The renderer itself is strictly grayscale. Hosts may colorize the output by mapping each gray
//! level through a [`Tint`].

use colorsys::{Hsl, Rgb};

/// Maps gray levels onto a single HSL hue.
///
/// Units follow `colorsys`: hue in degrees, saturation and lightness in percent. The gray level
/// scales the tint color, so black stays black and `255` gives the full tint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tint {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl Default for Tint {
    fn default() -> Self {
        Self::mono()
    }
}

impl Tint {
    /// Neutral tint, output equals input.
    pub const fn mono() -> Self {
        Self {
            hue: 0.0,
            saturation: 0.0,
            lightness: 100.0,
        }
    }

    pub const fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    /// Colorizes a gray level.
    pub fn apply(&self, level: u8) -> [u8; 3] {
        let rgb = Rgb::from(&Hsl::new(
            self.hue,
            self.saturation,
            self.lightness,
            None,
        ));
        let k = level as f64 / 255.0;
        let ch = |v: f64| libm::round(v * k).clamp(0.0, 255.0) as u8;

        [ch(rgb.red()), ch(rgb.green()), ch(rgb.blue())]
    }
}

#[cfg(feature = "crossterm")]
pub use term::*;

#[cfg(feature = "crossterm")]
mod term {
    use crossterm::style::Color;

    /// Color capabilities of the terminal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum CrosstermColorMode {
        /// 4 shades of the basic palette, tint is ignored.
        Gray,
        Ansi256,
        #[default]
        Rgb,
    }

    /// Converts an RGB triplet into a terminal color.
    pub fn term_color([r, g, b]: [u8; 3], mode: CrosstermColorMode) -> Color {
        match mode {
            CrosstermColorMode::Gray => {
                let v = r.max(g).max(b);
                match v {
                    0 => Color::Black,
                    1..=128 => Color::DarkGrey,
                    129..=200 => Color::Grey,
                    _ => Color::White,
                }
            }
            CrosstermColorMode::Ansi256 => {
                let ansi = colorsys::Ansi256::from(colorsys::Rgb::from([r, g, b]));
                Color::AnsiValue(ansi.code())
            }
            CrosstermColorMode::Rgb => Color::Rgb { r, g, b },
        }
    }
}
