//! Defines dithering trait and implementations.

use crate::framebuffer::{FrameBuffer, Rgba};

/// Classic 4x4 Bayer threshold matrix, values `0..16`.
pub const BAYER_4X4: [[u8; 4]; 4] = [
    [0, 8, 2, 10],
    [12, 4, 14, 6],
    [3, 11, 1, 9],
    [15, 7, 13, 5],
];

/// Output levels of the ditherer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DitherTones {
    /// Pure 1-bit output, `0` or `255`.
    #[default]
    Two,
    /// `0`, `mid` or `255`.
    ///
    /// Values above the threshold go to `255`, values above a third of the threshold to `mid`.
    Three { mid: u8 },
}

impl DitherTones {
    /// Quantizes a value against a threshold.
    ///
    /// Comparison is strict: a value equal to its threshold lands on the lower side.
    pub fn quantize(&self, value: u8, threshold: f32) -> u8 {
        let value = value as f32;

        match *self {
            Self::Two => {
                if value > threshold {
                    255
                } else {
                    0
                }
            }
            Self::Three { mid } => {
                if value > threshold {
                    255
                } else if value > threshold / 3.0 {
                    mid
                } else {
                    0
                }
            }
        }
    }

    /// Whether `level` is one of the outputs of this configuration.
    pub fn is_output(&self, level: u8) -> bool {
        match *self {
            Self::Two => level == 0 || level == 255,
            Self::Three { mid } => level == 0 || level == mid || level == 255,
        }
    }
}

/// Ordered (Bayer) ditherer.
///
/// The filter visits every second row and column. Each visited sample is compared against
/// `matrix[y % 4][x % 4] / 16 * 255`, using its red channel as luminance, and the result is
/// written to the 2x2 block starting at the sample. This halves the effective resolution once
/// more, for a chunky look.
///
/// Pixels with zero alpha are never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BayerDither {
    matrix: [[u8; 4]; 4],
    tones: DitherTones,
}

impl Default for BayerDither {
    fn default() -> Self {
        Self::new(DitherTones::Two)
    }
}

impl BayerDither {
    pub fn new(tones: DitherTones) -> Self {
        Self::with_matrix(BAYER_4X4, tones)
    }

    pub fn with_matrix(matrix: [[u8; 4]; 4], tones: DitherTones) -> Self {
        Self { matrix, tones }
    }

    pub fn tones(&self) -> DitherTones {
        self.tones
    }

    pub fn threshold(&self, x: usize, y: usize) -> f32 {
        self.matrix[y % 4][x % 4] as f32 / 16.0 * 255.0
    }
}

impl Dithering for BayerDither {
    fn dither(&self, buf: &mut FrameBuffer) {
        let (w, h) = buf.dims();

        for y in (0..h).step_by(2) {
            for x in (0..w).step_by(2) {
                let Some(sample) = buf.get(x, y) else {
                    continue;
                };

                let level = self.tones.quantize(sample.r, self.threshold(x, y));

                for (bx, by) in [(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)] {
                    match buf.get(bx, by) {
                        Some(px) if px.a != 0 => buf.set(bx, by, Rgba::gray(level)),
                        _ => (),
                    }
                }
            }
        }
    }
}

/// Image space post-processing filter.
///
/// In limited color outputs, direct nearest color conversion leads to excessive banding.
/// Dithering hides the limits of the output space by nudging rounding one way or the other
/// depending on pixel position, giving an illusion of intermediate tones.
pub trait Dithering {
    /// Quantizes the buffer in place.
    fn dither(&self, buf: &mut FrameBuffer);
}

impl Dithering for () {
    fn dither(&self, _: &mut FrameBuffer) {}
}
