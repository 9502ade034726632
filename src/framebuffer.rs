//! RGBA framebuffer the pipeline renders into.

use alloc::vec::Vec;

/// A single RGBA sample.
///
/// The scene is strictly grayscale, so `r == g == b` for everything the renderer writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// Opaque gray sample.
    pub const fn gray(level: u8) -> Self {
        Self {
            r: level,
            g: level,
            b: level,
            a: 255,
        }
    }

    pub fn to_u32(self) -> u32 {
        let Self { r, g, b, a } = self;
        u32::from_le_bytes([r, g, b, a])
    }

    pub fn from_u32(val: u32) -> Self {
        let [r, g, b, a] = val.to_le_bytes();
        Self { r, g, b, a }
    }
}

/// Row-major grid of [`Rgba`] samples.
///
/// Out of bounds reads return `None`, out of bounds writes are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: alloc::vec![Rgba::TRANSPARENT; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgba> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn set(&mut self, x: usize, y: usize, px: Rgba) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = px;
        }
    }

    /// Like [`FrameBuffer::set`], but accepts negative coordinates. Returns whether the pixel
    /// landed inside the buffer.
    pub fn set_signed(&mut self, x: isize, y: isize, px: Rgba) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        match self.index(x as usize, y as usize) {
            Some(i) => {
                self.pixels[i] = px;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, px: Rgba) {
        self.pixels.fill(px);
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.pixels
    }

    /// Rows of the buffer, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Rgba]> {
        // chunks panics on 0
        self.pixels.chunks(self.width.max(1))
    }

    /// Reallocates the buffer with new dimensions. Contents are reset to transparent.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, Rgba::TRANSPARENT);
    }

    /// Frees the pixel storage.
    pub fn release(&mut self) {
        self.width = 0;
        self.height = 0;
        self.pixels = Vec::new();
    }

    /// Flattens the buffer into `[r, g, b, a, r, g, b, a, ...]`, the layout canvas image data
    /// expects.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        self.write_rgba_bytes(&mut out);
        out
    }

    pub fn write_rgba_bytes(&self, out: &mut Vec<u8>) {
        out.clear();
        out.extend(self.pixels.iter().flat_map(|p| [p.r, p.g, p.b, p.a]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_access() {
        let mut buf = FrameBuffer::new(3, 2);

        buf.set(3, 0, Rgba::gray(1));
        assert!(!buf.set_signed(-1, 0, Rgba::gray(1)));
        assert!(buf.set_signed(2, 1, Rgba::gray(7)));

        assert_eq!(buf.get(3, 0), None);
        assert_eq!(buf.get(2, 1), Some(Rgba::gray(7)));
        assert_eq!(buf.pixels().iter().filter(|p| p.a != 0).count(), 1);
    }

    #[test]
    fn byte_layout() {
        let mut buf = FrameBuffer::new(2, 1);
        buf.set(1, 0, Rgba::gray(200));

        assert_eq!(buf.to_rgba_bytes(), [0, 0, 0, 0, 200, 200, 200, 255]);
        assert_eq!(Rgba::from_u32(Rgba::gray(9).to_u32()), Rgba::gray(9));
    }

    #[test]
    fn release_frees_storage() {
        let mut buf = FrameBuffer::new(16, 16);
        buf.release();

        assert!(buf.is_empty());
        assert_eq!(buf.dims(), (0, 0));
        assert_eq!(buf.rows().count(), 0);

        buf.resize(4, 2);
        assert_eq!(buf.rows().count(), 2);
    }
}
