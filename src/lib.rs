//! # ditherscape
//!
//! ```text
//!  ....                            ....
//!  ..      ##########                ..
//!          ##########  ####
//!     ############ ##  ####  ##
//!     ## ## ## ### ##  ####  ##
//!     ## ## ## ### ######## ###
//!     ############ ## ## ## ###
//!  ..                                ..
//! ```
//!
//! ## Procedural dither renderer
//!
//! `ditherscape` is a `no_std` compatible renderer for a small, decorative scene of boxes. Each
//! frame goes through the same fixed pipeline:
//!
//! - Scene composition ([`scene::compose_scene`]), which maps a handful of scalar parameters to
//!   a list of [`Cuboid`]s.
//! - Projection ([`Camera`]), which rotates by yaw and pitch and divides by a perspective term.
//! - Rasterization ([`Renderer`]), which fills box faces in a fixed order, with no depth test.
//! - Ordered dithering ([`dithering::BayerDither`]), which quantizes the grayscale result into a
//!   chunky 1-bit (or 3-tone) image.
//!
//! The look is intentionally low-fidelity. Occlusion between boxes is resolved purely by draw
//! order, and faces of the same box are drawn in canonical order, so overlapping geometry may
//! show through. That is part of the aesthetic.
//!
//! Continuous rendering is driven by [`extra::driver::FrameDriver`], which owns the orientation
//! state, the framebuffer and the deferred-resize logic.
//!
//! ## Example
//!
//! Please see [`demos/sample.rs`](demos/sample.rs) for a terminal host.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec::Vec;

use nalgebra as na;

pub mod color;
pub mod config;
pub mod dithering;
pub mod extra;
pub mod framebuffer;
pub mod scene;

use framebuffer::{FrameBuffer, Rgba};
use scene::Group;

pub type Vector2 = na::Vector2<f32>;
pub type Vector3 = na::Vector3<f32>;
pub type Vector4 = na::Vector4<f32>;
pub type Matrix3 = na::Matrix3<f32>;

/// Wraps an angle into `[0, 2π)`.
///
/// Orientation values keep growing over a long running animation. They are wrapped before being
/// fed to trigonometric functions so that precision does not degrade.
pub fn wrap_angle(angle: f32) -> f32 {
    use core::f32::consts::TAU;
    let r = angle % TAU;
    if r < 0.0 {
        r + TAU
    } else {
        r
    }
}

fn edge_function(a: Vector2, b: Vector2, c: Vector2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Computes bounding box
///
/// # Panics
///
/// If empty list is passed
fn bounding_box(v: &[Vector2]) -> (Vector2, Vector2) {
    let mut min = v[0];
    let mut max = v[0];

    for v in v {
        min.x = min.x.min(v.x);
        min.y = min.y.min(v.y);
        max.x = max.x.max(v.x);
        max.y = max.y.max(v.y);
    }

    (min, max)
}

/// Builds the 8 corners of an axis aligned box.
///
/// The box has horizontal half extent `half_size` on X and Z, and vertical half extent
/// `half_size * vertical_scale` on Y. Corner order matches [`CUBOID_FACES`].
pub fn build_box(center: Vector3, half_size: f32, vertical_scale: f32) -> [Vector3; 8] {
    let w = half_size;
    let h = half_size * vertical_scale;
    let (x, y, z) = (center.x, center.y, center.z);

    [
        Vector3::new(x - w, y - h, z - w),
        Vector3::new(x + w, y - h, z - w),
        Vector3::new(x + w, y + h, z - w),
        Vector3::new(x - w, y + h, z - w),
        Vector3::new(x - w, y - h, z + w),
        Vector3::new(x + w, y - h, z + w),
        Vector3::new(x + w, y + h, z + w),
        Vector3::new(x - w, y + h, z + w),
    ]
}

/// A quad face of a [`Cuboid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Indices into [`Cuboid::vertices`].
    pub indices: [usize; 4],
    /// Fixed lighting multiplier, modelling a single overhead light.
    pub light: f32,
}

/// Face table shared by all boxes, in draw order.
///
/// Front, right, back, left, top, bottom. The top face is brightest, the side faces dimmer.
pub const CUBOID_FACES: [Face; 6] = [
    Face {
        indices: [0, 1, 2, 3],
        light: 1.0,
    },
    Face {
        indices: [1, 5, 6, 2],
        light: 0.6,
    },
    Face {
        indices: [5, 4, 7, 6],
        light: 1.0,
    },
    Face {
        indices: [4, 0, 3, 7],
        light: 0.4,
    },
    Face {
        indices: [3, 2, 6, 7],
        light: 1.2,
    },
    Face {
        indices: [4, 5, 1, 0],
        light: 1.0,
    },
];

/// A box primitive, ready to be rendered.
///
/// Boxes are rebuilt by the scene composer every frame and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuboid {
    pub vertices: [Vector3; 8],
    /// Base brightness in the `[0; 1]` range, before face lighting is applied.
    pub brightness: f32,
    /// Layer the box belongs to, used for visibility filtering.
    pub group: Group,
}

impl Cuboid {
    pub fn new(
        center: Vector3,
        half_size: f32,
        vertical_scale: f32,
        brightness: f32,
        group: Group,
    ) -> Self {
        Self {
            vertices: build_box(center, half_size, vertical_scale),
            brightness,
            group,
        }
    }

    /// Gray level of a face, after lighting.
    pub fn face_level(&self, face: &Face) -> u8 {
        let shade = (self.brightness * face.light).clamp(0.0, 1.0);
        libm::floorf(shade * 255.0) as u8
    }
}

/// Background the framebuffer is cleared with.
///
/// Transparent backgrounds (`alpha == 0`) are left untouched by the ditherer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Background {
    pub level: u8,
    pub alpha: u8,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            level: 0,
            alpha: 255,
        }
    }
}

impl Background {
    pub fn pixel(&self) -> Rgba {
        Rgba {
            r: self.level,
            g: self.level,
            b: self.level,
            a: self.alpha,
        }
    }
}

/// A flat square grid drawn underneath the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridFloor {
    /// Height of the grid plane.
    pub y: f32,
    pub half_extent: f32,
    pub spacing: f32,
    pub level: u8,
}

impl Default for GridFloor {
    fn default() -> Self {
        Self {
            y: 100.0,
            half_extent: 200.0,
            spacing: 40.0,
            level: 51,
        }
    }
}

/// Point projected onto the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProjectedVertex {
    pub screen: Vector2,
    /// Rotated Z. Not used for depth testing.
    pub depth: f32,
}

/// Describes camera point of view.
///
/// The camera sits on the Z axis, looking at the origin. The scene is rotated about the vertical
/// axis by `yaw`, then about the horizontal axis by `pitch`, and finally divided by
/// `fov / (fov + z + offset)`. Y grows downwards on screen.
///
/// Continuous control of `yaw` and `pitch` is done through
/// [`extra::orientation::OrientationController`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Camera {
    pub fov: f32,
    pub offset: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov: 400.0,
            offset: 400.0,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl Camera {
    pub fn new(fov: f32, offset: f32) -> Self {
        Self {
            fov,
            offset,
            ..Default::default()
        }
    }

    /// Combined pitch * yaw rotation.
    pub fn rotation(&self) -> Matrix3 {
        let yaw = wrap_angle(self.yaw);
        let pitch = wrap_angle(self.pitch);
        let (sy, cy) = (libm::sinf(yaw), libm::cosf(yaw));
        let (sp, cp) = (libm::sinf(pitch), libm::cosf(pitch));

        let yaw_rot = na::matrix![
            cy, 0.0, -sy;
            0.0, 1.0, 0.0;
            sy, 0.0, cy
        ];
        let pitch_rot = na::matrix![
            1.0, 0.0, 0.0;
            0.0, cp, -sp;
            0.0, sp, cp
        ];

        pitch_rot * yaw_rot
    }

    /// Projects a point with a precomputed [`Camera::rotation`].
    ///
    /// When `fov + z + offset` approaches zero the scale diverges. The scene is small enough for
    /// that to never happen in practice, so it is not guarded.
    pub fn project_with(
        &self,
        rotation: &Matrix3,
        v: &Vector3,
        w: usize,
        h: usize,
    ) -> ProjectedVertex {
        let r = rotation * v;
        let scale = self.fov / (self.fov + r.z + self.offset);
        ProjectedVertex {
            screen: Vector2::new(
                r.x * scale + w as f32 / 2.0,
                r.y * scale + h as f32 / 2.0,
            ),
            depth: r.z,
        }
    }

    pub fn project(&self, v: &Vector3, w: usize, h: usize) -> ProjectedVertex {
        self.project_with(&self.rotation(), v, w, h)
    }
}

/// How box faces are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    #[default]
    Solid,
    /// Only face edges are drawn, using the face shade.
    Wireframe,
}

/// Per-pass rasterization options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasterOptions {
    pub fill: FillMode,
    /// Gray level of face outlines drawn on top of solid fills.
    pub outline: Option<u8>,
}

/// Counters of the last render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub boxes: usize,
    pub faces: usize,
    pub pixels: usize,
}

/// Immediate mode renderer.
///
/// The typical flow of each frame is as follows:
///
/// 1. Clear the framebuffer with [`Renderer::clear`].
/// 2. Optionally draw the floor with [`Renderer::draw_grid_floor`].
/// 3. Draw boxes with [`Renderer::render`].
/// 4. Dither the result with a [`dithering::Dithering`] implementation.
///
/// There is no depth buffer. Boxes are drawn in the given order, and faces of each box in
/// [`CUBOID_FACES`] order, so later faces always win.
#[derive(Default, Debug)]
pub struct Renderer {
    /// Projected corners of every box of the current pass.
    vertex_state: Vec<[ProjectedVertex; 8]>,
    stats: FrameStats,
}

impl Renderer {
    /// Clears the framebuffer with specified background.
    pub fn clear(&mut self, buf: &mut FrameBuffer, bg: &Background) {
        self.stats = FrameStats::default();
        buf.fill(bg.pixel());
    }

    /// Draws a grid of lines on the horizontal plane at `grid.y`.
    pub fn draw_grid_floor(&mut self, camera: &Camera, grid: &GridFloor, buf: &mut FrameBuffer) {
        let (w, h) = (buf.width(), buf.height());
        let rot = camera.rotation();
        let px = Rgba::gray(grid.level);
        let ext = grid.half_extent;

        if grid.spacing <= 0.0 {
            return;
        }

        let mut i = -ext;
        while i <= ext {
            let p1 = camera.project_with(&rot, &Vector3::new(i, grid.y, -ext), w, h);
            let p2 = camera.project_with(&rot, &Vector3::new(i, grid.y, ext), w, h);
            let p3 = camera.project_with(&rot, &Vector3::new(-ext, grid.y, i), w, h);
            let p4 = camera.project_with(&rot, &Vector3::new(ext, grid.y, i), w, h);
            self.stats.pixels += draw_line(buf, p1.screen, p2.screen, px);
            self.stats.pixels += draw_line(buf, p3.screen, p4.screen, px);
            i += grid.spacing;
        }
    }

    /// Draws boxes on screen.
    ///
    /// The buffer should be cleared first with [`Renderer::clear`].
    pub fn render(
        &mut self,
        camera: &Camera,
        boxes: &[Cuboid],
        opts: &RasterOptions,
        buf: &mut FrameBuffer,
    ) -> FrameStats {
        let (w, h) = (buf.width(), buf.height());
        let rot = camera.rotation();

        // First, project all corners. Sort of equivalent of vertex shading
        self.vertex_state.clear();
        self.vertex_state.extend(
            boxes
                .iter()
                .map(|b| b.vertices.map(|v| camera.project_with(&rot, &v, w, h))),
        );

        // Then, fill in draw order
        for (cuboid, projected) in boxes.iter().zip(self.vertex_state.iter()) {
            self.stats.boxes += 1;

            for face in CUBOID_FACES.iter() {
                self.stats.faces += 1;

                let level = cuboid.face_level(face);
                let quad = face.indices.map(|i| projected[i].screen);

                match opts.fill {
                    FillMode::Solid => {
                        self.stats.pixels += fill_quad(buf, quad, Rgba::gray(level));
                        if let Some(outline) = opts.outline {
                            self.stats.pixels += stroke_quad(buf, quad, Rgba::gray(outline));
                        }
                    }
                    FillMode::Wireframe => {
                        self.stats.pixels += stroke_quad(buf, quad, Rgba::gray(level));
                    }
                }
            }
        }

        self.stats
    }

    /// Renders boxes into a fresh framebuffer cleared to opaque black.
    pub fn rasterize(
        &mut self,
        camera: &Camera,
        boxes: &[Cuboid],
        w: usize,
        h: usize,
    ) -> FrameBuffer {
        let mut buf = FrameBuffer::new(w, h);
        self.clear(&mut buf, &Background::default());
        self.render(camera, boxes, &RasterOptions::default(), &mut buf);
        buf
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

fn finite(v: &Vector2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Fills a quad as a fan of 2 triangles. Returns the number of written pixels.
fn fill_quad(buf: &mut FrameBuffer, [a, b, c, d]: [Vector2; 4], px: Rgba) -> usize {
    fill_triangle(buf, [a, b, c], px) + fill_triangle(buf, [a, c, d], px)
}

fn fill_triangle(buf: &mut FrameBuffer, t: [Vector2; 3], px: Rgba) -> usize {
    if !t.iter().all(finite) {
        return 0;
    }

    let (bbmin, bbmax) = bounding_box(&t);

    let [a, mut b, mut c] = t;

    let mut area = edge_function(a, b, c);

    // Faces are drawn regardless of their winding
    if area < 0.0 {
        core::mem::swap(&mut b, &mut c);
        area = -area;
    }

    if area <= 0.0 {
        return 0;
    }

    let (w, h) = (buf.width(), buf.height());
    let mut written = 0;

    for y in (bbmin.y.max(0.) as usize)..(libm::ceilf(bbmax.y.min(h as _)) as usize) {
        for x in (bbmin.x.max(0.) as usize)..(libm::ceilf(bbmax.x.min(w as _)) as usize) {
            // Sample at pixel centers
            let p = Vector2::new(x as f32 + 0.5, y as f32 + 0.5);

            let wa = edge_function(b, c, p) / area;
            let wb = edge_function(c, a, p) / area;
            let wc = edge_function(a, b, p) / area;

            if wa >= 0.0 && wb >= 0.0 && wc >= 0.0 {
                buf.set(x, y, px);
                written += 1;
            }
        }
    }

    written
}

fn stroke_quad(buf: &mut FrameBuffer, q: [Vector2; 4], px: Rgba) -> usize {
    (0..4)
        .map(|i| draw_line(buf, q[i], q[(i + 1) % 4], px))
        .sum()
}

/// Lines with endpoints further out than this are dropped instead of being walked.
const MAX_LINE_COORD: f32 = 16384.0;

/// Draws a line, clipping pixels that fall outside the buffer.
fn draw_line(buf: &mut FrameBuffer, a: Vector2, b: Vector2, px: Rgba) -> usize {
    if ![a, b]
        .iter()
        .all(|v| finite(v) && libm::fabsf(v.x) < MAX_LINE_COORD && libm::fabsf(v.y) < MAX_LINE_COORD)
    {
        return 0;
    }

    let mut written = 0;

    plot_line(
        libm::floorf(a.x) as isize,
        libm::floorf(a.y) as isize,
        libm::floorf(b.x) as isize,
        libm::floorf(b.y) as isize,
        |x, y| {
            if buf.set_signed(x, y, px) {
                written += 1;
            }
        },
    );

    written
}

/// Bresenham line, walking all octants.
fn plot_line(
    mut x0: isize,
    mut y0: isize,
    x1: isize,
    y1: isize,
    mut plot: impl FnMut(isize, isize),
) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        plot(x0, y0);

        if x0 == x1 && y0 == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            err += dy;
            x0 += sx;
        }

        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn box_extents() {
        let v = build_box(Vector3::new(10.0, 20.0, 30.0), 5.0, 3.0);

        assert_eq!(v[0], Vector3::new(5.0, 5.0, 25.0));
        assert_eq!(v[6], Vector3::new(15.0, 35.0, 35.0));

        let (min_y, max_y) = v
            .iter()
            .fold((f32::MAX, f32::MIN), |(a, b), v| (a.min(v.y), b.max(v.y)));
        assert_relative_eq!(max_y - min_y, 30.0);
    }

    #[test]
    fn face_levels_are_clamped() {
        let c = Cuboid::new(Vector3::zeros(), 1.0, 1.0, 0.9, Group::Core);
        let levels = CUBOID_FACES.map(|f| c.face_level(&f));

        // 0.9 * 1.2 would be over 1
        assert_eq!(levels, [229, 137, 229, 91, 255, 229]);
    }

    #[test]
    fn identity_projection_centers_origin() {
        let cam = Camera::new(400.0, 400.0);
        let p = cam.project(&Vector3::zeros(), 400, 300);

        assert_relative_eq!(p.screen.x, 200.0);
        assert_relative_eq!(p.screen.y, 150.0);
        assert_relative_eq!(p.depth, 0.0);

        // At z = 0 the scale is fov / (fov + offset)
        let p = cam.project(&Vector3::new(100.0, 40.0, 0.0), 400, 300);
        assert_relative_eq!(p.screen.x, 250.0);
        assert_relative_eq!(p.screen.y, 170.0);
    }

    #[test]
    fn yaw_rotates_about_vertical_axis() {
        let cam = Camera {
            yaw: core::f32::consts::FRAC_PI_2,
            ..Camera::new(400.0, 400.0)
        };
        let r = cam.rotation() * Vector3::new(1.0, 2.0, 0.0);

        assert_relative_eq!(r.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(r.y, 2.0, epsilon = 1e-6);
        assert_relative_eq!(r.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn wrapped_angles_rotate_identically() {
        let a = Camera {
            yaw: 0.3,
            pitch: -1.1,
            ..Default::default()
        };
        let b = Camera {
            yaw: 0.3 + core::f32::consts::TAU * 3.0,
            pitch: -1.1 - core::f32::consts::TAU,
            ..Default::default()
        };

        assert_relative_eq!(a.rotation(), b.rotation(), epsilon = 1e-4);
        assert!(wrap_angle(-0.5) > 0.0);
    }

    #[test]
    fn fills_both_windings() {
        let mut buf = FrameBuffer::new(8, 8);
        let cw = [
            Vector2::new(0.0, 0.0),
            Vector2::new(4.0, 0.0),
            Vector2::new(4.0, 4.0),
            Vector2::new(0.0, 4.0),
        ];
        let mut ccw = cw;
        ccw.reverse();

        let count = |buf: &FrameBuffer, px: Rgba| buf.pixels().iter().filter(|p| **p == px).count();

        fill_quad(&mut buf, cw, Rgba::gray(10));
        assert_eq!(count(&buf, Rgba::gray(10)), 16);

        fill_quad(&mut buf, ccw, Rgba::gray(20));
        assert_eq!(count(&buf, Rgba::gray(20)), 16);
        assert_eq!(buf.get(3, 3), Some(Rgba::gray(20)));
        assert_eq!(buf.get(4, 4), Some(Rgba::default()));
    }

    #[test]
    fn degenerate_faces_are_skipped() {
        let mut buf = FrameBuffer::new(8, 8);
        let flat = [Vector2::new(1.0, 1.0); 4];
        assert_eq!(fill_quad(&mut buf, flat, Rgba::gray(255)), 0);

        let nan = [Vector2::new(f32::NAN, 1.0); 4];
        assert_eq!(fill_quad(&mut buf, nan, Rgba::gray(255)), 0);
    }

    #[test]
    fn lines_are_clipped() {
        let mut buf = FrameBuffer::new(4, 4);
        let n = draw_line(
            &mut buf,
            Vector2::new(-10.0, 1.0),
            Vector2::new(10.0, 1.0),
            Rgba::gray(51),
        );

        assert_eq!(n, 4);
        assert!((0..4).all(|x| buf.get(x, 1) == Some(Rgba::gray(51))));
        assert!((0..4).all(|x| buf.get(x, 0) == Some(Rgba::default())));
    }

    #[test]
    fn later_boxes_overdraw_earlier_ones() {
        let cam = Camera::new(400.0, 400.0);
        let dim = Cuboid::new(Vector3::zeros(), 20.0, 1.0, 0.2, Group::Core);
        let bright = Cuboid::new(Vector3::zeros(), 20.0, 1.0, 0.8, Group::Facade);

        let mut renderer = Renderer::default();
        let a = renderer.rasterize(&cam, &[dim, bright], 64, 64);
        let b = renderer.rasterize(&cam, &[bright], 64, 64);

        assert_eq!(a, b);
        assert_eq!(renderer.stats().boxes, 1);
        assert_eq!(renderer.stats().faces, 6);
    }

    #[test]
    fn wireframe_leaves_interior_clear() {
        let cam = Camera::new(400.0, 400.0);
        let c = Cuboid::new(Vector3::zeros(), 20.0, 1.0, 1.0, Group::Core);

        let mut buf = FrameBuffer::new(64, 64);
        let mut renderer = Renderer::default();
        renderer.clear(&mut buf, &Background::default());
        renderer.render(
            &cam,
            &[c],
            &RasterOptions {
                fill: FillMode::Wireframe,
                outline: None,
            },
            &mut buf,
        );

        assert_eq!(buf.get(32, 32), Some(Rgba::gray(0)));
        assert!(buf.pixels().iter().any(|p| p.r > 0));
    }
}
