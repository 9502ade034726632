//! Continuous rendering driver.
//!
//! [`FrameDriver`] bundles everything a host needs to animate one renderer instance: the
//! configuration, orientation smoothing, the framebuffer and its lifecycle. The host only calls
//! [`FrameDriver::tick`] once per display frame and presents the returned buffer.

use super::orientation::{OrientationController, OrientationState};
use super::Ctx;
use crate::config::VariantConfig;
use crate::dithering::{BayerDither, Dithering};
use crate::framebuffer::FrameBuffer;
use crate::scene::{compose_scene, Animation, Layout, SceneParameters, Step};
use crate::{Camera, FillMode, FrameStats, RasterOptions, Renderer, Vector2, Vector4};

/// Size of the display surface, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schedule {
    Idle,
    Running { frames: usize },
    TornDown,
}

pub struct FrameDriver {
    config: VariantConfig,
    renderer: Renderer,
    camera: Camera,
    orientation: OrientationController,
    dither: BayerDither,
    params: SceneParameters,
    surface: SurfaceSize,
    pending_surface: Option<SurfaceSize>,
    frame: FrameBuffer,
    schedule: Schedule,
    growth: f32,
    last_elapsed: Option<f32>,
    last_box_count: Option<usize>,
}

impl FrameDriver {
    pub fn new(config: VariantConfig) -> Self {
        let config = config.sanitized();

        let mut camera = config.camera.camera();
        let orientation = OrientationController::new(
            config.initial_yaw,
            config.initial_pitch,
            config.smoothing,
            config.drive,
        );
        orientation.apply(&mut camera);

        Self {
            config,
            renderer: Renderer::default(),
            camera,
            orientation,
            dither: BayerDither::new(config.tones),
            params: SceneParameters::default(),
            surface: SurfaceSize::default(),
            pending_surface: None,
            frame: FrameBuffer::default(),
            schedule: Schedule::Idle,
            growth: 1.0,
            last_elapsed: None,
            last_box_count: None,
        }
    }

    /// Starts producing frames. A torn down driver stays torn down.
    pub fn start(&mut self) {
        match self.schedule {
            Schedule::Idle => {
                log::info!("starting {:?} renderer", self.config.layout);
                self.schedule = Schedule::Running { frames: 0 };
            }
            Schedule::Running { .. } => (),
            Schedule::TornDown => log::warn!("start called on a torn down renderer"),
        }
    }

    /// Stops frame production and frees the framebuffer. Further ticks produce nothing.
    pub fn teardown(&mut self) {
        if self.schedule == Schedule::TornDown {
            return;
        }

        let frames = match self.schedule {
            Schedule::Running { frames } => frames,
            _ => 0,
        };
        log::info!(
            "tearing down {:?} renderer after {frames} frames",
            self.config.layout
        );

        self.schedule = Schedule::TornDown;
        self.pending_surface = None;
        self.frame.release();
    }

    pub fn is_running(&self) -> bool {
        matches!(self.schedule, Schedule::Running { .. })
    }

    /// Schedules a resize of the display surface.
    ///
    /// The framebuffer is reallocated at the start of the next tick, never in the middle of one.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.schedule != Schedule::TornDown {
            self.pending_surface = Some(SurfaceSize { width, height });
        }
    }

    /// Pointer moved over the surface. `rect` is `x, y, w, h` of the surface.
    pub fn pointer_move(&mut self, pointer: Vector2, rect: Vector4) {
        self.orientation.pointer_move(pointer, rect);
    }

    /// Feeds a frame of host pointer input.
    ///
    /// Resizes are not taken from `ctx`, since the surface unit is up to the host. Use
    /// [`FrameDriver::resize`].
    pub fn update(&mut self, ctx: &Ctx) {
        self.orientation.update(ctx);
    }

    pub fn set_params(&mut self, params: SceneParameters) {
        self.params = params.sanitized();
    }

    pub fn params(&self) -> SceneParameters {
        self.params
    }

    pub fn config(&self) -> &VariantConfig {
        &self.config
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn orientation(&self) -> OrientationState {
        self.orientation.state()
    }

    pub fn stats(&self) -> FrameStats {
        self.renderer.stats()
    }

    /// Last produced frame.
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    fn apply_pending_resize(&mut self) {
        let Some(surface) = self.pending_surface.take() else {
            return;
        };

        let ds = self.config.downscale;
        let (w, h) = (surface.width / ds, surface.height / ds);

        log::debug!(
            "resizing surface {}x{} -> framebuffer {w}x{h}",
            surface.width,
            surface.height
        );

        self.surface = surface;
        self.frame.resize(w as usize, h as usize);
    }

    fn advance_growth(&mut self, dt: f32) {
        self.growth = match self.params.step {
            Step::Idle => 0.0,
            Step::Generating => {
                let t = (dt * 2.0).clamp(0.0, 1.0);
                self.growth + (1.0 - self.growth) * t
            }
            _ => 1.0,
        };
    }

    /// Produces the next frame. `elapsed` is the host clock, in seconds.
    ///
    /// Returns `None` when the driver is not running.
    pub fn tick(&mut self, elapsed: f32) -> Option<&FrameBuffer> {
        let Schedule::Running { frames } = self.schedule else {
            return None;
        };

        let dt = self
            .last_elapsed
            .map(|last| (elapsed - last).max(0.0))
            .unwrap_or(0.0);
        self.last_elapsed = Some(elapsed);

        self.apply_pending_resize();
        self.advance_growth(dt);

        self.orientation.spin_speed = self.params.step.spin_speed();
        self.orientation.tick();
        self.orientation.apply(&mut self.camera);

        let anim = Animation {
            time: elapsed,
            frame: frames,
            growth: self.growth,
        };
        let boxes = compose_scene(self.config.layout, &self.params, &anim);

        if self.last_box_count != Some(boxes.len()) {
            log::debug!("scene now has {} boxes", boxes.len());
            self.last_box_count = Some(boxes.len());
        }

        let fill = if self.config.layout == Layout::Workflow && self.params.step.is_wireframe() {
            FillMode::Wireframe
        } else {
            FillMode::Solid
        };
        let opts = RasterOptions {
            fill,
            outline: self.config.outline,
        };

        self.renderer.clear(&mut self.frame, &self.config.background);
        if let Some(grid) = &self.config.grid_floor {
            self.renderer
                .draw_grid_floor(&self.camera, grid, &mut self.frame);
        }
        let stats = self
            .renderer
            .render(&self.camera, &boxes, &opts, &mut self.frame);
        self.dither.dither(&mut self.frame);

        log::trace!("frame {frames}: {stats:?}");

        self.schedule = Schedule::Running { frames: frames + 1 };

        Some(&self.frame)
    }
}
