use super::Ctx;
use crate::{wrap_angle, Camera, Vector2, Vector4};
use core::f32::consts::{PI, TAU};

/// Where yaw comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DriveMode {
    /// Both angles follow the pointer.
    #[default]
    Pointer,
    /// Yaw turns on its own, pitch follows the pointer.
    Spin,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrientationState {
    pub yaw: f32,
    pub pitch: f32,
    pub target_yaw: f32,
    pub target_pitch: f32,
}

/// Smoothed yaw/pitch controller.
///
/// Pointer positions set the target angles, and every tick moves the current angles a fixed
/// fraction of the way towards them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrientationController {
    state: OrientationState,
    pub smoothing: f32,
    pub mode: DriveMode,
    /// Yaw increment per tick in [`DriveMode::Spin`].
    pub spin_speed: f32,
}

impl Default for OrientationController {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.05, DriveMode::Pointer)
    }
}

/// Yaw turned per tick at spin speed 1.
pub const SPIN_UNIT: f32 = TAU / 3600.0;

impl OrientationController {
    pub fn new(yaw: f32, pitch: f32, smoothing: f32, mode: DriveMode) -> Self {
        Self {
            state: OrientationState {
                yaw,
                pitch,
                target_yaw: yaw,
                target_pitch: pitch,
            },
            smoothing,
            mode,
            spin_speed: 2.0,
        }
    }

    /// Sets the targets from a pointer position inside `rect` (`x, y, w, h`).
    ///
    /// The horizontal position maps to a full turn of yaw, the vertical one to `[-π/2; π/2]` of
    /// pitch. Degenerate rectangles are ignored.
    pub fn pointer_move(&mut self, pointer: Vector2, rect: Vector4) {
        if !(rect.z > 0.0 && rect.w > 0.0) {
            return;
        }

        let nx = (pointer.x - rect.x) / rect.z;
        let ny = (pointer.y - rect.y) / rect.w;

        if !(nx.is_finite() && ny.is_finite()) {
            return;
        }

        if self.mode == DriveMode::Pointer {
            self.state.target_yaw = nx * TAU;
        }
        self.state.target_pitch = ny * PI - PI / 2.0;
    }

    /// Feeds pointer input of the frame.
    pub fn update(&mut self, ctx: &Ctx) {
        if !ctx.focused {
            return;
        }

        if let Some(pointer) = ctx.input.pointer.interact_pos {
            self.pointer_move(pointer, ctx.input.screen_rect);
        }
    }

    /// Advances the smoothing by one frame.
    pub fn tick(&mut self) {
        let s = &mut self.state;
        let a = self.smoothing;

        s.pitch += (s.target_pitch - s.pitch) * a;

        match self.mode {
            DriveMode::Pointer => {
                s.yaw += (s.target_yaw - s.yaw) * a;
            }
            DriveMode::Spin => {
                s.yaw = wrap_angle(s.yaw + SPIN_UNIT * self.spin_speed);
                s.target_yaw = s.yaw;
            }
        }
    }

    pub fn state(&self) -> OrientationState {
        self.state
    }

    /// Copies current angles into the camera.
    pub fn apply(&self, camera: &mut Camera) {
        camera.yaw = self.state.yaw;
        camera.pitch = self.state.pitch;
    }
}
