//! Scene composition.
//!
//! Maps external parameters to an ordered list of [`Cuboid`]s. Order matters: it is the order
//! boxes are rasterized in, so later boxes draw over earlier ones.

use crate::{Cuboid, Vector3};
use alloc::vec::Vec;

/// Layer a box belongs to.
#[cfg_attr(
    all(not(target_os = "wasi"), feature = "wasm-bindgen"),
    wasm_bindgen::prelude::wasm_bindgen
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Group {
    /// Load bearing structure: towers, annexes.
    Core = 0,
    /// Everything wrapped around the core: shells, wings, satellites.
    Facade = 1,
}

/// Per-group visibility flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Visibility {
    pub core: bool,
    pub facade: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            core: true,
            facade: true,
        }
    }
}

impl Visibility {
    pub fn is_visible(&self, group: Group) -> bool {
        match group {
            Group::Core => self.core,
            Group::Facade => self.facade,
        }
    }

    pub fn set(&mut self, group: Group, visible: bool) {
        match group {
            Group::Core => self.core = visible,
            Group::Facade => self.facade = visible,
        }
    }
}

/// Discrete workflow phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Step {
    /// Nothing generated yet, the model is flat.
    Idle,
    /// Geometry is growing, fast spin.
    Generating,
    /// Abstract wireframe.
    Abstract,
    /// Layers can be toggled, solid rendering from here on.
    Layers,
    #[default]
    Complete,
}

impl Step {
    /// Maps an external step index. Everything past `Layers` is `Complete`.
    pub fn from_index(idx: u8) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Generating,
            2 => Self::Abstract,
            3 => Self::Layers,
            _ => Self::Complete,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Next step, wrapping back to `Idle` after `Complete`.
    pub fn next(self) -> Self {
        match self {
            Self::Complete => Self::Idle,
            s => Self::from_index(s.index() + 1),
        }
    }

    /// Steps before `Layers` are drawn as wireframes.
    pub fn is_wireframe(self) -> bool {
        self < Self::Layers
    }

    /// Autonomous spin speed, in turntable units (one unit is a turn per minute at 60 FPS).
    pub fn spin_speed(self) -> f32 {
        match self {
            Self::Generating => 10.0,
            _ => 2.0,
        }
    }
}

/// External inputs of the scene.
///
/// Not every layout reads every field. Out of range values are clamped by
/// [`SceneParameters::sanitized`] instead of being rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SceneParameters {
    /// Normalized complexity, `[0; 1]`.
    pub intensity: f32,
    /// Tower height, `[0; 100]`.
    pub height: f32,
    /// Urban density, `[0; 100]`.
    pub density: f32,
    pub step: Step,
    /// Whether an external generation job is running.
    pub generating: bool,
    pub visibility: Visibility,
}

impl Default for SceneParameters {
    fn default() -> Self {
        Self {
            intensity: 0.0,
            height: 50.0,
            density: 30.0,
            step: Step::Complete,
            generating: false,
            visibility: Visibility::default(),
        }
    }
}

fn clamp_or_zero(v: f32, max: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, max)
    }
}

impl SceneParameters {
    pub fn sanitized(self) -> Self {
        Self {
            intensity: clamp_or_zero(self.intensity, 1.0),
            height: clamp_or_zero(self.height, 100.0),
            density: clamp_or_zero(self.density, 100.0),
            ..self
        }
    }
}

/// Time varying inputs of the composer, owned by the frame driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    /// Seconds.
    pub time: f32,
    /// Frame counter.
    pub frame: usize,
    /// Vertical growth of the workflow tower, `[0; 1]`.
    pub growth: f32,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            time: 0.0,
            frame: 0,
            growth: 1.0,
        }
    }
}

/// How parameters are turned into boxes.
#[cfg_attr(
    all(not(target_os = "wasi"), feature = "wasm-bindgen"),
    wasm_bindgen::prelude::wasm_bindgen
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Layout {
    /// Single tower growing with `intensity`, satellites past 0.3 and 0.6.
    Hero = 0,
    /// Tower scaled by `height`, satellites past `density` 20, 50 and 80.
    Studio = 1,
    /// Core tower inside a facade shell, driven by `step`.
    Workflow = 2,
}

impl Default for Layout {
    fn default() -> Self {
        Self::Hero
    }
}

/// Composes the scene for the given parameters.
///
/// The output is fully determined by the inputs. Boxes of hidden groups are left out of the list
/// entirely.
pub fn compose_scene(layout: Layout, params: &SceneParameters, anim: &Animation) -> Vec<Cuboid> {
    let params = params.sanitized();

    let mut boxes = match layout {
        Layout::Hero => hero(&params, anim),
        Layout::Studio => studio(&params, anim),
        Layout::Workflow => workflow(&params, anim),
    };

    boxes.retain(|b| params.visibility.is_visible(b.group));

    boxes
}

fn hero(params: &SceneParameters, anim: &Animation) -> Vec<Cuboid> {
    let i = params.intensity;
    let building_height = 50.0 + i * 150.0;

    let mut boxes = alloc::vec![Cuboid::new(
        Vector3::zeros(),
        40.0,
        building_height / 40.0,
        0.8,
        Group::Core,
    )];

    if i > 0.3 {
        boxes.push(Cuboid::new(
            Vector3::new(60.0, 40.0, 0.0),
            20.0,
            1.0 + libm::sinf(anim.time) * 0.2,
            0.5,
            Group::Facade,
        ));
    }

    if i > 0.6 {
        boxes.push(Cuboid::new(
            Vector3::new(-50.0, 20.0, 50.0),
            25.0,
            2.0,
            0.6,
            Group::Facade,
        ));
        boxes.push(Cuboid::new(
            Vector3::new(-50.0, -50.0, -50.0),
            15.0,
            1.5,
            0.4,
            Group::Facade,
        ));
    }

    boxes
}

fn studio(params: &SceneParameters, anim: &Animation) -> Vec<Cuboid> {
    let d = params.density;
    let main_height = params.height / 100.0 * 3.0;

    let mut boxes = alloc::vec![Cuboid::new(
        Vector3::new(0.0, 50.0, 0.0),
        30.0,
        main_height,
        0.9,
        Group::Core,
    )];

    if d > 20.0 {
        boxes.push(Cuboid::new(
            Vector3::new(50.0, 80.0, 20.0),
            15.0,
            1.0,
            0.6,
            Group::Facade,
        ));
    }

    if d > 50.0 {
        boxes.push(Cuboid::new(
            Vector3::new(-40.0, 70.0, -40.0),
            20.0,
            1.5,
            0.7,
            Group::Facade,
        ));
    }

    if d > 80.0 {
        // Antenna on top of the tower
        boxes.push(Cuboid::new(
            Vector3::new(0.0, -main_height * 20.0, 0.0),
            10.0,
            2.0,
            0.95,
            Group::Core,
        ));
        boxes.push(Cuboid::new(
            Vector3::new(60.0, 90.0, -30.0),
            10.0,
            0.5,
            0.5,
            Group::Facade,
        ));
    }

    if params.generating {
        let mut idx = 0;
        boxes.retain(|_| {
            idx += 1;
            !flickered(anim.frame, idx)
        });
    }

    boxes
}

fn workflow(params: &SceneParameters, anim: &Animation) -> Vec<Cuboid> {
    let i = params.intensity;
    let growth = clamp_or_zero(anim.growth, 1.0);
    let half_height = (25.0 + i * 75.0) * growth;

    let mut boxes = alloc::vec![
        Cuboid::new(
            Vector3::zeros(),
            25.0,
            half_height / 25.0,
            0.85,
            Group::Core
        ),
        Cuboid::new(
            Vector3::zeros(),
            40.0,
            half_height / 40.0,
            0.5,
            Group::Facade
        ),
    ];

    if i > 0.3 {
        boxes.push(Cuboid::new(
            Vector3::new(60.0, 40.0, 0.0),
            20.0,
            growth,
            0.6,
            Group::Facade,
        ));
    }

    if i > 0.6 {
        boxes.push(Cuboid::new(
            Vector3::new(-55.0, 30.0, 40.0),
            20.0,
            1.5 * growth,
            0.7,
            Group::Core,
        ));
    }

    boxes
}

/// Xorshift generated noise, used to make boxes flicker out while generating.
const FLICKER_MASK: [u8; 256] = {
    let mut state = (0u8, 1u8, 1u8, 1u8);

    const fn xorshift((mut a, mut x, mut y, mut z): (u8, u8, u8, u8)) -> (u8, u8, u8, u8) {
        let t = x ^ (x << 4);
        x = y;
        y = z;
        z = a;
        a = z ^ t ^ (z >> 1) ^ (t << 1);
        (a, x, y, z)
    }

    // Skip the low entropy start
    state = xorshift(state);
    state = xorshift(state);
    state = xorshift(state);

    let mut arr = [0; 256];
    let mut i = 0;

    while i < 256 {
        state = xorshift(state);
        arr[i] = state.0;
        i += 1;
    }

    arr
};

fn flickered(frame: usize, idx: usize) -> bool {
    let i = frame.wrapping_add(1).wrapping_mul(idx) % 256;
    FLICKER_MASK[i] > 127
}
