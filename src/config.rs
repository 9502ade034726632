//! Per-variant renderer configuration.
//!
//! Three presets are provided, one per [`Layout`]. Hosts may also load a configuration from JSON,
//! in which case missing fields fall back to the hero preset.

use crate::dithering::DitherTones;
use crate::extra::orientation::DriveMode;
use crate::scene::Layout;
use crate::{Background, Camera, GridFloor};

/// Camera intrinsics of a variant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraProperties {
    pub fov: f32,
    pub offset: f32,
}

impl CameraProperties {
    pub fn camera(&self) -> Camera {
        Camera::new(self.fov, self.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VariantConfig {
    pub layout: Layout,
    pub camera: CameraProperties,
    /// Orientation smoothing factor, in `(0; 1]`. Larger values converge faster.
    pub smoothing: f32,
    pub initial_pitch: f32,
    pub initial_yaw: f32,
    pub drive: DriveMode,
    pub tones: DitherTones,
    pub background: Background,
    pub grid_floor: Option<GridFloor>,
    /// Gray level of face outlines, if any.
    pub outline: Option<u8>,
    /// Display surface to framebuffer size ratio.
    pub downscale: u32,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self::hero()
    }
}

impl VariantConfig {
    /// Pointer driven single tower on black.
    pub fn hero() -> Self {
        Self {
            layout: Layout::Hero,
            camera: CameraProperties {
                fov: 400.0,
                offset: 400.0,
            },
            smoothing: 0.05,
            initial_pitch: 0.5,
            initial_yaw: 0.8,
            drive: DriveMode::Pointer,
            tones: DitherTones::Two,
            background: Background::default(),
            grid_floor: None,
            outline: None,
            downscale: 2,
        }
    }

    /// Pointer driven, 3-tone, with floor grid and black outlines on a dark gray background.
    pub fn studio() -> Self {
        Self {
            layout: Layout::Studio,
            camera: CameraProperties {
                fov: 500.0,
                offset: 500.0,
            },
            smoothing: 0.1,
            initial_pitch: 0.6,
            initial_yaw: 0.6,
            drive: DriveMode::Pointer,
            tones: DitherTones::Three { mid: 128 },
            background: Background {
                level: 17,
                alpha: 255,
            },
            grid_floor: Some(GridFloor::default()),
            outline: Some(0),
            downscale: 2,
        }
    }

    /// Self spinning tower on a transparent background.
    pub fn workflow() -> Self {
        Self {
            layout: Layout::Workflow,
            drive: DriveMode::Spin,
            background: Background { level: 0, alpha: 0 },
            ..Self::hero()
        }
    }

    pub fn for_layout(layout: Layout) -> Self {
        match layout {
            Layout::Hero => Self::hero(),
            Layout::Studio => Self::studio(),
            Layout::Workflow => Self::workflow(),
        }
    }

    /// Clamps values that would otherwise stall or break the pipeline.
    pub fn sanitized(self) -> Self {
        let smoothing = if self.smoothing.is_finite() && self.smoothing > 0.0 {
            self.smoothing.min(1.0)
        } else {
            Self::hero().smoothing
        };

        Self {
            smoothing,
            downscale: self.downscale.max(1),
            ..self
        }
    }
}

#[cfg(all(feature = "std", feature = "serde_json"))]
mod io {
    use super::VariantConfig;
    use std::path::Path;

    /// Configuration errors
    #[derive(thiserror::Error, Debug)]
    pub enum ConfigError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Parse error: {0}")]
        Json(#[from] serde_json::Error),
    }

    impl VariantConfig {
        pub fn from_json(s: &str) -> Result<Self, ConfigError> {
            let cfg: Self = serde_json::from_str(s)?;
            Ok(cfg.sanitized())
        }

        pub fn to_json(&self) -> Result<String, ConfigError> {
            Ok(serde_json::to_string_pretty(self)?)
        }

        /// Loads a configuration file.
        pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
            let path = path.as_ref();
            let contents = std::fs::read_to_string(path)?;
            let cfg = Self::from_json(&contents)?;
            log::debug!("loaded {:?} config from {}", cfg.layout, path.display());
            Ok(cfg)
        }
    }
}

#[cfg(all(feature = "std", feature = "serde_json"))]
pub use io::ConfigError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_layouts() {
        for layout in [Layout::Hero, Layout::Studio, Layout::Workflow] {
            assert_eq!(VariantConfig::for_layout(layout).layout, layout);
        }

        let workflow = VariantConfig::workflow();
        assert_eq!(workflow.drive, DriveMode::Spin);
        assert_eq!(workflow.background.alpha, 0);
        assert_eq!(VariantConfig::studio().tones, DitherTones::Three { mid: 128 });
    }

    #[test]
    fn sanitize_bad_values() {
        let cfg = VariantConfig {
            smoothing: 0.0,
            downscale: 0,
            ..Default::default()
        }
        .sanitized();

        assert!(cfg.smoothing > 0.0);
        assert_eq!(cfg.downscale, 1);

        let cfg = VariantConfig {
            smoothing: 4.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(cfg.smoothing, 1.0);
    }

    #[cfg(all(feature = "std", feature = "serde_json"))]
    #[test]
    fn json_roundtrip_and_defaults() {
        let studio = VariantConfig::studio();
        let json = studio.to_json().unwrap();
        assert_eq!(VariantConfig::from_json(&json).unwrap(), studio);

        let partial = VariantConfig::from_json(r#"{ "layout": "Workflow", "downscale": 0 }"#)
            .unwrap();
        assert_eq!(partial.layout, Layout::Workflow);
        assert_eq!(partial.downscale, 1);
        assert_eq!(partial.camera, VariantConfig::hero().camera);

        assert!(matches!(
            VariantConfig::from_json("{ nope"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            VariantConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
