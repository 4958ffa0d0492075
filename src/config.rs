//! Application and animation configuration.
//!
//! Both structs follow the same builder pattern: start from `new()` (the
//! defaults) and override what you need.
//!
//! ```
//! use fanrig::{AppConfig, FanConfig, TextureSource};
//!
//! let config = AppConfig::new()
//!     .title("Desk Fan")
//!     .size(1280, 720)
//!     .texture(TextureSource::Disabled)
//!     .fan(FanConfig::new().blade_rpm(240.0));
//! assert_eq!(config.fan.blade_rpm, 240.0);
//! ```

use std::path::PathBuf;

use crate::animation::{
    BLADE_RPM, PITCH_STEP_DEGREES, YAW_MAX_DEGREES, YAW_SPEED_HZ, YawOscillator,
};
use crate::material::Color;
use crate::rig::FanRig;

/// Longest frame step the animation will take, in seconds.
pub const MAX_FRAME_DT: f64 = 0.033;

/// Animation constants and rig dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct FanConfig {
    /// Yaw amplitude in radians.
    pub yaw_max: f64,
    pub yaw_speed_hz: f64,
    pub blade_rpm: f64,
    /// Cage pitch change per key press, in radians.
    pub pitch_step: f32,
    /// Upper clamp on the frame delta.
    pub max_frame_dt: f64,
    pub rig: FanRig,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            yaw_max: YAW_MAX_DEGREES.to_radians(),
            yaw_speed_hz: YAW_SPEED_HZ,
            blade_rpm: BLADE_RPM,
            pitch_step: PITCH_STEP_DEGREES.to_radians(),
            max_frame_dt: MAX_FRAME_DT,
            rig: FanRig::default(),
        }
    }
}

impl FanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn yaw_degrees(mut self, degrees: f64) -> Self {
        self.yaw_max = degrees.to_radians();
        self
    }

    pub fn yaw_speed(mut self, hz: f64) -> Self {
        self.yaw_speed_hz = hz;
        self
    }

    pub fn blade_rpm(mut self, rpm: f64) -> Self {
        self.blade_rpm = rpm;
        self
    }

    pub fn pitch_step_degrees(mut self, degrees: f32) -> Self {
        self.pitch_step = degrees.to_radians();
        self
    }

    pub fn max_frame_dt(mut self, seconds: f64) -> Self {
        self.max_frame_dt = seconds;
        self
    }

    pub fn rig(mut self, rig: FanRig) -> Self {
        self.rig = rig;
        self
    }

    pub fn oscillator(&self) -> YawOscillator {
        YawOscillator::new(self.yaw_max, self.yaw_speed_hz)
    }
}

/// Where the shared surface texture comes from.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TextureSource {
    /// Generated grille pattern.
    #[default]
    Procedural,
    /// An image file; on load failure parts render untextured.
    File(PathBuf),
    /// No texture; parts always render untextured.
    Disabled,
}

/// Configuration for the app window.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: Color,
    pub texture: TextureSource,
    pub fan: FanConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Fanrig".to_string(),
            width: 1024,
            height: 768,
            clear_color: Color::rgb(0.06, 0.06, 0.08),
            texture: TextureSource::default(),
            fan: FanConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn texture(mut self, texture: TextureSource) -> Self {
        self.texture = texture;
        self
    }

    pub fn fan(mut self, fan: FanConfig) -> Self {
        self.fan = fan;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_fan() {
        let fan = FanConfig::default();
        assert!((fan.yaw_max - std::f64::consts::PI / 6.0).abs() < 1e-12);
        assert_eq!(fan.yaw_speed_hz, 0.8);
        assert_eq!(fan.blade_rpm, 180.0);
        assert!((fan.pitch_step - 3f32.to_radians()).abs() < 1e-9);
        assert_eq!(fan.max_frame_dt, 0.033);
    }

    #[test]
    fn oscillator_uses_configured_values() {
        let osc = FanConfig::new().yaw_degrees(45.0).yaw_speed(2.0).oscillator();
        assert!((osc.max - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert_eq!(osc.period(), 0.5);
    }
}
