//! Surface colors, per-part materials and the scene lighting block.

use glam::Vec3;

/// Straight (non-premultiplied) RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

/// How a part is shaded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Base color; alpha below 1 only takes effect in the translucent pass.
    pub base_color: Color,
    /// Whether the part samples the shared surface texture while texturing is on.
    pub texture_eligible: bool,
}

impl Material {
    /// An untextured material.
    pub const fn solid(base_color: Color) -> Self {
        Self {
            base_color,
            texture_eligible: false,
        }
    }

    /// A material that picks up the surface texture when texturing is enabled.
    pub const fn textured(base_color: Color) -> Self {
        Self {
            base_color,
            texture_eligible: true,
        }
    }
}

/// Light and shading terms shared by every draw in a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub light_position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl Lighting {
    /// A single white point light up and to the right of the fan.
    pub fn lit() -> Self {
        Self {
            light_position: Vec3::new(5.0, 5.0, 5.0),
            ambient: Vec3::new(0.08, 0.08, 0.10),
            diffuse: Vec3::ONE,
            specular: Vec3::splat(0.6),
            shininess: 32.0,
        }
    }

    /// Full ambient, no directional terms: parts show their flat base color.
    pub fn unlit() -> Self {
        Self {
            ambient: Vec3::ONE,
            diffuse: Vec3::ZERO,
            specular: Vec3::ZERO,
            ..Self::lit()
        }
    }

    pub fn for_toggle(enabled: bool) -> Self {
        if enabled { Self::lit() } else { Self::unlit() }
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::lit()
    }
}
