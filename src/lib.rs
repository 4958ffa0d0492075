//! # Fanrig
//!
//! **An animated desk fan built from a hierarchical transform stack.**
//!
//! The fan is a fixed tree of parts (pole, arm, cage, hub, three blades,
//! housing, rim, grille rings). Every frame the composer walks that tree
//! once, composing each part's local recipe onto its parent frame, and hands
//! the resulting world transforms to a draw target. The base swings on a
//! sine yaw, the cage tilts by keyboard, the blades spin while running.
//!
//! ## Headless use
//!
//! The traversal never touches the GPU, so a whole frame can be produced and
//! inspected with the recording [`DrawQueue`]:
//!
//! ```
//! use fanrig::*;
//!
//! let mut driver = FanDriver::new(FanConfig::default());
//! let mut queue = DrawQueue::new(true);
//!
//! driver.send(FanCommand::AdjustCagePitch(0.1));
//! let stats = driver.render_frame(0.25, 0.016, &mut queue);
//!
//! assert_eq!(stats.draws, 19);
//! assert_eq!(queue.find(PartId::Pole).map(|d| d.pass), Some(RenderPass::Opaque));
//! assert_eq!(queue.find(PartId::Dome).map(|d| d.pass), Some(RenderPass::Translucent));
//! ```
//!
//! ## Windowed
//!
//! [`run`] opens a window and renders with wgpu. Controls: `Space` starts and
//! stops the blades, `[` / `]` tilt the cage, `T` toggles the texture, `L`
//! toggles lighting, `Escape` quits.

mod animation;
mod app;
mod camera;
mod compose;
mod config;
mod dispatch;
mod driver;
mod error;
mod fan_pass;
mod geometry;
mod gpu;
mod input;
mod material;
mod mesh;
mod rig;
mod texture;
mod transform;

pub use animation::{
    BLADE_RPM, CommandQueue, FanCommand, FanState, PITCH_STEP_DEGREES, Pose, YAW_MAX_DEGREES,
    YAW_SPEED_HZ, YawOscillator,
};
pub use app::run;
pub use camera::Camera;
pub use compose::FanComposer;
pub use config::{AppConfig, FanConfig, MAX_FRAME_DT, TextureSource};
pub use dispatch::{DrawCommand, DrawDispatch, DrawQueue, DrawTarget, QueuedDraw, RenderPass};
pub use driver::{FanDriver, FrameClock, FrameStats, clamp_delta};
pub use error::{FanError, TransformError};
pub use fan_pass::{FanPass, ModelUniforms, SceneUniforms};
pub use geometry::RawGeometry;
pub use gpu::GpuContext;
pub use input::{InputAction, KeyBindings};
pub use material::{Color, Lighting, Material};
pub use mesh::{Mesh, MeshLibrary, Vertex3d};
pub use rig::{
    Angle, BLADE_COUNT, Channel, FanLayout, FanRig, MeshKind, Op, Part, PartId, RING_COUNT,
    apply_ops,
};
pub use texture::Texture;
pub use transform::{Axis, Transform, TransformStack};

/// Primitive generators: cube, UV sphere, capped cylinder.
pub mod primitives {
    pub use crate::geometry::{cube, cylinder, sphere};
}

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::keyboard::KeyCode;
