//! The boundary between the fan traversal and whatever draws it.
//!
//! The traversal never talks to the GPU. It hands [`DrawCommand`]s to a
//! [`DrawTarget`] through a [`DrawDispatch`], which also owns the
//! opaque/translucent pass switching.
//!
//! [`DrawQueue`] is the target used in practice: it records the frame's
//! commands so the wgpu pass can replay them after the traversal finishes,
//! and tests can inspect exactly what was issued.

use crate::material::{Color, Lighting};
use crate::rig::{MeshKind, PartId};
use crate::transform::Transform;

/// Blend and depth-write state for a run of draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// Blending off, depth writes on.
    #[default]
    Opaque,
    /// Alpha blending on, depth writes off, depth test still on.
    Translucent,
}

impl RenderPass {
    pub fn blend_enabled(self) -> bool {
        matches!(self, RenderPass::Translucent)
    }

    pub fn depth_write(self) -> bool {
        matches!(self, RenderPass::Opaque)
    }
}

/// One draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    pub part: PartId,
    pub mesh: MeshKind,
    pub world: Transform,
    pub base_color: Color,
    /// Texturing was asked for: the part is eligible and texturing is on.
    pub texture_requested: bool,
    /// What the renderer should actually do. False whenever the texture is not ready.
    pub use_texture: bool,
}

/// An external renderer.
pub trait DrawTarget {
    /// Called once per frame before any draw.
    fn begin_frame(&mut self, _lighting: &Lighting) {}

    /// Switches blend/depth-write state for subsequent draws.
    fn set_pass(&mut self, pass: RenderPass);

    /// Issues one draw.
    fn draw_primitive(&mut self, command: &DrawCommand);

    /// Whether the surface texture can be sampled yet.
    fn texture_ready(&self) -> bool {
        true
    }
}

/// Forwards draws to a [`DrawTarget`] and tracks pass state.
pub struct DrawDispatch<'t> {
    target: &'t mut dyn DrawTarget,
    pass: RenderPass,
    draws: usize,
    translucent_draws: usize,
}

impl<'t> DrawDispatch<'t> {
    /// Starts in the opaque pass.
    pub fn new(target: &'t mut dyn DrawTarget) -> Self {
        target.set_pass(RenderPass::Opaque);
        Self {
            target,
            pass: RenderPass::Opaque,
            draws: 0,
            translucent_draws: 0,
        }
    }

    pub fn pass(&self) -> RenderPass {
        self.pass
    }

    /// Total draws issued so far.
    pub fn draws(&self) -> usize {
        self.draws
    }

    /// Draws issued while translucent.
    pub fn translucent_draws(&self) -> usize {
        self.translucent_draws
    }

    /// Issues a draw. Texturing silently degrades to untextured if the target
    /// is not ready.
    pub fn draw(
        &mut self,
        part: PartId,
        mesh: MeshKind,
        world: Transform,
        base_color: Color,
        texture_requested: bool,
    ) {
        let command = DrawCommand {
            part,
            mesh,
            world,
            base_color,
            texture_requested,
            use_texture: texture_requested && self.target.texture_ready(),
        };
        log::trace!("draw {part:?} ({mesh:?}) in {:?} pass", self.pass);
        self.target.draw_primitive(&command);
        self.draws += 1;
        if self.pass == RenderPass::Translucent {
            self.translucent_draws += 1;
        }
    }

    /// Runs `f` in the translucent pass, then returns to opaque.
    pub fn translucent<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        debug_assert_eq!(self.pass, RenderPass::Opaque, "translucent passes do not nest");
        self.switch(RenderPass::Translucent);
        let out = f(self);
        self.switch(RenderPass::Opaque);
        out
    }

    fn switch(&mut self, pass: RenderPass) {
        log::debug!("pass {:?} -> {:?}", self.pass, pass);
        self.pass = pass;
        self.target.set_pass(pass);
    }
}

/// A queued draw tagged with the pass it belongs to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueuedDraw {
    pub pass: RenderPass,
    pub command: DrawCommand,
}

/// A recording [`DrawTarget`].
///
/// Records draws in issue order together with the pass each one ran in and
/// the sequence of pass switches. Cleared at the start of every frame.
#[derive(Clone, Debug, Default)]
pub struct DrawQueue {
    pub draws: Vec<QueuedDraw>,
    pub pass_changes: Vec<RenderPass>,
    pub lighting: Lighting,
    pass: RenderPass,
    texture_ready: bool,
}

impl DrawQueue {
    pub fn new(texture_ready: bool) -> Self {
        Self {
            texture_ready,
            ..Self::default()
        }
    }

    pub fn set_texture_ready(&mut self, ready: bool) {
        self.texture_ready = ready;
    }

    /// Drops recorded draws and pass changes for the next frame.
    pub fn clear(&mut self) {
        self.draws.clear();
        self.pass_changes.clear();
        self.pass = RenderPass::Opaque;
    }

    /// The recorded draw for `part`, if any.
    pub fn find(&self, part: PartId) -> Option<&QueuedDraw> {
        self.draws.iter().find(|d| d.command.part == part)
    }

    /// The recorded parts in draw order.
    pub fn parts(&self) -> Vec<PartId> {
        self.draws.iter().map(|d| d.command.part).collect()
    }
}

impl DrawTarget for DrawQueue {
    fn begin_frame(&mut self, lighting: &Lighting) {
        self.lighting = *lighting;
    }

    fn set_pass(&mut self, pass: RenderPass) {
        self.pass = pass;
        self.pass_changes.push(pass);
    }

    fn draw_primitive(&mut self, command: &DrawCommand) {
        self.draws.push(QueuedDraw {
            pass: self.pass,
            command: *command,
        });
    }

    fn texture_ready(&self) -> bool {
        self.texture_ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_state_flags() {
        assert!(!RenderPass::Opaque.blend_enabled());
        assert!(RenderPass::Opaque.depth_write());
        assert!(RenderPass::Translucent.blend_enabled());
        assert!(!RenderPass::Translucent.depth_write());
    }

    #[test]
    fn translucent_block_restores_opaque() {
        let mut queue = DrawQueue::new(true);
        {
            let mut dispatch = DrawDispatch::new(&mut queue);
            dispatch.draw(PartId::Hub, MeshKind::Box, Transform::IDENTITY, Color::WHITE, false);
            dispatch.translucent(|d| {
                assert_eq!(d.pass(), RenderPass::Translucent);
                d.draw(PartId::Dome, MeshKind::Sphere, Transform::IDENTITY, Color::WHITE, true);
            });
            assert_eq!(dispatch.pass(), RenderPass::Opaque);
            assert_eq!(dispatch.draws(), 2);
            assert_eq!(dispatch.translucent_draws(), 1);
        }

        assert_eq!(
            queue.pass_changes,
            vec![
                RenderPass::Opaque,
                RenderPass::Translucent,
                RenderPass::Opaque
            ]
        );
        assert_eq!(queue.draws[0].pass, RenderPass::Opaque);
        assert_eq!(queue.draws[1].pass, RenderPass::Translucent);
    }

    #[test]
    fn texture_falls_back_when_not_ready() {
        let mut queue = DrawQueue::new(false);
        {
            let mut dispatch = DrawDispatch::new(&mut queue);
            dispatch.draw(PartId::Dome, MeshKind::Sphere, Transform::IDENTITY, Color::WHITE, true);
        }
        let dome = queue.find(PartId::Dome).unwrap().command;
        assert!(dome.texture_requested);
        assert!(!dome.use_texture);

        queue.clear();
        queue.set_texture_ready(true);
        {
            let mut dispatch = DrawDispatch::new(&mut queue);
            dispatch.draw(PartId::Dome, MeshKind::Sphere, Transform::IDENTITY, Color::WHITE, true);
        }
        assert!(queue.find(PartId::Dome).unwrap().command.use_texture);
    }
}
