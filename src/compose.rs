//! Hierarchy composer: turns a [`Pose`] into the frame's ordered draws.
//!
//! Traversal order is fixed:
//!
//! 1. reset the stack to identity
//! 2. pole, in its own scope
//! 3. yaw joint applied to the working transform (no scope: the arm and
//!    everything at the cage inherit the sweep)
//! 4. arm, in its own scope
//! 5. cage joint applied, then the working transform is snapshotted as the
//!    *cage base*
//! 6. opaque rotor: hub, then blades under the spin rotation
//! 7. translucent shroud: dome, housing, rim, rings, each reloaded from the
//!    cage base
//!
//! Every subtree below the cage receives the cage base as an explicit
//! argument. Nothing after step 5 can change it: [`Transform`] is `Copy`,
//! so the snapshot is a value, not a view of the working matrix.

use crate::animation::Pose;
use crate::dispatch::DrawDispatch;
use crate::rig::{FanLayout, Part, apply_ops};
use crate::transform::{Transform, TransformStack};

/// Walks a [`FanLayout`] once per frame.
#[derive(Clone, Debug)]
pub struct FanComposer {
    layout: FanLayout,
    stack: TransformStack,
}

impl FanComposer {
    pub fn new(layout: FanLayout) -> Self {
        Self {
            layout,
            stack: TransformStack::new(),
        }
    }

    pub fn layout(&self) -> &FanLayout {
        &self.layout
    }

    /// Emits every part of the fan in `pose`.
    ///
    /// Returns the cage base transform used for this frame.
    pub fn compose(&mut self, pose: &Pose, dispatch: &mut DrawDispatch) -> Transform {
        let Self { layout, stack } = self;

        stack.reset();

        draw_part(stack, &layout.pole, pose, dispatch);

        apply_ops(&layout.yaw_joint, stack, pose);
        draw_part(stack, &layout.arm, pose, dispatch);

        apply_ops(&layout.cage_joint, stack, pose);
        let cage_base = stack.current();

        compose_rotor(stack, layout, cage_base, pose, dispatch);
        dispatch.translucent(|dispatch| {
            compose_shroud(stack, layout, cage_base, pose, dispatch);
        });

        debug_assert_eq!(stack.depth(), 0, "fan traversal left saved transforms");
        cage_base
    }
}

impl Default for FanComposer {
    fn default() -> Self {
        Self::new(FanLayout::default())
    }
}

/// Hub at the cage base, blades under the rotor spin.
fn compose_rotor(
    stack: &mut TransformStack,
    layout: &FanLayout,
    cage_base: Transform,
    pose: &Pose,
    dispatch: &mut DrawDispatch,
) {
    stack.load(cage_base);
    draw_part(stack, &layout.hub, pose, dispatch);

    stack.scoped(|stack| {
        apply_ops(&layout.rotor_joint, stack, pose);
        for blade in &layout.blades {
            draw_part(stack, blade, pose, dispatch);
        }
    });
}

/// The see-through parts, each placed directly on the cage base.
fn compose_shroud(
    stack: &mut TransformStack,
    layout: &FanLayout,
    cage_base: Transform,
    pose: &Pose,
    dispatch: &mut DrawDispatch,
) {
    let shroud = [&layout.dome, &layout.housing, &layout.rim]
        .into_iter()
        .chain(&layout.rings);
    for part in shroud {
        stack.load(cage_base);
        draw_part(stack, part, pose, dispatch);
    }
}

/// Draws `part` with its recipe applied inside a scope.
fn draw_part(stack: &mut TransformStack, part: &Part, pose: &Pose, dispatch: &mut DrawDispatch) {
    stack.scoped(|stack| {
        apply_ops(&part.recipe, stack, pose);
        dispatch.draw(
            part.id,
            part.mesh,
            stack.current(),
            part.material.base_color,
            part.material.texture_eligible && pose.tex_enabled,
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{DrawQueue, RenderPass};
    use crate::rig::{FanRig, PartId, RING_COUNT};
    use crate::transform::Axis;
    use glam::{Mat4, Vec3};

    fn compose(rig: &FanRig, pose: &Pose) -> (DrawQueue, Transform) {
        let mut composer = FanComposer::new(FanLayout::new(rig));
        let mut queue = DrawQueue::new(true);
        let cage_base = {
            let mut dispatch = DrawDispatch::new(&mut queue);
            composer.compose(pose, &mut dispatch)
        };
        (queue, cage_base)
    }

    fn world(queue: &DrawQueue, part: PartId) -> Transform {
        queue.find(part).expect("part drawn").command.world
    }

    #[test]
    fn draw_order_and_passes() {
        let (queue, _) = compose(&FanRig::default(), &Pose::REST);

        let mut expected = vec![
            PartId::Pole,
            PartId::Arm,
            PartId::Hub,
            PartId::Blade(0),
            PartId::Blade(1),
            PartId::Blade(2),
            PartId::Dome,
            PartId::Housing,
            PartId::Rim,
        ];
        expected.extend((0..RING_COUNT as u8).map(PartId::Ring));
        assert_eq!(queue.parts(), expected);

        let opaque: Vec<bool> = queue
            .draws
            .iter()
            .map(|d| d.pass == RenderPass::Opaque)
            .collect();
        assert!(opaque[..6].iter().all(|&o| o));
        assert!(opaque[6..].iter().all(|&o| !o));
        assert_eq!(
            queue.pass_changes,
            vec![
                RenderPass::Opaque,
                RenderPass::Translucent,
                RenderPass::Opaque
            ]
        );
    }

    #[test]
    fn hub_at_rest_with_zero_arm_is_bit_exact() {
        let rig = FanRig {
            arm_length: 0.0,
            ..FanRig::default()
        };
        let (queue, _) = compose(&rig, &Pose::REST);
        let expected = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0))
            * Mat4::from_scale(Vec3::splat(0.18));
        assert_eq!(world(&queue, PartId::Hub).matrix(), expected);
    }

    #[test]
    fn hub_at_rest_sits_at_arm_tip() {
        let rig = FanRig::default();
        let (queue, cage_base) = compose(&rig, &Pose::REST);
        let expected = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0))
            * Mat4::from_translation(Vec3::new(0.0, 0.0, rig.arm_length))
            * Mat4::from_scale(Vec3::splat(rig.hub_half_extent));
        assert_eq!(world(&queue, PartId::Hub).matrix(), expected);
        assert_eq!(cage_base.translation(), Vec3::new(0.0, 1.0, 2.5));
    }

    #[test]
    fn yaw_moves_arm_and_cage_but_not_pole() {
        let rig = FanRig::default();
        let (rest, _) = compose(&rig, &Pose::REST);
        let swung = Pose {
            yaw: 0.4,
            ..Pose::REST
        };
        let (moved, cage_base) = compose(&rig, &swung);

        assert_eq!(world(&rest, PartId::Pole), world(&moved, PartId::Pole));
        for part in [PartId::Arm, PartId::Hub, PartId::Blade(1), PartId::Dome, PartId::Ring(3)] {
            assert_ne!(world(&rest, part), world(&moved, part), "{part:?}");
        }

        let expected = Transform::from_translation(rig.yaw_pivot)
            .rotated(Axis::Y, 0.4)
            .translated(Vec3::new(0.0, 0.0, rig.arm_length));
        assert!(cage_base.abs_diff_eq(&expected, 1e-6));
    }

    #[test]
    fn pitch_tilts_cage_children_only() {
        let rig = FanRig::default();
        let (rest, _) = compose(&rig, &Pose::REST);
        let tilted = Pose {
            cage_pitch: 0.3,
            ..Pose::REST
        };
        let (moved, _) = compose(&rig, &tilted);

        assert_eq!(world(&rest, PartId::Pole), world(&moved, PartId::Pole));
        assert_eq!(world(&rest, PartId::Arm), world(&moved, PartId::Arm));
        // the hub sits on the pivot, only its orientation changes
        let hub_rest = world(&rest, PartId::Hub);
        let hub_moved = world(&moved, PartId::Hub);
        assert!((hub_rest.translation() - hub_moved.translation()).length() < 1e-6);
        assert_ne!(hub_rest, hub_moved);
        assert_ne!(world(&rest, PartId::Housing), world(&moved, PartId::Housing));
    }

    #[test]
    fn spin_turns_blades_only() {
        let rig = FanRig::default();
        let (rest, _) = compose(&rig, &Pose::REST);
        let spun = Pose {
            blade_angle: 1.0,
            ..Pose::REST
        };
        let (moved, _) = compose(&rig, &spun);

        for part in [PartId::Hub, PartId::Dome, PartId::Housing, PartId::Rim] {
            assert_eq!(world(&rest, part), world(&moved, part), "{part:?}");
        }
        for i in 0..3 {
            assert_ne!(
                world(&rest, PartId::Blade(i)),
                world(&moved, PartId::Blade(i))
            );
        }
    }

    #[test]
    fn blades_are_a_third_of_a_turn_apart() {
        let rig = FanRig::default();
        let (queue, cage_base) = compose(&rig, &Pose::REST);
        let tip = |i: u8| {
            let world = world(&queue, PartId::Blade(i));
            cage_base
                .matrix()
                .inverse()
                .transform_point3(world.transform_point(Vec3::ZERO))
        };
        let r = rig.blade_length * 0.6;
        assert!((tip(0) - Vec3::new(r, 0.0, 0.0)).length() < 1e-5);
        let turned = Mat4::from_rotation_z(std::f32::consts::TAU / 3.0).transform_point3(tip(0));
        assert!((tip(1) - turned).length() < 1e-5);
    }

    #[test]
    fn shroud_parts_share_the_cage_base() {
        let rig = FanRig::default();
        let pose = Pose {
            yaw: -0.2,
            cage_pitch: 0.15,
            blade_angle: 2.0,
            tex_enabled: true,
        };
        let (queue, cage_base) = compose(&rig, &pose);

        let dome = world(&queue, PartId::Dome);
        let expected = cage_base.scaled(Vec3::new(
            rig.cage_radius,
            rig.cage_radius,
            rig.cage_radius * rig.dome_depth_ratio,
        ));
        assert_eq!(dome, expected);

        for i in 0..RING_COUNT {
            let ring = world(&queue, PartId::Ring(i as u8));
            let r = rig.ring_radius(i);
            let expected = cage_base
                .translated(Vec3::new(0.0, 0.0, rig.grille_offset()))
                .scaled(Vec3::new(r, r, rig.ring_depth));
            assert_eq!(ring, expected);
        }
    }

    #[test]
    fn texture_flag_follows_toggle_for_eligible_parts_only() {
        let rig = FanRig::default();
        let on = Pose::REST;
        let off = Pose {
            tex_enabled: false,
            ..Pose::REST
        };
        let (with_tex, _) = compose(&rig, &on);
        let (without_tex, _) = compose(&rig, &off);

        for (a, b) in with_tex.draws.iter().zip(&without_tex.draws) {
            let part = a.command.part;
            let eligible = matches!(part, PartId::Dome | PartId::Blade(_));
            assert_eq!(a.command.use_texture, eligible, "{part:?}");
            assert!(!b.command.use_texture, "{part:?}");
        }
    }

    #[test]
    fn composer_is_reusable_across_frames() {
        let mut composer = FanComposer::default();
        let mut first = DrawQueue::new(true);
        let mut second = DrawQueue::new(true);
        let pose = Pose {
            yaw: 0.3,
            cage_pitch: -0.1,
            blade_angle: 0.7,
            tex_enabled: true,
        };
        composer.compose(&pose, &mut DrawDispatch::new(&mut first));
        composer.compose(&pose, &mut DrawDispatch::new(&mut second));
        assert_eq!(first.draws, second.draws);
    }
}
