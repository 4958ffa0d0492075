//! The fan's fixed part hierarchy, described as data.
//!
//! ```text
//! root
//! ├── pole
//! └── yaw joint ─ translate(pivot) · rotateY(yaw)
//!     ├── arm
//!     └── cage joint ─ translate(0,0,arm) · rotateX(pitch)   ← cage base
//!         ├── hub
//!         ├── rotor joint ─ rotateZ(spin)
//!         │   └── blade × 3
//!         ├── dome
//!         ├── housing
//!         ├── rim
//!         └── ring × 10
//! ```
//!
//! Each [`Part`] carries a local recipe of [`Op`]s applied on top of its
//! parent frame. Animated angles are named by [`Channel`] and resolved
//! against the frame's [`Pose`] when the recipe runs, so the layout itself
//! is built once and never mutated.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec3;

use crate::animation::Pose;
use crate::material::{Color, Material};
use crate::transform::{Axis, TransformStack};

/// Number of blades on the rotor.
pub const BLADE_COUNT: usize = 3;
/// Number of concentric decorative rings on the grille.
pub const RING_COUNT: usize = 10;

/// Which pre-built mesh a part draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    /// Cube spanning ±1 on every axis.
    Box,
    /// Unit-radius UV sphere.
    Sphere,
    /// Capped cylinder along Y, centred, with the rig's housing radius and height.
    Cylinder,
}

/// Names every drawable part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartId {
    Pole,
    Arm,
    Hub,
    Blade(u8),
    Dome,
    Housing,
    Rim,
    Ring(u8),
}

/// An animated angle source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Yaw,
    CagePitch,
    Spin,
}

impl Channel {
    fn read(self, pose: &Pose) -> f32 {
        match self {
            Channel::Yaw => pose.yaw,
            Channel::CagePitch => pose.cage_pitch,
            Channel::Spin => pose.blade_angle,
        }
    }
}

/// A rotation amount: constant, or read from the pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Angle {
    Fixed(f32),
    Animated(Channel),
}

impl Angle {
    pub fn resolve(self, pose: &Pose) -> f32 {
        match self {
            Angle::Fixed(radians) => radians,
            Angle::Animated(channel) => channel.read(pose),
        }
    }
}

/// One step of a local transform recipe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Op {
    Translate(Vec3),
    Rotate(Axis, Angle),
    Scale(Vec3),
}

impl Op {
    pub fn apply(self, stack: &mut TransformStack, pose: &Pose) {
        match self {
            Op::Translate(offset) => stack.translate(offset),
            Op::Rotate(axis, angle) => stack.rotate(axis, angle.resolve(pose)),
            Op::Scale(factors) => stack.scale(factors),
        }
    }
}

/// Runs `ops` in order against the stack's working transform.
pub fn apply_ops(ops: &[Op], stack: &mut TransformStack, pose: &Pose) {
    for op in ops {
        op.apply(stack, pose);
    }
}

/// A drawable node.
#[derive(Clone, Debug, PartialEq)]
pub struct Part {
    pub id: PartId,
    pub mesh: MeshKind,
    pub material: Material,
    /// Local recipe relative to the parent frame.
    pub recipe: Vec<Op>,
}

impl Part {
    fn new(id: PartId, mesh: MeshKind, material: Material, recipe: Vec<Op>) -> Self {
        Self {
            id,
            mesh,
            material,
            recipe,
        }
    }
}

/// Physical dimensions and colors of the fan.
///
/// Lengths are in world units. Box sizes are half-extents because the box
/// mesh spans ±1.
#[derive(Clone, Debug, PartialEq)]
pub struct FanRig {
    pub pole_center: Vec3,
    pub pole_half_extents: Vec3,
    pub yaw_pivot: Vec3,
    pub arm_length: f32,
    pub arm_half_thickness: f32,
    pub cage_radius: f32,
    /// Dome depth along the spin axis as a fraction of the cage radius.
    pub dome_depth_ratio: f32,
    pub hub_half_extent: f32,
    pub blade_length: f32,
    pub blade_half_width: f32,
    pub blade_half_thickness: f32,
    pub housing_radius: f32,
    pub housing_height: f32,
    /// Distance from the cage pivot back to the housing centre.
    pub housing_offset: f32,
    pub rim_depth: f32,
    pub ring_depth: f32,

    pub pole_color: Color,
    pub arm_color: Color,
    pub hub_color: Color,
    pub blade_color: Color,
    pub dome_color: Color,
    pub housing_color: Color,
    pub rim_color: Color,
    pub ring_color: Color,
}

impl Default for FanRig {
    fn default() -> Self {
        Self {
            pole_center: Vec3::new(0.0, -0.1, 0.0),
            pole_half_extents: Vec3::new(0.08, 1.1, 0.08),
            yaw_pivot: Vec3::new(0.0, 1.0, 0.0),
            arm_length: 2.5,
            arm_half_thickness: 0.06,
            cage_radius: 1.3,
            dome_depth_ratio: 0.45,
            hub_half_extent: 0.18,
            blade_length: 1.1,
            blade_half_width: 0.125,
            blade_half_thickness: 0.03,
            housing_radius: 0.35,
            housing_height: 0.5,
            housing_offset: 0.75,
            rim_depth: 0.03,
            ring_depth: 0.01,

            pole_color: Color::rgb(0.25, 0.25, 0.28),
            arm_color: Color::rgb(0.7, 0.7, 0.75),
            hub_color: Color::rgb(0.2, 0.2, 0.22),
            blade_color: Color::rgb(0.75, 0.75, 0.78),
            dome_color: Color::rgba(0.45, 0.48, 0.52, 0.22),
            housing_color: Color::rgb(0.3, 0.3, 0.33),
            rim_color: Color::rgba(0.6, 0.62, 0.66, 0.45),
            ring_color: Color::rgba(0.6, 0.62, 0.66, 0.06),
        }
    }
}

impl FanRig {
    /// Radius of decorative ring `index`: `cage · (0.3 + 0.7 · i / N)`.
    pub fn ring_radius(&self, index: usize) -> f32 {
        self.cage_radius * (0.3 + 0.7 * index as f32 / RING_COUNT as f32)
    }

    /// Offset of the grille plane in front of the cage pivot.
    pub fn grille_offset(&self) -> f32 {
        self.cage_radius * self.dome_depth_ratio * 0.9
    }
}

/// The fan hierarchy with every recipe resolved from a [`FanRig`].
#[derive(Clone, Debug, PartialEq)]
pub struct FanLayout {
    pub pole: Part,
    pub yaw_joint: Vec<Op>,
    pub arm: Part,
    pub cage_joint: Vec<Op>,
    pub hub: Part,
    pub rotor_joint: Vec<Op>,
    pub blades: Vec<Part>,
    pub dome: Part,
    pub housing: Part,
    pub rim: Part,
    pub rings: Vec<Part>,
}

impl FanLayout {
    pub fn new(rig: &FanRig) -> Self {
        let pole = Part::new(
            PartId::Pole,
            MeshKind::Box,
            Material::solid(rig.pole_color),
            vec![
                Op::Translate(rig.pole_center),
                Op::Scale(rig.pole_half_extents),
            ],
        );

        let yaw_joint = vec![
            Op::Translate(rig.yaw_pivot),
            Op::Rotate(Axis::Y, Angle::Animated(Channel::Yaw)),
        ];

        // Box along +Z from the pivot to the cage.
        let half_arm = rig.arm_length * 0.5;
        let arm = Part::new(
            PartId::Arm,
            MeshKind::Box,
            Material::solid(rig.arm_color),
            vec![
                Op::Translate(Vec3::new(0.0, 0.0, half_arm)),
                Op::Scale(Vec3::new(
                    rig.arm_half_thickness,
                    rig.arm_half_thickness,
                    half_arm,
                )),
            ],
        );

        let cage_joint = vec![
            Op::Translate(Vec3::new(0.0, 0.0, rig.arm_length)),
            Op::Rotate(Axis::X, Angle::Animated(Channel::CagePitch)),
        ];

        let hub = Part::new(
            PartId::Hub,
            MeshKind::Box,
            Material::solid(rig.hub_color),
            vec![Op::Scale(Vec3::splat(rig.hub_half_extent))],
        );

        let rotor_joint = vec![Op::Rotate(Axis::Z, Angle::Animated(Channel::Spin))];

        let blades = (0..BLADE_COUNT)
            .map(|i| {
                let theta = i as f32 * TAU / BLADE_COUNT as f32;
                Part::new(
                    PartId::Blade(i as u8),
                    MeshKind::Box,
                    Material::textured(rig.blade_color),
                    vec![
                        Op::Rotate(Axis::Z, Angle::Fixed(theta)),
                        Op::Translate(Vec3::new(rig.blade_length * 0.6, 0.0, 0.0)),
                        Op::Scale(Vec3::new(
                            rig.blade_length * 0.5,
                            rig.blade_half_width,
                            rig.blade_half_thickness,
                        )),
                    ],
                )
            })
            .collect();

        let dome = Part::new(
            PartId::Dome,
            MeshKind::Sphere,
            Material::textured(rig.dome_color),
            vec![Op::Scale(Vec3::new(
                rig.cage_radius,
                rig.cage_radius,
                rig.cage_radius * rig.dome_depth_ratio,
            ))],
        );

        // The cylinder mesh runs along +Y; lay it down onto the spin axis.
        let housing = Part::new(
            PartId::Housing,
            MeshKind::Cylinder,
            Material::solid(rig.housing_color),
            vec![
                Op::Translate(Vec3::new(0.0, 0.0, -rig.housing_offset)),
                Op::Rotate(Axis::X, Angle::Fixed(FRAC_PI_2)),
            ],
        );

        let grille = Vec3::new(0.0, 0.0, rig.grille_offset());
        let rim_radius = rig.cage_radius * 1.02;
        let rim = Part::new(
            PartId::Rim,
            MeshKind::Sphere,
            Material::solid(rig.rim_color),
            vec![
                Op::Translate(grille),
                Op::Scale(Vec3::new(rim_radius, rim_radius, rig.rim_depth)),
            ],
        );

        let rings = (0..RING_COUNT)
            .map(|i| {
                let r = rig.ring_radius(i);
                Part::new(
                    PartId::Ring(i as u8),
                    MeshKind::Sphere,
                    Material::solid(rig.ring_color),
                    vec![
                        Op::Translate(grille),
                        Op::Scale(Vec3::new(r, r, rig.ring_depth)),
                    ],
                )
            })
            .collect();

        Self {
            pole,
            yaw_joint,
            arm,
            cage_joint,
            hub,
            rotor_joint,
            blades,
            dome,
            housing,
            rim,
            rings,
        }
    }
}

impl Default for FanLayout {
    fn default() -> Self {
        Self::new(&FanRig::default())
    }
}
