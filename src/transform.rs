//! Affine transforms and the matrix stack used to compose them.
//!
//! - [`Transform`]: a 4×4 affine matrix mapping local geometry into its parent frame
//! - [`Axis`]: rotation axes accepted by [`Transform::rotated`]
//! - [`TransformStack`]: a working transform plus a LIFO of saved copies
//!
//! All elementary operations *right*-multiply the working matrix, so a recipe
//! reads outermost-first:
//!
//! ```
//! use fanrig::{Axis, Transform};
//! use glam::Vec3;
//!
//! // Move to the pivot, then spin about the local Y axis, then shrink.
//! let t = Transform::IDENTITY
//!     .translated(Vec3::new(0.0, 1.0, 0.0))
//!     .rotated(Axis::Y, 0.25)
//!     .scaled(Vec3::splat(0.5));
//! let p = t.transform_point(Vec3::ZERO);
//! assert_eq!(p, Vec3::new(0.0, 1.0, 0.0));
//! ```
//!
//! # Scoped Saves
//!
//! [`TransformStack::scoped`] pairs every push with its pop at the same
//! nesting level, which is how the fan traversal uses the stack. The raw
//! [`push`](TransformStack::push)/[`pop`](TransformStack::pop) pair is still
//! available; `pop` on an empty stack reports [`TransformError::Underflow`].

use glam::{Mat4, Vec3};

use crate::error::TransformError;

/// Axis of an elementary rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Axis {
    X,
    Y,
    Z,
    /// Any other axis. Normalized before use.
    Custom(Vec3),
}

impl Axis {
    /// The rotation matrix for `angle` radians about this axis.
    pub fn rotation(self, angle: f32) -> Mat4 {
        match self {
            Axis::X => Mat4::from_rotation_x(angle),
            Axis::Y => Mat4::from_rotation_y(angle),
            Axis::Z => Mat4::from_rotation_z(angle),
            Axis::Custom(axis) => Mat4::from_axis_angle(axis.normalize_or_zero(), angle),
        }
    }
}

/// A 4×4 affine transform.
///
/// Composition is matrix multiplication and [`Transform::IDENTITY`] is the
/// neutral element. `Transform` is `Copy`: taking a value is always a
/// snapshot, never a live view of someone else's working matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    matrix: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        matrix: Mat4::IDENTITY,
    };

    /// Wraps an existing matrix.
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix }
    }

    /// A pure translation.
    pub fn from_translation(offset: Vec3) -> Self {
        Self::from_matrix(Mat4::from_translation(offset))
    }

    /// A pure (possibly non-uniform) scale.
    pub fn from_scale(scale: Vec3) -> Self {
        Self::from_matrix(Mat4::from_scale(scale))
    }

    /// The underlying matrix, column-major.
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// `self * translate(offset)`.
    pub fn translated(self, offset: Vec3) -> Self {
        Self::from_matrix(self.matrix * Mat4::from_translation(offset))
    }

    /// `self * rotate(axis, angle)`.
    pub fn rotated(self, axis: Axis, angle: f32) -> Self {
        Self::from_matrix(self.matrix * axis.rotation(angle))
    }

    /// `self * scale(factors)`.
    pub fn scaled(self, factors: Vec3) -> Self {
        Self::from_matrix(self.matrix * Mat4::from_scale(factors))
    }

    /// `self * child`: places `child` inside this frame.
    pub fn then(self, child: Transform) -> Self {
        Self::from_matrix(self.matrix * child.matrix)
    }

    /// Maps a local-space point into this transform's parent space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.matrix.transform_point3(point)
    }

    /// The translation column.
    pub fn translation(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }

    /// Element-wise comparison within `epsilon`.
    pub fn abs_diff_eq(&self, other: &Transform, epsilon: f32) -> bool {
        self.matrix.abs_diff_eq(other.matrix, epsilon)
    }
}

impl std::ops::Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.then(rhs)
    }
}

/// A working transform with a LIFO history of saved copies.
///
/// `push` saves a copy of the current transform; `pop` restores that copy
/// verbatim. Restoration is by value, not by undoing operations, so any
/// balanced sequence of pushes and pops leaves [`current`](Self::current)
/// exactly as it was.
#[derive(Clone, Debug, Default)]
pub struct TransformStack {
    current: Transform,
    saved: Vec<Transform>,
}

impl TransformStack {
    /// A stack whose working transform is the identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stack rooted at `root` instead of the identity.
    pub fn with_root(root: Transform) -> Self {
        Self {
            current: root,
            saved: Vec::new(),
        }
    }

    /// Drops all saved entries and resets the working transform to identity.
    pub fn reset(&mut self) {
        self.current = Transform::IDENTITY;
        self.saved.clear();
    }

    /// The working transform.
    pub fn current(&self) -> Transform {
        self.current
    }

    /// Replaces the working transform, leaving saved entries untouched.
    pub fn load(&mut self, transform: Transform) {
        self.current = transform;
    }

    /// Number of saved entries.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Saves a copy of the working transform.
    pub fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Restores the most recently saved transform.
    pub fn pop(&mut self) -> Result<(), TransformError> {
        self.current = self.saved.pop().ok_or(TransformError::Underflow)?;
        Ok(())
    }

    /// Runs `f` between a push and its matching pop.
    ///
    /// Whatever `f` does to the working transform is discarded on return.
    /// Pushes that `f` leaves unmatched are discarded too; debug builds
    /// assert that `f` was balanced.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.saved.len();
        let saved = self.current;
        self.saved.push(saved);

        let out = f(self);

        debug_assert_eq!(
            self.saved.len(),
            depth + 1,
            "unbalanced push/pop inside scoped transform block"
        );
        self.saved.truncate(depth);
        self.current = saved;
        out
    }

    /// Right-multiplies the working transform by a translation.
    pub fn translate(&mut self, offset: Vec3) {
        self.current = self.current.translated(offset);
    }

    /// Right-multiplies the working transform by a rotation.
    pub fn rotate(&mut self, axis: Axis, angle: f32) {
        self.current = self.current.rotated(axis, angle);
    }

    /// Right-multiplies the working transform by a scale.
    pub fn scale(&mut self, factors: Vec3) {
        self.current = self.current.scaled(factors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_is_neutral() {
        let t = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)).scaled(Vec3::splat(2.0));
        assert_eq!(Transform::IDENTITY * t, t);
        assert_eq!(t * Transform::IDENTITY, t);
    }

    #[test]
    fn operations_right_multiply() {
        // translate then rotate: the rotation happens about the translated origin
        let t = Transform::IDENTITY
            .translated(Vec3::new(0.0, 0.0, 2.0))
            .rotated(Axis::Y, FRAC_PI_2);
        let p = t.transform_point(Vec3::new(0.0, 0.0, 1.0));
        assert!((p - Vec3::new(1.0, 0.0, 2.0)).length() < 1e-5);

        // rotate then translate moves along the rotated axis instead
        let t = Transform::IDENTITY
            .rotated(Axis::Y, FRAC_PI_2)
            .translated(Vec3::new(0.0, 0.0, 2.0));
        let p = t.transform_point(Vec3::ZERO);
        assert!((p - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn custom_axis_matches_builtin() {
        let a = Transform::IDENTITY.rotated(Axis::Custom(Vec3::new(0.0, 3.0, 0.0)), 0.7);
        let b = Transform::IDENTITY.rotated(Axis::Y, 0.7);
        assert!(a.abs_diff_eq(&b, 1e-6));
    }

    #[test]
    fn pop_on_empty_stack_underflows() {
        let mut stack = TransformStack::new();
        assert_eq!(stack.pop(), Err(TransformError::Underflow));

        stack.push();
        assert_eq!(stack.pop(), Ok(()));
        assert_eq!(stack.pop(), Err(TransformError::Underflow));
    }

    #[test]
    fn pop_restores_exact_copy() {
        let mut stack = TransformStack::new();
        stack.translate(Vec3::new(0.3, 0.1, 0.7));
        stack.rotate(Axis::X, 0.123);
        let before = stack.current();

        stack.push();
        stack.rotate(Axis::X, -0.123);
        stack.translate(Vec3::new(-0.3, -0.1, -0.7));
        stack.pop().unwrap();

        // bit-for-bit, not merely approximately undone
        assert_eq!(stack.current(), before);
    }

    #[test]
    fn scoped_discards_inner_changes() {
        let mut stack = TransformStack::with_root(Transform::from_translation(Vec3::X));
        let before = stack.current();
        let inner = stack.scoped(|s| {
            s.scale(Vec3::splat(4.0));
            s.current()
        });
        assert_ne!(inner, before);
        assert_eq!(stack.current(), before);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutation() {
        let mut stack = TransformStack::new();
        stack.translate(Vec3::new(0.0, 1.0, 2.5));
        stack.rotate(Axis::X, 0.2);
        let snapshot = stack.current();

        stack.scoped(|s| {
            s.rotate(Axis::Z, 1.0);
            s.scoped(|s| s.scale(Vec3::new(1.0, 0.1, 0.1)));
        });
        stack.translate(Vec3::new(5.0, 5.0, 5.0));

        assert_ne!(stack.current(), snapshot);
        stack.load(snapshot);
        assert_eq!(stack.current(), snapshot);
    }

    #[derive(Clone, Debug)]
    enum StackOp {
        Translate(Vec3),
        Rotate(u8, f32),
        Scale(Vec3),
        Nested(Vec<StackOp>),
    }

    fn vec3() -> impl Strategy<Value = Vec3> {
        (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    fn stack_op() -> impl Strategy<Value = StackOp> {
        let leaf = prop_oneof![
            vec3().prop_map(StackOp::Translate),
            (0u8..3, -6.3f32..6.3).prop_map(|(a, r)| StackOp::Rotate(a, r)),
            vec3().prop_map(StackOp::Scale),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop::collection::vec(inner, 0..6).prop_map(StackOp::Nested)
        })
    }

    fn run(stack: &mut TransformStack, op: &StackOp) {
        match op {
            StackOp::Translate(v) => stack.translate(*v),
            StackOp::Rotate(a, r) => {
                let axis = [Axis::X, Axis::Y, Axis::Z][*a as usize];
                stack.rotate(axis, *r);
            }
            StackOp::Scale(v) => stack.scale(*v),
            StackOp::Nested(ops) => {
                stack.push();
                for op in ops {
                    run(stack, op);
                }
                stack.pop().unwrap();
            }
        }
    }

    proptest! {
        #[test]
        fn balanced_push_pop_restores_current(
            prefix in prop::collection::vec(stack_op(), 0..4),
            body in prop::collection::vec(stack_op(), 0..8),
        ) {
            let mut stack = TransformStack::new();
            for op in &prefix {
                run(&mut stack, op);
            }
            let before = stack.current();
            let depth = stack.depth();

            run(&mut stack, &StackOp::Nested(body));

            prop_assert_eq!(stack.current(), before);
            prop_assert_eq!(stack.depth(), depth);
        }
    }
}
