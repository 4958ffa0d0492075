//! CPU-side primitive generators for the fan's meshes.
//!
//! Every part of the fan is one of three shapes, built here as
//! [`RawGeometry`] and uploaded once at startup:
//!
//! | Shape    | Extent                                   | Used by                 |
//! |----------|------------------------------------------|-------------------------|
//! | cube     | ±1 on every axis                         | pole, arm, hub, blades  |
//! | sphere   | radius 1                                 | dome, rim, rings        |
//! | cylinder | radius `r`, height `h`, centred on Y      | motor housing           |
//!
//! Sizes come from the per-part scale in the rig, which is why the cube and
//! sphere are unit-sized around the origin.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex3d};

/// Raw geometry data before GPU upload.
#[derive(Clone, Debug)]
pub struct RawGeometry {
    pub vertices: Vec<Vertex3d>,
    /// Triangle indices, counter-clockwise front faces.
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        let (min, max) = self.bounds();
        max - min
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Uploads this geometry to the GPU as a [`Mesh`].
    pub fn upload(&self, gpu: &GpuContext) -> Mesh {
        Mesh::new(gpu, &self.vertices, &self.indices)
    }

    /// Appends `other`, rebasing its indices.
    fn append(&mut self, other: RawGeometry) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }
}

/// A cube spanning ±1, four vertices per face for flat normals.
pub fn cube() -> RawGeometry {
    // (normal, tangent u, tangent v) per face; u × v = normal keeps CCW winding
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut geometry = RawGeometry::new(Vec::with_capacity(24), Vec::with_capacity(36));
    for (normal, u, v) in faces {
        let base = geometry.vertices.len() as u32;
        for (s, t) in corners {
            let position = normal + u * s + v * t;
            geometry.vertices.push(Vertex3d::new(
                position.into(),
                normal.into(),
                [(s + 1.0) * 0.5, (1.0 - t) * 0.5],
            ));
        }
        geometry
            .indices
            .extend([base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    geometry
}

/// A unit-radius UV sphere.
///
/// `lat_bands` divisions pole to pole, `lon_bands` around the equator. Both
/// are clamped to at least 2 and 3.
pub fn sphere(lat_bands: u32, lon_bands: u32) -> RawGeometry {
    let lat_bands = lat_bands.max(2);
    let lon_bands = lon_bands.max(3);
    let mut vertices = Vec::with_capacity(((lat_bands + 1) * (lon_bands + 1)) as usize);
    let mut indices = Vec::with_capacity((lat_bands * lon_bands * 6) as usize);

    for lat in 0..=lat_bands {
        let phi = PI * lat as f32 / lat_bands as f32;
        let (ring_radius, y) = phi.sin_cos();

        for lon in 0..=lon_bands {
            let theta = TAU * lon as f32 / lon_bands as f32;
            let (sin_t, cos_t) = theta.sin_cos();
            let p = [ring_radius * cos_t, y, ring_radius * sin_t];
            let uv = [lon as f32 / lon_bands as f32, lat as f32 / lat_bands as f32];
            vertices.push(Vertex3d::new(p, p, uv));
        }
    }

    let stride = lon_bands + 1;
    for lat in 0..lat_bands {
        for lon in 0..lon_bands {
            let current = lat * stride + lon;
            let next = current + stride;
            indices.extend([current, current + 1, next]);
            indices.extend([current + 1, next + 1, next]);
        }
    }

    RawGeometry::new(vertices, indices)
}

/// A capped cylinder along Y, centred on the origin.
pub fn cylinder(slices: u32, radius: f32, height: f32) -> RawGeometry {
    let slices = slices.max(3);
    let half = height * 0.5;
    let mut geometry = RawGeometry::new(Vec::new(), Vec::new());

    // side wall, seam duplicated for the wrap-around UV
    for i in 0..=slices {
        let u = i as f32 / slices as f32;
        let (sin_t, cos_t) = (TAU * u).sin_cos();
        let normal = [cos_t, 0.0, sin_t];
        let x = radius * cos_t;
        let z = radius * sin_t;
        geometry
            .vertices
            .push(Vertex3d::new([x, -half, z], normal, [u, 1.0]));
        geometry
            .vertices
            .push(Vertex3d::new([x, half, z], normal, [u, 0.0]));
    }
    for i in 0..slices {
        let b0 = i * 2;
        let t0 = b0 + 1;
        let b1 = b0 + 2;
        let t1 = b0 + 3;
        geometry.indices.extend([b0, t0, b1, b1, t0, t1]);
    }

    geometry.append(disc(slices, radius, half, Vec3::Y));
    geometry.append(disc(slices, radius, -half, Vec3::NEG_Y));
    geometry
}

/// A triangle fan cap facing `normal` at height `y`.
fn disc(slices: u32, radius: f32, y: f32, normal: Vec3) -> RawGeometry {
    let mut vertices = vec![Vertex3d::new([0.0, y, 0.0], normal.into(), [0.5, 0.5])];
    for i in 0..=slices {
        let (sin_t, cos_t) = (TAU * i as f32 / slices as f32).sin_cos();
        vertices.push(Vertex3d::new(
            [radius * cos_t, y, radius * sin_t],
            normal.into(),
            [0.5 + 0.5 * cos_t, 0.5 + 0.5 * sin_t],
        ));
    }

    let mut indices = Vec::with_capacity(slices as usize * 3);
    let facing_up = normal.y > 0.0;
    for i in 1..=slices {
        if facing_up {
            indices.extend([0, i + 1, i]);
        } else {
            indices.extend([0, i, i + 1]);
        }
    }
    RawGeometry::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ccw_outward(geometry: &RawGeometry) {
        for tri in geometry.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| geometry.vertices[i as usize]);
            let p0 = Vec3::from(a.position);
            let face = (Vec3::from(b.position) - p0).cross(Vec3::from(c.position) - p0);
            if face.length_squared() < 1e-12 {
                continue; // degenerate pole triangles
            }
            let normal = Vec3::from(a.normal) + Vec3::from(b.normal) + Vec3::from(c.normal);
            assert!(face.dot(normal) > 0.0, "inward triangle {tri:?}");
        }
    }

    #[test]
    fn raw_geometry_bounds() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([-1.0, -1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let geom = RawGeometry::new(vertices, vec![0, 1, 2]);

        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(geom.center(), Vec3::new(0.0, 0.5, 1.0));
    }

    #[test]
    fn cube_spans_plus_minus_one() {
        let cube = cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.bounds(), (Vec3::splat(-1.0), Vec3::splat(1.0)));
        assert_ccw_outward(&cube);
    }

    #[test]
    fn sphere_has_unit_radius() {
        let sphere = sphere(16, 24);
        assert_eq!(sphere.vertices.len(), 17 * 25);
        assert_eq!(sphere.triangle_count(), 16 * 24 * 2);
        for v in &sphere.vertices {
            assert!((Vec3::from(v.position).length() - 1.0).abs() < 1e-5);
        }
        assert!(sphere.center().length() < 1e-5);
        assert_ccw_outward(&sphere);
    }

    #[test]
    fn cylinder_is_centred() {
        let cylinder = cylinder(20, 0.35, 0.5);
        let (min, max) = cylinder.bounds();
        assert!((min.y + 0.25).abs() < 1e-6);
        assert!((max.y - 0.25).abs() < 1e-6);
        assert!((max.x - 0.35).abs() < 1e-5);
        // wall + two caps
        assert_eq!(cylinder.triangle_count(), 20 * 2 + 20 * 2);
        assert_ccw_outward(&cylinder);
    }

    #[test]
    fn tessellation_is_clamped() {
        assert_eq!(sphere(0, 0).triangle_count(), 2 * 3 * 2);
        assert_eq!(cylinder(1, 1.0, 1.0).triangle_count(), 3 * 2 + 3 * 2);
    }
}
