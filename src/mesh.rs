//! GPU mesh buffers and the fan's mesh library.
//!
//! # Vertex Layout
//!
//! [`Vertex3d`] is 32 bytes per vertex:
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |

use crate::geometry;
use crate::gpu::GpuContext;
use crate::rig::{FanRig, MeshKind};

/// A vertex with position, normal, and texture coordinates.
///
/// `#[repr(C)]` plus [`bytemuck::Pod`] so a slice of these can be uploaded
/// directly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    /// Unit surface normal.
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// The wgpu vertex buffer layout for [`Vertex3d`].
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// GPU-resident geometry. Immutable after creation.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Uploads vertices and u32 triangle indices.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// Sphere tessellation: bands pole to pole and around the equator.
pub const SPHERE_BANDS: (u32, u32) = (24, 36);
/// Slices around the housing cylinder.
pub const CYLINDER_SLICES: u32 = 32;

/// The three meshes the fan is built from, uploaded once.
pub struct MeshLibrary {
    cube: Mesh,
    sphere: Mesh,
    cylinder: Mesh,
}

impl MeshLibrary {
    pub fn new(gpu: &GpuContext, rig: &FanRig) -> Self {
        let (lat, lon) = SPHERE_BANDS;
        let library = Self {
            cube: geometry::cube().upload(gpu),
            sphere: geometry::sphere(lat, lon).upload(gpu),
            cylinder: geometry::cylinder(CYLINDER_SLICES, rig.housing_radius, rig.housing_height)
                .upload(gpu),
        };
        log::debug!(
            "uploaded meshes: cube {} / sphere {} / cylinder {} indices",
            library.cube.index_count,
            library.sphere.index_count,
            library.cylinder.index_count
        );
        library
    }

    pub fn get(&self, kind: MeshKind) -> &Mesh {
        match kind {
            MeshKind::Box => &self.cube,
            MeshKind::Sphere => &self.sphere,
            MeshKind::Cylinder => &self.cylinder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex3d>(), 32);
        assert_eq!(Vertex3d::LAYOUT.array_stride, 32);
        assert_eq!(Vertex3d::LAYOUT.attributes.len(), 3);
    }

    #[test]
    fn vertices_cast_to_bytes() {
        let vertices = [Vertex3d::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.5])];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..4], &1.0f32.to_ne_bytes());
    }
}
