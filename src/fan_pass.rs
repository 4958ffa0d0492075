//! The wgpu render pass that replays a frame's [`DrawQueue`].
//!
//! The traversal records every draw into a [`DrawQueue`] first; this pass
//! then uploads one block of per-draw uniforms and issues the draws in the
//! same order, switching pipeline whenever the recorded [`RenderPass`]
//! changes.
//!
//! # Bind groups
//!
//! - **Group 0**: scene uniforms (view-projection, camera and light position,
//!   lighting terms)
//! - **Group 1**: model uniforms, one 256-byte-aligned slot per draw, bound
//!   with a dynamic offset
//! - **Group 2**: texture and sampler. The fan texture for textured draws,
//!   a 1×1 white texture otherwise.
//!
//! # Pipelines
//!
//! | Pass          | Blend           | Depth write | Depth test |
//! |---------------|-----------------|-------------|------------|
//! | `Opaque`      | replace         | on          | `Less`     |
//! | `Translucent` | alpha blending  | off         | `Less`     |

use std::num::NonZeroU64;

use crate::camera::Camera;
use crate::dispatch::{DrawQueue, RenderPass};
use crate::gpu::GpuContext;
use crate::material::Lighting;
use crate::mesh::{MeshLibrary, Vertex3d};
use crate::texture::Texture;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Scene-wide uniforms, written once per frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub light_pos: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    /// `w` carries the shininess exponent.
    pub specular: [f32; 4],
}

impl SceneUniforms {
    pub fn new(camera: &Camera, aspect: f32, lighting: &Lighting) -> Self {
        Self {
            view_proj: camera.view_projection(aspect).to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            light_pos: lighting.light_position.extend(1.0).to_array(),
            ambient: lighting.ambient.extend(0.0).to_array(),
            diffuse: lighting.diffuse.extend(0.0).to_array(),
            specular: lighting.specular.extend(lighting.shininess).to_array(),
        }
    }
}

/// Per-draw uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`, so non-uniform scales keep normals right.
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// `x` is 1.0 when the draw samples the texture.
    pub flags: [f32; 4],
}

const MODEL_SIZE: u64 = std::mem::size_of::<ModelUniforms>() as u64;

/// Renders the fan with depth testing and two blend states.
pub struct FanPass {
    opaque_pipeline: wgpu::RenderPipeline,
    translucent_pipeline: wgpu::RenderPipeline,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    model_layout: wgpu::BindGroupLayout,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_stride: u64,
    model_capacity: usize,
    fan_texture: Option<wgpu::BindGroup>,
    white_texture: wgpu::BindGroup,
    pub(crate) depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl FanPass {
    /// Builds both pipelines. `texture` is the shared surface texture, if
    /// one loaded.
    pub fn new(gpu: &GpuContext, texture: Option<&Texture>) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fan Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/fan.wgsl").into()),
        });

        // Scene uniform buffer (group 0)
        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        // Model uniforms (group 1), dynamic offset per draw
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(MODEL_SIZE),
                },
                count: None,
            }],
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let model_stride = align_to(MODEL_SIZE, alignment);
        // 19 parts per frame; start with headroom
        let model_capacity = 32;
        let (model_buffer, model_bind_group) =
            Self::create_model_buffer(device, &model_layout, model_stride, model_capacity);

        // Texture bind group layout (group 2)
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let white = Texture::white(gpu);
        let white_texture = Self::create_texture_bind_group(device, &texture_layout, &white);
        let fan_texture =
            texture.map(|t| Self::create_texture_bind_group(device, &texture_layout, t));

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Fan Pipeline Layout"),
            bind_group_layouts: &[&scene_layout, &model_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let opaque_pipeline =
            Self::create_pipeline(gpu, &pipeline_layout, &shader, RenderPass::Opaque);
        let translucent_pipeline =
            Self::create_pipeline(gpu, &pipeline_layout, &shader, RenderPass::Translucent);

        let depth_view = Self::create_depth_view(gpu);

        Self {
            opaque_pipeline,
            translucent_pipeline,
            scene_buffer,
            scene_bind_group,
            model_layout,
            model_buffer,
            model_bind_group,
            model_stride,
            model_capacity,
            fan_texture,
            white_texture,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
        }
    }

    /// Whether the surface texture is bound and can be sampled.
    pub fn texture_ready(&self) -> bool {
        self.fan_texture.is_some()
    }

    fn create_pipeline(
        gpu: &GpuContext,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        pass: RenderPass,
    ) -> wgpu::RenderPipeline {
        let (label, blend) = if pass.blend_enabled() {
            ("Fan Translucent Pipeline", wgpu::BlendState::ALPHA_BLENDING)
        } else {
            ("Fan Opaque Pipeline", wgpu::BlendState::REPLACE)
        };

        gpu.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex3d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: pass.depth_write(),
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn create_model_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(MODEL_SIZE),
                }),
            }],
        });

        (buffer, bind_group)
    }

    fn create_texture_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        texture: &Texture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Fan Texture Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Recreates the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = Self::create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
            log::debug!("depth buffer resized to {}x{}", gpu.width(), gpu.height());
        }
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Uploads scene and per-draw uniforms for `queue`.
    ///
    /// Must run before the render pass that calls [`render`](Self::render)
    /// is opened.
    pub fn prepare(&mut self, gpu: &GpuContext, camera: &Camera, queue: &DrawQueue) {
        let scene = SceneUniforms::new(camera, gpu.aspect(), &queue.lighting);
        gpu.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&scene));

        if queue.draws.len() > self.model_capacity {
            let capacity = queue.draws.len().next_power_of_two();
            let (buffer, bind_group) =
                Self::create_model_buffer(&gpu.device, &self.model_layout, self.model_stride, capacity);
            self.model_buffer = buffer;
            self.model_bind_group = bind_group;
            self.model_capacity = capacity;
            log::debug!("model uniform buffer grown to {capacity} slots");
        }

        let stride = self.model_stride as usize;
        let mut bytes = vec![0u8; stride * queue.draws.len()];
        for (slot, draw) in bytes.chunks_exact_mut(stride).zip(&queue.draws) {
            let command = &draw.command;
            let model = command.world.matrix();
            let uniforms = ModelUniforms {
                model: model.to_cols_array_2d(),
                normal_matrix: model.inverse().transpose().to_cols_array_2d(),
                color: command.base_color.to_array(),
                flags: [if command.use_texture { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
            };
            slot[..MODEL_SIZE as usize].copy_from_slice(bytemuck::bytes_of(&uniforms));
        }
        if !bytes.is_empty() {
            gpu.queue.write_buffer(&self.model_buffer, 0, &bytes);
        }
    }

    /// Issues every queued draw into `render_pass`.
    pub fn render(&self, render_pass: &mut wgpu::RenderPass, queue: &DrawQueue, meshes: &MeshLibrary) {
        render_pass.set_bind_group(0, &self.scene_bind_group, &[]);

        let mut current = None;
        for (i, draw) in queue.draws.iter().enumerate() {
            if current != Some(draw.pass) {
                render_pass.set_pipeline(match draw.pass {
                    RenderPass::Opaque => &self.opaque_pipeline,
                    RenderPass::Translucent => &self.translucent_pipeline,
                });
                current = Some(draw.pass);
            }

            let offset = (i as u64 * self.model_stride) as u32;
            render_pass.set_bind_group(1, &self.model_bind_group, &[offset]);

            let texture = match &self.fan_texture {
                Some(bind_group) if draw.command.use_texture => bind_group,
                _ => &self.white_texture,
            };
            render_pass.set_bind_group(2, texture, &[]);

            let mesh = meshes.get(draw.command.mesh);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn align_to(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}
