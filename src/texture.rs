use std::path::Path;

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::gpu::GpuContext;

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a mipmapped texture from raw RGBA data.
    ///
    /// The full chain down to 1×1 is built on the CPU and uploaded in one go,
    /// so small distant parts sample a filtered level instead of aliasing.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let (levels, chain) = mip_chain(data, width, height);
        log::debug!("{label}: {width}x{height}, {levels} mip levels");

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: levels,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &chain,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // trilinear: blend between the two nearest levels
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// Load a texture from an image file.
    pub fn from_file(gpu: &GpuContext, path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        let path = path.as_ref();
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(gpu, &img, width, height, &path.display().to_string()))
    }

    /// A 1×1 white texture, bound wherever a draw is untextured.
    pub fn white(gpu: &GpuContext) -> Self {
        Self::from_rgba(gpu, &[255; 4], 1, 1, "White Texture")
    }

    /// The procedural brushed-metal grille texture.
    pub fn grille(gpu: &GpuContext, size: u32) -> Self {
        let data = grille_pixels(size);
        Self::from_rgba(gpu, &data, size, size, "Grille Texture")
    }
}

/// Number of levels in a full mip chain for a `width × height` base.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Base level followed by each successively halved level, packed level after
/// level as `create_texture_with_data` expects.
///
/// Returns the level count with the packed bytes. Data that does not match
/// `width × height` RGBA8 is passed through as a single level.
pub fn mip_chain(data: &[u8], width: u32, height: u32) -> (u32, Vec<u8>) {
    let Some(base) = RgbaImage::from_raw(width, height, data.to_vec()) else {
        log::warn!("texture data does not match {width}x{height} RGBA8, skipping mipmaps");
        return (1, data.to_vec());
    };

    let levels = mip_level_count(width, height);
    let mut chain = base.as_raw().clone();
    let mut level = base;
    for _ in 1..levels {
        let w = (level.width() / 2).max(1);
        let h = (level.height() / 2).max(1);
        level = imageops::resize(&level, w, h, FilterType::Triangle);
        chain.extend_from_slice(level.as_raw());
    }
    (levels, chain)
}

/// Concentric-ring pattern with fine radial spokes and per-pixel grain.
///
/// Returns `size × size` RGBA8 pixels. Values stay light so the texture
/// modulates the base color instead of replacing it.
pub fn grille_pixels(size: u32) -> Vec<u8> {
    let size = size.max(1);
    let mut data = vec![0u8; (size * size * 4) as usize];
    let half = size as f32 * 0.5;

    for y in 0..size {
        for x in 0..size {
            let idx = ((y * size + x) * 4) as usize;
            let dx = (x as f32 + 0.5 - half) / half;
            let dy = (y as f32 + 0.5 - half) / half;
            let r = (dx * dx + dy * dy).sqrt();
            let theta = dy.atan2(dx);

            let ring = (r * 24.0 * std::f32::consts::PI).cos() * 0.5 + 0.5;
            let spoke = (theta * 18.0).cos().abs().powf(8.0);
            let grain = (hash(x, y, 0x9e37) % 24) as f32 - 12.0;

            let v = 200.0 + 40.0 * ring - 30.0 * spoke + grain;
            let v = v.clamp(0.0, 255.0) as u8;
            data[idx] = v;
            data[idx + 1] = v;
            data[idx + 2] = v.saturating_add(6);
            data[idx + 3] = 255;
        }
    }

    data
}

fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add(x.wrapping_mul(374761393));
    h = h.wrapping_add(y.wrapping_mul(668265263));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}
