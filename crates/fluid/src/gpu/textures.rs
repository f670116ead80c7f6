use image::imageops::{self, FilterType};
use image::RgbaImage;
use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::backend::{GpuError, MinFilter, TextureSampling, TextureUpload, WrapMode};

/// A sampled texture bound as group 1 of the fluid pipeline.
pub(crate) struct GpuTexture {
    pub _texture: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
}

impl GpuTexture {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        max_dimension: u32,
        upload: &TextureUpload<'_>,
    ) -> Result<Self, GpuError> {
        let TextureUpload {
            label,
            width,
            height,
            pixels,
            sampling,
        } = *upload;
        if width == 0 || height == 0 || width > max_dimension || height > max_dimension {
            return Err(GpuError::Allocation(label));
        }
        let Some(base) = RgbaImage::from_raw(width, height, pixels.to_vec()) else {
            return Err(GpuError::Allocation(label));
        };

        let (mip_level_count, data) = if sampling.mipmaps {
            mip_chain(&base)
        } else {
            (1, base.into_raw())
        };

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            &data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_sampler(device, label, sampling);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Ok(Self {
            _texture: texture,
            bind_group,
        })
    }
}

fn create_sampler(device: &wgpu::Device, label: &str, sampling: TextureSampling) -> wgpu::Sampler {
    let address_mode = match sampling.wrap {
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    };
    let mipmap_filter = match sampling.min_filter {
        MinFilter::Linear => wgpu::FilterMode::Nearest,
        MinFilter::LinearMipmapLinear => wgpu::FilterMode::Linear,
    };
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter,
        ..Default::default()
    })
}

/// Number of levels in a full mip chain down to 1x1.
pub(crate) fn mip_level_count(width: u32, height: u32) -> u32 {
    u32::BITS - width.max(height).max(1).leading_zeros()
}

/// Downsamples `base` level by level and concatenates every level, largest
/// first, in the order `create_texture_with_data` expects.
pub(crate) fn mip_chain(base: &RgbaImage) -> (u32, Vec<u8>) {
    let (width, height) = base.dimensions();
    let levels = mip_level_count(width, height);
    let mut data = base.as_raw().clone();
    let mut previous = base.clone();
    for level in 1..levels {
        let level_width = (width >> level).max(1);
        let level_height = (height >> level).max(1);
        previous = imageops::resize(&previous, level_width, level_height, FilterType::Triangle);
        data.extend_from_slice(previous.as_raw());
    }
    (levels, data)
}
