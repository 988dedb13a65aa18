use wgpu::util::DeviceExt;

use crate::scene::Texture;

pub(crate) const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Device-side copy of a `Texture`, every mip level included.
pub(crate) struct GpuTexture {
    pub view: wgpu::TextureView,
    _texture: wgpu::Texture,
}

impl GpuTexture {
    /// Returns the cached texture, uploading on first use.
    pub fn get_or_upload<'t>(device: &wgpu::Device, queue: &wgpu::Queue, texture: &'t Texture) -> &'t GpuTexture {
        texture.gpu.get_or_init(|| {
            log::trace!(
                "uploading {} texture ({:?}, {} mips)",
                texture.label(),
                texture.size(),
                texture.mip_level_count()
            );
            Self::upload(device, queue, texture)
        })
    }

    fn upload(device: &wgpu::Device, queue: &wgpu::Queue, texture: &Texture) -> Self {
        let (width, height) = texture.size();
        let gpu = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("vitrine material texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: texture.mip_level_count(),
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &texture.mip_chain(),
        );

        Self {
            view: gpu.create_view(&wgpu::TextureViewDescriptor::default()),
            _texture: gpu,
        }
    }
}

/// Repeating trilinear sampler; anisotropy above 1 needs linear filters.
pub(crate) fn material_sampler(device: &wgpu::Device, anisotropy_clamp: u16) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("vitrine material sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        anisotropy_clamp,
        ..Default::default()
    })
}
