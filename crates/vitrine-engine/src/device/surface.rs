use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;

use super::{DeviceConfig, SurfaceErrorAction, TargetFrame};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// One window's swapchain plus its depth and MSAA attachments.
///
/// A fresh surface is unconfigured until it receives a non-zero size; wgpu
/// does not accept a 0x0 configuration.
pub struct TargetSurface {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    configured: bool,
    sample_count: u32,
    attachments: Option<Attachments>,
}

struct Attachments {
    depth: wgpu::TextureView,
    msaa: Option<wgpu::TextureView>,
}

impl TargetSurface {
    pub(crate) fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        init: &DeviceConfig,
    ) -> Result<Self> {
        let caps = surface.get_capabilities(adapter);
        let format = choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = choose_alpha_mode(&caps, init.alpha_mode);

        let color_flags = adapter.get_texture_format_features(format).flags;
        let depth_flags = adapter.get_texture_format_features(DEPTH_FORMAT).flags;
        let sample_count = init.sample_count(color_flags).min(init.sample_count(depth_flags));

        log::debug!("surface format {format:?}, alpha {alpha_mode:?}, {sample_count}x samples");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: 1,
            height: 1,
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        Ok(Self {
            surface,
            config,
            size: PhysicalSize::new(0, 0),
            configured: false,
            sample_count,
            attachments: None,
        })
    }

    /// Returns the surface format.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Reconfigures the surface when the size changed.
    ///
    /// A zero-sized request only updates internal state and defers
    /// configuration.
    pub fn resize(&mut self, device: &wgpu::Device, new_size: PhysicalSize<u32>) {
        if new_size == self.size && self.configured {
            return;
        }

        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(device, &self.config);
        self.attachments = Some(self.create_attachments(device));
        self.configured = true;
        log::debug!("surface configured at {}x{}", new_size.width, new_size.height);
    }

    /// Acquires the next swapchain texture and creates an encoder.
    ///
    /// Returns `Ok(None)` while the surface is unconfigured.
    pub fn begin_frame(
        &self,
        device: &wgpu::Device,
    ) -> std::result::Result<Option<TargetFrame>, wgpu::SurfaceError> {
        let Some(attachments) = self.attachments.as_ref().filter(|_| self.configured) else {
            return Ok(None);
        };

        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("vitrine frame encoder"),
        });

        Ok(Some(TargetFrame {
            surface_texture,
            view,
            msaa: attachments.msaa.clone(),
            depth: attachments.depth.clone(),
            encoder,
        }))
    }

    /// Submits the recorded commands and presents the frame.
    pub fn submit(&self, queue: &wgpu::Queue, frame: TargetFrame) {
        queue.submit(std::iter::once(frame.encoder.finish()));
        frame.surface_texture.present();
    }

    /// Converts a `SurfaceError` into a higher-level action, reconfiguring
    /// when the swapchain went stale.
    pub fn handle_surface_error(
        &mut self,
        device: &wgpu::Device,
        err: &wgpu::SurfaceError,
    ) -> SurfaceErrorAction {
        let action = SurfaceErrorAction::from_error(err);
        if action == SurfaceErrorAction::Reconfigured && self.size.width > 0 && self.size.height > 0 {
            self.surface.configure(device, &self.config);
        }
        action
    }

    fn create_attachments(&self, device: &wgpu::Device) -> Attachments {
        let size = wgpu::Extent3d {
            width: self.config.width,
            height: self.config.height,
            depth_or_array_layers: 1,
        };

        let texture = |label: &str, format: wgpu::TextureFormat| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size,
                    mip_level_count: 1,
                    sample_count: self.sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };

        Attachments {
            depth: texture("vitrine depth", DEPTH_FORMAT),
            msaa: (self.sample_count > 1).then(|| texture("vitrine msaa color", self.config.format)),
        }
    }
}

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}
