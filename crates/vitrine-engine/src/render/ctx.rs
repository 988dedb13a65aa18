use crate::device::TargetFrame;

/// Renderer-facing context for one draw of one target.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub sample_count: u32,
    /// Target size in physical pixels.
    pub width: u32,
    pub height: u32,
    /// Seconds since the backend was created; drives effect animation.
    pub time: f32,
}

impl RenderCtx<'_> {
    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Target for drawing (encoder + attachments of the acquired frame).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// Scene color attachment (multisampled when MSAA is on).
    pub color_view: &'a wgpu::TextureView,
    pub resolve_target: Option<&'a wgpu::TextureView>,
    pub depth_view: &'a wgpu::TextureView,
    /// Single-sampled swapchain view for post passes.
    pub output_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    pub fn from_frame(frame: &'a mut TargetFrame) -> Self {
        let view = &frame.view;
        let (color_view, resolve_target) = match frame.msaa.as_ref() {
            Some(msaa) => (msaa, Some(view)),
            None => (view, None),
        };
        Self {
            encoder: &mut frame.encoder,
            color_view,
            resolve_target,
            depth_view: &frame.depth,
            output_view: view,
        }
    }
}
