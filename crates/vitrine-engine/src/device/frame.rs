/// A single acquired surface frame with its attachments.
///
/// This object is short-lived and must be submitted promptly. Holding the
/// surface texture prevents acquisition of subsequent frames.
pub struct TargetFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    /// Swapchain view; the resolve target when `msaa` is set.
    pub view: wgpu::TextureView,
    pub msaa: Option<wgpu::TextureView>,
    pub depth: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

