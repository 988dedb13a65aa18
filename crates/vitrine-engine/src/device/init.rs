/// Initialization parameters for the shared GPU device.
///
/// One configuration applies to every output surface; per-surface details
/// (format, sample count) are derived from it when a surface is created.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Request 4x MSAA on surfaces whose format supports it.
    pub antialias: bool,

    /// Request `Features::MULTIVIEW` when the adapter offers it.
    ///
    /// Missing support is logged and ignored.
    pub multiview: bool,

    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// FIFO is broadly supported and paces every surface to the display.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surfaces.
    ///
    /// If provided but unsupported on a surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub power_preference: wgpu::PowerPreference,

    /// Additional wgpu features that must be present.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for each surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            antialias: true,
            multiview: false,
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}

impl DeviceConfig {
    /// Features to request given what the adapter offers.
    pub(crate) fn resolve_features(&self, available: wgpu::Features) -> wgpu::Features {
        let mut features = self.required_features;
        if self.multiview {
            if available.contains(wgpu::Features::MULTIVIEW) {
                features |= wgpu::Features::MULTIVIEW;
            } else {
                log::warn!("multiview requested but not supported by the adapter");
            }
        }
        features
    }

    /// MSAA sample count to use for a color format.
    pub(crate) fn sample_count(&self, flags: wgpu::TextureFormatFeatureFlags) -> u32 {
        if self.antialias && flags.sample_count_supported(4) {
            4
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiview_is_requested_only_when_available() {
        let config = DeviceConfig {
            multiview: true,
            ..Default::default()
        };
        assert!(config.resolve_features(wgpu::Features::MULTIVIEW).contains(wgpu::Features::MULTIVIEW));
        assert!(config.resolve_features(wgpu::Features::empty()).is_empty());
    }

    #[test]
    fn required_features_are_always_kept() {
        let config = DeviceConfig {
            required_features: wgpu::Features::DEPTH_CLIP_CONTROL,
            ..Default::default()
        };
        assert_eq!(config.resolve_features(wgpu::Features::empty()), wgpu::Features::DEPTH_CLIP_CONTROL);
    }

    #[test]
    fn antialias_falls_back_to_single_sample() {
        let msaa = wgpu::TextureFormatFeatureFlags::MULTISAMPLE_X4;
        let on = DeviceConfig::default();
        let off = DeviceConfig {
            antialias: false,
            ..Default::default()
        };
        assert_eq!(on.sample_count(msaa), 4);
        assert_eq!(on.sample_count(wgpu::TextureFormatFeatureFlags::empty()), 1);
        assert_eq!(off.sample_count(msaa), 1);
    }
}
