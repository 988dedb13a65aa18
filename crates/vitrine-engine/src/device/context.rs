use std::sync::Arc;

use anyhow::{Context, Result};
use winit::window::Window;

use super::{DeviceConfig, TargetSurface};

/// Owns the wgpu core objects shared by every output surface.
///
/// This type is the low-level rendering context:
/// - creates and stores Instance/Adapter/Device/Queue
/// - creates a Surface per window on demand
///
/// It is created without a compatible surface so that it can be initialized
/// independently of any particular window.
pub struct GpuContext {
    /// wgpu instance used to create the adapter and surfaces.
    instance: wgpu::Instance,

    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    config: DeviceConfig,
}

impl GpuContext {
    /// Creates the shared device.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(config: DeviceConfig) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let required_features = config.resolve_features(adapter.features());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("vitrine shared device"),
                required_features,
                required_limits: config.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            config,
        })
    }

    /// Creates an unconfigured surface for `window`.
    ///
    /// Configuration happens on the first non-zero resize.
    pub fn create_surface(&self, window: Arc<Window>) -> Result<TargetSurface> {
        let surface = self
            .instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;
        TargetSurface::new(surface, &self.adapter, &self.config)
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }
}
