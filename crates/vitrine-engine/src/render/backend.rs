use std::collections::HashMap;
use std::time::Instant;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::WindowId;

use crate::coordinator::RenderBackend;
use crate::device::{FatalSurfaceError, GpuContext, SurfaceErrorAction, TargetSurface};
use crate::render::{CanvasTarget, CenterCircleRenderer, MeshRenderer, RenderCtx, RenderTarget};
use crate::scene::{PerspectiveCamera, Scene};

/// Production backend: one wgpu device presenting to many windows.
///
/// Each bound window gets its own lazily created surface; pipelines and
/// uniform buffers are shared across all of them.
pub struct WgpuBackend {
    gpu: GpuContext,
    surfaces: HashMap<WindowId, TargetSurface>,
    current: Option<WindowId>,
    meshes: MeshRenderer,
    center_circle: CenterCircleRenderer,
    epoch: Instant,
}

impl WgpuBackend {
    pub fn new(gpu: GpuContext) -> Self {
        Self {
            gpu,
            surfaces: HashMap::new(),
            current: None,
            meshes: MeshRenderer::new(),
            center_circle: CenterCircleRenderer::new(),
            epoch: Instant::now(),
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Drops the surface of a closed window.
    pub fn release_target(&mut self, id: WindowId) {
        if self.surfaces.remove(&id).is_some() {
            log::debug!("released surface for {id:?}");
        }
        if self.current == Some(id) {
            self.current = None;
        }
    }
}

impl RenderBackend for WgpuBackend {
    type Target = CanvasTarget;
    type Scene = Scene;
    type Camera = PerspectiveCamera;

    fn bind_target(&mut self, target: &CanvasTarget) -> Result<()> {
        let id = target.id();
        if !self.surfaces.contains_key(&id) {
            let surface = self.gpu.create_surface(target.window().clone())?;
            self.surfaces.insert(id, surface);
        }
        self.current = Some(id);
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) -> Result<()> {
        let id = self.current.context("no output target bound")?;
        let surface = self
            .surfaces
            .get_mut(&id)
            .context("bound output target has no surface")?;
        surface.resize(self.gpu.device(), PhysicalSize::new(width, height));
        Ok(())
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()> {
        let time = self.epoch.elapsed().as_secs_f32();
        let id = self.current.context("no output target bound")?;
        let surface = self
            .surfaces
            .get_mut(&id)
            .context("bound output target has no surface")?;
        if !surface.is_configured() {
            log::trace!("skipping {:?}: target has zero size", scene.name);
            return Ok(());
        }

        let mut frame = match surface.begin_frame(self.gpu.device()) {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(()),
            Err(err) => {
                return match surface.handle_surface_error(self.gpu.device(), &err) {
                    SurfaceErrorAction::Fatal => Err(FatalSurfaceError(err).into()),
                    action => {
                        log::warn!("skipping frame for {:?}: {err} ({action:?})", scene.name);
                        Ok(())
                    }
                };
            }
        };

        let size = surface.size();
        let ctx = RenderCtx {
            device: self.gpu.device(),
            queue: self.gpu.queue(),
            surface_format: surface.format(),
            sample_count: surface.sample_count(),
            width: size.width,
            height: size.height,
            time,
        };

        {
            let mut target = RenderTarget::from_frame(&mut frame);
            self.meshes.render(&ctx, &mut target, scene, camera);
            if let Some(circle) = scene.effects.center_circle.as_ref() {
                self.center_circle.render(&ctx, &mut target, circle);
            }
        }

        surface.submit(self.gpu.queue(), frame);
        Ok(())
    }
}
