use anyhow::Result;

use crate::time::FrameTime;

/// The device-side seam of the coordinator.
///
/// A backend draws one entry at a time into whichever output target is
/// currently bound. Callers go through `SharedDevice`, which always issues
/// `bind_target`, `set_size` and `render` in that order: rebinding without
/// resizing (or resizing before binding) leaves stale pixels on some surfaces.
pub trait RenderBackend {
    /// Output surface an entry renders into.
    type Target;
    /// Opaque scene handed through to `render`.
    type Scene;
    /// Opaque camera handed through to `render`.
    type Camera;

    /// Makes `target` the destination of subsequent size/render calls.
    fn bind_target(&mut self, target: &Self::Target) -> Result<()>;

    /// Applies the drawable size (physical pixels) to the bound target.
    fn set_size(&mut self, width: u32, height: u32) -> Result<()>;

    /// Renders `scene` as seen by `camera` into the bound target.
    fn render(&mut self, scene: &Self::Scene, camera: &Self::Camera) -> Result<()>;
}

/// Per-frame state advance attached to a render entry.
///
/// Invoked by the frame driver after each draw of the owning entry
/// (e.g. camera controls applying damping).
pub trait Updatable {
    fn update(&mut self, time: FrameTime);
}
