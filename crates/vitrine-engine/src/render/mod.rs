//! GPU rendering subsystem.
//!
//! `WgpuBackend` implements the coordinator's `RenderBackend` seam. Each
//! renderer is responsible for its own GPU resources (pipelines, buffers),
//! shared across every output surface.
//!
//! Convention:
//! - geometry is right-handed, Y up, counter-clockwise front faces
//! - colors are linear; surfaces prefer sRGB formats

mod backend;
mod ctx;
mod gpu_geometry;
mod gpu_texture;
mod mesh_pass;
mod overlay_pass;
mod target;
mod uniforms;

pub use backend::WgpuBackend;
pub use ctx::{RenderCtx, RenderTarget};
pub use mesh_pass::MeshRenderer;
pub use overlay_pass::CenterCircleRenderer;
pub use target::CanvasTarget;

pub(crate) use gpu_geometry::GpuGeometry;
pub(crate) use gpu_texture::GpuTexture;
