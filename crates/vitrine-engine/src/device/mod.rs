//! GPU device + per-target surface management.
//!
//! This module is responsible for:
//! - creating the one wgpu Instance/Adapter/Device/Queue shared by all targets
//! - creating & configuring a Surface (swapchain) per output window
//! - acquiring frames and mapping surface errors to recovery actions

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::GpuContext;
pub use error::{FatalSurfaceError, SurfaceErrorAction};
pub use frame::TargetFrame;
pub use init::DeviceConfig;
pub use surface::TargetSurface;

pub(crate) use surface::DEPTH_FORMAT;
