//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop, the windows and the single coordinator, and
//! drives the coordinator's frame loop from the event loop.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, WindowConfig};

pub(crate) use runtime::WindowSlot;
