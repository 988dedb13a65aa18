//! Shared multi-target render coordination.
//!
//! Many independent mounts (one per window/card) render through a single
//! backend device:
//! - `Registry` holds live render entries keyed by recycled handles
//! - `SharedDevice` owns the backend once it exists and queues early requests
//! - `FrameDriver` draws every registered entry once per tick while the
//!   registry is non-empty
//! - `Coordinator` ties the three together behind one `&mut` service object

mod backend;
mod driver;
mod entry;
mod lookup;
mod registry;
mod service;
mod shared;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{RenderBackend, Updatable};
pub use driver::{DriverState, FrameDriver, TickOutcome};
pub use entry::RenderEntry;
pub use lookup::Lookup;
pub use registry::{Handle, Registry};
pub use service::Coordinator;
pub use shared::SharedDevice;
