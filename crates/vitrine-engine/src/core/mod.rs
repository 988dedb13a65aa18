//! Core engine-facing contracts.
//!
//! This module defines the stable interface between the runtime (platform
//! loop) and the application. The application sees the coordinator, its
//! windows and translated input; it never touches the event loop directly.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::AppCtx;
