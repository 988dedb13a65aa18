//! Mount adapters: per-view lifecycle glue between UI events and the
//! coordinator.

mod adapter;

pub use adapter::{Mount, MountMode, MountParts};
