//! Frame timing.
//!
//! The runtime owns one `FrameClock` for the frame driver and hands the
//! resulting `FrameTime` to every updatable advanced during a tick.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
