//! Vitrine engine crate.
//!
//! Many small 3D views rendered through one shared GPU device. The
//! coordinator multiplexes registered views onto that device and drives them
//! from a single frame loop; the window runtime feeds it platform events.

pub mod controls;
pub mod coordinator;
pub mod core;
pub mod device;
pub mod effects;
pub mod input;
pub mod logging;
pub mod mount;
pub mod render;
pub mod scene;
pub mod time;
pub mod window;
