//! Camera controls driven by pointer input.
//!
//! Controls consume `InputEvent`s and accumulate motion; the frame driver
//! applies it through `Updatable::update`, once per drawn frame.

mod orbit;

pub use orbit::{OrbitControls, OrbitSettings};

use crate::coordinator::Updatable;
use crate::input::InputEvent;

/// Viewport size in logical pixels (the basis of pointer coordinates).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Converts a physical size to logical pixels.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 { scale_factor } else { 1.0 };
        Self::new((width as f64 / scale) as f32, (height as f64 / scale) as f32)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

/// Input-driven camera controller attached to a mount.
pub trait Controls: Updatable {
    fn handle_event(&mut self, event: &InputEvent);

    fn set_viewport(&mut self, viewport: Viewport);

    /// Drops any in-progress gesture (pointer released outside, focus lost).
    fn cancel(&mut self) {}
}
