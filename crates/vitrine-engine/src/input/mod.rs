//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types. The
//! runtime translates window events into `InputEvent`s, folds them into the
//! per-window `InputState`, then hands them to the app.

mod state;
mod types;
pub(crate) mod platform;

pub use state::InputState;
pub use types::{
    InputEvent,
    Modifiers,
    MouseButton,
    MouseButtonState,
    MouseWheelDelta,
    PointerButtonEvent,
    PointerMoveEvent,
};
