//! Screen-space effects applied after the mesh pass.
//!
//! Effects are plain settings structs. The backend reads them every frame and
//! packs them with `uniforms()`, so mutating a scene's effect takes effect on
//! the next draw.

mod blend;
mod center_circle;
mod outline;

pub use blend::BlendFunction;
pub use center_circle::{CenterCircle, CenterCircleUniforms};
pub use outline::{Outline, OutlineSettings, OutlineUniforms, Selection};

/// Effects enabled on a scene, applied in field order.
#[derive(Debug, Clone, Default)]
pub struct EffectStack {
    pub outline: Option<Outline>,
    pub center_circle: Option<CenterCircle>,
}

impl EffectStack {
    pub fn is_empty(&self) -> bool {
        self.outline.is_none() && self.center_circle.is_none()
    }
}
