use bytemuck::{Pod, Zeroable};

use super::BlendFunction;

/// White disc drawn at the center of the frame.
///
/// `radius` and `feather` are in UV units (the frame spans `0..1` on both
/// axes), so the disc stretches with the target's aspect ratio.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CenterCircle {
    pub radius: f32,
    pub feather: f32,
    pub opacity: f32,
    pub blend: BlendFunction,
}

impl Default for CenterCircle {
    fn default() -> Self {
        Self {
            radius: 0.08,
            feather: 0.005,
            opacity: 1.0,
            blend: BlendFunction::Normal,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CenterCircleUniforms {
    pub radius: f32,
    pub feather: f32,
    pub opacity: f32,
    pub _pad: f32,
}

impl CenterCircle {
    pub fn uniforms(&self) -> CenterCircleUniforms {
        CenterCircleUniforms {
            radius: self.radius.clamp(0.0, 0.5),
            feather: self.feather.max(0.0),
            opacity: self.opacity.clamp(0.0, 1.0),
            _pad: 0.0,
        }
    }

    /// Coverage at `uv`, matching the overlay shader.
    pub fn mask(&self, uv: [f32; 2]) -> f32 {
        let u = self.uniforms();
        let d = ((uv[0] - 0.5).powi(2) + (uv[1] - 0.5).powi(2)).sqrt();
        1.0 - smoothstep(u.radius, u.radius + u.feather, d)
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
