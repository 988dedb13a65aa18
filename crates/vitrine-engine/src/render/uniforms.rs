//! CPU mirrors of the WGSL uniform blocks.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};

use crate::scene::{Mesh, PerspectiveCamera, Scene};

pub(crate) const MAX_LIGHTS: usize = 4;

// ── frame ─────────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub ambient: [f32; 4],
    pub light_dirs: [[f32; 4]; MAX_LIGHTS],
    pub light_colors: [[f32; 4]; MAX_LIGHTS],
    pub light_count: [u32; 4],
    pub fog_color: [f32; 4],
    /// `near`, `far`, `1.0` when fog is on, unused.
    pub fog_range: [f32; 4],
}

impl FrameUniform {
    pub fn new(scene: &Scene, camera: &PerspectiveCamera, width: u32, height: u32) -> Self {
        let mut u = Self {
            view_proj: camera.view_projection(width, height).to_cols_array_2d(),
            ambient: scene.ambient.radiance().to_array(),
            light_dirs: [[0.0; 4]; MAX_LIGHTS],
            light_colors: [[0.0; 4]; MAX_LIGHTS],
            light_count: [0; 4],
            fog_color: [0.0; 4],
            fog_range: [0.0; 4],
        };

        if let Some(fog) = scene.fog {
            u.fog_color = fog.color.to_array();
            u.fog_range = [fog.near, fog.far.max(fog.near + f32::EPSILON), 1.0, 0.0];
        }

        if scene.directional_lights.len() > MAX_LIGHTS {
            log::debug!(
                "scene {:?} has {} directional lights; using the first {MAX_LIGHTS}",
                scene.name,
                scene.directional_lights.len()
            );
        }

        let lights = scene.directional_lights.iter().take(MAX_LIGHTS);
        for (i, light) in lights.enumerate() {
            u.light_dirs[i] = light.direction().extend(0.0).to_array();
            u.light_colors[i] = light.radiance().to_array();
            u.light_count[0] += 1;
        }
        u
    }
}

// ── model ─────────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// Texture repeat on `u` and `v`, unused ×2.
    pub uv_repeat: [f32; 4],
}

impl ModelUniform {
    pub fn new(mesh: &Mesh) -> Self {
        let model = mesh.transform.matrix();
        let linear = Mat3::from_mat4(model);
        let normal = if linear.determinant().abs() > f32::EPSILON {
            linear.inverse().transpose()
        } else {
            linear
        };
        Self {
            model: model.to_cols_array_2d(),
            normal: Mat4::from_mat3(normal).to_cols_array_2d(),
            color: mesh.material.color.to_array(),
            uv_repeat: match mesh.material.map.as_ref() {
                Some(map) => [map.repeat.x, map.repeat.y, 0.0, 0.0],
                None => [1.0, 1.0, 0.0, 0.0],
            },
        }
    }
}

/// Rounds `size` up to the next multiple of `alignment` (a power of two).
pub(crate) fn align_to(size: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (size + alignment - 1) & !(alignment - 1)
}
