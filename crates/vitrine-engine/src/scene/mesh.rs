use std::rc::Rc;

use glam::{Mat4, Quat, Vec3};

use super::{Color, Geometry, TextureMap};

/// Lambert material; `map` modulates `color` per texel.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Color,
    pub map: Option<TextureMap>,
}

impl Material {
    pub fn new(color: Color) -> Self {
        Self { color, map: None }
    }

    pub fn textured(map: TextureMap) -> Self {
        Self {
            color: Color::WHITE,
            map: Some(map),
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(Color::WHITE)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A geometry drawn with one material at one transform.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Rc<Geometry>,
    pub material: Material,
    pub transform: Transform,
}

impl Mesh {
    pub fn new(geometry: Rc<Geometry>, material: Material) -> Self {
        Self {
            geometry,
            material,
            transform: Transform::IDENTITY,
        }
    }

    pub fn at(mut self, translation: Vec3) -> Self {
        self.transform.translation = translation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_matrix_applies_scale_then_rotation_then_translation() {
        let t = Transform {
            translation: Vec3::new(1.0, 0.0, 0.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        let p = t.matrix().transform_point3(Vec3::X);
        // X scaled to 2, rotated onto -Z, then shifted by +X
        assert!((p - Vec3::new(1.0, 0.0, -2.0)).length() < 1e-5);
    }
}
