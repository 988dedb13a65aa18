use glam::Vec3;

use super::Color;

/// Light arriving from `position` towards the origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Vec3::Y,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Unit vector pointing from the surface towards the light.
    pub fn direction(&self) -> Vec3 {
        self.position.try_normalize().unwrap_or(Vec3::Y)
    }

    pub fn radiance(&self) -> Color {
        self.color.scaled(self.intensity)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self { color, intensity }
    }

    pub fn radiance(&self) -> Color {
        self.color.scaled(self.intensity)
    }
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self::new(Color::WHITE, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directional_light_shines_from_above() {
        let light = DirectionalLight::new(Color::WHITE, 1.5);
        assert_eq!(light.direction(), Vec3::Y);
        assert_eq!(light.radiance().to_array(), [1.5, 1.5, 1.5, 1.0]);
    }

    #[test]
    fn degenerate_position_falls_back_to_up() {
        let light = DirectionalLight::new(Color::WHITE, 1.0).at(Vec3::ZERO);
        assert_eq!(light.direction(), Vec3::Y);
    }
}
