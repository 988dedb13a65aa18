use glam::{Mat4, Vec3};

/// Right-handed perspective camera with a look-at target.
///
/// Aspect ratio is not stored; the backend supplies it from the target size at
/// draw time so one camera follows its surface through resizes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            fov_y: 50.0,
            near: 0.1,
            far: 2000.0,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(fov_y: f32) -> Self {
        Self {
            fov_y,
            ..Self::default()
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// wgpu clip space (depth in `0..1`).
    pub fn projection(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Mat4::perspective_rh(self.fov_y.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width as f32 / height.max(1) as f32;
        self.projection(aspect) * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_projects_to_screen_center() {
        let mut camera = PerspectiveCamera::default().at(Vec3::splat(2.0));
        camera.look_at(Vec3::ZERO);
        let clip = camera.view_projection(300, 200) * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn zero_height_does_not_produce_nan() {
        let camera = PerspectiveCamera::default();
        let m = camera.view_projection(100, 0);
        assert!(m.is_finite());
    }
}
