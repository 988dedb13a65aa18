use std::cell::RefCell;
use std::rc::Rc;

use glam::{Quat, Vec3};
use vitrine_engine::controls::OrbitControls;
use vitrine_engine::coordinator::Updatable;
use vitrine_engine::mount::{MountMode, MountParts};
use vitrine_engine::scene::{
    AmbientLight, Color, DirectionalLight, Geometry, Material, Mesh, MeshId, PerspectiveCamera, Scene,
};
use vitrine_engine::time::FrameTime;
use vitrine_engine::window::WindowConfig;
use winit::dpi::LogicalSize;

use super::{CardParts, CardSpec};

/// Rotates meshes of a scene at a constant angular speed.
pub struct Spin {
    scene: Rc<RefCell<Scene>>,
    spinning: Vec<(MeshId, Vec3, f32)>,
}

impl Spin {
    pub fn new(scene: Rc<RefCell<Scene>>) -> Self {
        Self {
            scene,
            spinning: Vec::new(),
        }
    }

    /// `speed` is in radians per second.
    pub fn with(mut self, mesh: MeshId, axis: Vec3, speed: f32) -> Self {
        self.spinning.push((mesh, axis.normalize_or(Vec3::Y), speed));
        self
    }
}

impl Updatable for Spin {
    fn update(&mut self, time: FrameTime) {
        let mut scene = self.scene.borrow_mut();
        for &(id, axis, speed) in &self.spinning {
            if let Some(mesh) = scene.mesh_mut(id) {
                let step = Quat::from_axis_angle(axis, speed * time.dt);
                mesh.transform.rotation = (step * mesh.transform.rotation).normalize();
            }
        }
    }
}

pub fn card() -> CardSpec {
    CardSpec {
        window: WindowConfig {
            title: "animations".to_string(),
            initial_size: LogicalSize::new(720.0, 480.0),
            ..WindowConfig::default()
        },
        mode: MountMode::Continuous,
        build: Box::new(|| Ok(build())),
    }
}

fn build() -> CardParts {
    let mut scene = Scene::new("animations").with_background(Color::BLACK);
    scene.ambient = AmbientLight::new(Color::WHITE, 0.5);
    scene.add_light(DirectionalLight::new(Color::WHITE, 1.0).at(Vec3::splat(10.0)));

    let torus = scene.add(Mesh::new(
        Rc::new(Geometry::torus(1.0, 0.35, 16, 64)),
        Material::new(Color::named("orange").unwrap_or(Color::WHITE)),
    ));
    let cube = scene.add(
        Mesh::new(Rc::new(Geometry::unit_box()), Material::new(Color::named("blue").unwrap_or(Color::WHITE)))
            .at(Vec3::new(-3.0, 0.0, 0.0)),
    );
    let cone = scene.add(
        Mesh::new(Rc::new(Geometry::cone(0.75, 1.5, 24)), Material::new(Color::named("green").unwrap_or(Color::WHITE)))
            .at(Vec3::new(3.0, 0.0, 0.0)),
    );

    let scene = Rc::new(RefCell::new(scene));
    let spin = Spin::new(Rc::clone(&scene))
        .with(torus, Vec3::new(1.0, 1.0, 0.0), 0.8)
        .with(cube, Vec3::Y, 1.2)
        .with(cone, Vec3::Z, -0.6);

    let camera = Rc::new(RefCell::new(PerspectiveCamera::new(75.0).at(Vec3::new(0.0, 0.0, 5.0))));
    camera.borrow_mut().look_at(Vec3::ZERO);
    let controls = Rc::new(RefCell::new(OrbitControls::new(Rc::clone(&camera))));

    MountParts::from_shared(scene, camera, controls).with_animation(Rc::new(RefCell::new(spin)))
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn step(dt: f32) -> FrameTime {
        FrameTime {
            dt,
            ..FrameTime::still(Instant::now())
        }
    }

    #[test]
    fn spin_advances_by_speed_times_dt() {
        let mut scene = Scene::new("s");
        let id = scene.add(Mesh::new(Rc::new(Geometry::unit_box()), Material::default()));
        let scene = Rc::new(RefCell::new(scene));
        let mut spin = Spin::new(Rc::clone(&scene)).with(id, Vec3::Y, 2.0);

        spin.update(step(0.25));
        spin.update(step(0.25));

        let rotation = scene.borrow().meshes[0].transform.rotation;
        let (axis, angle) = rotation.to_axis_angle();
        assert!((angle - 1.0).abs() < 1e-5, "angle {angle}");
        assert!(axis.abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn still_frames_do_not_rotate() {
        let mut scene = Scene::new("s");
        let id = scene.add(Mesh::new(Rc::new(Geometry::unit_box()), Material::default()));
        let scene = Rc::new(RefCell::new(scene));
        let mut spin = Spin::new(Rc::clone(&scene)).with(id, Vec3::X, 3.0);

        spin.update(step(0.0));
        assert_eq!(scene.borrow().meshes[0].transform.rotation, Quat::IDENTITY);
    }

    #[test]
    fn card_is_continuous_and_carries_its_animation() {
        let card = card();
        assert_eq!(card.mode, MountMode::Continuous);
        let parts = build();
        assert_eq!(parts.animations.len(), 1);
        assert_eq!(parts.scene.borrow().meshes.len(), 3);
    }
}
