use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use vitrine_engine::controls::OrbitControls;
use vitrine_engine::effects::{CenterCircle, Outline, OutlineSettings};
use vitrine_engine::mount::{MountMode, MountParts};
use vitrine_engine::scene::{
    AmbientLight, Color, DirectionalLight, Geometry, Material, Mesh, MeshId, PerspectiveCamera, Scene,
};
use vitrine_engine::window::WindowConfig;
use winit::dpi::LogicalSize;

use super::{CardParts, CardSpec};

pub fn card() -> CardSpec {
    CardSpec {
        window: WindowConfig {
            title: "post-process".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
            ..WindowConfig::default()
        },
        // The outline pulses, so the view redraws every frame.
        mode: MountMode::Continuous,
        build: Box::new(|| Ok(build())),
    }
}

fn color(name: &str) -> Material {
    Material::new(Color::named(name).unwrap_or(Color::WHITE))
}

fn build() -> CardParts {
    let mut scene = Scene::new("post-process").with_background(Color::BLACK);
    scene.ambient = AmbientLight::new(Color::WHITE, 0.5);
    scene.add_light(DirectionalLight::new(Color::WHITE, 1.5).at(Vec3::new(1.0, 1.0, 0.5)));

    // Row of outlined boxes.
    let cube = Rc::new(Geometry::unit_box());
    let selected: Vec<MeshId> = [1.0, 3.0, 5.0, 7.0]
        .into_iter()
        .map(|x| scene.add(Mesh::new(Rc::clone(&cube), color("white")).at(Vec3::new(x, 0.0, 3.0))))
        .collect();

    scene.add(Mesh::new(Rc::clone(&cube), color("red")).at(Vec3::new(1.0, 0.0, 1.0)));
    scene.add(Mesh::new(Rc::new(Geometry::sphere(0.75, 16, 16)), color("blue")).at(Vec3::new(1.0, 0.0, -1.0)));
    scene.add(Mesh::new(Rc::new(Geometry::cone(0.75, 1.75, 16)), color("yellow")).at(Vec3::new(-1.0, 0.0, 1.0)));
    scene.add(
        Mesh::new(Rc::new(Geometry::capsule(0.75, 1.0, 16, 8)), color("green")).at(Vec3::new(-1.0, 0.0, -1.0)),
    );

    let green = Color::from_hex(0x00ff00);
    scene.effects.outline = Some(
        Outline::new(OutlineSettings {
            edge_strength: 7.0,
            pulse_speed: 0.5,
            visible_edge_color: green,
            hidden_edge_color: green,
            ..OutlineSettings::default()
        })
        .with_selection(selected),
    );
    scene.effects.center_circle = Some(CenterCircle::default());

    let camera = Rc::new(RefCell::new(PerspectiveCamera::new(75.0).at(Vec3::new(0.0, 0.0, 5.0))));
    camera.borrow_mut().look_at(Vec3::ZERO);
    let controls = Rc::new(RefCell::new(OrbitControls::new(Rc::clone(&camera))));

    MountParts::from_shared(Rc::new(RefCell::new(scene)), camera, controls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_redraws_continuously_for_the_pulse() {
        assert_eq!(card().mode, MountMode::Continuous);
    }

    #[test]
    fn outline_selects_the_box_row() {
        let parts = build();
        let scene = parts.scene.borrow();
        let outline = scene.effects.outline.as_ref().unwrap();

        assert_eq!(outline.selection.len(), 4);
        for id in outline.selection.iter() {
            let mesh = scene.mesh(id).unwrap();
            assert_eq!(mesh.transform.translation.z, 3.0);
            assert_eq!(mesh.material.color, Color::WHITE);
        }
    }

    #[test]
    fn outline_pulses_green() {
        let parts = build();
        let scene = parts.scene.borrow();
        let settings = scene.effects.outline.as_ref().unwrap().settings;

        assert_eq!(settings.edge_strength, 7.0);
        assert_eq!(settings.pulse_speed, 0.5);
        assert_eq!(settings.visible_edge_color, Color::from_hex(0x00ff00));
        assert!(scene.effects.center_circle.is_some());
    }

    #[test]
    fn boxes_share_one_geometry() {
        let parts = build();
        let scene = parts.scene.borrow();
        let first = scene.meshes[0].geometry.id();
        assert!(scene.meshes[..5].iter().all(|m| m.geometry.id() == first));
    }
}
