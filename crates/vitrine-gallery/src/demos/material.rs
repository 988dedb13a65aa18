use std::cell::RefCell;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use anyhow::Result;
use glam::{Quat, Vec3};
use vitrine_engine::controls::OrbitControls;
use vitrine_engine::mount::{MountMode, MountParts};
use vitrine_engine::scene::{
    AmbientLight, Color, DirectionalLight, Fog, Geometry, Material, Mesh, PerspectiveCamera, Scene, Texture,
    TextureMap,
};
use vitrine_engine::window::WindowConfig;
use winit::dpi::LogicalSize;

use super::{CardParts, CardSpec};

/// Anisotropic filtering in the left half and plain trilinear in the right.
const ANISOTROPY: [u16; 2] = [16, 1];

const FLOOR_SIZE: f32 = 1000.0;
/// Texture tiles across the floor.
const FLOOR_REPEAT: f32 = 1000.0;
const CHECKER_SIZE: u32 = 256;
const CHECKER_CELLS: u32 = 8;

pub fn card() -> CardSpec {
    CardSpec {
        window: WindowConfig {
            title: format!("anisotropy {} | anisotropy {}", ANISOTROPY[0], ANISOTROPY[1]),
            initial_size: LogicalSize::new(960.0, 540.0),
            ..WindowConfig::default()
        },
        mode: MountMode::Static,
        build: Box::new(build),
    }
}

fn checker() -> Result<Texture> {
    Texture::checker(CHECKER_SIZE, CHECKER_CELLS, [40, 40, 40, 255], [235, 235, 235, 255])
}

/// One half of the view: the checker floor sampled with `anisotropy`.
fn floor_scene(name: &str, texture: &Rc<Texture>, anisotropy: u16) -> Scene {
    let mut scene = Scene::new(name)
        .with_background(Color::from_hex(0xffffff))
        .with_fog(Fog::new(Color::from_hex(0xf2f7ff), 1.0, 2000.0));
    scene.ambient = AmbientLight::new(Color::WHITE, 0.0);
    scene.add_light(DirectionalLight::new(Color::WHITE, 3.0).at(Vec3::new(0.0, 1.0, 0.0)));

    let map = TextureMap::new(Rc::clone(texture))
        .repeat(FLOOR_REPEAT, FLOOR_REPEAT)
        .anisotropy(anisotropy);
    let mut floor = Mesh::new(Rc::new(Geometry::plane(FLOOR_SIZE, FLOOR_SIZE)), Material::textured(map));
    floor.transform.rotation = Quat::from_rotation_x(-FRAC_PI_2);
    scene.add(floor);
    scene
}

fn build() -> Result<CardParts> {
    let texture = Rc::new(checker()?);
    let left = floor_scene("anisotropy-16", &texture, ANISOTROPY[0]);
    let right = floor_scene("anisotropy-1", &texture, ANISOTROPY[1]);

    let camera = Rc::new(RefCell::new(PerspectiveCamera::new(75.0).at(Vec3::new(0.0, 2.0, 5.0))));
    camera.borrow_mut().look_at(Vec3::new(0.0, 0.0, -10.0));
    let controls = Rc::new(RefCell::new(OrbitControls::new(Rc::clone(&camera))));

    Ok(MountParts::from_shared(
        Rc::new(RefCell::new(left.split_with(right))),
        camera,
        controls,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn halves(parts: &CardParts) -> (Scene, Scene) {
        let scene = parts.scene.borrow().clone();
        let right = scene.split.as_ref().unwrap().right.clone();
        (scene, right)
    }

    fn anisotropy(scene: &Scene) -> u16 {
        scene.meshes[0].material.map.as_ref().unwrap().anisotropy
    }

    #[test]
    fn halves_differ_only_in_anisotropy() {
        let parts = build().unwrap();
        let (left, right) = halves(&parts);
        assert_eq!(anisotropy(&left), 16);
        assert_eq!(anisotropy(&right), 1);

        let (a, b) = (left.meshes[0].material.map.as_ref().unwrap(), right.meshes[0].material.map.as_ref().unwrap());
        assert!(Rc::ptr_eq(&a.texture, &b.texture));
        assert_eq!(a.repeat, b.repeat);
        assert_eq!(left.fog, right.fog);
    }

    #[test]
    fn floor_lies_flat_facing_up() {
        let parts = build().unwrap();
        let (left, _) = halves(&parts);
        let floor = &left.meshes[0];
        let up = floor.transform.rotation * Vec3::Z;
        assert!((up - Vec3::Y).length() < 1e-5);
        assert_eq!(floor.geometry.label(), "plane");
    }

    #[test]
    fn each_half_has_fog_and_a_bright_light() {
        let parts = build().unwrap();
        let (left, right) = halves(&parts);
        for scene in [&left, &right] {
            let fog = scene.fog.unwrap();
            assert_eq!((fog.near, fog.far), (1.0, 2000.0));
            assert_eq!(scene.directional_lights.len(), 1);
            assert_eq!(scene.directional_lights[0].intensity, 3.0);
        }
    }

    #[test]
    fn checker_has_mips_for_trilinear_sampling() {
        let texture = checker().unwrap();
        assert_eq!(texture.size(), (CHECKER_SIZE, CHECKER_SIZE));
        assert_eq!(texture.mip_level_count(), 9);
    }

    #[test]
    fn title_labels_both_halves() {
        let card = card();
        assert_eq!(card.window.title, "anisotropy 16 | anisotropy 1");
        assert_eq!(card.mode, MountMode::Static);
    }
}
