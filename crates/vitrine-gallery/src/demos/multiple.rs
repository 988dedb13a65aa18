use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vitrine_engine::controls::{OrbitControls, OrbitSettings};
use vitrine_engine::mount::{MountMode, MountParts};
use vitrine_engine::scene::{AmbientLight, Color, DirectionalLight, Geometry, Material, Mesh, PerspectiveCamera, Scene};

use super::{grid_window, CardSpec};

/// Primitives a card may show.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Shape {
    Box,
    Cone,
    Capsule,
    Sphere,
    Torus,
}

const SHAPES: [Shape; 5] = [Shape::Box, Shape::Cone, Shape::Capsule, Shape::Sphere, Shape::Torus];

const COLORS: [&str; 6] = ["red", "orange", "yellow", "green", "blue", "purple"];

impl Shape {
    fn name(self) -> &'static str {
        match self {
            Shape::Box => "box",
            Shape::Cone => "cone",
            Shape::Capsule => "capsule",
            Shape::Sphere => "sphere",
            Shape::Torus => "torus",
        }
    }

    fn geometry(self) -> Geometry {
        match self {
            Shape::Box => Geometry::unit_box(),
            Shape::Cone => Geometry::cone(1.0, 1.0, 16),
            Shape::Capsule => Geometry::capsule(1.0, 1.0, 16, 8),
            Shape::Sphere => Geometry::sphere(1.0, 16, 16),
            Shape::Torus => Geometry::torus(1.0, 0.5, 16, 48),
        }
    }
}

/// What a single card shows.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Pick {
    shape: Shape,
    color: &'static str,
}

fn picks(count: usize, seed: Option<u64>) -> Vec<Pick> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    (0..count)
        .map(|_| Pick {
            shape: SHAPES[rng.random_range(0..SHAPES.len())],
            color: COLORS[rng.random_range(0..COLORS.len())],
        })
        .collect()
}

pub fn cards(count: usize, seed: Option<u64>) -> Vec<CardSpec> {
    picks(count, seed)
        .into_iter()
        .enumerate()
        .map(|(index, pick)| {
            let title = format!("{} #{}", pick.shape.name(), index + 1);
            let name = title.clone();
            CardSpec {
                window: grid_window(title, index),
                mode: MountMode::Static,
                build: Box::new(move || Ok(build(&name, pick))),
            }
        })
        .collect()
}

fn build(name: &str, pick: Pick) -> super::CardParts {
    let color = Color::named(pick.color).unwrap_or(Color::WHITE);

    let mut scene = Scene::new(name);
    scene.add(Mesh::new(Rc::new(pick.shape.geometry()), Material::new(color)));
    scene.add_light(DirectionalLight::new(Color::WHITE, 1.5));
    scene.ambient = AmbientLight::default();

    let mut camera = PerspectiveCamera::default().at(Vec3::splat(2.0));
    camera.look_at(Vec3::ZERO);
    let camera = Rc::new(RefCell::new(camera));

    let controls = OrbitControls::with_settings(
        Rc::clone(&camera),
        OrbitSettings {
            enable_zoom: false,
            ..OrbitSettings::default()
        },
    );

    MountParts::from_shared(Rc::new(RefCell::new(scene)), camera, Rc::new(RefCell::new(controls)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_picks_are_reproducible() {
        assert_eq!(picks(20, Some(42)), picks(20, Some(42)));
    }

    #[test]
    fn every_pick_names_a_known_color() {
        for pick in picks(50, Some(1)) {
            assert!(Color::named(pick.color).is_some(), "{}", pick.color);
        }
    }

    #[test]
    fn card_shows_one_lit_mesh_with_zoom_disabled() {
        let parts = build("card", Pick { shape: Shape::Torus, color: "blue" });

        let scene = parts.scene.borrow();
        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.directional_lights.len(), 1);
        assert_eq!(scene.meshes[0].material.color, Color::named("blue").unwrap());

        assert!(!parts.controls.borrow().settings.enable_zoom);
        assert!(Rc::ptr_eq(parts.controls.borrow().camera(), &parts.camera));
        assert_eq!(parts.camera.borrow().position, Vec3::splat(2.0));
    }
}
