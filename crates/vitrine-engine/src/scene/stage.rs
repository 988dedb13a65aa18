use super::{AmbientLight, Color, DirectionalLight, Mesh};

/// Index of a mesh within its scene.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MeshId(pub usize);

/// Linear distance fog between `near` and `far` view depth.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    pub fn new(color: Color, near: f32, far: f32) -> Self {
        Self { color, near, far }
    }
}

/// Target-relative rectangle in physical pixels, origin top left.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A second scene shown in the right half of the same target.
///
/// Both halves use the owning entry's camera; `gap` pixels of background
/// separate them.
#[derive(Debug, Clone)]
pub struct SplitView {
    pub right: Scene,
    pub gap: u32,
}

impl SplitView {
    pub fn new(right: Scene) -> Self {
        Self { right, gap: 4 }
    }

    /// Scissor rectangles of the left and right halves of a `width` x
    /// `height` target.
    pub fn halves(&self, width: u32, height: u32) -> [PixelRect; 2] {
        let half = width / 2;
        let inset = self.gap / 2;
        let side = half.saturating_sub(inset);
        let right_x = (half + inset).min(width);
        [
            PixelRect {
                x: 0,
                y: 0,
                width: side,
                height,
            },
            PixelRect {
                x: right_x,
                y: 0,
                width: side.min(width - right_x),
                height,
            },
        ]
    }
}

/// Everything a render target shows.
///
/// `effects` is applied by the backend after the mesh pass. With `split`
/// set, this scene fills the left half and `split.right` the right half.
#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
    pub background: Color,
    pub meshes: Vec<Mesh>,
    pub ambient: AmbientLight,
    pub directional_lights: Vec<DirectionalLight>,
    pub fog: Option<Fog>,
    pub split: Option<Box<SplitView>>,
    pub effects: crate::effects::EffectStack,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            background: Color::BLACK.with_alpha(0.0),
            meshes: Vec::new(),
            ambient: AmbientLight::default(),
            directional_lights: Vec::new(),
            fog: None,
            split: None,
            effects: Default::default(),
        }
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_fog(mut self, fog: Fog) -> Self {
        self.fog = Some(fog);
        self
    }

    pub fn split_with(mut self, right: Scene) -> Self {
        self.split = Some(Box::new(SplitView::new(right)));
        self
    }

    pub fn add(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_light(&mut self, light: DirectionalLight) {
        self.directional_lights.push(light);
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::scene::{Geometry, Material};

    #[test]
    fn add_returns_sequential_ids() {
        let geometry = Rc::new(Geometry::unit_box());
        let mut scene = Scene::new("scene-0");
        let a = scene.add(Mesh::new(geometry.clone(), Material::default()));
        let b = scene.add(Mesh::new(geometry, Material::default()));
        assert_eq!((a, b), (MeshId(0), MeshId(1)));
        assert!(scene.mesh(b).is_some());
        assert!(scene.mesh(MeshId(2)).is_none());
    }

    // ── split view ───────────────────────────────────────────────────────

    #[test]
    fn halves_leave_a_gap_in_the_middle() {
        let split = SplitView::new(Scene::new("right"));
        let [left, right] = split.halves(800, 600);
        assert_eq!(left, PixelRect { x: 0, y: 0, width: 398, height: 600 });
        assert_eq!(right, PixelRect { x: 402, y: 0, width: 398, height: 600 });
    }

    #[test]
    fn odd_widths_stay_inside_the_target() {
        let split = SplitView::new(Scene::new("right"));
        let [left, right] = split.halves(801, 10);
        assert_eq!(left.width, 398);
        assert!(right.x + right.width <= 801);
    }

    #[test]
    fn tiny_targets_collapse_to_empty_halves() {
        let split = SplitView::new(Scene::new("right"));
        let [left, right] = split.halves(3, 10);
        assert!(left.is_empty());
        assert!(right.is_empty());
        assert!(right.x <= 3);
    }

    #[test]
    fn split_with_keeps_both_scenes() {
        let scene = Scene::new("left").split_with(Scene::new("right"));
        assert_eq!(scene.split.as_ref().map(|s| s.right.name.as_str()), Some("right"));
    }
}
