use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::backend::{RenderBackend, Updatable};

/// One logical viewport bound to the shared device.
///
/// The registry owns the entry while it is registered; the scene, camera and
/// target objects it points at stay owned by the mount that created them.
pub struct RenderEntry<B: RenderBackend> {
    pub target: Rc<B::Target>,
    pub scene: Rc<RefCell<B::Scene>>,
    pub camera: Rc<RefCell<B::Camera>>,
    /// Drawable width in physical pixels.
    pub width: u32,
    /// Drawable height in physical pixels.
    pub height: u32,
    pub updatables: Vec<Rc<RefCell<dyn Updatable>>>,
}

impl<B: RenderBackend> RenderEntry<B> {
    pub fn new(
        target: Rc<B::Target>,
        scene: Rc<RefCell<B::Scene>>,
        camera: Rc<RefCell<B::Camera>>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            target,
            scene,
            camera,
            width,
            height,
            updatables: Vec::new(),
        }
    }

    /// Attaches an updatable advanced after every draw of this entry.
    pub fn with_updatable(mut self, updatable: Rc<RefCell<dyn Updatable>>) -> Self {
        self.updatables.push(updatable);
        self
    }
}

impl<B: RenderBackend> Clone for RenderEntry<B> {
    fn clone(&self) -> Self {
        Self {
            target: Rc::clone(&self.target),
            scene: Rc::clone(&self.scene),
            camera: Rc::clone(&self.camera),
            width: self.width,
            height: self.height,
            updatables: self.updatables.clone(),
        }
    }
}

impl<B: RenderBackend> fmt::Debug for RenderEntry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderEntry")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("updatables", &self.updatables.len())
            .finish_non_exhaustive()
    }
}
