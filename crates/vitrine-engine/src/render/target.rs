use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

/// An output window the backend can bind and present to.
#[derive(Debug, Clone)]
pub struct CanvasTarget {
    window: Arc<Window>,
}

impl CanvasTarget {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }

    pub fn id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn inner_size(&self) -> PhysicalSize<u32> {
        self.window.inner_size()
    }
}
