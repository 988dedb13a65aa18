use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Context, Result};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use crate::coordinator::Coordinator;
use crate::input::InputState;
use crate::render::{CanvasTarget, WgpuBackend};
use crate::window::{WindowConfig, WindowSlot};

/// Context passed to `core::App` callbacks.
///
/// Gives mutable access to the runtime's single coordinator and lets the
/// application open windows while the event loop is active.
pub struct AppCtx<'a> {
    pub coordinator: &'a mut Coordinator<WgpuBackend>,
    event_loop: &'a ActiveEventLoop,
    windows: &'a mut HashMap<WindowId, WindowSlot>,
    exit_requested: &'a mut bool,
}

impl<'a> AppCtx<'a> {
    pub(crate) fn new(
        coordinator: &'a mut Coordinator<WgpuBackend>,
        event_loop: &'a ActiveEventLoop,
        windows: &'a mut HashMap<WindowId, WindowSlot>,
        exit_requested: &'a mut bool,
    ) -> Self {
        Self {
            coordinator,
            event_loop,
            windows,
            exit_requested,
        }
    }

    /// Creates a window and returns it as a render target.
    pub fn open_window(&mut self, config: WindowConfig) -> Result<Rc<CanvasTarget>> {
        let mut attrs = Window::default_attributes()
            .with_title(config.title)
            .with_inner_size(config.initial_size)
            .with_resizable(config.resizable);
        if let Some(position) = config.position {
            attrs = attrs.with_position(position);
        }

        let window = self
            .event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let slot = WindowSlot::new(window);
        let target = Rc::new(CanvasTarget::new(slot.window.clone()));
        log::debug!("opened window {:?}", target.id());
        self.windows.insert(target.id(), slot);
        Ok(target)
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id).map(|slot| slot.window.as_ref())
    }

    pub fn input(&self, id: WindowId) -> Option<&InputState> {
        self.windows.get(&id).map(|slot| &slot.input_state)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn exit(&mut self) {
        *self.exit_requested = true;
    }
}
