use std::collections::HashMap;

use anyhow::Result;
use vitrine_engine::controls::OrbitControls;
use vitrine_engine::core::{App, AppControl, AppCtx};
use vitrine_engine::input::{InputEvent, MouseButton};
use vitrine_engine::mount::Mount;
use vitrine_engine::render::WgpuBackend;
use winit::dpi::PhysicalSize;
use winit::window::WindowId;

use crate::demos::CardSpec;

type CardMount = Mount<WgpuBackend, OrbitControls>;

/// One mount per window; routes window events to it.
pub struct Gallery {
    pending: Vec<CardSpec>,
    mounts: HashMap<WindowId, CardMount>,
}

impl Gallery {
    pub fn new(cards: Vec<CardSpec>) -> Self {
        Self {
            pending: cards,
            mounts: HashMap::new(),
        }
    }
}

impl App for Gallery {
    fn init(&mut self, ctx: &mut AppCtx<'_>) -> Result<()> {
        for card in self.pending.drain(..) {
            let target = ctx.open_window(card.window)?;
            let size = target.inner_size();
            let scale = target.window().scale_factor();
            let id = target.id();

            let mut mount = Mount::new(target, size.width, size.height, scale, card.mode, card.build);
            mount.mount(ctx.coordinator)?;
            self.mounts.insert(id, mount);
        }
        Ok(())
    }

    fn on_input(&mut self, ctx: &mut AppCtx<'_>, window: WindowId, event: &InputEvent) -> Result<AppControl> {
        let Some(mount) = self.mounts.get_mut(&window) else {
            return Ok(AppControl::Continue);
        };

        if event.pressed() == Some(MouseButton::Left) {
            mount.pointer_down(ctx.coordinator, event)?;
        } else if event.released() == Some(MouseButton::Left) {
            mount.pointer_up(ctx.coordinator, event);
        } else {
            mount.input(ctx.coordinator, event)?;
        }
        Ok(AppControl::Continue)
    }

    fn on_resized(
        &mut self,
        ctx: &mut AppCtx<'_>,
        window: WindowId,
        size: PhysicalSize<u32>,
        scale_factor: f64,
    ) -> Result<()> {
        match self.mounts.get_mut(&window) {
            Some(mount) => mount.resize(ctx.coordinator, size.width, size.height, scale_factor),
            None => Ok(()),
        }
    }

    fn on_redraw(&mut self, ctx: &mut AppCtx<'_>, window: WindowId) -> Result<()> {
        match self.mounts.get_mut(&window) {
            Some(mount) => mount.redraw(ctx.coordinator),
            None => Ok(()),
        }
    }

    fn on_window_closed(&mut self, ctx: &mut AppCtx<'_>, window: WindowId) -> AppControl {
        if let Some(mut mount) = self.mounts.remove(&window) {
            mount.teardown(ctx.coordinator);
        }
        log::debug!(
            "closed {window:?}; {} card(s) open, {} registered",
            self.mounts.len(),
            ctx.coordinator.len()
        );
        AppControl::Continue
    }
}
