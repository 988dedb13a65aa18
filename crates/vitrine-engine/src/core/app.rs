use anyhow::Result;
use winit::dpi::PhysicalSize;
use winit::window::WindowId;

use super::ctx::AppCtx;
use crate::input::InputEvent;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// Callbacks run on the event-loop thread. `init` runs before the shared
/// device exists, so first paints requested there are queued and flushed
/// once it is ready.
pub trait App {
    /// Opens windows and mounts views.
    fn init(&mut self, ctx: &mut AppCtx<'_>) -> Result<()>;

    /// Called for every translated input event of a window.
    fn on_input(&mut self, ctx: &mut AppCtx<'_>, window: WindowId, event: &InputEvent) -> Result<AppControl> {
        let _ = (ctx, window, event);
        Ok(AppControl::Continue)
    }

    /// Called after a window's drawable size or scale factor changed.
    fn on_resized(
        &mut self,
        ctx: &mut AppCtx<'_>,
        window: WindowId,
        size: PhysicalSize<u32>,
        scale_factor: f64,
    ) -> Result<()> {
        let _ = (ctx, window, size, scale_factor);
        Ok(())
    }

    /// Called when the platform asks a window to repaint (exposure).
    fn on_redraw(&mut self, ctx: &mut AppCtx<'_>, window: WindowId) -> Result<()> {
        let _ = (ctx, window);
        Ok(())
    }

    /// Called before a window is destroyed; release everything bound to it.
    fn on_window_closed(&mut self, ctx: &mut AppCtx<'_>, window: WindowId) -> AppControl {
        let _ = (ctx, window);
        AppControl::Continue
    }
}
