use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalPosition, LogicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coordinator::{Coordinator, TickOutcome};
use crate::core::{App, AppControl, AppCtx};
use crate::device::{DeviceConfig, FatalSurfaceError, GpuContext};
use crate::input::platform::translate_event;
use crate::input::InputState;
use crate::render::WgpuBackend;
use crate::time::FrameClock;

const FALLBACK_REFRESH_HZ: u32 = 60;

/// Per-window creation parameters.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub position: Option<LogicalPosition<f64>>,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "vitrine".to_string(),
            initial_size: LogicalSize::new(640.0, 480.0),
            position: None,
            resizable: true,
        }
    }
}

/// Runtime loop configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Fixed frame interval; `None` follows the first window's monitor.
    pub frame_interval: Option<Duration>,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs `app` until every window is closed or the app exits.
    ///
    /// The shared device is created after `App::init`, so renders requested
    /// during init go through the coordinator's pending queue.
    pub fn run<A>(config: RuntimeConfig, device: DeviceConfig, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, device, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Window plus its input state.
pub(crate) struct WindowSlot {
    pub window: Arc<Window>,
    pub input_state: InputState,
}

impl WindowSlot {
    pub(crate) fn new(window: Window) -> Self {
        Self {
            window: Arc::new(window),
            input_state: InputState::default(),
        }
    }
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    device_config: DeviceConfig,
    app: A,

    coordinator: Coordinator<WgpuBackend>,
    windows: HashMap<WindowId, WindowSlot>,

    clock: FrameClock,
    frame_interval: Duration,
    next_frame: Option<Instant>,

    initialized: bool,
    exit_requested: bool,
    fatal: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, device_config: DeviceConfig, app: A) -> Self {
        Self {
            frame_interval: config
                .frame_interval
                .unwrap_or_else(|| interval_from_millihertz(FALLBACK_REFRESH_HZ * 1000)),
            config,
            device_config,
            app,
            coordinator: Coordinator::pending(),
            windows: HashMap::new(),
            clock: FrameClock::new(),
            next_frame: None,
            initialized: false,
            exit_requested: false,
            fatal: None,
        }
    }

    /// Runs an app callback with a freshly built context.
    fn with_ctx<R>(
        &mut self,
        event_loop: &ActiveEventLoop,
        f: impl FnOnce(&mut A, &mut AppCtx<'_>) -> R,
    ) -> R {
        let mut ctx = AppCtx::new(
            &mut self.coordinator,
            event_loop,
            &mut self.windows,
            &mut self.exit_requested,
        );
        f(&mut self.app, &mut ctx)
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Logs a failure; fatal surface errors stop the loop.
    fn report(&mut self, err: anyhow::Error) {
        if FatalSurfaceError::is_fatal(&err) {
            log::error!("fatal: {err:#}");
            self.fail(err);
        } else {
            log::error!("{err:#}");
        }
    }

    fn fail(&mut self, err: anyhow::Error) {
        self.fatal.get_or_insert(err);
        self.request_exit();
    }

    fn init_device(&mut self) -> Result<()> {
        log::info!(
            "creating shared device ({} render(s) queued)",
            self.coordinator.device().pending_len()
        );
        let gpu = pollster::block_on(GpuContext::new(self.device_config.clone()))?;
        self.coordinator.complete_init(WgpuBackend::new(gpu))
    }

    fn detect_frame_interval(&mut self) {
        if self.config.frame_interval.is_some() {
            return;
        }
        let refresh = self
            .windows
            .values()
            .next()
            .and_then(|slot| slot.window.current_monitor())
            .and_then(|monitor| monitor.refresh_rate_millihertz());
        if let Some(mhz) = refresh {
            self.frame_interval = interval_from_millihertz(mhz);
            log::debug!("frame interval {:?} ({mhz} mHz)", self.frame_interval);
        }
    }

    fn close_window(&mut self, event_loop: &ActiveEventLoop, id: WindowId) {
        let control = self.with_ctx(event_loop, |app, ctx| app.on_window_closed(ctx, id));

        if let Some(backend) = self.coordinator.backend_mut() {
            backend.release_target(id);
        }
        self.windows.remove(&id);

        if control == AppControl::Exit || self.windows.is_empty() {
            self.request_exit();
        }
    }

    /// Ticks the frame driver when a frame is due.
    fn drive_frame(&mut self, event_loop: &ActiveEventLoop) {
        if !self.coordinator.driver().is_running() {
            self.next_frame = None;
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        }

        let now = Instant::now();
        match self.next_frame {
            Some(due) if now < due => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(due));
                return;
            }
            Some(_) => {}
            // Driver just (re)started.
            None => self.clock.reset(),
        }

        let time = self.clock.tick();
        match self.coordinator.tick(time) {
            Ok(TickOutcome::DeviceNotReady) => log::trace!("frame {} skipped: device pending", time.frame_index),
            Ok(_) => {}
            Err(err) => self.report(err.context("frame failed")),
        }

        let due = now + self.frame_interval;
        self.next_frame = Some(due);
        event_loop.set_control_flow(ControlFlow::WaitUntil(due));
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        if let Err(err) = self.with_ctx(event_loop, |app, ctx| app.init(ctx)) {
            self.fail(err.context("application init failed"));
            event_loop.exit();
            return;
        }
        self.detect_frame_interval();

        if let Err(err) = self.init_device() {
            self.fail(err.context("GPU initialization failed"));
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.exit_requested {
            self.drive_frame(event_loop);
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let input = self.windows.get_mut(&window_id).and_then(|slot| {
            let ev = translate_event(&slot.window, &slot.input_state, &event)?;
            slot.input_state.apply_event(&ev);
            Some(ev)
        });

        if let Some(ev) = input {
            match self.with_ctx(event_loop, |app, ctx| app.on_input(ctx, window_id, &ev)) {
                Ok(AppControl::Exit) => self.request_exit(),
                Ok(AppControl::Continue) => {}
                Err(err) => self.report(err),
            }
        }

        let result = match &event {
            WindowEvent::CloseRequested => {
                self.close_window(event_loop, window_id);
                Ok(())
            }

            WindowEvent::Resized(size) => {
                let size = *size;
                let scale = self
                    .windows
                    .get(&window_id)
                    .map_or(1.0, |slot| slot.window.scale_factor());
                self.with_ctx(event_loop, |app, ctx| app.on_resized(ctx, window_id, size, scale))
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let scale = *scale_factor;
                match self.windows.get(&window_id).map(|slot| slot.window.inner_size()) {
                    Some(size) => {
                        self.with_ctx(event_loop, |app, ctx| app.on_resized(ctx, window_id, size, scale))
                    }
                    None => Ok(()),
                }
            }

            WindowEvent::RedrawRequested => {
                self.with_ctx(event_loop, |app, ctx| app.on_redraw(ctx, window_id))
            }

            _ => Ok(()),
        };

        if let Err(err) = result {
            self.report(err);
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}

fn interval_from_millihertz(mhz: u32) -> Duration {
    let mhz = if mhz == 0 { FALLBACK_REFRESH_HZ * 1000 } else { mhz };
    Duration::from_nanos(1_000_000_000_000 / mhz as u64)
}
