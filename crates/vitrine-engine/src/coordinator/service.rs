use anyhow::Result;

use crate::time::FrameTime;

use super::backend::RenderBackend;
use super::driver::{DriverState, FrameDriver, TickOutcome};
use super::entry::RenderEntry;
use super::lookup::Lookup;
use super::registry::{Handle, Registry};
use super::shared::SharedDevice;

/// Registry + shared device + frame driver as one service.
///
/// A process normally owns exactly one coordinator (the runtime holds it and
/// lends `&mut` access to app callbacks). Tests construct their own.
pub struct Coordinator<B: RenderBackend> {
    registry: Registry<B>,
    device: SharedDevice<B>,
    driver: FrameDriver,
}

impl<B: RenderBackend> Coordinator<B> {
    pub fn new(device: SharedDevice<B>) -> Self {
        Self {
            registry: Registry::new(),
            device,
            driver: FrameDriver::new(),
        }
    }

    /// A coordinator whose device has not been initialized yet.
    pub fn pending() -> Self {
        Self::new(SharedDevice::pending())
    }

    // ── registry ──────────────────────────────────────────────────────────

    /// Registers `entry` for per-frame drawing; starts the driver on the first entry.
    pub fn register(&mut self, entry: RenderEntry<B>) -> Handle {
        let handle = self.registry.register(entry);
        if self.registry.len() == 1 {
            self.driver.start();
        }
        log::trace!("registered {handle} ({} live)", self.registry.len());
        handle
    }

    /// Releases `handle`; stops the driver when the last entry leaves.
    ///
    /// Releasing an unknown handle changes nothing and returns `NotFound`.
    pub fn unregister(&mut self, handle: Handle) -> Lookup<RenderEntry<B>> {
        let removed = self.registry.unregister(handle);
        if removed.is_found() {
            log::trace!("unregistered {handle} ({} live)", self.registry.len());
            if self.registry.is_empty() {
                self.driver.stop();
            }
        }
        removed
    }

    pub fn get(&self, handle: Handle) -> Lookup<&RenderEntry<B>> {
        self.registry.get(handle)
    }

    pub fn resize(&mut self, handle: Handle, width: u32, height: u32) -> Lookup<(u32, u32)> {
        self.registry.resize(handle, width, height)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    #[inline]
    pub fn free_handles(&self) -> &[Handle] {
        self.registry.free_handles()
    }

    #[inline]
    pub fn driver_state(&self) -> DriverState {
        self.driver.state()
    }

    #[inline]
    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    // ── device ────────────────────────────────────────────────────────────

    #[inline]
    pub fn is_device_ready(&self) -> bool {
        self.device.is_ready()
    }

    pub fn device(&self) -> &SharedDevice<B> {
        &self.device
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.device.backend_mut()
    }

    /// One-off draw outside the frame loop (initial paint, exposure).
    pub fn request_render(&mut self, entry: RenderEntry<B>) -> Result<()> {
        self.device.request_render(entry)
    }

    /// Installs the initialized backend and flushes queued requests.
    pub fn complete_init(&mut self, backend: B) -> Result<()> {
        self.device.complete_init(backend)
    }

    // ── frame loop ────────────────────────────────────────────────────────

    /// Runs one frame of the driver over the current snapshot.
    pub fn tick(&mut self, time: FrameTime) -> Result<TickOutcome> {
        let snapshot = self.registry.snapshot();
        self.driver.tick(&snapshot, &mut self.device, time)
    }

    /// Drops every registration and queued request; keeps an installed backend.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.device.clear_pending();
        self.driver.stop();
    }
}
