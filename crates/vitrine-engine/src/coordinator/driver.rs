use anyhow::Result;

use crate::time::FrameTime;

use super::backend::RenderBackend;
use super::entry::RenderEntry;
use super::shared::SharedDevice;

/// Whether the frame loop is active.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DriverState {
    Stopped,
    Running,
}

/// What a single tick did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TickOutcome {
    /// Driver stopped; nothing to do.
    Idle,
    /// Device still initializing; the tick was dropped, not queued.
    DeviceNotReady,
    /// This many entries were drawn and updated.
    Drawn(usize),
}

/// The single frame loop shared by every registered entry.
///
/// Start/stop is driven by the coordinator on registry size transitions
/// (0 → 1 starts, 1 → 0 stops); nothing else changes the state.
#[derive(Debug)]
pub struct FrameDriver {
    state: DriverState,
    frames: u64,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self {
            state: DriverState::Stopped,
            frames: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> DriverState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    /// Number of ticks that drew at least one entry.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub(crate) fn start(&mut self) {
        if self.state == DriverState::Stopped {
            log::debug!("frame driver: running");
            self.state = DriverState::Running;
        }
    }

    pub(crate) fn stop(&mut self) {
        if self.state == DriverState::Running {
            log::debug!("frame driver: stopped after {} frames", self.frames);
            self.state = DriverState::Stopped;
        }
    }

    /// Draws every entry of `snapshot`, then advances its updatables.
    ///
    /// Updatables of one entry run after that entry's draw and before the
    /// next entry is drawn. A backend error aborts the tick and propagates.
    pub fn tick<B: RenderBackend>(
        &mut self,
        snapshot: &[RenderEntry<B>],
        device: &mut SharedDevice<B>,
        time: FrameTime,
    ) -> Result<TickOutcome> {
        if !self.is_running() {
            return Ok(TickOutcome::Idle);
        }
        if !device.is_ready() {
            return Ok(TickOutcome::DeviceNotReady);
        }

        for entry in snapshot {
            device.draw(entry)?;
            for updatable in &entry.updatables {
                updatable.borrow_mut().update(time);
            }
        }

        if !snapshot.is_empty() {
            self.frames += 1;
        }
        Ok(TickOutcome::Drawn(snapshot.len()))
    }
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new()
    }
}
