use std::collections::VecDeque;

use anyhow::{Context, Result};

use super::backend::RenderBackend;
use super::entry::RenderEntry;

enum DeviceState<B: RenderBackend> {
    /// Backend not yet available; explicit render requests wait here in order.
    Pending(VecDeque<RenderEntry<B>>),
    Ready(B),
}

/// The single rendering device every entry draws through.
///
/// Starts `Pending`; `complete_init` installs the backend exactly once and
/// flushes the requests that arrived in the meantime.
pub struct SharedDevice<B: RenderBackend> {
    state: DeviceState<B>,
}

impl<B: RenderBackend> SharedDevice<B> {
    pub fn pending() -> Self {
        Self {
            state: DeviceState::Pending(VecDeque::new()),
        }
    }

    pub fn ready(backend: B) -> Self {
        Self {
            state: DeviceState::Ready(backend),
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, DeviceState::Ready(_))
    }

    /// Number of requests waiting for initialization.
    pub fn pending_len(&self) -> usize {
        match &self.state {
            DeviceState::Pending(queue) => queue.len(),
            DeviceState::Ready(_) => 0,
        }
    }

    pub fn backend(&self) -> Option<&B> {
        match &self.state {
            DeviceState::Ready(backend) => Some(backend),
            DeviceState::Pending(_) => None,
        }
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        match &mut self.state {
            DeviceState::Ready(backend) => Some(backend),
            DeviceState::Pending(_) => None,
        }
    }

    /// Draws `entry` now, or queues it until the backend is installed.
    pub fn request_render(&mut self, entry: RenderEntry<B>) -> Result<()> {
        match &mut self.state {
            DeviceState::Ready(backend) => draw_with(backend, &entry),
            DeviceState::Pending(queue) => {
                queue.push_back(entry);
                log::trace!("render request queued ({} pending)", queue.len());
                Ok(())
            }
        }
    }

    /// Installs the backend and draws every queued request once, in order.
    ///
    /// A failed draw is logged and the flush continues; the first failure is
    /// returned once the queue is drained. A second completion is ignored and
    /// the first backend is kept.
    pub fn complete_init(&mut self, backend: B) -> Result<()> {
        if self.is_ready() {
            log::warn!("shared device already initialized; ignoring second backend");
            return Ok(());
        }

        let queued = match std::mem::replace(&mut self.state, DeviceState::Ready(backend)) {
            DeviceState::Pending(queued) => queued,
            DeviceState::Ready(_) => VecDeque::new(),
        };

        log::info!("shared device ready; flushing {} queued render(s)", queued.len());

        let mut first_error = None;
        if let DeviceState::Ready(backend) = &mut self.state {
            for (i, entry) in queued.iter().enumerate() {
                if let Err(err) = draw_with(backend, entry) {
                    log::error!("queued render {i} failed: {err:#}");
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err.context("flushing queued renders")),
            None => Ok(()),
        }
    }

    /// Draws `entry` if the backend is installed.
    ///
    /// Returns `false` when the device is still pending; the draw is dropped.
    pub fn draw(&mut self, entry: &RenderEntry<B>) -> Result<bool> {
        match &mut self.state {
            DeviceState::Ready(backend) => draw_with(backend, entry).map(|()| true),
            DeviceState::Pending(_) => Ok(false),
        }
    }

    /// Discards queued requests without touching an installed backend.
    pub(crate) fn clear_pending(&mut self) {
        if let DeviceState::Pending(queue) = &mut self.state {
            queue.clear();
        }
    }
}

fn draw_with<B: RenderBackend>(backend: &mut B, entry: &RenderEntry<B>) -> Result<()> {
    // Bind, then size, then render. Never reorder.
    backend
        .bind_target(&entry.target)
        .context("failed to bind output target")?;
    backend
        .set_size(entry.width, entry.height)
        .context("failed to apply target size")?;

    let scene = entry.scene.borrow();
    let camera = entry.camera.borrow();
    backend.render(&scene, &camera)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::testing::{entry, Call, RecordingBackend};

    // ── draw ordering ─────────────────────────────────────────────────────

    #[test]
    fn draw_binds_then_sizes_then_renders() {
        let backend = RecordingBackend::new();
        let log = backend.log();
        let mut device = SharedDevice::ready(backend);

        let mut e = entry("canvas-1", "cube");
        e.width = 320;
        e.height = 240;
        assert!(device.draw(&e).unwrap());

        assert_eq!(
            log.calls(),
            vec![
                Call::Bind("canvas-1"),
                Call::Size(320, 240),
                Call::Render("cube".to_string()),
            ]
        );
    }

    #[test]
    fn consecutive_draws_rebind_each_target() {
        let backend = RecordingBackend::new();
        let log = backend.log();
        let mut device = SharedDevice::ready(backend);

        device.draw(&entry("a", "A")).unwrap();
        device.draw(&entry("b", "B")).unwrap();

        assert_eq!(
            log.calls(),
            vec![
                Call::Bind("a"),
                Call::Size(100, 100),
                Call::Render("A".to_string()),
                Call::Bind("b"),
                Call::Size(100, 100),
                Call::Render("B".to_string()),
            ]
        );
    }

    #[test]
    fn pending_draw_is_dropped() {
        let mut device = SharedDevice::<RecordingBackend>::pending();
        assert!(!device.draw(&entry("a", "A")).unwrap());
        assert_eq!(device.pending_len(), 0);
    }

    // ── init queue ────────────────────────────────────────────────────────

    #[test]
    fn queued_requests_flush_in_fifo_order() {
        let mut device = SharedDevice::pending();
        device.request_render(entry("x", "X")).unwrap();
        device.request_render(entry("y", "Y")).unwrap();
        device.request_render(entry("z", "Z")).unwrap();
        assert_eq!(device.pending_len(), 3);

        let backend = RecordingBackend::new();
        let log = backend.log();
        device.complete_init(backend).unwrap();

        assert_eq!(log.rendered(), ["X", "Y", "Z"]);
        assert_eq!(device.pending_len(), 0);
    }

    #[test]
    fn request_after_init_draws_immediately() {
        let backend = RecordingBackend::new();
        let log = backend.log();
        let mut device = SharedDevice::pending();
        device.complete_init(backend).unwrap();

        device.request_render(entry("x", "X")).unwrap();
        assert_eq!(log.rendered(), ["X"]);
    }

    #[test]
    fn second_init_keeps_first_backend() {
        let first = RecordingBackend::new();
        let first_log = first.log();
        let second = RecordingBackend::new();
        let second_log = second.log();

        let mut device = SharedDevice::pending();
        device.complete_init(first).unwrap();
        device.complete_init(second).unwrap();

        device.request_render(entry("x", "X")).unwrap();
        assert_eq!(first_log.rendered(), ["X"]);
        assert!(second_log.rendered().is_empty());
    }

    #[test]
    fn backend_failure_propagates() {
        let mut device = SharedDevice::ready(RecordingBackend::failing());
        assert!(device.draw(&entry("a", "A")).is_err());
    }

    #[test]
    fn failed_queued_render_does_not_drop_the_rest() {
        let mut device = SharedDevice::pending();
        device.request_render(entry("x", "X")).unwrap();
        device.request_render(entry("y", "Y")).unwrap();
        device.request_render(entry("z", "Z")).unwrap();

        let backend = RecordingBackend::failing_on("Y");
        let log = backend.log();
        let err = device.complete_init(backend).unwrap_err();

        assert_eq!(log.rendered(), ["X", "Z"]);
        assert!(format!("{err:#}").contains("device lost"));
        assert!(device.is_ready());
        assert_eq!(device.pending_len(), 0);
    }

    #[test]
    fn clear_pending_discards_queue() {
        let mut device = SharedDevice::<RecordingBackend>::pending();
        device.request_render(entry("x", "X")).unwrap();
        device.clear_pending();
        assert_eq!(device.pending_len(), 0);
    }
}
