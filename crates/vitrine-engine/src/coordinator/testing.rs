//! Recording backend and helpers for coordinator and mount tests.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, Result};

use crate::time::FrameTime;

use super::{RenderBackend, RenderEntry, Updatable};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Bind(&'static str),
    Size(u32, u32),
    Render(String),
    Update(&'static str),
}

#[derive(Clone, Default)]
pub(crate) struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    /// Scene names in render order.
    pub(crate) fn rendered(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Render(scene) => Some(scene.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// An updatable that records `Call::Update(name)` into this log.
    pub(crate) fn updatable(&self, name: &'static str) -> Rc<RefCell<dyn Updatable>> {
        Rc::new(RefCell::new(LoggedUpdate {
            log: self.clone(),
            name,
        }))
    }
}

struct LoggedUpdate {
    log: CallLog,
    name: &'static str,
}

impl Updatable for LoggedUpdate {
    fn update(&mut self, _time: FrameTime) {
        self.log.0.borrow_mut().push(Call::Update(self.name));
    }
}

pub(crate) struct RecordingBackend {
    log: CallLog,
    fail_render: bool,
    fail_scene: Option<String>,
}

impl RecordingBackend {
    pub(crate) fn new() -> Self {
        Self {
            log: CallLog::default(),
            fail_render: false,
            fail_scene: None,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail_render: true,
            ..Self::new()
        }
    }

    /// Fails only when rendering `scene`.
    pub(crate) fn failing_on(scene: &str) -> Self {
        Self {
            fail_scene: Some(scene.to_string()),
            ..Self::new()
        }
    }

    pub(crate) fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl RenderBackend for RecordingBackend {
    type Target = &'static str;
    type Scene = String;
    type Camera = u32;

    fn bind_target(&mut self, target: &Self::Target) -> Result<()> {
        self.log.0.borrow_mut().push(Call::Bind(target));
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.log.0.borrow_mut().push(Call::Size(width, height));
        Ok(())
    }

    fn render(&mut self, scene: &Self::Scene, _camera: &Self::Camera) -> Result<()> {
        if self.fail_render || self.fail_scene.as_ref() == Some(scene) {
            bail!("device lost");
        }
        self.log.0.borrow_mut().push(Call::Render(scene.clone()));
        Ok(())
    }
}

/// A 100x100 entry rendering `scene` into `target`.
pub(crate) fn entry(target: &'static str, scene: &str) -> RenderEntry<RecordingBackend> {
    RenderEntry::new(
        Rc::new(target),
        Rc::new(RefCell::new(scene.to_string())),
        Rc::new(RefCell::new(0)),
        100,
        100,
    )
}

/// Counts how often it was advanced.
#[derive(Debug, Default)]
pub(crate) struct Counter {
    pub(crate) updates: usize,
    pub(crate) last_frame: Option<u64>,
}

impl Updatable for Counter {
    fn update(&mut self, time: FrameTime) {
        self.updates += 1;
        self.last_frame = Some(time.frame_index);
    }
}
