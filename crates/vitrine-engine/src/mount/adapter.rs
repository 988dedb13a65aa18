use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use anyhow::Result;

use crate::controls::{Controls, Viewport};
use crate::coordinator::{Coordinator, Handle, RenderBackend, RenderEntry, Updatable};
use crate::input::InputEvent;
use crate::time::FrameTime;

/// How a mount occupies the frame driver.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum MountMode {
    /// Painted once on mount and on demand; registered only while dragged.
    #[default]
    Static,
    /// Registered from mount to teardown; its updatables advance every frame.
    Continuous,
}

/// Objects a mount builds once and reuses for every registration.
pub struct MountParts<B: RenderBackend, C> {
    pub scene: Rc<RefCell<B::Scene>>,
    pub camera: Rc<RefCell<B::Camera>>,
    pub controls: Rc<RefCell<C>>,
    /// Per-frame animations, advanced while a continuous mount is registered.
    pub animations: Vec<Rc<RefCell<dyn Updatable>>>,
}

impl<B: RenderBackend, C> MountParts<B, C> {
    pub fn new(scene: B::Scene, camera: B::Camera, controls: C) -> Self {
        Self {
            scene: Rc::new(RefCell::new(scene)),
            camera: Rc::new(RefCell::new(camera)),
            controls: Rc::new(RefCell::new(controls)),
            animations: Vec::new(),
        }
    }

    /// Uses objects that are already shared, e.g. a camera the controls drive.
    pub fn from_shared(
        scene: Rc<RefCell<B::Scene>>,
        camera: Rc<RefCell<B::Camera>>,
        controls: Rc<RefCell<C>>,
    ) -> Self {
        Self {
            scene,
            camera,
            controls,
            animations: Vec::new(),
        }
    }

    pub fn with_animation(mut self, animation: Rc<RefCell<dyn Updatable>>) -> Self {
        self.animations.push(animation);
        self
    }
}

type Builder<B, C> = Box<dyn FnMut() -> Result<MountParts<B, C>>>;

/// One demo view bound to an output target.
///
/// A mount requests a static render when it mounts. While the user drags
/// inside its target it additionally holds an interactive handle carrying
/// its controls as an updatable, released on pointer-up. Continuous mounts
/// also hold a baseline handle, carrying the controls and animations, until
/// teardown.
pub struct Mount<B: RenderBackend, C: Controls + 'static> {
    target: Rc<B::Target>,
    width: u32,
    height: u32,
    scale_factor: f64,
    mode: MountMode,

    builder: Builder<B, C>,
    parts: Option<MountParts<B, C>>,

    baseline: Option<Handle>,
    interactive: Option<Handle>,
}

impl<B: RenderBackend, C: Controls + 'static> fmt::Debug for Mount<B, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mount")
            .field("size", &(self.width, self.height))
            .field("mode", &self.mode)
            .field("built", &self.parts.is_some())
            .field("baseline", &self.baseline)
            .field("interactive", &self.interactive)
            .finish()
    }
}

impl<B: RenderBackend, C: Controls + 'static> Mount<B, C> {
    /// `width`/`height` are physical pixels.
    pub fn new(
        target: Rc<B::Target>,
        width: u32,
        height: u32,
        scale_factor: f64,
        mode: MountMode,
        builder: impl FnMut() -> Result<MountParts<B, C>> + 'static,
    ) -> Self {
        Self {
            target,
            width,
            height,
            scale_factor,
            mode,
            builder: Box::new(builder),
            parts: None,
            baseline: None,
            interactive: None,
        }
    }

    pub fn target(&self) -> &Rc<B::Target> {
        &self.target
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mode(&self) -> MountMode {
        self.mode
    }

    pub fn is_built(&self) -> bool {
        self.parts.is_some()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive.is_some()
    }

    pub fn baseline_handle(&self) -> Option<Handle> {
        self.baseline
    }

    pub fn interactive_handle(&self) -> Option<Handle> {
        self.interactive
    }

    pub fn parts(&self) -> Option<&MountParts<B, C>> {
        self.parts.as_ref()
    }

    /// Builds the view and requests its first paint.
    pub fn mount(&mut self, coordinator: &mut Coordinator<B>) -> Result<()> {
        let entry = self.entry()?;
        coordinator.request_render(entry.clone())?;

        if self.mode == MountMode::Continuous && self.baseline.is_none() {
            let Some(parts) = self.parts.as_ref() else { return Ok(()) };
            // The baseline applies the controls every frame, so zoom and
            // damping keep working between drags.
            let controls: Rc<RefCell<dyn Updatable>> = parts.controls.clone();
            let mut entry = entry.with_updatable(controls);
            entry.updatables.extend(parts.animations.iter().cloned());
            self.baseline = Some(coordinator.register(entry));
        }
        Ok(())
    }

    /// Starts an interaction: registers the controls with the frame driver
    /// and forwards the press to them.
    pub fn pointer_down(&mut self, coordinator: &mut Coordinator<B>, event: &InputEvent) -> Result<()> {
        if self.interactive.is_none() {
            let mut entry = self.entry()?;
            let Some(parts) = self.parts.as_ref() else { return Ok(()) };
            if self.baseline.is_none() {
                let controls: Rc<RefCell<dyn Updatable>> = parts.controls.clone();
                entry = entry.with_updatable(controls);
            }
            self.interactive = Some(coordinator.register(entry));
        }
        self.forward(event);
        Ok(())
    }

    /// Ends an interaction and releases the interactive handle.
    pub fn pointer_up(&mut self, coordinator: &mut Coordinator<B>, event: &InputEvent) {
        self.forward(event);
        if let Some(handle) = self.interactive.take() {
            // Already released handles are ignored by the coordinator.
            let _ = coordinator.unregister(handle);
        }
    }

    /// Forwards input to the controls.
    ///
    /// While interactive every event is forwarded. Otherwise only wheel
    /// events reach a built view; a static view applies the change at once
    /// and repaints, a continuous one picks it up on its next frame.
    pub fn input(&mut self, coordinator: &mut Coordinator<B>, event: &InputEvent) -> Result<()> {
        if self.interactive.is_some() {
            self.forward(event);
            return Ok(());
        }
        if !matches!(event, InputEvent::MouseWheel { .. }) {
            return Ok(());
        }
        let Some(parts) = self.parts.as_ref() else { return Ok(()) };
        let controls = Rc::clone(&parts.controls);
        controls.borrow_mut().handle_event(event);

        if self.baseline.is_none() {
            controls.borrow_mut().update(FrameTime::still(Instant::now()));
            self.redraw(coordinator)?;
        }
        Ok(())
    }

    fn forward(&self, event: &InputEvent) {
        if let Some(parts) = self.parts.as_ref() {
            parts.controls.borrow_mut().handle_event(event);
        }
    }

    /// Records a new drawable size and repaints.
    pub fn resize(
        &mut self,
        coordinator: &mut Coordinator<B>,
        width: u32,
        height: u32,
        scale_factor: f64,
    ) -> Result<()> {
        self.width = width;
        self.height = height;
        self.scale_factor = scale_factor;

        for handle in [self.baseline, self.interactive].into_iter().flatten() {
            let _ = coordinator.resize(handle, width, height);
        }

        let Some(parts) = self.parts.as_ref() else { return Ok(()) };
        parts.controls.borrow_mut().set_viewport(self.viewport());
        self.redraw(coordinator)
    }

    /// Requests a static repaint (e.g. after the window was exposed).
    pub fn redraw(&mut self, coordinator: &mut Coordinator<B>) -> Result<()> {
        if self.parts.is_none() {
            return Ok(());
        }
        let entry = self.entry()?;
        coordinator.request_render(entry)
    }

    /// Releases every handle and drops the view's scene, camera and controls.
    pub fn teardown(&mut self, coordinator: &mut Coordinator<B>) {
        if let Some(parts) = self.parts.as_ref() {
            parts.controls.borrow_mut().cancel();
        }
        for handle in [self.interactive.take(), self.baseline.take()].into_iter().flatten() {
            let _ = coordinator.unregister(handle);
        }
        self.parts = None;
    }

    fn viewport(&self) -> Viewport {
        Viewport::from_physical(self.width, self.height, self.scale_factor)
    }

    /// Builds the parts on first use and returns a fresh entry for them.
    fn entry(&mut self) -> Result<RenderEntry<B>> {
        if self.parts.is_none() {
            let parts = (self.builder)()?;
            parts.controls.borrow_mut().set_viewport(self.viewport());
            self.parts = Some(parts);
        }
        let Some(parts) = self.parts.as_ref() else {
            anyhow::bail!("mount parts unavailable");
        };
        Ok(RenderEntry::new(
            Rc::clone(&self.target),
            Rc::clone(&parts.scene),
            Rc::clone(&parts.camera),
            self.width,
            self.height,
        ))
    }
}

impl<B: RenderBackend, C: Controls + 'static> Drop for Mount<B, C> {
    fn drop(&mut self) {
        if self.baseline.is_some() || self.interactive.is_some() {
            log::warn!("mount dropped without teardown; its handles stay registered");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::coordinator::testing::{CallLog, Counter, RecordingBackend};
    use crate::coordinator::{DriverState, SharedDevice, TickOutcome};
    use crate::controls::{OrbitControls, OrbitSettings};
    use crate::input::{
        Modifiers, MouseButton, MouseButtonState, MouseWheelDelta, PointerButtonEvent, PointerMoveEvent,
    };
    use crate::scene::PerspectiveCamera;
    use crate::time::FrameTime;

    #[derive(Default)]
    struct TestControls {
        events: Vec<InputEvent>,
        updates: usize,
        viewport: Option<Viewport>,
        cancelled: bool,
    }

    impl Updatable for TestControls {
        fn update(&mut self, _time: FrameTime) {
            self.updates += 1;
        }
    }

    impl Controls for TestControls {
        fn handle_event(&mut self, event: &InputEvent) {
            self.events.push(event.clone());
        }

        fn set_viewport(&mut self, viewport: Viewport) {
            self.viewport = Some(viewport);
        }

        fn cancel(&mut self) {
            self.cancelled = true;
        }
    }

    type TestMount = Mount<RecordingBackend, TestControls>;

    fn ready() -> (Coordinator<RecordingBackend>, CallLog) {
        let backend = RecordingBackend::new();
        let log = backend.log();
        (Coordinator::new(SharedDevice::ready(backend)), log)
    }

    fn mount(name: &'static str, mode: MountMode, builds: Rc<Cell<usize>>) -> TestMount {
        Mount::new(Rc::new(name), 200, 100, 2.0, mode, move || {
            builds.set(builds.get() + 1);
            Ok(MountParts::new(format!("scene-{name}"), 0, TestControls::default()))
        })
    }

    fn press(state: MouseButtonState) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Left,
            state,
            x: 10.0,
            y: 10.0,
            modifiers: Modifiers::default(),
        })
    }

    fn frame() -> FrameTime {
        FrameTime::still(std::time::Instant::now())
    }

    fn controls(m: &TestMount) -> std::cell::Ref<'_, TestControls> {
        m.parts().map(|p| p.controls.borrow()).unwrap()
    }

    // ── static lifecycle ─────────────────────────────────────────────────

    #[test]
    fn mount_paints_once_without_registering() {
        let (mut coord, log) = ready();
        let builds = Rc::new(Cell::new(0));
        let mut m = mount("a", MountMode::Static, builds.clone());

        m.mount(&mut coord).unwrap();

        assert_eq!(log.rendered(), vec!["scene-a"]);
        assert!(coord.is_empty());
        assert_eq!(coord.driver_state(), DriverState::Stopped);
        assert_eq!(builds.get(), 1);
        assert_eq!(controls(&m).viewport, Some(Viewport::new(100.0, 50.0)));
    }

    #[test]
    fn mount_before_device_ready_is_queued() {
        let mut coord = Coordinator::<RecordingBackend>::pending();
        let mut m = mount("a", MountMode::Static, Rc::default());
        m.mount(&mut coord).unwrap();
        assert_eq!(coord.device().pending_len(), 1);

        let backend = RecordingBackend::new();
        let log = backend.log();
        coord.complete_init(backend).unwrap();
        assert_eq!(log.rendered(), vec!["scene-a"]);
    }

    // ── interactive lifecycle ────────────────────────────────────────────

    #[test]
    fn drag_holds_one_handle_and_drives_controls() {
        let (mut coord, log) = ready();
        let builds = Rc::new(Cell::new(0));
        let mut m = mount("a", MountMode::Static, builds.clone());
        m.mount(&mut coord).unwrap();
        log.clear();

        m.pointer_down(&mut coord, &press(MouseButtonState::Pressed)).unwrap();
        let handle = m.interactive_handle().unwrap();
        assert_eq!(coord.len(), 1);
        assert_eq!(coord.driver_state(), DriverState::Running);

        // A second press while held does not register again.
        m.pointer_down(&mut coord, &press(MouseButtonState::Pressed)).unwrap();
        assert_eq!(m.interactive_handle(), Some(handle));
        assert_eq!(coord.len(), 1);

        m.input(&mut coord, &InputEvent::PointerMoved(PointerMoveEvent { x: 30.0, y: 12.0 })).unwrap();
        assert_eq!(coord.tick(frame()).unwrap(), TickOutcome::Drawn(1));
        assert_eq!(log.rendered(), vec!["scene-a"]);
        assert_eq!(controls(&m).updates, 1);

        m.pointer_up(&mut coord, &press(MouseButtonState::Released));
        assert!(!m.is_interactive());
        assert!(coord.is_empty());
        assert_eq!(coord.driver_state(), DriverState::Stopped);
        assert_eq!(coord.free_handles(), &[handle]);

        // press, press, move, release
        assert_eq!(controls(&m).events.len(), 4);
        assert_eq!(builds.get(), 1, "parts are reused across registrations");
    }

    #[test]
    fn input_is_ignored_while_not_interactive() {
        let (mut coord, _log) = ready();
        let mut m = mount("a", MountMode::Static, Rc::default());
        m.mount(&mut coord).unwrap();
        m.input(&mut coord, &InputEvent::PointerMoved(PointerMoveEvent { x: 1.0, y: 1.0 })).unwrap();
        assert!(controls(&m).events.is_empty());
    }

    #[test]
    fn pointer_up_without_down_is_harmless() {
        let (mut coord, _log) = ready();
        let mut m = mount("a", MountMode::Static, Rc::default());
        m.pointer_up(&mut coord, &press(MouseButtonState::Released));
        assert!(coord.is_empty());
        assert!(coord.free_handles().is_empty());
    }

    #[test]
    fn pointer_down_builds_lazily() {
        let (mut coord, log) = ready();
        let builds = Rc::new(Cell::new(0));
        let mut m = mount("a", MountMode::Static, builds.clone());
        m.pointer_down(&mut coord, &press(MouseButtonState::Pressed)).unwrap();
        assert_eq!(builds.get(), 1);
        assert!(log.rendered().is_empty());
        assert_eq!(coord.len(), 1);
    }

    // ── continuous mode ──────────────────────────────────────────────────

    #[test]
    fn continuous_mount_keeps_a_baseline_with_animations() {
        let (mut coord, log) = ready();
        let spin = Rc::new(RefCell::new(Counter::default()));
        let spin_dyn: Rc<RefCell<dyn Updatable>> = spin.clone();
        let mut m: TestMount = Mount::new(Rc::new("c"), 64, 64, 1.0, MountMode::Continuous, move || {
            Ok(MountParts::new("spin".to_string(), 0, TestControls::default())
                .with_animation(spin_dyn.clone()))
        });

        m.mount(&mut coord).unwrap();
        assert!(m.baseline_handle().is_some());
        assert_eq!(coord.driver_state(), DriverState::Running);

        coord.tick(frame()).unwrap();
        coord.tick(frame()).unwrap();
        assert_eq!(spin.borrow().updates, 2);
        assert_eq!(controls(&m).updates, 2, "baseline carries the controls");
        // first paint plus two ticks
        assert_eq!(log.rendered().len(), 3);

        // Dragging adds a second entry; releasing keeps the baseline.
        m.pointer_down(&mut coord, &press(MouseButtonState::Pressed)).unwrap();
        assert_eq!(coord.len(), 2);
        coord.tick(frame()).unwrap();
        assert_eq!(controls(&m).updates, 3, "controls advance once per tick while dragged");
        m.pointer_up(&mut coord, &press(MouseButtonState::Released));
        assert_eq!(coord.len(), 1);
        assert_eq!(coord.driver_state(), DriverState::Running);

        m.teardown(&mut coord);
        assert!(coord.is_empty());
        assert_eq!(coord.driver_state(), DriverState::Stopped);
    }

    // ── wheel zoom ───────────────────────────────────────────────────────

    fn wheel(lines: f32) -> InputEvent {
        InputEvent::MouseWheel {
            delta: MouseWheelDelta::Line { x: 0.0, y: lines },
            modifiers: Modifiers::default(),
        }
    }

    fn orbit_mount(mode: MountMode, camera: Rc<RefCell<PerspectiveCamera>>) -> Mount<RecordingBackend, OrbitControls> {
        Mount::new(Rc::new("orbit"), 100, 100, 1.0, mode, move || {
            let controls = OrbitControls::with_settings(Rc::clone(&camera), OrbitSettings {
                enable_damping: false,
                ..OrbitSettings::default()
            });
            Ok(MountParts::new("orbit".to_string(), 0, controls))
        })
    }

    fn camera_on_z(z: f32) -> Rc<RefCell<PerspectiveCamera>> {
        let mut camera = PerspectiveCamera::default().at(glam::Vec3::new(0.0, 0.0, z));
        camera.look_at(glam::Vec3::ZERO);
        Rc::new(RefCell::new(camera))
    }

    #[test]
    fn wheel_without_drag_zooms_a_continuous_view() {
        let (mut coord, _log) = ready();
        let camera = camera_on_z(4.0);
        let mut m = orbit_mount(MountMode::Continuous, Rc::clone(&camera));
        m.mount(&mut coord).unwrap();

        m.input(&mut coord, &wheel(1.0)).unwrap();
        for _ in 0..3 {
            coord.tick(frame()).unwrap();
        }

        assert!((camera.borrow().position.z - 3.8).abs() < 1e-4, "z = {}", camera.borrow().position.z);
        assert!(coord.len() == 1, "no drag handle was registered");
    }

    #[test]
    fn wheel_without_drag_zooms_and_repaints_a_static_view() {
        let (mut coord, log) = ready();
        let camera = camera_on_z(4.0);
        let mut m = orbit_mount(MountMode::Static, Rc::clone(&camera));
        m.mount(&mut coord).unwrap();
        log.clear();

        m.input(&mut coord, &wheel(1.0)).unwrap();

        assert!((camera.borrow().position.z - 3.8).abs() < 1e-4, "z = {}", camera.borrow().position.z);
        assert_eq!(log.rendered(), vec!["orbit"]);
        assert!(coord.is_empty());
    }

    #[test]
    fn wheel_before_mount_is_ignored() {
        let (mut coord, log) = ready();
        let mut m = mount("a", MountMode::Static, Rc::default());
        m.input(&mut coord, &wheel(1.0)).unwrap();
        assert!(!m.is_built());
        assert!(log.calls().is_empty());
    }

    // ── resize / redraw / teardown ───────────────────────────────────────

    #[test]
    fn resize_updates_held_handles_and_repaints() {
        let (mut coord, log) = ready();
        let mut m = mount("a", MountMode::Static, Rc::default());
        m.mount(&mut coord).unwrap();
        m.pointer_down(&mut coord, &press(MouseButtonState::Pressed)).unwrap();
        let handle = m.interactive_handle().unwrap();
        log.clear();

        m.resize(&mut coord, 300, 150, 1.0).unwrap();

        let entry = coord.get(handle).found().unwrap();
        assert_eq!((entry.width, entry.height), (300, 150));
        assert_eq!(log.rendered(), vec!["scene-a"]);
        assert_eq!(controls(&m).viewport, Some(Viewport::new(300.0, 150.0)));
    }

    #[test]
    fn resize_before_mount_only_records_size() {
        let (mut coord, log) = ready();
        let builds = Rc::new(Cell::new(0));
        let mut m = mount("a", MountMode::Static, builds.clone());
        m.resize(&mut coord, 10, 10, 1.0).unwrap();
        assert_eq!(m.size(), (10, 10));
        assert_eq!(builds.get(), 0);
        assert!(log.calls().is_empty());
    }

    #[test]
    fn redraw_repaints_only_once_built() {
        let (mut coord, log) = ready();
        let mut m = mount("a", MountMode::Static, Rc::default());
        m.redraw(&mut coord).unwrap();
        assert!(log.rendered().is_empty());
        m.mount(&mut coord).unwrap();
        m.redraw(&mut coord).unwrap();
        assert_eq!(log.rendered(), vec!["scene-a", "scene-a"]);
    }

    #[test]
    fn teardown_releases_handles_and_drops_parts() {
        let (mut coord, _log) = ready();
        let mut m = mount("a", MountMode::Static, Rc::default());
        m.mount(&mut coord).unwrap();
        m.pointer_down(&mut coord, &press(MouseButtonState::Pressed)).unwrap();
        let scene = Rc::downgrade(&m.parts().unwrap().scene);

        m.teardown(&mut coord);

        assert!(coord.is_empty());
        assert!(!m.is_built());
        assert!(!m.is_interactive());
        assert!(scene.upgrade().is_none(), "scene freed with the mount's parts");
    }

    #[test]
    fn remount_after_teardown_rebuilds() {
        let (mut coord, _log) = ready();
        let builds = Rc::new(Cell::new(0));
        let mut m = mount("a", MountMode::Static, builds.clone());
        m.mount(&mut coord).unwrap();
        m.teardown(&mut coord);
        m.mount(&mut coord).unwrap();
        assert_eq!(builds.get(), 2);
    }

    #[test]
    fn builder_failure_propagates() {
        let (mut coord, log) = ready();
        let mut m: TestMount = Mount::new(Rc::new("x"), 1, 1, 1.0, MountMode::Static, || {
            anyhow::bail!("no geometry")
        });
        assert!(m.mount(&mut coord).is_err());
        assert!(!m.is_built());
        assert!(log.calls().is_empty());
    }

    #[test]
    fn shared_parts_render_the_caller_owned_scene() {
        let (mut coord, log) = ready();
        let scene = Rc::new(RefCell::new("shared".to_string()));
        let outside = Rc::clone(&scene);
        let mut m: TestMount = Mount::new(Rc::new("s"), 8, 8, 1.0, MountMode::Static, move || {
            Ok(MountParts::from_shared(
                Rc::clone(&scene),
                Rc::new(RefCell::new(0)),
                Rc::new(RefCell::new(TestControls::default())),
            ))
        });

        m.mount(&mut coord).unwrap();
        *outside.borrow_mut() = "changed".to_string();
        m.redraw(&mut coord).unwrap();

        assert_eq!(log.rendered(), vec!["shared", "changed"]);
    }
}
