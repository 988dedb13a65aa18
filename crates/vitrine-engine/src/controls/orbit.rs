use std::cell::RefCell;
use std::f32::consts::{PI, TAU};
use std::rc::Rc;

use glam::{Vec2, Vec3};

use super::{Controls, Viewport};
use crate::coordinator::Updatable;
use crate::input::{InputEvent, MouseButton};
use crate::scene::PerspectiveCamera;
use crate::time::FrameTime;

/// Keeps `phi` off the poles so the view basis stays defined.
const POLE_EPS: f32 = 1e-6;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitSettings {
    pub enable_damping: bool,
    /// Fraction of the pending motion applied per update.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub enable_zoom: bool,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle limits, radians from +Y.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            enable_zoom: true,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
        }
    }
}

/// Spherical coordinates around the orbit target (Y up).
#[derive(Debug, Copy, Clone, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y.
    phi: f32,
    /// Azimuth around Y, from +Z towards +X.
    theta: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
            theta: v.x.atan2(v.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let s = self.phi.sin() * self.radius;
        Vec3::new(s * self.theta.sin(), self.phi.cos() * self.radius, s * self.theta.cos())
    }
}

/// Orbits a shared camera around its target by dragging; wheel dollies.
///
/// Pointer motion is accumulated by `handle_event` and applied in `update`;
/// with damping on, motion decays over several updates after the drag ends.
pub struct OrbitControls {
    camera: Rc<RefCell<PerspectiveCamera>>,
    pub settings: OrbitSettings,
    viewport: Viewport,

    dragging: bool,
    last_pointer: Option<Vec2>,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl OrbitControls {
    pub fn new(camera: Rc<RefCell<PerspectiveCamera>>) -> Self {
        Self::with_settings(camera, OrbitSettings::default())
    }

    pub fn with_settings(camera: Rc<RefCell<PerspectiveCamera>>, settings: OrbitSettings) -> Self {
        Self {
            camera,
            settings,
            viewport: Viewport::new(1.0, 1.0),
            dragging: false,
            last_pointer: None,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    pub fn camera(&self) -> &Rc<RefCell<PerspectiveCamera>> {
        &self.camera
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// True while rotation or zoom is still pending.
    pub fn is_moving(&self) -> bool {
        self.delta_theta.abs() > 1e-5 || self.delta_phi.abs() > 1e-5 || (self.scale - 1.0).abs() > 1e-6
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Moves the camera towards the target by `factor` (`< 1` zooms in).
    pub fn dolly(&mut self, factor: f32) {
        if self.settings.enable_zoom && factor.is_finite() && factor > 0.0 {
            self.scale *= factor;
        }
    }

    fn zoom_factor(&self, lines: f32) -> f32 {
        0.95_f32.powf(self.settings.zoom_speed * lines.abs())
    }

    /// Applies pending motion to the camera. Called once per frame.
    pub fn apply(&mut self) {
        let mut camera = self.camera.borrow_mut();
        let mut s = Spherical::from_offset(camera.position - camera.target);

        let k = if self.settings.enable_damping {
            self.settings.damping_factor.clamp(0.0, 1.0)
        } else {
            1.0
        };
        s.theta += self.delta_theta * k;
        s.phi += self.delta_phi * k;

        let min_phi = self.settings.min_polar_angle.max(POLE_EPS);
        let max_phi = self.settings.max_polar_angle.min(PI - POLE_EPS);
        s.phi = s.phi.clamp(min_phi, max_phi.max(min_phi));
        s.theta = s.theta.rem_euclid(TAU);
        s.radius = (s.radius * self.scale).clamp(self.settings.min_distance, self.settings.max_distance);

        camera.position = camera.target + s.to_offset();

        if self.settings.enable_damping {
            self.delta_theta *= 1.0 - k;
            self.delta_phi *= 1.0 - k;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;
    }
}

impl Updatable for OrbitControls {
    fn update(&mut self, _time: FrameTime) {
        self.apply();
    }
}

impl Controls for OrbitControls {
    fn handle_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerButton(e) if e.button == MouseButton::Left => {
                let pressed = event.pressed().is_some();
                self.dragging = pressed;
                self.last_pointer = pressed.then(|| Vec2::new(e.x, e.y));
            }
            InputEvent::PointerMoved(e) if self.dragging => {
                let p = Vec2::new(e.x, e.y);
                if let Some(last) = self.last_pointer {
                    let d = (p - last) * self.settings.rotate_speed;
                    let h = self.viewport.height.max(1.0);
                    self.rotate_left(TAU * d.x / h);
                    self.rotate_up(TAU * d.y / h);
                }
                self.last_pointer = Some(p);
            }
            InputEvent::MouseWheel { delta, .. } => {
                let lines = delta.lines_y();
                if lines > 0.0 {
                    self.dolly(self.zoom_factor(lines));
                } else if lines < 0.0 {
                    self.dolly(1.0 / self.zoom_factor(lines));
                }
            }
            InputEvent::PointerLeft | InputEvent::Focused(false) => self.cancel(),
            _ => {}
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        if viewport.is_valid() {
            self.viewport = viewport;
        }
    }

    fn cancel(&mut self) {
        self.dragging = false;
        self.last_pointer = None;
    }
}
