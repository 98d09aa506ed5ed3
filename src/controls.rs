use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

use crate::camera::Camera;

const POLAR_EPSILON: f32 = 1e-6;
const PIXELS_PER_WHEEL_LINE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y.
    phi: f32,
    /// Azimuth around Y, measured from +Z towards +X.
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }

        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Pointer input in window pixels, decoupled from winit's event type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Pressed(MouseButton),
    Released(MouseButton),
    Moved(Vec2),
    Left,
    /// Wheel steps, positive away from the user.
    Wheel(f32),
}

impl PointerInput {
    pub fn from_window_event(event: &WindowEvent) -> Option<Self> {
        match event {
            WindowEvent::MouseInput { state, button, .. } => Some(match state {
                ElementState::Pressed => Self::Pressed(*button),
                ElementState::Released => Self::Released(*button),
            }),
            WindowEvent::CursorMoved { position, .. } => Some(Self::Moved(Vec2::new(
                position.x as f32,
                position.y as f32,
            ))),
            WindowEvent::CursorLeft { .. } => Some(Self::Left),
            WindowEvent::MouseWheel { delta, .. } => Some(Self::Wheel(match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(position) => {
                    position.y as f32 / PIXELS_PER_WHEEL_LINE
                }
            })),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Rotate,
    Pan,
}

/// Orbits a camera around `target`: left drag rotates, right drag pans, the wheel zooms.
///
/// Input only accumulates motion; `update` applies it to the camera once per frame.
/// With damping enabled each update applies `damping_factor` of the pending motion
/// and keeps the rest for later frames.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vec3,
    scale: f32,

    drag: Option<DragMode>,
    cursor: Option<Vec2>,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
            drag: None,
            cursor: None,
        }
    }
}

impl OrbitControls {
    pub fn with_target(target: Vec3) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    pub fn rotate_by_pixels(&mut self, delta_x: f32, delta_y: f32, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }

        self.delta_theta -= TAU * delta_x / viewport_height * self.rotate_speed;
        self.delta_phi -= TAU * delta_y / viewport_height * self.rotate_speed;
    }

    /// Moves the target in the camera's screen plane so the scene follows the pointer.
    pub fn pan_by_pixels(
        &mut self,
        delta_x: f32,
        delta_y: f32,
        viewport_height: f32,
        camera: &Camera,
    ) {
        if viewport_height <= 0.0 {
            return;
        }

        let offset = camera.eye - self.target;
        let target_distance = offset.length() * (camera.fov_y.to_radians() * 0.5).tan();
        let world_per_pixel = 2.0 * target_distance / viewport_height * self.pan_speed;

        let view = camera.view_matrix();
        let right = view.row(0).truncate();
        let up = view.row(1).truncate();

        self.pan_offset += -right * delta_x * world_per_pixel + up * delta_y * world_per_pixel;
    }

    /// Positive steps zoom in.
    pub fn zoom_by_steps(&mut self, steps: f32) {
        let zoom_scale = 0.95f32.powf(self.zoom_speed * steps.abs());
        if steps > 0.0 {
            self.scale *= zoom_scale;
        } else if steps < 0.0 {
            self.scale /= zoom_scale;
        }
    }

    /// Returns true when the input was used by the controls.
    ///
    /// With `ui_captured` set, presses and wheel steps belong to the UI. Moves and
    /// releases still arrive so a drag that started on the canvas can finish.
    pub fn handle_pointer(
        &mut self,
        input: PointerInput,
        camera: &Camera,
        viewport_height: f32,
        ui_captured: bool,
    ) -> bool {
        match input {
            PointerInput::Pressed(button) => {
                if ui_captured {
                    return false;
                }

                let mode = match button {
                    MouseButton::Left => DragMode::Rotate,
                    MouseButton::Right | MouseButton::Middle => DragMode::Pan,
                    _ => return false,
                };
                self.drag = Some(mode);
                true
            }
            PointerInput::Released(_) => self.drag.take().is_some(),
            PointerInput::Moved(position) => {
                let previous = self.cursor.replace(position);

                let (Some(mode), Some(previous)) = (self.drag, previous) else {
                    return false;
                };

                let delta = position - previous;
                match mode {
                    DragMode::Rotate => self.rotate_by_pixels(delta.x, delta.y, viewport_height),
                    DragMode::Pan => self.pan_by_pixels(delta.x, delta.y, viewport_height, camera),
                }
                true
            }
            // A release outside the window is never reported
            PointerInput::Left => {
                self.cursor = None;
                self.drag.take().is_some()
            }
            PointerInput::Wheel(steps) => {
                if ui_captured {
                    return false;
                }

                self.zoom_by_steps(steps);
                true
            }
        }
    }

    /// Applies pending motion to the camera. Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let mut spherical = Spherical::from_offset(camera.eye - self.target);

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        spherical.theta += self.delta_theta * factor;
        spherical.phi += self.delta_phi * factor;
        spherical.phi = spherical.phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset * factor;

        let previous_eye = camera.eye;
        camera.target = self.target;
        camera.eye = self.target + spherical.to_offset();

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        previous_eye.distance_squared(camera.eye) > 1e-12
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        let mut camera = Camera::perspective(75.0, 1.0, 0.1, 100.0);
        camera.eye = Vec3::new(1.0, 1.0, 2.0);
        camera
    }

    #[test]
    fn idle_update_keeps_camera_in_place() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        controls.enable_damping = true;

        controls.update(&mut camera);

        assert!(camera.eye.abs_diff_eq(Vec3::new(1.0, 1.0, 2.0), 1e-5));
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn undamped_rotation_applies_in_one_update() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        let before = Spherical::from_offset(camera.eye);

        // A drag across the full viewport height is one full turn.
        controls.rotate_by_pixels(250.0, 0.0, 1000.0);
        assert!(controls.update(&mut camera));

        let after = Spherical::from_offset(camera.eye);
        assert!((after.theta - (before.theta - std::f32::consts::FRAC_PI_2)).abs() < 1e-4);
        assert!((after.radius - before.radius).abs() < 1e-4);

        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn damped_rotation_converges_to_the_full_delta() {
        let mut damped_camera = camera();
        let mut damped = OrbitControls::default();
        damped.enable_damping = true;

        let mut instant_camera = camera();
        let mut instant = OrbitControls::default();

        damped.rotate_by_pixels(100.0, 0.0, 1000.0);
        instant.rotate_by_pixels(100.0, 0.0, 1000.0);
        instant.update(&mut instant_camera);

        damped.update(&mut damped_camera);
        assert!(damped_camera.eye.distance(instant_camera.eye) > 1e-3);

        for _ in 0..500 {
            damped.update(&mut damped_camera);
        }
        assert!(damped_camera.eye.abs_diff_eq(instant_camera.eye, 1e-4));
    }

    #[test]
    fn polar_angle_never_reaches_the_poles() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();

        controls.rotate_by_pixels(0.0, 10_000.0, 100.0);
        controls.update(&mut camera);

        let offset = camera.eye - controls.target;
        assert!(offset.y > 0.0);
        assert!(Vec2::new(offset.x, offset.z).length() > 0.0);
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn zoom_respects_distance_limits() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        controls.min_distance = 1.0;
        let start = camera.eye.length();

        controls.zoom_by_steps(1.0);
        controls.update(&mut camera);
        assert!((camera.eye.length() - start * 0.95).abs() < 1e-5);

        controls.zoom_by_steps(200.0);
        controls.update(&mut camera);
        assert!((camera.eye.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn panning_moves_target_and_eye_together() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();
        let offset = camera.eye - controls.target;

        controls.pan_by_pixels(50.0, 0.0, 500.0, &camera);
        controls.update(&mut camera);

        assert_ne!(controls.target, Vec3::ZERO);
        assert!((camera.eye - controls.target).abs_diff_eq(offset, 1e-5));
        // dragging right moves the scene right, so the target moves left
        let right = camera.view_matrix().row(0).truncate();
        assert!(controls.target.dot(right) < 0.0);
    }

    fn drag(controls: &mut OrbitControls, camera: &Camera, from: f32, to: f32, ui_captured: bool) {
        for x in [from, to] {
            let moved = PointerInput::Moved(Vec2::new(x, 100.0));
            controls.handle_pointer(moved, camera, 500.0, ui_captured);
        }
    }

    #[test]
    fn left_drag_rotates_the_camera() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();

        assert!(controls.handle_pointer(
            PointerInput::Pressed(MouseButton::Left),
            &camera,
            500.0,
            false
        ));
        assert!(controls.drag.is_some());
        drag(&mut controls, &camera, 10.0, 60.0, false);

        assert!(controls.update(&mut camera));
    }

    #[test]
    fn ui_capture_blocks_presses_and_wheel_but_not_an_open_drag() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();

        assert!(!controls.handle_pointer(
            PointerInput::Pressed(MouseButton::Left),
            &camera,
            500.0,
            true
        ));
        assert!(!controls.handle_pointer(PointerInput::Wheel(1.0), &camera, 500.0, true));
        assert!(controls.drag.is_none());
        assert!(!controls.update(&mut camera));

        controls.handle_pointer(PointerInput::Pressed(MouseButton::Left), &camera, 500.0, false);
        drag(&mut controls, &camera, 10.0, 60.0, true);
        assert!(controls.update(&mut camera));

        assert!(controls.handle_pointer(
            PointerInput::Released(MouseButton::Left),
            &camera,
            500.0,
            true
        ));
        assert!(controls.drag.is_none());
    }

    #[test]
    fn leaving_the_window_ends_the_drag() {
        let mut camera = camera();
        let mut controls = OrbitControls::default();

        controls.handle_pointer(PointerInput::Pressed(MouseButton::Right), &camera, 500.0, false);
        assert!(controls.handle_pointer(PointerInput::Left, &camera, 500.0, false));
        assert!(controls.drag.is_none());

        // Coming back without a button held must not pan
        drag(&mut controls, &camera, 10.0, 60.0, false);
        assert!(!controls.update(&mut camera));
    }
}
