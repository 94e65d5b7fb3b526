//! Camera rig - perspective camera plus orbit/truck/dolly controller
//!
//! The controller keeps two poses: the current one the camera shows and
//! the goal that input moves. `advance` eases current toward goal using the
//! configured time constants and reports whether the camera moved, which
//! is what the render scheduler uses to decide on a redraw.
//!
//! World convention is Y-up. Orbit angles are measured like spherical
//! coordinates: `theta` around +Y starting at +Z, `phi` down from +Y.

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use tracing::debug;
use vantage_core::Aabb;

use crate::config::{CameraConfig, ControlsConfig};
use crate::render::Viewport;

/// Pose changes below this are not worth a redraw
const CHANGE_EPSILON: f32 = 1e-6;
/// Keeps the orbit away from the poles where look-at degenerates
const POLAR_MARGIN: f32 = 1e-3;
/// Distance factor per wheel notch at dolly speed 1
const DOLLY_BASE: f32 = 0.8;
/// Drag pixels that count as one wheel notch when dollying by drag
const DOLLY_DRAG_PIXELS: f32 = 20.0;
/// Fit leaves this much slack around the framed box
const FIT_PADDING: f32 = 1.05;
const MIN_DISTANCE: f32 = 1e-3;

/// What a pointer button (or the wheel) does to the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraAction {
    None,
    Rotate,
    Truck,
    Dolly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

/// Fixed pointer-to-action mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseBindings {
    pub left: CameraAction,
    pub middle: CameraAction,
    pub right: CameraAction,
    pub wheel: CameraAction,
}

impl MouseBindings {
    pub fn action_for(&self, button: PointerButton) -> CameraAction {
        match button {
            PointerButton::Left => self.left,
            PointerButton::Middle => self.middle,
            PointerButton::Right => self.right,
        }
    }
}

/// Single perspective camera with a look-at pose
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_degrees,
            aspect,
            near,
            far,
            position: Vec3::Z,
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world point into normalized device coordinates
    ///
    /// Returns `None` for points at or behind the camera plane. Points in
    /// view have all three components within `[-1, 1]`.
    pub fn project(&self, point: Vec3) -> Option<Vec3> {
        let clip = self.view_projection() * Vec4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        Some(clip.truncate() / clip.w)
    }

    /// Unit vector from the camera toward its target
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}

/// Orbit offset from target to camera
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    theta: f32,
    phi: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return Self {
                radius: MIN_DISTANCE,
                theta: 0.0,
                phi: PI / 2.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
        .clamped()
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }

    fn clamped(mut self) -> Self {
        self.phi = self.phi.clamp(POLAR_MARGIN, PI - POLAR_MARGIN);
        self.radius = self.radius.max(MIN_DISTANCE);
        self
    }

    fn lerp(self, goal: Spherical, t: f32) -> Spherical {
        Spherical {
            radius: self.radius + (goal.radius - self.radius) * t,
            theta: self.theta + (goal.theta - self.theta) * t,
            phi: self.phi + (goal.phi - self.phi) * t,
        }
    }

    fn differs(&self, other: &Spherical) -> bool {
        (self.radius - other.radius).abs() > CHANGE_EPSILON
            || (self.theta - other.theta).abs() > CHANGE_EPSILON
            || (self.phi - other.phi).abs() > CHANGE_EPSILON
    }
}

/// Interaction configuration, fixed at construction
#[derive(Debug, Clone)]
pub struct RigSettings {
    pub bindings: MouseBindings,
    pub smooth_time: f32,
    pub dragging_smooth_time: f32,
    pub dolly_speed: f32,
    pub dolly_to_cursor: bool,
    pub rotate_speed: f32,
    pub truck_speed: f32,
}

impl From<&ControlsConfig> for RigSettings {
    fn from(config: &ControlsConfig) -> Self {
        Self {
            bindings: config.bindings(),
            smooth_time: config.smooth_time.max(0.0),
            dragging_smooth_time: config.dragging_smooth_time.max(0.0),
            dolly_speed: config.dolly_speed,
            dolly_to_cursor: config.dolly_to_cursor,
            rotate_speed: config.rotate_speed,
            truck_speed: config.truck_speed,
        }
    }
}

impl Default for RigSettings {
    fn default() -> Self {
        Self::from(&ControlsConfig::default())
    }
}

/// Camera plus interaction controller, advanced once per frame
#[derive(Debug, Clone)]
pub struct CameraRig {
    camera: PerspectiveCamera,
    settings: RigSettings,
    viewport: Viewport,
    current: Spherical,
    goal: Spherical,
    target: Vec3,
    goal_target: Vec3,
    dragging: bool,
    dirty: bool,
    enabled: bool,
}

impl CameraRig {
    pub fn new(camera_config: &CameraConfig, settings: RigSettings, viewport: Viewport) -> Self {
        let camera = PerspectiveCamera::new(
            camera_config.fov_degrees,
            viewport.aspect(),
            camera_config.near,
            camera_config.far,
        );
        let mut rig = Self {
            camera,
            settings,
            viewport,
            current: Spherical::from_offset(Vec3::Z),
            goal: Spherical::from_offset(Vec3::Z),
            target: Vec3::ZERO,
            goal_target: Vec3::ZERO,
            dragging: false,
            dirty: true,
            enabled: true,
        };
        rig.set_look_at(
            Vec3::from_array(camera_config.position),
            Vec3::from_array(camera_config.target),
            false,
        );
        rig
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn settings(&self) -> &RigSettings {
        &self.settings
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Distance from camera to orbit target in the goal pose
    pub fn distance(&self) -> f32 {
        self.goal.radius
    }

    pub fn goal_target(&self) -> Vec3 {
        self.goal_target
    }

    /// Place the camera at `position` orbiting `target`
    pub fn set_look_at(&mut self, position: Vec3, target: Vec3, animate: bool) {
        self.goal = Spherical::from_offset(position - target);
        self.goal_target = target;
        if !animate {
            self.current = self.goal;
            self.target = target;
            self.sync_camera();
        }
        self.dirty = true;
    }

    /// Match the projection to a new viewport size
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport.height == 0 || viewport.width == 0 {
            debug!(width = viewport.width, height = viewport.height, "Ignoring empty viewport");
            return;
        }
        self.viewport = viewport;
        self.camera.aspect = viewport.aspect();
        self.dirty = true;
    }

    /// Advance toward the goal pose; true when the camera changed enough
    /// to need a redraw
    pub fn advance(&mut self, delta_seconds: f32) -> bool {
        let smooth_time = if self.dragging {
            self.settings.dragging_smooth_time
        } else {
            self.settings.smooth_time
        };
        let t = if smooth_time <= 0.0 {
            1.0
        } else {
            1.0 - (-delta_seconds.max(0.0) / smooth_time).exp()
        };

        let previous = (self.current, self.target);
        self.current = self.current.lerp(self.goal, t);
        self.target = self.target.lerp(self.goal_target, t);
        if !self.current.differs(&self.goal) {
            self.current = self.goal;
        }
        if self.target.distance(self.goal_target) <= CHANGE_EPSILON {
            self.target = self.goal_target;
        }
        self.sync_camera();

        let moved = self.current.differs(&previous.0)
            || self.target.distance(previous.1) > CHANGE_EPSILON;
        let changed = moved || self.dirty;
        self.dirty = false;
        changed
    }

    fn sync_camera(&mut self) {
        self.camera.target = self.target;
        self.camera.position = self.target + self.current.to_offset();
    }

    /// Pointer moved by `delta` pixels with `button` held
    pub fn pointer_drag(&mut self, button: PointerButton, delta: Vec2, cursor_ndc: Option<Vec2>) {
        if !self.enabled || delta == Vec2::ZERO {
            return;
        }
        let action = self.settings.bindings.action_for(button);
        if action == CameraAction::None {
            return;
        }
        self.dragging = true;
        match action {
            CameraAction::Rotate => self.rotate_by_pixels(delta),
            CameraAction::Truck => self.truck_by_pixels(delta),
            CameraAction::Dolly => self.dolly(-delta.y / DOLLY_DRAG_PIXELS, cursor_ndc),
            CameraAction::None => {}
        }
    }

    /// All pointer buttons released
    pub fn pointer_released(&mut self) {
        self.dragging = false;
    }

    /// Wheel scrolled by `notches`; positive moves toward the scene
    pub fn wheel(&mut self, notches: f32, cursor_ndc: Option<Vec2>) {
        if !self.enabled || notches == 0.0 {
            return;
        }
        match self.settings.bindings.wheel {
            CameraAction::Dolly => self.dolly(notches, cursor_ndc),
            CameraAction::Rotate => self.rotate_by_pixels(Vec2::new(0.0, notches * DOLLY_DRAG_PIXELS)),
            CameraAction::Truck => self.truck_by_pixels(Vec2::new(0.0, notches * DOLLY_DRAG_PIXELS)),
            CameraAction::None => {}
        }
    }

    fn rotate_by_pixels(&mut self, delta: Vec2) {
        let height = self.viewport.height.max(1) as f32;
        let speed = TAU * self.settings.rotate_speed / height;
        self.goal.theta -= delta.x * speed;
        self.goal.phi -= delta.y * speed;
        self.goal = self.goal.clamped();
    }

    fn truck_by_pixels(&mut self, delta: Vec2) {
        let height = self.viewport.height.max(1) as f32;
        let half_fov = self.camera.fov_degrees.to_radians() * 0.5;
        let scale = self.settings.truck_speed * self.goal.radius * half_fov.tan() / height;
        let (right, up) = view_basis(-self.goal.to_offset());
        self.goal_target += -right * delta.x * scale + up * delta.y * scale;
    }

    fn dolly(&mut self, notches: f32, cursor_ndc: Option<Vec2>) {
        let scale = DOLLY_BASE.powf(notches * self.settings.dolly_speed);
        let old_radius = self.goal.radius;
        let new_radius = (old_radius * scale).max(MIN_DISTANCE);

        if self.settings.dolly_to_cursor {
            if let Some(cursor) = cursor_ndc {
                // Keep the point under the cursor (on the plane through the
                // target) fixed on screen
                let (right, up) = view_basis(-self.goal.to_offset());
                let half_h = old_radius * (self.camera.fov_degrees.to_radians() * 0.5).tan();
                let half_w = half_h * self.camera.aspect;
                let under_cursor =
                    self.goal_target + right * (cursor.x * half_w) + up * (cursor.y * half_h);
                let ratio = 1.0 - new_radius / old_radius;
                self.goal_target += (under_cursor - self.goal_target) * ratio;
            }
        }
        self.goal.radius = new_radius;
    }

    /// Move the camera so `bounds` fills the view from the current viewing
    /// direction. Degenerate bounds leave the camera untouched and return
    /// false.
    pub fn fit_to_bounds(&mut self, bounds: &Aabb, animate: bool) -> bool {
        if bounds.is_degenerate() {
            debug!(min = ?bounds.min, max = ?bounds.max, "Skipping camera fit for degenerate bounds");
            return false;
        }

        let center = bounds.center();
        let forward = -self.goal.to_offset().normalize_or(Vec3::NEG_Z);
        let (right, up) = view_basis(forward);
        let tan_v = (self.camera.fov_degrees.to_radians() * 0.5).tan() / FIT_PADDING;
        let tan_h = tan_v * self.camera.aspect;
        let min_depth = self.camera.near * FIT_PADDING;

        let mut distance = 0.0_f32;
        for corner in bounds.corners() {
            let rel = corner - center;
            let needed_depth = (rel.dot(right).abs() / tan_h)
                .max(rel.dot(up).abs() / tan_v)
                .max(min_depth);
            distance = distance.max(needed_depth - rel.dot(forward));
        }
        let distance = distance.max(MIN_DISTANCE);

        // The far plane must reach the deepest corner
        let deepest = bounds
            .corners()
            .iter()
            .map(|corner| distance + (*corner - center).dot(forward))
            .fold(0.0_f32, f32::max);
        if deepest * FIT_PADDING > self.camera.far {
            debug!(far = self.camera.far, deepest, "Extending far plane to fit bounds");
            self.camera.far = deepest * FIT_PADDING;
        }

        self.goal.radius = distance;
        self.goal_target = center;
        if !animate {
            self.current = self.goal;
            self.target = center;
            self.sync_camera();
        }
        self.dirty = true;
        debug!(center = ?center, distance, "Fitted camera to bounds");
        true
    }

    /// Release the interaction controller; later input is ignored
    pub fn dispose(&mut self) {
        self.enabled = false;
        self.dragging = false;
        self.goal = self.current;
        self.goal_target = self.target;
    }
}

/// Right and up vectors for a view looking along `forward` with +Y up,
/// taken from the same look-at matrix the camera renders with
fn view_basis(forward: Vec3) -> (Vec3, Vec3) {
    let forward = forward.normalize_or(Vec3::NEG_Z);
    let view = Mat4::look_at_rh(Vec3::ZERO, forward, Vec3::Y);
    let right = view.row(0).truncate();
    let up = view.row(1).truncate();
    if !right.is_finite() || !up.is_finite() {
        return (Vec3::X, Vec3::Y);
    }
    (right, up)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig(width: u32, height: u32) -> CameraRig {
        CameraRig::new(
            &CameraConfig::default(),
            RigSettings::default(),
            Viewport::new(width, height),
        )
    }

    fn assert_in_frustum(camera: &PerspectiveCamera, bounds: &Aabb) {
        for corner in bounds.corners() {
            let ndc = camera.project(corner).expect("corner behind camera");
            for axis in ndc.to_array() {
                assert!(
                    (-1.0..=1.0).contains(&axis),
                    "corner {corner:?} projects outside view: {ndc:?}"
                );
            }
        }
    }

    #[test]
    fn test_initial_pose() {
        let mut rig = rig(800, 600);
        let camera = rig.camera();
        assert!((camera.position - Vec3::splat(10.0)).length() < 1e-4);
        assert_eq!(camera.target, Vec3::ZERO);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);

        // First tick reports the initial pose, then the rig settles
        assert!(rig.advance(0.016));
        assert!(!rig.advance(0.016));
    }

    #[test]
    fn test_fit_keeps_corners_in_view() {
        let boxes = [
            Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)),
            Aabb::new(Vec3::new(3.0, -2.0, 5.0), Vec3::new(40.0, 1.0, 9.0)),
            Aabb::new(Vec3::new(-0.01, -0.02, -0.03), Vec3::new(0.01, 0.02, 0.03)),
            Aabb::new(Vec3::new(-50.0, 0.0, -5.0), Vec3::new(50.0, 2.0, 5.0)),
            Aabb::new(Vec3::new(100.0, 100.0, 100.0), Vec3::new(101.0, 130.0, 102.0)),
            // Larger than the default far plane
            Aabb::new(Vec3::splat(-600.0), Vec3::splat(600.0)),
        ];
        let viewports = [Viewport::new(1920, 1080), Viewport::new(400, 900)];
        let drags = [Vec2::ZERO, Vec2::new(120.0, -40.0), Vec2::new(-300.0, 250.0)];

        for viewport in viewports {
            for drag in drags {
                for bounds in &boxes {
                    let mut rig = rig(viewport.width, viewport.height);
                    rig.pointer_drag(PointerButton::Right, drag, None);
                    rig.advance(0.016);
                    assert!(rig.fit_to_bounds(bounds, false));
                    assert_in_frustum(rig.camera(), bounds);
                    assert!((rig.camera().target - bounds.center()).length() < 1e-3);
                }
            }
        }
    }

    #[test]
    fn test_fit_at_pole_uses_render_basis() {
        let mut rig = rig(400, 900);
        rig.pointer_drag(PointerButton::Right, Vec2::new(-300.0, 250.0), None);
        rig.advance(0.016);
        // Dragged up against the orbit limit
        assert!(rig.camera().forward().y < -0.99);

        let bounds = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert!(rig.fit_to_bounds(&bounds, false));
        assert_in_frustum(rig.camera(), &bounds);
    }

    #[test]
    fn test_fit_extends_far_plane() {
        let mut rig = rig(800, 600);
        assert_eq!(rig.camera().far, 1000.0);
        let bounds = Aabb::new(Vec3::splat(-600.0), Vec3::splat(600.0));
        assert!(rig.fit_to_bounds(&bounds, false));
        assert!(rig.camera().far > 1000.0);
        assert_in_frustum(rig.camera(), &bounds);

        // Small boxes never shrink it again
        let far = rig.camera().far;
        rig.fit_to_bounds(&Aabb::new(Vec3::ZERO, Vec3::ONE), false);
        assert_eq!(rig.camera().far, far);
    }

    #[test]
    fn test_fit_degenerate_is_noop() {
        let mut rig = rig(800, 600);
        rig.advance(0.016);
        let before = rig.camera().clone();

        assert!(!rig.fit_to_bounds(&Aabb::EMPTY, false));
        assert!(!rig.fit_to_bounds(&Aabb::new(Vec3::ZERO, Vec3::new(5.0, 5.0, 0.0)), false));
        assert_eq!(rig.camera(), &before);
        assert!(!rig.advance(0.016));
    }

    #[test]
    fn test_fit_marks_change() {
        let mut rig = rig(800, 600);
        rig.advance(0.016);
        rig.fit_to_bounds(&Aabb::new(Vec3::ZERO, Vec3::ONE), false);
        assert!(rig.advance(0.016));
    }

    #[test]
    fn test_animated_fit_eases_in() {
        let config = ControlsConfig {
            smooth_time: 0.25,
            ..ControlsConfig::default()
        };
        let mut rig = CameraRig::new(
            &CameraConfig::default(),
            RigSettings::from(&config),
            Viewport::new(800, 600),
        );
        rig.advance(0.0);
        let bounds = Aabb::new(Vec3::new(20.0, 0.0, 0.0), Vec3::new(22.0, 2.0, 2.0));
        rig.fit_to_bounds(&bounds, true);

        let start = rig.camera().target;
        assert!(rig.advance(0.05));
        let mid = rig.camera().target;
        assert!(mid.distance(start) > 0.0);
        assert!(mid.distance(bounds.center()) > 1e-3);

        for _ in 0..200 {
            rig.advance(0.05);
        }
        assert!(rig.camera().target.distance(bounds.center()) < 1e-3);
        assert!(!rig.advance(0.05));
    }

    #[test]
    fn test_bindings_left_disabled_right_rotates() {
        let mut rig = rig(800, 600);
        rig.advance(0.016);
        let before = rig.camera().position;

        rig.pointer_drag(PointerButton::Left, Vec2::new(50.0, 0.0), None);
        assert!(!rig.advance(0.016));
        assert_eq!(rig.camera().position, before);

        rig.pointer_drag(PointerButton::Right, Vec2::new(50.0, 0.0), None);
        assert!(rig.advance(0.016));
        let after = rig.camera().position;
        // Orbiting keeps the distance to the target
        assert!((after.length() - before.length()).abs() < 1e-3);
        assert!(after.distance(before) > 0.1);
        rig.pointer_released();
    }

    #[test]
    fn test_wheel_dolly_toward_center() {
        let mut rig = rig(800, 600);
        rig.advance(0.016);
        let distance = rig.distance();

        rig.wheel(1.0, Some(Vec2::ZERO));
        assert!(rig.advance(0.016));
        assert!(rig.distance() < distance);
        assert!(rig.camera().target.length() < 1e-5);

        rig.wheel(-2.0, None);
        rig.advance(0.016);
        assert!(rig.distance() > distance);
    }

    #[test]
    fn test_dolly_to_cursor_shifts_target() {
        let mut rig = rig(800, 600);
        rig.advance(0.016);
        rig.wheel(1.0, Some(Vec2::new(1.0, 0.0)));
        rig.advance(0.016);
        // Zooming at the right edge pulls the target toward screen-right
        let (right, _) = view_basis(rig.camera().forward());
        assert!(rig.camera().target.dot(right) > 0.0);
    }

    #[test]
    fn test_truck_moves_target() {
        let config = ControlsConfig {
            left: CameraAction::Truck,
            ..ControlsConfig::default()
        };
        let mut rig = CameraRig::new(
            &CameraConfig::default(),
            RigSettings::from(&config),
            Viewport::new(800, 600),
        );
        rig.advance(0.016);
        let distance = rig.distance();
        rig.pointer_drag(PointerButton::Left, Vec2::new(40.0, 10.0), None);
        assert!(rig.advance(0.016));
        assert!(rig.camera().target.length() > 0.0);
        assert!((rig.distance() - distance).abs() < 1e-4);
    }

    #[test]
    fn test_viewport_updates_aspect() {
        let mut rig = rig(800, 600);
        rig.advance(0.016);
        rig.set_viewport(Viewport::new(1000, 250));
        assert!((rig.camera().aspect - 4.0).abs() < 1e-6);
        assert!(rig.advance(0.016));

        // An empty viewport (minimised window) keeps the last aspect
        rig.set_viewport(Viewport::new(1000, 0));
        assert!((rig.camera().aspect - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_disposed_rig_ignores_input() {
        let mut rig = rig(800, 600);
        rig.advance(0.016);
        rig.dispose();
        rig.pointer_drag(PointerButton::Right, Vec2::new(80.0, 20.0), None);
        rig.wheel(3.0, None);
        assert!(!rig.advance(0.016));
        assert!(!rig.is_enabled());
    }

    #[test]
    fn test_spherical_round_trip() {
        let offset = Vec3::new(3.0, 4.0, -2.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!((back - offset).length() < 1e-4);
    }
}
