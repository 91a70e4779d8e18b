//! Orbit camera with eased motion
//!
//! Game logic sets *desired* parameters; every tick [`OrbitCamera::update_view`]
//! moves the *actual* parameters a fraction of the way there. The eye always
//! orbits the vertical axis through the origin, looking at `(0, height, 0)`.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::wrap_degrees;

/// Height and distance move this fraction of the gap per tick
const LINEAR_EASE: f32 = 0.1;
/// Angles move this fraction of the gap per tick
const ANGULAR_EASE: f32 = 0.2;
/// Height/distance gap below which actual snaps to desired
const LINEAR_SNAP: f32 = 0.1;
/// Angle gap (degrees) below which actual snaps to desired
const ANGULAR_SNAP: f32 = 0.2;

/// Hard limit on the vertical angle (degrees)
pub const MAX_ANGLE_Y: f32 = 75.0;
const MIN_DISTANCE: f32 = 1.0;
const MAX_SETTABLE: f32 = 1000.0;

/// Vertical field of view in degrees
pub const DEFAULT_FOV: f32 = 45.0;
pub const NEAR_PLANE: f32 = 1.0;
pub const FAR_PLANE: f32 = 500.0;

/// One set of orbit parameters. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitParams {
    pub height: f32,
    pub distance: f32,
    /// Horizontal angle around the vertical axis
    pub angle_x: f32,
    /// Elevation
    pub angle_y: f32,
}

impl Default for OrbitParams {
    fn default() -> Self {
        Self {
            height: CAMERA_HEIGHT,
            distance: CAMERA_DISTANCE,
            angle_x: CAMERA_ANGLE_X,
            angle_y: CAMERA_ANGLE_Y,
        }
    }
}

/// Eased orbital camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitCamera {
    desired: OrbitParams,
    actual: OrbitParams,
    /// Vertical field of view in degrees
    pub fov: f32,
}

fn ease(actual: &mut f32, desired: f32, fraction: f32, snap: f32) -> bool {
    if *actual == desired {
        return false;
    }
    if (desired - *actual).abs() < snap {
        *actual = desired;
    } else {
        *actual += (desired - *actual) * fraction;
    }
    true
}

impl OrbitCamera {
    pub fn new(params: OrbitParams) -> Self {
        Self {
            desired: params,
            actual: params,
            fov: DEFAULT_FOV,
        }
    }

    pub fn desired(&self) -> OrbitParams {
        self.desired
    }

    pub fn actual(&self) -> OrbitParams {
        self.actual
    }

    /// True while any actual parameter still differs from its desired value
    pub fn is_easing(&self) -> bool {
        self.desired != self.actual
    }

    /// True while the horizontal angle is still turning
    pub fn is_turning(&self) -> bool {
        self.desired.angle_x != self.actual.angle_x
    }

    /// Move actual parameters toward desired. Returns true if anything moved.
    pub fn update_view(&mut self) -> bool {
        let d = self.desired;
        let a = &mut self.actual;
        let mut changed = ease(&mut a.height, d.height, LINEAR_EASE, LINEAR_SNAP);
        changed |= ease(&mut a.distance, d.distance, LINEAR_EASE, LINEAR_SNAP);
        changed |= ease(&mut a.angle_y, d.angle_y, ANGULAR_EASE, ANGULAR_SNAP);
        changed |= ease(&mut a.angle_x, d.angle_x, ANGULAR_EASE, ANGULAR_SNAP);
        changed
    }

    /// Eye position, from actual parameters
    pub fn eye(&self) -> Vec3 {
        let a = self.actual;
        let (sx, cx) = a.angle_x.to_radians().sin_cos();
        let (sy, cy) = a.angle_y.to_radians().sin_cos();
        Vec3::new(
            a.distance * sx * cy,
            a.height + a.distance * sy,
            a.distance * cx * cy,
        )
    }

    /// Look-at point
    pub fn target(&self) -> Vec3 {
        Vec3::new(0.0, self.actual.height, 0.0)
    }

    pub fn up(&self) -> Vec3 {
        Vec3::Y
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target(), self.up())
    }

    /// OpenGL-style projection (depth -1..1), matching the unprojection in the resolver
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), aspect.max(1e-3), NEAR_PLANE, FAR_PLANE)
    }

    // ------------------------------------------------------------------
    // Desired-value setters
    // ------------------------------------------------------------------

    /// Change desired height, limiting the result to `[low, high]`
    pub fn adjust_height(&mut self, change: f32, low: f32, high: f32) {
        let h = &mut self.desired.height;
        if *h + change < low {
            *h = low;
        } else if *h + change > high {
            *h = high;
        } else {
            *h += change;
        }
    }

    /// Change desired distance, limiting the result to `[max(low, 1), high]`
    pub fn adjust_distance(&mut self, change: f32, low: f32, high: f32) {
        let low = low.max(MIN_DISTANCE);
        let d = &mut self.desired.distance;
        if *d + change < low {
            *d = low;
        } else if *d + change > high {
            *d = high;
        } else {
            *d += change;
        }
    }

    /// Turn the desired horizontal angle. Crossing ±360 shifts desired and
    /// actual together so the eased motion stays continuous.
    pub fn adjust_angle_x(&mut self, change: f32) {
        let (wrapped, correction) = wrap_degrees(self.desired.angle_x + change);
        self.desired.angle_x = wrapped;
        self.actual.angle_x += correction;
    }

    /// Change desired elevation within `[low, high]`, never beyond ±75
    pub fn adjust_angle_y(&mut self, change: f32, low: f32, high: f32) {
        let low = low.max(-MAX_ANGLE_Y);
        let high = high.min(MAX_ANGLE_Y);
        let a = &mut self.desired.angle_y;
        if *a + change < low {
            *a = low;
        } else if *a + change > high {
            *a = high;
        } else {
            *a += change;
        }
    }

    pub fn increase_distance(&mut self, change: f32, high: f32) {
        self.adjust_distance(change, self.desired.distance, high);
    }

    pub fn set_height(&mut self, value: f32) {
        self.adjust_height(value - self.desired.height, 0.0, MAX_SETTABLE);
    }

    pub fn set_distance(&mut self, value: f32) {
        self.adjust_distance(value - self.desired.distance, MIN_DISTANCE, MAX_SETTABLE);
    }

    pub fn set_angle_x(&mut self, value: f32) {
        self.adjust_angle_x(value - self.desired.angle_x);
    }

    pub fn set_angle_y(&mut self, value: f32) {
        self.adjust_angle_y(value - self.desired.angle_y, -MAX_ANGLE_Y, MAX_ANGLE_Y);
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(OrbitParams::default())
    }
}
