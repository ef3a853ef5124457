//! Capsule Lander - descent and landing flight control for a capsule
//!
//! Core modules:
//! - `sim`: Landing sequencer, thrusters, autopilot procedures, distance probe
//! - `tuning`: Runtime view of the compile-time tunables
//! - `gates`: Permission checks the presentation layer feeds back into the sequencer
//! - `error`: Construction/configuration errors

pub mod error;
pub mod gates;
pub mod sim;
pub mod tuning;

pub use error::BuildError;
pub use tuning::LanderTuning;

use glam::{Mat3, Quat, Vec3};

/// Flight configuration constants
pub mod consts {
    use glam::Vec3;

    /// Fixed physics timestep (50 Hz)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Delay before the coasting impulse (seconds after scene entry)
    pub const PRE_COASTING_DELAY: f32 = 5.0;
    /// Velocity change applied toward the target when coasting starts
    pub const COASTING_SPEED: f32 = 1900.0;
    /// Angular velocity clamp while coasting (rad/s)
    pub const MAX_ANGULAR_VELOCITY: f32 = 0.3;
    /// Surface distance at which thrusters are armed for the burn
    pub const RETROGRADE_BURN_DISTANCE: f32 = 40000.0;
    /// Acceleration toward the target center during the burn
    pub const GRAVITY_STRENGTH: f32 = 10.0;
    /// Closing rate below which burn thrusters are forced to stop
    pub const CLOSING_RATE_CUTOFF: f32 = 1.0;

    /// Thruster force magnitudes per maneuver mode
    pub const TURN_FORCE: f32 = 100.0;
    pub const BURN_FORCE: f32 = 200.0;
    /// Held-key force as a fraction of the key-down force
    pub const SUSTAIN_SCALE: f32 = 0.8;
    /// Exhaust particle emission rates per maneuver mode
    pub const TURN_EMISSION_RATE: f32 = 15.0;
    pub const BURN_EMISSION_RATE: f32 = 115.0;

    /// Autopilot procedure duration (stabilize and land)
    pub const AUTOPILOT_DURATION: f32 = 5.0;
    /// Cosmetic autopilot toggle interval
    pub const COSMETIC_INTERVAL: f32 = 0.1;
    /// Cosmetic autopilot stops early below this surface distance
    pub const THRUSTER_MIN_DISTANCE: f32 = 10.0;
    /// Floor for the remaining time in the landing profile
    pub const LAND_MIN_REMAINING_TIME: f32 = 0.001;

    /// Staggered activation/shutdown timing
    pub const THRUSTER_READY_DELAY: f32 = 2.0;
    pub const THRUSTER_OFFLINE_DELAY: f32 = 2.0;
    /// Thruster numbers (1-based) in activation/shutdown order
    pub const STAGGER_ORDER: [u8; 4] = [3, 1, 4, 2];

    /// Target body
    pub const TARGET_CENTER: Vec3 = Vec3::new(0.0, -95000.0, 0.0);
    pub const APPROX_TARGET_RADIUS: f32 = 200.0;
    /// Approximate distance below which the ray query refines the estimate
    pub const RAY_REFINE_CUTOFF: f32 = 20000.0;

    /// Success thresholds for the landing window
    pub const LANDING_TARGET_DISTANCE: f32 = 100.0;
    pub const LANDING_TARGET_VELOCITY: f32 = 10.0;
    /// Half-angle (radians) within which the target counts as locked on
    pub const LOCK_ON_CONE: f32 = 0.05;
}

/// Capsule local axes
pub const LOCAL_FORWARD: Vec3 = Vec3::Z;
pub const LOCAL_UP: Vec3 = Vec3::Y;

/// Linear interpolation with `t` clamped to [0, 1]
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}

/// Limit a vector's length to `max`, keeping its direction
#[inline]
pub fn clamp_magnitude(v: Vec3, max: f32) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq > max * max {
        v * (max / len_sq.sqrt())
    } else {
        v
    }
}

/// Remove the component of `v` along `normal` (normal need not be unit length)
#[inline]
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    let n_sq = normal.length_squared();
    if n_sq <= f32::EPSILON {
        return v;
    }
    v - normal * (v.dot(normal) / n_sq)
}

/// Rotation mapping `LOCAL_FORWARD` to `forward` and `LOCAL_UP` to `up`
///
/// `forward` is re-orthogonalised against `up`. Returns `None` when the two
/// are parallel or either is zero.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let up = up.try_normalize()?;
    let forward = project_on_plane(forward, up).try_normalize()?;
    let right = up.cross(forward);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize())
}
