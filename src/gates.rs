//! Pilot permission checks
//!
//! The presentation layer decides when stabilizing and landing are allowed
//! and feeds the answer back through `set_can_stabilize`/`set_can_land`.
//! These helpers are the checks the lander camera HUD makes.

use glam::Vec3;

use crate::sim::phase::LandingPhase;
use crate::sim::services::CapsuleKinematics;
use crate::tuning::LanderTuning;

/// Capsule-local view axis of the lander camera (out through the heat shield)
pub const CAMERA_AXIS: Vec3 = Vec3::NEG_Y;

/// True when the target center sits within `cone` radians of the camera axis
pub fn target_locked(kinematics: &CapsuleKinematics, target_center: Vec3, cone: f32) -> bool {
    let Some(to_target) = (target_center - kinematics.position).try_normalize() else {
        return false;
    };
    let view = kinematics.orientation * CAMERA_AXIS;
    view.dot(to_target).clamp(-1.0, 1.0).acos() <= cone
}

/// Close and slow enough to hand over to the landing autopilot
pub fn landing_window_open(
    phase: LandingPhase,
    distance: f32,
    speed: f32,
    tuning: &LanderTuning,
) -> bool {
    phase == LandingPhase::RetrogradeBurn
        && distance <= tuning.landing_target_distance
        && speed <= tuning.landing_target_velocity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::LOCK_ON_CONE;
    use glam::Quat;

    fn at(position: Vec3, orientation: Quat) -> CapsuleKinematics {
        CapsuleKinematics {
            position,
            orientation,
            ..Default::default()
        }
    }

    #[test]
    fn test_locked_when_looking_down_at_target() {
        let k = at(Vec3::ZERO, Quat::IDENTITY);
        assert!(target_locked(&k, Vec3::new(0.0, -1000.0, 0.0), LOCK_ON_CONE));
        // Slightly off axis, still inside the cone
        assert!(target_locked(&k, Vec3::new(20.0, -1000.0, 0.0), LOCK_ON_CONE));
    }

    #[test]
    fn test_not_locked_off_axis() {
        let tilted = Quat::from_rotation_x(0.3);
        let k = at(Vec3::ZERO, tilted);
        assert!(!target_locked(&k, Vec3::new(0.0, -1000.0, 0.0), LOCK_ON_CONE));
        // At the target there is no direction to look
        assert!(!target_locked(&at(Vec3::ONE, Quat::IDENTITY), Vec3::ONE, LOCK_ON_CONE));
    }

    #[test]
    fn test_landing_window() {
        let tuning = LanderTuning::default();
        let burn = LandingPhase::RetrogradeBurn;
        assert!(landing_window_open(burn, 100.0, 10.0, &tuning));
        assert!(!landing_window_open(burn, 100.5, 5.0, &tuning));
        assert!(!landing_window_open(burn, 50.0, 10.5, &tuning));
        assert!(!landing_window_open(LandingPhase::Stabilized, 50.0, 5.0, &tuning));
    }
}
