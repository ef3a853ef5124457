//! Capabilities the sequencer consumes from its collaborators
//!
//! The physics service is split into narrow traits so each consumer only
//! sees what it may touch: thrusters get `ForceApplier`, the shaping
//! autopilot gets `KinematicsReadWrite`, the distance probe gets `RayQuery`.

use std::sync::mpsc::Sender;

use glam::{Quat, Vec3};

use super::phase::LandingPhase;

/// Capsule rigid-body state as reported by the physics service
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleKinematics {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl Default for CapsuleKinematics {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        }
    }
}

/// Nearest hit of a ray query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
}

/// Force and velocity-change application
pub trait ForceApplier {
    /// Continuous force at a world-space point (mass-dependent, this tick only)
    fn add_force_at_position(&mut self, force: Vec3, point: Vec3);
    /// Instant velocity change (mass-independent)
    fn add_velocity_change(&mut self, delta_v: Vec3);
    /// Acceleration for this tick (mass-independent)
    fn add_acceleration(&mut self, accel: Vec3);
}

/// Read and overwrite capsule kinematics
pub trait KinematicsReadWrite {
    fn kinematics(&self) -> CapsuleKinematics;
    fn set_linear_velocity(&mut self, velocity: Vec3);
    fn set_angular_velocity(&mut self, angular_velocity: Vec3);
    fn set_orientation(&mut self, orientation: Quat);
}

/// Nearest-hit ray query against the scene
pub trait RayQuery {
    /// `direction` is unit length
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
}

/// Advance the simulation one physics step after forces are applied
pub trait PhysicsStep {
    fn step(&mut self, dt: f32);
}

/// Everything the sequencer needs from the physics service
pub trait PhysicsService: ForceApplier + KinematicsReadWrite + RayQuery + PhysicsStep {}

impl<T: ForceApplier + KinematicsReadWrite + RayQuery + PhysicsStep> PhysicsService for T {}

/// Receives phase-change notifications; returns nothing to the sequencer
pub trait PhaseNotifiable {
    fn phase_changed(&mut self, phase: LandingPhase);
}

/// Forwards notifications over a channel; a dropped receiver is ignored
impl PhaseNotifiable for Sender<LandingPhase> {
    fn phase_changed(&mut self, phase: LandingPhase) {
        let _ = self.send(phase);
    }
}

/// Sink that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl PhaseNotifiable for LogSink {
    fn phase_changed(&mut self, phase: LandingPhase) {
        log::info!("Presentation notified: {}", phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_sender_sink_forwards() {
        let (tx, rx) = mpsc::channel();
        let mut sink = tx;
        sink.phase_changed(LandingPhase::Coasting);
        sink.phase_changed(LandingPhase::Stabilizing);
        let got: Vec<_> = rx.try_iter().collect();
        assert_eq!(got, vec![LandingPhase::Coasting, LandingPhase::Stabilizing]);
    }

    #[test]
    fn test_sender_sink_survives_dropped_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut sink = tx;
        sink.phase_changed(LandingPhase::Landed);
    }
}
