//! Flight tuning
//!
//! Runtime view of `crate::consts`. Defaults are exactly the compile-time
//! constants; tests and embedders adjust fields with struct-update syntax.

use glam::Vec3;

use crate::consts::*;
use crate::error::BuildError;
use crate::sim::phase::PhaseGraph;
use crate::sim::thruster::{ForceTable, ThrusterId};

/// All tunables consumed by the landing sequencer
#[derive(Debug, Clone, PartialEq)]
pub struct LanderTuning {
    // === Timing ===
    /// Physics step the sequencer expects (seconds)
    pub physics_dt: f32,
    /// Delay from scene entry to the coasting impulse
    pub pre_coasting_delay: f32,
    /// Duration of both autopilot procedures
    pub autopilot_duration: f32,
    /// Cosmetic autopilot toggle interval
    pub cosmetic_interval: f32,

    // === Flight ===
    pub coasting_speed: f32,
    pub max_angular_velocity: f32,
    pub retrograde_burn_distance: f32,
    pub gravity_strength: f32,
    pub closing_rate_cutoff: f32,
    pub thruster_min_distance: f32,

    // === Thrusters ===
    pub forces: ForceTable,
    pub sustain_scale: f32,
    pub ready_delay: f32,
    pub offline_delay: f32,
    /// Thruster numbers (1-based) in activation/shutdown order
    pub stagger_order: [u8; 4],

    // === Target ===
    pub target_center: Vec3,
    /// Point the refining ray is aimed at
    pub target_anchor: Vec3,
    pub approx_target_radius: f32,
    pub ray_refine_cutoff: f32,

    // === Landing window ===
    pub landing_target_distance: f32,
    pub landing_target_velocity: f32,

    /// Full graph ends at Landed; reduced ends at RetrogradeBurn
    pub graph: PhaseGraph,
}

impl Default for LanderTuning {
    fn default() -> Self {
        Self {
            physics_dt: SIM_DT,
            pre_coasting_delay: PRE_COASTING_DELAY,
            autopilot_duration: AUTOPILOT_DURATION,
            cosmetic_interval: COSMETIC_INTERVAL,

            coasting_speed: COASTING_SPEED,
            max_angular_velocity: MAX_ANGULAR_VELOCITY,
            retrograde_burn_distance: RETROGRADE_BURN_DISTANCE,
            gravity_strength: GRAVITY_STRENGTH,
            closing_rate_cutoff: CLOSING_RATE_CUTOFF,
            thruster_min_distance: THRUSTER_MIN_DISTANCE,

            forces: ForceTable::default(),
            sustain_scale: SUSTAIN_SCALE,
            ready_delay: THRUSTER_READY_DELAY,
            offline_delay: THRUSTER_OFFLINE_DELAY,
            stagger_order: STAGGER_ORDER,

            target_center: TARGET_CENTER,
            target_anchor: TARGET_CENTER,
            approx_target_radius: APPROX_TARGET_RADIUS,
            ray_refine_cutoff: RAY_REFINE_CUTOFF,

            landing_target_distance: LANDING_TARGET_DISTANCE,
            landing_target_velocity: LANDING_TARGET_VELOCITY,

            graph: PhaseGraph::Full,
        }
    }
}

impl LanderTuning {
    /// Stagger order as thruster identities
    ///
    /// Only meaningful after `validate` has accepted the order.
    pub fn stagger_ids(&self) -> [ThrusterId; 4] {
        self.stagger_order
            .map(|n| ThrusterId::from_number(n).unwrap_or(ThrusterId::One))
    }

    /// Reject values that would stall or break the sequencer
    pub fn validate(&self) -> Result<(), BuildError> {
        let positive = [
            ("physics_dt", self.physics_dt),
            ("autopilot_duration", self.autopilot_duration),
            ("cosmetic_interval", self.cosmetic_interval),
            ("ready_delay", self.ready_delay),
            ("offline_delay", self.offline_delay),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(BuildError::InvalidTuning(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.pre_coasting_delay >= 0.0) {
            return Err(BuildError::InvalidTuning(format!(
                "pre_coasting_delay must not be negative, got {}",
                self.pre_coasting_delay
            )));
        }
        if !(self.max_angular_velocity >= 0.0) {
            return Err(BuildError::InvalidTuning(format!(
                "max_angular_velocity must not be negative, got {}",
                self.max_angular_velocity
            )));
        }

        let mut seen = [false; 4];
        for n in self.stagger_order {
            match ThrusterId::from_number(n) {
                Some(id) if !seen[id.index()] => seen[id.index()] = true,
                _ => {
                    return Err(BuildError::InvalidTuning(format!(
                        "stagger_order must be a permutation of 1..=4, got {:?}",
                        self.stagger_order
                    )));
                }
            }
        }
        Ok(())
    }
}
