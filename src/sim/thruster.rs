//! Thruster actuators
//!
//! Four fixed thrusters around the capsule rim. Each owns its readiness
//! state and exhaust cosmetics; force only goes out while Ready or Firing.
//! No operation fails: misuse (firing while Offline) is simply inert.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::services::{CapsuleKinematics, ForceApplier};
use crate::consts::*;
use crate::LOCAL_UP;

/// Which of the four thrusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrusterId {
    /// Starboard
    One,
    /// Ventral
    Two,
    /// Port
    Three,
    /// Dorsal
    Four,
}

impl ThrusterId {
    pub const ALL: [ThrusterId; 4] = [
        ThrusterId::One,
        ThrusterId::Two,
        ThrusterId::Three,
        ThrusterId::Four,
    ];

    /// 1-based number as printed on the HUD
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(ThrusterId::One),
            2 => Some(ThrusterId::Two),
            3 => Some(ThrusterId::Three),
            4 => Some(ThrusterId::Four),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            ThrusterId::One => "Starboard Engine",
            ThrusterId::Two => "Ventral Engine",
            ThrusterId::Three => "Port Engine",
            ThrusterId::Four => "Dorsal Engine",
        }
    }
}

/// Readiness of a thruster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThrusterState {
    #[default]
    Offline,
    Standby,
    Ready,
    Firing,
}

impl ThrusterState {
    pub fn can_apply_force(self) -> bool {
        matches!(self, ThrusterState::Ready | ThrusterState::Firing)
    }
}

/// Maneuver the force is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManeuverMode {
    /// Attitude control while coasting
    Turn,
    /// Retrograde deceleration
    Burn,
}

/// Force magnitude per maneuver mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceTable {
    pub turn: f32,
    pub burn: f32,
}

impl Default for ForceTable {
    fn default() -> Self {
        Self {
            turn: TURN_FORCE,
            burn: BURN_FORCE,
        }
    }
}

impl ForceTable {
    pub fn get(&self, mode: ManeuverMode) -> f32 {
        match mode {
            ManeuverMode::Turn => self.turn,
            ManeuverMode::Burn => self.burn,
        }
    }
}

/// Exhaust particle emission rate for a mode
pub fn emission_rate_for(mode: ManeuverMode) -> f32 {
    match mode {
        ManeuverMode::Turn => TURN_EMISSION_RATE,
        ManeuverMode::Burn => BURN_EMISSION_RATE,
    }
}

/// Where a thruster sits on the capsule, in capsule-local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrusterMount {
    pub offset: Vec3,
    /// Exhaust direction (unit); thrust pushes the opposite way
    pub facing: Vec3,
}

/// Rim radius of the thruster ring
pub const MOUNT_RADIUS: f32 = 1.5;
/// Outward cant of the exhaust
const MOUNT_CANT: f32 = 0.25;

impl ThrusterMount {
    /// Fixed mount for a thruster identity
    pub fn for_id(id: ThrusterId) -> Self {
        let outward = match id {
            ThrusterId::One => Vec3::X,
            ThrusterId::Two => -Vec3::Z,
            ThrusterId::Three => -Vec3::X,
            ThrusterId::Four => Vec3::Z,
        };
        Self {
            offset: outward * MOUNT_RADIUS,
            facing: (-LOCAL_UP + outward * MOUNT_CANT).normalize(),
        }
    }

    /// World-space application point and thrust direction
    pub fn world(&self, pose: &CapsuleKinematics) -> (Vec3, Vec3) {
        let point = pose.position + pose.orientation * self.offset;
        let thrust_dir = -(pose.orientation * self.facing);
        (point, thrust_dir)
    }
}

/// One thruster
#[derive(Debug, Clone)]
pub struct ThrusterActuator {
    id: ThrusterId,
    mount: ThrusterMount,
    state: ThrusterState,
    forces: ForceTable,
    sustain_scale: f32,
    /// Mode of the running exhaust effect, `Some` only while Firing
    exhaust: Option<ManeuverMode>,
}

impl ThrusterActuator {
    /// New thrusters start Offline
    pub fn new(id: ThrusterId, forces: ForceTable, sustain_scale: f32) -> Self {
        Self {
            id,
            mount: ThrusterMount::for_id(id),
            state: ThrusterState::Offline,
            forces,
            sustain_scale,
            exhaust: None,
        }
    }

    pub fn id(&self) -> ThrusterId {
        self.id
    }

    pub fn state(&self) -> ThrusterState {
        self.state
    }

    pub fn is_firing(&self) -> bool {
        self.state == ThrusterState::Firing
    }

    /// Current exhaust emission rate (0 when not firing)
    pub fn emission_rate(&self) -> f32 {
        self.exhaust.map(emission_rate_for).unwrap_or(0.0)
    }

    /// Offline/Standby -> Ready; a firing thruster keeps firing
    pub fn ready(&mut self) {
        if !self.is_firing() {
            self.state = ThrusterState::Ready;
        }
    }

    /// Silence and suspend; force disabled until `ready`
    pub fn standby(&mut self) {
        self.stop();
        self.state = ThrusterState::Standby;
    }

    /// Shut down
    pub fn offline(&mut self) {
        self.exhaust = None;
        self.state = ThrusterState::Offline;
    }

    /// Key-down thrust: full table force for `mode`; returns the applied force
    pub fn fire(
        &mut self,
        body: &mut dyn ForceApplier,
        pose: &CapsuleKinematics,
        mode: ManeuverMode,
    ) -> Vec3 {
        let magnitude = self.forces.get(mode);
        self.apply(body, pose, mode, magnitude)
    }

    /// Held-key thrust: table force scaled down; returns the applied force
    pub fn sustain(
        &mut self,
        body: &mut dyn ForceApplier,
        pose: &CapsuleKinematics,
        mode: ManeuverMode,
    ) -> Vec3 {
        let magnitude = self.forces.get(mode) * self.sustain_scale;
        self.apply(body, pose, mode, magnitude)
    }

    /// Light the exhaust without pushing
    pub fn fire_cosmetic(&mut self, mode: ManeuverMode) {
        if self.state == ThrusterState::Ready {
            self.state = ThrusterState::Firing;
            self.exhaust = Some(mode);
        }
    }

    /// Firing -> Ready, exhaust off
    pub fn stop(&mut self) {
        if self.is_firing() {
            self.exhaust = None;
            self.state = ThrusterState::Ready;
        }
    }

    fn apply(
        &mut self,
        body: &mut dyn ForceApplier,
        pose: &CapsuleKinematics,
        mode: ManeuverMode,
        magnitude: f32,
    ) -> Vec3 {
        if !self.state.can_apply_force() {
            return Vec3::ZERO;
        }
        let (point, thrust_dir) = self.mount.world(pose);
        let force = thrust_dir * magnitude;
        body.add_force_at_position(force, point);
        self.fire_cosmetic(mode);
        force
    }
}

/// The capsule's four thrusters, indexed by `ThrusterId`
#[derive(Debug, Clone)]
pub struct ThrusterBank {
    thrusters: [ThrusterActuator; 4],
}

impl ThrusterBank {
    pub fn new(forces: ForceTable, sustain_scale: f32) -> Self {
        Self {
            thrusters: ThrusterId::ALL.map(|id| ThrusterActuator::new(id, forces, sustain_scale)),
        }
    }

    pub fn get(&self, id: ThrusterId) -> &ThrusterActuator {
        &self.thrusters[id.index()]
    }

    pub fn get_mut(&mut self, id: ThrusterId) -> &mut ThrusterActuator {
        &mut self.thrusters[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThrusterActuator> {
        self.thrusters.iter()
    }

    pub fn states(&self) -> [ThrusterState; 4] {
        self.thrusters.each_ref().map(|t| t.state())
    }

    pub fn ready_all(&mut self) {
        self.thrusters.iter_mut().for_each(ThrusterActuator::ready);
    }

    pub fn stop_all(&mut self) {
        self.thrusters.iter_mut().for_each(ThrusterActuator::stop);
    }

    pub fn standby_all(&mut self) {
        self.thrusters.iter_mut().for_each(ThrusterActuator::standby);
    }
}

impl Default for ThrusterBank {
    fn default() -> Self {
        Self::new(ForceTable::default(), SUSTAIN_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::PointMassBody;

    fn body() -> PointMassBody {
        PointMassBody::new(1.0, 1.0, Vec3::ZERO)
    }

    #[test]
    fn test_new_thruster_is_offline() {
        let t = ThrusterActuator::new(ThrusterId::One, ForceTable::default(), SUSTAIN_SCALE);
        assert_eq!(t.state(), ThrusterState::Offline);
        assert_eq!(t.emission_rate(), 0.0);
    }

    #[test]
    fn test_fire_offline_is_inert() {
        let mut b = body();
        let pose = b.state;
        let mut t = ThrusterActuator::new(ThrusterId::Two, ForceTable::default(), SUSTAIN_SCALE);
        let applied = t.fire(&mut b, &pose, ManeuverMode::Burn);
        assert_eq!(applied, Vec3::ZERO);
        assert_eq!(b.pending_force(), Vec3::ZERO);
        assert_eq!(t.state(), ThrusterState::Offline);
        assert_eq!(t.emission_rate(), 0.0);
    }

    #[test]
    fn test_fire_standby_is_inert() {
        let mut b = body();
        let pose = b.state;
        let mut t = ThrusterActuator::new(ThrusterId::Two, ForceTable::default(), SUSTAIN_SCALE);
        t.ready();
        t.standby();
        assert_eq!(t.sustain(&mut b, &pose, ManeuverMode::Turn), Vec3::ZERO);
        assert_eq!(t.state(), ThrusterState::Standby);
    }

    #[test]
    fn test_fire_ready_applies_table_force() {
        for mode in [ManeuverMode::Turn, ManeuverMode::Burn] {
            let mut b = body();
            let pose = b.state;
            let mut t = ThrusterActuator::new(ThrusterId::Three, ForceTable::default(), SUSTAIN_SCALE);
            t.ready();
            let applied = t.fire(&mut b, &pose, mode);
            assert!((applied.length() - ForceTable::default().get(mode)).abs() < 1e-3);
            assert!((b.pending_force() - applied).length() < 1e-3);
            assert_eq!(t.state(), ThrusterState::Firing);
            assert_eq!(t.emission_rate(), emission_rate_for(mode));
        }
    }

    #[test]
    fn test_sustain_is_smaller_than_fire() {
        let mut b = body();
        let pose = b.state;
        let mut t = ThrusterActuator::new(ThrusterId::Four, ForceTable::default(), SUSTAIN_SCALE);
        t.ready();
        let fire = t.fire(&mut b, &pose, ManeuverMode::Turn).length();
        let sustain = t.sustain(&mut b, &pose, ManeuverMode::Turn).length();
        assert!(sustain < fire);
        assert!((sustain - TURN_FORCE * SUSTAIN_SCALE).abs() < 1e-3);
    }

    #[test]
    fn test_thrust_pushes_capsule_up() {
        // Exhaust points down, so thrust has a positive local-up component
        for id in ThrusterId::ALL {
            let mount = ThrusterMount::for_id(id);
            let (_, dir) = mount.world(&CapsuleKinematics::default());
            assert!(dir.dot(LOCAL_UP) > 0.9);
        }
    }

    #[test]
    fn test_all_thrusters_burning_is_torque_free() {
        let mut b = body();
        let pose = b.state;
        let mut bank = ThrusterBank::default();
        bank.ready_all();
        for id in ThrusterId::ALL {
            bank.get_mut(id).fire(&mut b, &pose, ManeuverMode::Burn);
        }
        assert!(b.pending_torque().length() < 1e-3);
        assert!(b.pending_force().dot(LOCAL_UP) > 0.0);
    }

    #[test]
    fn test_stop_and_standby() {
        let mut t = ThrusterActuator::new(ThrusterId::One, ForceTable::default(), SUSTAIN_SCALE);
        t.stop();
        assert_eq!(t.state(), ThrusterState::Offline);

        t.ready();
        t.fire_cosmetic(ManeuverMode::Turn);
        assert!(t.is_firing());
        t.stop();
        assert_eq!(t.state(), ThrusterState::Ready);
        assert_eq!(t.emission_rate(), 0.0);

        t.fire_cosmetic(ManeuverMode::Burn);
        t.standby();
        assert_eq!(t.state(), ThrusterState::Standby);
        assert_eq!(t.emission_rate(), 0.0);
        t.ready();
        assert_eq!(t.state(), ThrusterState::Ready);
    }

    #[test]
    fn test_ready_keeps_firing() {
        let mut t = ThrusterActuator::new(ThrusterId::One, ForceTable::default(), SUSTAIN_SCALE);
        t.ready();
        t.fire_cosmetic(ManeuverMode::Turn);
        t.ready();
        assert!(t.is_firing());
    }

    #[test]
    fn test_fire_cosmetic_needs_ready() {
        let mut t = ThrusterActuator::new(ThrusterId::One, ForceTable::default(), SUSTAIN_SCALE);
        t.fire_cosmetic(ManeuverMode::Turn);
        assert_eq!(t.state(), ThrusterState::Offline);
    }

    #[test]
    fn test_id_numbers() {
        for id in ThrusterId::ALL {
            assert_eq!(ThrusterId::from_number(id.number()), Some(id));
        }
        assert_eq!(ThrusterId::from_number(5), None);

        // Log labels are distinct
        let mut labels: Vec<_> = ThrusterId::ALL.iter().map(|id| id.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), 4);
    }
}
