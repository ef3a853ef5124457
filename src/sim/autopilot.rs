//! Autopilot procedures
//!
//! Each autopilot phase runs a pair of cooperatively scheduled tasks:
//! - a cosmetic task on the frame channel that flickers random thrusters
//! - a physics-shaping task on the physics channel that owns the capsule
//!   kinematics for its duration (stabilize or land profile)
//!
//! A finishing task hands back a `CompletionToken`; the pair's `Barrier`
//! releases once it holds one token of each kind, in either order.

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::clock::TIMER_EPSILON;
use super::services::KinematicsReadWrite;
use super::thruster::{ManeuverMode, ThrusterBank, ThrusterId};
use crate::consts::LAND_MIN_REMAINING_TIME;
use crate::{LOCAL_FORWARD, lerp, look_rotation};

/// Task kind; one of each runs per autopilot phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutopilotKind {
    Cosmetic,
    PhysicsShaping,
}

/// Proof that a task finished; only tasks can make one
#[derive(Debug, PartialEq, Eq)]
pub struct CompletionToken {
    kind: AutopilotKind,
}

impl CompletionToken {
    fn new(kind: AutopilotKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> AutopilotKind {
        self.kind
    }
}

/// Join point for one cosmetic + one shaping task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Barrier {
    cosmetic_done: bool,
    shaping_done: bool,
}

impl Barrier {
    pub fn signal(&mut self, token: CompletionToken) {
        match token.kind {
            AutopilotKind::Cosmetic => self.cosmetic_done = true,
            AutopilotKind::PhysicsShaping => self.shaping_done = true,
        }
    }

    pub fn is_released(&self) -> bool {
        self.cosmetic_done && self.shaping_done
    }

    pub fn is_signalled(&self, kind: AutopilotKind) -> bool {
        match kind {
            AutopilotKind::Cosmetic => self.cosmetic_done,
            AutopilotKind::PhysicsShaping => self.shaping_done,
        }
    }
}

// ---------------------------------------------------------------------------
// Cosmetic task
// ---------------------------------------------------------------------------

/// Flickers random thrusters on a coarse interval; never touches kinematics
#[derive(Debug, Clone)]
pub struct CosmeticTask {
    interval: f32,
    total_steps: u32,
    steps_done: u32,
    /// Time until the next step
    wait: f32,
    /// Stop early below this surface distance
    min_distance: Option<f32>,
    rng: Pcg32,
    finished: bool,
}

impl CosmeticTask {
    pub fn new(duration: f32, interval: f32, seed: u64) -> Self {
        Self {
            interval,
            total_steps: (duration / interval).round().max(0.0) as u32,
            steps_done: 0,
            wait: 0.0,
            min_distance: None,
            rng: Pcg32::seed_from_u64(seed),
            finished: false,
        }
    }

    pub fn with_min_distance(mut self, min_distance: f32) -> Self {
        self.min_distance = Some(min_distance);
        self
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Seconds of flicker completed
    pub fn elapsed(&self) -> f32 {
        self.steps_done as f32 * self.interval
    }

    /// Advance one frame; yields a token on the frame it finishes
    pub fn frame(
        &mut self,
        dt: f32,
        thrusters: &mut ThrusterBank,
        distance: f32,
    ) -> Option<CompletionToken> {
        if self.finished {
            return None;
        }
        self.wait -= dt;
        while self.wait <= TIMER_EPSILON {
            let too_close = self.min_distance.is_some_and(|min| distance < min);
            if self.steps_done >= self.total_steps || too_close {
                if too_close {
                    log::info!("Cosmetic autopilot stopped early at {:.1} from surface", distance);
                }
                thrusters.standby_all();
                self.finished = true;
                return Some(CompletionToken::new(AutopilotKind::Cosmetic));
            }
            self.toggle_random(thrusters);
            self.steps_done += 1;
            self.wait += self.interval;
        }
        None
    }

    fn toggle_random(&mut self, thrusters: &mut ThrusterBank) {
        let id = ThrusterId::ALL[self.rng.random_range(0..ThrusterId::ALL.len())];
        let thruster = thrusters.get_mut(id);
        if thruster.is_firing() {
            thruster.standby();
        } else {
            thruster.ready();
            thruster.fire_cosmetic(ManeuverMode::Turn);
        }
    }
}

// ---------------------------------------------------------------------------
// Physics-shaping tasks
// ---------------------------------------------------------------------------

/// Orientation partway from `initial` toward retrograde alignment
///
/// The target keeps the initial forward as far as possible while its up
/// axis points against `velocity`. Returns `initial` when no target exists
/// (zero velocity).
pub fn retrograde_orientation(initial: Quat, velocity: Vec3, t: f32) -> Quat {
    let Some(target_up) = (-velocity).try_normalize() else {
        return initial;
    };
    let forward = initial * LOCAL_FORWARD;
    let target = look_rotation(forward, target_up)
        .or_else(|| look_rotation(target_up.any_orthonormal_vector(), target_up));
    match target {
        Some(target) => initial.slerp(target, t.clamp(0.0, 1.0)),
        None => initial,
    }
}

/// Landing speed at `elapsed`: remaining distance over remaining time
pub fn land_target_speed(start_distance: f32, duration: f32, elapsed: f32) -> f32 {
    let t = if duration > 0.0 { elapsed / duration } else { 1.0 };
    let remaining_distance = lerp(start_distance, 0.0, t);
    let remaining_time = (duration - elapsed).max(LAND_MIN_REMAINING_TIME);
    remaining_distance / remaining_time
}

/// Damps spin to zero and turns the capsule retrograde
#[derive(Debug, Clone)]
pub struct StabilizeTask {
    duration: f32,
    elapsed: f32,
    initial_angular_velocity: Vec3,
    initial_orientation: Quat,
    finished: bool,
}

impl StabilizeTask {
    /// Redirects velocity toward `target_center` (keeping speed) and
    /// captures the starting spin and orientation
    pub fn start(body: &mut dyn KinematicsReadWrite, target_center: Vec3, duration: f32) -> Self {
        let k = body.kinematics();
        if let Some(dir) = (target_center - k.position).try_normalize() {
            body.set_linear_velocity(dir * k.linear_velocity.length());
        }
        Self {
            duration,
            elapsed: 0.0,
            initial_angular_velocity: k.angular_velocity,
            initial_orientation: k.orientation,
            finished: false,
        }
    }

    pub fn physics(&mut self, dt: f32, body: &mut dyn KinematicsReadWrite) -> Option<CompletionToken> {
        if self.finished {
            return None;
        }
        if self.elapsed < self.duration - TIMER_EPSILON {
            let t = self.elapsed / self.duration;
            body.set_angular_velocity(self.initial_angular_velocity.lerp(Vec3::ZERO, t));
            let velocity = body.kinematics().linear_velocity;
            body.set_orientation(retrograde_orientation(self.initial_orientation, velocity, t));
            self.elapsed += dt;
            return None;
        }
        body.set_angular_velocity(Vec3::ZERO);
        self.finished = true;
        Some(CompletionToken::new(AutopilotKind::PhysicsShaping))
    }
}

/// Flies straight at the target center along a linear distance profile
#[derive(Debug, Clone)]
pub struct LandTask {
    duration: f32,
    elapsed: f32,
    start_distance: f32,
    direction: Vec3,
    finished: bool,
}

impl LandTask {
    /// Fixes the approach direction and zeroes all motion
    pub fn start(
        body: &mut dyn KinematicsReadWrite,
        target_center: Vec3,
        start_distance: f32,
        duration: f32,
    ) -> Self {
        let k = body.kinematics();
        let direction = (target_center - k.position).normalize_or_zero();
        body.set_angular_velocity(Vec3::ZERO);
        body.set_linear_velocity(Vec3::ZERO);
        Self {
            duration,
            elapsed: 0.0,
            start_distance,
            direction,
            finished: false,
        }
    }

    pub fn physics(&mut self, dt: f32, body: &mut dyn KinematicsReadWrite) -> Option<CompletionToken> {
        if self.finished {
            return None;
        }
        if self.elapsed < self.duration - TIMER_EPSILON {
            let speed = land_target_speed(self.start_distance, self.duration, self.elapsed);
            body.set_linear_velocity(self.direction * speed);
            self.elapsed += dt;
            return None;
        }
        body.set_angular_velocity(Vec3::ZERO);
        body.set_linear_velocity(Vec3::ZERO);
        self.finished = true;
        Some(CompletionToken::new(AutopilotKind::PhysicsShaping))
    }
}

/// Physics-shaping profile for the active autopilot phase
#[derive(Debug, Clone)]
pub enum ShapingTask {
    Stabilize(StabilizeTask),
    Land(LandTask),
}

impl ShapingTask {
    pub fn physics(&mut self, dt: f32, body: &mut dyn KinematicsReadWrite) -> Option<CompletionToken> {
        match self {
            ShapingTask::Stabilize(task) => task.physics(dt, body),
            ShapingTask::Land(task) => task.physics(dt, body),
        }
    }
}

/// One cosmetic + one shaping task joined by a barrier
#[derive(Debug, Clone)]
pub struct AutopilotPair {
    cosmetic: CosmeticTask,
    shaping: ShapingTask,
    barrier: Barrier,
}

impl AutopilotPair {
    pub fn new(cosmetic: CosmeticTask, shaping: ShapingTask) -> Self {
        Self {
            cosmetic,
            shaping,
            barrier: Barrier::default(),
        }
    }

    pub fn barrier(&self) -> &Barrier {
        &self.barrier
    }

    pub fn is_released(&self) -> bool {
        self.barrier.is_released()
    }

    /// Frame channel: advances the cosmetic task
    pub fn frame(&mut self, dt: f32, thrusters: &mut ThrusterBank, distance: f32) {
        if let Some(token) = self.cosmetic.frame(dt, thrusters, distance) {
            self.barrier.signal(token);
        }
    }

    /// Physics channel: advances the shaping task
    pub fn physics(&mut self, dt: f32, body: &mut dyn KinematicsReadWrite) {
        if let Some(token) = self.shaping.physics(dt, body) {
            self.barrier.signal(token);
        }
    }
}
