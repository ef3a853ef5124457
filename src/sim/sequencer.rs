//! Landing sequencer
//!
//! Owns the landing phase and drives everything else from two channels:
//! - `frame`: input sampling, timers, staggered thruster sequences, the
//!   cosmetic autopilot task
//! - `physics_tick`: forces, the physics-shaping autopilot task, then one
//!   integration step of the physics service
//!
//! Per-phase behaviour lives in `HANDLERS`, one entry per phase in
//! `LandingPhase::ALL` order. Every phase change goes through
//! `phase::next_phase`, so the sequencer can only walk edges of the graph.
//!
//! Kinematics have one writer at a time: the manual handlers while
//! Coasting/RetrogradeBurn, the shaping task while Stabilizing/Landing.

use glam::Vec3;
use serde::Serialize;

use super::autopilot::{AutopilotPair, CosmeticTask, LandTask, ShapingTask, StabilizeTask};
use super::clock::Delay;
use super::input::{BURN_KEY, CONFIRM_KEY, FrameInput, thruster_bindings};
use super::phase::{LandingEvent, LandingPhase, next_phase};
use super::probe::DistanceProbe;
use super::services::{PhaseNotifiable, PhysicsService};
use super::stagger::{StaggerAction, StaggeredSequence};
use super::thruster::{ManeuverMode, ThrusterBank, ThrusterId, ThrusterState};
use crate::clamp_magnitude;
use crate::error::BuildError;
use crate::tuning::LanderTuning;

/// Default seed for the cosmetic autopilot RNG
pub const DEFAULT_SEED: u64 = 0x5EED_CA95;

/// What the player's keys currently ask of one thruster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ThrustIntent {
    #[default]
    Idle,
    /// Key went down; fire on the next physics tick
    Fire,
    /// Key held after the first fire
    Sustain,
    /// Pressed and released within one frame
    Pulse,
}

/// Which autopilot profile to spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AutopilotPurpose {
    Stabilize,
    Land,
}

type FrameHandler<P> = fn(&mut LandingSequencer<P>, &FrameInput, f32);
type PhysicsHandler<P> = fn(&mut LandingSequencer<P>, f32);

/// Per-phase frame and physics behaviour
pub struct PhaseHandlers<P: PhysicsService> {
    pub phase: LandingPhase,
    frame: FrameHandler<P>,
    physics: PhysicsHandler<P>,
}

/// Read-only snapshot for the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct Telemetry {
    pub phase: LandingPhase,
    pub distance: f32,
    pub speed: f32,
    pub thrusters: [ThrusterState; 4],
    pub can_stabilize: bool,
    pub can_land: bool,
}

pub struct LandingSequencer<P: PhysicsService> {
    tuning: LanderTuning,
    phase: LandingPhase,
    physics: P,
    sink: Box<dyn PhaseNotifiable>,
    probe: DistanceProbe,
    thrusters: ThrusterBank,
    intents: [ThrustIntent; 4],
    can_stabilize: bool,
    can_land: bool,
    pre_coasting: Delay,
    stagger: Option<StaggeredSequence>,
    autopilot: Option<AutopilotPair>,
    seed: u64,
    autopilots_spawned: u64,
}

impl<P: PhysicsService> LandingSequencer<P> {
    pub const HANDLERS: [PhaseHandlers<P>; 9] = [
        PhaseHandlers {
            phase: LandingPhase::Initial,
            frame: Self::frame_initial,
            physics: Self::physics_noop,
        },
        PhaseHandlers {
            phase: LandingPhase::PreCoasting,
            frame: Self::frame_noop,
            physics: Self::physics_pre_coasting,
        },
        PhaseHandlers {
            phase: LandingPhase::Coasting,
            frame: Self::frame_coasting,
            physics: Self::physics_coasting,
        },
        PhaseHandlers {
            phase: LandingPhase::Stabilizing,
            frame: Self::frame_noop,
            physics: Self::physics_noop,
        },
        PhaseHandlers {
            phase: LandingPhase::Stabilized,
            frame: Self::frame_stabilized,
            physics: Self::physics_noop,
        },
        PhaseHandlers {
            phase: LandingPhase::PreBurn,
            frame: Self::frame_pre_burn,
            physics: Self::physics_noop,
        },
        PhaseHandlers {
            phase: LandingPhase::RetrogradeBurn,
            frame: Self::frame_retrograde_burn,
            physics: Self::physics_retrograde_burn,
        },
        PhaseHandlers {
            phase: LandingPhase::Landing,
            frame: Self::frame_noop,
            physics: Self::physics_noop,
        },
        PhaseHandlers {
            phase: LandingPhase::Landed,
            frame: Self::frame_noop,
            physics: Self::physics_noop,
        },
    ];

    pub fn builder() -> LandingSequencerBuilder<P> {
        LandingSequencerBuilder::new()
    }

    // === Channels ===

    /// Frame channel: input, timers, stagger, cosmetic autopilot
    pub fn frame(&mut self, input: &FrameInput, dt: f32) {
        if let Some(stagger) = &mut self.stagger {
            stagger.advance(dt, &mut self.thrusters);
            if stagger.is_finished() {
                self.stagger = None;
            }
        }

        if self.autopilot.is_some() {
            let distance = self.get_distance_to_target();
            if let Some(pair) = &mut self.autopilot {
                pair.frame(dt, &mut self.thrusters, distance);
            }
            self.poll_autopilot();
        }

        let handler = Self::HANDLERS[self.phase.index()].frame;
        handler(self, input, dt);
    }

    /// Physics channel: forces, shaping autopilot, then integration
    pub fn physics_tick(&mut self, dt: f32) {
        let handler = Self::HANDLERS[self.phase.index()].physics;
        handler(self, dt);

        if let Some(pair) = &mut self.autopilot {
            pair.physics(dt, &mut self.physics);
            self.poll_autopilot();
        }

        self.physics.step(dt);

        // Thrust from this tick integrates after the handler's clamp
        if self.phase == LandingPhase::Coasting {
            self.clamp_spin();
        }
    }

    // === Queries for the presentation layer ===

    pub fn get_distance_to_target(&self) -> f32 {
        let position = self.physics.kinematics().position;
        self.probe.distance(position, &self.physics)
    }

    pub fn get_velocity_magnitude(&self) -> f32 {
        self.physics.kinematics().linear_velocity.length()
    }

    pub fn get_current_phase(&self) -> LandingPhase {
        self.phase
    }

    pub fn set_can_stabilize(&mut self, allowed: bool) {
        self.can_stabilize = allowed;
    }

    pub fn set_can_land(&mut self, allowed: bool) {
        self.can_land = allowed;
    }

    pub fn thrusters(&self) -> &ThrusterBank {
        &self.thrusters
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn tuning(&self) -> &LanderTuning {
        &self.tuning
    }

    /// True once the phase graph's terminal phase is reached and the
    /// shutdown sequence (if any) has run out
    pub fn is_finished(&self) -> bool {
        self.tuning.graph.is_terminal(self.phase) && self.stagger.is_none()
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            phase: self.phase,
            distance: self.get_distance_to_target(),
            speed: self.get_velocity_magnitude(),
            thrusters: self.thrusters.states(),
            can_stabilize: self.can_stabilize,
            can_land: self.can_land,
        }
    }

    // === Transitions ===

    /// Feed one event through the phase graph; true if the phase changed
    fn apply(&mut self, event: LandingEvent) -> bool {
        let next = next_phase(self.tuning.graph, self.phase, event);
        if next == self.phase {
            return false;
        }
        log::info!("Landing phase {} -> {} ({:?})", self.phase, next, event);
        self.phase = next;
        self.on_enter(next);
        self.sink.phase_changed(next);
        true
    }

    fn on_enter(&mut self, phase: LandingPhase) {
        match phase {
            LandingPhase::PreCoasting => {
                self.start_stagger(StaggerAction::Ready, self.tuning.ready_delay);
            }
            LandingPhase::Stabilizing => {
                self.release_thrusters();
                self.spawn_autopilot(AutopilotPurpose::Stabilize);
            }
            LandingPhase::PreBurn => {
                self.thrusters.ready_all();
            }
            LandingPhase::Landing => {
                self.release_thrusters();
                self.spawn_autopilot(AutopilotPurpose::Land);
            }
            LandingPhase::Landed => {
                self.start_stagger(StaggerAction::Offline, self.tuning.offline_delay);
            }
            LandingPhase::Initial
            | LandingPhase::Coasting
            | LandingPhase::Stabilized
            | LandingPhase::RetrogradeBurn => {}
        }
    }

    fn start_stagger(&mut self, action: StaggerAction, delay: f32) {
        if let Some(previous) = self.stagger.take() {
            log::warn!("Cancelling unfinished {:?} stagger", previous.action());
        }
        self.stagger = Some(StaggeredSequence::new(action, self.tuning.stagger_ids(), delay));
    }

    fn spawn_autopilot(&mut self, purpose: AutopilotPurpose) {
        let duration = self.tuning.autopilot_duration;
        let center = self.tuning.target_center;
        let seed = self.seed.wrapping_add(self.autopilots_spawned);
        self.autopilots_spawned += 1;

        let cosmetic = CosmeticTask::new(duration, self.tuning.cosmetic_interval, seed)
            .with_min_distance(self.tuning.thruster_min_distance);
        let shaping = match purpose {
            AutopilotPurpose::Stabilize => {
                ShapingTask::Stabilize(StabilizeTask::start(&mut self.physics, center, duration))
            }
            AutopilotPurpose::Land => {
                let start_distance = self.get_distance_to_target();
                ShapingTask::Land(LandTask::start(
                    &mut self.physics,
                    center,
                    start_distance,
                    duration,
                ))
            }
        };

        if self.autopilot.is_some() {
            log::warn!("Replacing unfinished autopilot pair");
        }
        log::info!("Autopilot {:?} engaged for {:.1}s", purpose, duration);
        self.autopilot = Some(AutopilotPair::new(cosmetic, shaping));
    }

    fn poll_autopilot(&mut self) {
        if self.autopilot.as_ref().is_some_and(AutopilotPair::is_released) {
            self.autopilot = None;
            log::info!("Autopilot complete");
            self.apply(LandingEvent::AutopilotComplete);
        }
    }

    // === Thruster intents ===

    fn sample_thruster_keys(&mut self, input: &FrameInput) {
        for (key, ids) in thruster_bindings(self.phase) {
            let state = input.key(*key);
            for id in *ids {
                let intent = &mut self.intents[id.index()];
                if state.pressed && state.released {
                    *intent = ThrustIntent::Pulse;
                } else if state.pressed {
                    *intent = ThrustIntent::Fire;
                } else if state.released {
                    *intent = ThrustIntent::Idle;
                    self.thrusters.get_mut(*id).stop();
                }
            }
        }
    }

    /// Stop every thruster and forget held keys
    fn release_thrusters(&mut self) {
        self.thrusters.stop_all();
        self.intents = [ThrustIntent::Idle; 4];
    }

    fn drive_thrusters(&mut self, mode: ManeuverMode) {
        let pose = self.physics.kinematics();
        for id in ThrusterId::ALL {
            let thruster = self.thrusters.get_mut(id);
            let intent = &mut self.intents[id.index()];
            match *intent {
                ThrustIntent::Idle => {}
                ThrustIntent::Fire => {
                    thruster.fire(&mut self.physics, &pose, mode);
                    *intent = ThrustIntent::Sustain;
                }
                ThrustIntent::Sustain => {
                    thruster.sustain(&mut self.physics, &pose, mode);
                }
                ThrustIntent::Pulse => {
                    thruster.fire(&mut self.physics, &pose, mode);
                    thruster.stop();
                    *intent = ThrustIntent::Idle;
                }
            }
        }
    }

    fn clamp_spin(&mut self) {
        let spin = self.physics.kinematics().angular_velocity;
        let clamped = clamp_magnitude(spin, self.tuning.max_angular_velocity);
        if clamped != spin {
            self.physics.set_angular_velocity(clamped);
        }
    }

    // === Phase handlers ===

    fn frame_noop(&mut self, _input: &FrameInput, _dt: f32) {}

    fn physics_noop(&mut self, _dt: f32) {}

    fn frame_initial(&mut self, _input: &FrameInput, dt: f32) {
        if self.pre_coasting.tick(dt) {
            self.apply(LandingEvent::DelayElapsed);
        }
    }

    fn physics_pre_coasting(&mut self, _dt: f32) {
        let position = self.physics.kinematics().position;
        let direction = direction_to_target(&self.tuning, position);
        self.physics
            .add_velocity_change(direction * self.tuning.coasting_speed);
        self.apply(LandingEvent::ImpulseApplied);
    }

    fn frame_coasting(&mut self, input: &FrameInput, _dt: f32) {
        self.sample_thruster_keys(input);
        if input.pressed(CONFIRM_KEY) && self.can_stabilize {
            self.apply(LandingEvent::StabilizeConfirmed);
        }
    }

    fn physics_coasting(&mut self, _dt: f32) {
        self.drive_thrusters(ManeuverMode::Turn);
        self.clamp_spin();
    }

    fn frame_stabilized(&mut self, _input: &FrameInput, _dt: f32) {
        if self.get_distance_to_target() < self.tuning.retrograde_burn_distance {
            self.apply(LandingEvent::BurnDistanceReached);
        }
    }

    fn frame_pre_burn(&mut self, input: &FrameInput, _dt: f32) {
        if input.pressed(BURN_KEY) {
            let intent = if input.released(BURN_KEY) {
                ThrustIntent::Pulse
            } else {
                ThrustIntent::Fire
            };
            self.intents = [intent; 4];
            self.apply(LandingEvent::BurnConfirmed);
        }
    }

    fn frame_retrograde_burn(&mut self, input: &FrameInput, _dt: f32) {
        self.sample_thruster_keys(input);
        if input.pressed(CONFIRM_KEY) && self.can_land {
            self.apply(LandingEvent::LandConfirmed);
        }
    }

    fn physics_retrograde_burn(&mut self, _dt: f32) {
        let k = self.physics.kinematics();
        let gravity_dir = direction_to_target(&self.tuning, k.position);
        self.physics
            .add_acceleration(gravity_dir * self.tuning.gravity_strength);

        let closing_rate = k.linear_velocity.dot(gravity_dir);
        if closing_rate < self.tuning.closing_rate_cutoff {
            self.release_thrusters();
        }
        self.drive_thrusters(ManeuverMode::Burn);
    }
}

/// Wires collaborators into a sequencer; missing ones fail `build`
pub struct LandingSequencerBuilder<P: PhysicsService> {
    physics: Option<P>,
    sink: Option<Box<dyn PhaseNotifiable>>,
    tuning: LanderTuning,
    seed: u64,
}

impl<P: PhysicsService> Default for LandingSequencerBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PhysicsService> LandingSequencerBuilder<P> {
    pub fn new() -> Self {
        Self {
            physics: None,
            sink: None,
            tuning: LanderTuning::default(),
            seed: DEFAULT_SEED,
        }
    }

    pub fn physics(mut self, physics: P) -> Self {
        self.physics = Some(physics);
        self
    }

    pub fn sink(mut self, sink: impl PhaseNotifiable + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn tuning(mut self, tuning: LanderTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<LandingSequencer<P>, BuildError> {
        let physics = self.physics.ok_or(BuildError::MissingPhysics)?;
        let sink = self.sink.ok_or(BuildError::MissingSink)?;
        self.tuning.validate()?;

        let tuning = self.tuning;
        Ok(LandingSequencer {
            probe: DistanceProbe::from_tuning(&tuning),
            thrusters: ThrusterBank::new(tuning.forces, tuning.sustain_scale),
            pre_coasting: Delay::new(tuning.pre_coasting_delay),
            phase: LandingPhase::Initial,
            physics,
            sink,
            intents: [ThrustIntent::Idle; 4],
            can_stabilize: false,
            can_land: false,
            stagger: None,
            autopilot: None,
            seed: self.seed,
            autopilots_spawned: 0,
            tuning,
        })
    }
}

/// Unit vector from `position` toward the tuned target center
pub fn direction_to_target(tuning: &LanderTuning, position: Vec3) -> Vec3 {
    (tuning.target_center - position).normalize_or_zero()
}
