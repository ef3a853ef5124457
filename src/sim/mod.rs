//! Deterministic landing simulation
//!
//! All flight logic lives here. This module must be pure and deterministic:
//! - Fixed physics timestep only
//! - Seeded RNG only (cosmetic autopilot)
//! - Stable iteration order (by thruster ID)
//! - No rendering or platform dependencies; physics is an injected service

pub mod autopilot;
pub mod body;
pub mod clock;
pub mod input;
pub mod phase;
pub mod probe;
pub mod sequencer;
pub mod services;
pub mod stagger;
pub mod thruster;

pub use autopilot::{AutopilotKind, AutopilotPair, Barrier, CompletionToken, CosmeticTask};
pub use body::{PointMassBody, TargetSphere};
pub use clock::{Delay, FixedStepClock};
pub use input::{FrameInput, Key, KeyState};
pub use phase::{LandingEvent, LandingPhase, PhaseGraph, next_phase};
pub use probe::DistanceProbe;
pub use sequencer::{LandingSequencer, LandingSequencerBuilder, Telemetry};
pub use services::{
    CapsuleKinematics, ForceApplier, KinematicsReadWrite, LogSink, PhaseNotifiable,
    PhysicsService, PhysicsStep, RayHit, RayQuery,
};
pub use stagger::{StaggerAction, StaggeredSequence};
pub use thruster::{ManeuverMode, ThrusterActuator, ThrusterBank, ThrusterId, ThrusterState};
