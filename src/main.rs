//! Capsule Lander entry point
//!
//! Flies one headless descent against the built-in point-mass physics with
//! a scripted pilot standing in for the keyboard.

use capsule_lander::consts::*;
use capsule_lander::gates::{landing_window_open, target_locked};
use capsule_lander::sim::{
    FixedStepClock, FrameInput, Key, KinematicsReadWrite, LandingPhase, LandingSequencer, LogSink,
    PointMassBody,
};
use capsule_lander::LanderTuning;
use glam::Vec3;

/// Frame rate the headless loop pretends to render at
const FRAME_DT: f32 = 1.0 / 60.0;
/// Give up after this much simulated time
const MAX_FLIGHT_TIME: f32 = 300.0;

const CAPSULE_MASS: f32 = 10.0;
const CAPSULE_INERTIA: f32 = 5.0;
/// Real surface radius; the probe only knows `APPROX_TARGET_RADIUS`
const SURFACE_RADIUS: f32 = 150.0;
/// Altitude the pilot aims to stop at before asking for the autopilot
const FLARE_ALTITUDE: f32 = 60.0;

type Sequencer = LandingSequencer<PointMassBody>;

/// Keyboard stand-in: confirms when allowed, burns on a stopping-distance rule
struct ScriptedPilot {
    tuning: LanderTuning,
    /// Net deceleration with all four thrusters sustained
    burn_decel: f32,
    burning: bool,
}

impl ScriptedPilot {
    fn new(tuning: LanderTuning, mass: f32) -> Self {
        // Thrust is canted slightly off the capsule axis
        let thrust = 4.0 * tuning.forces.burn * tuning.sustain_scale * 0.95;
        let burn_decel = (thrust / mass - tuning.gravity_strength).max(f32::EPSILON);
        Self {
            tuning,
            burn_decel,
            burning: false,
        }
    }

    /// Decide this frame's keys and update the sequencer's permission flags
    fn input(&mut self, seq: &mut Sequencer) -> FrameInput {
        let phase = seq.get_current_phase();
        match phase {
            LandingPhase::Coasting => {
                let k = seq.physics().kinematics();
                let locked = target_locked(&k, self.tuning.target_center, LOCK_ON_CONE);
                seq.set_can_stabilize(locked);
                if locked {
                    FrameInput::new().press(Key::LeftCtrl)
                } else {
                    FrameInput::new()
                }
            }
            LandingPhase::PreBurn => {
                self.burning = true;
                FrameInput::new().press(Key::Space)
            }
            LandingPhase::RetrogradeBurn => self.burn(seq, phase),
            _ => FrameInput::new(),
        }
    }

    fn burn(&mut self, seq: &mut Sequencer, phase: LandingPhase) -> FrameInput {
        let distance = seq.get_distance_to_target();
        let speed = seq.get_velocity_magnitude();

        let open = landing_window_open(phase, distance, speed, &self.tuning);
        seq.set_can_land(open);
        if open {
            self.burning = false;
            return FrameInput::new().release(Key::Space).press(Key::LeftCtrl);
        }

        // The sequencer cuts thrust once we stop closing; the key has to go down again
        if self.burning && seq.thrusters().iter().all(|t| !t.is_firing()) {
            self.burning = false;
        }

        let stopping_distance = speed * speed / (2.0 * self.burn_decel);
        let want = stopping_distance > distance - FLARE_ALTITUDE;
        let input = match (self.burning, want) {
            (false, true) => FrameInput::new().press(Key::Space),
            (true, true) => FrameInput::new().hold(Key::Space),
            (true, false) => FrameInput::new().release(Key::Space),
            (false, false) => FrameInput::new(),
        };
        self.burning = want;
        input
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let tuning = LanderTuning::default();

    let body = PointMassBody::new(CAPSULE_MASS, CAPSULE_INERTIA, Vec3::ZERO)
        .with_target(tuning.target_center, SURFACE_RADIUS);
    let mut sequencer = LandingSequencer::builder()
        .physics(body)
        .sink(LogSink)
        .tuning(tuning.clone())
        .build()?;

    let mut pilot = ScriptedPilot::new(tuning.clone(), CAPSULE_MASS);
    let mut clock = FixedStepClock::new(tuning.physics_dt, MAX_SUBSTEPS);
    let mut last_phase = sequencer.get_current_phase();
    let mut elapsed = 0.0;

    while elapsed < MAX_FLIGHT_TIME && !sequencer.is_finished() {
        let input = pilot.input(&mut sequencer);
        sequencer.frame(&input, FRAME_DT);
        for _ in 0..clock.advance(FRAME_DT) {
            sequencer.physics_tick(clock.step());
        }
        elapsed += FRAME_DT;

        let phase = sequencer.get_current_phase();
        if phase != last_phase {
            log::info!(
                "t={:.2}s {}",
                elapsed,
                serde_json::to_string(&sequencer.telemetry())?
            );
            last_phase = phase;
        }
    }

    let telemetry = sequencer.telemetry();
    if sequencer.is_finished() {
        log::info!(
            "Descent complete after {:.1}s ({:.1}s of physics): {}",
            elapsed,
            clock.physics_time(),
            serde_json::to_string_pretty(&telemetry)?
        );
    } else {
        log::warn!(
            "Gave up after {:.0}s in {} ({:.1} from surface at {:.1})",
            elapsed,
            telemetry.phase,
            telemetry.distance,
            telemetry.speed
        );
    }
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Capsule Lander (headless) starting...");

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
