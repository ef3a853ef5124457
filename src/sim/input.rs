//! Per-frame keyboard input
//!
//! Keys are statically mapped to thrusters per phase; there is no remapping.

use super::phase::LandingPhase;
use super::thruster::ThrusterId;

/// Keys the sequencer listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    LeftCtrl,
}

impl Key {
    pub const COUNT: usize = 6;

    fn index(self) -> usize {
        self as usize
    }
}

/// Edge and level state of one key for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    /// Went down this frame
    pub pressed: bool,
    /// Down this frame (including the press frame)
    pub held: bool,
    /// Went up this frame
    pub released: bool,
}

/// Input sampled for a single frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    keys: [KeyState; Key::COUNT],
}

impl FrameInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: key went down this frame
    pub fn press(mut self, key: Key) -> Self {
        let state = &mut self.keys[key.index()];
        state.pressed = true;
        state.held = true;
        self
    }

    /// Builder: key is being held (no edge)
    pub fn hold(mut self, key: Key) -> Self {
        self.keys[key.index()].held = true;
        self
    }

    /// Builder: key went up this frame
    pub fn release(mut self, key: Key) -> Self {
        let state = &mut self.keys[key.index()];
        state.released = true;
        state.held = false;
        self
    }

    pub fn key(&self, key: Key) -> KeyState {
        self.keys[key.index()]
    }

    pub fn pressed(&self, key: Key) -> bool {
        self.keys[key.index()].pressed
    }

    pub fn released(&self, key: Key) -> bool {
        self.keys[key.index()].released
    }
}

/// Confirm key for stabilize and land
pub const CONFIRM_KEY: Key = Key::LeftCtrl;
/// Confirm key for the burn; also fires all thrusters during the burn
pub const BURN_KEY: Key = Key::Space;

pub type Binding = (Key, &'static [ThrusterId]);

const COASTING_BINDINGS: &[Binding] = &[
    (Key::W, &[ThrusterId::Four]),
    (Key::S, &[ThrusterId::Two]),
    (Key::A, &[ThrusterId::One]),
    (Key::D, &[ThrusterId::Three]),
];

const BURN_BINDINGS: &[Binding] = &[(BURN_KEY, &ThrusterId::ALL)];

/// Thruster keys active in a phase and the thrusters each one drives
pub fn thruster_bindings(phase: LandingPhase) -> &'static [Binding] {
    match phase {
        LandingPhase::Coasting => COASTING_BINDINGS,
        LandingPhase::RetrogradeBurn => BURN_BINDINGS,
        _ => &[],
    }
}
