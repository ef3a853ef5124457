//! Staggered thruster activation and shutdown
//!
//! Thrusters come online (or go offline) one at a time in a fixed order,
//! each after its own fixed delay. Nothing here is simultaneous: a single
//! frame advances at most as many steps as its delta covers, in order.

use super::clock::Delay;
use super::thruster::{ThrusterBank, ThrusterId};

/// What each stagger step does to its thruster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaggerAction {
    Ready,
    Offline,
}

#[derive(Debug, Clone)]
pub struct StaggeredSequence {
    action: StaggerAction,
    order: [ThrusterId; 4],
    delay: f32,
    next: usize,
    wait: Delay,
}

impl StaggeredSequence {
    pub fn new(action: StaggerAction, order: [ThrusterId; 4], delay: f32) -> Self {
        Self {
            action,
            order,
            delay,
            next: 0,
            wait: Delay::new(delay),
        }
    }

    pub fn action(&self) -> StaggerAction {
        self.action
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.order.len()
    }

    /// Advance by `dt`, applying every step whose delay has run out
    ///
    /// Returns the thrusters switched this call, in order.
    pub fn advance(&mut self, dt: f32, bank: &mut ThrusterBank) -> Vec<ThrusterId> {
        let mut switched = Vec::new();
        if self.is_finished() {
            return switched;
        }
        self.wait.tick(dt);
        while !self.is_finished() && self.wait.is_done() {
            let id = self.order[self.next];
            match self.action {
                StaggerAction::Ready => bank.get_mut(id).ready(),
                StaggerAction::Offline => bank.get_mut(id).offline(),
            }
            log::debug!("Thruster {} ({}) -> {:?}", id.number(), id.label(), self.action);
            switched.push(id);
            self.next += 1;
            // Carry any overshoot into the next delay
            let overshoot = -self.wait.remaining_signed();
            self.wait = Delay::new(self.delay - overshoot.max(0.0));
        }
        switched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::thruster::ThrusterState;
    use crate::tuning::LanderTuning;

    fn order() -> [ThrusterId; 4] {
        LanderTuning::default().stagger_ids()
    }

    #[test]
    fn test_ready_sequence_timing() {
        let mut bank = ThrusterBank::default();
        let mut seq = StaggeredSequence::new(StaggerAction::Ready, order(), 2.0);
        let dt = 0.25;
        let mut ready_at = [None; 4];
        for tick in 1..=40 {
            let t = tick as f32 * dt;
            for id in seq.advance(dt, &mut bank) {
                ready_at[id.index()] = Some(t);
                assert_eq!(bank.get(id).state(), ThrusterState::Ready);
            }
        }
        assert_eq!(ready_at[ThrusterId::Three.index()], Some(2.0));
        assert_eq!(ready_at[ThrusterId::One.index()], Some(4.0));
        assert_eq!(ready_at[ThrusterId::Four.index()], Some(6.0));
        assert_eq!(ready_at[ThrusterId::Two.index()], Some(8.0));
        assert!(seq.is_finished());
    }

    #[test]
    fn test_one_at_a_time() {
        let mut bank = ThrusterBank::default();
        let mut seq = StaggeredSequence::new(StaggerAction::Ready, order(), 2.0);
        // Just before the first step nothing is ready
        assert!(seq.advance(1.9, &mut bank).is_empty());
        assert_eq!(bank.states(), [ThrusterState::Offline; 4]);
        let switched = seq.advance(0.1, &mut bank);
        assert_eq!(switched, vec![ThrusterId::Three]);
        assert_eq!(
            bank.states(),
            [
                ThrusterState::Offline,
                ThrusterState::Offline,
                ThrusterState::Ready,
                ThrusterState::Offline
            ]
        );
    }

    #[test]
    fn test_offline_sequence_with_frame_drift() {
        let mut bank = ThrusterBank::default();
        bank.ready_all();
        let mut seq = StaggeredSequence::new(StaggerAction::Offline, order(), 2.0);
        let dt = 1.0 / 60.0;
        let mut offline_frame = [0u32; 4];
        for frame in 1..=600 {
            for id in seq.advance(dt, &mut bank) {
                offline_frame[id.index()] = frame;
            }
        }
        assert_eq!(offline_frame[ThrusterId::Three.index()], 120);
        assert_eq!(offline_frame[ThrusterId::One.index()], 240);
        assert_eq!(offline_frame[ThrusterId::Four.index()], 360);
        assert_eq!(offline_frame[ThrusterId::Two.index()], 480);
        assert_eq!(bank.states(), [ThrusterState::Offline; 4]);
    }

    #[test]
    fn test_large_step_keeps_order() {
        let mut bank = ThrusterBank::default();
        let mut seq = StaggeredSequence::new(StaggerAction::Ready, order(), 2.0);
        let switched = seq.advance(5.0, &mut bank);
        assert_eq!(switched, vec![ThrusterId::Three, ThrusterId::One]);
        assert_eq!(seq.advance(1.0, &mut bank), vec![ThrusterId::Four]);
    }
}
