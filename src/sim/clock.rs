//! Frame/physics timing
//!
//! Frames arrive with variable deltas; physics runs at a fixed step. The
//! accumulator splits one into the other, capped so a long stall cannot
//! snowball into ever more substeps.

/// Countdown comparisons absorb float drift from summing frame deltas.
/// The step clock compares exactly so physics never runs ahead of wall time.
pub const TIMER_EPSILON: f32 = 1e-3;

/// Fixed-step accumulator
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    step: f32,
    max_substeps: u32,
    accumulator: f32,
    /// Total simulated time consumed by physics steps
    physics_time: f64,
}

impl FixedStepClock {
    pub fn new(step: f32, max_substeps: u32) -> Self {
        Self {
            step,
            max_substeps,
            accumulator: 0.0,
            physics_time: 0.0,
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn physics_time(&self) -> f64 {
        self.physics_time
    }

    /// Feed a frame delta; returns how many physics steps to run now
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.max(0.0);
        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_substeps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == self.max_substeps && self.accumulator >= self.step {
            log::warn!(
                "Physics falling behind, dropping {:.3}s of simulation",
                self.accumulator
            );
            self.accumulator = 0.0;
        }
        self.physics_time += f64::from(self.step) * f64::from(steps);
        steps
    }
}

/// One-shot countdown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delay {
    remaining: f32,
}

impl Delay {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    /// Advance; true once the delay has fully elapsed (and every call after)
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.is_done()
    }

    pub fn is_done(&self) -> bool {
        self.remaining <= TIMER_EPSILON
    }

    /// Negative once overshot
    pub fn remaining_signed(&self) -> f32 {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{MAX_SUBSTEPS, SIM_DT};

    #[test]
    fn test_delay_exact_with_drift() {
        // 1/60 does not sum exactly to 5.0; the delay still fires on frame 300
        let mut delay = Delay::new(5.0);
        let dt = 1.0 / 60.0;
        for _ in 0..299 {
            assert!(!delay.tick(dt));
        }
        assert!(delay.tick(dt));
        assert!(delay.tick(dt));
    }

    #[test]
    fn test_zero_delay_fires_immediately() {
        let mut delay = Delay::new(0.0);
        assert!(delay.tick(0.0));
    }

    #[test]
    fn test_clock_splits_frames() {
        // Binary-exact deltas: three frames of 1/64 s against 1/32 s physics
        let mut clock = FixedStepClock::new(1.0 / 32.0, MAX_SUBSTEPS);
        let steps: Vec<u32> = (0..6).map(|_| clock.advance(1.0 / 64.0)).collect();
        assert_eq!(steps, vec![0, 1, 0, 1, 0, 1]);
        assert_eq!(clock.physics_time(), 3.0 / 32.0);

        // 60 Hz frames against 50 Hz physics: one second is 50 steps, give or
        // take the last one depending on how 1/60 rounds
        let mut clock = FixedStepClock::new(SIM_DT, MAX_SUBSTEPS);
        let total: u32 = (0..60).map(|_| clock.advance(1.0 / 60.0)).sum();
        assert!((49..=50).contains(&total), "got {total}");
    }

    #[test]
    fn test_clock_never_runs_ahead_of_wall_time() {
        // Frames just shorter than the step must not each buy a full step
        let mut clock = FixedStepClock::new(0.02, MAX_SUBSTEPS);
        let mut wall = 0.0f64;
        let mut steps = 0;
        for _ in 0..1000 {
            steps += clock.advance(0.0195);
            wall += 0.0195;
            assert!(clock.physics_time() <= wall + 1e-4);
        }
        assert!((974..=975).contains(&steps), "got {steps}");
        assert!(wall - clock.physics_time() < 0.02 + 1e-3);
    }

    #[test]
    fn test_clock_caps_substeps() {
        let mut clock = FixedStepClock::new(SIM_DT, MAX_SUBSTEPS);
        assert_eq!(clock.advance(10.0), MAX_SUBSTEPS);
        // Backlog dropped
        assert_eq!(clock.advance(0.0), 0);
    }
}
