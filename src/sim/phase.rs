//! Landing phases and the transition graph
//!
//! `next_phase` is the only place phase edges are defined. The sequencer
//! turns gated input and timer expiry into `LandingEvent`s and feeds them
//! through here, so every transition it makes is an edge of this graph.

use serde::{Deserialize, Serialize};

/// Current stage of the landing sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandingPhase {
    /// Waiting out the pre-coasting delay
    Initial,
    /// Coasting impulse pending (lasts one physics tick)
    PreCoasting,
    /// Free flight under manual attitude thrust
    Coasting,
    /// Attitude autopilot running
    Stabilizing,
    /// Waiting to reach burn distance
    Stabilized,
    /// Thrusters armed, waiting for burn confirmation
    PreBurn,
    /// Manual deceleration under target gravity
    RetrogradeBurn,
    /// Landing autopilot running
    Landing,
    /// Down; thrusters shutting off one by one
    Landed,
}

impl LandingPhase {
    pub const ALL: [LandingPhase; 9] = [
        LandingPhase::Initial,
        LandingPhase::PreCoasting,
        LandingPhase::Coasting,
        LandingPhase::Stabilizing,
        LandingPhase::Stabilized,
        LandingPhase::PreBurn,
        LandingPhase::RetrogradeBurn,
        LandingPhase::Landing,
        LandingPhase::Landed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LandingPhase::Initial => "Initial",
            LandingPhase::PreCoasting => "PreCoasting",
            LandingPhase::Coasting => "Coasting",
            LandingPhase::Stabilizing => "Stabilizing",
            LandingPhase::Stabilized => "Stabilized",
            LandingPhase::PreBurn => "PreBurn",
            LandingPhase::RetrogradeBurn => "RetrogradeBurn",
            LandingPhase::Landing => "Landing",
            LandingPhase::Landed => "Landed",
        }
    }

    /// Position in `ALL`
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for LandingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that may move the sequence forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandingEvent {
    /// Pre-coasting delay elapsed
    DelayElapsed,
    /// Coasting impulse applied
    ImpulseApplied,
    /// Stabilize confirmed while `can_stabilize` was set
    StabilizeConfirmed,
    /// Both autopilot procedures signalled completion
    AutopilotComplete,
    /// Surface distance dropped below the burn distance
    BurnDistanceReached,
    /// Burn confirm pressed
    BurnConfirmed,
    /// Land confirmed while `can_land` was set
    LandConfirmed,
}

impl LandingEvent {
    pub const ALL: [LandingEvent; 7] = [
        LandingEvent::DelayElapsed,
        LandingEvent::ImpulseApplied,
        LandingEvent::StabilizeConfirmed,
        LandingEvent::AutopilotComplete,
        LandingEvent::BurnDistanceReached,
        LandingEvent::BurnConfirmed,
        LandingEvent::LandConfirmed,
    ];
}

/// Which variant of the phase graph is in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseGraph {
    /// Initial through Landed
    #[default]
    Full,
    /// Earlier configuration that stops at RetrogradeBurn
    Reduced,
}

impl PhaseGraph {
    pub fn is_terminal(self, phase: LandingPhase) -> bool {
        match self {
            PhaseGraph::Full => phase == LandingPhase::Landed,
            PhaseGraph::Reduced => phase == LandingPhase::RetrogradeBurn,
        }
    }
}

/// Apply one event; unmodeled (phase, event) pairs leave the phase unchanged
pub fn next_phase(graph: PhaseGraph, phase: LandingPhase, event: LandingEvent) -> LandingPhase {
    use LandingEvent as E;
    use LandingPhase as P;

    match (phase, event) {
        (P::Initial, E::DelayElapsed) => P::PreCoasting,
        (P::PreCoasting, E::ImpulseApplied) => P::Coasting,
        (P::Coasting, E::StabilizeConfirmed) => P::Stabilizing,
        (P::Stabilizing, E::AutopilotComplete) => P::Stabilized,
        (P::Stabilized, E::BurnDistanceReached) => P::PreBurn,
        (P::PreBurn, E::BurnConfirmed) => P::RetrogradeBurn,
        (P::RetrogradeBurn, E::LandConfirmed) if graph == PhaseGraph::Full => P::Landing,
        (P::Landing, E::AutopilotComplete) => P::Landed,
        _ => phase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table_successor(phase: LandingPhase) -> Option<LandingPhase> {
        LandingPhase::ALL.get(phase.index() + 1).copied()
    }

    #[test]
    fn test_all_is_in_index_order() {
        for (i, phase) in LandingPhase::ALL.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
    }

    #[test]
    fn test_full_graph_walk() {
        let script = [
            LandingEvent::DelayElapsed,
            LandingEvent::ImpulseApplied,
            LandingEvent::StabilizeConfirmed,
            LandingEvent::AutopilotComplete,
            LandingEvent::BurnDistanceReached,
            LandingEvent::BurnConfirmed,
            LandingEvent::LandConfirmed,
            LandingEvent::AutopilotComplete,
        ];
        let mut phase = LandingPhase::Initial;
        for event in script {
            let next = next_phase(PhaseGraph::Full, phase, event);
            assert_eq!(Some(next), table_successor(phase));
            phase = next;
        }
        assert_eq!(phase, LandingPhase::Landed);
        assert!(PhaseGraph::Full.is_terminal(phase));
    }

    #[test]
    fn test_landed_absorbs_everything() {
        for event in LandingEvent::ALL {
            assert_eq!(
                next_phase(PhaseGraph::Full, LandingPhase::Landed, event),
                LandingPhase::Landed
            );
        }
    }

    #[test]
    fn test_reduced_graph_stops_at_burn() {
        let phase = next_phase(
            PhaseGraph::Reduced,
            LandingPhase::RetrogradeBurn,
            LandingEvent::LandConfirmed,
        );
        assert_eq!(phase, LandingPhase::RetrogradeBurn);
        assert!(PhaseGraph::Reduced.is_terminal(phase));
    }

    #[test]
    fn test_autopilot_complete_is_phase_specific() {
        assert_eq!(
            next_phase(PhaseGraph::Full, LandingPhase::Coasting, LandingEvent::AutopilotComplete),
            LandingPhase::Coasting
        );
        assert_eq!(
            next_phase(PhaseGraph::Full, LandingPhase::Stabilizing, LandingEvent::AutopilotComplete),
            LandingPhase::Stabilized
        );
    }

    proptest! {
        #[test]
        fn prop_transition_is_closed(
            phase_idx in 0usize..LandingPhase::ALL.len(),
            event_idx in 0usize..LandingEvent::ALL.len(),
            reduced in any::<bool>(),
        ) {
            let graph = if reduced { PhaseGraph::Reduced } else { PhaseGraph::Full };
            let phase = LandingPhase::ALL[phase_idx];
            let next = next_phase(graph, phase, LandingEvent::ALL[event_idx]);
            // Either unchanged or the single forward edge, never a skip
            prop_assert!(next == phase || Some(next) == table_successor(phase));
        }
    }
}
