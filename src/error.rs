//! Construction and configuration errors
//!
//! The tick path never fails; these only surface while wiring a sequencer
//! together.

use thiserror::Error;

/// Errors raised by `LandingSequencerBuilder::build`.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("landing sequencer needs a physics service (call `physics(..)` before `build()`)")]
    MissingPhysics,
    #[error("landing sequencer needs a presentation sink (call `sink(..)` before `build()`)")]
    MissingSink,
    #[error("invalid tuning: {0}")]
    InvalidTuning(String),
}

