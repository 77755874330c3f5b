//! The pulsed-stylus classification engine.
//!
//! Data flows normalizer → registry/matching → classifier → pen-mode decoder
//! → assembler. [`PulsedTouchCore`] owns all of it; the adapters in
//! [`crate::adapter`] only forward batches and deliver increments.

pub mod assembler;
pub mod classifier;
mod core;
pub mod line;
pub mod matching;
pub mod pulse;
pub mod registry;
pub mod settings;

// Re-export commonly used types at module level
pub use assembler::{LineIncrement, LineIncrements};
pub use core::{BatchOutcome, PulsedTouchCore};
pub use line::LineState;
pub use matching::MatchDecision;
pub use pulse::PenModeHypothesis;
pub use settings::{MatchingProfile, NOMINAL_SAMPLING_INTERVAL, Settings};
