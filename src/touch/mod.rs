//! Touch input types and normalization.
//!
//! This module defines the raw input the platform hands over (phase, timestamp,
//! per-contact identifier and location) and the classified [`TouchPoint`] the
//! engine hands back.

pub mod classification;
pub mod events;
pub mod normalize;
pub mod point;

// Re-export commonly used types at module level
pub use classification::Classification;
pub use events::{RawTouch, TouchBatch, TouchId, TouchPhase};
pub use normalize::{NormalizedSample, TouchNormalizer, ViewTransform};
pub use point::{LineId, TouchPoint};
