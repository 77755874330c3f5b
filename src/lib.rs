//! Pen, finger and palm classification for pulsed active styli.
//!
//! Raw touch batches go in, per-line increments of classified,
//! velocity-annotated points come out, together with the pen mode decoded
//! from the stylus' on/off pulse pattern. [`engine::PulsedTouchCore`] does the
//! work; [`adapter`] wraps it in a pull-style recognizer and a push-style
//! analyzer. Configuration, replay traces and synthetic input support the
//! `pulsetouch` binary and the tests.

pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod synth;
pub mod touch;
pub mod trace;
pub mod util;

pub use adapter::{LinesChanged, PulsedTouchAnalyzer, PulsedTouchRecognizer, RecognizerState};
pub use config::Config;
pub use engine::{BatchOutcome, LineIncrement, LineIncrements, PenModeHypothesis, PulsedTouchCore};
pub use error::{Error, TraceError};
pub use touch::{Classification, LineId, RawTouch, TouchBatch, TouchPhase, TouchPoint};
