//! Calling conventions around [`PulsedTouchCore`](crate::engine::PulsedTouchCore).
//!
//! - [`PulsedTouchRecognizer`]: gesture-recognizer shaped; the caller pulls
//!   increments and may observe a failure state when fingers should yield
//! - [`PulsedTouchAnalyzer`]: manual forwarding; increments are pushed to a
//!   [`LinesChanged`] delegate after every batch

pub mod analyzer;
pub mod recognizer;

// Re-export commonly used types at module level
pub use analyzer::{LinesChanged, PulsedTouchAnalyzer};
pub use recognizer::{PulsedTouchRecognizer, RecognizerState};
