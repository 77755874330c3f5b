//! Gesture-recognizer shaped adapter.

use crate::config::TuningConfig;
use crate::engine::{BatchOutcome, LineIncrements, PenModeHypothesis, PulsedTouchCore};
use crate::touch::{Classification, RawTouch, TouchBatch, TouchPhase, ViewTransform};
use log::debug;
use std::fmt;

/// Gesture state, as a platform gesture system would track it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecognizerState {
    #[default]
    Possible,
    Began,
    Changed,
    Ended,
    Cancelled,
    /// A finger was detected while `fail_on_finger_touch` is set.
    Failed,
}

impl RecognizerState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RecognizerState::Ended | RecognizerState::Cancelled | RecognizerState::Failed
        )
    }
}

impl fmt::Display for RecognizerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecognizerState::Possible => "possible",
            RecognizerState::Began => "began",
            RecognizerState::Changed => "changed",
            RecognizerState::Ended => "ended",
            RecognizerState::Cancelled => "cancelled",
            RecognizerState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Pull-style adapter: feed touches, then call [`line_increments`](Self::line_increments).
///
/// With `fail_on_finger_touch` set, a line settling as finger moves the
/// recognizer into [`RecognizerState::Failed`] so other recognizers can take
/// the touch, and finger lines are left out of the pulled increments.
#[derive(Debug, Clone, Default)]
pub struct PulsedTouchRecognizer {
    core: PulsedTouchCore,
    state: RecognizerState,
}

impl PulsedTouchRecognizer {
    pub fn new(config: TuningConfig) -> Self {
        Self {
            core: PulsedTouchCore::new(config),
            state: RecognizerState::Possible,
        }
    }

    pub fn touches_began(&mut self, timestamp: f64, touches: &[RawTouch]) -> BatchOutcome {
        self.handle(TouchPhase::Began, timestamp, touches)
    }

    pub fn touches_moved(&mut self, timestamp: f64, touches: &[RawTouch]) -> BatchOutcome {
        self.handle(TouchPhase::Moved, timestamp, touches)
    }

    pub fn touches_ended(&mut self, timestamp: f64, touches: &[RawTouch]) -> BatchOutcome {
        self.handle(TouchPhase::Ended, timestamp, touches)
    }

    pub fn touches_cancelled(&mut self, timestamp: f64, touches: &[RawTouch]) -> BatchOutcome {
        self.handle(TouchPhase::Cancelled, timestamp, touches)
    }

    /// Forwards an already assembled batch.
    pub fn process(&mut self, batch: &TouchBatch) -> BatchOutcome {
        if batch.phase == TouchPhase::Began && self.state.is_terminal() {
            self.reset();
        }
        let outcome = self.core.process(batch);
        self.advance_state(batch.phase, &outcome);
        outcome
    }

    /// Closes timed-out lines when no batch arrives.
    pub fn advance_to(&mut self, timestamp: f64) -> BatchOutcome {
        self.core.advance_to(timestamp)
    }

    /// Every increment since the previous call.
    pub fn line_increments(&mut self) -> LineIncrements {
        let mut increments = self.core.drain();
        if self.core.config().fail_on_finger_touch {
            increments.retain(|_, increment| increment.classification != Classification::Finger);
        }
        increments
    }

    pub fn state(&self) -> RecognizerState {
        self.state
    }

    pub fn has_failed(&self) -> bool {
        self.state == RecognizerState::Failed
    }

    /// Returns the gesture state to `Possible`; classification state is kept.
    pub fn reset(&mut self) {
        self.state = RecognizerState::Possible;
    }

    /// Discards all classification state and resets the gesture.
    pub fn clean_up(&mut self) {
        self.core.clean_up();
        self.reset();
    }

    pub fn pen_mode(&self) -> PenModeHypothesis {
        self.core.pen_mode()
    }

    pub fn config(&self) -> &TuningConfig {
        self.core.config()
    }

    pub fn set_config(&mut self, config: TuningConfig) {
        self.core.set_config(config);
    }

    pub fn change_view(&mut self, view: ViewTransform) {
        self.core.change_view(view);
    }

    pub fn core(&self) -> &PulsedTouchCore {
        &self.core
    }

    fn handle(&mut self, phase: TouchPhase, timestamp: f64, touches: &[RawTouch]) -> BatchOutcome {
        self.process(&TouchBatch::new(phase, timestamp, touches.to_vec()))
    }

    fn advance_state(&mut self, phase: TouchPhase, outcome: &BatchOutcome) {
        if self.state.is_terminal() {
            return;
        }
        let previous = self.state;
        if self.core.config().fail_on_finger_touch && outcome.finger_detected() {
            self.state = RecognizerState::Failed;
        } else if outcome.appended > 0 {
            self.state = match self.state {
                RecognizerState::Possible => RecognizerState::Began,
                _ => RecognizerState::Changed,
            };
        }

        if phase.is_terminal()
            && !self.core.has_active_contacts()
            && matches!(self.state, RecognizerState::Began | RecognizerState::Changed)
        {
            self.state = if phase == TouchPhase::Cancelled {
                RecognizerState::Cancelled
            } else {
                RecognizerState::Ended
            };
        }
        if self.state != previous {
            debug!("Recognizer {previous} -> {}", self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touch::LineId;

    fn touch(x: f64) -> [RawTouch; 1] {
        [RawTouch::new(1, x, 0.0)]
    }

    fn slow_drag(recognizer: &mut PulsedTouchRecognizer, frames: u32) {
        recognizer.touches_began(0.0, &touch(0.0));
        for k in 1..=frames {
            recognizer.touches_moved(f64::from(k) / 60.0, &touch(f64::from(k)));
        }
    }

    #[test]
    fn state_moves_through_began_changed_ended() {
        let mut recognizer = PulsedTouchRecognizer::default();
        assert_eq!(recognizer.state(), RecognizerState::Possible);
        recognizer.touches_began(0.0, &touch(0.0));
        assert_eq!(recognizer.state(), RecognizerState::Began);
        recognizer.touches_moved(1.0 / 60.0, &touch(5.0));
        assert_eq!(recognizer.state(), RecognizerState::Changed);
        recognizer.touches_ended(2.0 / 60.0, &touch(10.0));
        assert_eq!(recognizer.state(), RecognizerState::Ended);

        recognizer.touches_began(1.0, &touch(300.0));
        assert_eq!(recognizer.state(), RecognizerState::Began);
    }

    #[test]
    fn cancel_ends_in_cancelled_state() {
        let mut recognizer = PulsedTouchRecognizer::default();
        recognizer.touches_began(0.0, &touch(0.0));
        recognizer.touches_cancelled(1.0 / 60.0, &touch(0.0));
        assert_eq!(recognizer.state(), RecognizerState::Cancelled);
    }

    #[test]
    fn finger_fails_only_when_configured() {
        let mut tolerant = PulsedTouchRecognizer::default();
        slow_drag(&mut tolerant, 6);
        assert!(!tolerant.has_failed());
        let increments = tolerant.line_increments();
        assert_eq!(increments[&LineId(1)].classification, Classification::Finger);

        let mut tuning = TuningConfig::default();
        tuning.fail_on_finger_touch = true;
        let mut strict = PulsedTouchRecognizer::new(tuning);
        slow_drag(&mut strict, 6);
        assert!(strict.has_failed());
        assert!(strict.line_increments().is_empty());
        // Classification is still available from the core.
        assert_eq!(
            strict.core().line(LineId(1)).unwrap().classification,
            Classification::Finger
        );
    }

    #[test]
    fn clean_up_resets_state_and_lines() {
        let mut tuning = TuningConfig::default();
        tuning.fail_on_finger_touch = true;
        let mut recognizer = PulsedTouchRecognizer::new(tuning);
        slow_drag(&mut recognizer, 6);
        recognizer.clean_up();
        assert_eq!(recognizer.state(), RecognizerState::Possible);
        assert!(recognizer.line_increments().is_empty());
        assert_eq!(recognizer.core().lines().count(), 0);
    }
}
