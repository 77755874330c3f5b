//! Manual-forwarding adapter with push delivery.

use crate::config::TuningConfig;
use crate::engine::{BatchOutcome, LineIncrements, PenModeHypothesis, PulsedTouchCore};
use crate::touch::{LineId, RawTouch, TouchBatch, TouchPhase, ViewTransform};

/// Receiver of pushed results.
pub trait LinesChanged {
    /// New points, keyed by line. Called only when there is something to deliver.
    fn lines_changed(&mut self, increments: &LineIncrements);

    /// The pen-mode hypothesis changed.
    fn pen_mode_changed(&mut self, _hypothesis: &PenModeHypothesis) {}

    /// Lines were closed (ended, cancelled or timed out).
    fn lines_closed(&mut self, _lines: &[LineId]) {}
}

impl<F> LinesChanged for F
where
    F: FnMut(&LineIncrements),
{
    fn lines_changed(&mut self, increments: &LineIncrements) {
        self(increments)
    }
}

/// Push-style adapter: every forwarded batch is classified and its
/// increments handed to the delegate right away.
#[derive(Debug, Clone)]
pub struct PulsedTouchAnalyzer<D> {
    core: PulsedTouchCore,
    delegate: D,
}

impl<D: LinesChanged> PulsedTouchAnalyzer<D> {
    pub fn new(config: TuningConfig, delegate: D) -> Self {
        Self {
            core: PulsedTouchCore::new(config),
            delegate,
        }
    }

    pub fn touches_began(&mut self, timestamp: f64, touches: &[RawTouch]) {
        self.forward(TouchPhase::Began, timestamp, touches);
    }

    pub fn touches_moved(&mut self, timestamp: f64, touches: &[RawTouch]) {
        self.forward(TouchPhase::Moved, timestamp, touches);
    }

    pub fn touches_ended(&mut self, timestamp: f64, touches: &[RawTouch]) {
        self.forward(TouchPhase::Ended, timestamp, touches);
    }

    pub fn touches_cancelled(&mut self, timestamp: f64, touches: &[RawTouch]) {
        self.forward(TouchPhase::Cancelled, timestamp, touches);
    }

    /// Forwards an already assembled batch.
    pub fn process(&mut self, batch: &TouchBatch) {
        let outcome = self.core.process(batch);
        self.deliver(outcome);
    }

    /// Closes timed-out lines when no batch arrives.
    pub fn advance_to(&mut self, timestamp: f64) {
        let outcome = self.core.advance_to(timestamp);
        self.deliver(outcome);
    }

    /// The coordinate space of the reference view changed.
    pub fn change_view(&mut self, view: ViewTransform) {
        self.core.change_view(view);
    }

    pub fn clean_up(&mut self) {
        self.core.clean_up();
    }

    pub fn config(&self) -> &TuningConfig {
        self.core.config()
    }

    pub fn set_config(&mut self, config: TuningConfig) {
        self.core.set_config(config);
    }

    pub fn pen_mode(&self) -> PenModeHypothesis {
        self.core.pen_mode()
    }

    pub fn core(&self) -> &PulsedTouchCore {
        &self.core
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    pub fn into_delegate(self) -> D {
        self.delegate
    }

    fn forward(&mut self, phase: TouchPhase, timestamp: f64, touches: &[RawTouch]) {
        self.process(&TouchBatch::new(phase, timestamp, touches.to_vec()));
    }

    fn deliver(&mut self, outcome: BatchOutcome) {
        let increments = self.core.drain();
        if !increments.is_empty() {
            self.delegate.lines_changed(&increments);
        }
        if outcome.pen_mode_changed {
            let hypothesis = self.core.pen_mode();
            self.delegate.pen_mode_changed(&hypothesis);
        }
        if !outcome.closed.is_empty() {
            self.delegate.lines_closed(&outcome.closed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PenModeSwitch;
    use crate::synth::PenStrokeBuilder;

    #[derive(Default)]
    struct Recorder {
        deliveries: Vec<LineIncrements>,
        modes: Vec<PenModeHypothesis>,
        closed: Vec<LineId>,
    }

    impl LinesChanged for Recorder {
        fn lines_changed(&mut self, increments: &LineIncrements) {
            self.deliveries.push(increments.clone());
        }

        fn pen_mode_changed(&mut self, hypothesis: &PenModeHypothesis) {
            self.modes.push(*hypothesis);
        }

        fn lines_closed(&mut self, lines: &[LineId]) {
            self.closed.extend_from_slice(lines);
        }
    }

    #[test]
    fn closure_delegate_receives_each_batch() {
        let mut count = 0usize;
        {
            let delegate = |increments: &LineIncrements| {
                count += increments.values().map(|i| i.len()).sum::<usize>();
            };
            let mut analyzer = PulsedTouchAnalyzer::new(TuningConfig::default(), delegate);
            analyzer.touches_began(0.0, &[RawTouch::new(1, 0.0, 0.0)]);
            analyzer.touches_moved(1.0 / 60.0, &[RawTouch::new(1, 4.0, 0.0)]);
            analyzer.touches_ended(2.0 / 60.0, &[RawTouch::new(1, 8.0, 0.0)]);
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn recorder_sees_pen_mode_and_closure() {
        let mut analyzer = PulsedTouchAnalyzer::new(TuningConfig::default(), Recorder::default());
        let stroke = PenStrokeBuilder::new()
            .mode(PenModeSwitch::Two, 1)
            .unwrap()
            .cycles(6);
        for batch in stroke.frames() {
            analyzer.process(&batch);
        }
        analyzer.advance_to(stroke.end_time() + 1.0);

        let recorder = analyzer.into_delegate();
        let last = recorder.modes.last().unwrap();
        assert!(last.is_final);
        assert_eq!(last.mode, 1);
        assert_eq!(recorder.closed, vec![LineId(1)]);
        assert!(recorder.deliveries.iter().all(|d| !d.is_empty()));
    }

    #[test]
    fn change_view_only_affects_coordinates() {
        let mut analyzer = PulsedTouchAnalyzer::new(TuningConfig::default(), Recorder::default());
        analyzer.change_view(ViewTransform::new(crate::util::Point::new(10.0, 10.0), 1.0));
        analyzer.touches_began(0.0, &[RawTouch::new(1, 15.0, 30.0)]);
        let point = analyzer.delegate().deliveries[0][&LineId(1)].touches[0].point;
        assert_eq!(point, crate::util::Point::new(5.0, 20.0));
    }
}
