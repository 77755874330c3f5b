//! Synthetic touch input.
//!
//! Builds the batch sequences a touch controller would deliver for a pulsed
//! stylus stroke or a finger drag. Used by the `simulate` command and by tests.

use crate::config::PenModeSwitch;
use crate::engine::{NOMINAL_SAMPLING_INTERVAL, pulse};
use crate::error::Error;
use crate::touch::{RawTouch, TouchBatch, TouchPhase};
use crate::util::{Point, Vector};

/// A straight stylus stroke that pulses on and off the glass.
///
/// Each on-phase is a new platform contact: a began sample, moved samples for
/// the remaining on-frames, and an ended sample on the first off-frame. The
/// pen keeps moving during the off-phase, so the next contact lands where the
/// stroke would be.
#[derive(Debug, Clone)]
pub struct PenStrokeBuilder {
    start: Point,
    velocity: Vector,
    start_time: f64,
    interval: f64,
    on_frames: u32,
    off_frames: u32,
    cycles: u32,
    first_touch_id: u64,
}

impl Default for PenStrokeBuilder {
    fn default() -> Self {
        Self {
            start: Point::new(100.0, 100.0),
            velocity: Vector::new(300.0, 0.0),
            start_time: 0.0,
            interval: NOMINAL_SAMPLING_INTERVAL,
            on_frames: 2,
            off_frames: 1,
            cycles: 6,
            first_touch_id: 1,
        }
    }
}

impl PenStrokeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, point: Point) -> Self {
        self.start = point;
        self
    }

    /// Stroke velocity in px/s.
    pub fn velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn start_time(mut self, t: f64) -> Self {
        self.start_time = t;
        self
    }

    pub fn interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }

    /// Raw on/off frame counts of every cycle.
    pub fn pulses(mut self, on_frames: u32, off_frames: u32) -> Self {
        self.on_frames = on_frames.max(1);
        self.off_frames = off_frames;
        self
    }

    /// Pulses with the template of `mode` (1-based) out of `modes`.
    pub fn mode(self, modes: PenModeSwitch, mode: u8) -> Result<Self, Error> {
        let (on, off) = pulse::template(modes, mode).ok_or(Error::InvalidPenMode {
            mode,
            modes: modes.into(),
        })?;
        Ok(self.pulses(on, off))
    }

    /// Number of on-phases.
    pub fn cycles(mut self, cycles: u32) -> Self {
        self.cycles = cycles;
        self
    }

    /// Identifier of the first contact; later contacts count up from it.
    pub fn first_touch_id(mut self, id: u64) -> Self {
        self.first_touch_id = id;
        self
    }

    /// Timestamp of the frame after the stroke's last ended sample.
    pub fn end_time(&self) -> f64 {
        self.frame_time(u64::from(self.cycles) * u64::from(self.on_frames + self.off_frames))
    }

    pub fn frames(&self) -> Vec<TouchBatch> {
        let period = u64::from(self.on_frames + self.off_frames);
        let mut batches = Vec::new();
        for cycle in 0..u64::from(self.cycles) {
            let id = self.first_touch_id + cycle;
            let first_frame = cycle * period;
            for k in 0..u64::from(self.on_frames) {
                let phase = if k == 0 {
                    TouchPhase::Began
                } else {
                    TouchPhase::Moved
                };
                batches.push(self.batch(phase, id, first_frame + k));
            }
            let ended_frame = first_frame + u64::from(self.on_frames);
            batches.push(self.batch(TouchPhase::Ended, id, ended_frame));
        }
        batches
    }

    fn frame_time(&self, frame: u64) -> f64 {
        self.start_time + frame as f64 * self.interval
    }

    fn batch(&self, phase: TouchPhase, id: u64, frame: u64) -> TouchBatch {
        let t = self.frame_time(frame);
        let at = self.start.offset(self.velocity, t - self.start_time);
        TouchBatch::new(phase, t, vec![RawTouch::new(id, at.x, at.y)])
    }
}

/// A continuous contact moving at `velocity` for `frames` samples, then lifting.
pub fn finger_drag(
    id: u64,
    start: Point,
    velocity: Vector,
    start_time: f64,
    frames: u32,
) -> Vec<TouchBatch> {
    let interval = NOMINAL_SAMPLING_INTERVAL;
    let mut batches: Vec<TouchBatch> = (0..=frames)
        .map(|frame| {
            let dt = f64::from(frame) * interval;
            let at = start.offset(velocity, dt);
            let phase = if frame == 0 {
                TouchPhase::Began
            } else if frame == frames {
                TouchPhase::Ended
            } else {
                TouchPhase::Moved
            };
            TouchBatch::new(phase, start_time + dt, vec![RawTouch::new(id, at.x, at.y)])
        })
        .collect();
    if frames == 0 {
        // A tap: began and ended in the same frame.
        let ended = batches.first().map(|began| TouchBatch {
            phase: TouchPhase::Ended,
            ..began.clone()
        });
        batches.extend(ended);
    }
    batches
}

/// Interleaves two batch sequences by timestamp; `a` goes first on ties.
pub fn merge(a: Vec<TouchBatch>, b: Vec<TouchBatch>) -> Vec<TouchBatch> {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let mut a = a.into_iter().peekable();
    let mut b = b.into_iter().peekable();
    loop {
        let take_a = match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => x.timestamp <= y.timestamp,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_a { a.next() } else { b.next() };
        merged.extend(next);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulsed_stroke_has_one_contact_per_on_phase() {
        let frames = PenStrokeBuilder::new().pulses(3, 1).cycles(2).frames();
        let phases: Vec<TouchPhase> = frames.iter().map(|b| b.phase).collect();
        assert_eq!(
            phases,
            vec![
                TouchPhase::Began,
                TouchPhase::Moved,
                TouchPhase::Moved,
                TouchPhase::Ended,
                TouchPhase::Began,
                TouchPhase::Moved,
                TouchPhase::Moved,
                TouchPhase::Ended,
            ]
        );
        assert_eq!(frames[4].touches[0].id.0, 2);
        let dt = NOMINAL_SAMPLING_INTERVAL;
        assert!((frames[4].timestamp - 4.0 * dt).abs() < 1e-12);
        assert!((frames[4].touches[0].location.x - (100.0 + 300.0 * 4.0 * dt)).abs() < 1e-9);
    }

    #[test]
    fn mode_uses_template_and_rejects_missing_modes() {
        let builder = PenStrokeBuilder::new().mode(PenModeSwitch::Two, 2).unwrap();
        assert_eq!((builder.on_frames, builder.off_frames), (3, 1));
        assert!(matches!(
            PenStrokeBuilder::new().mode(PenModeSwitch::Two, 3),
            Err(Error::InvalidPenMode { mode: 3, modes: 2 })
        ));
    }

    #[test]
    fn finger_drag_ends_on_last_frame() {
        let frames = finger_drag(7, Point::new(0.0, 0.0), Vector::new(60.0, 0.0), 1.0, 4);
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0].phase, TouchPhase::Began);
        assert_eq!(frames[4].phase, TouchPhase::Ended);

        let tap = finger_drag(8, Point::new(0.0, 0.0), Vector::ZERO, 0.0, 0);
        assert_eq!(tap.len(), 2);
        assert_eq!(tap[0].timestamp, tap[1].timestamp);
    }

    #[test]
    fn merge_orders_by_time() {
        let a = finger_drag(1, Point::new(0.0, 0.0), Vector::ZERO, 0.0, 2);
        let b = finger_drag(2, Point::new(0.0, 0.0), Vector::ZERO, 0.01, 2);
        let merged = merge(a, b);
        let times: Vec<f64> = merged.iter().map(|batch| batch.timestamp).collect();
        let mut sorted = times.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(times, sorted);
        assert_eq!(merged.len(), 6);
    }
}
