//! Per-line state records.
//!
//! Everything the engine knows about a line lives in one [`LineState`] value
//! stored in the registry's map, so a line can be inspected or cloned as a
//! plain snapshot.

use super::pulse::PulseCycle;
use crate::touch::{Classification, LineId, TouchId, TouchPoint};
use std::collections::VecDeque;

/// Number of recent speeds kept for the running average.
const SPEED_WINDOW: usize = 5;

/// Running average over the most recent accepted speeds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedStats {
    recent: VecDeque<f64>,
}

impl SpeedStats {
    pub fn push(&mut self, speed: f64) {
        if !speed.is_finite() {
            return;
        }
        if self.recent.len() == SPEED_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(speed);
    }

    /// Mean of the recent speeds, zero when nothing was recorded yet.
    pub fn average(&self) -> f64 {
        if self.recent.is_empty() {
            0.0
        } else {
            self.recent.iter().sum::<f64>() / self.recent.len() as f64
        }
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}

/// Classification evidence gathered while a line is still unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evidence {
    /// Consecutive samples at or above the minimum speed (or completing a pulse).
    pub pen_streak: u32,
    /// Consecutive samples below the minimum speed.
    pub finger_streak: u32,
    /// Completed on/off pulse cycles; never reset.
    pub pulse_cycles: u32,
    /// Samples rejected for exceeding the speed ceiling.
    pub outliers: u32,
    /// Outliers since the last accepted speed.
    pub outlier_run: u32,
}

/// On/off timing of the contacts attributed to one line.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseAccumulator {
    run_start: f64,
    run_last: f64,
    /// Cycles completed while the line was not yet a pen line.
    backlog: Vec<PulseCycle>,
}

impl PulseAccumulator {
    pub fn new(timestamp: f64) -> Self {
        Self {
            run_start: timestamp,
            run_last: timestamp,
            backlog: Vec::new(),
        }
    }

    /// Extends the current on-run.
    pub fn extend_run(&mut self, timestamp: f64) {
        self.run_last = timestamp;
    }

    /// Closes the current on-run at the arrival of a new contact and starts the next one.
    pub fn complete_cycle(&mut self, timestamp: f64, sampling_interval: f64) -> PulseCycle {
        let on_frames = (self.run_last - self.run_start) / sampling_interval + 1.0;
        let off_frames = ((timestamp - self.run_last) / sampling_interval - 1.0).max(0.0);
        self.run_start = timestamp;
        self.run_last = timestamp;
        PulseCycle {
            on_frames,
            off_frames,
        }
    }

    pub fn defer(&mut self, cycle: PulseCycle) {
        self.backlog.push(cycle);
    }

    pub fn take_backlog(&mut self) -> Vec<PulseCycle> {
        std::mem::take(&mut self.backlog)
    }
}

/// State of one open line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineState {
    pub id: LineId,
    pub classification: Classification,
    /// Platform contact currently feeding the line, if any.
    pub contact: Option<TouchId>,
    /// Set when the contact ended; the line stays open through the pen's off-phase.
    pub lifted: bool,
    pub first_timestamp: f64,
    pub last_point: TouchPoint,
    pub point_count: usize,
    /// Registry-wide update counter, used to find the most recently updated line.
    pub updated_seq: u64,
    pub speeds: SpeedStats,
    pub evidence: Evidence,
    pub pulses: PulseAccumulator,
}

impl LineState {
    pub fn last_timestamp(&self) -> f64 {
        self.last_point.timestamp
    }

    /// True when the line's contact is still on the glass at `now`.
    pub fn is_touching(&self, now: f64, stale_contact_window: f64) -> bool {
        self.contact.is_some()
            && !self.lifted
            && now - self.last_timestamp() <= stale_contact_window
    }

    /// Whether a new contact may still attach to this line.
    pub fn accepts_continuation(&self) -> bool {
        matches!(
            self.classification,
            Classification::Unknown | Classification::Pen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_stats_average_over_recent_window() {
        let mut stats = SpeedStats::default();
        assert_eq!(stats.average(), 0.0);
        for speed in [100.0, 100.0, 100.0, 100.0, 100.0, 600.0] {
            stats.push(speed);
        }
        assert_eq!(stats.len(), SPEED_WINDOW);
        assert!((stats.average() - 200.0).abs() < 1e-9);
        stats.push(f64::INFINITY);
        assert_eq!(stats.len(), SPEED_WINDOW);
    }

    #[test]
    fn pulse_cycle_counts_frames() {
        let dt = 1.0 / 60.0;
        let mut pulses = PulseAccumulator::new(0.0);
        pulses.extend_run(dt);
        pulses.extend_run(2.0 * dt);
        let cycle = pulses.complete_cycle(4.0 * dt, dt);
        assert!((cycle.on_frames - 3.0).abs() < 1e-9);
        assert!((cycle.off_frames - 1.0).abs() < 1e-9);

        let cycle = pulses.complete_cycle(6.0 * dt, dt);
        assert!((cycle.on_frames - 1.0).abs() < 1e-9);
        assert!((cycle.off_frames - 1.0).abs() < 1e-9);
    }
}
