//! Passive pen-mode decoding from the stylus' on/off pulse pattern.
//!
//! An active pen signals its mode by how many sampling frames it stays on the
//! glass and off it. Each time a new contact re-attaches to a line, the line
//! completes one [`PulseCycle`]. Cycles of pen lines are scored against the
//! pulse templates of the configured mode count:
//!
//! | modes | templates `(on, off)` in frames | cycles needed |
//! |-------|---------------------------------|---------------|
//! | 1     | `(2, 1)`                        | 0             |
//! | 2     | `(1, 1)`, `(3, 1)`              | 2             |
//! | 3     | `(1, 1)`, `(2, 1)`, `(3, 1)`    | 4             |
//!
//! The decode error is the mean normalized template distance of the best mode
//! plus a deficit for missing cycles. Once it drops below the configured limit
//! the hypothesis is final for the rest of the decode attempt. A pen line that
//! starts more than `time_between_same_lines` after the last pen activity
//! starts a fresh attempt, since switching modes on the pen takes longer.

use super::settings::Settings;
use crate::config::PenModeSwitch;
use crate::touch::LineId;
use log::{debug, info};
use serde::{Deserialize, Serialize};

const ONE_MODE: &[(u32, u32)] = &[(2, 1)];
const TWO_MODES: &[(u32, u32)] = &[(1, 1), (3, 1)];
const THREE_MODES: &[(u32, u32)] = &[(1, 1), (2, 1), (3, 1)];

/// Pulse templates `(on_frames, off_frames)` indexed by mode - 1.
pub fn templates(modes: PenModeSwitch) -> &'static [(u32, u32)] {
    match modes {
        PenModeSwitch::One => ONE_MODE,
        PenModeSwitch::Two => TWO_MODES,
        PenModeSwitch::Three => THREE_MODES,
    }
}

/// Template of a 1-based `mode`, if it exists for `modes`.
pub fn template(modes: PenModeSwitch, mode: u8) -> Option<(u32, u32)> {
    templates(modes).get(usize::from(mode).checked_sub(1)?).copied()
}

/// Completed cycles needed before a multi-mode decision can be final.
pub fn required_cycles(modes: PenModeSwitch) -> usize {
    match modes {
        PenModeSwitch::One => 0,
        PenModeSwitch::Two => 2,
        PenModeSwitch::Three => 4,
    }
}

/// Smallest on-duration distance between two templates, in frames.
fn template_spacing(modes: PenModeSwitch) -> f64 {
    let list = templates(modes);
    list.windows(2)
        .map(|pair| f64::from(pair[1].0.abs_diff(pair[0].0)))
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))))
        .unwrap_or(1.0)
        .max(1.0)
}

/// One observed on-phase and the off-phase that followed it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseCycle {
    pub on_frames: f64,
    pub off_frames: f64,
}

/// Current belief about the pen mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenModeHypothesis {
    /// Configured number of modes.
    pub modes: u8,
    /// Best matching mode so far (1-based), 0 before any pen line was seen.
    pub best_mode: u8,
    /// Reported mode: equals `best_mode` once final, 0 while provisional.
    pub mode: u8,
    /// Decode error in `[0, 1]`.
    pub error: f64,
    pub is_final: bool,
    /// Pulse cycles scored in the current decode attempt.
    pub cycles: usize,
}

impl PenModeHypothesis {
    fn unknown(modes: PenModeSwitch) -> Self {
        Self {
            modes: modes.into(),
            best_mode: 0,
            mode: 0,
            error: 1.0,
            is_final: false,
            cycles: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct DecodeAttempt {
    residual_sums: Vec<f64>,
    cycles: usize,
    latched: Option<PenModeHypothesis>,
}

impl DecodeAttempt {
    fn new(modes: PenModeSwitch) -> Self {
        Self {
            residual_sums: vec![0.0; modes.count()],
            cycles: 0,
            latched: None,
        }
    }
}

/// Engine-wide decoder for the one pen being tracked.
#[derive(Debug, Clone)]
pub struct PenModeDecoder {
    modes: PenModeSwitch,
    attempt: Option<DecodeAttempt>,
    active_line: Option<LineId>,
    last_pen_activity: Option<f64>,
}

impl PenModeDecoder {
    pub fn new(modes: PenModeSwitch) -> Self {
        Self {
            modes,
            attempt: None,
            active_line: None,
            last_pen_activity: None,
        }
    }

    pub fn modes(&self) -> PenModeSwitch {
        self.modes
    }

    /// Registers a line that has just been classified as pen.
    ///
    /// Returns `true` when this started a fresh decode attempt.
    pub fn begin_pen_line(
        &mut self,
        line: LineId,
        line_start: f64,
        settings: &Settings,
    ) -> bool {
        if self.active_line == Some(line) {
            return false;
        }
        self.active_line = Some(line);
        let fresh = match (self.attempt.as_ref(), self.last_pen_activity) {
            (Some(_), Some(last)) => line_start - last > settings.time_between_same_lines,
            _ => true,
        };
        if fresh {
            debug!("Pen line {line} starts a new pen-mode decode");
            self.attempt = Some(DecodeAttempt::new(self.modes));
        } else {
            debug!("Pen line {line} continues the current pen-mode decode");
        }
        fresh
    }

    /// Notes that a pen line produced a point at `timestamp`.
    pub fn note_pen_activity(&mut self, timestamp: f64) {
        self.last_pen_activity = Some(
            self.last_pen_activity
                .map_or(timestamp, |last| last.max(timestamp)),
        );
    }

    /// Scores one completed cycle of the active pen line.
    pub fn feed(&mut self, cycle: PulseCycle, settings: &Settings) {
        let modes = self.modes;
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        if attempt.latched.is_some() {
            return;
        }
        attempt.cycles += 1;
        if modes != PenModeSwitch::One {
            let spacing = template_spacing(modes);
            for (sum, &(on, off)) in attempt.residual_sums.iter_mut().zip(templates(modes)) {
                let distance = (cycle.on_frames - f64::from(on)).abs()
                    + (cycle.off_frames - f64::from(off)).abs();
                *sum += distance / spacing;
            }
        }
        debug!(
            "Pulse cycle on={:.2} off={:.2} frames ({} scored)",
            cycle.on_frames, cycle.off_frames, attempt.cycles
        );
        self.latch_if_final(settings);
    }

    /// Latches the hypothesis once the error is below the limit.
    pub fn latch_if_final(&mut self, settings: &Settings) {
        let current = self.hypothesis(settings);
        if let Some(attempt) = self.attempt.as_mut() {
            if attempt.latched.is_none() && current.is_final {
                info!(
                    "Pen mode {} of {} decided (error {:.3} after {} cycles)",
                    current.mode, current.modes, current.error, current.cycles
                );
                attempt.latched = Some(current);
            }
        }
    }

    /// The current hypothesis; final values stay fixed until a fresh attempt.
    pub fn hypothesis(&self, settings: &Settings) -> PenModeHypothesis {
        let Some(attempt) = self.attempt.as_ref() else {
            return PenModeHypothesis::unknown(self.modes);
        };
        if let Some(latched) = attempt.latched {
            return latched;
        }

        let (best_index, best_sum) = attempt
            .residual_sums
            .iter()
            .copied()
            .enumerate()
            .fold((0usize, f64::INFINITY), |best, (index, sum)| {
                if sum < best.1 { (index, sum) } else { best }
            });

        let mean = if self.modes == PenModeSwitch::One {
            0.0
        } else if attempt.cycles == 0 {
            1.0
        } else {
            best_sum / attempt.cycles as f64
        };
        let required = required_cycles(self.modes);
        let deficit = if attempt.cycles < required {
            (required - attempt.cycles) as f64 / required as f64
        } else {
            0.0
        };
        let error = (mean + deficit).clamp(0.0, 1.0);
        let is_final = error < settings.pen_mode_error_limit;
        let best_mode = (best_index + 1) as u8;

        PenModeHypothesis {
            modes: self.modes.into(),
            best_mode,
            mode: if is_final { best_mode } else { 0 },
            error,
            is_final,
            cycles: attempt.cycles,
        }
    }

    /// Forgets everything; used on clean-up and when the mode count changes.
    pub fn reset(&mut self, modes: PenModeSwitch) {
        *self = Self::new(modes);
    }
}
