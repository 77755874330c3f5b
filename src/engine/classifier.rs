//! Velocity- and pulse-based contact classification.
//!
//! A line starts out [`Classification::Unknown`]. Each new point adds one
//! observation:
//! - a re-attached contact (a completed pulse cycle) votes pen, since fingers
//!   do not pulse
//! - a speed above the line's ceiling is an outlier and votes nothing, unless
//!   the line has no speeds yet (the first speed sets the line's level) or
//!   enough outliers arrived in a row to show the contact really is that fast
//! - a speed below the minimum speed votes finger
//! - any other speed votes pen
//!
//! Votes of one kind must be consecutive. When a streak reaches the number of
//! confirmations derived from the sensitivity, the line is settled. A line
//! that has pulsed is never settled as finger.

use super::line::LineState;
use super::settings::Settings;
use crate::touch::Classification;
use log::debug;

/// One piece of evidence delivered with a new point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Speed against the previous point of the line; `None` for the first point.
    pub speed: Option<f64>,
    /// The point re-attached the line after an off-phase.
    pub pulse: bool,
}

/// Upper speed bound for the next point of `line`.
pub fn speed_ceiling(line: &LineState, settings: &Settings) -> f64 {
    settings.speed_limit_factor * line.speeds.average().max(settings.minimum_speed)
}

/// Applies `observation` to `line`; returns the classification if it was settled by it.
pub fn observe(
    line: &mut LineState,
    observation: Observation,
    settings: &Settings,
) -> Option<Classification> {
    let ceiling = speed_ceiling(line, settings);
    let outlier_limit = settings.required_confirmations.max(2);
    let accepted_speed = observation.speed.filter(|speed| {
        speed.is_finite()
            && (line.speeds.is_empty()
                || *speed <= ceiling
                || line.evidence.outlier_run + 1 >= outlier_limit)
    });

    match (observation.speed, accepted_speed) {
        (Some(speed), None) => {
            line.evidence.outliers += 1;
            line.evidence.outlier_run += 1;
            debug!(
                "Line {}: speed {:.0} px/s above ceiling {:.0} px/s ignored",
                line.id, speed, ceiling
            );
        }
        (_, Some(speed)) => {
            line.evidence.outlier_run = 0;
            line.speeds.push(speed);
        }
        (None, None) => {}
    }

    if line.classification != Classification::Unknown {
        return None;
    }

    let evidence = &mut line.evidence;
    if observation.pulse {
        evidence.pulse_cycles += 1;
        evidence.pen_streak += 1;
        evidence.finger_streak = 0;
    } else if let Some(speed) = accepted_speed {
        if speed < settings.minimum_speed {
            evidence.finger_streak += 1;
            evidence.pen_streak = 0;
        } else {
            evidence.pen_streak += 1;
            evidence.finger_streak = 0;
        }
    }

    let required = settings.required_confirmations;
    let decided = if evidence.pen_streak >= required || evidence.pulse_cycles >= required {
        Some(Classification::Pen)
    } else if evidence.finger_streak >= required && evidence.pulse_cycles == 0 {
        Some(Classification::Finger)
    } else {
        None
    };

    if let Some(class) = decided {
        debug!(
            "Line {} classified {class} (pen streak {}, finger streak {}, pulses {})",
            line.id, evidence.pen_streak, evidence.finger_streak, evidence.pulse_cycles
        );
        line.classification = class;
    }
    decided
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::registry::LineRegistry;
    use crate::touch::{LineId, NormalizedSample, TouchId, TouchPhase};
    use crate::util::Point;

    fn unknown_line() -> (LineRegistry, LineId) {
        let mut registry = LineRegistry::new();
        let id = registry.open_line(
            &NormalizedSample {
                id: TouchId(1),
                point: Point::new(0.0, 0.0),
                timestamp: 0.0,
                phase: TouchPhase::Began,
                major_radius: None,
            },
            Classification::Unknown,
        );
        (registry, id)
    }

    fn speed(value: f64) -> Observation {
        Observation {
            speed: Some(value),
            pulse: false,
        }
    }

    #[test]
    fn fast_consistent_samples_settle_pen() {
        let (mut registry, id) = unknown_line();
        let settings = Settings::default();
        let line = registry.get_mut(id).unwrap();
        for _ in 0..3 {
            assert_eq!(observe(line, speed(300.0), &settings), None);
        }
        assert_eq!(
            observe(line, speed(300.0), &settings),
            Some(Classification::Pen)
        );
        assert_eq!(line.classification, Classification::Pen);
    }

    #[test]
    fn slow_samples_settle_finger() {
        let (mut registry, id) = unknown_line();
        let settings = Settings::default();
        let line = registry.get_mut(id).unwrap();
        let mut decided = None;
        for _ in 0..4 {
            decided = observe(line, speed(40.0), &settings);
        }
        assert_eq!(decided, Some(Classification::Finger));
    }

    #[test]
    fn mixed_votes_reset_streaks() {
        let (mut registry, id) = unknown_line();
        let settings = Settings::default();
        let line = registry.get_mut(id).unwrap();
        for index in 0..12 {
            let value = if index % 2 == 0 { 40.0 } else { 300.0 };
            assert_eq!(observe(line, speed(value), &settings), None);
        }
        assert_eq!(line.classification, Classification::Unknown);
    }

    #[test]
    fn outliers_do_not_vote_or_average() {
        let (mut registry, id) = unknown_line();
        let settings = Settings::default();
        let line = registry.get_mut(id).unwrap();
        observe(line, speed(200.0), &settings);
        observe(line, speed(50_000.0), &settings);
        assert_eq!(line.evidence.outliers, 1);
        assert_eq!(line.evidence.pen_streak, 1);
        assert_eq!(line.speeds.len(), 1);
        assert!((speed_ceiling(line, &settings) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn first_speed_sets_the_level_of_a_fast_line() {
        let (mut registry, id) = unknown_line();
        let settings = Settings::default();
        let line = registry.get_mut(id).unwrap();
        let mut decided = None;
        for _ in 0..4 {
            decided = observe(line, speed(1000.0), &settings);
        }
        assert_eq!(decided, Some(Classification::Pen));
        assert_eq!(line.evidence.outliers, 0);
        assert!((speed_ceiling(line, &settings) - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn sustained_outliers_raise_the_ceiling() {
        let (mut registry, id) = unknown_line();
        let settings = Settings::default();
        let line = registry.get_mut(id).unwrap();
        observe(line, speed(200.0), &settings);
        for _ in 0..3 {
            observe(line, speed(2000.0), &settings);
        }
        assert_eq!(line.evidence.outliers, 3);
        assert_eq!(line.speeds.len(), 1);

        observe(line, speed(2000.0), &settings);
        assert_eq!(line.evidence.outlier_run, 0);
        assert_eq!(line.speeds.len(), 2);
        assert!((speed_ceiling(line, &settings) - 5500.0).abs() < 1e-9);
        observe(line, speed(2000.0), &settings);
        assert_eq!(line.evidence.outliers, 3);
    }

    #[test]
    fn infinite_speed_is_always_an_outlier() {
        let (mut registry, id) = unknown_line();
        let settings = Settings::default();
        let line = registry.get_mut(id).unwrap();
        observe(line, speed(f64::INFINITY), &settings);
        assert!(line.speeds.is_empty());
        assert_eq!(line.evidence.outliers, 1);
    }

    #[test]
    fn pulsing_line_is_never_finger() {
        let (mut registry, id) = unknown_line();
        let settings = Settings::default();
        let line = registry.get_mut(id).unwrap();
        observe(
            line,
            Observation {
                speed: Some(30.0),
                pulse: true,
            },
            &settings,
        );
        for _ in 0..3 {
            assert_eq!(observe(line, speed(30.0), &settings), None);
        }
        assert_eq!(observe(line, speed(30.0), &settings), None);
        assert_eq!(line.classification, Classification::Unknown);
    }

    #[test]
    fn definite_lines_keep_their_class() {
        let (mut registry, id) = unknown_line();
        let settings = Settings::default();
        let line = registry.get_mut(id).unwrap();
        line.classification = Classification::Finger;
        for _ in 0..8 {
            assert_eq!(observe(line, speed(400.0), &settings), None);
        }
        assert_eq!(line.classification, Classification::Finger);
    }
}
