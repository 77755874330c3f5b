//! Affiliation of incoming samples to open lines.
//!
//! [`match_sample`] is a pure function of the registry and the sample; the
//! engine applies the returned [`MatchDecision`]. Order of the rules:
//!
//! 1. a moved/ended/cancelled sample whose identifier maps to an open line
//!    extends it (began samples never do: a known identifier that begins again
//!    is a restart)
//! 2. ended/cancelled samples for unknown identifiers carry nothing and are
//!    ignored; moved samples for unknown identifiers are treated as began
//! 3. a contact larger than the palm radius starts a palm line
//! 4. a lifted line still inside its off-time window may be continued by the
//!    new contact (pen lines only from inside their hit-test rect, unknown
//!    lines by speed alone when the profile allows it); the most recently
//!    updated candidate wins
//! 5. a contact inside the rect of a recent pen line starts a palm line
//! 6. anything else starts an unknown line

use super::classifier::speed_ceiling;
use super::line::LineState;
use super::registry::LineRegistry;
use super::settings::Settings;
use crate::touch::{Classification, LineId, NormalizedSample, TouchPhase};
use crate::util::{Rect, speed_between};

/// What to do with one normalized sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchDecision {
    /// Same contact as the line's current one.
    Extend(LineId),
    /// A new contact re-attaching a lifted line after an off-phase.
    Continue { line: LineId, speed: f64 },
    /// Start a new line with the given classification.
    NewLine(Classification),
    /// Nothing to attribute (terminal phase for an unknown contact).
    Ignore,
}

/// Hit-test rect around the newest point of `line`.
pub fn hit_rect(line: &LineState, settings: &Settings) -> Rect {
    Rect::around(line.last_point.point, settings.x_margin, settings.y_margin)
}

pub fn match_sample(
    sample: &NormalizedSample,
    registry: &LineRegistry,
    settings: &Settings,
) -> MatchDecision {
    if sample.phase != TouchPhase::Began {
        if let Some(line) = registry.line_for_contact(sample.id) {
            if registry.get(line).is_some() {
                return MatchDecision::Extend(line);
            }
        }
    }
    if sample.phase.is_terminal() {
        return MatchDecision::Ignore;
    }

    if let (Some(radius), Some(limit)) = (sample.major_radius, settings.palm_major_radius) {
        if radius >= limit {
            return MatchDecision::NewLine(Classification::Palm);
        }
    }

    if let Some((line, speed)) = continuation_candidate(sample, registry, settings) {
        return MatchDecision::Continue { line, speed };
    }

    let near_pen = registry.lines().any(|line| {
        line.classification == Classification::Pen
            && sample.timestamp - line.last_timestamp() <= settings.max_off_time
            && hit_rect(line, settings).contains(sample.point)
    });
    if near_pen {
        MatchDecision::NewLine(Classification::Palm)
    } else {
        MatchDecision::NewLine(Classification::Unknown)
    }
}

fn continuation_candidate(
    sample: &NormalizedSample,
    registry: &LineRegistry,
    settings: &Settings,
) -> Option<(LineId, f64)> {
    let now = sample.timestamp;
    let profile = &settings.profile;

    registry
        .lines()
        .filter(|line| line.accepts_continuation())
        .filter(|line| !line.is_touching(now, profile.stale_contact_window))
        .filter(|line| {
            let elapsed = now - line.last_timestamp();
            elapsed > 0.0 && elapsed <= settings.max_off_time
        })
        .filter(|line| match line.classification {
            Classification::Pen => hit_rect(line, settings).contains(sample.point),
            _ => profile.continue_unknown_lines,
        })
        .filter_map(|line| {
            let last = line.last_point;
            let speed = speed_between(last.point, last.timestamp, sample.point, now);
            (speed <= speed_ceiling(line, settings)).then_some((line, speed))
        })
        .max_by(|(a, _), (b, _)| {
            a.last_timestamp()
                .total_cmp(&b.last_timestamp())
                .then(a.updated_seq.cmp(&b.updated_seq))
        })
        .map(|(line, speed)| (line.id, speed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlgorithmVariant, TuningConfig};
    use crate::touch::TouchId;
    use crate::util::Point;

    const DT: f64 = 1.0 / 60.0;

    fn sample(id: u64, phase: TouchPhase, x: f64, y: f64, t: f64) -> NormalizedSample {
        NormalizedSample {
            id: TouchId(id),
            point: Point::new(x, y),
            timestamp: t,
            phase,
            major_radius: None,
        }
    }

    fn lifted_line(registry: &mut LineRegistry, id: u64, x: f64, class: Classification) -> LineId {
        let line = registry.open_line(&sample(id, TouchPhase::Began, x, 0.0, 0.0), class);
        registry.release_contact(TouchId(id));
        registry.get_mut(line).unwrap().lifted = true;
        line
    }

    #[test]
    fn known_contact_extends_its_line() {
        let mut registry = LineRegistry::new();
        let began = sample(4, TouchPhase::Began, 0.0, 0.0, 0.0);
        let line = registry.open_line(&began, Classification::Unknown);
        let settings = Settings::default();
        assert_eq!(
            match_sample(&sample(4, TouchPhase::Moved, 500.0, 0.0, DT), &registry, &settings),
            MatchDecision::Extend(line)
        );
        assert_eq!(
            match_sample(&sample(4, TouchPhase::Ended, 500.0, 0.0, DT), &registry, &settings),
            MatchDecision::Extend(line)
        );
    }

    #[test]
    fn terminal_phase_for_unknown_contact_is_ignored() {
        let registry = LineRegistry::new();
        let settings = Settings::default();
        assert_eq!(
            match_sample(&sample(9, TouchPhase::Ended, 0.0, 0.0, 0.0), &registry, &settings),
            MatchDecision::Ignore
        );
        assert_eq!(
            match_sample(&sample(9, TouchPhase::Moved, 0.0, 0.0, 0.0), &registry, &settings),
            MatchDecision::NewLine(Classification::Unknown)
        );
    }

    #[test]
    fn lifted_pen_line_is_continued_inside_its_rect() {
        let mut registry = LineRegistry::new();
        let line = lifted_line(&mut registry, 1, 100.0, Classification::Pen);
        let settings = Settings::default();
        let contact = sample(2, TouchPhase::Began, 110.0, 0.0, 2.0 * DT);
        let decision = match_sample(&contact, &registry, &settings);
        match decision {
            MatchDecision::Continue { line: matched, speed } => {
                assert_eq!(matched, line);
                assert!((speed - 300.0).abs() < 1e-6);
            }
            other => panic!("expected continuation, got {other:?}"),
        }
    }

    #[test]
    fn contact_near_touching_pen_becomes_palm() {
        let mut registry = LineRegistry::new();
        registry.open_line(&sample(1, TouchPhase::Began, 100.0, 0.0, 0.0), Classification::Pen);
        let settings = Settings::default();
        assert_eq!(
            match_sample(&sample(2, TouchPhase::Began, 120.0, 10.0, DT), &registry, &settings),
            MatchDecision::NewLine(Classification::Palm)
        );
        assert_eq!(
            match_sample(&sample(3, TouchPhase::Began, 400.0, 0.0, DT), &registry, &settings),
            MatchDecision::NewLine(Classification::Unknown)
        );
    }

    #[test]
    fn finger_lines_never_reattach() {
        let mut registry = LineRegistry::new();
        lifted_line(&mut registry, 1, 100.0, Classification::Finger);
        let settings = Settings::default();
        assert_eq!(
            match_sample(&sample(2, TouchPhase::Began, 101.0, 0.0, DT), &registry, &settings),
            MatchDecision::NewLine(Classification::Unknown)
        );
    }

    #[test]
    fn too_fast_or_too_late_contacts_start_new_lines() {
        let mut registry = LineRegistry::new();
        lifted_line(&mut registry, 1, 0.0, Classification::Unknown);
        let settings = Settings::default();
        assert!(matches!(
            match_sample(&sample(2, TouchPhase::Began, 20.0, 0.0, 2.0 * DT), &registry, &settings),
            MatchDecision::Continue { .. }
        ));
        // 600 px in two frames is far above the 750 px/s ceiling.
        assert_eq!(
            match_sample(&sample(2, TouchPhase::Began, 600.0, 0.0, 2.0 * DT), &registry, &settings),
            MatchDecision::NewLine(Classification::Unknown)
        );
        assert_eq!(
            match_sample(&sample(2, TouchPhase::Began, 1.0, 0.0, 10.0 * DT), &registry, &settings),
            MatchDecision::NewLine(Classification::Unknown)
        );
    }

    #[test]
    fn legacy_profile_does_not_continue_unknown_lines() {
        let mut registry = LineRegistry::new();
        lifted_line(&mut registry, 1, 0.0, Classification::Unknown);
        let mut tuning = TuningConfig::default();
        tuning.algorithm = AlgorithmVariant::Legacy;
        let legacy = Settings::resolve(&tuning);
        let contact = sample(2, TouchPhase::Began, 5.0, 0.0, 2.0 * DT);
        assert_eq!(
            match_sample(&contact, &registry, &legacy),
            MatchDecision::NewLine(Classification::Unknown)
        );
        assert!(matches!(
            match_sample(&contact, &registry, &Settings::default()),
            MatchDecision::Continue { .. }
        ));
    }

    #[test]
    fn most_recent_candidate_wins() {
        let mut registry = LineRegistry::new();
        let older = lifted_line(&mut registry, 1, 0.0, Classification::Unknown);
        let began = sample(2, TouchPhase::Began, 4.0, 0.0, DT * 0.5);
        let newer = registry.open_line(&began, Classification::Unknown);
        registry.release_contact(TouchId(2));
        let settings = Settings::default();
        let contact = sample(3, TouchPhase::Began, 2.0, 0.0, 2.0 * DT);
        let decision = match_sample(&contact, &registry, &settings);
        assert!(matches!(
            decision,
            MatchDecision::Continue { line, .. } if line == newer && line != older
        ));
    }

    #[test]
    fn large_contact_is_palm() {
        let registry = LineRegistry::new();
        let mut tuning = TuningConfig::default();
        tuning.palm_major_radius = Some(30.0);
        let settings = Settings::resolve(&tuning);
        let mut contact = sample(1, TouchPhase::Began, 0.0, 0.0, 0.0);
        contact.major_radius = Some(42.0);
        assert_eq!(
            match_sample(&contact, &registry, &settings),
            MatchDecision::NewLine(Classification::Palm)
        );
    }
}
