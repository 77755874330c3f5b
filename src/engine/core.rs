//! The classification core shared by both adapters.

use super::assembler::{LineIncrements, OutputAssembler};
use super::classifier::{self, Observation};
use super::line::LineState;
use super::matching::{self, MatchDecision};
use super::pulse::{PenModeDecoder, PenModeHypothesis, PulseCycle};
use super::registry::LineRegistry;
use super::settings::Settings;
use crate::config::TuningConfig;
use crate::touch::{
    Classification, LineId, NormalizedSample, TouchBatch, TouchNormalizer, TouchPhase, TouchPoint,
    ViewTransform,
};
use crate::util::{speed_between, velocity_between};
use log::{debug, info};

/// What one processed batch changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Points appended to lines.
    pub appended: usize,
    pub new_lines: Vec<LineId>,
    /// Lines whose classification became definite, in decision order.
    pub classified: Vec<(LineId, Classification)>,
    pub closed: Vec<LineId>,
    pub pen_mode_changed: bool,
}

impl BatchOutcome {
    pub fn finger_detected(&self) -> bool {
        self.classified
            .iter()
            .any(|(_, class)| *class == Classification::Finger)
    }

    /// Folds a later outcome into this one.
    pub fn merge(&mut self, other: BatchOutcome) {
        self.appended += other.appended;
        self.new_lines.extend(other.new_lines);
        self.classified.extend(other.classified);
        self.closed.extend(other.closed);
        self.pen_mode_changed |= other.pen_mode_changed;
    }
}

/// Single-threaded, synchronous classification engine.
///
/// Feed it one [`TouchBatch`] per controller frame with [`process`](Self::process)
/// and collect results with [`drain`](Self::drain). Instances share nothing.
#[derive(Debug, Clone)]
pub struct PulsedTouchCore {
    config: TuningConfig,
    settings: Settings,
    config_dirty: bool,
    normalizer: TouchNormalizer,
    registry: LineRegistry,
    assembler: OutputAssembler,
    decoder: PenModeDecoder,
}

impl Default for PulsedTouchCore {
    fn default() -> Self {
        Self::new(TuningConfig::default())
    }
}

impl PulsedTouchCore {
    pub fn new(config: TuningConfig) -> Self {
        let settings = Settings::resolve(&config);
        let decoder = PenModeDecoder::new(settings.pen_modes);
        Self {
            config,
            settings,
            config_dirty: false,
            normalizer: TouchNormalizer::default(),
            registry: LineRegistry::new(),
            assembler: OutputAssembler::new(),
            decoder,
        }
    }

    /// Most recently set configuration (possibly not applied yet).
    pub fn config(&self) -> &TuningConfig {
        &self.config
    }

    /// Settings currently in effect.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replaces the configuration; it takes effect from the next batch.
    pub fn set_config(&mut self, config: TuningConfig) {
        self.config = config;
        self.config_dirty = true;
    }

    pub fn view(&self) -> ViewTransform {
        self.normalizer.view()
    }

    pub fn change_view(&mut self, view: ViewTransform) {
        self.normalizer.change_view(view);
    }

    /// Processes one batch to completion.
    pub fn process(&mut self, batch: &TouchBatch) -> BatchOutcome {
        self.apply_pending_config();
        let before = self.pen_mode();
        let mut outcome = self.expire(batch.timestamp);

        for sample in self.normalizer.normalize(batch) {
            self.process_sample(&sample, &mut outcome);
        }

        outcome.pen_mode_changed |= self.pen_mode() != before;
        outcome
    }

    /// Closes lines that timed out at `timestamp` without a new batch arriving.
    pub fn advance_to(&mut self, timestamp: f64) -> BatchOutcome {
        self.apply_pending_config();
        self.expire(timestamp)
    }

    /// Takes every increment accumulated since the previous drain.
    pub fn drain(&mut self) -> LineIncrements {
        let mut increments = self.assembler.drain();
        let hypothesis = self.pen_mode();
        for increment in increments.values_mut() {
            if increment.classification == Classification::Pen {
                increment.pen_mode = Some(hypothesis);
            }
            increment.extrapolated = self
                .registry
                .get(increment.line_id)
                .and_then(|line| self.extrapolate(line));
        }
        increments
    }

    pub fn has_pending(&self) -> bool {
        self.assembler.has_pending()
    }

    pub fn pen_mode(&self) -> PenModeHypothesis {
        self.decoder.hypothesis(&self.settings)
    }

    pub fn line(&self, id: LineId) -> Option<&LineState> {
        self.registry.get(id)
    }

    pub fn lines(&self) -> impl Iterator<Item = &LineState> {
        self.registry.lines()
    }

    /// True while any line is fed by a contact that has not ended.
    pub fn has_active_contacts(&self) -> bool {
        self.registry
            .lines()
            .any(|line| line.contact.is_some() && !line.lifted)
    }

    /// Discards all lines, buffered increments and pen-mode evidence.
    pub fn clean_up(&mut self) {
        self.registry.clear();
        self.assembler.clear();
        self.decoder.reset(self.settings.pen_modes);
        debug!("Classification state cleaned up");
    }

    fn apply_pending_config(&mut self) {
        if !self.config_dirty {
            return;
        }
        self.config_dirty = false;
        let settings = Settings::resolve(&self.config);
        if settings.pen_modes != self.decoder.modes() {
            info!(
                "Pen mode count changed to {}; restarting pen-mode decoding",
                settings.pen_modes.count()
            );
            self.decoder.reset(settings.pen_modes);
        }
        self.settings = settings;
    }

    fn expire(&mut self, now: f64) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for line in self.registry.expire(now, self.settings.max_off_time) {
            debug!("Line {} timed out", line.id);
            self.assembler.mark_closed(line.id);
            outcome.closed.push(line.id);
        }
        outcome
    }

    fn process_sample(&mut self, sample: &NormalizedSample, outcome: &mut BatchOutcome) {
        if sample.phase == TouchPhase::Began {
            if let Some(previous) = self.registry.release_contact(sample.id) {
                debug!("Contact {} restarted; detached from line {previous}", sample.id);
            }
        }

        match matching::match_sample(sample, &self.registry, &self.settings) {
            MatchDecision::Ignore => {
                debug!("Ignoring {} for untracked contact {}", sample.phase, sample.id);
            }
            MatchDecision::NewLine(class) => {
                let id = self.registry.open_line(sample, class);
                if let Some(line) = self.registry.get(id) {
                    self.assembler.push(line.last_point);
                }
                outcome.new_lines.push(id);
                outcome.appended += 1;
                if class.is_definite() {
                    outcome.classified.push((id, class));
                }
            }
            MatchDecision::Extend(id) => match sample.phase {
                TouchPhase::Cancelled => self.close(id, outcome),
                TouchPhase::Ended => self.lift(id, sample, outcome),
                TouchPhase::Began | TouchPhase::Moved => self.append(id, sample, false, outcome),
            },
            MatchDecision::Continue { line, speed } => {
                debug!(
                    "Contact {} continues line {line} at {speed:.0} px/s",
                    sample.id
                );
                self.registry.bind_contact(sample.id, line);
                self.append(line, sample, true, outcome);
            }
        }
    }

    fn close(&mut self, id: LineId, outcome: &mut BatchOutcome) {
        if self.registry.close(id).is_some() {
            self.assembler.mark_closed(id);
            outcome.closed.push(id);
        }
    }

    fn lift(&mut self, id: LineId, sample: &NormalizedSample, outcome: &mut BatchOutcome) {
        let Some(class) = self.registry.get(id).map(|line| line.classification) else {
            return;
        };
        if matches!(class, Classification::Finger | Classification::Palm) {
            self.close(id, outcome);
            return;
        }
        if let Some(line) = self.registry.get_mut(id) {
            line.lifted = true;
        }
        self.registry.release_contact(sample.id);
    }

    fn append(
        &mut self,
        id: LineId,
        sample: &NormalizedSample,
        reattached: bool,
        outcome: &mut BatchOutcome,
    ) {
        let interval = self.settings.profile.sampling_interval;
        let pulse_gap = self.settings.profile.pulse_gap();
        let Some(line) = self.registry.get_mut(id) else {
            return;
        };
        let last = line.last_point;
        if sample.timestamp <= last.timestamp {
            debug!(
                "Dropping out-of-order sample for line {id} at {:.4}s",
                sample.timestamp
            );
            return;
        }

        let velocity =
            velocity_between(last.point, last.timestamp, sample.point, sample.timestamp);
        let speed = speed_between(last.point, last.timestamp, sample.point, sample.timestamp);
        let pulsed = reattached && sample.timestamp - last.timestamp > pulse_gap;
        let cycle: Option<PulseCycle> = if pulsed {
            Some(line.pulses.complete_cycle(sample.timestamp, interval))
        } else {
            line.pulses.extend_run(sample.timestamp);
            None
        };
        let decided = classifier::observe(
            line,
            Observation {
                speed: Some(speed),
                pulse: cycle.is_some(),
            },
            &self.settings,
        );
        if let Some(cycle) = cycle {
            if line.classification == Classification::Pen && decided.is_none() {
                self.decoder.feed(cycle, &self.settings);
            } else {
                line.pulses.defer(cycle);
            }
        }

        let point = TouchPoint {
            point: sample.point,
            timestamp: sample.timestamp,
            identifier: sample.id,
            velocity,
            line_id: id,
            classification: line.classification,
            phase: sample.phase,
        };
        self.registry.record_point(point);
        self.assembler.push(point);
        outcome.appended += 1;

        if let Some(class) = decided {
            self.on_classified(id, class, sample.timestamp, outcome);
        }
        if point.classification == Classification::Pen {
            self.decoder.note_pen_activity(sample.timestamp);
        }
    }

    fn on_classified(
        &mut self,
        id: LineId,
        class: Classification,
        now: f64,
        outcome: &mut BatchOutcome,
    ) {
        self.assembler.reclassify(id, class);
        outcome.classified.push((id, class));
        if class != Classification::Pen {
            return;
        }

        let Some(line) = self.registry.get_mut(id) else {
            return;
        };
        let backlog = line.pulses.take_backlog();
        let first_timestamp = line.first_timestamp;
        let rect = matching::hit_rect(line, &self.settings);

        self.decoder.begin_pen_line(id, first_timestamp, &self.settings);
        for cycle in backlog {
            self.decoder.feed(cycle, &self.settings);
        }
        self.decoder.latch_if_final(&self.settings);

        let stale = self.settings.profile.stale_contact_window;
        let palms: Vec<LineId> = self
            .registry
            .lines()
            .filter(|other| other.id != id && other.classification == Classification::Unknown)
            .filter(|other| other.is_touching(now, stale) && rect.contains(other.last_point.point))
            .map(|other| other.id)
            .collect();
        for palm in palms {
            if let Some(other) = self.registry.get_mut(palm) {
                other.classification = Classification::Palm;
                debug!("Line {palm} touches near pen line {id}; classified palm");
            }
            self.assembler.reclassify(palm, Classification::Palm);
            outcome.classified.push((palm, Classification::Palm));
        }
    }

    fn extrapolate(&self, line: &LineState) -> Option<TouchPoint> {
        if !self.settings.extrapolate {
            return None;
        }
        let classification = line.classification.extrapolated()?;
        let interval = self.settings.profile.sampling_interval;
        let last = line.last_point;
        Some(TouchPoint {
            point: last.point.offset(last.velocity, interval),
            timestamp: last.timestamp + interval,
            classification,
            ..last
        })
    }
}
