//! The set of open lines and the contact-to-line mapping.

use super::line::{Evidence, LineState, PulseAccumulator, SpeedStats};
use crate::touch::{Classification, LineId, NormalizedSample, TouchId, TouchPoint};
use crate::util::Vector;
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Open lines keyed by [`LineId`], plus the platform identifier of each live contact.
#[derive(Debug, Default, Clone)]
pub struct LineRegistry {
    lines: BTreeMap<LineId, LineState>,
    contacts: HashMap<TouchId, LineId>,
    next_id: u64,
    update_seq: u64,
}

impl LineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a line whose first point is `sample` and binds the sample's contact to it.
    pub fn open_line(
        &mut self,
        sample: &NormalizedSample,
        classification: Classification,
    ) -> LineId {
        self.next_id += 1;
        let id = LineId(self.next_id);
        let seq = self.bump();
        let first = TouchPoint {
            point: sample.point,
            timestamp: sample.timestamp,
            identifier: sample.id,
            velocity: Vector::ZERO,
            line_id: id,
            classification,
            phase: sample.phase,
        };
        self.lines.insert(
            id,
            LineState {
                id,
                classification,
                contact: None,
                lifted: false,
                first_timestamp: sample.timestamp,
                last_point: first,
                point_count: 1,
                updated_seq: seq,
                speeds: SpeedStats::default(),
                evidence: Evidence::default(),
                pulses: PulseAccumulator::new(sample.timestamp),
            },
        );
        self.bind_contact(sample.id, id);
        debug!(
            "Opened line {id} ({classification}) for contact {} at ({:.1}, {:.1})",
            sample.id, sample.point.x, sample.point.y
        );
        id
    }

    /// Records `point` as the newest point of its line.
    pub fn record_point(&mut self, point: TouchPoint) {
        let seq = self.bump();
        if let Some(line) = self.lines.get_mut(&point.line_id) {
            line.last_point = point;
            line.point_count += 1;
            line.updated_seq = seq;
        }
    }

    /// Attaches `contact` to `line`, detaching whatever contact fed it before.
    pub fn bind_contact(&mut self, contact: TouchId, line: LineId) {
        if let Some(previous) = self.contacts.insert(contact, line) {
            if previous != line {
                if let Some(old) = self.lines.get_mut(&previous) {
                    if old.contact == Some(contact) {
                        old.contact = None;
                    }
                }
            }
        }
        if let Some(state) = self.lines.get_mut(&line) {
            if let Some(stale) = state.contact.replace(contact) {
                if stale != contact {
                    self.contacts.remove(&stale);
                }
            }
            state.lifted = false;
        }
    }

    /// Forgets the mapping of `contact`. Returns the line it was feeding.
    pub fn release_contact(&mut self, contact: TouchId) -> Option<LineId> {
        let line = self.contacts.remove(&contact)?;
        if let Some(state) = self.lines.get_mut(&line) {
            if state.contact == Some(contact) {
                state.contact = None;
            }
        }
        Some(line)
    }

    pub fn line_for_contact(&self, contact: TouchId) -> Option<LineId> {
        self.contacts.get(&contact).copied()
    }

    pub fn get(&self, id: LineId) -> Option<&LineState> {
        self.lines.get(&id)
    }

    pub fn get_mut(&mut self, id: LineId) -> Option<&mut LineState> {
        self.lines.get_mut(&id)
    }

    pub fn lines(&self) -> impl Iterator<Item = &LineState> {
        self.lines.values()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Removes a line and its contact mapping.
    pub fn close(&mut self, id: LineId) -> Option<LineState> {
        let state = self.lines.remove(&id)?;
        if let Some(contact) = state.contact {
            if self.contacts.get(&contact) == Some(&id) {
                self.contacts.remove(&contact);
            }
        }
        debug!(
            "Closed line {id} ({}, {} points)",
            state.classification, state.point_count
        );
        Some(state)
    }

    /// Closes every line that has gone unseen for longer than `max_off_time` at `now`.
    pub fn expire(&mut self, now: f64, max_off_time: f64) -> Vec<LineState> {
        let expired: Vec<LineId> = self
            .lines
            .values()
            .filter(|line| now - line.last_timestamp() > max_off_time)
            .map(|line| line.id)
            .collect();
        expired.into_iter().filter_map(|id| self.close(id)).collect()
    }

    /// Discards all lines and restarts line numbering.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn bump(&mut self) -> u64 {
        self.update_seq += 1;
        self.update_seq
    }
}
