//! Buffering of classified points into per-line increments.
//!
//! Points are stamped with the classification their line had when they were
//! observed and are never rewritten afterwards, so the concatenation of all
//! increments of a line does not depend on how often the caller drains.

use super::pulse::PenModeHypothesis;
use crate::touch::{Classification, LineId, TouchPoint};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// New points of one line since the previous delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineIncrement {
    pub line_id: LineId,
    /// Classification of the line at delivery time.
    pub classification: Classification,
    /// Ordered, never empty.
    pub touches: Vec<TouchPoint>,
    /// The line closed before this delivery; no further increments follow.
    ///
    /// Only set when points were still pending at closure. A line that closes
    /// after all its points were delivered gets no extra increment; its
    /// closure shows up in [`BatchOutcome::closed`](crate::engine::BatchOutcome)
    /// and [`LinesChanged::lines_closed`](crate::adapter::LinesChanged::lines_closed).
    pub closed: bool,
    /// First delivery for this line.
    pub first: bool,
    /// Pen-mode hypothesis at delivery time, for pen lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pen_mode: Option<PenModeHypothesis>,
    /// Predicted next position of an open line. Not part of `touches`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extrapolated: Option<TouchPoint>,
}

impl LineIncrement {
    pub fn len(&self) -> usize {
        self.touches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touches.is_empty()
    }

    pub fn last(&self) -> Option<&TouchPoint> {
        self.touches.last()
    }
}

/// Pending increments keyed by line, in line order.
pub type LineIncrements = BTreeMap<LineId, LineIncrement>;

#[derive(Debug, Clone)]
struct PendingLine {
    classification: Classification,
    touches: Vec<TouchPoint>,
    closed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OutputAssembler {
    pending: BTreeMap<LineId, PendingLine>,
    /// Open lines that already had a delivery.
    delivered: BTreeSet<LineId>,
}

impl OutputAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: TouchPoint) {
        let entry = self
            .pending
            .entry(point.line_id)
            .or_insert_with(|| PendingLine {
                classification: point.classification,
                touches: Vec::new(),
                closed: false,
            });
        entry.classification = point.classification;
        entry.touches.push(point);
    }

    /// Updates the classification reported for a line's pending increment.
    pub fn reclassify(&mut self, line: LineId, classification: Classification) {
        if let Some(entry) = self.pending.get_mut(&line) {
            entry.classification = classification;
        }
    }

    /// Flags the pending increment of `line` as its last one.
    pub fn mark_closed(&mut self, line: LineId) {
        match self.pending.get_mut(&line) {
            Some(entry) => entry.closed = true,
            None => {
                self.delivered.remove(&line);
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Takes every pending increment.
    pub fn drain(&mut self) -> LineIncrements {
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .map(|(line_id, entry)| {
                let first = if entry.closed {
                    !self.delivered.remove(&line_id)
                } else {
                    self.delivered.insert(line_id)
                };
                let increment = LineIncrement {
                    line_id,
                    classification: entry.classification,
                    touches: entry.touches,
                    closed: entry.closed,
                    first,
                    pen_mode: None,
                    extrapolated: None,
                };
                (line_id, increment)
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.delivered.clear();
    }
}
