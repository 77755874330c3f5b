//! Classified touch points, the unit of output.

use super::classification::Classification;
use super::events::{TouchId, TouchPhase};
use crate::util::{Point, Vector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a line, assigned on creation and stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u64);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// A touch sample after normalization, affiliation and classification.
///
/// `velocity` is measured against the previous point of the same line and is
/// zero for the first point of a line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub point: Point,
    pub timestamp: f64,
    pub identifier: TouchId,
    pub velocity: Vector,
    pub line_id: LineId,
    pub classification: Classification,
    pub phase: TouchPhase,
}
