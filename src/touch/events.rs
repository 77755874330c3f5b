//! Raw touch input as delivered by the platform.

use crate::error::Error;
use crate::util::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle phase shared by every touch in one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    Began,
    Moved,
    Ended,
    Cancelled,
}

impl TouchPhase {
    /// True for phases that end the platform contact.
    pub fn is_terminal(self) -> bool {
        matches!(self, TouchPhase::Ended | TouchPhase::Cancelled)
    }
}

impl fmt::Display for TouchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TouchPhase::Began => "began",
            TouchPhase::Moved => "moved",
            TouchPhase::Ended => "ended",
            TouchPhase::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

impl FromStr for TouchPhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "began" | "begin" => Ok(TouchPhase::Began),
            "moved" | "changed" | "move" => Ok(TouchPhase::Moved),
            "ended" | "end" => Ok(TouchPhase::Ended),
            "cancelled" | "canceled" | "cancel" => Ok(TouchPhase::Cancelled),
            other => Err(Error::InvalidPhase(other.to_string())),
        }
    }
}

/// Platform-assigned identifier of one physical contact.
///
/// Opaque and stable for the lifetime of the contact; the platform may reuse
/// it once the contact has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TouchId(pub u64);

impl fmt::Display for TouchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// One contact inside a [`TouchBatch`], in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTouch {
    pub id: TouchId,
    pub location: Point,
    /// Contact size reported by the controller, if any.
    pub major_radius: Option<f64>,
}

impl RawTouch {
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id: TouchId(id),
            location: Point::new(x, y),
            major_radius: None,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.major_radius = Some(radius);
        self
    }
}

/// All touches the platform delivered for one phase of one sampling frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchBatch {
    pub phase: TouchPhase,
    /// Monotonic timestamp in seconds.
    pub timestamp: f64,
    pub touches: Vec<RawTouch>,
}

impl TouchBatch {
    pub fn new(phase: TouchPhase, timestamp: f64, touches: Vec<RawTouch>) -> Self {
        Self {
            phase,
            timestamp,
            touches,
        }
    }
}
