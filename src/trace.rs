//! Recorded touch traces for replay.
//!
//! A trace is a list of frames, each one [`TouchBatch`] in serialized form:
//!
//! ```toml
//! [[frames]]
//! phase = "began"
//! t = 0.0
//! touches = [{ id = 1, x = 100.0, y = 100.0 }]
//! ```
//!
//! Traces are read from `.toml` or `.json` files and must be time ordered.

use crate::error::TraceError;
use crate::touch::{RawTouch, TouchBatch, TouchId, TouchPhase};
use crate::util::Point;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub frames: Vec<TraceFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    /// Phase name; platform spellings such as `changed` or `canceled` are accepted.
    #[serde(deserialize_with = "phase_from_name")]
    pub phase: TouchPhase,
    /// Timestamp in seconds.
    pub t: f64,
    #[serde(default)]
    pub touches: Vec<TraceTouch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceTouch {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

fn phase_from_name<'de, D>(deserializer: D) -> Result<TouchPhase, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

impl Trace {
    /// Loads a trace, picking the parser from the file extension.
    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let contents = std::fs::read_to_string(path).map_err(|source| TraceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let trace = match extension.as_str() {
            "toml" => Self::from_toml_str(&contents)?,
            "json" => Self::from_json_str(&contents)?,
            other => return Err(TraceError::UnsupportedFormat(other.to_string())),
        };
        log::info!(
            "Loaded trace {} ({} frames)",
            path.display(),
            trace.frames.len()
        );
        Ok(trace)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, TraceError> {
        let trace: Trace = toml::from_str(contents)?;
        trace.validate()?;
        Ok(trace)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, TraceError> {
        let trace: Trace = serde_json::from_str(contents)?;
        trace.validate()?;
        Ok(trace)
    }

    /// Rejects traces whose timestamps decrease.
    pub fn validate(&self) -> Result<(), TraceError> {
        for (index, pair) in self.frames.windows(2).enumerate() {
            if pair[1].t < pair[0].t {
                return Err(TraceError::NonMonotonic {
                    index: index + 1,
                    t: pair[1].t,
                    previous: pair[0].t,
                });
            }
        }
        Ok(())
    }

    pub fn from_batches(batches: &[TouchBatch]) -> Self {
        let frames = batches
            .iter()
            .map(|batch| TraceFrame {
                phase: batch.phase,
                t: batch.timestamp,
                touches: batch
                    .touches
                    .iter()
                    .map(|touch| TraceTouch {
                        id: touch.id.0,
                        x: touch.location.x,
                        y: touch.location.y,
                        radius: touch.major_radius,
                    })
                    .collect(),
            })
            .collect();
        Self { frames }
    }

    pub fn batches(&self) -> Vec<TouchBatch> {
        self.frames
            .iter()
            .map(|frame| TouchBatch {
                phase: frame.phase,
                timestamp: frame.t,
                touches: frame
                    .touches
                    .iter()
                    .map(|touch| RawTouch {
                        id: TouchId(touch.id),
                        location: Point::new(touch.x, touch.y),
                        major_radius: touch.radius,
                    })
                    .collect(),
            })
            .collect()
    }

    /// Timestamp of the last frame.
    pub fn end_time(&self) -> Option<f64> {
        self.frames.last().map(|frame| frame.t)
    }
}
