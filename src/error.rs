//! Error types for the fallible edges of the crate.
//!
//! The classification core itself never fails: uncertain input is modelled as
//! data (unknown classification, provisional pen mode). Errors only arise when
//! raw configuration values or replay traces are converted into typed values.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised when converting raw values into typed configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("pen mode switch must be 1, 2 or 3 (got {0})")]
    InvalidPenModeSwitch(u8),

    #[error("pen mode {mode} does not exist with {modes} mode(s)")]
    InvalidPenMode { mode: u8, modes: u8 },

    #[error("invalid touch phase '{0}' (expected began, moved, ended or cancelled)")]
    InvalidPhase(String),
}

/// Errors that can occur while loading a replay trace.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Failed to read trace {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML trace: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON trace: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported trace format '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),

    #[error("Trace frame {index} goes back in time ({t} < {previous})")]
    NonMonotonic { index: usize, t: f64, previous: f64 },
}
