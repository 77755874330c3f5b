//! Configuration type definitions.

use super::enums::{AlgorithmVariant, PenModeSwitch};
use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Classification and pen-mode tuning.
///
/// Every field has a default that works for handwriting with a two-mode pen.
/// Values can be replaced at any time through
/// [`PulsedTouchCore::set_config`](crate::engine::PulsedTouchCore::set_config);
/// they take effect from the next processed batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TuningConfig {
    /// Lower limit of the pen velocity in px/s (valid range: 10 - 5000)
    /// Around 150 suits writing; sketching may need 500 or more
    #[serde(default = "default_minimum_speed")]
    pub minimum_speed: f64,

    /// Multiple of the averaged pen velocity used as the speed limit for the next
    /// point (valid range: 1.0 - 50.0)
    #[serde(default = "default_speed_limit_factor")]
    pub speed_limit_factor: f64,

    /// Decode error below which the pen mode becomes final (valid range: 0.01 - 1.0)
    #[serde(default = "default_pen_mode_error_limit")]
    pub pen_mode_error_limit: f64,

    /// Confirming observations needed before a line is classified (valid range: 1.0 - 20.0)
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,

    /// Number of sampling intervals a line may go unseen before it is closed
    /// (valid range: 1.0 - 20.0). 2.5 is enough at low load, up to 6.5 when
    /// ended events get dropped
    #[serde(default = "default_max_off_time_factor")]
    pub max_off_time_factor: f64,

    /// Horizontal hit-testing margin around the latest pen point in px (valid range: 0 - 500)
    #[serde(default = "default_hit_margin")]
    pub x_margin_for_hit_testing: f64,

    /// Vertical hit-testing margin around the latest pen point in px (valid range: 0 - 500)
    #[serde(default = "default_hit_margin")]
    pub y_margin_for_hit_testing: f64,

    /// Pen lines closer together than this (seconds) share one pen-mode decode
    /// (valid range: 0.05 - 5.0)
    #[serde(default = "default_time_between_same_lines")]
    pub time_between_same_lines: f64,

    /// Number of pen modes: 1, 2 or 3
    #[serde(default = "default_pen_mode_switch")]
    pub pen_mode_switch: u8,

    /// Report finger contacts as a gesture failure instead of as lines
    #[serde(default)]
    pub fail_on_finger_touch: bool,

    /// Matching algorithm family
    #[serde(default)]
    pub algorithm: AlgorithmVariant,

    /// Contacts with a major radius above this (px) start as palm (valid range: 1 - 500)
    #[serde(default)]
    pub palm_major_radius: Option<f64>,

    /// Attach a predicted tip point to each increment of an open line
    #[serde(default = "default_extrapolate")]
    pub extrapolate: bool,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            minimum_speed: default_minimum_speed(),
            speed_limit_factor: default_speed_limit_factor(),
            pen_mode_error_limit: default_pen_mode_error_limit(),
            sensitivity: default_sensitivity(),
            max_off_time_factor: default_max_off_time_factor(),
            x_margin_for_hit_testing: default_hit_margin(),
            y_margin_for_hit_testing: default_hit_margin(),
            time_between_same_lines: default_time_between_same_lines(),
            pen_mode_switch: default_pen_mode_switch(),
            fail_on_finger_touch: false,
            algorithm: AlgorithmVariant::default(),
            palm_major_radius: None,
            extrapolate: default_extrapolate(),
        }
    }
}

impl TuningConfig {
    /// Typed pen mode count, falling back to two modes for out-of-range values.
    pub fn pen_modes(&self) -> PenModeSwitch {
        PenModeSwitch::try_from(self.pen_mode_switch).unwrap_or_else(|err| {
            warn!("{err}; using 2");
            PenModeSwitch::Two
        })
    }

    /// Number of consecutive confirmations needed to settle a classification.
    pub fn required_confirmations(&self) -> u32 {
        if self.sensitivity.is_finite() {
            self.sensitivity.ceil().max(1.0) as u32
        } else {
            1
        }
    }
}

/// Settings for the `replay` command.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReplayConfig {
    /// Deliver increments through the pull accessor ("pull") or the delegate ("push")
    #[serde(default = "default_delivery")]
    pub delivery: String,

    /// Print the final pen-mode hypothesis after the trace
    #[serde(default = "default_report_pen_mode")]
    pub report_pen_mode: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            delivery: default_delivery(),
            report_pen_mode: default_report_pen_mode(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_minimum_speed() -> f64 {
    150.0
}

fn default_speed_limit_factor() -> f64 {
    5.0
}

fn default_pen_mode_error_limit() -> f64 {
    0.15
}

fn default_sensitivity() -> f64 {
    4.0
}

fn default_max_off_time_factor() -> f64 {
    2.5
}

fn default_hit_margin() -> f64 {
    40.0
}

fn default_time_between_same_lines() -> f64 {
    0.4
}

fn default_pen_mode_switch() -> u8 {
    2
}

fn default_extrapolate() -> bool {
    true
}

fn default_delivery() -> String {
    "pull".to_string()
}

fn default_report_pen_mode() -> bool {
    true
}
