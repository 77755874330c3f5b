//! Resolved engine settings.
//!
//! A [`TuningConfig`] is turned into [`Settings`] once, when it is applied.
//! The legacy toggle is resolved here into a [`MatchingProfile`] so the rest of
//! the engine never branches on the algorithm variant directly.

use crate::config::{AlgorithmVariant, PenModeSwitch, TuningConfig};

/// Nominal touch controller sampling interval (60 Hz).
pub const NOMINAL_SAMPLING_INTERVAL: f64 = 1.0 / 60.0;

/// A gap between two points of one line longer than this many sampling
/// intervals counts as an off-phase of the pen.
const PULSE_GAP_FRAMES: f64 = 1.5;

/// Timing and matching strategy for one algorithm variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingProfile {
    pub variant: AlgorithmVariant,
    pub sampling_interval: f64,
    /// A contact whose newest point is older than this is treated as lifted
    /// even without an ended event.
    pub stale_contact_window: f64,
    /// Whether lifted unknown lines may be continued by velocity gating alone.
    pub continue_unknown_lines: bool,
}

impl MatchingProfile {
    pub fn for_variant(variant: AlgorithmVariant) -> Self {
        match variant {
            AlgorithmVariant::Current => Self {
                variant,
                sampling_interval: NOMINAL_SAMPLING_INTERVAL,
                stale_contact_window: NOMINAL_SAMPLING_INTERVAL * 1.5,
                continue_unknown_lines: true,
            },
            AlgorithmVariant::Legacy => Self {
                variant,
                sampling_interval: NOMINAL_SAMPLING_INTERVAL,
                stale_contact_window: NOMINAL_SAMPLING_INTERVAL * 2.5,
                continue_unknown_lines: false,
            },
        }
    }

    pub fn pulse_gap(&self) -> f64 {
        self.sampling_interval * PULSE_GAP_FRAMES
    }
}

/// Thresholds used by the matcher, classifier and decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub minimum_speed: f64,
    pub speed_limit_factor: f64,
    pub required_confirmations: u32,
    pub max_off_time: f64,
    pub x_margin: f64,
    pub y_margin: f64,
    pub palm_major_radius: Option<f64>,
    pub pen_modes: PenModeSwitch,
    pub pen_mode_error_limit: f64,
    pub time_between_same_lines: f64,
    pub extrapolate: bool,
    pub profile: MatchingProfile,
}

impl Settings {
    pub fn resolve(tuning: &TuningConfig) -> Self {
        let profile = MatchingProfile::for_variant(tuning.algorithm);
        Self {
            minimum_speed: tuning.minimum_speed.max(0.0),
            speed_limit_factor: tuning.speed_limit_factor.max(1.0),
            required_confirmations: tuning.required_confirmations(),
            max_off_time: profile.sampling_interval * tuning.max_off_time_factor.max(1.0),
            x_margin: tuning.x_margin_for_hit_testing.max(0.0),
            y_margin: tuning.y_margin_for_hit_testing.max(0.0),
            palm_major_radius: tuning.palm_major_radius,
            pen_modes: tuning.pen_modes(),
            pen_mode_error_limit: tuning.pen_mode_error_limit,
            time_between_same_lines: tuning.time_between_same_lines.max(0.0),
            extrapolate: tuning.extrapolate,
            profile,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(&TuningConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_off_time_scales_sampling_interval() {
        let mut tuning = TuningConfig::default();
        tuning.max_off_time_factor = 6.5;
        let settings = Settings::resolve(&tuning);
        assert!((settings.max_off_time - 6.5 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn legacy_variant_disables_unknown_continuation() {
        let mut tuning = TuningConfig::default();
        tuning.algorithm = AlgorithmVariant::Legacy;
        let settings = Settings::resolve(&tuning);
        assert!(!settings.profile.continue_unknown_lines);
        let current = Settings::default().profile;
        assert!(settings.profile.stale_contact_window > current.stale_contact_window);
    }
}
