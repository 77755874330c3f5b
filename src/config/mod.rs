//! Configuration file support for pulsetouch.
//!
//! This module handles loading and validating tuning values from the
//! configuration file located at `~/.config/pulsetouch/config.toml`. Settings
//! cover the classifier thresholds, hit-testing margins, pen-mode decoding and
//! the replay tool.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod enums;
pub mod types;

// Re-export commonly used types at module level
pub use enums::{AlgorithmVariant, PenModeSwitch};
pub use types::{ReplayConfig, TuningConfig};

use anyhow::{Context, Result};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure containing all user settings.
///
/// # Example TOML
/// ```toml
/// [tuning]
/// minimum_speed = 150.0
/// speed_limit_factor = 5.0
/// sensitivity = 4.0
/// pen_mode_switch = 2
///
/// [replay]
/// delivery = "push"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Classifier and decoder tuning
    #[serde(default)]
    pub tuning: TuningConfig,

    /// Replay tool preferences
    #[serde(default)]
    pub replay: ReplayConfig,
}

impl Config {
    /// Validates and clamps all configuration values to acceptable ranges.
    ///
    /// Invalid values are clamped to the nearest valid value and a warning is
    /// logged. Non-finite values fall back to the default.
    pub fn validate_and_clamp(&mut self) {
        let defaults = TuningConfig::default();
        let tuning = &mut self.tuning;

        clamp_field(
            "minimum_speed",
            &mut tuning.minimum_speed,
            10.0,
            5000.0,
            defaults.minimum_speed,
        );
        clamp_field(
            "speed_limit_factor",
            &mut tuning.speed_limit_factor,
            1.0,
            50.0,
            defaults.speed_limit_factor,
        );
        clamp_field(
            "pen_mode_error_limit",
            &mut tuning.pen_mode_error_limit,
            0.01,
            1.0,
            defaults.pen_mode_error_limit,
        );
        clamp_field(
            "sensitivity",
            &mut tuning.sensitivity,
            1.0,
            20.0,
            defaults.sensitivity,
        );
        clamp_field(
            "max_off_time_factor",
            &mut tuning.max_off_time_factor,
            1.0,
            20.0,
            defaults.max_off_time_factor,
        );
        clamp_field(
            "x_margin_for_hit_testing",
            &mut tuning.x_margin_for_hit_testing,
            0.0,
            500.0,
            defaults.x_margin_for_hit_testing,
        );
        clamp_field(
            "y_margin_for_hit_testing",
            &mut tuning.y_margin_for_hit_testing,
            0.0,
            500.0,
            defaults.y_margin_for_hit_testing,
        );
        clamp_field(
            "time_between_same_lines",
            &mut tuning.time_between_same_lines,
            0.05,
            5.0,
            defaults.time_between_same_lines,
        );
        if let Some(radius) = tuning.palm_major_radius.as_mut() {
            clamp_field("palm_major_radius", radius, 1.0, 500.0, 40.0);
        }

        if !(1..=3).contains(&tuning.pen_mode_switch) {
            log::warn!(
                "Invalid pen_mode_switch {}, clamping to 1-3 range",
                tuning.pen_mode_switch
            );
            tuning.pen_mode_switch = tuning.pen_mode_switch.clamp(1, 3);
        }

        if !matches!(
            self.replay.delivery.to_lowercase().as_str(),
            "pull" | "push"
        ) {
            log::warn!(
                "Invalid replay delivery '{}', falling back to 'pull'",
                self.replay.delivery
            );
            self.replay.delivery = "pull".to_string();
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// The config file is located at `~/.config/pulsetouch/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("pulsetouch");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from the default location, or returns defaults if not found.
    ///
    /// # Errors
    /// Returns an error if the config path cannot be determined or the file
    /// exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Loads configuration from `config_path`, or returns defaults if the file is missing.
    ///
    /// All loaded values are validated and clamped to acceptable ranges.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        // Validate and clamp values to acceptable ranges
        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Saves the current configuration to `config_path`.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, config_str)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Writes the documented example config to `config_path`.
    ///
    /// # Errors
    /// Returns an error if a config file already exists at the target path or
    /// the file cannot be written.
    pub fn create_default_file(config_path: &Path) -> Result<()> {
        if config_path.exists() {
            return Err(anyhow::anyhow!(
                "Config file already exists at {}",
                config_path.display()
            ));
        }

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let default_config = include_str!("../../config.example.toml");
        fs::write(config_path, default_config)?;

        info!("Created default config at {}", config_path.display());
        Ok(())
    }

    /// JSON schema describing the configuration file.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}

fn clamp_field(name: &str, value: &mut f64, min: f64, max: f64, fallback: f64) {
    if !value.is_finite() {
        log::warn!("Invalid {name} {value}, using {fallback}");
        *value = fallback;
    } else if !(min..=max).contains(value) {
        log::warn!("Invalid {name} {value:.3}, clamping to {min}-{max} range");
        *value = value.clamp(min, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.tuning.minimum_speed, 150.0);
        assert_eq!(config.tuning.speed_limit_factor, 5.0);
        assert_eq!(config.tuning.pen_mode_error_limit, 0.15);
        assert_eq!(config.tuning.sensitivity, 4.0);
        assert_eq!(config.tuning.max_off_time_factor, 2.5);
        assert_eq!(config.tuning.time_between_same_lines, 0.4);
        assert_eq!(config.tuning.pen_modes(), PenModeSwitch::Two);
        assert!(!config.tuning.fail_on_finger_touch);
        assert_eq!(config.replay.delivery, "pull");
    }

    #[test]
    fn validate_clamps_out_of_range_values() {
        let mut config = Config::default();
        config.tuning.minimum_speed = 1.0;
        config.tuning.sensitivity = 100.0;
        config.tuning.pen_mode_switch = 7;
        config.tuning.max_off_time_factor = f64::NAN;
        config.tuning.palm_major_radius = Some(0.0);
        config.replay.delivery = "sideways".to_string();

        config.validate_and_clamp();

        assert_eq!(config.tuning.minimum_speed, 10.0);
        assert_eq!(config.tuning.sensitivity, 20.0);
        assert_eq!(config.tuning.pen_mode_switch, 3);
        assert_eq!(config.tuning.max_off_time_factor, 2.5);
        assert_eq!(config.tuning.palm_major_radius, Some(1.0));
        assert_eq!(config.replay.delivery, "pull");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tuning]
            minimum_speed = 500.0
            algorithm = "legacy"
            "#,
        )
        .unwrap();
        assert_eq!(config.tuning.minimum_speed, 500.0);
        assert_eq!(config.tuning.speed_limit_factor, 5.0);
        assert_eq!(config.tuning.algorithm, AlgorithmVariant::Legacy);
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config::load_from(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config.tuning, TuningConfig::default());
    }

    #[test]
    fn save_then_load_preserves_tuning() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.tuning.sensitivity = 6.0;
        config.tuning.pen_mode_switch = 3;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.tuning.sensitivity, 6.0);
        assert_eq!(loaded.tuning.pen_modes(), PenModeSwitch::Three);
    }

    #[test]
    fn example_config_parses() {
        let config: Config = toml::from_str(include_str!("../../config.example.toml")).unwrap();
        assert_eq!(config.tuning, TuningConfig::default());
    }

    #[test]
    fn create_default_file_refuses_to_overwrite() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        Config::create_default_file(&path).unwrap();
        assert!(Config::create_default_file(&path).is_err());
    }

    #[test]
    fn required_confirmations_rounds_up() {
        let mut tuning = TuningConfig::default();
        tuning.sensitivity = 4.2;
        assert_eq!(tuning.required_confirmations(), 5);
        tuning.sensitivity = 0.3;
        assert_eq!(tuning.required_confirmations(), 1);
    }
}
