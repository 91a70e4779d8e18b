//! Game settings
//!
//! Read from an optional JSON file; every field falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::selection::Viewport;

/// How real elapsed time is turned into physics steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// Fixed-size steps from an accumulator, capped per frame
    #[default]
    Fixed,
    /// One step the length of the elapsed frame time
    WallClock,
}

impl StepMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepMode::Fixed => "fixed",
            StepMode::WallClock => "wall_clock",
        }
    }
}

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Window size in pixels
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Vertical field of view in degrees
    pub field_of_view: f32,

    // === Simulation ===
    pub step_mode: StepMode,
    /// Fixed steps per second
    pub step_rate: f32,
    /// Maximum physics steps per frame
    pub max_substeps: u32,
    /// Seed for block shape templates
    pub seed: u64,
    /// Blocks in a fresh tower
    pub block_count: usize,

    // === HUD ===
    /// Show the help bar at startup
    pub help_visible: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            viewport_width: 640.0,
            viewport_height: 480.0,
            field_of_view: 45.0,

            step_mode: StepMode::Fixed,
            step_rate: 1.0 / SIM_DT,
            max_substeps: MAX_SUBSTEPS,
            seed: 0x5EED,
            block_count: BLOCK_COUNT,

            help_visible: true,
        }
    }
}

impl Settings {
    /// Parse and validate settings from JSON text
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Load settings, logging and falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.viewport_width > 0.0 && self.viewport_height > 0.0) {
            return Err(SettingsError::Invalid {
                field: "viewport",
                reason: "width and height must be positive",
            });
        }
        if !(self.field_of_view > 0.0 && self.field_of_view < 180.0) {
            return Err(SettingsError::Invalid {
                field: "field_of_view",
                reason: "must be between 0 and 180 degrees",
            });
        }
        if !(self.step_rate > 0.0) {
            return Err(SettingsError::Invalid {
                field: "step_rate",
                reason: "must be positive",
            });
        }
        if self.max_substeps == 0 {
            return Err(SettingsError::Invalid {
                field: "max_substeps",
                reason: "must be at least 1",
            });
        }
        if self.block_count < BLOCKS_PER_LAYER {
            return Err(SettingsError::Invalid {
                field: "block_count",
                reason: "need at least one full layer",
            });
        }
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport_width, self.viewport_height)
    }

    /// Length of one fixed physics step
    pub fn step_dt(&self) -> f32 {
        1.0 / self.step_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert!((settings.step_dt() - SIM_DT).abs() < 1e-6);
        assert_eq!(settings.block_count, 54);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{ "seed": 7, "step_mode": "wall_clock" }"#).unwrap();
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.step_mode, StepMode::WallClock);
        assert_eq!(settings.viewport_width, 640.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Settings::from_json(r#"{ "max_substeps": 0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "max_substeps", .. }));
        assert!(matches!(
            Settings::from_json("not json"),
            Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Settings::load("/nonexistent/block-tower.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
        assert_eq!(
            Settings::load_or_default("/nonexistent/block-tower.json"),
            Settings::default()
        );
    }
}
