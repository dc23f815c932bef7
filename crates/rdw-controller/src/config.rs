//! Redirection configuration.
//!
//! The defaults are tuned for a 3m × 3m physical square walked as a hexagon
//! with 3m sides. Every corner needs 30° of redirection (90° physical turn
//! against 60° virtual turn), split into a rotation budget spent while the
//! user turns in place and a curvature budget spent while walking.
//!
//! # Example
//!
//! ```rust
//! use rdw_controller::config::{RedirectionConfig, RedirectionPreset};
//!
//! let config = RedirectionConfig::from_preset(RedirectionPreset::Gentle)
//!     .with_transit_time(0.6);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Preset configurations for redirection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedirectionPreset {
    /// All three gains with the standard rates.
    #[default]
    Standard,
    /// Weaker rotation gain and slower blending; curvature picks up the lack.
    Gentle,
    /// Rotation and curvature gain only.
    WithoutTranslation,
}

impl RedirectionPreset {
    /// Rotation gain rate for this preset (real-to-virtual yaw multiplier).
    #[must_use]
    pub const fn rotation_gain_rate(&self) -> f32 {
        match self {
            Self::Standard | Self::WithoutTranslation => 0.78,
            Self::Gentle => 0.85,
        }
    }

    /// Transit duration between gain regimes (seconds).
    #[must_use]
    pub const fn transit_time_s(&self) -> f32 {
        match self {
            Self::Standard | Self::WithoutTranslation => 0.4,
            Self::Gentle => 0.8,
        }
    }
}

/// Which redirection techniques are applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainSet {
    /// Rotation gain while turning at corners.
    pub rotation: bool,
    /// Curvature gain while walking between corners.
    pub curvature: bool,
    /// Translation gain reconciling physical and virtual distances.
    pub translation: bool,
}

impl GainSet {
    /// Every gain enabled.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            rotation: true,
            curvature: true,
            translation: true,
        }
    }
}

impl Default for GainSet {
    fn default() -> Self {
        Self::all()
    }
}

/// Configuration for the redirection controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectionConfig {
    /// Enabled gains.
    pub gains: GainSet,
    /// Move the virtual world onto the way pointer when redirection arms.
    pub align_world_on_arming: bool,

    // Corner transit
    /// Distance to a physical corner at which the user counts as inside (m).
    pub corner_enter_m: f32,
    /// Distance to a physical corner at which the user counts as outside (m).
    pub corner_leave_m: f32,
    /// Distance to a virtual corner at which the virtual target advances (m).
    pub virtual_corner_m: f32,
    /// Time to blend between rotation and curvature regimes (s).
    pub transit_time_s: f32,

    // Budgets
    /// Rotation redirection expected per corner (degrees).
    pub rotation_budget_deg: f32,
    /// Curvature redirection expected per segment (degrees).
    pub curvature_budget_deg: f32,
    /// Fraction of a budget the first transition needs to count towards lack.
    pub lack_count_threshold: f32,

    // Rotation gain
    /// Real-to-virtual yaw multiplier; the world turns by `1 - rate` of each turn.
    pub rotation_gain_rate: f32,
    /// Minimum yaw speed counted as rotating (deg/s).
    pub rotation_threshold_deg_s: f32,

    // Curvature gain
    /// Length of each virtual path (m).
    pub path_length_m: f32,
    /// Arc radius used before the first corner transition (m).
    pub initial_radius_m: f32,
    /// Minimum planar speed counted as walking (m/s).
    pub movement_threshold_m_s: f32,

    // Counter-deviation
    /// Deviation from the arc at which the adjustment saturates (m).
    pub bias_threshold_m: f32,
    /// Saturated extra gain when outside the arc, as a fraction of the gain.
    pub outward_adjust_limit: f32,
    /// Saturated gain reduction when inside the arc, as a multiple of the gain.
    pub inward_adjust_limit: f32,

    // Translation gain
    /// Maximum translation up-scaling above 1.0.
    pub translation_up_limit: f32,
    /// Maximum translation down-scaling below 1.0.
    pub translation_down_limit: f32,
}

impl RedirectionConfig {
    /// Create configuration from a preset.
    #[must_use]
    pub fn from_preset(preset: RedirectionPreset) -> Self {
        let mut config = Self::default();
        config.rotation_gain_rate = preset.rotation_gain_rate();
        config.transit_time_s = preset.transit_time_s();

        if matches!(preset, RedirectionPreset::WithoutTranslation) {
            config.gains.translation = false;
        }

        config
    }

    /// Set the enabled gains.
    #[must_use]
    pub fn with_gains(mut self, gains: GainSet) -> Self {
        self.gains = gains;
        self
    }

    /// Set the corner hysteresis radii.
    #[must_use]
    pub fn with_corner_radii(mut self, enter_m: f32, leave_m: f32) -> Self {
        self.corner_enter_m = enter_m;
        self.corner_leave_m = leave_m;
        self
    }

    /// Set the blend duration between gain regimes.
    #[must_use]
    pub fn with_transit_time(mut self, seconds: f32) -> Self {
        self.transit_time_s = seconds;
        self
    }

    /// Check that the configuration describes a usable controller.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("corner_enter_m", self.corner_enter_m),
            ("corner_leave_m", self.corner_leave_m),
            ("virtual_corner_m", self.virtual_corner_m),
            ("transit_time_s", self.transit_time_s),
            ("rotation_gain_rate", self.rotation_gain_rate),
            ("path_length_m", self.path_length_m),
            ("initial_radius_m", self.initial_radius_m),
            ("bias_threshold_m", self.bias_threshold_m),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        let non_negative = [
            ("rotation_budget_deg", self.rotation_budget_deg),
            ("curvature_budget_deg", self.curvature_budget_deg),
            ("rotation_threshold_deg_s", self.rotation_threshold_deg_s),
            ("movement_threshold_m_s", self.movement_threshold_m_s),
            ("outward_adjust_limit", self.outward_adjust_limit),
            ("inward_adjust_limit", self.inward_adjust_limit),
            ("translation_up_limit", self.translation_up_limit),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.corner_enter_m >= self.corner_leave_m {
            return Err(ConfigError::InvalidHysteresis {
                enter_m: self.corner_enter_m,
                leave_m: self.corner_leave_m,
            });
        }

        let unit = [
            ("lack_count_threshold", self.lack_count_threshold),
            ("translation_down_limit", self.translation_down_limit),
        ];
        for (field, value) in unit {
            if !(0.0..1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }

        Ok(())
    }
}

impl Default for RedirectionConfig {
    fn default() -> Self {
        Self {
            gains: GainSet::all(),
            align_world_on_arming: true,
            corner_enter_m: 0.45,
            corner_leave_m: 0.5,
            virtual_corner_m: 0.4,
            transit_time_s: 0.4,
            rotation_budget_deg: 13.0,
            curvature_budget_deg: 17.0,
            lack_count_threshold: 0.4,
            rotation_gain_rate: 0.78,
            rotation_threshold_deg_s: 0.5,
            path_length_m: 3.0,
            initial_radius_m: 9.5,
            movement_threshold_m_s: 0.05,
            bias_threshold_m: 0.5,
            outward_adjust_limit: 0.4,
            inward_adjust_limit: 2.0,
            translation_up_limit: 0.2,
            translation_down_limit: 0.1,
        }
    }
}

/// Invalid configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The enter radius must be strictly smaller than the leave radius.
    #[error("corner enter radius {enter_m}m must be smaller than leave radius {leave_m}m")]
    InvalidHysteresis {
        /// Enter radius
        enter_m: f32,
        /// Leave radius
        leave_m: f32,
    },

    /// A value that must be strictly positive is not.
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f32,
    },

    /// A value that must be non-negative is not.
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f32,
    },

    /// A fraction outside `[0, 1)`.
    #[error("{field} must be in [0, 1), got {value}")]
    OutOfUnitRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RedirectionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_budgets_cover_corner() {
        let config = RedirectionConfig::default();
        // 90° physical turn against a 60° hexagon turn
        assert!((config.rotation_budget_deg + config.curvature_budget_deg - 30.0).abs() < 0.01);
    }

    #[test]
    fn test_presets() {
        let gentle = RedirectionConfig::from_preset(RedirectionPreset::Gentle);
        assert!((gentle.rotation_gain_rate - 0.85).abs() < 0.001);
        assert!((gentle.transit_time_s - 0.8).abs() < 0.001);
        assert!(gentle.gains.translation);

        let no_trans = RedirectionConfig::from_preset(RedirectionPreset::WithoutTranslation);
        assert!(!no_trans.gains.translation);
        assert!(no_trans.gains.rotation && no_trans.gains.curvature);
    }

    #[test]
    fn test_hysteresis_must_be_strict() {
        let config = RedirectionConfig::default().with_corner_radii(0.5, 0.5);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHysteresis { .. })));
    }

    #[test]
    fn test_rejects_zero_transit_time() {
        let config = RedirectionConfig::default().with_transit_time(0.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "transit_time_s",
                value: 0.0
            })
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RedirectionConfig =
            serde_json::from_str(r#"{ "corner_enter_m": 0.3, "gains": { "rotation": true, "curvature": true, "translation": false } }"#)
                .unwrap();
        assert!((config.corner_enter_m - 0.3).abs() < 1e-6);
        assert!((config.corner_leave_m - 0.5).abs() < 1e-6);
        assert!(!config.gains.translation);
    }
}
