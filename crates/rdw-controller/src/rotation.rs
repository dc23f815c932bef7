//! Rotation gain.
//!
//! While the user turns at a corner the world turns along with them by a
//! fraction of every head rotation, so the virtual turn comes out smaller
//! than the physical one.

use rdw_core::types::is_valid_delta;

use crate::config::RedirectionConfig;

/// Whether the yaw change this tick counts as turning.
#[must_use]
pub fn is_rotating(config: &RedirectionConfig, delta_yaw_deg: f32, dt: f32) -> bool {
    is_valid_delta(dt) && (delta_yaw_deg / dt).abs() >= config.rotation_threshold_deg_s
}

/// World yaw in degrees for a head yaw change of `delta_yaw_deg`.
///
/// Scaled by `blend`, so nothing is applied in the curvature regime.
#[must_use]
pub fn rotation_gain_deg(config: &RedirectionConfig, delta_yaw_deg: f32, blend: f32) -> f32 {
    (1.0 - config.rotation_gain_rate) * delta_yaw_deg * blend
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_gain_fraction() {
        let config = RedirectionConfig::default();
        let delta = rotation_gain_deg(&config, 10.0, 1.0);
        assert!((delta - 2.2).abs() < 1e-5);
        assert!((rotation_gain_deg(&config, -10.0, 0.5) + 1.1).abs() < 1e-5);
        assert!(rotation_gain_deg(&config, 10.0, 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_threshold() {
        let config = RedirectionConfig::default();
        let dt = 1.0 / 90.0;
        // 0.5 deg/s at 90 Hz
        assert!(is_rotating(&config, 0.5 / 90.0 + 1e-4, dt));
        assert!(!is_rotating(&config, 0.001, dt));
        assert!(is_rotating(&config, -1.0, dt));
        assert!(!is_rotating(&config, 1.0, 0.0));
        assert!(!is_rotating(&config, 1.0, f32::NAN));
    }
}
