//! Curvature gain and counter-deviation.
//!
//! While the user walks a physically straight segment, the world is turned a
//! little every frame so the user steers onto a circular arc. The arc is
//! sized so that its chord between two physical corners spans one virtual
//! path and its tangent turns by the curvature budget plus any lack carried
//! over from earlier corners.
//!
//! ```text
//!              turning center
//!                   ×
//!                  /|\
//!         radius  / | \  radius
//!                /  |  \
//!     corner i  ●───┼───●  corner i+1      chord = path length
//!                 ╲_____╱                  arc walked by the user
//! ```

use tracing::warn;

use rdw_core::geometry::{planar_direction, rotate_yaw, EPSILON};
use rdw_core::loops::PhysicalLoop;
use rdw_core::types::{is_valid_delta, Vec3};

use crate::config::RedirectionConfig;

/// Half the tangent turn over one segment, in degrees.
#[must_use]
pub fn starting_angle_deg(config: &RedirectionConfig, lack_deg: f32) -> f32 {
    (lack_deg + config.curvature_budget_deg) / 2.0
}

/// Arc radius whose chord spans one path at the given lack.
///
/// `None` when the starting angle gives a non-positive sine (a lack so
/// negative that no curvature is wanted) or the result is not finite.
#[must_use]
pub fn curvature_radius(config: &RedirectionConfig, lack_deg: f32) -> Option<f32> {
    let sin = libm::sinf(starting_angle_deg(config, lack_deg).to_radians());
    if sin <= EPSILON {
        return None;
    }
    let radius = (config.path_length_m * 0.5) / sin;
    radius.is_finite().then_some(radius)
}

/// Offset from `corner` to the center of the arc leaving it.
///
/// The center direction is the outgoing segment yawed by
/// `-(90° - starting_angle)`, scaled to `radius`.
#[must_use]
pub fn turning_center_offset(
    physical: &PhysicalLoop,
    corner: usize,
    starting_angle_deg: f32,
    radius: f32,
) -> Option<Vec3> {
    let next = physical.segment(corner);
    let towards_center = rotate_yaw(&next, -(90.0 - starting_angle_deg));
    planar_direction(&towards_center).map(|dir| dir * radius)
}

/// Whether planar head movement this tick counts as walking.
#[must_use]
pub fn is_moving(config: &RedirectionConfig, step_m: f32, dt: f32) -> bool {
    is_valid_delta(dt) && step_m / dt > config.movement_threshold_m_s
}

/// Raw curvature correction in degrees for a step of `step_m` meters.
///
/// Scaled by `1 - blend` so it fades out while the user is at a corner.
#[must_use]
pub fn curvature_gain_deg(step_m: f32, radius: f32, blend: f32) -> f32 {
    if !(radius > EPSILON) {
        return 0.0;
    }
    (step_m / radius).to_degrees() * (1.0 - blend)
}

/// Adjustment to a curvature gain that pulls the user back onto the arc.
///
/// `diff` is the distance to the turning center minus the radius. Outside
/// the arc the gain grows by up to `outward_adjust_limit × gain`; inside it
/// shrinks by up to `inward_adjust_limit × gain`. Between `±bias_threshold_m`
/// the adjustment is linear in `diff`.
#[must_use]
pub fn counter_deviation(config: &RedirectionConfig, diff: f32, gain: f32) -> f32 {
    let threshold = config.bias_threshold_m;
    let ratio = diff / threshold;
    if diff > 0.0 {
        let max_adjust = config.outward_adjust_limit * gain;
        if diff < threshold {
            max_adjust * ratio
        } else {
            max_adjust
        }
    } else {
        let max_adjust = -config.inward_adjust_limit * gain;
        if diff > -threshold {
            -ratio * max_adjust
        } else {
            max_adjust
        }
    }
}

/// Recompute the arc for a segment leaving `corner`.
///
/// Keeps `previous_radius` (with a warning) when the lack makes the radius
/// degenerate.
#[must_use]
pub fn plan_arc(
    config: &RedirectionConfig,
    physical: &PhysicalLoop,
    corner: usize,
    lack_deg: f32,
    previous_radius: f32,
) -> ArcPlan {
    let radius = curvature_radius(config, lack_deg).unwrap_or_else(|| {
        warn!(lack_deg, previous_radius, "Degenerate curvature radius, keeping previous arc");
        previous_radius
    });
    let angle = starting_angle_deg(config, lack_deg);
    let relative = turning_center_offset(physical, corner, angle, radius).unwrap_or_else(|| {
        warn!(corner, "Zero-length segment, turning center placed on the corner");
        Vec3::zeros()
    });
    ArcPlan {
        radius,
        relative,
        center: physical.corner(corner) + relative,
    }
}

/// Arc geometry for one segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcPlan {
    /// Arc radius (m).
    pub radius: f32,
    /// Center relative to the corner the arc starts from.
    pub relative: Vec3,
    /// Center in tracking space.
    pub center: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdw_core::geometry::planar_distance;

    #[test]
    fn test_radius_without_lack() {
        let config = RedirectionConfig::default();
        // (3 / 2) / sin(8.5°)
        let expected = 1.5 / 8.5_f32.to_radians().sin();
        let radius = curvature_radius(&config, 0.0).unwrap();
        assert!((radius - expected).abs() < 1e-3);
        assert!((radius - 10.148).abs() < 0.01);
    }

    #[test]
    fn test_radius_with_lack() {
        let config = RedirectionConfig::default();
        // (3 / 2) / sin(11°)
        let expected = 1.5 / 11.0_f32.to_radians().sin();
        let radius = curvature_radius(&config, 5.0).unwrap();
        assert!((radius - expected).abs() < 1e-3);
        assert!((radius - 7.861).abs() < 0.01);
    }

    #[test]
    fn test_radius_degenerate_for_large_negative_lack() {
        let config = RedirectionConfig::default();
        assert!(curvature_radius(&config, -17.0).is_none());
        assert!(curvature_radius(&config, -30.0).is_none());
    }

    #[test]
    fn test_counter_deviation_saturates() {
        let config = RedirectionConfig::default();
        let gain = 0.2;
        assert!((counter_deviation(&config, 3.0, gain) - 0.4 * gain).abs() < 1e-6);
        assert!((counter_deviation(&config, -3.0, gain) + 2.0 * gain).abs() < 1e-6);
        // Exactly at the threshold the bound applies
        assert!((counter_deviation(&config, 0.5, gain) - 0.4 * gain).abs() < 1e-6);
        assert!((counter_deviation(&config, -0.5, gain) + 2.0 * gain).abs() < 1e-6);
    }

    #[test]
    fn test_counter_deviation_linear_at_half_threshold() {
        let config = RedirectionConfig::default();
        let gain = 0.2;
        assert!((counter_deviation(&config, 0.25, gain) - 0.2 * gain).abs() < 1e-6);
        assert!((counter_deviation(&config, -0.25, gain) + 1.0 * gain).abs() < 1e-6);
        assert!(counter_deviation(&config, 0.0, gain).abs() < 1e-6);
    }

    #[test]
    fn test_curvature_gain_fades_with_blend() {
        let radius = 10.0;
        let full = curvature_gain_deg(0.01, radius, 0.0);
        assert!((full - 0.001_f32.to_degrees()).abs() < 1e-6);
        assert!((curvature_gain_deg(0.01, radius, 0.5) - full * 0.5).abs() < 1e-6);
        assert!(curvature_gain_deg(0.01, radius, 1.0).abs() < 1e-9);
        assert!(curvature_gain_deg(0.01, 0.0, 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_arc_passes_through_both_corners() {
        let config = RedirectionConfig::default();
        let physical = PhysicalLoop::square(Vec3::zeros(), 3.0);
        let arc = plan_arc(&config, &physical, 0, 0.0, config.initial_radius_m);

        let d0 = planar_distance(&arc.center, &physical.corner(0));
        let d1 = planar_distance(&arc.center, &physical.corner(1));
        assert!((d0 - arc.radius).abs() < 1e-3);
        assert!((d1 - arc.radius).abs() < 1e-3);
    }

    #[test]
    fn test_plan_arc_keeps_previous_radius_when_degenerate() {
        let config = RedirectionConfig::default();
        let physical = PhysicalLoop::square(Vec3::zeros(), 3.0);
        let arc = plan_arc(&config, &physical, 1, -40.0, 9.5);
        assert!((arc.radius - 9.5).abs() < 1e-6);
        assert!(arc.center.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_is_moving() {
        let config = RedirectionConfig::default();
        assert!(is_moving(&config, 0.01, 1.0 / 90.0));
        assert!(!is_moving(&config, 0.0, 1.0 / 90.0));
        assert!(!is_moving(&config, 0.01, 0.0));
    }
}
