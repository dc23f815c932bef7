//! Per-tick telemetry.

use std::fmt;

use serde::Serialize;

use crate::state::RedirectionState;
use crate::transit::CornerTransition;
use crate::translation::TranslationGain;

/// Snapshot of the controller after a tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Telemetry {
    /// Frame number.
    pub frame: u64,
    /// Seconds since the controller was created.
    pub elapsed_s: f32,
    /// Whether gains were applied this tick.
    pub active: bool,
    /// Rotation gain since the last transition (degrees).
    pub rotation_gain_deg: f32,
    /// Curvature gain since the last transition (degrees).
    pub curvature_gain_deg: f32,
    /// Accumulated lack (degrees).
    pub lack_deg: f32,
    /// Physical target corner.
    pub current_target: usize,
    /// Virtual target corner.
    pub current_virtual_target: usize,
    /// Distance from the head to the turning center minus the radius (m).
    pub distance_to_arc_m: f32,
    /// Current arc radius (m).
    pub curvature_radius_m: f32,
    /// Transit blend.
    pub blend: f32,
    /// Whether a transit blend is running.
    pub in_transit: bool,
    /// Translation correction applied this tick.
    pub translation: Option<TranslationGain>,
    /// Corner transition detected this tick.
    pub transition: Option<CornerTransition>,
    /// Virtual corner reached this tick.
    pub virtual_reached: Option<usize>,
}

impl Telemetry {
    pub(crate) fn capture(state: &RedirectionState, frame: u64, elapsed_s: f32, active: bool) -> Self {
        let distance_to_center = rdw_core::geometry::planar_distance(&state.history().position(), &state.turning_center());
        Self {
            frame,
            elapsed_s,
            active,
            rotation_gain_deg: state.rotation_gain_accum_deg(),
            curvature_gain_deg: state.curvature_gain_accum_deg(),
            lack_deg: state.lack_deg(),
            current_target: state.current_target(),
            current_virtual_target: state.current_virtual_target(),
            distance_to_arc_m: distance_to_center - state.curvature_radius(),
            curvature_radius_m: state.curvature_radius(),
            blend: state.blend(),
            in_transit: state.in_transit(),
            translation: None,
            transition: None,
            virtual_reached: None,
        }
    }
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RotationGain: {:.3}", self.rotation_gain_deg)?;
        writeln!(f, "CurvatureGain: {:.3}", self.curvature_gain_deg)?;
        writeln!(f, "Lack: {:.3}", self.lack_deg)?;
        writeln!(f, "Target: {} (virtual {})", self.current_target, self.current_virtual_target)?;
        writeln!(f, "dist: {:.3}", self.distance_to_arc_m)?;
        writeln!(f, "rad: {:.3}", self.curvature_radius_m)?;
        match &self.translation {
            Some(gain) => write!(f, "trans: {:.3}", gain.rate),
            None => write!(f, "trans: -"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RedirectionConfig;
    use rdw_core::boundary::{ArmingSignal, WayPointer};
    use rdw_core::loops::PhysicalLoop;
    use rdw_core::types::{HeadPose, Vec3};

    #[test]
    fn test_display_lists_every_field() {
        let config = RedirectionConfig::default();
        let physical = PhysicalLoop::square(Vec3::zeros(), 3.0);
        let signal = ArmingSignal {
            starting_corner: 0,
            starts_inside: true,
            pointer: WayPointer {
                position: physical.corner(0),
                heading: physical.segment(0),
            },
        };
        let state = RedirectionState::armed(&config, &physical, &signal, &HeadPose::looking_forward(physical.corner(0)));
        let telemetry = Telemetry::capture(&state, 7, 0.5, true);

        // The head stands on the arc's starting corner
        assert!(telemetry.distance_to_arc_m.abs() < 1e-3);

        let text = telemetry.to_string();
        for key in ["RotationGain:", "CurvatureGain:", "Lack:", "Target:", "dist:", "rad:", "trans:"] {
            assert!(text.contains(key), "missing {key}");
        }
    }
}
