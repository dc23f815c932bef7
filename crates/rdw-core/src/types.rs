//! Core types for redirected walking.
//!
//! Positions and directions are `nalgebra` vectors in a right-handed, y-up
//! frame (meters). Physical quantities live in tracking space; virtual
//! quantities live in the local space of the virtual world node.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A position or direction in meters.
pub type Vec3 = Vector3<f32>;

/// Head pose sampled from the tracking system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    /// Head position in tracking space.
    pub position: Vec3,
    /// Forward (gaze) direction. Need not be normalized.
    pub forward: Vec3,
}

impl HeadPose {
    /// Create a new head pose.
    #[must_use]
    pub const fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    /// Pose at `position` looking down +Z.
    #[must_use]
    pub fn looking_forward(position: Vec3) -> Self {
        Self::new(position, Vec3::z())
    }
}

impl Default for HeadPose {
    fn default() -> Self {
        Self::looking_forward(Vec3::zeros())
    }
}

/// Whether `dt` can be used for rates and timers.
#[must_use]
pub fn is_valid_delta(dt: f32) -> bool {
    dt.is_finite() && dt > 0.0
}

/// Frame timing information for the redirection loop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameTime {
    /// Frame number since the controller was created.
    pub frame_number: u64,
    /// Time since the controller was created (seconds).
    pub elapsed_s: f32,
    /// Delta time since last frame (seconds).
    pub delta_s: f32,
}

impl FrameTime {
    /// Create the first frame at time zero with a nominal refresh rate.
    #[must_use]
    pub fn first(target_hz: f32) -> Self {
        Self {
            frame_number: 0,
            elapsed_s: 0.0,
            delta_s: 1.0 / target_hz,
        }
    }

    /// Advance by `delta_s` seconds. An unusable delta still counts the
    /// frame but leaves the clock where it was.
    #[must_use]
    pub fn advance(&self, delta_s: f32) -> Self {
        let elapsed_s = if is_valid_delta(delta_s) {
            self.elapsed_s + delta_s
        } else {
            self.elapsed_s
        };
        Self {
            frame_number: self.frame_number + 1,
            elapsed_s,
            delta_s,
        }
    }

    /// Whether the delta is usable for rate computations.
    #[must_use]
    pub fn has_valid_delta(&self) -> bool {
        is_valid_delta(self.delta_s)
    }
}

impl Default for FrameTime {
    fn default() -> Self {
        Self::first(90.0)
    }
}

/// Kind of corner-transit event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitKind {
    /// The user entered the turning region of a physical corner.
    OutsideIn,
    /// The user left the turning region of a physical corner.
    InsideOut,
}

impl TransitKind {
    /// Get a human-readable name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OutsideIn => "outside_in",
            Self::InsideOut => "inside_out",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_advance() {
        let frame = FrameTime::first(60.0);
        assert_eq!(frame.frame_number, 0);

        let next = frame.advance(0.02);
        assert_eq!(next.frame_number, 1);
        assert!((next.elapsed_s - 0.02).abs() < 1e-6);
        assert!(next.has_valid_delta());
    }

    #[test]
    fn test_invalid_delta() {
        let frame = FrameTime::first(60.0).advance(0.0);
        assert!(!frame.has_valid_delta());
        assert!(!FrameTime::first(60.0).advance(f32::NAN).has_valid_delta());
        assert!(!is_valid_delta(-0.01));
        assert!(!is_valid_delta(f32::INFINITY));
    }

    #[test]
    fn test_bad_delta_keeps_clock() {
        let frame = FrameTime::first(90.0).advance(0.5).advance(f32::NAN).advance(-1.0);
        assert_eq!(frame.frame_number, 3);
        assert!((frame.elapsed_s - 0.5).abs() < 1e-6);

        let next = frame.advance(0.25);
        assert!((next.elapsed_s - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_default_pose_looks_down_z() {
        let pose = HeadPose::default();
        assert!((pose.forward.z - 1.0).abs() < 1e-6);
        assert_eq!(TransitKind::OutsideIn.name(), "outside_in");
    }
}
