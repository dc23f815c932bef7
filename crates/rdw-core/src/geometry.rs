//! Horizontal-plane geometry helpers.
//!
//! Redirection only ever reasons about the floor plane: vertical head bob must
//! not trigger corner transitions, so every distance here ignores `y`.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::types::Vec3;

/// Vectors shorter than this are treated as zero length.
pub const EPSILON: f32 = 1e-6;

/// Project a vector onto the floor plane.
#[must_use]
pub fn flatten(v: &Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Length of a vector's floor-plane projection.
#[must_use]
pub fn planar_length(v: &Vec3) -> f32 {
    libm::sqrtf(v.x * v.x + v.z * v.z)
}

/// Floor-plane distance between two points.
#[must_use]
pub fn planar_distance(a: &Vec3, b: &Vec3) -> f32 {
    planar_length(&(a - b))
}

/// Normalize the floor-plane projection, or `None` for a degenerate vector.
#[must_use]
pub fn planar_direction(v: &Vec3) -> Option<Vec3> {
    let flat = flatten(v);
    let len = planar_length(&flat);
    if len > EPSILON && len.is_finite() {
        Some(flat / len)
    } else {
        None
    }
}

/// Signed yaw in degrees that takes `from` to `to` when rotating about +Y.
///
/// Positive values turn +Z towards +X. Zero-length
/// inputs yield `0.0`.
#[must_use]
pub fn signed_yaw_deg(from: &Vec3, to: &Vec3) -> f32 {
    let cross = from.x * to.z - from.z * to.x;
    let dot = from.x * to.x + from.z * to.z;
    -libm::atan2f(cross, dot).to_degrees()
}

/// Rotation of `degrees` about the vertical axis.
#[must_use]
pub fn yaw_rotation(degrees: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), degrees.to_radians())
}

/// Rotate a vector about the vertical axis.
#[must_use]
pub fn rotate_yaw(v: &Vec3, degrees: f32) -> Vec3 {
    yaw_rotation(degrees) * v
}

/// The nearest point of a set, measured in the floor plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerHit {
    /// Index of the nearest point.
    pub index: usize,
    /// Floor-plane distance to it.
    pub distance: f32,
}

/// Find the point closest to `position` in the floor plane.
///
/// Ties resolve to the lowest index. Returns `None` for an empty slice.
#[must_use]
pub fn closest_point(points: &[Vec3], position: &Vec3) -> Option<CornerHit> {
    let mut best: Option<CornerHit> = None;
    for (index, point) in points.iter().enumerate() {
        let distance = planar_distance(point, position);
        if best.map_or(true, |hit| distance < hit.distance) {
            best = Some(CornerHit { index, distance });
        }
    }
    best
}
