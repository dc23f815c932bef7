//! Host integration API
//!
//! The controller never talks to a scene graph. The embedding application
//! (Unity, Unreal, Godot, Bevy, a test harness, ...) implements two small
//! traits: one that reports the tracked head and the suspend button, and one
//! that exposes the virtual world node as an opaque pose.
//!
//! ```text
//! ┌──────────────────────────────┐        ┌──────────────────────────────┐
//! │ PoseSource (implement this)  │        │ WorldPose (implement this)   │
//! │  head_pose()                 │        │  rotate_around(pivot, axis)  │
//! │  suspend_requested()         │        │  translate(delta)            │
//! └──────────────┬───────────────┘        │  transform_point(local)      │
//!                │                        └──────────────▲───────────────┘
//!                ▼                                       │
//! ┌──────────────────────────────────────────────────────┴──────────────────┐
//! │                        RedirectionController                            │
//! │       early phase: sample pose, corner transit, blend                   │
//! │       late phase:  rotation, curvature, translation gain, telemetry     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use rdw_core::boundary::WayPointer;
use rdw_core::geometry::{flatten, planar_direction, signed_yaw_deg, yaw_rotation};
use rdw_core::types::{HeadPose, Vec3};

// ============================================================================
// Host Adapter Traits
// ============================================================================

/// Source of tracked head poses and user input.
pub trait PoseSource {
    /// Current head pose in tracking space.
    fn head_pose(&self) -> HeadPose;

    /// Whether the user is holding the control that suspends redirection.
    fn suspend_requested(&self) -> bool {
        false
    }
}

/// The virtual world node the controller moves.
pub trait WorldPose {
    /// Rotate the world by `degrees` about `axis` through `pivot`.
    fn rotate_around(&mut self, pivot: &Vec3, axis: &Unit<Vector3<f32>>, degrees: f32);

    /// Move the world by `delta`.
    fn translate(&mut self, delta: &Vec3);

    /// Map a point from world-local space to tracking space.
    fn transform_point(&self, local: &Vec3) -> Vec3;
}

impl<P: PoseSource + ?Sized> PoseSource for &P {
    fn head_pose(&self) -> HeadPose {
        (**self).head_pose()
    }

    fn suspend_requested(&self) -> bool {
        (**self).suspend_requested()
    }
}

/// Move the world so its origin stands on `pointer` with +Z along its heading.
///
/// Only yaw and the horizontal position change. Returns `false` (and leaves
/// the world alone) when either direction is degenerate.
pub fn align_world<W: WorldPose + ?Sized>(world: &mut W, pointer: &WayPointer) -> bool {
    let origin = world.transform_point(&Vec3::zeros());
    let forward = world.transform_point(&Vec3::z()) - origin;
    let (Some(from), Some(to)) = (planar_direction(&forward), planar_direction(&pointer.heading)) else {
        return false;
    };

    world.rotate_around(&origin, &Vector3::y_axis(), signed_yaw_deg(&from, &to));
    world.translate(&flatten(&(pointer.position - origin)));
    true
}

// ============================================================================
// World Transform
// ============================================================================

/// Rigid transform of the virtual world node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldTransform {
    /// Translation of the world origin in tracking space.
    pub position: Vec3,
    /// Orientation of the world relative to tracking space.
    pub rotation: UnitQuaternion<f32>,
}

impl WorldTransform {
    /// Identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Place the world origin at `position` with its +Z facing `heading`.
    ///
    /// A degenerate heading keeps the identity orientation.
    #[must_use]
    pub fn aligned_to(position: Vec3, heading: &Vec3) -> Self {
        let rotation = planar_direction(heading)
            .map(|dir| yaw_rotation(signed_yaw_deg(&Vec3::z(), &dir)))
            .unwrap_or_else(UnitQuaternion::identity);
        Self { position, rotation }
    }

    /// Yaw of the world's +Z axis in degrees (signed, about +Y).
    #[must_use]
    pub fn yaw_deg(&self) -> f32 {
        let forward = self.rotation * Vec3::z();
        signed_yaw_deg(&Vec3::z(), &forward)
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl WorldPose for WorldTransform {
    fn rotate_around(&mut self, pivot: &Vec3, axis: &Unit<Vector3<f32>>, degrees: f32) {
        if !degrees.is_finite() {
            return;
        }
        let q = UnitQuaternion::from_axis_angle(axis, degrees.to_radians());
        self.position = pivot + q * (self.position - pivot);
        self.rotation = q * self.rotation;
    }

    fn translate(&mut self, delta: &Vec3) {
        if delta.iter().all(|c| c.is_finite()) {
            self.position += delta;
        }
    }

    fn transform_point(&self, local: &Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_around_pivot() {
        let mut world = WorldTransform::identity();
        let pivot = Vec3::new(1.0, 0.0, 0.0);
        world.rotate_around(&pivot, &Vector3::y_axis(), 90.0);

        // The world origin swings around the pivot
        let origin = world.transform_point(&Vec3::zeros());
        assert!((origin - Vec3::new(1.0, 0.0, 1.0)).norm() < 1e-5);
        assert!((world.yaw_deg() - 90.0).abs() < 1e-3);

        // The pivot itself stays put
        let local_pivot = world.rotation.inverse() * (pivot - world.position);
        assert!((world.transform_point(&local_pivot) - pivot).norm() < 1e-5);
    }

    #[test]
    fn test_translate() {
        let mut world = WorldTransform::identity();
        world.translate(&Vec3::new(0.5, 0.0, -0.25));
        let p = world.transform_point(&Vec3::new(1.0, 0.0, 1.0));
        assert!((p - Vec3::new(1.5, 0.0, 0.75)).norm() < 1e-6);
    }

    #[test]
    fn test_non_finite_updates_are_ignored() {
        let mut world = WorldTransform::identity();
        world.rotate_around(&Vec3::zeros(), &Vector3::y_axis(), f32::NAN);
        world.translate(&Vec3::new(f32::INFINITY, 0.0, 0.0));
        assert_eq!(world, WorldTransform::identity());
    }

    #[test]
    fn test_align_world_to_pointer() {
        let mut world = WorldTransform::aligned_to(Vec3::new(0.0, 1.0, 0.0), &Vec3::new(-1.0, 0.0, 0.0));
        let pointer = WayPointer {
            position: Vec3::new(2.0, 0.0, -1.0),
            heading: Vec3::new(1.0, 0.0, 0.0),
        };
        assert!(align_world(&mut world, &pointer));

        let origin = world.transform_point(&Vec3::zeros());
        assert!((origin - Vec3::new(2.0, 1.0, -1.0)).norm() < 1e-5);
        assert!((world.yaw_deg() - 90.0).abs() < 1e-3);

        let degenerate = WayPointer {
            position: Vec3::zeros(),
            heading: Vec3::y(),
        };
        assert!(!align_world(&mut world, &degenerate));
    }

    #[test]
    fn test_aligned_to_heading() {
        let world = WorldTransform::aligned_to(Vec3::new(2.0, 0.0, 0.0), &Vec3::new(1.0, 0.3, 0.0));
        assert!((world.yaw_deg() - 90.0).abs() < 1e-3);
        assert!((world.transform_point(&Vec3::zeros()).x - 2.0).abs() < 1e-6);

        let behind = WorldTransform::aligned_to(Vec3::zeros(), &Vec3::new(0.0, 0.0, -1.0));
        assert!((behind.yaw_deg().abs() - 180.0).abs() < 1e-3);

        let fallback = WorldTransform::aligned_to(Vec3::zeros(), &Vec3::new(0.0, 1.0, 0.0));
        assert!(fallback.yaw_deg().abs() < 1e-6);
    }
}
