//! Play-area boundary processing and onboarding.
//!
//! The tracked play area is shrunk to a rectangle of fixed-length segments so
//! the user never walks into the real boundary. Each corner of that rectangle
//! gets a way pointer: a turning point plus the heading the onboarding arrow
//! shows. Walking onto any way pointer arms redirection from that corner.
//!
//! ```text
//!   B3 ─────────────────── B2
//!    │    P3 ─────── P2     │
//!    │     │         │      │
//!    │     │  3m×3m  │      │
//!    │     │         │      │
//!    │    P0 ─────── P1     │
//!   B0 ─────────────────── B1
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::BoundaryError;
use crate::geometry::{planar_direction, planar_distance, planar_length};
use crate::loops::{PhysicalLoop, PHYSICAL_CORNERS};
use crate::types::Vec3;

/// Parameters for way pointer placement and onboarding.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryParams {
    /// Length of each physical path segment (m).
    pub segment_length: f32,
    /// Angle the arrow is pre-rotated towards the following edge (degrees).
    pub arrow_curve_deg: f32,
    /// Distance at which standing on a way pointer arms redirection (m).
    pub arm_distance: f32,
    /// Corner-enter radius used to decide if the user starts inside (m).
    pub corner_enter: f32,
}

impl Default for BoundaryParams {
    fn default() -> Self {
        Self {
            segment_length: 3.0,
            arrow_curve_deg: 9.5,
            arm_distance: 0.2,
            corner_enter: 0.45,
        }
    }
}

/// The raw play-area rectangle reported by the headset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayArea {
    points: [Vec3; PHYSICAL_CORNERS],
}

impl PlayArea {
    /// Create a play area from four ordered boundary points.
    pub fn new(points: [Vec3; PHYSICAL_CORNERS]) -> Result<Self, BoundaryError> {
        for (index, p) in points.iter().enumerate() {
            if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                return Err(BoundaryError::NonFinitePoint { index });
            }
        }
        Ok(Self { points })
    }

    /// Axis-aligned `width` × `depth` play area centered on the origin.
    #[must_use]
    pub fn rectangle(width: f32, depth: f32) -> Self {
        let (hw, hd) = (width * 0.5, depth * 0.5);
        Self {
            points: [
                Vec3::new(-hw, 0.0, -hd),
                Vec3::new(hw, 0.0, -hd),
                Vec3::new(hw, 0.0, hd),
                Vec3::new(-hw, 0.0, hd),
            ],
        }
    }

    /// Boundary points in order.
    #[must_use]
    pub fn points(&self) -> &[Vec3; PHYSICAL_CORNERS] {
        &self.points
    }

    fn edges(&self, corner: usize) -> (Vec3, Vec3) {
        let second = (corner + 1) % PHYSICAL_CORNERS;
        let third = (second + 1) % PHYSICAL_CORNERS;
        (
            self.points[second] - self.points[corner],
            self.points[third] - self.points[second],
        )
    }

    /// Place the way pointer for one corner.
    ///
    /// Fails with [`BoundaryError::InsufficientSpace`] when either edge next to
    /// the corner is shorter than a path segment.
    pub fn way_pointer(&self, corner: usize, params: &BoundaryParams) -> Result<WayPointer, BoundaryError> {
        let corner = corner % PHYSICAL_CORNERS;
        let (forward, next) = self.edges(corner);
        let forward_m = planar_length(&forward);
        let next_m = planar_length(&next);
        let required_m = params.segment_length;

        let insufficient = BoundaryError::InsufficientSpace {
            corner,
            forward_m,
            next_m,
            required_m,
        };
        if forward_m < required_m || next_m < required_m {
            return Err(insufficient);
        }
        let (Some(forward_dir), Some(next_dir)) = (planar_direction(&forward), planar_direction(&next)) else {
            return Err(insufficient);
        };

        let position = self.points[corner]
            + forward_dir * ((forward_m - required_m) * 0.5)
            + next_dir * ((next_m - required_m) * 0.5);
        let tan = libm::tanf(params.arrow_curve_deg.to_radians());
        let heading = forward_dir - next_dir * tan;

        Ok(WayPointer { position, heading })
    }

    /// Place every way pointer, skipping corners without enough room.
    #[must_use]
    pub fn turning_points(&self, params: &BoundaryParams) -> TurningPoints {
        let mut points = TurningPoints::default();
        for corner in 0..PHYSICAL_CORNERS {
            match self.way_pointer(corner, params) {
                Ok(pointer) => points.pointers[corner] = Some(pointer),
                Err(err) => {
                    warn!("Skipping way pointer: {err}");
                    points.skipped.push(err);
                }
            }
        }
        points
    }
}

/// A turning point and the direction the onboarding arrow faces.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WayPointer {
    /// Turning point in tracking space.
    pub position: Vec3,
    /// Initial walking direction (not normalized).
    pub heading: Vec3,
}

/// Way pointers for the four corners; missing entries had no room.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurningPoints {
    pointers: [Option<WayPointer>; PHYSICAL_CORNERS],
    skipped: Vec<BoundaryError>,
}

impl TurningPoints {
    /// Way pointer for a corner, if it could be placed.
    #[must_use]
    pub fn get(&self, corner: usize) -> Option<&WayPointer> {
        self.pointers.get(corner).and_then(Option::as_ref)
    }

    /// Corners that were skipped and why.
    #[must_use]
    pub fn skipped(&self) -> &[BoundaryError] {
        &self.skipped
    }

    /// Whether all four corners were placed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pointers.iter().all(Option::is_some)
    }

    /// Build the physical loop, failing on the first skipped corner.
    pub fn to_physical_loop(&self) -> Result<PhysicalLoop, BoundaryError> {
        let mut corners = [Vec3::zeros(); PHYSICAL_CORNERS];
        for (i, pointer) in self.pointers.iter().enumerate() {
            match pointer {
                Some(p) => corners[i] = p.position,
                None => return Err(self.skip_reason(i)),
            }
        }
        Ok(PhysicalLoop::new(corners))
    }

    fn skip_reason(&self, corner: usize) -> BoundaryError {
        self.skipped
            .iter()
            .find(|e| matches!(e, BoundaryError::InsufficientSpace { corner: c, .. } if *c == corner))
            .cloned()
            .unwrap_or(BoundaryError::InsufficientSpace {
                corner,
                forward_m: 0.0,
                next_m: 0.0,
                required_m: 0.0,
            })
    }
}

/// Signal that onboarding finished and redirection may start.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArmingSignal {
    /// Physical corner the user starts walking from.
    pub starting_corner: usize,
    /// Whether the user is inside that corner's turning region.
    pub starts_inside: bool,
    /// Way pointer the user stood on, for aligning the virtual world.
    pub pointer: WayPointer,
}

/// Waits for the user to step onto a way pointer.
#[derive(Clone, Debug, Default)]
pub struct Onboarding {
    params: BoundaryParams,
    armed: Option<ArmingSignal>,
}

impl Onboarding {
    /// Create an onboarding tracker.
    #[must_use]
    pub fn new(params: BoundaryParams) -> Self {
        Self { params, armed: None }
    }

    /// The arming signal, once the user has reached a way pointer.
    #[must_use]
    pub fn armed(&self) -> Option<&ArmingSignal> {
        self.armed.as_ref()
    }

    /// Feed the current head position; arms on the first way pointer reached.
    pub fn observe(&mut self, head: &Vec3, points: &TurningPoints) -> Option<ArmingSignal> {
        if self.armed.is_some() {
            return self.armed;
        }

        for corner in 0..PHYSICAL_CORNERS {
            let Some(pointer) = points.get(corner) else {
                continue;
            };
            let distance = planar_distance(&pointer.position, head);
            if distance < self.params.arm_distance {
                let signal = ArmingSignal {
                    starting_corner: corner,
                    starts_inside: distance < self.params.corner_enter,
                    pointer: *pointer,
                };
                info!(corner, "Onboarding complete, redirection armed");
                self.armed = Some(signal);
                break;
            }
        }
        self.armed
    }
}
