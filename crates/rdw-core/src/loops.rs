//! Physical and virtual walking loops.

use serde::{Deserialize, Serialize};

use crate::geometry::{closest_point, CornerHit};
use crate::types::Vec3;

/// Number of turning points in the physical loop.
pub const PHYSICAL_CORNERS: usize = 4;

/// Number of turning points in the virtual loop.
pub const VIRTUAL_CORNERS: usize = 6;

/// The inset rectangle the user physically walks, in tracking space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalLoop {
    corners: [Vec3; PHYSICAL_CORNERS],
}

impl PhysicalLoop {
    /// Create a loop from four ordered turning points.
    #[must_use]
    pub const fn new(corners: [Vec3; PHYSICAL_CORNERS]) -> Self {
        Self { corners }
    }

    /// Axis-aligned square loop of side `side` centered on `center`.
    ///
    /// Corners start at the min-x/min-z corner and run towards +X first.
    #[must_use]
    pub fn square(center: Vec3, side: f32) -> Self {
        let h = side * 0.5;
        Self::new([
            Vec3::new(center.x - h, center.y, center.z - h),
            Vec3::new(center.x + h, center.y, center.z - h),
            Vec3::new(center.x + h, center.y, center.z + h),
            Vec3::new(center.x - h, center.y, center.z + h),
        ])
    }

    /// All corners in order.
    #[must_use]
    pub fn corners(&self) -> &[Vec3; PHYSICAL_CORNERS] {
        &self.corners
    }

    /// Corner at a cyclic index.
    #[must_use]
    pub fn corner(&self, index: usize) -> Vec3 {
        self.corners[index % PHYSICAL_CORNERS]
    }

    /// Index of the corner after `index`.
    #[must_use]
    pub const fn next_index(index: usize) -> usize {
        (index + 1) % PHYSICAL_CORNERS
    }

    /// Segment vector from corner `index` to the following corner.
    #[must_use]
    pub fn segment(&self, index: usize) -> Vec3 {
        self.corner(Self::next_index(index)) - self.corner(index)
    }

    /// Nearest corner to `position` in the floor plane.
    #[must_use]
    pub fn closest(&self, position: &Vec3) -> CornerHit {
        // A fixed-size non-empty array always yields a hit.
        closest_point(&self.corners, position).unwrap_or(CornerHit {
            index: 0,
            distance: f32::INFINITY,
        })
    }
}

/// Turning points of the simulated path, in the virtual world's local space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VirtualLoop {
    corners: [Vec3; VIRTUAL_CORNERS],
}

impl VirtualLoop {
    /// Create a loop from six ordered corners.
    #[must_use]
    pub const fn new(corners: [Vec3; VIRTUAL_CORNERS]) -> Self {
        Self { corners }
    }

    /// Regular hexagon with straight paths of `path_length` meters.
    ///
    /// Corner 0 sits at `origin`; the first path runs along +Z and each
    /// following path turns -60° of yaw, the same sense as
    /// [`PhysicalLoop::square`].
    #[must_use]
    pub fn hexagon(origin: Vec3, path_length: f32) -> Self {
        let mut corners = [origin; VIRTUAL_CORNERS];
        let mut heading = 0.0_f32;
        for i in 1..VIRTUAL_CORNERS {
            let step = Vec3::new(
                libm::sinf(heading.to_radians()),
                0.0,
                libm::cosf(heading.to_radians()),
            ) * path_length;
            corners[i] = corners[i - 1] + step;
            heading -= 60.0;
        }
        Self::new(corners)
    }

    /// All corners in order.
    #[must_use]
    pub fn corners(&self) -> &[Vec3; VIRTUAL_CORNERS] {
        &self.corners
    }

    /// Corner at a cyclic index.
    #[must_use]
    pub fn corner(&self, index: usize) -> Vec3 {
        self.corners[index % VIRTUAL_CORNERS]
    }

    /// Index of the corner after `index`.
    #[must_use]
    pub const fn next_index(index: usize) -> usize {
        (index + 1) % VIRTUAL_CORNERS
    }
}
