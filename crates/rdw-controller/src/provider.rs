//! Boundary/waypoint providers.
//!
//! The controller pulls its physical geometry and the arming signal from a
//! [`WaypointProvider`] every tick until redirection is armed.

use tracing::debug;

use rdw_core::boundary::{ArmingSignal, BoundaryParams, Onboarding, PlayArea, TurningPoints, WayPointer};
use rdw_core::geometry::planar_direction;
use rdw_core::loops::PhysicalLoop;
use rdw_core::types::{HeadPose, Vec3};

/// Supplies the physical loop and tells the controller when to start.
pub trait WaypointProvider {
    /// The four turning points, once they are known.
    fn physical_loop(&self) -> Option<PhysicalLoop>;

    /// Arming signal; `None` while onboarding is still in progress.
    fn arming(&mut self, head: &HeadPose) -> Option<ArmingSignal>;
}

/// A fixed loop that is armed from the first tick.
///
/// The way pointer sits on the starting corner and points along the first
/// segment, bent outwards by the default arrow curve like a placed arrow.
#[derive(Clone, Copy, Debug)]
pub struct StaticWaypoints {
    physical: PhysicalLoop,
    starting_corner: usize,
    starts_inside: bool,
    heading: Vec3,
}

impl StaticWaypoints {
    /// Start at `starting_corner`, inside its turning region.
    #[must_use]
    pub fn new(physical: PhysicalLoop, starting_corner: usize) -> Self {
        let starting_corner = starting_corner % rdw_core::PHYSICAL_CORNERS;
        let forward = physical.segment(starting_corner);
        let next = physical.segment(PhysicalLoop::next_index(starting_corner));
        let heading = match (planar_direction(&forward), planar_direction(&next)) {
            (Some(f), Some(n)) => f - n * libm::tanf(BoundaryParams::default().arrow_curve_deg.to_radians()),
            _ => forward,
        };
        Self {
            physical,
            starting_corner,
            starts_inside: true,
            heading,
        }
    }

    /// Override whether the user starts inside the turning region.
    #[must_use]
    pub fn starting_inside(mut self, inside: bool) -> Self {
        self.starts_inside = inside;
        self
    }
}

impl WaypointProvider for StaticWaypoints {
    fn physical_loop(&self) -> Option<PhysicalLoop> {
        Some(self.physical)
    }

    fn arming(&mut self, _head: &HeadPose) -> Option<ArmingSignal> {
        Some(ArmingSignal {
            starting_corner: self.starting_corner,
            starts_inside: self.starts_inside,
            pointer: WayPointer {
                position: self.physical.corner(self.starting_corner),
                heading: self.heading,
            },
        })
    }
}

/// Derives the loop from the play area and arms through onboarding.
#[derive(Clone, Debug)]
pub struct BoundaryWaypoints {
    params: BoundaryParams,
    turning_points: TurningPoints,
    onboarding: Onboarding,
}

impl BoundaryWaypoints {
    /// Place way pointers for `area`.
    #[must_use]
    pub fn new(area: &PlayArea, params: BoundaryParams) -> Self {
        Self {
            params,
            turning_points: area.turning_points(&params),
            onboarding: Onboarding::new(params),
        }
    }

    /// Re-place way pointers after the tracked boundary changed.
    ///
    /// Ignored once onboarding has armed redirection.
    pub fn update_play_area(&mut self, area: &PlayArea) {
        if self.onboarding.armed().is_none() {
            self.turning_points = area.turning_points(&self.params);
        }
    }

    /// Current way pointers.
    #[must_use]
    pub fn turning_points(&self) -> &TurningPoints {
        &self.turning_points
    }
}

impl WaypointProvider for BoundaryWaypoints {
    fn physical_loop(&self) -> Option<PhysicalLoop> {
        self.turning_points.to_physical_loop().ok()
    }

    fn arming(&mut self, head: &HeadPose) -> Option<ArmingSignal> {
        if !self.turning_points.is_complete() {
            debug!("Waiting for a complete set of turning points");
            return None;
        }
        self.onboarding.observe(&head.position, &self.turning_points)
    }
}
