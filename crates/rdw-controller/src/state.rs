//! Controller state shared by the transit detector and the gains.

use serde::Serialize;

use rdw_core::boundary::ArmingSignal;
use rdw_core::geometry::{flatten, planar_direction, planar_length, signed_yaw_deg};
use rdw_core::loops::{PhysicalLoop, VirtualLoop};
use rdw_core::types::{HeadPose, Vec3};

use crate::config::RedirectionConfig;
use crate::curvature::plan_arc;
use crate::transit::TransitTimer;

/// Head pose of the previous and current tick.
///
/// Deltas are computed once per tick when a pose is sampled and the previous
/// pose is committed at the end of the tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HeadHistory {
    prev_position: Vec3,
    prev_direction: Vec3,
    position: Vec3,
    direction: Vec3,
    delta_position: Vec3,
    delta_yaw_deg: f32,
}

impl HeadHistory {
    /// History with `pose` as both previous and current sample.
    #[must_use]
    pub fn new(pose: &HeadPose) -> Self {
        let direction = planar_direction(&pose.forward).unwrap_or_else(Vec3::z);
        Self {
            prev_position: pose.position,
            prev_direction: direction,
            position: pose.position,
            direction,
            delta_position: Vec3::zeros(),
            delta_yaw_deg: 0.0,
        }
    }

    /// Take a new sample and compute the deltas against the previous one.
    ///
    /// Non-finite positions are ignored and a degenerate forward keeps the
    /// last direction.
    pub fn sample(&mut self, pose: &HeadPose) {
        if pose.position.iter().all(|c| c.is_finite()) {
            self.position = pose.position;
        }
        if let Some(direction) = planar_direction(&pose.forward) {
            self.direction = direction;
        }
        self.delta_position = flatten(&(self.position - self.prev_position));
        self.delta_yaw_deg = signed_yaw_deg(&self.prev_direction, &self.direction);
    }

    /// Make the current sample the previous one.
    pub fn commit(&mut self) {
        self.prev_position = self.position;
        self.prev_direction = self.direction;
    }

    /// Current head position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current planar forward direction (unit length).
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Planar movement since the previous tick.
    #[must_use]
    pub fn delta_position(&self) -> Vec3 {
        self.delta_position
    }

    /// Planar distance walked since the previous tick.
    #[must_use]
    pub fn step_m(&self) -> f32 {
        planar_length(&self.delta_position)
    }

    /// Signed yaw change since the previous tick (degrees).
    #[must_use]
    pub fn delta_yaw_deg(&self) -> f32 {
        self.delta_yaw_deg
    }
}

/// Everything the controller tracks once redirection is armed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RedirectionState {
    pub(crate) current_target: usize,
    pub(crate) current_virtual_target: usize,
    pub(crate) is_before_inside: bool,
    pub(crate) timer: TransitTimer,
    pub(crate) blend: f32,
    pub(crate) rotation_gain_accum_deg: f32,
    pub(crate) curvature_gain_accum_deg: f32,
    pub(crate) lack_deg: f32,
    pub(crate) first_outside_in: bool,
    pub(crate) first_inside_out: bool,
    pub(crate) curvature_radius: f32,
    pub(crate) turning_center: Vec3,
    pub(crate) turning_center_relative: Vec3,
    pub(crate) history: HeadHistory,
}

impl RedirectionState {
    /// State right after arming at `signal.starting_corner`.
    ///
    /// The first arc leaves the starting corner with no lack. The virtual
    /// target is the corner after virtual corner 0, where the user stands.
    #[must_use]
    pub fn armed(config: &RedirectionConfig, physical: &PhysicalLoop, signal: &ArmingSignal, head: &HeadPose) -> Self {
        let start = signal.starting_corner % rdw_core::PHYSICAL_CORNERS;
        let arc = plan_arc(config, physical, start, 0.0, config.initial_radius_m);
        Self {
            current_target: start,
            current_virtual_target: VirtualLoop::next_index(0),
            is_before_inside: signal.starts_inside,
            timer: TransitTimer::default(),
            blend: if signal.starts_inside { 1.0 } else { 0.0 },
            rotation_gain_accum_deg: 0.0,
            curvature_gain_accum_deg: 0.0,
            lack_deg: 0.0,
            first_outside_in: true,
            first_inside_out: true,
            curvature_radius: arc.radius,
            turning_center: arc.center,
            turning_center_relative: arc.relative,
            history: HeadHistory::new(head),
        }
    }

    /// Physical corner the user is heading to (or standing at).
    #[must_use]
    pub fn current_target(&self) -> usize {
        self.current_target
    }

    /// Virtual corner the user is heading to.
    #[must_use]
    pub fn current_virtual_target(&self) -> usize {
        self.current_virtual_target
    }

    /// Whether the user is inside a corner's turning region.
    #[must_use]
    pub fn is_inside(&self) -> bool {
        self.is_before_inside
    }

    /// Whether a transit blend is running.
    #[must_use]
    pub fn in_transit(&self) -> bool {
        self.timer.is_running()
    }

    /// Blend between curvature (0) and rotation (1) regimes.
    #[must_use]
    pub fn blend(&self) -> f32 {
        self.blend
    }

    /// Rotation gain applied since the last corner transition (degrees).
    #[must_use]
    pub fn rotation_gain_accum_deg(&self) -> f32 {
        self.rotation_gain_accum_deg
    }

    /// Curvature gain applied since the last corner transition (degrees).
    #[must_use]
    pub fn curvature_gain_accum_deg(&self) -> f32 {
        self.curvature_gain_accum_deg
    }

    /// Redirection still owed from earlier corners (degrees).
    #[must_use]
    pub fn lack_deg(&self) -> f32 {
        self.lack_deg
    }

    /// Radius of the current arc (m).
    #[must_use]
    pub fn curvature_radius(&self) -> f32 {
        self.curvature_radius
    }

    /// Center of the current arc in tracking space.
    #[must_use]
    pub fn turning_center(&self) -> Vec3 {
        self.turning_center
    }

    /// Center of the current arc relative to the corner it started from.
    #[must_use]
    pub fn turning_center_relative(&self) -> Vec3 {
        self.turning_center_relative
    }

    /// Head history.
    #[must_use]
    pub fn history(&self) -> &HeadHistory {
        &self.history
    }
}
