//! Scripted headset for offline runs.
//!
//! The walker does what a user following the virtual path does: it turns on
//! the spot towards the virtual corner it is heading for and walks straight
//! at it once it faces it. It picks the next corner only after standing on
//! the current one. Everything the controller does to the world shows up as
//! physical drift of the walker.

use rdw_controller::engine::{PoseSource, WorldPose};
use rdw_controller::provider::WaypointProvider;
use rdw_controller::{RedirectionController, Telemetry};
use rdw_core::geometry::{flatten, planar_direction, planar_distance, planar_length, rotate_yaw, signed_yaw_deg};
use rdw_core::loops::{VirtualLoop, VIRTUAL_CORNERS};
use rdw_core::types::{HeadPose, Vec3};

/// Eye height of the simulated user (m).
pub const EYE_HEIGHT_M: f32 = 1.7;

/// Distance at which the walker counts a virtual corner as reached (m).
pub const ARRIVAL_M: f32 = 0.02;

/// Facing error below which the walker starts walking (degrees).
const WALK_ALIGNMENT_DEG: f32 = 5.0;

/// A simulated user walking towards virtual targets.
#[derive(Clone, Debug)]
pub struct SimulatedWalker {
    pose: HeadPose,
    speed_m_s: f32,
    turn_rate_deg_s: f32,
    suspend: bool,
    walked_m: f32,
    target: Option<usize>,
    arrivals: usize,
}

impl SimulatedWalker {
    /// Walker standing at `position` (floor level) facing `forward`.
    #[must_use]
    pub fn new(position: Vec3, forward: Vec3, speed_m_s: f32, turn_rate_deg_s: f32) -> Self {
        let forward = planar_direction(&forward).unwrap_or_else(Vec3::z);
        Self {
            pose: HeadPose::new(Vec3::new(position.x, EYE_HEIGHT_M, position.z), forward),
            speed_m_s,
            turn_rate_deg_s,
            suspend: false,
            walked_m: 0.0,
            target: None,
            arrivals: 0,
        }
    }

    /// Virtual corner the walker is heading for, once it has a route.
    #[must_use]
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Virtual corners stood on so far.
    #[must_use]
    pub fn arrivals(&self) -> usize {
        self.arrivals
    }

    /// Head for virtual corner `index` unless a route is already set.
    pub fn follow_from(&mut self, index: usize) {
        self.target.get_or_insert(index % VIRTUAL_CORNERS);
    }

    /// Walk the virtual loop for `dt` seconds. `corners` are the virtual
    /// corners in tracking space.
    pub fn walk(&mut self, corners: &[Vec3; VIRTUAL_CORNERS], dt: f32) {
        let Some(mut target) = self.target else {
            return;
        };
        if planar_distance(&self.pose.position, &corners[target]) <= ARRIVAL_M {
            target = VirtualLoop::next_index(target);
            self.target = Some(target);
            self.arrivals += 1;
        }
        self.step(&corners[target], dt);
    }

    /// Hold or release the suspend button.
    pub fn set_suspend(&mut self, suspend: bool) {
        self.suspend = suspend;
    }

    /// Physical distance walked so far (m).
    #[must_use]
    pub fn walked_m(&self) -> f32 {
        self.walked_m
    }

    /// Advance by `dt` seconds towards `target` (tracking space).
    pub fn step(&mut self, target: &Vec3, dt: f32) {
        let to_target = flatten(&(target - self.pose.position));
        let Some(wanted) = planar_direction(&to_target) else {
            return;
        };

        let error = signed_yaw_deg(&self.pose.forward, &wanted);
        let max_turn = self.turn_rate_deg_s * dt;
        let turn = error.clamp(-max_turn, max_turn);
        self.pose.forward = rotate_yaw(&self.pose.forward, turn);

        if (error - turn).abs() < WALK_ALIGNMENT_DEG {
            let step = (self.speed_m_s * dt).min(planar_length(&to_target));
            self.pose.position += self.pose.forward * step;
            self.walked_m += step;
        }
    }
}

impl PoseSource for SimulatedWalker {
    fn head_pose(&self) -> HeadPose {
        self.pose
    }

    fn suspend_requested(&self) -> bool {
        self.suspend
    }
}

/// Move the walker one frame along the virtual loop, then tick the
/// controller.
pub fn step_frame<W, B>(rdw: &mut RedirectionController<SimulatedWalker, W, B>, dt: f32) -> Option<Telemetry>
where
    W: WorldPose,
    B: WaypointProvider,
{
    let start = rdw.state().map(|state| state.current_virtual_target());
    let corners: [Vec3; VIRTUAL_CORNERS] = std::array::from_fn(|index| rdw.virtual_corner_world(index));
    let walker = rdw.source_mut();
    if let Some(start) = start {
        walker.follow_from(start);
    }
    walker.walk(&corners, dt);
    rdw.tick(dt)
}

/// Planar distance by which `position` lies outside an axis-aligned square.
#[must_use]
pub fn excursion_outside_square(position: &Vec3, center: &Vec3, side: f32) -> f32 {
    let h = side * 0.5;
    let dx = ((position.x - center.x).abs() - h).max(0.0);
    let dz = ((position.z - center.z).abs() - h).max(0.0);
    libm::sqrtf(dx * dx + dz * dz)
}
