//! Corner transit detection and gain blending.
//!
//! Each physical corner has a turning region. Entering it is detected at
//! `corner_enter_m`, leaving it at `corner_leave_m`; the gap between the two
//! keeps a user hovering on the border from flip-flopping. Every transition
//! starts a blend of `transit_time_s` seconds between the curvature regime
//! (blend 0, walking) and the rotation regime (blend 1, turning).
//!
//! Transitions also settle the lack ledger: whatever part of the rotation or
//! curvature budget was not achieved since the previous transition is owed,
//! and the next arc is bent tighter (or looser) to make up for it.

use serde::Serialize;
use tracing::{debug, info};

use rdw_core::geometry::closest_point;
use rdw_core::loops::{PhysicalLoop, VirtualLoop};
use rdw_core::types::{is_valid_delta, TransitKind, Vec3};

use crate::config::RedirectionConfig;
use crate::curvature::plan_arc;
use crate::state::RedirectionState;

/// Countdown driving the blend after a corner transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TransitTimer {
    running: bool,
    remaining_s: f32,
}

impl TransitTimer {
    /// Start a blend of `duration_s` seconds.
    pub fn start(&mut self, duration_s: f32) {
        self.running = true;
        self.remaining_s = duration_s.max(0.0);
    }

    /// Whether a blend is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds left in the current blend.
    #[must_use]
    pub fn remaining_s(&self) -> f32 {
        self.remaining_s
    }

    /// Count down by `dt` and return the blend for the given region.
    ///
    /// Invalid deltas do not advance the timer. The result is always in
    /// `[0, 1]`.
    pub fn advance(&mut self, dt: f32, duration_s: f32, inside: bool) -> f32 {
        if !self.running {
            return if inside { 1.0 } else { 0.0 };
        }

        if is_valid_delta(dt) {
            self.remaining_s -= dt;
        }
        if self.remaining_s <= 0.0 {
            self.running = false;
            self.remaining_s = 0.0;
        }

        let fragment = if duration_s > 0.0 {
            (self.remaining_s / duration_s).clamp(0.0, 1.0)
        } else {
            0.0
        };
        if inside {
            1.0 - fragment
        } else {
            fragment
        }
    }
}

/// A settled corner transition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CornerTransition {
    /// Direction of the transition.
    pub kind: TransitKind,
    /// Physical corner whose region was entered or left.
    pub corner: usize,
    /// Redirection achieved since the previous transition (degrees).
    pub achieved_deg: f32,
    /// Lack added by this transition; `None` when the first transition of
    /// its kind achieved too little to count.
    pub lack_added_deg: Option<f32>,
}

/// Result of one transit evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransitOutcome {
    /// Corner transition detected this tick.
    pub transition: Option<CornerTransition>,
    /// Virtual corner reached this tick.
    pub virtual_reached: Option<usize>,
}

impl RedirectionState {
    /// Detect corner transitions and update the blend.
    ///
    /// Detection is skipped while a blend is running. `virtual_corners` are
    /// the virtual loop corners mapped to tracking space.
    pub fn evaluate_transit(
        &mut self,
        config: &RedirectionConfig,
        physical: &PhysicalLoop,
        virtual_corners: &[Vec3],
        head: &Vec3,
        dt: f32,
    ) -> TransitOutcome {
        let mut outcome = TransitOutcome::default();

        if !self.timer.is_running() {
            let hit = physical.closest(head);
            if hit.distance <= config.corner_enter_m && !self.is_before_inside {
                outcome.transition = Some(self.enter_corner(config, hit.index));
            } else if hit.distance >= config.corner_leave_m && self.is_before_inside {
                outcome.transition = Some(self.leave_corner(config, physical, hit.index));
            }

            if let Some(vhit) = closest_point(virtual_corners, head) {
                let next = VirtualLoop::next_index(vhit.index);
                if vhit.distance <= config.virtual_corner_m && next != self.current_virtual_target {
                    debug!(corner = vhit.index, next, "Reached virtual corner");
                    self.current_virtual_target = next;
                    outcome.virtual_reached = Some(vhit.index);
                }
            }
        }

        self.blend = self.timer.advance(dt, config.transit_time_s, self.is_before_inside);
        outcome
    }

    /// Outside-in: curvature regime ends, its budget is settled.
    fn enter_corner(&mut self, config: &RedirectionConfig, corner: usize) -> CornerTransition {
        self.is_before_inside = true;
        self.timer.start(config.transit_time_s);

        let achieved = self.curvature_gain_accum_deg + self.rotation_gain_accum_deg;
        let lack_added = self.settle(TransitKind::OutsideIn, config, config.curvature_budget_deg, achieved);

        info!(
            corner,
            achieved_deg = achieved,
            lack_deg = self.lack_deg,
            "Entered corner region"
        );
        CornerTransition {
            kind: TransitKind::OutsideIn,
            corner,
            achieved_deg: achieved,
            lack_added_deg: lack_added,
        }
    }

    /// Inside-out: rotation regime ends, the next arc is planned.
    fn leave_corner(&mut self, config: &RedirectionConfig, physical: &PhysicalLoop, corner: usize) -> CornerTransition {
        self.is_before_inside = false;
        self.timer.start(config.transit_time_s);

        let achieved = (self.curvature_gain_accum_deg + self.rotation_gain_accum_deg).abs();
        let lack_added = self.settle(TransitKind::InsideOut, config, config.rotation_budget_deg, achieved);

        let arc = plan_arc(config, physical, corner, self.lack_deg, self.curvature_radius);
        self.curvature_radius = arc.radius;
        self.turning_center_relative = arc.relative;
        self.turning_center = arc.center;
        self.current_target = PhysicalLoop::next_index(corner);

        info!(
            corner,
            achieved_deg = achieved,
            lack_deg = self.lack_deg,
            radius_m = self.curvature_radius,
            next_target = self.current_target,
            "Left corner region"
        );
        CornerTransition {
            kind: TransitKind::InsideOut,
            corner,
            achieved_deg: achieved,
            lack_added_deg: lack_added,
        }
    }

    /// Add `budget - achieved` to the lack and reset both accumulators.
    ///
    /// The first transition of each kind only counts when it achieved at
    /// least `lack_count_threshold` of its budget, so arming halfway through
    /// a segment or a turn does not book a phantom lack.
    fn settle(&mut self, kind: TransitKind, config: &RedirectionConfig, budget: f32, achieved: f32) -> Option<f32> {
        let first = match kind {
            TransitKind::OutsideIn => &mut self.first_outside_in,
            TransitKind::InsideOut => &mut self.first_inside_out,
        };
        let counts = if *first {
            *first = false;
            achieved >= config.lack_count_threshold * budget
        } else {
            true
        };

        self.rotation_gain_accum_deg = 0.0;
        self.curvature_gain_accum_deg = 0.0;

        if counts {
            let added = budget - achieved;
            self.lack_deg += added;
            Some(added)
        } else {
            debug!(kind = kind.name(), achieved, budget, "First transition below threshold, lack unchanged");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdw_core::boundary::{ArmingSignal, WayPointer};
    use rdw_core::types::HeadPose;

    const DT: f32 = 1.0 / 90.0;

    fn armed_state(inside: bool) -> (RedirectionConfig, PhysicalLoop, RedirectionState) {
        let config = RedirectionConfig::default();
        let physical = PhysicalLoop::square(Vec3::zeros(), 3.0);
        let signal = ArmingSignal {
            starting_corner: 0,
            starts_inside: inside,
            pointer: WayPointer {
                position: physical.corner(0),
                heading: physical.segment(0),
            },
        };
        let state = RedirectionState::armed(&config, &physical, &signal, &HeadPose::looking_forward(physical.corner(0)));
        (config, physical, state)
    }

    fn far_corners() -> [Vec3; 1] {
        [Vec3::new(100.0, 0.0, 100.0)]
    }

    #[test]
    fn test_timer_blend_stays_in_unit_range() {
        let mut timer = TransitTimer::default();
        assert!((timer.advance(DT, 0.4, true) - 1.0).abs() < 1e-9);
        assert!(timer.advance(DT, 0.4, false).abs() < 1e-9);

        timer.start(0.4);
        let mut last = 0.0;
        for _ in 0..60 {
            let blend = timer.advance(DT, 0.4, true);
            assert!((0.0..=1.0).contains(&blend));
            assert!(blend >= last);
            last = blend;
        }
        assert!(!timer.is_running());
        assert!((last - 1.0).abs() < 1e-9);

        timer.start(0.4);
        assert!((0.0..=1.0).contains(&timer.advance(5.0, 0.4, false)));
        assert!(timer.remaining_s().abs() < 1e-9);
    }

    #[test]
    fn test_timer_ignores_invalid_dt() {
        let mut timer = TransitTimer::default();
        timer.start(0.4);
        let blend = timer.advance(f32::NAN, 0.4, false);
        assert!((blend - 1.0).abs() < 1e-6);
        let blend = timer.advance(-1.0, 0.4, false);
        assert!((blend - 1.0).abs() < 1e-6);
        assert!(timer.is_running());
    }

    #[test]
    fn test_half_blend() {
        let mut timer = TransitTimer::default();
        timer.start(0.4);
        let blend = timer.advance(0.2, 0.4, true);
        assert!((blend - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_hysteresis_requires_leave_distance() {
        let (config, physical, mut state) = armed_state(true);
        let corner = physical.corner(0);

        // 0.48m is between the enter and leave radii: still inside
        let head = corner + Vec3::new(0.48, 0.0, 0.0);
        let outcome = state.evaluate_transit(&config, &physical, &far_corners(), &head, DT);
        assert!(outcome.transition.is_none());
        assert!(state.is_inside());

        let head = corner + Vec3::new(0.55, 0.0, 0.0);
        let outcome = state.evaluate_transit(&config, &physical, &far_corners(), &head, DT);
        let transition = outcome.transition.unwrap();
        assert_eq!(transition.kind, TransitKind::InsideOut);
        assert_eq!(transition.corner, 0);
        assert!(!state.is_inside());
        assert_eq!(state.current_target(), 1);
    }

    #[test]
    fn test_oscillation_between_thresholds_fires_once() {
        let (config, physical, mut state) = armed_state(false);
        let corner = physical.corner(1);
        let mut transitions = 0;

        for i in 0..400 {
            let offset = if i % 2 == 0 { 0.3 } else { 0.48 };
            let head = corner + Vec3::new(0.0, 0.0, offset);
            let outcome = state.evaluate_transit(&config, &physical, &far_corners(), &head, DT);
            if let Some(transition) = outcome.transition {
                assert_eq!(transition.kind, TransitKind::OutsideIn);
                transitions += 1;
            }
        }
        assert_eq!(transitions, 1);
        assert!(state.is_inside());
    }

    #[test]
    fn test_no_detection_during_transit() {
        let (config, physical, mut state) = armed_state(true);
        let outside = physical.corner(0) + Vec3::new(1.5, 0.0, 0.0);
        let inside = physical.corner(1) + Vec3::new(-0.1, 0.0, 0.0);

        assert!(state
            .evaluate_transit(&config, &physical, &far_corners(), &outside, DT)
            .transition
            .is_some());
        // Immediately at the next corner, but the blend is still running
        assert!(state
            .evaluate_transit(&config, &physical, &far_corners(), &inside, DT)
            .transition
            .is_none());

        for _ in 0..40 {
            state.evaluate_transit(&config, &physical, &far_corners(), &outside, DT);
        }
        assert!(!state.in_transit());
        let outcome = state.evaluate_transit(&config, &physical, &far_corners(), &inside, DT);
        assert_eq!(outcome.transition.map(|t| t.kind), Some(TransitKind::OutsideIn));
    }

    #[test]
    fn test_accumulators_reset_on_every_transition() {
        let (config, physical, mut state) = armed_state(true);
        state.rotation_gain_accum_deg = 11.0;
        state.curvature_gain_accum_deg = 1.5;

        let outside = physical.corner(0) + Vec3::new(1.5, 0.0, 0.0);
        state.evaluate_transit(&config, &physical, &far_corners(), &outside, DT);
        assert!(state.rotation_gain_accum_deg().abs() < 1e-9);
        assert!(state.curvature_gain_accum_deg().abs() < 1e-9);

        for _ in 0..40 {
            state.evaluate_transit(&config, &physical, &far_corners(), &outside, DT);
        }
        state.rotation_gain_accum_deg = 0.5;
        state.curvature_gain_accum_deg = 16.0;
        let inside = physical.corner(1);
        state.evaluate_transit(&config, &physical, &far_corners(), &inside, DT);
        assert!(state.rotation_gain_accum_deg().abs() < 1e-9);
        assert!(state.curvature_gain_accum_deg().abs() < 1e-9);
    }

    #[test]
    fn test_lack_accumulates_budget_shortfall() {
        let (config, physical, mut state) = armed_state(true);
        let outside = physical.corner(0) + Vec3::new(1.5, 0.0, 0.0);

        // First inside-out achieves 10 of 13 (above 40%), lack = 3
        state.rotation_gain_accum_deg = 10.0;
        let transition = state
            .evaluate_transit(&config, &physical, &far_corners(), &outside, DT)
            .transition
            .unwrap();
        assert!((transition.lack_added_deg.unwrap() - 3.0).abs() < 1e-5);
        assert!((state.lack_deg() - 3.0).abs() < 1e-5);

        // New arc is tighter than the lack-free one
        let lack_free = crate::curvature::curvature_radius(&config, 0.0).unwrap();
        assert!(state.curvature_radius() < lack_free);
        let expected = crate::curvature::curvature_radius(&config, 3.0).unwrap();
        assert!((state.curvature_radius() - expected).abs() < 1e-4);

        for _ in 0..40 {
            state.evaluate_transit(&config, &physical, &far_corners(), &outside, DT);
        }

        // First outside-in achieves 15 of 17, lack = 3 + 2
        state.curvature_gain_accum_deg = 15.0;
        let inside = physical.corner(1);
        let transition = state
            .evaluate_transit(&config, &physical, &far_corners(), &inside, DT)
            .transition
            .unwrap();
        assert!((transition.lack_added_deg.unwrap() - 2.0).abs() < 1e-5);
        assert!((state.lack_deg() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_overshoot_pays_lack_back() {
        let (config, physical, mut state) = armed_state(true);
        let wait = |state: &mut RedirectionState, head: &Vec3| {
            for _ in 0..40 {
                state.evaluate_transit(&config, &physical, &far_corners(), head, DT);
            }
        };

        // First of each kind: lack 3 + 2
        state.rotation_gain_accum_deg = 10.0;
        let outside = physical.corner(0) + Vec3::new(1.5, 0.0, 0.0);
        state.evaluate_transit(&config, &physical, &far_corners(), &outside, DT);
        wait(&mut state, &outside);
        state.curvature_gain_accum_deg = 15.0;
        let inside = physical.corner(1);
        state.evaluate_transit(&config, &physical, &far_corners(), &inside, DT);
        wait(&mut state, &inside);
        assert!((state.lack_deg() - 5.0).abs() < 1e-5);

        // Exactly on budget
        state.rotation_gain_accum_deg = 13.0;
        let outside = physical.corner(1) + Vec3::new(0.0, 0.0, 1.5);
        let transition = state
            .evaluate_transit(&config, &physical, &far_corners(), &outside, DT)
            .transition
            .unwrap();
        assert!(transition.lack_added_deg.unwrap().abs() < 1e-5);
        wait(&mut state, &outside);
        let radius_before = state.curvature_radius();

        // 20 of 17 reduces the lack
        state.curvature_gain_accum_deg = 20.0;
        let inside = physical.corner(2);
        let transition = state
            .evaluate_transit(&config, &physical, &far_corners(), &inside, DT)
            .transition
            .unwrap();
        assert_eq!(transition.kind, TransitKind::OutsideIn);
        assert!((transition.lack_added_deg.unwrap() + 3.0).abs() < 1e-5);
        assert!((state.lack_deg() - 2.0).abs() < 1e-5);
        // The arc is only re-planned when leaving a corner
        assert!((state.curvature_radius() - radius_before).abs() < 1e-6);
    }

    #[test]
    fn test_first_transition_below_threshold_is_exempt() {
        let (config, physical, mut state) = armed_state(true);
        let outside = physical.corner(0) + Vec3::new(1.5, 0.0, 0.0);

        // 2 of 13 is below 40%
        state.rotation_gain_accum_deg = 2.0;
        let transition = state
            .evaluate_transit(&config, &physical, &far_corners(), &outside, DT)
            .transition
            .unwrap();
        assert!(transition.lack_added_deg.is_none());
        assert!(state.lack_deg().abs() < 1e-9);

        for _ in 0..40 {
            state.evaluate_transit(&config, &physical, &far_corners(), &outside, DT);
        }
        let inside = physical.corner(1);
        state.evaluate_transit(&config, &physical, &far_corners(), &inside, DT);
        for _ in 0..40 {
            state.evaluate_transit(&config, &physical, &far_corners(), &inside, DT);
        }

        // The second inside-out always counts
        state.rotation_gain_accum_deg = 2.0;
        let outside = physical.corner(1) + Vec3::new(0.0, 0.0, 1.5);
        let transition = state
            .evaluate_transit(&config, &physical, &far_corners(), &outside, DT)
            .transition
            .unwrap();
        assert!((transition.lack_added_deg.unwrap() - 11.0).abs() < 1e-5);
    }

    #[test]
    fn test_virtual_target_advances() {
        let (config, physical, mut state) = armed_state(true);
        let virtual_corners = [Vec3::new(5.0, 0.0, 5.0), Vec3::new(8.0, 0.0, 5.0)];
        let head = Vec3::new(8.1, 0.0, 5.0);

        let outcome = state.evaluate_transit(&config, &physical, &virtual_corners, &head, DT);
        assert_eq!(outcome.virtual_reached, Some(1));
        assert_eq!(state.current_virtual_target(), 2);

        // Standing on it does not advance again
        let outcome = state.evaluate_transit(&config, &physical, &virtual_corners, &head, DT);
        assert!(outcome.virtual_reached.is_none());
        assert_eq!(state.current_virtual_target(), 2);
    }
}
