//! The redirection controller.
//!
//! Call [`RedirectionController::tick`] once per rendered frame, or
//! [`early_update`](RedirectionController::early_update) and
//! [`late_update`](RedirectionController::late_update) separately when the
//! host has distinct update phases. The early phase reads the head and
//! settles corner transits; only the late phase moves the world.

use nalgebra::Vector3;
use tracing::{debug, info, warn};

use rdw_core::geometry::planar_distance;
use rdw_core::loops::{PhysicalLoop, VirtualLoop, VIRTUAL_CORNERS};
use rdw_core::types::{FrameTime, HeadPose, Vec3};

use crate::config::{ConfigError, RedirectionConfig};
use crate::curvature::{counter_deviation, curvature_gain_deg, is_moving};
use crate::engine::{align_world, PoseSource, WorldPose};
use crate::provider::WaypointProvider;
use crate::rotation::{is_rotating, rotation_gain_deg};
use crate::state::RedirectionState;
use crate::telemetry::Telemetry;
use crate::transit::TransitOutcome;
use crate::translation::{compute_translation_gain, TranslationGain, TranslationInputs};

/// Per-tick results carried from the early to the late phase.
#[derive(Clone, Copy, Debug, Default)]
struct PendingTick {
    active: bool,
    transit: TransitOutcome,
}

/// Applies rotation, curvature and translation gain to a virtual world.
pub struct RedirectionController<S, W, B> {
    config: RedirectionConfig,
    virtual_loop: VirtualLoop,
    source: S,
    world: W,
    provider: B,
    physical: Option<PhysicalLoop>,
    state: Option<RedirectionState>,
    enabled: bool,
    frame: FrameTime,
    pending: PendingTick,
}

impl<S, W, B> RedirectionController<S, W, B>
where
    S: PoseSource,
    W: WorldPose,
    B: WaypointProvider,
{
    /// Create a controller. Redirection arms once `provider` says so.
    pub fn new(
        config: RedirectionConfig,
        virtual_loop: VirtualLoop,
        source: S,
        world: W,
        provider: B,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            virtual_loop,
            source,
            world,
            provider,
            physical: None,
            state: None,
            enabled: true,
            frame: FrameTime::first(90.0),
            pending: PendingTick::default(),
        })
    }

    /// Turn gain application on or off. State is kept either way.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            info!(enabled, "Redirection toggled");
        }
        self.enabled = enabled;
    }

    /// Whether gain application is switched on.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the provider has armed redirection.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state.is_some()
    }

    /// Controller state, once armed.
    #[must_use]
    pub fn state(&self) -> Option<&RedirectionState> {
        self.state.as_ref()
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &RedirectionConfig {
        &self.config
    }

    /// Physical loop, once armed.
    #[must_use]
    pub fn physical_loop(&self) -> Option<&PhysicalLoop> {
        self.physical.as_ref()
    }

    /// Virtual loop in world-local space.
    #[must_use]
    pub fn virtual_loop(&self) -> &VirtualLoop {
        &self.virtual_loop
    }

    /// The virtual world pose.
    #[must_use]
    pub fn world(&self) -> &W {
        &self.world
    }

    /// The pose source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the pose source, for hosts that feed it directly.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The waypoint provider.
    #[must_use]
    pub fn provider(&self) -> &B {
        &self.provider
    }

    /// Mutable access to the provider, e.g. to update the play area.
    pub fn provider_mut(&mut self) -> &mut B {
        &mut self.provider
    }

    /// Timing of the last tick.
    #[must_use]
    pub fn frame(&self) -> FrameTime {
        self.frame
    }

    /// Virtual corner `index` in tracking space.
    #[must_use]
    pub fn virtual_corner_world(&self, index: usize) -> Vec3 {
        self.world.transform_point(&self.virtual_loop.corner(index))
    }

    /// Run both phases for one frame.
    pub fn tick(&mut self, dt: f32) -> Option<Telemetry> {
        self.early_update(dt);
        self.late_update(dt)
    }

    /// Sample the head, arm if possible, detect corner transits and update
    /// the blend. The world is not touched.
    pub fn early_update(&mut self, dt: f32) {
        self.frame = self.frame.advance(dt);
        self.pending = PendingTick::default();

        let pose = self.source.head_pose();
        if self.state.is_none() {
            self.try_arm(&pose);
        }
        let (Some(state), Some(physical)) = (self.state.as_mut(), self.physical.as_ref()) else {
            return;
        };

        state.history.sample(&pose);
        let active = self.enabled && !self.source.suspend_requested();
        self.pending.active = active;
        if !active {
            // Refresh the history so resuming does not apply a jump
            state.history.commit();
            return;
        }

        let head = state.history.position();
        let mut virtual_corners = [Vec3::zeros(); VIRTUAL_CORNERS];
        for (slot, corner) in virtual_corners.iter_mut().zip(self.virtual_loop.corners()) {
            *slot = self.world.transform_point(corner);
        }
        self.pending.transit = state.evaluate_transit(&self.config, physical, &virtual_corners, &head, dt);
    }

    /// Compute rotation, curvature and translation gain, apply them to the
    /// world, commit the head history and report telemetry. `None` until
    /// armed.
    pub fn late_update(&mut self, dt: f32) -> Option<Telemetry> {
        let (Some(state), Some(physical)) = (self.state.as_mut(), self.physical.as_ref()) else {
            return None;
        };

        let mut rotation = None;
        let mut curvature = None;
        let mut translation = None;
        if self.pending.active && self.frame.has_valid_delta() {
            let head = state.history.position();
            let delta_yaw = state.history.delta_yaw_deg();

            if self.config.gains.rotation && is_rotating(&self.config, delta_yaw, dt) {
                let degrees = rotation_gain_deg(&self.config, delta_yaw, state.blend);
                if degrees.is_finite() {
                    rotation = Some(degrees);
                } else {
                    warn!(delta_yaw, "Non-finite rotation gain skipped");
                }
            }

            if is_moving(&self.config, state.history.step_m(), dt) {
                if self.config.gains.curvature {
                    let base = curvature_gain_deg(state.history.step_m(), state.curvature_radius, state.blend);
                    let diff = planar_distance(&head, &state.turning_center) - state.curvature_radius;
                    let degrees = base + counter_deviation(&self.config, diff, base);
                    if degrees.is_finite() {
                        curvature = Some(degrees);
                    } else {
                        warn!(diff, radius = state.curvature_radius, "Non-finite curvature gain skipped");
                    }
                }

                if self.config.gains.translation {
                    let inputs = translation_inputs(state, physical, &self.virtual_loop, &self.world);
                    translation = compute_translation_gain(&self.config, &inputs);
                }
            }

            // Every correction is computed before the world moves
            if let Some(degrees) = rotation {
                self.world.rotate_around(&head, &Vector3::y_axis(), degrees);
                state.rotation_gain_accum_deg += degrees.abs();
                debug!(degrees, delta_yaw, blend = state.blend, "Rotation gain");
            }
            if let Some(degrees) = curvature {
                self.world.rotate_around(&head, &Vector3::y_axis(), -degrees);
                state.curvature_gain_accum_deg += degrees;
                debug!(degrees, radius = state.curvature_radius, "Curvature gain");
            }
            if let Some(gain) = &translation {
                self.world.translate(&gain.offset);
                debug!(rate = gain.rate, raw_rate = gain.raw_rate, "Translation gain");
            }
        }

        let mut telemetry = Telemetry::capture(state, self.frame.frame_number, self.frame.elapsed_s, self.pending.active);
        telemetry.translation = translation;
        telemetry.transition = self.pending.transit.transition;
        telemetry.virtual_reached = self.pending.transit.virtual_reached;

        state.history.commit();
        // A second late phase without a new sample applies nothing
        self.pending = PendingTick::default();
        Some(telemetry)
    }

    /// Translation correction for the current state, without applying it.
    #[must_use]
    pub fn translation_gain(&self) -> Option<TranslationGain> {
        let (Some(state), Some(physical)) = (self.state.as_ref(), self.physical.as_ref()) else {
            return None;
        };
        let inputs = translation_inputs(state, physical, &self.virtual_loop, &self.world);
        compute_translation_gain(&self.config, &inputs)
    }

    fn try_arm(&mut self, pose: &HeadPose) {
        let Some(signal) = self.provider.arming(pose) else {
            return;
        };
        let Some(physical) = self.provider.physical_loop() else {
            warn!("Arming signal without a physical loop, waiting");
            return;
        };

        if self.config.align_world_on_arming && !align_world(&mut self.world, &signal.pointer) {
            warn!(corner = signal.starting_corner, "Degenerate way pointer, world left unaligned");
        }

        let state = RedirectionState::armed(&self.config, &physical, &signal, pose);
        info!(
            corner = state.current_target(),
            inside = state.is_inside(),
            radius_m = state.curvature_radius(),
            "Redirection armed"
        );
        self.physical = Some(physical);
        self.state = Some(state);
    }
}

fn translation_inputs<W: WorldPose>(
    state: &RedirectionState,
    physical: &PhysicalLoop,
    virtual_loop: &VirtualLoop,
    world: &W,
) -> TranslationInputs {
    TranslationInputs {
        head: state.history.position(),
        forward: state.history.direction(),
        delta_position: state.history.delta_position(),
        physical_target: physical.corner(state.current_target),
        virtual_target: world.transform_point(&virtual_loop.corner(state.current_virtual_target)),
        blend: state.blend,
    }
}
