//! Translation gain.
//!
//! Curvature keeps the user on the arc but the arc between two physical
//! corners is not exactly as long as the remaining virtual path. Translation
//! gain stretches or shrinks forward steps to reconcile the two distances.

use serde::Serialize;

use rdw_core::geometry::{flatten, planar_direction, planar_length, EPSILON};
use rdw_core::types::Vec3;

use crate::config::RedirectionConfig;

/// Everything the translation gain reads for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TranslationInputs {
    /// Head position in tracking space.
    pub head: Vec3,
    /// Head forward direction.
    pub forward: Vec3,
    /// Planar head movement this tick.
    pub delta_position: Vec3,
    /// Physical corner the user is walking to.
    pub physical_target: Vec3,
    /// Virtual corner the user is walking to, in tracking space.
    pub virtual_target: Vec3,
    /// Transit blend.
    pub blend: f32,
}

/// A computed translation correction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TranslationGain {
    /// Physical-to-virtual remaining distance ratio before clamping.
    pub raw_rate: f32,
    /// Ratio after clamping to the configured limits.
    pub rate: f32,
    /// World offset to apply this tick.
    pub offset: Vec3,
}

/// Compute the correction for one tick without applying it.
///
/// `None` when the remaining virtual distance or the forward direction is
/// degenerate.
#[must_use]
pub fn compute_translation_gain(config: &RedirectionConfig, inputs: &TranslationInputs) -> Option<TranslationGain> {
    let physical_remaining = planar_length(&(inputs.physical_target - inputs.head));
    let virtual_remaining = planar_length(&(inputs.virtual_target - inputs.head));
    if virtual_remaining <= EPSILON {
        return None;
    }
    let forward = planar_direction(&inputs.forward)?;

    let raw_rate = physical_remaining / virtual_remaining;
    if !raw_rate.is_finite() {
        return None;
    }
    let rate = raw_rate.clamp(
        1.0 - config.translation_down_limit,
        1.0 + config.translation_up_limit,
    );

    let along = forward.dot(&flatten(&inputs.delta_position));
    let offset = (rate - 1.0) * forward * along * (1.0 - inputs.blend);

    Some(TranslationGain { raw_rate, rate, offset })
}
