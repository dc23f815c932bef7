//! Error types for boundary setup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while deriving turning points from the play area.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoundaryError {
    /// A corner's outgoing or following edge is shorter than a path segment.
    #[error(
        "insufficient space at corner {corner}: edges {forward_m:.2}m and {next_m:.2}m, need {required_m:.2}m"
    )]
    InsufficientSpace {
        /// Boundary corner whose way pointer could not be placed
        corner: usize,
        /// Length of the edge leaving the corner
        forward_m: f32,
        /// Length of the edge after that
        next_m: f32,
        /// Minimum edge length
        required_m: f32,
    },

    /// A boundary point is NaN or infinite.
    #[error("boundary point {index} is not finite")]
    NonFinitePoint {
        /// Index of the offending point
        index: usize,
    },
}
