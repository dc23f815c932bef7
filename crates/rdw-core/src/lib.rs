//! RDW Core - geometry and waypoint types for redirected walking
//!
//! This crate provides the shared vocabulary of the redirection system: head
//! poses, horizontal-plane geometry, the physical and virtual walking loops,
//! and the play-area processing that produces the physical loop.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Boundary / Waypoint Provider                      │
//! │  ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────────┐  │
//! │  │ PlayArea        │───▶│ TurningPoints   │───▶│ PhysicalLoop (4)    │  │
//! │  │ (raw boundary)  │    │ + arrow heading │    │                     │  │
//! │  └─────────────────┘    └────────┬────────┘    └──────────┬──────────┘  │
//! │                                  ▼                        │             │
//! │                    ┌─────────────────────────┐            │             │
//! │                    │ Onboarding → Arming     │            │             │
//! │                    └─────────────────────────┘            ▼             │
//! │                                              to the redirection         │
//! │                                              controller                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use rdw_core::boundary::{BoundaryParams, PlayArea};
//!
//! let area = PlayArea::rectangle(4.0, 4.0);
//! let points = area.turning_points(&BoundaryParams::default());
//! let physical = points.to_physical_loop().expect("4m x 4m fits a 3m loop");
//! assert!((physical.segment(0).norm() - 3.0).abs() < 1e-4);
//! ```

#![warn(missing_docs)]

pub mod boundary;
pub mod error;
pub mod geometry;
pub mod loops;
pub mod types;

pub use boundary::{ArmingSignal, BoundaryParams, Onboarding, PlayArea, TurningPoints, WayPointer};
pub use error::BoundaryError;
pub use geometry::{closest_point, flatten, planar_distance, signed_yaw_deg, CornerHit};
pub use loops::{PhysicalLoop, VirtualLoop, PHYSICAL_CORNERS, VIRTUAL_CORNERS};
pub use types::{is_valid_delta, FrameTime, HeadPose, TransitKind, Vec3};
