//! RDW Controller - redirected walking gains
//!
//! Keeps a user walking a virtual hexagon of straight paths inside a small
//! physical square by turning the virtual world a little at a time:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Redirection Pipeline                             │
//! │                                                                         │
//! │  ┌──────────────┐    ┌───────────────────┐    ┌────────────────────┐   │
//! │  │ PoseSource   │    │ Corner Transit    │    │ Rotation Gain      │   │
//! │  │              │───▶│                   │───▶│ (turning, blend 1) │   │
//! │  │ head pose    │    │ hysteresis, blend │    └─────────┬──────────┘   │
//! │  │ suspend      │    │ lack ledger, arc  │              │              │
//! │  └──────────────┘    └───────────────────┘              ▼              │
//! │                                              ┌────────────────────┐    │
//! │  ┌──────────────┐                            │ Curvature Gain     │    │
//! │  │ WorldPose    │◀───────────────────────────│ + counter-deviation│    │
//! │  │              │                            │ Translation Gain   │    │
//! │  │ virtual world│                            │ (walking, blend 0) │    │
//! │  └──────────────┘                            └────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use rdw_controller::engine::{PoseSource, WorldTransform};
//! use rdw_controller::provider::StaticWaypoints;
//! use rdw_controller::{RedirectionConfig, RedirectionController};
//! use rdw_core::loops::{PhysicalLoop, VirtualLoop};
//! use rdw_core::types::{HeadPose, Vec3};
//!
//! struct Standing;
//!
//! impl PoseSource for Standing {
//!     fn head_pose(&self) -> HeadPose {
//!         HeadPose::looking_forward(Vec3::new(-1.5, 1.7, -1.5))
//!     }
//! }
//!
//! let physical = PhysicalLoop::square(Vec3::zeros(), 3.0);
//! let mut rdw = RedirectionController::new(
//!     RedirectionConfig::default(),
//!     VirtualLoop::hexagon(Vec3::zeros(), 3.0),
//!     Standing,
//!     WorldTransform::identity(),
//!     StaticWaypoints::new(physical, 0),
//! )
//! .expect("default configuration is valid");
//!
//! let telemetry = rdw.tick(1.0 / 90.0).expect("static waypoints arm immediately");
//! assert_eq!(telemetry.current_target, 0);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod controller;
pub mod curvature;
pub mod engine;
pub mod provider;
pub mod rotation;
pub mod state;
pub mod telemetry;
pub mod transit;
pub mod translation;

pub use config::{ConfigError, GainSet, RedirectionConfig, RedirectionPreset};
pub use controller::RedirectionController;
pub use engine::{PoseSource, WorldPose, WorldTransform};
pub use provider::{BoundaryWaypoints, StaticWaypoints, WaypointProvider};
pub use state::RedirectionState;
pub use telemetry::Telemetry;
pub use transit::CornerTransition;
pub use translation::TranslationGain;
