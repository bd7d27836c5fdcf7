//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Frame Model
//! - Frame numbers come from the simulator and are the only ordering key
//! - Cameras are keyed by their 1-based registration ordinal (`camera_<i>`)

mod blueprint;
mod camera_id;
mod error;
mod frame;
mod geometry;
mod runtime;

pub use blueprint::*;
pub use camera_id::CameraId;
pub use error::*;
pub use frame::*;
pub use geometry::*;
pub use runtime::*;
