//! # Actor Factory
//!
//! CARLA asset factory module.
//!
//! Responsibilities:
//! - Abstract the simulator behind `SimulatorClient`
//! - Spawn vehicles (random blueprint, random spawn point, bounded retry)
//! - Attach one camera per vehicle
//! - Record owned actors and provide teardown and rollback
//! - Provide a mock simulator for tests and server-less runs
//!
//! ## Feature Flags
//!
//! - `real-carla`: Enable real CARLA client (requires carla crate and libcarla)

pub mod client;
pub mod error;
pub mod factory;
pub mod mock_client;
pub mod registry;
pub mod rig;
pub mod spawner;

#[cfg(feature = "real-carla")]
pub mod carla_camera;
#[cfg(feature = "real-carla")]
pub mod carla_client;

pub use client::SimulatorClient;
pub use contracts::{ActorId, ActorKind, WorldSettings};
pub use error::{ActorFactoryError, Result};
pub use factory::{ActorFactory, TeardownReport};
pub use mock_client::{grid_spawn_points, MockConfig, MockSimulatorClient};
pub use registry::{ActorRegistry, OwnedCamera};
pub use rig::{CameraBinding, CameraRig};
pub use spawner::{SpawnedFleet, VehicleSpawner};

#[cfg(feature = "real-carla")]
pub use carla_client::RealCarlaClient;
