//! Actor Factory error types

use contracts::{ActorId, ContractError};
use thiserror::Error;

/// Actor Factory specific error
#[derive(Debug, Error)]
pub enum ActorFactoryError {
    /// CARLA connection error
    #[error("failed to connect to CARLA: {message}")]
    ConnectionFailed { message: String },

    /// Blueprint lookup error
    #[error("blueprint '{pattern}' not found")]
    BlueprintNotFound { pattern: String },

    /// The map offers no spawn points
    #[error("map has no spawn points")]
    NoSpawnPoints,

    /// Placement conflict at the chosen spawn point
    #[error("spawn of '{blueprint}' collided at {location}")]
    SpawnCollision { blueprint: String, location: String },

    /// Every spawn attempt for a vehicle collided
    #[error("vehicle #{vehicle_index} not spawned after {attempts} attempts")]
    SpawnExhausted { vehicle_index: usize, attempts: usize },

    /// Vehicle spawn error
    #[error("failed to spawn vehicle '{blueprint}': {message}")]
    VehicleSpawnFailed { blueprint: String, message: String },

    /// Camera spawn error
    #[error("failed to spawn camera '{camera}' on vehicle {vehicle_id}: {message}")]
    CameraSpawnFailed {
        camera: String,
        vehicle_id: ActorId,
        message: String,
    },

    /// Actor unknown to the client
    #[error("actor {actor_id} not found")]
    ActorNotFound { actor_id: ActorId },

    /// Destroy error
    #[error("failed to destroy actor {actor_id}: {message}")]
    DestroyFailed { actor_id: ActorId, message: String },

    /// World settings could not be read or applied
    #[error("world settings error: {message}")]
    SettingsFailed { message: String },

    /// Tick error
    #[error("world tick failed: {message}")]
    TickFailed { message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl ActorFactoryError {
    /// Create vehicle spawn error
    pub fn vehicle_spawn(blueprint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VehicleSpawnFailed {
            blueprint: blueprint.into(),
            message: message.into(),
        }
    }

    /// Create camera spawn error
    pub fn camera_spawn(
        camera: impl Into<String>,
        vehicle_id: ActorId,
        message: impl Into<String>,
    ) -> Self {
        Self::CameraSpawnFailed {
            camera: camera.into(),
            vehicle_id,
            message: message.into(),
        }
    }

    /// Create connection error
    pub fn not_connected() -> Self {
        Self::ConnectionFailed {
            message: "not connected to CARLA server".into(),
        }
    }

    /// True when the error is a placement conflict worth retrying elsewhere
    pub fn is_spawn_collision(&self) -> bool {
        matches!(self, Self::SpawnCollision { .. })
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, ActorFactoryError>;
