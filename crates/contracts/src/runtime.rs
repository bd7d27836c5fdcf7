//! Runtime handles - what the simulator hands back at run time.

use serde::{Deserialize, Serialize};

/// CARLA actor handle type
pub type ActorId = u32;

/// Kind of actor this run spawned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Vehicle,
    Camera,
}

/// World (episode) settings as reported by the simulator
///
/// Snapshotted before the run and re-applied on shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSettings {
    /// Server waits for a client tick before advancing
    pub synchronous_mode: bool,

    /// Fixed simulation step (seconds), `None` = variable step
    pub fixed_delta_seconds: Option<f64>,

    /// Rendering disabled on the server
    #[serde(default)]
    pub no_rendering_mode: bool,
}
