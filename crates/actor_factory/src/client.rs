//! Simulator client abstraction
//!
//! Defines the trait for interacting with CARLA, supporting real implementation and mock testing.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use contracts::{ActorId, FrameCallback, Transform, Vector3, WorldSettings};

use crate::error::Result;

/// Simulator client trait
///
/// Abstracts the CARLA operations a capture run needs.
/// Supports unified interface for real CARLA client and Mock client.
pub trait SimulatorClient: Send + Sync {
    /// Connect to CARLA server
    ///
    /// `timeout` bounds every subsequent RPC.
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Current world settings
    fn world_settings(&self) -> impl Future<Output = Result<WorldSettings>> + Send;

    /// Apply world settings
    fn apply_world_settings(
        &self,
        settings: &WorldSettings,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Vehicle blueprint ids matching a wildcard filter, e.g. "vehicle.*"
    fn vehicle_blueprints(
        &self,
        filter: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Look up a single blueprint by exact id
    ///
    /// Returns `ActorFactoryError::BlueprintNotFound` if the library lacks it.
    fn find_blueprint(&self, id: &str) -> impl Future<Output = Result<String>> + Send;

    /// Recommended spawn points of the current map
    fn spawn_points(&self) -> impl Future<Output = Result<Vec<Transform>>> + Send;

    /// Spawn vehicle
    ///
    /// A placement conflict returns `ActorFactoryError::SpawnCollision`.
    fn spawn_vehicle(
        &self,
        blueprint: &str,
        transform: Transform,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Set vehicle target velocity
    fn set_target_velocity(
        &self,
        vehicle_id: ActorId,
        velocity: Vector3,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Spawn camera and attach to parent vehicle
    ///
    /// # Arguments
    /// * `blueprint` - Blueprint name, e.g., "sensor.camera.rgb"
    /// * `transform` - Pose relative to parent actor
    /// * `parent_id` - Parent actor ID
    /// * `attributes` - Blueprint attributes applied before spawning
    fn spawn_camera(
        &self,
        blueprint: &str,
        transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Register frame callback
    ///
    /// The callback runs on the client's delivery thread.
    fn listen(&self, camera_id: ActorId, callback: FrameCallback) -> Result<()>;

    /// Stop frame delivery; idempotent
    fn stop_listening(&self, camera_id: ActorId) -> Result<()>;

    /// Rewrite camera attributes on a live camera
    fn set_camera_attributes(
        &self,
        camera_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Advance one synchronous step, returning the new world frame number
    fn tick(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Every actor currently alive in the world, including foreign ones
    fn world_actor_ids(&self) -> impl Future<Output = Result<Vec<ActorId>>> + Send;

    /// Destroy actor
    ///
    /// Idempotent operation: returns Ok if actor doesn't exist
    fn destroy_actor(&self, actor_id: ActorId) -> impl Future<Output = Result<()>> + Send;

    /// Batch destroy, returning how many actors were destroyed
    fn destroy_actors(&self, actor_ids: &[ActorId]) -> impl Future<Output = Result<usize>> + Send;
}

/// Glob-style match used for blueprint filters ("vehicle.*", "*.tesla.*")
pub fn matches_pattern(pattern: &str, id: &str) -> bool {
    fn go(p: &[u8], s: &[u8]) -> bool {
        match (p.first(), s.first()) {
            (None, None) => true,
            (Some(b'*'), _) => go(&p[1..], s) || (!s.is_empty() && go(p, &s[1..])),
            (Some(pc), Some(sc)) if pc == sc => go(&p[1..], &s[1..]),
            _ => false,
        }
    }
    go(pattern.as_bytes(), id.as_bytes())
}
