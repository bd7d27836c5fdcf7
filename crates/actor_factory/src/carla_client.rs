//! Real CARLA client implementation
//!
//! Connects to CARLA server using carla-rust crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use carla::client::{ActorBase, Client, Sensor, Vehicle, World};
use carla::geom::{Location, Rotation, Transform as CarlaTransform};
use contracts::{ActorId, FrameCallback, Transform, Vector3, WorldSettings};
use tracing::{debug, info, instrument, warn};

use crate::carla_camera::CarlaCamera;
use crate::client::{matches_pattern, SimulatorClient};
use crate::error::{ActorFactoryError, Result};

/// Real CARLA client
///
/// Wraps carla-rust's Client, implements SimulatorClient trait.
/// Uses Mutex for interior mutability, allowing `&self` methods to modify World.
#[derive(Default, Clone)]
pub struct RealCarlaClient {
    /// CARLA client
    client: Arc<Mutex<Option<Client>>>,
    /// World reference (uses Mutex for interior mutability)
    world: Arc<Mutex<Option<World>>>,
    /// Created actors list (for teardown)
    actors: Arc<Mutex<HashMap<ActorId, ActorType>>>,
}

/// Actor type enumeration
#[derive(Clone)]
enum ActorType {
    Vehicle(Vehicle),
    Camera(CarlaCamera),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RealCarlaClient {
    /// Create new client (disconnected state)
    pub fn new() -> Self {
        Self::default()
    }

    /// Access World with mutable reference, ensuring connected
    fn with_world_mut<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut World) -> Result<R>,
    {
        let mut world_guard = lock(&self.world);
        let world = world_guard
            .as_mut()
            .ok_or_else(ActorFactoryError::not_connected)?;
        f(world)
    }

    /// Save actor to registry for teardown
    fn store_actor(&self, actor_id: ActorId, actor: ActorType) {
        lock(&self.actors).insert(actor_id, actor);
    }

    fn camera(&self, actor_id: ActorId) -> Result<CarlaCamera> {
        match lock(&self.actors).get(&actor_id) {
            Some(ActorType::Camera(camera)) => Ok(camera.clone()),
            _ => Err(ActorFactoryError::ActorNotFound { actor_id }),
        }
    }

    fn vehicle(&self, actor_id: ActorId) -> Result<Vehicle> {
        match lock(&self.actors).get(&actor_id) {
            Some(ActorType::Vehicle(v)) => Ok(v.clone()),
            _ => Err(ActorFactoryError::ActorNotFound { actor_id }),
        }
    }

    fn create_vehicle(world: &mut World, blueprint: &str, transform: Transform) -> Result<Vehicle> {
        let vehicle_bp = world.blueprint_library().find(blueprint).ok_or_else(|| {
            ActorFactoryError::BlueprintNotFound {
                pattern: blueprint.to_string(),
            }
        })?;

        let actor = world
            .spawn_actor(&vehicle_bp, &to_carla_transform(transform))
            .map_err(|e| {
                let message = e.to_string();
                // CARLA reports placement conflicts as a collision at the spawn position
                if message.to_lowercase().contains("collision") {
                    ActorFactoryError::SpawnCollision {
                        blueprint: blueprint.to_string(),
                        location: transform.location.to_string(),
                    }
                } else {
                    ActorFactoryError::vehicle_spawn(blueprint, message)
                }
            })?;

        Vehicle::try_from(actor)
            .map_err(|_| ActorFactoryError::vehicle_spawn(blueprint, "spawned actor is not a vehicle"))
    }

    fn create_camera(
        world: &mut World,
        blueprint: &str,
        transform: Transform,
        parent_actor: &Vehicle,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<Sensor> {
        let mut camera_bp = world.blueprint_library().find(blueprint).ok_or_else(|| {
            ActorFactoryError::BlueprintNotFound {
                pattern: blueprint.to_string(),
            }
        })?;

        for (key, value) in attributes {
            if !camera_bp.set_attribute(key, value) {
                warn!(key, value, "failed to set camera attribute");
            }
        }

        let actor = world
            .spawn_actor_attached(
                &camera_bp,
                &to_carla_transform(transform),
                parent_actor,
                None,
            )
            .map_err(|e| ActorFactoryError::camera_spawn(blueprint, parent_id, e.to_string()))?;

        Sensor::try_from(actor).map_err(|_| {
            ActorFactoryError::camera_spawn(blueprint, parent_id, "spawned actor is not a sensor")
        })
    }

    fn destroy_stored(actor: ActorType, actor_id: ActorId) {
        let destroyed = match actor {
            ActorType::Vehicle(v) => v.destroy(),
            ActorType::Camera(c) => c.destroy(),
        };
        if !destroyed {
            warn!(actor_id, "destroy returned false");
        }
    }
}

/// Convert internal Transform to CARLA Transform
fn to_carla_transform(transform: Transform) -> CarlaTransform {
    let location = Location {
        x: transform.location.x as f32,
        y: transform.location.y as f32,
        z: transform.location.z as f32,
    };
    let rotation = Rotation {
        pitch: transform.rotation.pitch as f32,
        yaw: transform.rotation.yaw as f32,
        roll: transform.rotation.roll as f32,
    };
    CarlaTransform { location, rotation }
}

fn from_carla_transform(transform: &CarlaTransform) -> Transform {
    Transform::new(
        contracts::Location::new(
            transform.location.x as f64,
            transform.location.y as f64,
            transform.location.z as f64,
        ),
        contracts::Rotation::new(
            transform.rotation.pitch as f64,
            transform.rotation.yaw as f64,
            transform.rotation.roll as f64,
        ),
    )
}

impl SimulatorClient for RealCarlaClient {
    #[instrument(name = "real_carla_connect", skip(self), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        let mut client = Client::connect(host, port, None);
        client.set_timeout(timeout);
        let world = client.world();

        info!(
            map = %world.map().name(),
            "connected to CARLA server"
        );

        *lock(&self.client) = Some(client);
        *lock(&self.world) = Some(world);

        Ok(())
    }

    async fn world_settings(&self) -> Result<WorldSettings> {
        self.with_world_mut(|world| {
            let settings = world.settings();
            Ok(WorldSettings {
                synchronous_mode: settings.synchronous_mode,
                fixed_delta_seconds: settings.fixed_delta_seconds,
                no_rendering_mode: settings.no_rendering_mode,
            })
        })
    }

    #[instrument(name = "real_carla_apply_settings", skip(self))]
    async fn apply_world_settings(&self, settings: &WorldSettings) -> Result<()> {
        self.with_world_mut(|world| {
            let mut episode = world.settings();
            episode.synchronous_mode = settings.synchronous_mode;
            episode.fixed_delta_seconds = settings.fixed_delta_seconds;
            episode.no_rendering_mode = settings.no_rendering_mode;
            world.apply_settings(&episode, Duration::from_secs(10));
            Ok(())
        })
    }

    async fn vehicle_blueprints(&self, filter: &str) -> Result<Vec<String>> {
        self.with_world_mut(|world| {
            Ok(world
                .blueprint_library()
                .filter(filter)
                .iter()
                .map(|bp| bp.id().to_string())
                .filter(|id| id.starts_with("vehicle.") && matches_pattern(filter, id))
                .collect())
        })
    }

    async fn find_blueprint(&self, id: &str) -> Result<String> {
        self.with_world_mut(|world| {
            world
                .blueprint_library()
                .find(id)
                .map(|bp| bp.id().to_string())
                .ok_or_else(|| ActorFactoryError::BlueprintNotFound {
                    pattern: id.to_string(),
                })
        })
    }

    async fn spawn_points(&self) -> Result<Vec<Transform>> {
        self.with_world_mut(|world| {
            Ok(world
                .map()
                .recommended_spawn_points()
                .iter()
                .map(from_carla_transform)
                .collect())
        })
    }

    #[instrument(
        name = "real_carla_spawn_vehicle",
        skip(self, transform),
        fields(blueprint = %blueprint)
    )]
    async fn spawn_vehicle(&self, blueprint: &str, transform: Transform) -> Result<ActorId> {
        let vehicle =
            self.with_world_mut(|world| Self::create_vehicle(world, blueprint, transform))?;
        let actor_id = vehicle.id();

        debug!(actor_id, blueprint, "vehicle spawned");
        self.store_actor(actor_id, ActorType::Vehicle(vehicle));

        Ok(actor_id)
    }

    async fn set_target_velocity(&self, vehicle_id: ActorId, velocity: Vector3) -> Result<()> {
        let vehicle = self.vehicle(vehicle_id)?;
        vehicle.set_target_velocity(&nalgebra::Vector3::new(
            velocity.x as f32,
            velocity.y as f32,
            velocity.z as f32,
        ));
        Ok(())
    }

    #[instrument(
        name = "real_carla_spawn_camera",
        skip(self, transform, attributes),
        fields(blueprint = %blueprint, parent_id)
    )]
    async fn spawn_camera(
        &self,
        blueprint: &str,
        transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        let parent_actor = self.vehicle(parent_id).map_err(|_| {
            ActorFactoryError::camera_spawn(blueprint, parent_id, "parent vehicle not found")
        })?;
        let sensor = self.with_world_mut(|world| {
            Self::create_camera(
                world,
                blueprint,
                transform,
                &parent_actor,
                parent_id,
                attributes,
            )
        })?;

        let actor_id = sensor.id();
        debug!(actor_id, blueprint, parent_id, "camera spawned and attached");
        self.store_actor(
            actor_id,
            ActorType::Camera(CarlaCamera::new(actor_id, sensor, attributes.clone())),
        );

        Ok(actor_id)
    }

    fn listen(&self, camera_id: ActorId, callback: FrameCallback) -> Result<()> {
        self.camera(camera_id)?.listen(callback);
        Ok(())
    }

    fn stop_listening(&self, camera_id: ActorId) -> Result<()> {
        if let Ok(camera) = self.camera(camera_id) {
            camera.stop();
        }
        Ok(())
    }

    async fn set_camera_attributes(
        &self,
        camera_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<()> {
        self.camera(camera_id)?.record_attributes(attributes);
        Ok(())
    }

    async fn tick(&self) -> Result<u64> {
        self.with_world_mut(|world| Ok(world.tick()))
    }

    async fn world_actor_ids(&self) -> Result<Vec<ActorId>> {
        self.with_world_mut(|world| Ok(world.actors().iter().map(|a| a.id()).collect()))
    }

    #[instrument(name = "real_carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        let actor = lock(&self.actors).remove(&actor_id);
        if let Some(actor) = actor {
            Self::destroy_stored(actor, actor_id);
            debug!(actor_id, "actor destroyed");
        }

        // Idempotent: return Ok even if not exists
        Ok(())
    }

    #[instrument(name = "real_carla_destroy_actors", skip(self, actor_ids), fields(count = actor_ids.len()))]
    async fn destroy_actors(&self, actor_ids: &[ActorId]) -> Result<usize> {
        let mut destroyed = 0;
        for &actor_id in actor_ids {
            let stored = lock(&self.actors).remove(&actor_id);
            if let Some(actor) = stored {
                Self::destroy_stored(actor, actor_id);
                destroyed += 1;
                continue;
            }
            // Actors this client did not spawn are looked up in the world
            let found = self.with_world_mut(|world| Ok(world.actor(actor_id)))?;
            if let Some(actor) = found {
                if actor.destroy() {
                    destroyed += 1;
                } else {
                    warn!(actor_id, "destroy returned false");
                }
            }
        }
        Ok(destroyed)
    }
}
