//! Vehicle spawner
//!
//! Random blueprint + random spawn point, resampling the point on collision.

use contracts::{ActorId, FleetConfig, Transform, Vector3};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

use crate::client::SimulatorClient;
use crate::error::{ActorFactoryError, Result};
use crate::registry::ActorRegistry;

/// Result of a fleet spawn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnedFleet {
    /// Vehicle actors in spawn order
    pub vehicles: Vec<ActorId>,
    /// Placement conflicts that were retried
    pub collisions: usize,
}

/// Spawns `count` vehicles and gives each an initial forward velocity
///
/// Every spawned vehicle is recorded in the registry as soon as it exists.
/// On error the vehicles spawned so far stay recorded; the caller rolls back.
pub struct VehicleSpawner<'a, C: SimulatorClient> {
    client: &'a C,
    blueprint_filter: &'a str,
    max_attempts: usize,
}

impl<'a, C: SimulatorClient> VehicleSpawner<'a, C> {
    pub fn new(client: &'a C, blueprint_filter: &'a str, max_attempts: usize) -> Self {
        Self {
            client,
            blueprint_filter,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(client: &'a C, fleet: &'a FleetConfig) -> Self {
        Self::new(client, &fleet.blueprint_filter, fleet.max_spawn_attempts)
    }

    /// Spawn with an OS-seeded generator
    pub async fn spawn(
        &self,
        count: usize,
        speed: f64,
        registry: &mut ActorRegistry,
    ) -> Result<SpawnedFleet> {
        let mut rng = StdRng::from_os_rng();
        self.spawn_with_rng(count, speed, registry, &mut rng).await
    }

    #[instrument(
        name = "vehicle_spawner_spawn",
        skip(self, registry, rng),
        fields(filter = %self.blueprint_filter)
    )]
    pub async fn spawn_with_rng<R: Rng + Send>(
        &self,
        count: usize,
        speed: f64,
        registry: &mut ActorRegistry,
        rng: &mut R,
    ) -> Result<SpawnedFleet> {
        let blueprints = self.client.vehicle_blueprints(self.blueprint_filter).await?;
        if blueprints.is_empty() {
            return Err(ActorFactoryError::BlueprintNotFound {
                pattern: self.blueprint_filter.to_string(),
            });
        }
        let spawn_points = self.client.spawn_points().await?;
        if spawn_points.is_empty() {
            return Err(ActorFactoryError::NoSpawnPoints);
        }

        let mut fleet = SpawnedFleet {
            // 每辆车占一个出生点
            vehicles: Vec::with_capacity(count.min(spawn_points.len())),
            collisions: 0,
        };
        let velocity = Vector3::forward(speed);

        for index in 0..count {
            let (vehicle_id, collisions) = self
                .spawn_one(index, &blueprints, &spawn_points, rng)
                .await?;
            registry.record_vehicle(vehicle_id);
            fleet.collisions += collisions;

            self.client.set_target_velocity(vehicle_id, velocity).await?;
            fleet.vehicles.push(vehicle_id);
        }

        info!(
            vehicles = fleet.vehicles.len(),
            collisions = fleet.collisions,
            "fleet spawned"
        );
        Ok(fleet)
    }

    /// One vehicle: the blueprint is drawn once, the spawn point on every attempt
    async fn spawn_one<R: Rng + Send>(
        &self,
        index: usize,
        blueprints: &[String],
        spawn_points: &[Transform],
        rng: &mut R,
    ) -> Result<(ActorId, usize)> {
        let blueprint = blueprints
            .choose(rng)
            .ok_or_else(|| ActorFactoryError::BlueprintNotFound {
                pattern: self.blueprint_filter.to_string(),
            })?;

        for attempt in 1..=self.max_attempts {
            let point = *spawn_points
                .choose(rng)
                .ok_or(ActorFactoryError::NoSpawnPoints)?;

            match self.client.spawn_vehicle(blueprint, point).await {
                Ok(actor_id) => {
                    debug!(
                        vehicle_index = index,
                        actor_id,
                        blueprint = %blueprint,
                        attempt,
                        "vehicle spawned"
                    );
                    return Ok((actor_id, attempt - 1));
                }
                Err(e) if e.is_spawn_collision() => {
                    debug!(vehicle_index = index, attempt, error = %e, "spawn collided, resampling point");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            vehicle_index = index,
            attempts = self.max_attempts,
            "spawn attempts exhausted"
        );
        Err(ActorFactoryError::SpawnExhausted {
            vehicle_index: index,
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mock_client::{grid_spawn_points, MockConfig, MockSimulatorClient};

    async fn connected(config: MockConfig) -> MockSimulatorClient {
        let mut client = MockSimulatorClient::with_config(config);
        client
            .connect("localhost", 2000, Duration::from_secs(10))
            .await
            .unwrap();
        client
    }

    #[tokio::test]
    async fn test_spawns_requested_count_with_velocity() {
        let client = connected(MockConfig::default()).await;
        let mut registry = ActorRegistry::new();
        let mut rng = StdRng::seed_from_u64(7);

        let fleet = VehicleSpawner::new(&client, "vehicle.*", 32)
            .spawn_with_rng(5, 10.0, &mut registry, &mut rng)
            .await
            .unwrap();

        assert_eq!(fleet.vehicles.len(), 5);
        assert_eq!(registry.vehicles(), fleet.vehicles.as_slice());
        for &id in &fleet.vehicles {
            assert_eq!(client.velocity_of(id), Some(Vector3::new(10.0, 0.0, 0.0)));
            assert!(client.blueprint_of(id).unwrap().starts_with("vehicle."));
        }
        // 车辆两两不同
        let mut ids = fleet.vehicles.clone();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn test_retries_on_occupied_point() {
        // 两个出生点，其中一个被占用：抽中被占点时必须换点重试
        let mut total_collisions = 0;
        for seed in 0..20 {
            let client = connected(MockConfig {
                spawn_points: grid_spawn_points(2),
                occupied_spawn_points: vec![0],
                ..Default::default()
            })
            .await;
            let mut registry = ActorRegistry::new();
            let mut rng = StdRng::seed_from_u64(seed);

            let fleet = VehicleSpawner::new(&client, "vehicle.*", 64)
                .spawn_with_rng(1, 10.0, &mut registry, &mut rng)
                .await
                .unwrap();

            assert_eq!(fleet.vehicles.len(), 1);
            assert_eq!(client.spawn_attempts(), fleet.collisions + 1);
            total_collisions += fleet.collisions;
        }
        assert!(total_collisions > 0);
    }

    #[tokio::test]
    async fn test_exhaustion_is_an_error() {
        let client = connected(MockConfig {
            spawn_points: grid_spawn_points(1),
            occupied_spawn_points: vec![0],
            ..Default::default()
        })
        .await;
        let mut registry = ActorRegistry::new();

        let err = VehicleSpawner::new(&client, "vehicle.*", 4)
            .spawn(1, 10.0, &mut registry)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ActorFactoryError::SpawnExhausted {
                vehicle_index: 0,
                attempts: 4
            }
        ));
        assert_eq!(client.spawn_attempts(), 4);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_more_vehicles_than_points_exhausts() {
        let client = connected(MockConfig {
            spawn_points: grid_spawn_points(2),
            ..Default::default()
        })
        .await;
        let mut registry = ActorRegistry::new();

        let err = VehicleSpawner::new(&client, "vehicle.*", 8)
            .spawn(3, 10.0, &mut registry)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ActorFactoryError::SpawnExhausted {
                vehicle_index: 2,
                ..
            }
        ));
        // 已生成的两辆车仍在 registry 中，由调用方回滚
        assert_eq!(registry.vehicles().len(), 2);
    }

    #[tokio::test]
    async fn test_huge_count_fails_without_panicking() {
        let client = connected(MockConfig {
            spawn_points: grid_spawn_points(2),
            ..Default::default()
        })
        .await;
        let mut registry = ActorRegistry::new();

        let err = VehicleSpawner::new(&client, "vehicle.*", 4)
            .spawn(usize::MAX, 10.0, &mut registry)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ActorFactoryError::SpawnExhausted {
                vehicle_index: 2,
                ..
            }
        ));
        assert_eq!(registry.vehicles().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_filter() {
        let client = connected(MockConfig::default()).await;
        let mut registry = ActorRegistry::new();

        let err = VehicleSpawner::new(&client, "vehicle.delorean.*", 8)
            .spawn(1, 10.0, &mut registry)
            .await
            .unwrap_err();
        assert!(matches!(err, ActorFactoryError::BlueprintNotFound { .. }));
    }
}
