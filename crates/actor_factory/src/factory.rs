//! ActorFactory 核心实现
//!
//! 生成车队、挂载相机，记录本次运行创建的 actors 并负责回滚与清理。

use contracts::{ActorId, ActorKind, CameraConfig, FleetConfig, TeardownPolicy};
use rand::Rng;
use tracing::{error, info, instrument, warn};

use crate::client::SimulatorClient;
use crate::error::Result;
use crate::registry::ActorRegistry;
use crate::rig::{CameraBinding, CameraRig};
use crate::spawner::{SpawnedFleet, VehicleSpawner};

/// Teardown 结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// 成功销毁的本次运行 actors
    pub destroyed: usize,
    /// 销毁失败、仍留在 registry 中的 actors
    pub failed: Vec<ActorId>,
    /// `PurgeWorld` 额外销毁的 actors
    pub purged: usize,
}

/// Actor Factory
///
/// 负责 spawn vehicles 和 cameras，
/// 并提供 teardown 和回滚能力。
pub struct ActorFactory<C: SimulatorClient> {
    client: C,
    registry: ActorRegistry,
}

impl<C: SimulatorClient> ActorFactory<C> {
    /// 创建新的 ActorFactory
    pub fn new(client: C) -> Self {
        Self {
            client,
            registry: ActorRegistry::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// 本次运行创建的 actors
    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    /// Spawn 车队
    ///
    /// # 原子性保证
    /// 如果任何 spawn 失败，会回滚销毁所有已创建的 actors。
    pub async fn spawn_fleet(&mut self, fleet: &FleetConfig) -> Result<SpawnedFleet> {
        let result = VehicleSpawner::from_config(&self.client, fleet)
            .spawn(fleet.vehicle_count, fleet.speed, &mut self.registry)
            .await;
        self.rollback_on_error(result).await
    }

    /// 使用指定随机源 spawn 车队 (测试用)
    pub async fn spawn_fleet_with_rng<R: Rng + Send>(
        &mut self,
        fleet: &FleetConfig,
        rng: &mut R,
    ) -> Result<SpawnedFleet> {
        let result = VehicleSpawner::from_config(&self.client, fleet)
            .spawn_with_rng(fleet.vehicle_count, fleet.speed, &mut self.registry, rng)
            .await;
        self.rollback_on_error(result).await
    }

    /// 为每辆车挂载相机
    ///
    /// 失败时回滚所有已创建的 actors (包括车辆)。
    pub async fn attach_cameras(
        &mut self,
        camera: &CameraConfig,
        vehicles: &[ActorId],
    ) -> Result<Vec<CameraBinding>> {
        let result = CameraRig::new(&self.client, camera)
            .attach(vehicles, &mut self.registry)
            .await;
        self.rollback_on_error(result).await
    }

    /// 销毁本次运行创建的 actors
    ///
    /// 先停止相机监听，再按 相机 -> 车辆 的顺序销毁。
    /// `PurgeWorld` 会在此之后批量销毁世界中剩余的所有 actors。
    ///
    /// # 幂等性
    /// 多次调用安全，销毁成功的 actor 会从 registry 中移除。
    #[instrument(
        name = "actor_factory_teardown",
        skip(self),
        fields(owned = self.registry.len())
    )]
    pub async fn teardown(&mut self, policy: TeardownPolicy) -> TeardownReport {
        info!("starting teardown");
        let mut report = TeardownReport::default();

        for camera in self.registry.cameras() {
            if let Err(e) = self.client.stop_listening(camera.actor_id) {
                warn!(actor_id = camera.actor_id, error = %e, "failed to stop camera");
            }
        }

        for (actor_id, kind) in self.registry.teardown_order() {
            if self.destroy_actor_safe(actor_id, kind).await {
                self.registry.remove(actor_id);
                report.destroyed += 1;
            } else {
                report.failed.push(actor_id);
            }
        }

        if policy == TeardownPolicy::PurgeWorld {
            report.purged = self.purge_world().await;
        }

        info!(
            destroyed = report.destroyed,
            failed = report.failed.len(),
            purged = report.purged,
            "teardown completed"
        );
        report
    }

    /// 批量销毁世界中的所有 actors
    #[instrument(name = "actor_factory_purge_world", skip(self))]
    async fn purge_world(&self) -> usize {
        let ids = match self.client.world_actor_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "failed to list world actors");
                return 0;
            }
        };
        warn!(count = ids.len(), "destroying every actor in the world");

        match self.client.destroy_actors(&ids).await {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "batch destroy failed");
                0
            }
        }
    }

    async fn rollback_on_error<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!(error = %e, "spawn failed, rolling back all actors");
            self.rollback().await;
        }
        result
    }

    /// 回滚：销毁所有已创建的 actors
    #[instrument(
        name = "actor_factory_rollback",
        skip(self),
        fields(owned = self.registry.len())
    )]
    async fn rollback(&mut self) {
        warn!("performing rollback");
        let report = self.teardown(TeardownPolicy::Owned).await;
        if !report.failed.is_empty() {
            error!(failed = ?report.failed, "rollback left actors behind");
        }
    }

    /// 安全销毁 actor（忽略错误，仅记录日志）
    async fn destroy_actor_safe(&self, actor_id: ActorId, kind: ActorKind) -> bool {
        info!(actor_id, kind = ?kind, "destroying actor");

        match self.client.destroy_actor(actor_id).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    actor_id,
                    kind = ?kind,
                    error = %e,
                    "failed to destroy actor"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::ActorFactoryError;
    use crate::mock_client::{grid_spawn_points, MockConfig, MockSimulatorClient};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    async fn factory(config: MockConfig) -> (ActorFactory<MockSimulatorClient>, MockSimulatorClient) {
        let mut client = MockSimulatorClient::with_config(config);
        client
            .connect("localhost", 2000, Duration::from_secs(10))
            .await
            .unwrap();
        (ActorFactory::new(client.clone()), client)
    }

    fn fleet(count: usize) -> FleetConfig {
        FleetConfig {
            vehicle_count: count,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_spawn_success() {
        let (mut factory, client) = factory(MockConfig::default()).await;
        let mut rng = StdRng::seed_from_u64(3);

        let spawned = factory
            .spawn_fleet_with_rng(&fleet(4), &mut rng)
            .await
            .unwrap();
        let bindings = factory
            .attach_cameras(&CameraConfig::default(), &spawned.vehicles)
            .await
            .unwrap();

        assert_eq!(spawned.vehicles.len(), 4);
        assert_eq!(bindings.len(), 4);
        assert_eq!(factory.registry().len(), 8);
        assert_eq!(client.actor_ids_of(ActorKind::Camera).len(), 4);
    }

    #[tokio::test]
    async fn test_spawn_exhaustion_rolls_back() {
        let (mut factory, client) = factory(MockConfig {
            spawn_points: grid_spawn_points(3),
            ..Default::default()
        })
        .await;

        let err = factory.spawn_fleet(&fleet(4)).await.unwrap_err();

        assert!(matches!(err, ActorFactoryError::SpawnExhausted { .. }));
        assert!(factory.registry().is_empty());
        assert_eq!(client.actor_count(), 0);
    }

    #[tokio::test]
    async fn test_camera_failure_rolls_back_vehicles() {
        let (mut factory, client) = factory(MockConfig::default()).await;
        let spawned = factory.spawn_fleet(&fleet(2)).await.unwrap();

        let camera = CameraConfig {
            blueprint: "sensor.camera.thermal".to_string(),
            ..Default::default()
        };
        let err = factory
            .attach_cameras(&camera, &spawned.vehicles)
            .await
            .unwrap_err();

        assert!(matches!(err, ActorFactoryError::BlueprintNotFound { .. }));
        assert!(factory.registry().is_empty());
        assert_eq!(client.actor_count(), 0);
    }

    #[tokio::test]
    async fn test_teardown_spares_foreign_actors() {
        let (mut factory, client) = factory(MockConfig {
            foreign_actors: 2,
            ..Default::default()
        })
        .await;
        let spawned = factory.spawn_fleet(&fleet(3)).await.unwrap();
        factory
            .attach_cameras(&CameraConfig::default(), &spawned.vehicles)
            .await
            .unwrap();
        assert_eq!(client.actor_count(), 8);

        let report = factory.teardown(TeardownPolicy::Owned).await;

        assert_eq!(report.destroyed, 6);
        assert_eq!(report.purged, 0);
        assert_eq!(client.all_actor_ids(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_purge_world_destroys_everything() {
        let (mut factory, client) = factory(MockConfig {
            foreign_actors: 2,
            ..Default::default()
        })
        .await;
        factory.spawn_fleet(&fleet(1)).await.unwrap();

        let report = factory.teardown(TeardownPolicy::PurgeWorld).await;

        assert_eq!(report.destroyed, 1);
        assert_eq!(report.purged, 2);
        assert_eq!(client.actor_count(), 0);
    }

    #[tokio::test]
    async fn test_teardown_idempotent_and_keeps_failures() {
        let (mut factory, client) = factory(MockConfig {
            fail_destroy: vec![1000],
            ..Default::default()
        })
        .await;
        let spawned = factory.spawn_fleet(&fleet(2)).await.unwrap();
        assert_eq!(spawned.vehicles[0], 1000);

        let first = factory.teardown(TeardownPolicy::Owned).await;
        assert_eq!(first.destroyed, 1);
        assert_eq!(first.failed, vec![1000]);

        // Second teardown only retries what is left
        let second = factory.teardown(TeardownPolicy::Owned).await;
        assert_eq!(second.destroyed, 0);
        assert_eq!(second.failed, vec![1000]);
        assert_eq!(client.all_actor_ids(), vec![1000]);
    }
}
