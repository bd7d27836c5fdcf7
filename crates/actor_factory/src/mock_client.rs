//! Mock CARLA 客户端
//!
//! 用于单元测试和无服务器运行的 mock 实现：
//! 模拟世界帧推进、出生点占用和相机帧投递，支持注入失败场景。

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use contracts::{
    ActorId, ActorKind, CameraFrame, FrameCallback, Location, Rotation, Transform, Vector3,
    WorldSettings,
};
use tokio::sync::mpsc;
use tracing::{debug, instrument, trace, warn};

use crate::client::{matches_pattern, SimulatorClient};
use crate::error::{ActorFactoryError, Result};

/// Mock 客户端配置
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// 蓝图库
    pub blueprints: Vec<String>,
    /// 地图推荐出生点
    pub spawn_points: Vec<Transform>,
    /// 预先被占用的出生点下标
    pub occupied_spawn_points: Vec<usize>,
    /// 世界中预先存在、不属于本次运行的 actor 数量
    pub foreign_actors: usize,
    /// 连接时的世界设置
    pub initial_settings: WorldSettings,
    /// 起始世界帧号 (第一次 tick 返回 initial_frame + 1)
    pub initial_frame: u64,
    /// 应该失败的 destroy actor IDs
    pub fail_destroy: Vec<ActorId>,
    /// 每帧投递前的延迟
    pub delivery_delay: Option<Duration>,
    /// 相机未设置 image_size_x/y 时的图像尺寸
    pub default_image_size: (u32, u32),
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            blueprints: default_blueprints(),
            spawn_points: grid_spawn_points(16),
            occupied_spawn_points: Vec::new(),
            foreign_actors: 0,
            initial_settings: WorldSettings::default(),
            initial_frame: 0,
            fail_destroy: Vec::new(),
            delivery_delay: None,
            default_image_size: (800, 600),
        }
    }
}

fn default_blueprints() -> Vec<String> {
    [
        "vehicle.audi.tt",
        "vehicle.tesla.model3",
        "vehicle.lincoln.mkz_2020",
        "vehicle.mini.cooper_s",
        "sensor.camera.rgb",
        "sensor.camera.depth",
        "sensor.lidar.ray_cast",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// 生成 `count` 个互不重叠的网格出生点
pub fn grid_spawn_points(count: usize) -> Vec<Transform> {
    (0..count)
        .map(|i| {
            Transform::new(
                Location::new((i % 4) as f64 * 20.0, (i / 4) as f64 * 20.0, 0.3),
                Rotation::new(0.0, 90.0 * (i % 4) as f64, 0.0),
            )
        })
        .collect()
}

#[derive(Debug, Clone)]
struct MockActor {
    blueprint: String,
    kind: ActorKind,
    parent: Option<ActorId>,
    transform: Transform,
    velocity: Option<Vector3>,
    attributes: HashMap<String, String>,
    attribute_writes: usize,
}

#[derive(Default)]
struct MockWorld {
    settings: WorldSettings,
    settings_history: Vec<WorldSettings>,
    elapsed: f64,
    actors: BTreeMap<ActorId, MockActor>,
    blocked: Vec<Location>,
    listeners: BTreeMap<ActorId, FrameCallback>,
    muted: HashSet<ActorId>,
    spawn_attempts: usize,
}

impl MockWorld {
    fn is_occupied(&self, location: &Location) -> bool {
        self.blocked.contains(location)
            || self
                .actors
                .values()
                .any(|a| a.kind == ActorKind::Vehicle && a.transform.location == *location)
    }

    fn image_size(&self, camera_id: ActorId, fallback: (u32, u32)) -> (u32, u32) {
        let Some(actor) = self.actors.get(&camera_id) else {
            return fallback;
        };
        let parse = |key: &str, default: u32| {
            actor
                .attributes
                .get(key)
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(default)
        };
        (
            parse("image_size_x", fallback.0),
            parse("image_size_y", fallback.1),
        )
    }

    fn remove_actor(&mut self, actor_id: ActorId) -> bool {
        self.listeners.remove(&actor_id);
        self.muted.remove(&actor_id);
        self.actors.remove(&actor_id).is_some()
    }
}

/// 投递线程上执行的一次回调
struct Delivery {
    camera_id: ActorId,
    callback: FrameCallback,
    frame: CameraFrame,
}

struct MockInner {
    config: MockConfig,
    next_actor_id: AtomicU32,
    frame: AtomicU64,
    connected: AtomicBool,
    world: Mutex<MockWorld>,
    delivery_tx: mpsc::UnboundedSender<Delivery>,
}

/// Mock CARLA 客户端
///
/// `Clone` 共享同一个模拟世界。相机帧在 `tick` 时生成，
/// 由独立的投递线程按顺序调用回调，与真实客户端的线程模型一致。
#[derive(Clone)]
pub struct MockSimulatorClient {
    inner: Arc<MockInner>,
}

impl MockSimulatorClient {
    /// 创建默认 mock 客户端
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// 使用配置创建 mock 客户端
    pub fn with_config(config: MockConfig) -> Self {
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();
        spawn_delivery_thread(delivery_rx, config.delivery_delay);

        let mut world = MockWorld {
            settings: config.initial_settings,
            ..Default::default()
        };
        world.blocked = config
            .occupied_spawn_points
            .iter()
            .filter_map(|&i| config.spawn_points.get(i))
            .map(|t| t.location)
            .collect();
        // 外部 actor 的 ID 从 1 开始，位于地图出生点之外
        for i in 0..config.foreign_actors {
            let id = i as ActorId + 1;
            world.actors.insert(
                id,
                MockActor {
                    blueprint: "vehicle.foreign".to_string(),
                    kind: ActorKind::Vehicle,
                    parent: None,
                    transform: Transform::new(
                        Location::new(-1000.0 - i as f64 * 10.0, -1000.0, 0.3),
                        Rotation::default(),
                    ),
                    velocity: None,
                    attributes: HashMap::new(),
                    attribute_writes: 0,
                },
            );
        }

        Self {
            inner: Arc::new(MockInner {
                next_actor_id: AtomicU32::new(1000), // 从 1000 开始，便于识别
                frame: AtomicU64::new(config.initial_frame),
                connected: AtomicBool::new(false),
                world: Mutex::new(world),
                delivery_tx,
                config,
            }),
        }
    }

    /// 停止向该相机投递帧 (模拟丢帧)
    pub fn mute(&self, camera_id: ActorId) {
        self.world().muted.insert(camera_id);
    }

    /// 恢复向该相机投递帧
    pub fn unmute(&self, camera_id: ActorId) {
        self.world().muted.remove(&camera_id);
    }

    /// 获取当前存活的 actor 数量 (包括外部 actor)
    pub fn actor_count(&self) -> usize {
        self.world().actors.len()
    }

    /// 获取所有存活的 actor IDs
    pub fn all_actor_ids(&self) -> Vec<ActorId> {
        self.world().actors.keys().copied().collect()
    }

    /// 存活的某类 actor
    pub fn actor_ids_of(&self, kind: ActorKind) -> Vec<ActorId> {
        self.world()
            .actors
            .iter()
            .filter(|(_, a)| a.kind == kind)
            .map(|(id, _)| *id)
            .collect()
    }

    /// actor 的蓝图
    pub fn blueprint_of(&self, actor_id: ActorId) -> Option<String> {
        self.world()
            .actors
            .get(&actor_id)
            .map(|a| a.blueprint.clone())
    }

    /// 相机的父 actor
    pub fn parent_of(&self, actor_id: ActorId) -> Option<ActorId> {
        self.world().actors.get(&actor_id).and_then(|a| a.parent)
    }

    /// 车辆的目标速度
    pub fn velocity_of(&self, actor_id: ActorId) -> Option<Vector3> {
        self.world().actors.get(&actor_id).and_then(|a| a.velocity)
    }

    /// 相机当前的属性表
    pub fn camera_attributes(&self, actor_id: ActorId) -> Option<HashMap<String, String>> {
        self.world()
            .actors
            .get(&actor_id)
            .map(|a| a.attributes.clone())
    }

    /// 相机属性被改写的次数 (不含 spawn 时的属性)
    pub fn attribute_writes(&self, actor_id: ActorId) -> usize {
        self.world()
            .actors
            .get(&actor_id)
            .map_or(0, |a| a.attribute_writes)
    }

    /// 该相机是否注册了回调
    pub fn is_listening(&self, actor_id: ActorId) -> bool {
        self.world().listeners.contains_key(&actor_id)
    }

    /// 当前世界设置
    pub fn current_settings(&self) -> WorldSettings {
        self.world().settings
    }

    /// 按顺序记录的所有 apply_world_settings 调用
    pub fn settings_history(&self) -> Vec<WorldSettings> {
        self.world().settings_history.clone()
    }

    /// spawn_vehicle 被调用的总次数 (含冲突)
    pub fn spawn_attempts(&self) -> usize {
        self.world().spawn_attempts
    }

    /// 当前世界帧号
    pub fn current_frame(&self) -> u64 {
        self.inner.frame.load(Ordering::SeqCst)
    }

    fn world(&self) -> MutexGuard<'_, MockWorld> {
        self.inner
            .world
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_actor_id(&self) -> ActorId {
        self.inner.next_actor_id.fetch_add(1, Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.inner.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ActorFactoryError::not_connected())
        }
    }

    fn ensure_blueprint(&self, id: &str) -> Result<()> {
        if self.inner.config.blueprints.iter().any(|b| b == id) {
            Ok(())
        } else {
            Err(ActorFactoryError::BlueprintNotFound {
                pattern: id.to_string(),
            })
        }
    }
}

impl Default for MockSimulatorClient {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_delivery_thread(mut rx: mpsc::UnboundedReceiver<Delivery>, delay: Option<Duration>) {
    thread::spawn(move || {
        // 所有发送端 (即所有客户端克隆) 释放后退出
        while let Some(delivery) = rx.blocking_recv() {
            if let Some(delay) = delay {
                thread::sleep(delay);
            }
            trace!(
                camera_actor = delivery.camera_id,
                frame = delivery.frame.frame,
                "mock frame delivered"
            );
            (delivery.callback)(delivery.frame);
        }
    });
}

impl SimulatorClient for MockSimulatorClient {
    #[instrument(name = "mock_carla_connect", skip(self), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        let _ = (host, port, timeout);
        self.inner.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn world_settings(&self) -> Result<WorldSettings> {
        self.ensure_connected()?;
        Ok(self.world().settings)
    }

    #[instrument(name = "mock_carla_apply_settings", skip(self))]
    async fn apply_world_settings(&self, settings: &WorldSettings) -> Result<()> {
        self.ensure_connected()?;
        let mut world = self.world();
        world.settings = *settings;
        world.settings_history.push(*settings);
        Ok(())
    }

    async fn vehicle_blueprints(&self, filter: &str) -> Result<Vec<String>> {
        self.ensure_connected()?;
        Ok(self
            .inner
            .config
            .blueprints
            .iter()
            .filter(|b| b.starts_with("vehicle.") && matches_pattern(filter, b))
            .cloned()
            .collect())
    }

    async fn find_blueprint(&self, id: &str) -> Result<String> {
        self.ensure_connected()?;
        self.ensure_blueprint(id)?;
        Ok(id.to_string())
    }

    async fn spawn_points(&self) -> Result<Vec<Transform>> {
        self.ensure_connected()?;
        Ok(self.inner.config.spawn_points.clone())
    }

    #[instrument(
        name = "mock_carla_spawn_vehicle",
        skip(self, transform),
        fields(blueprint = %blueprint)
    )]
    async fn spawn_vehicle(&self, blueprint: &str, transform: Transform) -> Result<ActorId> {
        self.ensure_connected()?;
        self.ensure_blueprint(blueprint)?;

        let mut world = self.world();
        world.spawn_attempts += 1;
        if world.is_occupied(&transform.location) {
            return Err(ActorFactoryError::SpawnCollision {
                blueprint: blueprint.to_string(),
                location: transform.location.to_string(),
            });
        }

        let actor_id = self.allocate_actor_id();
        world.actors.insert(
            actor_id,
            MockActor {
                blueprint: blueprint.to_string(),
                kind: ActorKind::Vehicle,
                parent: None,
                transform,
                velocity: None,
                attributes: HashMap::new(),
                attribute_writes: 0,
            },
        );
        Ok(actor_id)
    }

    async fn set_target_velocity(&self, vehicle_id: ActorId, velocity: Vector3) -> Result<()> {
        self.ensure_connected()?;
        let mut world = self.world();
        match world.actors.get_mut(&vehicle_id) {
            Some(actor) if actor.kind == ActorKind::Vehicle => {
                actor.velocity = Some(velocity);
                Ok(())
            }
            _ => Err(ActorFactoryError::ActorNotFound {
                actor_id: vehicle_id,
            }),
        }
    }

    #[instrument(
        name = "mock_carla_spawn_camera",
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
        self.ensure_connected()?;
        self.ensure_blueprint(blueprint)?;

        let mut world = self.world();
        // 验证 parent 存在
        if !world
            .actors
            .get(&parent_id)
            .is_some_and(|a| a.kind == ActorKind::Vehicle)
        {
            return Err(ActorFactoryError::camera_spawn(
                blueprint,
                parent_id,
                "parent vehicle not found",
            ));
        }

        let actor_id = self.allocate_actor_id();
        world.actors.insert(
            actor_id,
            MockActor {
                blueprint: blueprint.to_string(),
                kind: ActorKind::Camera,
                parent: Some(parent_id),
                transform,
                velocity: None,
                attributes: attributes.clone(),
                attribute_writes: 0,
            },
        );
        Ok(actor_id)
    }

    fn listen(&self, camera_id: ActorId, callback: FrameCallback) -> Result<()> {
        let mut world = self.world();
        if !world
            .actors
            .get(&camera_id)
            .is_some_and(|a| a.kind == ActorKind::Camera)
        {
            return Err(ActorFactoryError::ActorNotFound {
                actor_id: camera_id,
            });
        }
        if world.listeners.insert(camera_id, callback).is_some() {
            warn!(camera_id, "camera listener replaced");
        }
        Ok(())
    }

    fn stop_listening(&self, camera_id: ActorId) -> Result<()> {
        if self.world().listeners.remove(&camera_id).is_some() {
            debug!(camera_id, "mock camera stopped");
        }
        Ok(())
    }

    async fn set_camera_attributes(
        &self,
        camera_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<()> {
        self.ensure_connected()?;
        let mut world = self.world();
        match world.actors.get_mut(&camera_id) {
            Some(actor) if actor.kind == ActorKind::Camera => {
                actor
                    .attributes
                    .extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
                actor.attribute_writes += 1;
                Ok(())
            }
            _ => Err(ActorFactoryError::ActorNotFound {
                actor_id: camera_id,
            }),
        }
    }

    async fn tick(&self) -> Result<u64> {
        self.ensure_connected()?;
        let fallback = self.inner.config.default_image_size;

        let (frame, deliveries) = {
            let mut world = self.world();
            let step = world.settings.fixed_delta_seconds.unwrap_or(0.05);
            world.elapsed += step;
            let frame = self.inner.frame.fetch_add(1, Ordering::SeqCst) + 1;
            let timestamp = world.elapsed;

            let world = &*world;
            let deliveries: Vec<Delivery> = world
                .listeners
                .iter()
                .filter(|(id, _)| !world.muted.contains(id))
                .map(|(&camera_id, callback)| {
                    let (width, height) = world.image_size(camera_id, fallback);
                    let len = width as usize * height as usize * 4;
                    Delivery {
                        camera_id,
                        callback: Arc::clone(callback),
                        frame: CameraFrame {
                            frame,
                            timestamp,
                            width,
                            height,
                            data: Bytes::from(vec![128u8; len]),
                        },
                    }
                })
                .collect();
            (frame, deliveries)
        };

        for delivery in deliveries {
            if self.inner.delivery_tx.send(delivery).is_err() {
                warn!(frame, "mock delivery thread gone");
                break;
            }
        }
        Ok(frame)
    }

    async fn world_actor_ids(&self) -> Result<Vec<ActorId>> {
        self.ensure_connected()?;
        Ok(self.all_actor_ids())
    }

    #[instrument(name = "mock_carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        if self.inner.config.fail_destroy.contains(&actor_id) {
            return Err(ActorFactoryError::DestroyFailed {
                actor_id,
                message: "mock failure".into(),
            });
        }

        // 幂等：即使不存在也返回 Ok
        self.world().remove_actor(actor_id);
        Ok(())
    }

    #[instrument(name = "mock_carla_destroy_actors", skip(self, actor_ids), fields(count = actor_ids.len()))]
    async fn destroy_actors(&self, actor_ids: &[ActorId]) -> Result<usize> {
        let mut world = self.world();
        let mut destroyed = 0;
        for &actor_id in actor_ids {
            if self.inner.config.fail_destroy.contains(&actor_id) {
                warn!(actor_id, "mock batch destroy failure");
                continue;
            }
            if world.remove_actor(actor_id) {
                destroyed += 1;
            }
        }
        Ok(destroyed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc as std_mpsc;

    use super::*;

    async fn connected(config: MockConfig) -> MockSimulatorClient {
        let mut client = MockSimulatorClient::with_config(config);
        client
            .connect("localhost", 2000, Duration::from_secs(10))
            .await
            .unwrap();
        client
    }

    #[tokio::test]
    async fn test_requires_connection() {
        let client = MockSimulatorClient::new();
        assert!(matches!(
            client.tick().await,
            Err(ActorFactoryError::ConnectionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_spawn_vehicle() {
        let client = connected(MockConfig::default()).await;
        let points = client.spawn_points().await.unwrap();

        let actor_id = client
            .spawn_vehicle("vehicle.tesla.model3", points[0])
            .await
            .unwrap();
        assert!(actor_id >= 1000);
        assert_eq!(client.actor_count(), 1);
    }

    #[tokio::test]
    async fn test_occupied_point_collides() {
        let client = connected(MockConfig {
            occupied_spawn_points: vec![2],
            ..Default::default()
        })
        .await;
        let points = client.spawn_points().await.unwrap();

        let err = client
            .spawn_vehicle("vehicle.audi.tt", points[2])
            .await
            .unwrap_err();
        assert!(err.is_spawn_collision());

        client
            .spawn_vehicle("vehicle.audi.tt", points[3])
            .await
            .unwrap();
        // 已有车辆的位置同样冲突
        let err = client
            .spawn_vehicle("vehicle.audi.tt", points[3])
            .await
            .unwrap_err();
        assert!(err.is_spawn_collision());
        assert_eq!(client.spawn_attempts(), 3);
    }

    #[tokio::test]
    async fn test_vehicle_blueprint_filter() {
        let client = connected(MockConfig::default()).await;
        let all = client.vehicle_blueprints("vehicle.*").await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|b| b.starts_with("vehicle.")));

        let tesla = client.vehicle_blueprints("*.tesla.*").await.unwrap();
        assert_eq!(tesla, vec!["vehicle.tesla.model3".to_string()]);

        assert!(matches!(
            client.find_blueprint("sensor.camera.thermal").await,
            Err(ActorFactoryError::BlueprintNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_camera_requires_vehicle_parent() {
        let client = connected(MockConfig::default()).await;
        let err = client
            .spawn_camera(
                "sensor.camera.rgb",
                Transform::default(),
                4242,
                &HashMap::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ActorFactoryError::CameraSpawnFailed { .. }));
    }

    #[tokio::test]
    async fn test_tick_delivers_frames_in_order() {
        let client = connected(MockConfig {
            initial_frame: 41,
            ..Default::default()
        })
        .await;
        let points = client.spawn_points().await.unwrap();
        let vehicle = client
            .spawn_vehicle("vehicle.audi.tt", points[0])
            .await
            .unwrap();
        let attributes = HashMap::from([
            ("image_size_x".to_string(), "4".to_string()),
            ("image_size_y".to_string(), "3".to_string()),
        ]);
        let camera = client
            .spawn_camera("sensor.camera.rgb", Transform::default(), vehicle, &attributes)
            .await
            .unwrap();

        let (tx, rx) = std_mpsc::channel();
        let tx = Mutex::new(tx);
        client
            .listen(
                camera,
                Arc::new(move |frame: CameraFrame| {
                    let _ = tx.lock().unwrap().send(frame);
                }),
            )
            .unwrap();

        assert_eq!(client.tick().await.unwrap(), 42);
        assert_eq!(client.tick().await.unwrap(), 43);

        let first = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(first.frame, 42);
        assert_eq!(second.frame, 43);
        assert_eq!((first.width, first.height), (4, 3));
        assert_eq!(first.data.len(), first.expected_len());
    }

    #[tokio::test]
    async fn test_muted_camera_receives_nothing() {
        let client = connected(MockConfig::default()).await;
        let points = client.spawn_points().await.unwrap();
        let vehicle = client
            .spawn_vehicle("vehicle.audi.tt", points[0])
            .await
            .unwrap();
        let camera = client
            .spawn_camera(
                "sensor.camera.rgb",
                Transform::default(),
                vehicle,
                &HashMap::new(),
            )
            .await
            .unwrap();

        let (tx, rx) = std_mpsc::channel::<u64>();
        let tx = Mutex::new(tx);
        client
            .listen(
                camera,
                Arc::new(move |frame: CameraFrame| {
                    let _ = tx.lock().unwrap().send(frame.frame);
                }),
            )
            .unwrap();
        client.mute(camera);
        client.tick().await.unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        client.unmute(camera);
        let frame = client.tick().await.unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok(frame));
    }

    #[tokio::test]
    async fn test_settings_history() {
        let client = connected(MockConfig::default()).await;
        let original = client.world_settings().await.unwrap();
        let sync = WorldSettings {
            synchronous_mode: true,
            fixed_delta_seconds: Some(0.2),
            no_rendering_mode: false,
        };
        client.apply_world_settings(&sync).await.unwrap();
        client.apply_world_settings(&original).await.unwrap();

        assert_eq!(client.settings_history(), vec![sync, original]);
        assert_eq!(client.current_settings(), original);
    }

    #[tokio::test]
    async fn test_mock_destroy_idempotent() {
        let client = connected(MockConfig::default()).await;
        let points = client.spawn_points().await.unwrap();

        let actor_id = client
            .spawn_vehicle("vehicle.tesla.model3", points[0])
            .await
            .unwrap();
        client.destroy_actor(actor_id).await.unwrap();
        // Second destroy should also succeed
        client.destroy_actor(actor_id).await.unwrap();
        assert_eq!(client.actor_count(), 0);
    }

    #[tokio::test]
    async fn test_batch_destroy_includes_foreign_actors() {
        let client = connected(MockConfig {
            foreign_actors: 3,
            ..Default::default()
        })
        .await;
        let points = client.spawn_points().await.unwrap();
        client
            .spawn_vehicle("vehicle.audi.tt", points[0])
            .await
            .unwrap();

        let all = client.world_actor_ids().await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(client.destroy_actors(&all).await.unwrap(), 4);
        assert_eq!(client.actor_count(), 0);
    }
}
