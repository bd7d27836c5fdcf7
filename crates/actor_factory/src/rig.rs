//! 相机挂载
//!
//! 每辆车挂一个相机，按车辆顺序分配 1-based 序号 (`camera_<i>`)。

use contracts::{ActorId, CameraConfig, CameraId, Transform};
use tracing::{info, instrument};

use crate::client::SimulatorClient;
use crate::error::{ActorFactoryError, Result};
use crate::registry::ActorRegistry;

/// 相机绑定记录
///
/// 挂载时创建且不可变，回调按值捕获。
#[derive(Debug, Clone, PartialEq)]
pub struct CameraBinding {
    /// 1-based 注册序号
    pub ordinal: usize,
    /// 相机名称 `camera_<ordinal>`
    pub camera: CameraId,
    /// 相机 actor
    pub actor_id: ActorId,
    /// 所属车辆 actor
    pub vehicle_id: ActorId,
    /// 相对车辆的挂载位姿
    pub transform: Transform,
}

/// 相机挂载器
pub struct CameraRig<'a, C: SimulatorClient> {
    client: &'a C,
    config: &'a CameraConfig,
}

impl<'a, C: SimulatorClient> CameraRig<'a, C> {
    pub fn new(client: &'a C, config: &'a CameraConfig) -> Self {
        Self { client, config }
    }

    /// 为每辆车 spawn 并挂载一个相机
    ///
    /// 成功挂载的相机立即记录到 registry；失败时由调用方回滚。
    #[instrument(
        name = "camera_rig_attach",
        skip(self, vehicles, registry),
        fields(blueprint = %self.config.blueprint, vehicle_count = vehicles.len())
    )]
    pub async fn attach(
        &self,
        vehicles: &[ActorId],
        registry: &mut ActorRegistry,
    ) -> Result<Vec<CameraBinding>> {
        let blueprint = self.client.find_blueprint(&self.config.blueprint).await?;

        // 分辨率等属性只能在 spawn 前设置
        let mut attributes = self.config.attributes.to_attribute_map();
        attributes.extend(self.config.exposure.to_attribute_map());

        let mut bindings = Vec::with_capacity(vehicles.len());
        for (index, &vehicle_id) in vehicles.iter().enumerate() {
            let ordinal = index + 1;
            let camera = CameraId::from_ordinal(ordinal);

            let actor_id = self
                .client
                .spawn_camera(&blueprint, self.config.transform, vehicle_id, &attributes)
                .await
                .map_err(|e| match e {
                    ActorFactoryError::CameraSpawnFailed { message, .. } => {
                        ActorFactoryError::camera_spawn(camera.as_str(), vehicle_id, message)
                    }
                    other => other,
                })?;
            registry.record_camera(actor_id, vehicle_id);

            info!(
                camera = %camera,
                actor_id,
                vehicle_id,
                "camera spawned and attached"
            );
            bindings.push(CameraBinding {
                ordinal,
                camera,
                actor_id,
                vehicle_id,
                transform: self.config.transform,
            });
        }

        Ok(bindings)
    }
}
