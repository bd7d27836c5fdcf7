//! 相机属性周期写入
//!
//! 每个相机一个 tokio 任务：先写一次曝光参数，
//! 之后每个周期重写一遍相机属性，直到收到停止信号。

use std::collections::HashMap;
use std::time::Duration;

use actor_factory::{CameraBinding, SimulatorClient};
use contracts::{ActorId, CameraConfig, CameraId};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// 单个相机的属性写入任务
pub struct AttributeTuner<C> {
    client: C,
    camera: CameraId,
    actor_id: ActorId,
    exposure: HashMap<String, String>,
    attributes: HashMap<String, String>,
    period: Duration,
}

impl<C> AttributeTuner<C>
where
    C: SimulatorClient + Clone + 'static,
{
    pub fn new(client: C, binding: &CameraBinding, config: &CameraConfig) -> Self {
        Self {
            client,
            camera: binding.camera.clone(),
            actor_id: binding.actor_id,
            exposure: config.exposure.to_attribute_map(),
            attributes: config.attributes.to_attribute_map(),
            period: Duration::from_millis(config.tune_period_ms),
        }
    }

    pub fn spawn(self, stop: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(stop))
    }

    #[instrument(
        name = "attribute_tuner",
        skip(self, stop),
        fields(camera = %self.camera, actor_id = self.actor_id)
    )]
    async fn run(self, mut stop: watch::Receiver<bool>) {
        if let Err(e) = self
            .client
            .set_camera_attributes(self.actor_id, &self.exposure)
            .await
        {
            warn!(error = %e, "failed to set exposure");
        }

        let mut writes = 0u64;
        loop {
            if *stop.borrow() {
                break;
            }

            let started = Instant::now();
            match self
                .client
                .set_camera_attributes(self.actor_id, &self.attributes)
                .await
            {
                Ok(()) => writes += 1,
                Err(e) => warn!(error = %e, "failed to set camera attributes"),
            }

            // Sleep whatever is left of the period, never negative
            let remaining = self.period.saturating_sub(started.elapsed());
            tokio::select! {
                _ = stop.changed() => break,
                _ = tokio::time::sleep(remaining) => {}
            }
        }

        debug!(writes, "attribute tuner stopped");
    }
}

/// 所有相机的 tuner 任务
pub struct TunerSet {
    stop: watch::Sender<bool>,
    handles: Vec<(CameraId, JoinHandle<()>)>,
}

impl TunerSet {
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            stop,
            handles: Vec::new(),
        }
    }

    pub fn spawn<C>(&mut self, tuner: AttributeTuner<C>)
    where
        C: SimulatorClient + Clone + 'static,
    {
        let camera = tuner.camera.clone();
        let handle = tuner.spawn(self.stop.subscribe());
        self.handles.push((camera, handle));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 通知所有任务停止并等待退出
    pub async fn shutdown(self) {
        self.stop.send_replace(true);
        for (camera, handle) in self.handles {
            if let Err(e) = handle.await {
                warn!(camera = %camera, error = %e, "attribute tuner task failed");
            }
        }
    }
}

impl Default for TunerSet {
    fn default() -> Self {
        Self::new()
    }
}
